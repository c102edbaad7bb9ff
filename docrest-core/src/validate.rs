//! Request-shape checks run before any store access.

use serde_json::Value;

use crate::{classify::ApiError, request::HttpRequest};

/// Media type write requests must declare.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Requires a `content-type` header naming JSON. Parameters such as
/// `; charset=utf-8` are allowed.
pub fn require_json(request: &HttpRequest) -> Result<(), ApiError> {
    match request.header("content-type") {
        Some(content_type) if content_type.to_ascii_lowercase().contains(JSON_CONTENT_TYPE) => {
            Ok(())
        }
        _ => Err(ApiError::invalid()),
    }
}

/// Requires a body that is an object with at least one key, or a non-empty
/// array of objects. Empty objects inside an array are left to schema
/// validation.
pub fn require_body(request: &HttpRequest) -> Result<&Value, ApiError> {
    let body = request.body.as_ref().ok_or_else(ApiError::invalid)?;
    let acceptable = match body {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => {
            !items.is_empty() && items.iter().all(Value::is_object)
        }
        _ => false,
    };
    if acceptable { Ok(body) } else { Err(ApiError::invalid()) }
}

/// Runs both checks used by write operations.
pub fn require_write(request: &HttpRequest) -> Result<&Value, ApiError> {
    require_json(request)?;
    require_body(request)
}

/// Requires a non-empty identifier, failing with `error` otherwise.
pub fn require_id<'a>(id: Option<&'a str>, error: fn() -> ApiError) -> Result<&'a str, ApiError> {
    id.filter(|id| !id.is_empty()).ok_or_else(error)
}
