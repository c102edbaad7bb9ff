//! External error taxonomy.
//!
//! Every failure that leaves the facade is an [`ApiError`]: a status code plus
//! a `{type, message?}` body. Store failures are mapped by [`classify`];
//! request-shape rejections are built directly.

use std::fmt;

use http::{Method, StatusCode};
use serde::Serialize;
use serde_json::json;

use crate::{error::StoreError, request::HttpResponse};

/// The `type` field of an error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Malformed request: wrong content type, empty body, missing id on update.
    #[serde(rename = "invalid")]
    Invalid,
    /// Missing id on deactivate, or no document to update.
    #[serde(rename = "missing")]
    Missing,
    /// A unique index rejected the write.
    #[serde(rename = "already_exists")]
    AlreadyExists,
    /// The document failed schema validation.
    #[serde(rename = "missing_field")]
    MissingField,
    #[serde(rename = "not_supported")]
    NotSupported,
    /// Any other failure. Serialized as the empty string.
    #[serde(rename = "")]
    Unclassified,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Invalid => "invalid",
            ErrorKind::Missing => "missing",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::MissingField => "missing_field",
            ErrorKind::NotSupported => "not_supported",
            ErrorKind::Unclassified => "",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error on its way out as a response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: ErrorKind) -> Self {
        ApiError { status, kind, message: None }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// 400 `invalid`.
    pub fn invalid() -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, ErrorKind::Invalid)
    }

    /// 400 `missing`.
    pub fn missing() -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, ErrorKind::Missing)
    }

    /// 405 `not_supported` for `method`.
    pub fn not_supported(method: &Method) -> Self {
        ApiError::new(StatusCode::METHOD_NOT_ALLOWED, ErrorKind::NotSupported)
            .with_message(format!("Method {method} not supported."))
    }

    /// The `{type, message?}` body as a response.
    pub fn into_response(self) -> HttpResponse {
        let status = self.status;
        HttpResponse::json(status, json!(self))
    }

    /// The body nested under an `error` key, as the method router answers.
    pub fn into_wrapped_response(self) -> HttpResponse {
        let status = self.status;
        HttpResponse::json(status, json!({ "error": self }))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{} [{}]: {message}", self.status, self.kind),
            None => write!(f, "{} [{}]", self.status, self.kind),
        }
    }
}

/// Maps a store failure onto the external taxonomy.
///
/// | store error | status | kind |
/// |---|---|---|
/// | [`StoreError::DuplicateKey`] | 409 | `already_exists` |
/// | [`StoreError::Validation`] | 422 | `missing_field` |
/// | anything else | 500 | `""` |
pub fn classify(err: &StoreError) -> ApiError {
    let (status, kind) = match err {
        StoreError::DuplicateKey { .. } => (StatusCode::CONFLICT, ErrorKind::AlreadyExists),
        StoreError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, ErrorKind::MissingField),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Unclassified),
    };
    ApiError::new(status, kind).with_message(err.to_string())
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        classify(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn duplicate_keys_conflict() {
        let err = StoreError::DuplicateKey { collection: "items".into(), detail: "code".into() };
        let api = classify(&err);
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.kind, ErrorKind::AlreadyExists);
        assert_eq!(api.message.as_deref(), Some(err.to_string().as_str()));
    }

    #[test]
    fn validation_failures_are_unprocessable() {
        let api = classify(&StoreError::Validation("code required".into()));
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.kind, ErrorKind::MissingField);
    }

    #[test]
    fn everything_else_is_unclassified() {
        for err in [
            StoreError::InvalidId("abc".into()),
            StoreError::Backend("boom".into()),
            StoreError::Connection("down".into()),
        ] {
            let api = classify(&err);
            assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
            let body = api.into_response().body.unwrap();
            assert_eq!(body["type"], json!(""));
        }
    }

    #[test]
    fn request_errors_omit_message() {
        let response = ApiError::invalid().into_response();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body, Some(json!({"type": "invalid"})));
    }

    #[test]
    fn not_supported_is_wrapped() {
        let response = ApiError::not_supported(&Method::PUT).into_wrapped_response();
        assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.body,
            Some(json!({"error": {"type": "not_supported", "message": "Method PUT not supported."}}))
        );
    }
}
