//! Maps stored documents onto their externally visible JSON shape.
//!
//! ObjectIds become 24-character hex strings, dates become RFC 3339 strings
//! with millisecond precision and the internal `__v` key is dropped, at every
//! nesting level so populated documents come out the same way.

use bson::{Bson, Document};
use chrono::SecondsFormat;
use serde_json::{Map, Number, Value};

use crate::{page::Envelope, schema::VERSION_FIELD};

/// Normalizes one stored document.
pub fn normalize_document(document: Document) -> Value {
    let mut object = Map::with_capacity(document.len());
    for (key, value) in document {
        if key == VERSION_FIELD {
            continue;
        }
        object.insert(key, normalize_value(value));
    }
    Value::Object(object)
}

/// Normalizes a single BSON value.
pub fn normalize_value(value: Bson) -> Value {
    match value {
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        Bson::String(s) => Value::String(s),
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Int32(i) => Value::from(i),
        Bson::Int64(i) => Value::from(i),
        Bson::Double(d) => Number::from_f64(d).map_or(Value::Null, Value::Number),
        Bson::DateTime(dt) => {
            Value::String(dt.to_chrono().to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        Bson::Array(items) => Value::Array(items.into_iter().map(normalize_value).collect()),
        Bson::Document(document) => normalize_document(document),
        Bson::Null | Bson::Undefined => Value::Null,
        other => Value::String(other.to_string()),
    }
}

/// Normalizes a list of documents and wraps them in the list envelope.
pub fn normalize_envelope(envelope: Envelope<Document>) -> Value {
    let data = envelope.data.into_iter().map(normalize_document).collect();
    serde_json::json!({
        "data": Value::Array(data),
        "hasMore": envelope.has_more,
        "totalCount": envelope.total_count,
    })
}
