//! Typed views over stored and returned documents.
//!
//! The store works on untyped BSON documents; callers that know the shape of
//! a collection can convert in and out of their own serde types through
//! [`DocumentExt`]. [`BaseFields`] is the base shape every collection shares,
//! meant to be flattened into domain types.

use bson::{Bson, Document, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, from_value, to_value};

use crate::error::{StoreError, StoreResult};

/// The fields every document carries, as seen in normalized responses.
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Item {
///     #[serde(flatten)]
///     base: BaseFields,
///     code: String,
/// }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BaseFields {
    /// Hex-encoded identifier. Absent before insertion.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "isActive", default = "active_by_default")]
    pub is_active: bool,
}

impl Default for BaseFields {
    fn default() -> Self {
        BaseFields { id: None, is_active: true }
    }
}

fn active_by_default() -> bool {
    true
}

pub trait DocumentExt: Sized {
    fn to_document(&self) -> StoreResult<Document>;

    fn from_document(document: Document) -> StoreResult<Self>;

    fn to_json(&self) -> StoreResult<Value>;

    fn from_json(value: Value) -> StoreResult<Self>;
}

impl<D> DocumentExt for D
where
    D: Serialize + DeserializeOwned,
{
    fn to_document(&self) -> StoreResult<Document> {
        match serialize_to_bson(self)? {
            Bson::Document(document) => Ok(document),
            other => Err(StoreError::InvalidDocument(format!(
                "expected a document, got {:?}",
                other.element_type()
            ))),
        }
    }

    fn from_document(document: Document) -> StoreResult<Self> {
        Ok(deserialize_from_bson(Bson::Document(document))?)
    }

    fn to_json(&self) -> StoreResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> StoreResult<Self> {
        Ok(from_value(value)?)
    }
}
