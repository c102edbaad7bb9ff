//! Collection schemas.
//!
//! A [`Schema`] names a collection and declares the fields the store cares
//! about: which are required, which carry a unique index, which reference
//! documents in another collection and which have defaults. Every schema
//! includes the base shape: an ObjectId `_id` and an `isActive` flag that
//! defaults to `true`.
//!
//! ```ignore
//! use docrest::schema::{Field, Schema};
//!
//! let parent = Schema::builder("parents")
//!     .field(Field::new("code").required().unique())
//!     .build();
//! let child = Schema::builder("children")
//!     .field(Field::new("code").required())
//!     .field(Field::new("parent").reference(&parent))
//!     .build();
//! ```

use std::sync::Arc;

use bson::{Bson, Document, oid::ObjectId, ser::serialize_to_bson};
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// The identifier field.
pub const ID_FIELD: &str = "_id";
/// The soft-delete marker.
pub const ACTIVE_FIELD: &str = "isActive";
/// Internal version key stripped from responses.
pub const VERSION_FIELD: &str = "__v";

/// A declared field of a [`Schema`].
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    required: bool,
    unique: bool,
    reference: Option<Arc<Schema>>,
    default: Option<Bson>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Field { name: name.into(), required: false, unique: false, reference: None, default: None }
    }

    /// Rejects inserts where the field is absent, null or an empty string.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Backs the field with a unique index.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Declares the field as holding ObjectId references into `target`.
    pub fn reference(mut self, target: &Arc<Schema>) -> Self {
        self.reference = Some(Arc::clone(target));
        self
    }

    /// Value assigned on insert when the field is absent.
    pub fn default_value(mut self, value: impl Into<Bson>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn target(&self) -> Option<&Arc<Schema>> {
        self.reference.as_ref()
    }
}

/// A collection name plus its declared fields.
#[derive(Debug)]
pub struct Schema {
    collection: String,
    fields: Vec<Field>,
}

impl Schema {
    /// Starts a schema for `collection` with the base fields already declared.
    pub fn builder(collection: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(collection)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the schema referenced by `path`, if the field is a reference.
    pub fn reference(&self, path: &str) -> Option<&Arc<Schema>> {
        self.field(path).and_then(Field::target)
    }

    pub fn unique_fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter(|f| f.unique).map(|f| f.name.as_str())
    }

    /// Turns a JSON body object into a document ready for insertion.
    ///
    /// Casts `_id` and reference fields to ObjectIds, fills defaults, assigns a
    /// fresh `_id` when none is given and checks required fields.
    pub fn prepare_insert(&self, body: &Map<String, Value>) -> StoreResult<Document> {
        let mut document = Document::new();
        document.insert(ID_FIELD, match body.get(ID_FIELD) {
            Some(Value::Null) | None => Bson::ObjectId(ObjectId::new()),
            Some(id) => self.cast_id_value(id)?,
        });

        for (key, value) in body {
            if key == ID_FIELD {
                continue;
            }
            document.insert(key.clone(), self.cast_field(key, value)?);
        }

        for field in &self.fields {
            if let Some(default) = &field.default {
                if !document.contains_key(&field.name) {
                    document.insert(field.name.clone(), default.clone());
                }
            }
        }

        let missing: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required && is_blank(document.get(&f.name)))
            .map(|f| f.name.as_str())
            .collect();
        if !missing.is_empty() {
            let reasons: Vec<String> = missing
                .iter()
                .map(|path| format!("{path}: Path `{path}` is required."))
                .collect();
            return Err(StoreError::Validation(format!(
                "{} validation failed: {}",
                self.collection,
                reasons.join(", ")
            )));
        }

        Ok(document)
    }

    /// Turns a JSON body object into a `$set` document.
    ///
    /// `_id` is never updatable and is dropped from the set.
    pub fn prepare_update(&self, body: &Map<String, Value>) -> StoreResult<Document> {
        let mut set = Document::new();
        for (key, value) in body {
            if key == ID_FIELD {
                continue;
            }
            set.insert(key.clone(), self.cast_field(key, value)?);
        }
        Ok(set)
    }

    fn cast_field(&self, key: &str, value: &Value) -> StoreResult<Bson> {
        if self.reference(key).is_none() {
            return Ok(serialize_to_bson(value)?);
        }
        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| self.cast_reference(key, item))
                .collect::<StoreResult<Vec<_>>>()
                .map(Bson::Array),
            other => self.cast_reference(key, other),
        }
    }

    fn cast_reference(&self, key: &str, value: &Value) -> StoreResult<Bson> {
        match value {
            Value::Null => Ok(Bson::Null),
            Value::String(hex) => ObjectId::parse_str(hex).map(Bson::ObjectId).map_err(|_| {
                StoreError::Validation(format!(
                    "{} validation failed: {key}: Cast to ObjectId failed for value \"{hex}\" at path \"{key}\"",
                    self.collection
                ))
            }),
            other => Err(StoreError::Validation(format!(
                "{} validation failed: {key}: Cast to ObjectId failed for value \"{other}\" at path \"{key}\"",
                self.collection
            ))),
        }
    }

    fn cast_id_value(&self, value: &Value) -> StoreResult<Bson> {
        match value {
            Value::String(hex) => cast_id(hex).map(Bson::ObjectId).map_err(|_| {
                StoreError::Validation(format!(
                    "{} validation failed: _id: Cast to ObjectId failed for value \"{hex}\" at path \"_id\"",
                    self.collection
                ))
            }),
            other => Err(StoreError::Validation(format!(
                "{} validation failed: _id: Cast to ObjectId failed for value \"{other}\" at path \"_id\"",
                self.collection
            ))),
        }
    }
}

/// Parses a 24-character hex identifier.
pub fn cast_id(raw: &str) -> StoreResult<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| StoreError::InvalidId(raw.to_string()))
}

fn is_blank(value: Option<&Bson>) -> bool {
    match value {
        None | Some(Bson::Null) => true,
        Some(Bson::String(s)) => s.is_empty(),
        _ => false,
    }
}

pub struct SchemaBuilder {
    collection: String,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    pub fn new(collection: impl Into<String>) -> Self {
        SchemaBuilder {
            collection: collection.into(),
            fields: vec![Field::new(ACTIVE_FIELD).default_value(true)],
        }
    }

    /// Declares a field. Redeclaring a name replaces the earlier declaration.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.retain(|f| f.name != field.name);
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Arc<Schema> {
        Arc::new(Schema { collection: self.collection, fields: self.fields })
    }
}
