//! In-memory storage implementation.
//!
//! Documents live in insertion order per collection behind an async-aware
//! read-write lock. Unique indexes registered through `add_index` are enforced
//! on insert and update, and `_id` is always unique.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId};
use mea::rwlock::RwLock;
use tracing::debug;

use docrest_core::{
    backend::{ReturnDocument, StoreBackend, StoreBackendBuilder},
    error::{StoreError, StoreResult},
    query::{Criteria, FindQuery, Projection},
    schema::ID_FIELD,
};

use crate::evaluator::{DocumentEvaluator, compare_documents};

#[derive(Debug, Default)]
struct CollectionData {
    documents: Vec<Document>,
    unique_fields: Vec<String>,
}

impl CollectionData {
    fn position(&self, id: ObjectId) -> Option<usize> {
        self.documents
            .iter()
            .position(|doc| doc.get_object_id(ID_FIELD).is_ok_and(|found| found == id))
    }

    /// Fails when `candidate` collides with another document on `_id` or a
    /// unique field. `skip` excludes the document being replaced.
    fn check_unique(&self, collection: &str, candidate: &Document, skip: Option<usize>) -> StoreResult<()> {
        let fields = std::iter::once(ID_FIELD).chain(self.unique_fields.iter().map(String::as_str));
        for field in fields {
            let Some(value) = candidate.get(field).filter(|v| !matches!(v, Bson::Null)) else {
                continue;
            };
            let clash = self
                .documents
                .iter()
                .enumerate()
                .any(|(index, doc)| Some(index) != skip && doc.get(field) == Some(value));
            if clash {
                let index = if field == ID_FIELD { "_id_".to_string() } else { format!("{field}_1") };
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    detail: format!(
                        "E11000 duplicate key error collection: {collection} index: {index} dup key: {{ {field}: {value} }}"
                    ),
                });
            }
        }
        Ok(())
    }
}

type StoreMap = HashMap<String, CollectionData>;

#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self { store: Arc::new(RwLock::new(StoreMap::new())) }
    }

    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

/// Copies `_id` plus the projected fields (dotted paths included) out of `document`.
fn project(document: &Document, projection: &Projection) -> Document {
    if projection.is_empty() {
        return document.clone();
    }
    let mut projected = Document::new();
    if let Some(id) = document.get(ID_FIELD) {
        projected.insert(ID_FIELD, id.clone());
    }
    for field in projection.fields() {
        copy_path(document, field, &mut projected);
    }
    projected
}

fn copy_path(source: &Document, path: &str, target: &mut Document) {
    match path.split_once('.') {
        None => {
            if let Some(value) = source.get(path) {
                target.insert(path, value.clone());
            }
        }
        Some((head, rest)) => {
            let Some(Bson::Document(inner)) = source.get(head) else {
                return;
            };
            if !matches!(target.get(head), Some(Bson::Document(_))) {
                target.insert(head, Document::new());
            }
            if let Some(Bson::Document(nested)) = target.get_mut(head) {
                copy_path(inner, rest, nested);
            }
        }
    }
}

/// Applies one `$set` entry, creating intermediate documents for dotted paths.
fn set_path(document: &mut Document, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(document.get(head), Some(Bson::Document(_))) {
                document.insert(head, Document::new());
            }
            if let Some(Bson::Document(nested)) = document.get_mut(head) {
                set_path(nested, rest, value);
            }
        }
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn find_one(
        &self,
        id: ObjectId,
        projection: &Projection,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        let store = self.store.read().await;
        let Some(data) = store.get(collection) else {
            return Ok(None);
        };
        Ok(data.position(id).map(|index| project(&data.documents[index], projection)))
    }

    async fn find(&self, query: &FindQuery, collection: &str) -> StoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let Some(data) = store.get(collection) else {
            return Ok(vec![]);
        };

        let mut matched = DocumentEvaluator::filter_documents(&data.documents, &query.criteria)?;

        let keys = query.sort.keys();
        if !keys.is_empty() {
            matched.sort_by(|a, b| compare_documents(a, b, &keys));
        }

        let skip = usize::try_from(query.skip.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .and_then(|limit| usize::try_from(limit).ok())
            .unwrap_or(usize::MAX);

        Ok(matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|doc| project(doc, &query.projection))
            .collect())
    }

    async fn count(&self, criteria: &Criteria, collection: &str) -> StoreResult<u64> {
        let store = self.store.read().await;
        let Some(data) = store.get(collection) else {
            return Ok(0);
        };
        Ok(DocumentEvaluator::filter_documents(&data.documents, criteria)?.len() as u64)
    }

    async fn find_by_ids(&self, ids: Vec<ObjectId>, collection: &str) -> StoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let Some(data) = store.get(collection) else {
            return Ok(vec![]);
        };
        Ok(data
            .documents
            .iter()
            .filter(|doc| doc.get_object_id(ID_FIELD).is_ok_and(|id| ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn insert_many(&self, documents: Vec<Document>, collection: &str) -> StoreResult<()> {
        let mut store = self.store.write().await;
        let data = store.entry(collection.to_string()).or_default();

        for document in documents {
            if !matches!(document.get(ID_FIELD), Some(Bson::ObjectId(_))) {
                return Err(StoreError::InvalidDocument(format!(
                    "document without an ObjectId {ID_FIELD} in collection {collection}"
                )));
            }
            data.check_unique(collection, &document, None)?;
            data.documents.push(document);
        }

        debug!(collection, total = data.documents.len(), "inserted documents");
        Ok(())
    }

    async fn find_one_and_update(
        &self,
        id: ObjectId,
        set: Document,
        returning: ReturnDocument,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        let mut store = self.store.write().await;
        let Some(data) = store.get_mut(collection) else {
            return Ok(None);
        };
        let Some(index) = data.position(id) else {
            return Ok(None);
        };

        let before = data.documents[index].clone();
        let mut after = before.clone();
        for (path, value) in set {
            set_path(&mut after, &path, value);
        }
        data.check_unique(collection, &after, Some(index))?;
        data.documents[index] = after.clone();

        Ok(Some(match returning {
            ReturnDocument::Before => before,
            ReturnDocument::After => after,
        }))
    }

    async fn add_index(&self, collection: &str, field: &str, unique: bool) -> StoreResult<()> {
        // Only unique indexes change behaviour here.
        if !unique {
            return Ok(());
        }
        let mut store = self.store.write().await;
        let data = store.entry(collection.to_string()).or_default();
        if !data.unique_fields.iter().any(|f| f == field) {
            data.unique_fields.push(field.to_string());
        }
        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> StoreResult<()> {
        let mut store = self.store.write().await;
        store.remove(name);
        Ok(())
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use docrest_memory::InMemoryStore;
/// use docrest::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder().build().await?;
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Always succeeds with a freshly initialized store.
    async fn build(self) -> StoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}
