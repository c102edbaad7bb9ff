//! Storage backend abstraction.
//!
//! The [`StoreBackend`] trait is the only seam between the repository facade
//! and a concrete document database. Backends work on raw BSON documents keyed
//! by ObjectId and receive already-parsed queries; they never see HTTP
//! concerns.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`StoreBackendBuilder`]: Factory trait for connecting a backend
//!
//! # Examples
//!
//! ```ignore
//! use docrest::backend::StoreBackend;
//! use docrest::query::{FindQuery, parse_query};
//!
//! let query = FindQuery::builder().criteria(parse_query("code:abc")).build();
//! let documents = backend.find(&query, "items").await?;
//! ```

use async_trait::async_trait;
use bson::{Document, oid::ObjectId};
use std::fmt::Debug;

use crate::{
    error::StoreResult,
    query::{Criteria, FindQuery, Projection},
};

/// Which version of a document `find_one_and_update` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnDocument {
    /// The document as it was before the update.
    Before,
    /// The document with the update applied.
    After,
}

/// Core trait for document storage backends.
///
/// Implementations must be thread-safe; a single backend handle is shared by
/// every request for the lifetime of the process.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Fetches the document with the given identifier.
    ///
    /// The projection's fields plus `_id` are returned; an empty projection
    /// returns the whole document.
    async fn find_one(
        &self,
        id: ObjectId,
        projection: &Projection,
        collection: &str,
    ) -> StoreResult<Option<Document>>;

    /// Fetches every document matching the query, sorted, skipped and limited.
    async fn find(&self, query: &FindQuery, collection: &str) -> StoreResult<Vec<Document>>;

    /// Counts the documents matching `criteria`.
    async fn count(&self, criteria: &Criteria, collection: &str) -> StoreResult<u64>;

    /// Fetches the documents whose `_id` is in `ids`. Unknown ids are skipped.
    async fn find_by_ids(&self, ids: Vec<ObjectId>, collection: &str)
    -> StoreResult<Vec<Document>>;

    /// Inserts documents in order, stopping at the first failure.
    ///
    /// Fails with [`StoreError::DuplicateKey`](crate::error::StoreError::DuplicateKey)
    /// when a unique index (including the one on `_id`) rejects a document.
    async fn insert_many(&self, documents: Vec<Document>, collection: &str) -> StoreResult<()>;

    /// Applies `set` as a field-level patch to the document with `id`.
    ///
    /// Returns `None` when no such document exists.
    async fn find_one_and_update(
        &self,
        id: ObjectId,
        set: Document,
        returning: ReturnDocument,
        collection: &str,
    ) -> StoreResult<Option<Document>>;

    /// Creates an ascending index on `field`.
    async fn add_index(&self, collection: &str, field: &str, unique: bool) -> StoreResult<()>;

    /// Removes a collection and its indexes. Dropping a missing collection succeeds.
    async fn drop_collection(&self, name: &str) -> StoreResult<()>;

    /// Releases the backend's resources.
    async fn shutdown(self) -> StoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn find_one(
        &self,
        id: ObjectId,
        projection: &Projection,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        (*self).find_one(id, projection, collection).await
    }

    async fn find(&self, query: &FindQuery, collection: &str) -> StoreResult<Vec<Document>> {
        (*self).find(query, collection).await
    }

    async fn count(&self, criteria: &Criteria, collection: &str) -> StoreResult<u64> {
        (*self).count(criteria, collection).await
    }

    async fn find_by_ids(
        &self,
        ids: Vec<ObjectId>,
        collection: &str,
    ) -> StoreResult<Vec<Document>> {
        (*self).find_by_ids(ids, collection).await
    }

    async fn insert_many(&self, documents: Vec<Document>, collection: &str) -> StoreResult<()> {
        (*self).insert_many(documents, collection).await
    }

    async fn find_one_and_update(
        &self,
        id: ObjectId,
        set: Document,
        returning: ReturnDocument,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        (*self)
            .find_one_and_update(id, set, returning, collection)
            .await
    }

    async fn add_index(&self, collection: &str, field: &str, unique: bool) -> StoreResult<()> {
        (*self).add_index(collection, field, unique).await
    }

    async fn drop_collection(&self, name: &str) -> StoreResult<()> {
        (*self).drop_collection(name).await
    }
}

/// Factory trait for connecting a backend.
///
/// Builders are cloned once per connection attempt by
/// [`connect`](crate::retry::connect), so they should be cheap to clone.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> StoreResult<Self::Backend>;
}
