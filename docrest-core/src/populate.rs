//! Resolves reference fields into the documents they point to.
//!
//! For each [`PopulatePath`](crate::query::PopulatePath) whose field the
//! schema declares as a reference, the referenced documents are fetched in one
//! batch from the target collection and substituted in place. Nested
//! directives are applied to the fetched documents before substitution, using
//! the target schema. References to missing documents become `null` (single
//! values) or are dropped (arrays). Paths the schema does not declare as
//! references are left untouched.

use std::collections::HashMap;

use bson::{Bson, Document, oid::ObjectId};
use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

use crate::{
    backend::StoreBackend,
    error::StoreResult,
    query::Population,
    schema::{ID_FIELD, Schema},
};

/// Populates documents read through a backend.
#[derive(Debug)]
pub struct Populator<'a, B: StoreBackend> {
    backend: &'a B,
}

impl<'a, B: StoreBackend> Populator<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Populator { backend }
    }

    /// Applies `population` to `documents`, which belong to `schema`.
    pub fn populate<'b>(
        &'b self,
        schema: &'b Schema,
        documents: &'b mut [Document],
        population: &'b Population,
    ) -> BoxFuture<'b, StoreResult<()>> {
        async move {
            for node in population.paths() {
                let Some(target) = schema.reference(&node.path) else {
                    debug!(path = %node.path, collection = schema.collection(), "not a reference, skipping");
                    continue;
                };

                let ids = referenced_ids(documents, &node.path);
                if ids.is_empty() {
                    continue;
                }

                let mut fetched = self.backend.find_by_ids(ids, target.collection()).await?;
                if !node.populate.is_empty() {
                    self.populate(target, &mut fetched, &node.populate).await?;
                }

                let by_id: HashMap<ObjectId, Document> = fetched
                    .into_iter()
                    .filter_map(|doc| doc.get_object_id(ID_FIELD).ok().map(|id| (id, doc)))
                    .collect();

                for document in documents.iter_mut() {
                    substitute(document, &node.path, &by_id);
                }
            }
            Ok(())
        }
        .boxed()
    }
}

fn referenced_ids(documents: &[Document], path: &str) -> Vec<ObjectId> {
    let mut ids = Vec::new();
    for document in documents {
        match document.get(path) {
            Some(Bson::ObjectId(id)) => ids.push(*id),
            Some(Bson::Array(items)) => ids.extend(items.iter().filter_map(Bson::as_object_id)),
            _ => {}
        }
    }
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn substitute(document: &mut Document, path: &str, by_id: &HashMap<ObjectId, Document>) {
    let Some(value) = document.get_mut(path) else {
        return;
    };
    match value {
        Bson::ObjectId(id) => {
            let id = *id;
            *value = by_id.get(&id).cloned().map_or(Bson::Null, Bson::Document);
        }
        Bson::Array(items) => {
            *items = items
                .iter()
                .filter_map(|item| match item {
                    Bson::ObjectId(id) => by_id.get(id).cloned().map(Bson::Document),
                    other => Some(other.clone()),
                })
                .collect();
        }
        _ => {}
    }
}
