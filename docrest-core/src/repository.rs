//! The repository facade: five CRUD operations over one collection.
//!
//! Every operation returns an [`HttpResponse`]; failures never escape as
//! `Err`. Request-shape problems are rejected before the backend is touched,
//! and store failures go through [`classify`](crate::classify::classify).
//!
//! # Example
//!
//! ```ignore
//! use docrest::repository::{ListParams, Repository};
//! use docrest::query::parse_query;
//!
//! let items = Repository::new(schema, &backend);
//! let response = items
//!     .get_many(ListParams { criteria: parse_query("code:abc"), ..Default::default() })
//!     .await;
//! assert_eq!(response.status, StatusCode::OK);
//! ```

use std::sync::Arc;

use bson::Document;
use http::StatusCode;
use serde_json::{Map, Value, json};
use tracing::{debug, error, instrument};

use crate::{
    backend::{ReturnDocument, StoreBackend},
    classify::ApiError,
    error::StoreResult,
    page::{Envelope, PageWindow},
    populate::Populator,
    query::{Criteria, CriteriaValue, FindQuery, Population, Projection, SortSpec},
    request::{HttpRequest, HttpResponse},
    response::{normalize_document, normalize_envelope},
    schema::{ACTIVE_FIELD, ID_FIELD, Schema, cast_id},
    validate::{require_id, require_write},
};

/// Parameters of a list read.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub criteria: Criteria,
    pub projection: Projection,
    pub population: Population,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub sort: SortSpec,
    /// Include deactivated documents when `criteria` does not mention `isActive`.
    pub show_inactive: bool,
}

/// CRUD operations for the collection described by a [`Schema`].
#[derive(Debug)]
pub struct Repository<'a, B: StoreBackend> {
    schema: Arc<Schema>,
    backend: &'a B,
}

impl<'a, B: StoreBackend> Repository<'a, B> {
    pub fn new(schema: Arc<Schema>, backend: &'a B) -> Self {
        Self { schema, backend }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn collection(&self) -> &str {
        self.schema.collection()
    }

    /// Creates the unique indexes the schema declares.
    pub async fn sync_indexes(&self) -> StoreResult<()> {
        for field in self.schema.unique_fields() {
            self.backend.add_index(self.collection(), field, true).await?;
        }
        Ok(())
    }

    /// Reads one document by id.
    ///
    /// - `200` with the normalized document
    /// - `404` with no body when it does not exist
    /// - a classified error otherwise (a malformed id is a `500`)
    #[instrument(skip(self, projection, population), fields(collection = %self.collection()))]
    pub async fn get_one(
        &self,
        id: &str,
        projection: &Projection,
        population: &Population,
    ) -> HttpResponse {
        respond("get_one", self.try_get_one(id, projection, population).await)
    }

    async fn try_get_one(
        &self,
        id: &str,
        projection: &Projection,
        population: &Population,
    ) -> Result<HttpResponse, ApiError> {
        let id = cast_id(id)?;
        let Some(document) = self.backend.find_one(id, projection, self.collection()).await? else {
            return Ok(HttpResponse::empty(StatusCode::NOT_FOUND));
        };

        let mut documents = [document];
        Populator::new(self.backend)
            .populate(&self.schema, &mut documents, population)
            .await?;
        let [document] = documents;
        Ok(HttpResponse::json(StatusCode::OK, normalize_document(document)))
    }

    /// Lists documents, `200` with the `{data, hasMore, totalCount}` envelope.
    ///
    /// Only active documents are listed unless `show_inactive` is set or the
    /// criteria name `isActive` themselves. The count and the page fetch run
    /// concurrently.
    #[instrument(skip(self, params), fields(collection = %self.collection()))]
    pub async fn get_many(&self, params: ListParams) -> HttpResponse {
        respond("get_many", self.try_get_many(params).await)
    }

    async fn try_get_many(&self, params: ListParams) -> Result<HttpResponse, ApiError> {
        let ListParams {
            mut criteria,
            projection,
            population,
            page,
            per_page,
            sort,
            show_inactive,
        } = params;

        if !show_inactive && !criteria.contains_key(ACTIVE_FIELD) {
            criteria.insert(ACTIVE_FIELD, CriteriaValue::Bool(true));
        }

        let window = PageWindow::new(page, per_page);
        let mut builder = FindQuery::builder()
            .criteria(criteria)
            .projection(projection)
            .sort(sort);
        if let Some(window) = &window {
            builder = builder.skip(window.skip()).limit(window.limit());
        }
        let query = builder.build();
        debug!(?window, criteria = ?query.criteria, "listing documents");

        let (total_count, mut documents) = futures::try_join!(
            self.backend.count(&query.criteria, self.collection()),
            self.backend.find(&query, self.collection()),
        )?;

        Populator::new(self.backend)
            .populate(&self.schema, &mut documents, &population)
            .await?;

        let envelope = Envelope::builder(documents)
            .with_window(window.as_ref(), total_count)
            .build();
        Ok(HttpResponse::json(StatusCode::OK, normalize_envelope(envelope)))
    }

    /// Inserts the object or array of objects in the request body.
    ///
    /// `201` with an envelope of the inserted documents, `400 invalid` for a
    /// non-JSON or empty request, `409` on a duplicate key and `422` when a
    /// document fails validation.
    #[instrument(skip_all, fields(collection = %self.collection()))]
    pub async fn insert_many(&self, request: &HttpRequest) -> HttpResponse {
        respond("insert_many", self.try_insert_many(request).await)
    }

    async fn try_insert_many(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let body = require_write(request)?;
        let objects: Vec<&Map<String, Value>> = match body {
            Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
            Value::Object(object) => vec![object],
            _ => return Err(ApiError::invalid()),
        };

        let documents = objects
            .into_iter()
            .map(|object| self.schema.prepare_insert(object))
            .collect::<StoreResult<Vec<Document>>>()?;
        self.backend
            .insert_many(documents.clone(), self.collection())
            .await?;
        debug!(count = documents.len(), "inserted documents");

        let envelope = Envelope::builder(documents).build();
        Ok(HttpResponse::json(StatusCode::CREATED, normalize_envelope(envelope)))
    }

    /// Applies the request body as a partial update of document `id`.
    ///
    /// `200` with the updated document, `400 invalid` for a malformed request
    /// or an update with nothing to set, `400 missing` when the document does
    /// not exist.
    #[instrument(skip(self, request), fields(collection = %self.collection()))]
    pub async fn update_one(&self, request: &HttpRequest, id: Option<&str>) -> HttpResponse {
        respond("update_one", self.try_update_one(request, id).await)
    }

    async fn try_update_one(
        &self,
        request: &HttpRequest,
        id: Option<&str>,
    ) -> Result<HttpResponse, ApiError> {
        let body = require_write(request)?;
        let id = require_id(id, ApiError::invalid)?;
        let Value::Object(fields) = body else {
            return Err(ApiError::invalid());
        };

        let set = self.schema.prepare_update(fields)?;
        if set.is_empty() {
            return Err(ApiError::invalid());
        }

        let id = cast_id(id)?;
        match self
            .backend
            .find_one_and_update(id, set, ReturnDocument::After, self.collection())
            .await?
        {
            Some(document) => Ok(HttpResponse::json(StatusCode::OK, normalize_document(document))),
            None => Err(ApiError::missing()),
        }
    }

    /// Soft-deletes document `id` by clearing its `isActive` flag.
    ///
    /// `200` with `{deactivated: true, _id}`, `400 missing` without an id and
    /// a bare `400` when the document does not exist.
    #[instrument(skip(self), fields(collection = %self.collection()))]
    pub async fn deactivate_one(&self, id: Option<&str>) -> HttpResponse {
        respond("deactivate_one", self.try_deactivate_one(id).await)
    }

    async fn try_deactivate_one(&self, id: Option<&str>) -> Result<HttpResponse, ApiError> {
        let id = require_id(id, ApiError::missing)?;
        let object_id = cast_id(id)?;
        let mut set = Document::new();
        set.insert(ACTIVE_FIELD, false);
        let previous = self
            .backend
            .find_one_and_update(object_id, set, ReturnDocument::Before, self.collection())
            .await?;

        Ok(match previous {
            Some(previous) => {
                let id = previous.get_object_id(ID_FIELD).unwrap_or(object_id);
                HttpResponse::json(
                    StatusCode::OK,
                    json!({ "deactivated": true, "_id": id.to_hex() }),
                )
            }
            None => HttpResponse::empty(StatusCode::BAD_REQUEST),
        })
    }
}

fn respond(operation: &str, result: Result<HttpResponse, ApiError>) -> HttpResponse {
    result.unwrap_or_else(|err| {
        if err.status.is_server_error() {
            error!(operation, error = %err, "operation failed");
        } else {
            debug!(operation, error = %err, "request rejected");
        }
        err.into_response()
    })
}
