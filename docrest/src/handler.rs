//! Method-routed entry point for one collection.
//!
//! A [`CollectionHandler`] pairs a [`Schema`] with a backend and dispatches an
//! [`HttpRequest`] to the matching repository operation:
//!
//! | Method | `id` param | Operation |
//! |---|---|---|
//! | `GET` | absent | list |
//! | `GET` | present | get one |
//! | `POST` | | insert |
//! | `PATCH` | | partial update |
//! | `DELETE` | | deactivate |
//!
//! Any other method is answered with `405`.

use std::sync::Arc;

use http::Method;
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

use docrest_core::{
    backend::StoreBackend,
    classify::ApiError,
    error::StoreResult,
    query::{parse_fields, parse_population, parse_query, parse_sort},
    repository::{ListParams, Repository},
    request::{HttpRequest, HttpResponse},
    schema::Schema,
};

/// Query parameter carrying the filter criteria.
pub const QUERY_PARAM: &str = "q";
pub const FIELDS_PARAM: &str = "fields";
pub const POPULATE_PARAM: &str = "populate";
pub const SORT_PARAM: &str = "sort";
pub const PAGE_PARAM: &str = "page";
pub const PER_PAGE_PARAM: &str = "per_page";
pub const SHOW_INACTIVE_PARAM: &str = "showInactive";
/// Path parameter carrying the document id.
pub const ID_PARAM: &str = "id";

pub struct CollectionHandler<B: StoreBackend> {
    schema: Arc<Schema>,
    backend: B,
}

impl<B: StoreBackend> CollectionHandler<B> {
    pub fn new(schema: Arc<Schema>, backend: B) -> Self {
        Self { schema, backend }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn repository(&self) -> Repository<'_, B> {
        Repository::new(self.schema.clone(), &self.backend)
    }

    /// Prepares the collection, creating the unique indexes its schema declares.
    pub async fn init(&self) -> StoreResult<()> {
        self.repository().sync_indexes().await
    }

    /// Dispatches `request` by method. Every request is handled inside a span
    /// carrying a fresh request id.
    pub async fn handle(&self, request: HttpRequest) -> HttpResponse {
        let span = info_span!(
            "request",
            request_id = %Uuid::new_v4(),
            method = %request.method,
            collection = %self.schema.collection(),
        );

        async {
            let response = self.route(&request).await;
            debug!(status = %response.status, "handled request");
            response
        }
        .instrument(span)
        .await
    }

    async fn route(&self, request: &HttpRequest) -> HttpResponse {
        let repository = self.repository();
        let method = &request.method;

        if method == Method::GET {
            match request.param(ID_PARAM) {
                Some(id) => {
                    let projection = parse_fields(request.query_param(FIELDS_PARAM).unwrap_or_default());
                    let population =
                        parse_population(request.query_param(POPULATE_PARAM).unwrap_or_default());
                    repository.get_one(id, &projection, &population).await
                }
                None => repository.get_many(list_params(request)).await,
            }
        } else if method == Method::POST {
            repository.insert_many(request).await
        } else if method == Method::PATCH {
            repository.update_one(request, request.param(ID_PARAM)).await
        } else if method == Method::DELETE {
            repository.deactivate_one(request.param(ID_PARAM)).await
        } else {
            ApiError::not_supported(method).into_wrapped_response()
        }
    }
}

/// Reads the list parameters from the query string.
///
/// `page` and `per_page` default to `0`; a value that is not an integer
/// disables pagination.
pub fn list_params(request: &HttpRequest) -> ListParams {
    let text = |name: &str| request.query_param(name).unwrap_or_default();

    ListParams {
        criteria: parse_query(text(QUERY_PARAM)),
        projection: parse_fields(text(FIELDS_PARAM)),
        population: parse_population(text(POPULATE_PARAM)),
        page: integer_param(request.query_param(PAGE_PARAM)),
        per_page: integer_param(request.query_param(PER_PAGE_PARAM)),
        sort: parse_sort(text(SORT_PARAM)),
        show_inactive: request.query_param(SHOW_INACTIVE_PARAM).is_some_and(is_truthy),
    }
}

fn integer_param(raw: Option<&str>) -> Option<i64> {
    match raw {
        None => Some(0),
        Some(raw) => raw.trim().parse().ok(),
    }
}

fn is_truthy(raw: &str) -> bool {
    !matches!(raw.trim(), "" | "false" | "0")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(params: &[(&str, &str)]) -> HttpRequest {
        params
            .iter()
            .fold(HttpRequest::builder(Method::GET), |builder, (name, value)| {
                builder.query(*name, *value)
            })
            .build()
    }

    #[test]
    fn list_params_defaults() {
        let params = list_params(&request(&[]));
        assert!(params.criteria.is_empty());
        assert!(params.projection.is_empty());
        assert!(params.population.is_empty());
        assert!(params.sort.is_empty());
        assert_eq!(params.page, Some(0));
        assert_eq!(params.per_page, Some(0));
        assert!(!params.show_inactive);
    }

    #[test]
    fn list_params_from_query_string() {
        let params = list_params(&request(&[
            ("q", "code:abc"),
            ("fields", "code"),
            ("page", "2"),
            ("per_page", "10"),
            ("sort", "-code"),
            ("showInactive", "true"),
        ]));
        assert_eq!(params.criteria.len(), 1);
        assert!(params.projection.contains("code"));
        assert_eq!(params.page, Some(2));
        assert_eq!(params.per_page, Some(10));
        assert_eq!(params.sort.as_str(), "-code");
        assert!(params.show_inactive);
    }

    #[test]
    fn non_integer_page_disables_pagination() {
        let params = list_params(&request(&[("page", "two"), ("per_page", "1.5")]));
        assert_eq!(params.page, None);
        assert_eq!(params.per_page, None);
    }

    #[test]
    fn show_inactive_truthiness() {
        for raw in ["", "false", "0"] {
            assert!(!is_truthy(raw), "{raw:?} should be falsy");
        }
        for raw in ["true", "1", "yes", "False"] {
            assert!(is_truthy(raw), "{raw:?} should be truthy");
        }
    }
}
