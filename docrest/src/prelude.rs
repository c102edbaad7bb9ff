//! Convenient re-exports of commonly used types from docrest.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docrest::prelude::*;
//! ```

pub use crate::{
    config::{ConfigError, DocrestConfig},
    handler::CollectionHandler,
    telemetry::init_tracing,
};

pub use docrest_core::{
    backend::{ReturnDocument, StoreBackend, StoreBackendBuilder},
    classify::{ApiError, ErrorKind, classify},
    config::StoreConfig,
    document::{BaseFields, DocumentExt},
    error::{StoreError, StoreResult},
    page::{Envelope, PageWindow},
    query::{
        Criteria, CriteriaValue, FindQuery, Population, Projection, SortSpec, coerce,
        parse_fields, parse_population, parse_query, parse_sort,
    },
    repository::{ListParams, Repository},
    request::{HttpRequest, HttpResponse},
    retry::RetryPolicy,
    schema::{Field, Schema},
};
