//! Main docrest crate: query-string driven CRUD over HTTP for document stores.
//!
//! This crate is the primary entry point for users of docrest. It re-exports
//! the core types from `docrest-core`, the storage backends, and adds the
//! method-routed [`handler::CollectionHandler`], configuration loading and
//! tracing initialisation.
//!
//! # Features
//!
//! - **Query-string grammar** - `q`, `fields`, `populate` and `sort` parameters
//!   parsed into typed criteria, projections, population trees and sort specs
//! - **Five operations** - get one, list, insert, partial update and soft deactivate
//! - **Population** - referenced documents inlined, recursively
//! - **Uniform responses** - every outcome is an `HttpResponse` with a status and JSON body
//! - **Multiple backends** - in-memory and MongoDB (requires `mongodb` feature)
//!
//! # Quick Start
//!
//! ```ignore
//! use docrest::{prelude::*, memory::InMemoryStore};
//! use http::Method;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DocrestConfig::load()?;
//!     init_tracing(&config);
//!
//!     let items = Schema::builder("items")
//!         .field(Field::new("code").required().unique())
//!         .build();
//!     let handler = CollectionHandler::new(items, InMemoryStore::builder().build().await?);
//!     handler.init().await?;
//!
//!     let created = handler
//!         .handle(
//!             HttpRequest::builder(Method::POST)
//!                 .json_content()
//!                 .body(json!({ "code": "abc" }))
//!                 .build(),
//!         )
//!         .await;
//!     assert_eq!(created.status, 201);
//!
//!     let listed = handler
//!         .handle(HttpRequest::builder(Method::GET).query("q", "code:ABC").build())
//!         .await;
//!     println!("{}", listed.body.unwrap_or_default());
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires `mongodb` feature)

pub mod config;
pub mod handler;
pub mod prelude;
pub mod telemetry;

pub use docrest_core::{
    backend, classify, document, error, page, populate, query, repository, request, response,
    retry, schema, validate,
};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docrest_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docrest_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
