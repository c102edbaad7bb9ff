//! In-memory document storage backend for docrest.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is ideal for development
//! and testing.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Full criteria support** - Dotted paths, null/absent matching, case-insensitive patterns
//! - **Unique indexes** - `_id` and declared unique fields reject duplicates
//! - **Projection, multi-key sort and windows** - Same read semantics as the MongoDB backend
//!
//! # Quick Start
//!
//! ```ignore
//! use docrest::{memory::InMemoryStore, handler::CollectionHandler, schema::{Field, Schema}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let items = Schema::builder("items").field(Field::new("code").required()).build();
//!     let handler = CollectionHandler::new(items, backend);
//!     handler.init().await?;
//!     Ok(())
//! }
//! ```

pub mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
