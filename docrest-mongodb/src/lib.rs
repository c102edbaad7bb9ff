//! MongoDB backend implementation for docrest.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait.
//! Criteria are translated into native filter documents, so matching, sorting
//! and windowing run in the server.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docrest = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Features
//!
//! - **Persistent storage** - MongoDB Atlas or self-hosted MongoDB
//! - **Native queries** - Dotted-path filters, `$regex` patterns, projections and sorts
//! - **Duplicate-key detection** - Unique index violations surface as `StoreError::DuplicateKey`
//! - **Verified connections** - The builder pings the server; `MongoDbStore::connect` retries
//!
//! # Example
//!
//! ```ignore
//! use docrest::{config::StoreConfig, mongodb::MongoDbStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoDbStore::connect(&StoreConfig::default()).await?;
//!     Ok(())
//! }
//! ```

mod query;
pub mod store;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
