//! Core of docrest: a generic CRUD-over-HTTP adapter for document stores.
//!
//! This crate provides:
//!
//! - **Query grammar** ([`query`]) - Parsers for the `q`, `fields`, `populate` and `sort` parameters
//! - **Store backend abstraction** ([`backend`]) - The trait concrete databases implement
//! - **Schemas** ([`schema`]) - Collection declarations: required, unique and reference fields
//! - **Repository facade** ([`repository`]) - getOne, getMany, insertMany, updateOne, deactivateOne
//! - **Population** ([`populate`]) - Resolution of reference fields into documents
//! - **Requests and responses** ([`request`], [`response`], [`validate`]) - HTTP-style values, validation and JSON normalization
//! - **Error handling** ([`error`], [`classify`]) - Store errors and the external error taxonomy
//! - **Pagination** ([`page`]) - Page windows and the list envelope
//! - **Connecting** ([`retry`], [`config`]) - Bounded retry and connection settings
//!
//! # Example
//!
//! ```ignore
//! use docrest_core::repository::Repository;
//! use docrest_core::schema::{Field, Schema};
//!
//! let items = Schema::builder("items")
//!     .field(Field::new("code").required().unique())
//!     .build();
//!
//! let repository = Repository::new(items, &backend);
//! repository.sync_indexes().await?;
//! let response = repository.get_one(id, &Default::default(), &Default::default()).await;
//! ```

pub mod backend;
pub mod classify;
pub mod config;
pub mod document;
pub mod error;
pub mod page;
pub mod populate;
pub mod query;
pub mod repository;
pub mod request;
pub mod response;
pub mod retry;
pub mod schema;
pub mod validate;
