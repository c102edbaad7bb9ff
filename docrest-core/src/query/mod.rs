//! Query-string grammar and the backend-neutral find query.
//!
//! Four request parameters drive reads:
//!
//! - `q` selects documents, parsed by [`parse_query`] into a [`Criteria`] tree
//! - `fields` limits the returned fields, parsed by [`parse_fields`]
//! - `populate` names reference fields to resolve, parsed by [`parse_population`]
//! - `sort` orders results, parsed by [`parse_sort`]
//!
//! Parsed pieces are assembled into a [`FindQuery`] with the fluent builder:
//!
//! ```ignore
//! use docrest::query::{FindQuery, parse_query, parse_sort};
//!
//! let query = FindQuery::builder()
//!     .criteria(parse_query("code:abc"))
//!     .sort(parse_sort("-rank"))
//!     .skip(20)
//!     .limit(10)
//!     .build();
//! ```
//!
//! Backends translate [`Criteria`] by implementing [`CriteriaVisitor`].

mod coerce;
mod criteria;
mod population;
mod projection;
mod sort;

use bson::Bson;

pub use coerce::coerce;
pub use criteria::{Criteria, CriteriaValue, parse_query};
pub use population::{PopulatePath, Population, parse_population};
pub use projection::{Projection, parse_fields};
pub use sort::{Sort, SortDirection, SortSpec, parse_sort};

use crate::error::StoreError;

/// A structured read against one collection.
///
/// Use [`FindQueryBuilder`] for ergonomic construction.
#[derive(Debug, Clone, Default)]
pub struct FindQuery {
    /// Selection criteria. Empty criteria select every document.
    pub criteria: Criteria,
    /// Fields to return.
    pub projection: Projection,
    /// Result ordering.
    pub sort: SortSpec,
    /// Number of documents to skip.
    pub skip: Option<u64>,
    /// Maximum number of documents to return.
    pub limit: Option<u64>,
}

impl FindQuery {
    /// Creates a query that selects every document.
    pub fn new() -> Self {
        FindQuery::default()
    }

    /// Creates a new query builder for fluent construction.
    pub fn builder() -> FindQueryBuilder {
        FindQueryBuilder::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FindQueryBuilder {
    query: FindQuery,
}

impl FindQueryBuilder {
    pub fn new() -> Self {
        FindQueryBuilder { query: FindQuery::default() }
    }

    /// Sets the selection criteria.
    pub fn criteria(mut self, criteria: Criteria) -> Self {
        self.query.criteria = criteria;
        self
    }

    /// Sets the fields to return.
    pub fn projection(mut self, projection: Projection) -> Self {
        self.query.projection = projection;
        self
    }

    /// Sets the sort specification.
    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.query.sort = sort;
        self
    }

    /// Sets the number of documents to skip.
    pub fn skip(mut self, skip: u64) -> Self {
        self.query.skip = Some(skip);
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn build(self) -> FindQuery {
        self.query
    }
}

/// Translates a [`Criteria`] tree into a backend-specific form.
///
/// Nested mappings are flattened into dotted paths before the leaf methods
/// are called; [`visit_and`](Self::visit_and) then combines the leaf results.
pub trait CriteriaVisitor {
    type Output;
    type Error: Into<StoreError>;

    fn visit_null(&mut self, path: &str) -> Result<Self::Output, Self::Error>;
    fn visit_undefined(&mut self, path: &str) -> Result<Self::Output, Self::Error>;
    fn visit_eq(&mut self, path: &str, value: &Bson) -> Result<Self::Output, Self::Error>;
    fn visit_pattern(&mut self, path: &str, pattern: &str) -> Result<Self::Output, Self::Error>;
    fn visit_and(&mut self, outputs: Vec<Self::Output>) -> Result<Self::Output, Self::Error>;

    fn visit_value(
        &mut self,
        path: &str,
        value: &CriteriaValue,
    ) -> Result<Self::Output, Self::Error> {
        match value {
            CriteriaValue::Null => self.visit_null(path),
            CriteriaValue::Undefined => self.visit_undefined(path),
            CriteriaValue::Pattern(pattern) => self.visit_pattern(path, pattern),
            CriteriaValue::Nested(nested) => {
                let mut outputs = Vec::with_capacity(nested.len());
                for (key, value) in nested.iter() {
                    outputs.push(self.visit_value(&format!("{path}.{key}"), value)?);
                }
                self.visit_and(outputs)
            }
            CriteriaValue::Bool(b) => self.visit_eq(path, &Bson::Boolean(*b)),
            CriteriaValue::Int(i) => self.visit_eq(path, &Bson::Int64(*i)),
            CriteriaValue::Double(d) => self.visit_eq(path, &Bson::Double(*d)),
            CriteriaValue::String(s) => self.visit_eq(path, &Bson::String(s.clone())),
        }
    }

    fn visit_criteria(&mut self, criteria: &Criteria) -> Result<Self::Output, Self::Error> {
        let mut outputs = Vec::with_capacity(criteria.len());
        for (path, value) in criteria.leaves() {
            outputs.push(self.visit_value(&path, value)?);
        }
        self.visit_and(outputs)
    }
}
