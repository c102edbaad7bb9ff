//! Criteria evaluation for in-memory document filtering.
//!
//! This module matches documents against a [`Criteria`] tree the way a
//! document database would: dotted paths reach into sub-documents and across
//! arrays, `null` matches absent fields, and patterns are case-insensitive
//! regular expressions.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};
use regex::{Regex, RegexBuilder};

use docrest_core::{
    error::{StoreError, StoreResult},
    query::{Criteria, CriteriaVisitor, Sort, SortDirection},
};

/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalized to f64 so `Int32`, `Int64` and `Double`
/// compare by value.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    ObjectId(ObjectId),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(arr.iter().map(Comparable::from).collect()),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect(),
            ),
            _ => Comparable::Null,
        }
    }
}

impl Comparable<'_> {
    /// Position in the cross-type sort order: null, numbers, strings,
    /// documents, arrays, ObjectIds, booleans, dates.
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Number(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::ObjectId(_) => 5,
            Comparable::Bool(_) => 6,
            Comparable::DateTime(_) => 7,
        }
    }

    /// Total order used for sorting; incomparable values of the same type tie.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| self.partial_cmp(other).unwrap_or(Ordering::Equal))
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Resolves a dotted path to every value it reaches.
///
/// Arrays of sub-documents are traversed element-wise; a numeric segment
/// indexes into an array.
pub(crate) fn resolve<'d>(document: &'d Document, path: &str) -> Vec<&'d Bson> {
    let mut segments = path.split('.');
    let mut current: Vec<&Bson> = segments
        .next()
        .and_then(|first| document.get(first))
        .into_iter()
        .collect();

    for segment in segments {
        let mut next = Vec::new();
        for value in current {
            match value {
                Bson::Document(inner) => next.extend(inner.get(segment)),
                Bson::Array(items) => match segment.parse::<usize>() {
                    Ok(index) => next.extend(items.get(index)),
                    Err(_) => next.extend(items.iter().filter_map(|item| match item {
                        Bson::Document(inner) => inner.get(segment),
                        _ => None,
                    })),
                },
                _ => {}
            }
        }
        current = next;
    }

    current
}

/// Resolved values plus, for arrays, their elements.
fn candidates<'d>(document: &'d Document, path: &str) -> Vec<&'d Bson> {
    let mut values = Vec::new();
    for value in resolve(document, path) {
        values.push(value);
        if let Bson::Array(items) = value {
            values.extend(items.iter());
        }
    }
    values
}

/// Compiled case-insensitive patterns, shared across the documents of one scan.
#[derive(Debug, Default)]
pub(crate) struct PatternCache {
    compiled: HashMap<String, Regex>,
}

impl PatternCache {
    fn get(&mut self, pattern: &str) -> StoreResult<&Regex> {
        if !self.compiled.contains_key(pattern) {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| StoreError::Backend(format!("invalid pattern {pattern:?}: {e}")))?;
            self.compiled.insert(pattern.to_string(), regex);
        }
        Ok(&self.compiled[pattern])
    }
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
    patterns: &'a mut PatternCache,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document, patterns: &'a mut PatternCache) -> Self {
        Self { document, patterns }
    }

    pub fn evaluate(&mut self, criteria: &Criteria) -> StoreResult<bool> {
        self.visit_criteria(criteria)
    }

    /// Returns the documents matching `criteria`, in their original order.
    pub fn filter_documents<'d>(
        documents: impl IntoIterator<Item = &'d Document>,
        criteria: &Criteria,
    ) -> StoreResult<Vec<&'d Document>> {
        let mut patterns = PatternCache::default();
        let mut matched = Vec::new();
        for document in documents {
            if DocumentEvaluator::new(document, &mut patterns).evaluate(criteria)? {
                matched.push(document);
            }
        }
        Ok(matched)
    }
}

impl CriteriaVisitor for DocumentEvaluator<'_> {
    type Output = bool;
    type Error = StoreError;

    fn visit_null(&mut self, path: &str) -> Result<Self::Output, Self::Error> {
        let values = candidates(self.document, path);
        Ok(values.is_empty() || values.iter().any(|v| matches!(v, Bson::Null | Bson::Undefined)))
    }

    fn visit_undefined(&mut self, path: &str) -> Result<Self::Output, Self::Error> {
        Ok(resolve(self.document, path).is_empty())
    }

    fn visit_eq(&mut self, path: &str, value: &Bson) -> Result<Self::Output, Self::Error> {
        let expected = Comparable::from(value);
        Ok(candidates(self.document, path)
            .into_iter()
            .any(|candidate| Comparable::from(candidate) == expected))
    }

    fn visit_pattern(&mut self, path: &str, pattern: &str) -> Result<Self::Output, Self::Error> {
        let regex = self.patterns.get(pattern)?;
        Ok(candidates(self.document, path)
            .into_iter()
            .any(|candidate| matches!(candidate, Bson::String(s) if regex.is_match(s))))
    }

    fn visit_and(&mut self, outputs: Vec<Self::Output>) -> Result<Self::Output, Self::Error> {
        Ok(outputs.into_iter().all(|matched| matched))
    }
}

/// Orders two documents by a multi-key sort specification.
pub(crate) fn compare_documents(a: &Document, b: &Document, keys: &[Sort]) -> Ordering {
    for key in keys {
        let left = resolve(a, &key.field).first().map(|v| Comparable::from(*v)).unwrap_or(Comparable::Null);
        let right = resolve(b, &key.field).first().map(|v| Comparable::from(*v)).unwrap_or(Comparable::Null);
        let ordering = match key.direction {
            SortDirection::Asc => left.sort_cmp(&right),
            SortDirection::Desc => right.sort_cmp(&left),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
