//! Selection criteria parsed from the `q` query parameter.
//!
//! The grammar is a comma-separated list of `path:value` tokens:
//!
//! ```text
//! q=code:CODE,child.code:CHILD,rank:3
//! ```
//!
//! Paths are dot-separated and build a nested [`Criteria`] tree; values go
//! through [`coerce`](super::coerce) unless they are empty. Tokens without a
//! colon are ignored, and later tokens for the same path replace earlier ones.

use super::coerce::coerce;

/// A single value in a [`Criteria`] tree.
#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaValue {
    /// Matches `null` or an absent field.
    Null,
    /// Matches only an absent field.
    Undefined,
    Bool(bool),
    Int(i64),
    Double(f64),
    /// Exact string equality. Only produced for empty values.
    String(String),
    /// Case-insensitive, unanchored regular expression.
    Pattern(String),
    /// A nested mapping keyed by the next path segment.
    Nested(Criteria),
}

/// An ordered mapping from field names to [`CriteriaValue`]s.
///
/// Insertion order is preserved; re-inserting an existing key replaces the
/// value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    entries: Vec<(String, CriteriaValue)>,
}

impl Criteria {
    /// Creates an empty criteria mapping.
    pub fn new() -> Self {
        Criteria { entries: Vec::new() }
    }

    /// Returns `true` when the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&CriteriaValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns `true` when `key` has an entry at the top level.
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Inserts `value` under `key`, replacing any existing value.
    pub fn insert(&mut self, key: impl Into<String>, value: CriteriaValue) {
        let key = key.into();
        match self.position(&key) {
            Some(index) => self.entries[index].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Chainable form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: CriteriaValue) -> Self {
        self.insert(key, value);
        self
    }

    /// Iterates over the top-level entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CriteriaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Walks the tree and returns every non-nested value with its dotted path.
    pub fn leaves(&self) -> Vec<(String, &CriteriaValue)> {
        let mut leaves = Vec::new();
        collect_leaves(self, None, &mut leaves);
        leaves
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Inserts `value` under `last` below the `parents` chain. A leaf met on
    /// the way is replaced by a nested mapping.
    fn insert_path(&mut self, parents: &[&str], last: &str, value: CriteriaValue) {
        let Some((first, rest)) = parents.split_first() else {
            self.insert(last, value);
            return;
        };

        let mut nested = match self.position(first) {
            Some(index) => match std::mem::replace(&mut self.entries[index].1, CriteriaValue::Null) {
                CriteriaValue::Nested(nested) => nested,
                _ => Criteria::new(),
            },
            None => Criteria::new(),
        };
        nested.insert_path(rest, last, value);
        self.insert(*first, CriteriaValue::Nested(nested));
    }
}

fn collect_leaves<'a>(
    criteria: &'a Criteria,
    prefix: Option<&str>,
    leaves: &mut Vec<(String, &'a CriteriaValue)>,
) {
    for (key, value) in &criteria.entries {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            CriteriaValue::Nested(nested) => collect_leaves(nested, Some(&path), leaves),
            leaf => leaves.push((path, leaf)),
        }
    }
}

/// Parses a raw `q` parameter into a [`Criteria`] tree.
///
/// Each comma-separated token is split on its first colon. Tokens with no
/// colon or an empty path are skipped, as are paths with no non-empty
/// segments. An empty value yields an exact match on the empty string.
pub fn parse_query(raw: &str) -> Criteria {
    let mut criteria = Criteria::new();

    for token in raw.split(',') {
        let Some((path, value)) = token.split_once(':') else {
            continue;
        };
        let keys: Vec<&str> = path.split('.').filter(|key| !key.is_empty()).collect();
        let Some((last, parents)) = keys.split_last() else {
            continue;
        };

        let value = if value.is_empty() {
            CriteriaValue::String(String::new())
        } else {
            coerce(value)
        };
        criteria.insert_path(parents, last, value);
    }

    criteria
}
