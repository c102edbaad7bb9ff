//! Population directives parsed from the `populate` query parameter.
//!
//! Each comma-separated item is a colon-separated path through reference
//! fields. Items sharing a prefix merge into one tree:
//!
//! ```text
//! populate=child:child,other
//! ```
//!
//! becomes `[{path: child, populate: [{path: child}]}, {path: other}]`.

use serde::Serialize;

/// One reference field to resolve, with the references to resolve inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopulatePath {
    pub path: String,
    #[serde(skip_serializing_if = "Population::is_empty")]
    pub populate: Population,
}

impl PopulatePath {
    pub fn new(path: impl Into<String>) -> Self {
        PopulatePath { path: path.into(), populate: Population::default() }
    }
}

/// An ordered list of [`PopulatePath`]s. Paths keep first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Population {
    paths: Vec<PopulatePath>,
}

impl Population {
    pub fn new() -> Self {
        Population::default()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[PopulatePath] {
        &self.paths
    }

    /// Adds a chain of reference fields, merging with any existing prefix.
    pub fn insert(&mut self, keys: &[&str]) {
        let Some((first, rest)) = keys.split_first() else {
            return;
        };
        let index = match self.paths.iter().position(|p| p.path == *first) {
            Some(index) => index,
            None => {
                self.paths.push(PopulatePath::new(*first));
                self.paths.len() - 1
            }
        };
        self.paths[index].populate.insert(rest);
    }
}

/// Parses a raw `populate` parameter into a [`Population`] tree.
pub fn parse_population(raw: &str) -> Population {
    let mut population = Population::new();
    for item in raw.split(',') {
        let keys: Vec<&str> = item
            .split(':')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .collect();
        population.insert(&keys);
    }
    population
}
