/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

/// One field of a sort specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// A space-separated sort specification, e.g. `"rank -code"`.
///
/// A leading `-` sorts that field in descending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec(String);

impl SortSpec {
    pub fn new(spec: impl Into<String>) -> Self {
        SortSpec(spec.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Splits the specification into its fields, in priority order.
    pub fn keys(&self) -> Vec<Sort> {
        self.0
            .split_whitespace()
            .filter_map(|token| {
                let (field, direction) = match token.strip_prefix('-') {
                    Some(field) => (field, SortDirection::Desc),
                    None => (token.strip_prefix('+').unwrap_or(token), SortDirection::Asc),
                };
                (!field.is_empty()).then(|| Sort { field: field.to_string(), direction })
            })
            .collect()
    }
}

/// Parses a comma-separated `sort` parameter by turning commas into spaces.
pub fn parse_sort(raw: &str) -> SortSpec {
    SortSpec(raw.replace(',', " "))
}
