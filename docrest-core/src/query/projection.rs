use bson::{Document, doc};

/// The set of fields to return from a read.
///
/// An empty projection returns whole documents. The identifier field is
/// always returned by the backends regardless of the listed fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<String>,
}

impl Projection {
    /// Creates a projection over the given fields, dropping blanks and duplicates.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut projection = Projection::default();
        for field in fields {
            let field = field.as_ref().trim();
            if !field.is_empty() && !projection.contains(field) {
                projection.fields.push(field.to_string());
            }
        }
        projection
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Renders the projection as an inclusion document (`{field: 1, ...}`).
    pub fn to_document(&self) -> Document {
        let mut document = doc! {};
        for field in &self.fields {
            document.insert(field.clone(), 1);
        }
        document
    }
}

/// Parses a comma-separated `fields` parameter into a [`Projection`].
pub fn parse_fields(raw: &str) -> Projection {
    Projection::new(raw.split(','))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_field_list() {
        let projection = parse_fields("a,b");
        assert_eq!(projection.fields(), ["a", "b"]);
        assert_eq!(projection.to_document(), doc! { "a": 1, "b": 1 });
    }

    #[test]
    fn blank_and_repeated_names_are_dropped() {
        let projection = parse_fields("a,, b ,a,");
        assert_eq!(projection.fields(), ["a", "b"]);
    }

    #[test]
    fn empty_input_projects_everything() {
        assert!(parse_fields("").is_empty());
        assert_eq!(parse_fields("").to_document(), doc! {});
    }
}
