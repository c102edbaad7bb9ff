//! Query translation from docrest criteria to MongoDB query syntax.
//!
//! Criteria are flattened into one filter document keyed by dotted paths.
//! Projections and sort specifications map directly onto their MongoDB
//! document forms.

use bson::{Bson, Document, doc};

use docrest_core::{
    error::StoreError,
    query::{CriteriaVisitor, Projection, SortDirection, SortSpec},
};

/// Translates docrest criteria into MongoDB filter documents.
pub(crate) struct MongoQueryTranslator;

impl CriteriaVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = StoreError;

    fn visit_null(&mut self, path: &str) -> Result<Self::Output, Self::Error> {
        Ok(doc! { path: Bson::Null })
    }

    fn visit_undefined(&mut self, path: &str) -> Result<Self::Output, Self::Error> {
        Ok(doc! { path: { "$exists": false } })
    }

    fn visit_eq(&mut self, path: &str, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! { path: value.clone() })
    }

    fn visit_pattern(&mut self, path: &str, pattern: &str) -> Result<Self::Output, Self::Error> {
        Ok(doc! { path: { "$regex": pattern, "$options": "i" } })
    }

    fn visit_and(&mut self, outputs: Vec<Self::Output>) -> Result<Self::Output, Self::Error> {
        let mut filter = Document::new();
        for (key, value) in outputs.into_iter().flatten() {
            filter.insert(key, value);
        }
        Ok(filter)
    }
}

pub(crate) fn projection_document(projection: &Projection) -> Option<Document> {
    (!projection.is_empty()).then(|| projection.to_document())
}

pub(crate) fn sort_document(sort: &SortSpec) -> Option<Document> {
    let keys = sort.keys();
    if keys.is_empty() {
        return None;
    }
    let mut document = Document::new();
    for key in keys {
        document.insert(
            key.field,
            match key.direction {
                SortDirection::Asc => 1,
                SortDirection::Desc => -1,
            },
        );
    }
    Some(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrest_core::query::{parse_fields, parse_query, parse_sort};

    fn translate(raw: &str) -> Document {
        MongoQueryTranslator.visit_criteria(&parse_query(raw)).unwrap()
    }

    #[test]
    fn translates_literals_and_keywords() {
        assert_eq!(translate("code:null"), doc! { "code": Bson::Null });
        assert_eq!(translate("code:undefined"), doc! { "code": { "$exists": false } });
        assert_eq!(translate("code:true"), doc! { "code": true });
        assert_eq!(translate("code:0"), doc! { "code": 0_i64 });
        assert_eq!(translate("note:"), doc! { "note": "" });
    }

    #[test]
    fn translates_patterns() {
        assert_eq!(
            translate("code:CODE"),
            doc! { "code": { "$regex": "CODE", "$options": "i" } }
        );
    }

    #[test]
    fn flattens_nested_criteria() {
        assert_eq!(
            translate("child.code:2,isActive:true"),
            doc! { "child.code": 2_i64, "isActive": true }
        );
    }

    #[test]
    fn empty_criteria_match_everything() {
        assert_eq!(translate(""), doc! {});
    }

    #[test]
    fn projection_and_sort_documents() {
        assert_eq!(projection_document(&parse_fields("")), None);
        assert_eq!(projection_document(&parse_fields("a,b")), Some(doc! { "a": 1, "b": 1 }));
        assert_eq!(sort_document(&parse_sort("")), None);
        assert_eq!(sort_document(&parse_sort("a,-b")), Some(doc! { "a": 1, "b": -1 }));
    }
}
