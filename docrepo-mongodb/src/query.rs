//! Translation from docrepo filter expressions to MongoDB query syntax.

use bson::{Document, Bson, doc};

use docrepo_core::{
    query::{QueryVisitor, Expr, FieldOp},
    error::DocumentStoreError,
};


/// Translates filter expressions into MongoDB filter documents.
///
/// String operators become anchored, escaped, case-sensitive regular
/// expressions so that they match exactly what the in-memory evaluator matches.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    fn escape(pattern: &str) -> String {
        let mut escaped = String::with_capacity(pattern.len());

        for c in pattern.chars() {
            if "\\^$.|?*+()[]{}/-".contains(c) {
                escaped.push('\\');
            }
            escaped.push(c);
        }

        escaped
    }

    fn regex(pattern: String) -> Document {
        doc! { "$regex": pattern }
    }

    fn string_operand<'v>(op: &FieldOp, value: &'v Bson) -> Result<&'v str, DocumentStoreError> {
        match value {
            Bson::String(s) => Ok(s),
            _ => Err(DocumentStoreError::InvalidDocument(format!("{op:?} operator requires a string value"))),
        }
    }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        if exprs.is_empty() {
            return Ok(doc! {});
        }

        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        if exprs.is_empty() {
            // $or rejects an empty list; match nothing instead
            return Ok(doc! { "$expr": false });
        }

        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        // $not only applies to field operators, $nor negates a whole filter
        Ok(doc! {
            "$nor": [self.visit_expr(expr)?],
        })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: { "$exists": should_exist },
        })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: match op {
                FieldOp::Eq => doc! { "$eq": value },
                FieldOp::Ne => doc! { "$ne": value },
                FieldOp::Gt => doc! { "$gt": value },
                FieldOp::Gte => doc! { "$gte": value },
                FieldOp::Lt => doc! { "$lt": value },
                FieldOp::Lte => doc! { "$lte": value },
                FieldOp::Contains => match value {
                    Bson::String(s) => Self::regex(Self::escape(s)),
                    Bson::Array(arr) => doc! { "$all": arr },
                    _ => doc! { "$eq": value },
                },
                FieldOp::NotContains => match value {
                    Bson::String(s) => doc! { "$not": Self::regex(Self::escape(s)) },
                    Bson::Array(arr) => doc! { "$nin": arr },
                    _ => doc! { "$ne": value },
                },
                FieldOp::StartsWith => Self::regex(format!("^{}", Self::escape(Self::string_operand(op, value)?))),
                FieldOp::EndsWith => Self::regex(format!("{}$", Self::escape(Self::string_operand(op, value)?))),
                FieldOp::AnyOf => match value {
                    Bson::Array(arr) => doc! { "$in": arr },
                    _ => doc! { "$in": [value] },
                },
                FieldOp::NoneOf => match value {
                    Bson::Array(arr) => doc! { "$nin": arr },
                    _ => doc! { "$nin": [value] },
                },
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;
    use docrepo_core::query::Filter;

    fn translate(expr: Expr) -> Document {
        MongoQueryTranslator.visit_expr(&expr).unwrap()
    }

    #[test]
    fn equality_on_name() {
        assert_eq!(translate(Filter::eq("name", "Test")), doc! { "name": { "$eq": "Test" } });
    }

    #[test]
    fn id_filter_targets_underscore_id() {
        let id = ObjectId::new();

        assert_eq!(translate(Filter::id(id)), doc! { "_id": { "$eq": id } });
    }

    #[test]
    fn string_operators_escape_their_operand() {
        assert_eq!(translate(Filter::starts_with("name", "a.b")), doc! { "name": { "$regex": "^a\\.b" } });
        assert_eq!(translate(Filter::ends_with("name", "(x)")), doc! { "name": { "$regex": "\\(x\\)$" } });
        assert_eq!(translate(Filter::contains("name", "ad")), doc! { "name": { "$regex": "ad" } });
        assert_eq!(
            translate(Filter::not_contains("name", "ad")),
            doc! { "name": { "$not": { "$regex": "ad" } } }
        );
    }

    #[test]
    fn starts_with_rejects_non_strings() {
        let err = MongoQueryTranslator.visit_expr(&Filter::starts_with("age", 3)).unwrap_err();

        assert!(matches!(err, DocumentStoreError::InvalidDocument(_)));
    }

    #[test]
    fn membership_operators_accept_scalars() {
        assert_eq!(translate(Filter::any_of("tag", vec!["a", "b"])), doc! { "tag": { "$in": ["a", "b"] } });
        assert_eq!(translate(Filter::none_of("tag", "a")), doc! { "tag": { "$nin": ["a"] } });
        assert_eq!(translate(Filter::contains("tags", vec!["a"])), doc! { "tags": { "$all": ["a"] } });
    }

    #[test]
    fn logical_operators() {
        assert_eq!(
            translate(Filter::eq("a", 1).and(Filter::exists("b"))),
            doc! { "$and": [{ "a": { "$eq": 1 } }, { "b": { "$exists": true } }] }
        );
        assert_eq!(
            translate(Filter::eq("a", 1).not()),
            doc! { "$nor": [{ "a": { "$eq": 1 } }] }
        );
        assert_eq!(translate(Filter::and([])), doc! {});
        assert_eq!(translate(Filter::or([])), doc! { "$expr": false });
    }
}
