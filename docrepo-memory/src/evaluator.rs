//! Filter expression evaluation for in-memory documents.
//!
//! This module provides the evaluation engine for filter expressions,
//! enabling filtering and comparison operations on BSON documents.

use std::cmp::Ordering;
use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

use docrepo_core::{
    query::{QueryVisitor, Expr, FieldOp},
    error::{DocumentStoreError, DocumentStoreResult},
};


/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalized to f64 so that `Int32(1)` equals `Double(1.0)`.
/// Values of different types order by their type bracket, the way a
/// MongoDB server sorts mixed fields: null, numbers, strings, documents,
/// arrays, object ids, booleans, dates.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    /// All integers and floats normalized to f64
    Number(f64),
    DateTime(DateTime),
    ObjectId(ObjectId),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    /// Fields in document order
    Map(Vec<(&'a str, Comparable<'a>)>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<Vec<_>>()
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> Comparable<'a> {
    fn bracket(&self) -> u8 {
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

    /// Total order over all values, used for sorting.
    ///
    /// NaN sorts below every other number.
    pub(crate) fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Ordering::Equal,
            (Comparable::Number(a), Comparable::Number(b)) => match (a.is_nan(), b.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            },
            (Comparable::String(a), Comparable::String(b)) => a.cmp(b),
            (Comparable::Map(a), Comparable::Map(b)) => a
                .iter()
                .zip(b.iter())
                .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| va.total_cmp(vb)))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (Comparable::Array(a), Comparable::Array(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| x.total_cmp(y))
                .find(|ordering| ordering.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.cmp(b),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.cmp(b),
            _ => self.bracket().cmp(&other.bracket()),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
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

/// Range comparisons only hold between values of the same type bracket.
impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            _ if self.bracket() == other.bracket() => Some(self.total_cmp(other)),
            _ => None,
        }
    }
}

/// Resolves a possibly dotted field path (`address.city`) inside a document.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            Bson::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

fn contains_any(haystack: &[Comparable<'_>], needles: &[Comparable<'_>]) -> bool {
    needles
        .iter()
        .any(|needle| haystack.iter().any(|item| item == needle))
}

/// Applies `test` to the field value, then to each of its elements when it is an array.
fn matches_field(field_value: &Bson, value: &Bson, test: impl for<'v> Fn(&Comparable<'v>, &Comparable<'v>) -> bool) -> bool {
    let target = Comparable::from(value);
    let whole = Comparable::from(field_value);

    if test(&whole, &target) {
        return true;
    }

    match &whole {
        Comparable::Array(items) => items.iter().any(|item| test(item, &target)),
        _ => false,
    }
}

fn matches_range(field_value: &Bson, value: &Bson, op: &FieldOp) -> bool {
    matches_field(field_value, value, |left, right| {
        match left.partial_cmp(right) {
            Some(ordering) => match op {
                FieldOp::Gt => ordering == Ordering::Greater,
                FieldOp::Gte => ordering != Ordering::Less,
                FieldOp::Lt => ordering == Ordering::Less,
                _ => ordering != Ordering::Greater,
            },
            None => false,
        }
    })
}

fn substring_of(item: &Comparable<'_>, needle: &str) -> bool {
    matches!(item, Comparable::String(text) if text.contains(needle))
}

fn matches_any(field_value: &Bson, value: &Bson) -> bool {
    match (Comparable::from(field_value), Comparable::from(value)) {
        (Comparable::Array(array), Comparable::Array(values)) => contains_any(&array, &values),
        (Comparable::Array(array), single_value) => array.iter().any(|item| item == &single_value),
        (single_value, Comparable::Array(values)) => values.iter().any(|val| val == &single_value),
        (left, right) => left == right,
    }
}


pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> DocumentStoreResult<bool> {
        self.visit_expr(expr)
    }

    /// Returns the documents matching `expr`, preserving their order.
    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Document>,
        expr: &Expr,
    ) -> DocumentStoreResult<Vec<&'a Document>> {
        let mut matched = Vec::new();

        for document in documents {
            if DocumentEvaluator::new(document).evaluate(expr)? {
                matched.push(document);
            }
        }

        Ok(matched)
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(lookup(self.document, field).is_some() == should_exist)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = lookup(self.document, field) else {
            // Missing fields only satisfy the negative operators
            return Ok(matches!(op, FieldOp::Ne | FieldOp::NotContains | FieldOp::NoneOf));
        };

        match op {
            FieldOp::Eq => Ok(matches_field(field_value, value, |left, right| left == right)),
            FieldOp::Ne => Ok(!matches_field(field_value, value, |left, right| left == right)),
            FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => Ok(matches_range(field_value, value, op)),
            FieldOp::Contains => match (Comparable::from(field_value), Comparable::from(value)) {
                (Comparable::Array(array), Comparable::Array(values)) => Ok(
                    values
                        .iter()
                        .all(|val| array.iter().any(|item| item == val))
                ),
                (Comparable::Array(array), Comparable::String(needle)) => Ok(array.iter().any(|item| substring_of(item, needle))),
                (Comparable::Array(array), single_value) => Ok(array.iter().any(|item| item == &single_value)),
                (Comparable::String(left), Comparable::String(right)) => Ok(left.contains(right)),
                (_, Comparable::String(_)) => Ok(false),
                (left, right) => Ok(left == right),
            },
            FieldOp::NotContains => match (Comparable::from(field_value), Comparable::from(value)) {
                (Comparable::Array(array), Comparable::Array(values)) => Ok(!contains_any(&array, &values)),
                (Comparable::Array(array), Comparable::String(needle)) => Ok(!array.iter().any(|item| substring_of(item, needle))),
                (Comparable::Array(array), single_value) => Ok(!array.iter().any(|item| item == &single_value)),
                (Comparable::String(left), Comparable::String(right)) => Ok(!left.contains(right)),
                (_, Comparable::String(_)) => Ok(true),
                (left, right) => Ok(left != right),
            },
            FieldOp::StartsWith => match (Comparable::from(field_value), Comparable::from(value)) {
                (Comparable::String(left), Comparable::String(right)) => Ok(left.starts_with(right)),
                _ => Ok(false),
            },
            FieldOp::EndsWith => match (Comparable::from(field_value), Comparable::from(value)) {
                (Comparable::String(left), Comparable::String(right)) => Ok(left.ends_with(right)),
                _ => Ok(false),
            },
            FieldOp::AnyOf => Ok(matches_any(field_value, value)),
            FieldOp::NoneOf => Ok(!matches_any(field_value, value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docrepo_core::query::Filter;

    fn person() -> Document {
        doc! {
            "_id": ObjectId::from_bytes([1; 12]),
            "name": "Ada Lovelace",
            "age": 36,
            "score": 9.5,
            "tags": ["math", "poetry"],
            "address": { "city": "London", "zip": "W1" },
        }
    }

    fn eval(expr: Expr) -> bool {
        DocumentEvaluator::new(&person()).evaluate(&expr).unwrap()
    }

    #[test]
    fn equality_normalizes_numbers() {
        assert!(eval(Filter::eq("age", 36.0)));
        assert!(eval(Filter::eq("age", 36_i64)));
        assert!(!eval(Filter::eq("age", 37)));
        assert!(eval(Filter::ne("name", "Grace")));
    }

    #[test]
    fn ordering_operators() {
        assert!(eval(Filter::gt("age", 18)));
        assert!(eval(Filter::gte("age", 36)));
        assert!(eval(Filter::lte("score", 9.5)));
        assert!(!eval(Filter::lt("age", 36)));
        assert!(!eval(Filter::gt("name", 3)));
    }

    #[test]
    fn matches_object_ids() {
        assert!(eval(Filter::id(ObjectId::from_bytes([1; 12]))));
        assert!(!eval(Filter::id(ObjectId::from_bytes([2; 12]))));
    }

    #[test]
    fn string_operators() {
        assert!(eval(Filter::contains("name", "Love")));
        assert!(eval(Filter::starts_with("name", "Ada")));
        assert!(eval(Filter::ends_with("name", "lace")));
        assert!(eval(Filter::not_contains("name", "Hopper")));
    }

    #[test]
    fn array_operators() {
        assert!(eval(Filter::contains("tags", "math")));
        assert!(eval(Filter::contains("tags", vec!["math", "poetry"])));
        assert!(!eval(Filter::contains("tags", vec!["math", "chess"])));
        assert!(eval(Filter::any_of("tags", vec!["chess", "poetry"])));
        assert!(eval(Filter::none_of("tags", vec!["chess"])));
        assert!(eval(Filter::any_of("name", vec!["Grace Hopper", "Ada Lovelace"])));
    }

    #[test]
    fn dotted_paths_reach_nested_fields() {
        assert!(eval(Filter::eq("address.city", "London")));
        assert!(eval(Filter::eq("tags.1", "poetry")));
        assert!(eval(Filter::exists("address.zip")));
        assert!(eval(Filter::not_exists("address.country")));
    }

    #[test]
    fn missing_fields_only_match_negative_operators() {
        assert!(!eval(Filter::eq("missing", "x")));
        assert!(eval(Filter::ne("missing", "x")));
        assert!(eval(Filter::none_of("missing", vec!["x"])));
    }

    #[test]
    fn scalar_operators_match_array_elements() {
        assert!(eval(Filter::eq("tags", "math")));
        assert!(eval(Filter::eq("tags", vec!["math", "poetry"])));
        assert!(!eval(Filter::ne("tags", "poetry")));
        assert!(eval(Filter::ne("tags", "chess")));

        let document = doc! { "scores": [3, 12, 7] };
        let check = |expr: Expr| DocumentEvaluator::new(&document).evaluate(&expr).unwrap();
        assert!(check(Filter::gt("scores", 10)));
        assert!(!check(Filter::gt("scores", 12)));
        assert!(check(Filter::lte("scores", 3)));
    }

    #[test]
    fn contains_on_non_string_fields_is_equality() {
        assert!(eval(Filter::contains("age", 36)));
        assert!(!eval(Filter::contains("age", 37)));
        assert!(!eval(Filter::not_contains("age", 36)));
        assert!(eval(Filter::not_contains("age", 37)));
        assert!(!eval(Filter::contains("age", "36")));
        assert!(eval(Filter::not_contains("age", "36")));
    }

    #[test]
    fn contains_string_searches_array_elements() {
        assert!(eval(Filter::contains("tags", "poe")));
        assert!(!eval(Filter::contains("tags", "chess")));
        assert!(!eval(Filter::not_contains("tags", "at")));
    }

    #[test]
    fn mixed_types_have_a_total_order() {
        let values = [
            Bson::Boolean(true),
            Bson::String("b".into()),
            Bson::Int32(2),
            Bson::Null,
            Bson::Double(f64::NAN),
            Bson::Array(vec![Bson::Int32(1)]),
            Bson::String("a".into()),
            Bson::Document(doc! { "k": 1 }),
            Bson::Double(-1.5),
        ];
        let mut sorted = values.iter().map(Comparable::from).collect::<Vec<_>>();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let brackets = sorted.iter().map(Comparable::bracket).collect::<Vec<_>>();
        assert_eq!(brackets, vec![0, 1, 1, 1, 2, 2, 3, 4, 6]);
        assert!(matches!(sorted[1], Comparable::Number(n) if n.is_nan()));
        assert!(matches!(sorted[2], Comparable::Number(n) if n == -1.5));
        assert!(matches!(sorted[4], Comparable::String("a")));
    }

    #[test]
    fn logical_combinators() {
        assert!(eval(Filter::eq("name", "Ada Lovelace").and(Filter::gt("age", 30))));
        assert!(eval(Filter::eq("name", "Grace").or(Filter::exists("tags"))));
        assert!(eval(Filter::eq("name", "Grace").not()));
        assert!(eval(Filter::and([])));
        assert!(!eval(Filter::or([])));
    }
}
