//! Query evaluation for in-memory document filtering and ordering.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, Document, datetime::DateTime};

use docstore_core::{
    error::{PersistenceError, PersistenceResult},
    query::{Expr, FieldOp, QueryVisitor, Sort, SortDirection},
};

/// Type-erased, comparable representation of BSON values.
///
/// Wraps BSON values for filtering and sorting, normalizing numeric types
/// to f64 for comparison.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
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
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr.iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>(),
            ),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>(),
            ),
            _ => Comparable::Null, // Other types are not comparable
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
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Evaluates filter expressions against a single document.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> PersistenceResult<bool> {
        self.visit_expr(expr)
    }

    /// Returns the documents matching the expression, preserving input order.
    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Document>,
        expr: &Expr,
    ) -> Vec<Document> {
        documents
            .into_iter()
            .filter(|doc| {
                DocumentEvaluator::new(doc)
                    .evaluate(expr)
                    .unwrap_or(false)
            })
            .cloned()
            .collect::<Vec<_>>()
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = PersistenceError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error> {
        match self.document.get(field) {
            Some(field_value) => match op {
                FieldOp::Eq => Ok(Comparable::from(field_value) == Comparable::from(value)),
                FieldOp::In => match value {
                    Bson::Array(candidates) => Ok(candidates
                        .iter()
                        .any(|c| Comparable::from(field_value) == Comparable::from(c))),
                    single => Ok(Comparable::from(field_value) == Comparable::from(single)),
                },
            },
            None => Ok(false),
        }
    }
}

/// Orders two documents by a multi-field sort specification; the first
/// non-equal field decides.
pub(crate) fn compare_documents(a: &Document, b: &Document, sorts: &[Sort]) -> Ordering {
    for sort in sorts {
        let left = a.get(&sort.field).map(Comparable::from).unwrap_or(Comparable::Null);
        let right = b.get(&sort.field).map(Comparable::from).unwrap_or(Comparable::Null);

        let ordering = match sort.direction {
            SortDirection::Asc => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
            SortDirection::Desc => right.partial_cmp(&left).unwrap_or(Ordering::Equal),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

/// Applies an inclusion projection: keeps only the named fields present in
/// the document.
pub(crate) fn project_document(document: &Document, fields: &[String]) -> Document {
    Document::from_iter(
        document
            .iter()
            .filter(|(k, _)| fields.contains(k))
            .map(|(k, v)| (k.clone(), v.clone())),
    )
}
