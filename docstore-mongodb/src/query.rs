//! Query translation into MongoDB query syntax.
//!
//! This module translates the store-neutral filter expressions into
//! MongoDB BSON documents for execution by the MongoDB query engine.

use bson::{Bson, Document, doc};

use docstore_core::{
    error::PersistenceError,
    query::{Expr, FieldOp, QueryVisitor},
};

/// Translates filter expressions into MongoDB query documents.
///
/// Implements the [`QueryVisitor`] trait to convert the abstract
/// expressions into MongoDB's native BSON query syntax.
pub(crate) struct MongoQueryTranslator;

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = PersistenceError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: match op {
                FieldOp::Eq => doc! { "$eq": value },
                FieldOp::In => doc! { "$in": value },
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_translates_to_eq_operator() {
        let expr = Expr::eq("name", "widget");
        let translated = MongoQueryTranslator.visit_expr(&expr).unwrap();

        assert_eq!(translated, doc! { "name": { "$eq": "widget" } });
    }

    #[test]
    fn membership_translates_to_in_operator() {
        let expr = Expr::is_in("id", vec![Bson::Int64(1), Bson::Int64(2)]);
        let translated = MongoQueryTranslator.visit_expr(&expr).unwrap();

        assert_eq!(translated, doc! { "id": { "$in": [1i64, 2i64] } });
    }

    #[test]
    fn conjunction_translates_to_and_operator() {
        let expr = Expr::eq("a", 1).and(Expr::eq("b", "x"));
        let translated = MongoQueryTranslator.visit_expr(&expr).unwrap();

        assert_eq!(
            translated,
            doc! { "$and": [
                { "a": { "$eq": 1 } },
                { "b": { "$eq": "x" } },
            ] }
        );
    }
}
