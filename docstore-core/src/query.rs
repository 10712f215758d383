//! Store-neutral query, update, and projection representation.
//!
//! The persistence engine composes caller-supplied filter/update/projection
//! specs into the types in this module; each storage driver then translates
//! them into its native syntax through the [`QueryVisitor`] pattern.

use bson::Bson;

use crate::error::PersistenceError;

/// Sort direction for query results.
#[derive(Debug, Clone, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Single-field sort specification. Queries combine several of these,
/// first entry is the primary sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// Field comparison operators emitted by the composer.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    /// Equal to (exact match).
    Eq,
    /// Value is a member of the given array.
    In,
}

/// A filter expression for matching documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match).
    And(Vec<Expr>),
    /// Field comparison expression.
    Field {
        field: String,
        op: FieldOp,
        value: Bson,
    },
}

impl Expr {
    /// Creates an equality expression.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Expr::Field { field: field.into(), op: FieldOp::Eq, value: value.into() }
    }

    /// Creates a set-membership expression. `values` becomes a BSON array.
    pub fn is_in(field: impl Into<String>, values: Vec<Bson>) -> Self {
        Expr::Field { field: field.into(), op: FieldOp::In, value: Bson::Array(values) }
    }

    /// Combines this expression with another using logical AND.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }
}

/// An ordered list of field-level "set" operations, applied as one atomic
/// update command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOps {
    pub sets: Vec<(String, Bson)>,
}

impl UpdateOps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.sets.push((field.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// A structured query: filter, skip/limit window, sort order, and an optional
/// inclusion projection (only the named fields are returned).
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filter: Option<Expr>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    pub sort: Vec<Sort>,
    pub projection: Option<Vec<String>>,
}

impl Query {
    pub fn new() -> Self {
        Query::default()
    }

    pub fn filter(mut self, filter: Option<Expr>) -> Self {
        self.filter = filter;
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort(mut self, sort: Vec<Sort>) -> Self {
        self.sort = sort;
        self
    }

    pub fn projection(mut self, projection: Option<Vec<String>>) -> Self {
        self.projection = projection;
        self
    }
}

/// Per-driver translation of filter expressions into native syntax.
pub trait QueryVisitor {
    type Output;
    type Error: Into<PersistenceError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}
