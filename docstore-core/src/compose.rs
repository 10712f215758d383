//! Composition of generic filter/update/sort/projection specs into the
//! store-neutral query representation.
//!
//! Callers describe what they want with plain field/value maps; the composer
//! turns those into [`Expr`]/[`UpdateOps`]/[`Sort`] values deterministically:
//!
//! - filter entries are visited in map order and AND-combined;
//! - the reserved `"ids"` key is a membership test against the identity
//!   field with comma-split values;
//! - any other string value containing a comma is a membership test against
//!   its field; everything else is an equality test;
//! - projections are inclusion lists, so the identity field is returned only
//!   when explicitly named.

use std::marker::PhantomData;

use bson::Bson;

use crate::{
    query::{Expr, Sort, SortDirection, UpdateOps},
    record::RecordKey,
};

/// Reserved filter key meaning "identity is in this comma-separated set".
pub const IDS_FILTER_KEY: &str = "ids";

/// A scalar filter/update value: string, number, or boolean.
///
/// Strings containing commas are interpreted as CSV lists during filter
/// composition; there is no runtime type inspection beyond that.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl ScalarValue {
    /// Splits a comma-bearing string value into its entries, or returns
    /// `None` for anything that is not a CSV string.
    fn csv_entries(&self) -> Option<Vec<&str>> {
        match self {
            ScalarValue::String(s) if s.contains(',') => Some(s.split(',').collect()),
            _ => None,
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::String(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::String(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Int(value as i64)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float(value)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

impl From<&ScalarValue> for Bson {
    fn from(value: &ScalarValue) -> Self {
        match value {
            ScalarValue::String(s) => Bson::String(s.clone()),
            ScalarValue::Int(i) => Bson::Int64(*i),
            ScalarValue::Float(f) => Bson::Double(*f),
            ScalarValue::Bool(b) => Bson::Boolean(*b),
        }
    }
}

/// An insertion-ordered field-to-value mapping used for filters and updates.
/// Inserting an existing key replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, ScalarValue)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<ScalarValue>) {
        let field = field.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScalarValue)> {
        self.entries.iter().map(|(f, v)| (f.as_str(), v))
    }
}

/// Generic filter specification: field names mapped to scalar-or-CSV values.
pub type FilterSpec = FieldMap;

/// Generic partial-update specification: field names mapped to new values.
pub type UpdateSpec = FieldMap;

/// Ordered sort specification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortSpec {
    fields: Vec<(String, bool)>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ascending(mut self, field: impl Into<String>) -> Self {
        self.fields.push((field.into(), true));
        self
    }

    pub fn descending(mut self, field: impl Into<String>) -> Self {
        self.fields.push((field.into(), false));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Set of field names to include in projected results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionSpec {
    fields: Vec<String>,
}

impl ProjectionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if !self.fields.contains(&field) {
            self.fields.push(field);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Capability interface translating generic specs into the store-neutral
/// query representation. The persistence engine is parameterized over this
/// set rather than subclassed.
pub trait QueryComposer: Send + Sync {
    fn compose_filter(&self, filter: &FilterSpec) -> Option<Expr>;
    fn compose_update(&self, update: &UpdateSpec) -> Option<UpdateOps>;
    fn compose_sort(&self, sort: &SortSpec) -> Vec<Sort>;
    fn compose_projection(&self, projection: &ProjectionSpec) -> Option<Vec<String>>;
}

/// Default composer for records keyed by `K`, bound to the identity field
/// name from the persistence options.
#[derive(Debug, Clone)]
pub struct RecordComposer<K: RecordKey> {
    identity_field: String,
    _marker: PhantomData<K>,
}

impl<K: RecordKey> RecordComposer<K> {
    pub fn new(identity_field: impl Into<String>) -> Self {
        Self { identity_field: identity_field.into(), _marker: PhantomData }
    }

    /// Identity-equality expression for a single key.
    pub fn identity_eq(&self, key: &K) -> Expr {
        Expr::eq(self.identity_field.clone(), key.to_bson())
    }

    /// Identity-membership expression for a key set.
    pub fn identity_in(&self, keys: &[K]) -> Expr {
        Expr::is_in(
            self.identity_field.clone(),
            keys.iter().map(|k| k.to_bson()).collect(),
        )
    }

    pub fn identity_field(&self) -> &str {
        &self.identity_field
    }
}

impl<K: RecordKey> QueryComposer for RecordComposer<K> {
    fn compose_filter(&self, filter: &FilterSpec) -> Option<Expr> {
        let mut composed: Option<Expr> = None;

        for (field, value) in filter.iter() {
            let test = if field == IDS_FILTER_KEY {
                let entries = match value {
                    ScalarValue::String(csv) => {
                        csv.split(',').filter(|s| !s.is_empty()).collect::<Vec<_>>()
                    }
                    _ => Vec::new(),
                };
                // An empty split yields no constraint rather than an error.
                if entries.is_empty() {
                    continue;
                }
                // Entries that fail to parse drop out of the key set; when
                // none parse, the membership test is over the empty set and
                // matches nothing.
                let keys = entries
                    .into_iter()
                    .filter_map(K::parse_key)
                    .collect::<Vec<_>>();
                self.identity_in(&keys)
            } else if let Some(entries) = value.csv_entries() {
                Expr::is_in(
                    field,
                    entries
                        .into_iter()
                        .map(|s| Bson::String(s.to_string()))
                        .collect(),
                )
            } else {
                Expr::eq(field, Bson::from(value))
            };

            composed = Some(match composed {
                Some(expr) => expr.and(test),
                None => test,
            });
        }

        composed
    }

    fn compose_update(&self, update: &UpdateSpec) -> Option<UpdateOps> {
        if update.is_empty() {
            return None;
        }

        let mut ops = UpdateOps::new();
        for (field, value) in update.iter() {
            ops = ops.set(field, Bson::from(value));
        }

        Some(ops)
    }

    fn compose_sort(&self, sort: &SortSpec) -> Vec<Sort> {
        sort.fields
            .iter()
            .map(|(field, ascending)| Sort {
                field: field.clone(),
                direction: if *ascending { SortDirection::Asc } else { SortDirection::Desc },
            })
            .collect()
    }

    fn compose_projection(&self, projection: &ProjectionSpec) -> Option<Vec<String>> {
        if projection.is_empty() {
            return None;
        }

        // Inclusion projection: the identity field comes back only when the
        // caller names it explicitly.
        Some(projection.fields.clone())
    }
}
