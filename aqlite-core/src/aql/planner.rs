/// Query planner: SELECT/DELETE predicates to secondary-index queries
///
/// The store's numeric index is integer only, so float literals are
/// truncated toward zero before they reach a filter.

use crate::aql::ast::{BinSelection, DeleteStatement, Equality, SelectStatement};
use crate::aql::literal::Literal;
use std::fmt;

/// Value side of an index equality filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Str(String),
    Int(i64),
    /// Float literal truncated to the integer the index can match
    NarrowedFloat(i64),
}

impl FilterValue {
    pub fn from_literal(literal: &Literal) -> Self {
        match literal {
            Literal::Str(s) => FilterValue::Str(s.clone()),
            Literal::Int(n) => FilterValue::Int(*n),
            Literal::Float(f) => FilterValue::NarrowedFloat(f.trunc() as i64),
        }
    }

    /// Integer the filter matches, for numeric filters
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FilterValue::Int(n) | FilterValue::NarrowedFloat(n) => Some(*n),
            FilterValue::Str(_) => None,
        }
    }
}

/// Equality filter on one bin
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub bin: String,
    pub value: FilterValue,
}

impl Filter {
    pub fn from_equality(eq: &Equality) -> Self {
        Self {
            bin: eq.bin.clone(),
            value: FilterValue::from_literal(&eq.value),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            FilterValue::Str(s) => write!(f, "{} = '{}'", self.bin, s),
            FilterValue::Int(n) | FilterValue::NarrowedFloat(n) => write!(f, "{} = {}", self.bin, n),
        }
    }
}

/// Store-level query: target set, optional projection, optional filter
#[derive(Debug, Clone, PartialEq)]
pub struct IndexQuery {
    pub namespace: String,
    pub set: String,
    /// `None` returns every bin
    pub bins: Option<Vec<String>>,
    pub filter: Option<Filter>,
}

/// Plan a SELECT
pub fn plan(stmt: &SelectStatement) -> IndexQuery {
    let bins = match &stmt.bins {
        BinSelection::AllBins => None,
        BinSelection::Named(names) => Some(names.clone()),
    };

    IndexQuery {
        namespace: stmt.namespace.clone(),
        set: stmt.set.clone(),
        bins,
        filter: stmt.predicate.as_ref().map(Filter::from_equality),
    }
}

/// Plan the key-collection phase of a DELETE
pub fn plan_delete(stmt: &DeleteStatement) -> IndexQuery {
    IndexQuery {
        namespace: stmt.namespace.clone(),
        set: stmt.set.clone(),
        bins: None,
        filter: Some(Filter::from_equality(&stmt.predicate)),
    }
}
