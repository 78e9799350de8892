/// AQL front end
///
/// Text goes through the clause splitter and literal coercion into a typed
/// statement; SELECT and DELETE statements are then planned into index
/// queries for the store.

pub mod ast;
pub mod builder;
pub mod lexer;
pub mod literal;
pub mod planner;

pub use ast::*;
pub use builder::{parse_namespace_set, StatementBuilder};
pub use literal::Literal;
pub use planner::{plan, plan_delete, Filter, FilterValue, IndexQuery};
