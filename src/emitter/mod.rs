//! SQL emitter (verb module)
//!
//! Transforms a PlanNode into a Presto/Athena-compatible SQL string.

mod error;
mod sql;

pub use error::EmitError;
pub use sql::{emit_sql, emit_expr, emit_predicate, emit_conjunct, quote_ident};
