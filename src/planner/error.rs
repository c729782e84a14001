//! Planner errors

use crate::emitter::EmitError;
use crate::error::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// A bucketed template whose alias pattern lacks a required placeholder
    #[error("Alias pattern '{pattern}' must contain {placeholder}")]
    InvalidAliasPattern { pattern: String, placeholder: &'static str },
    /// Two output columns of one statement share an alias
    #[error("Output alias '{0}' is produced more than once")]
    DuplicateAlias(String),
    /// A bucketed template with neither its own buckets nor a query filter set
    #[error("Metric '{0}' needs a filter set or a threshold ladder")]
    MissingBuckets(String),
    /// A template that only works over a threshold ladder
    #[error("Metric '{0}' must be instantiated over a threshold ladder")]
    LadderRequired(String),
    /// A per-entity grouping with no entities
    #[error("Per-entity grouping on '{0}' has no entities")]
    EmptyEntityMap(String),
    /// A statement with no metric columns
    #[error("Query has no metric columns")]
    EmptyQuery,
    /// A column that the input of a statement does not produce
    #[error("Column '{0}' is not produced by the input query")]
    UnknownColumn(String),
    /// A join key missing from one side
    #[error("Join key '{0}' is missing from one side")]
    MissingKey(String),
    #[error(transparent)]
    InvalidDataSource(#[from] ModelError),
    #[error(transparent)]
    Emit(#[from] EmitError),
}
