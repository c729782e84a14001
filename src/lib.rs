//! netmetrics - Compose metric queries for comparing model runs
//!
//! This library provides:
//! - Catalog types (DataSource, FilterSet, MetricTemplate, ThresholdLadder, GroupingStrategy)
//! - Catalog and request parsing from YAML
//! - Request resolution against a catalog
//! - Query planning: base row-set, metric columns, grouping, joins, nesting
//! - SQL emission for Presto/Athena-compatible engines
//! - Execution through a pluggable engine, with run-id normalization
//!
//! # Architecture
//!
//! **Noun modules** (data structures):
//! - `model/` - catalog concepts (DataSource, FilterSet, MetricTemplate, GroupingStrategy)
//! - `query/` - query types (QueryRequest, QuerySpec)
//! - `plan/` - logical plan types (PlanNode, Expr, Predicate)
//!
//! **Verb modules** (transformations):
//! - `parser/` - YAML → Catalog, QueryRequest
//! - `resolver/` - Catalog + QueryRequest → QuerySpec
//! - `planner/` - QuerySpec → ComposedQuery
//! - `emitter/` - PlanNode → SQL
//! - `executor/` - ComposedQuery → normalized rows
//!
//! # Example
//!
//! ```ignore
//! use netmetrics::{parser, resolve_request, plan_query};
//!
//! let catalog = parser::parse_file("catalog.yaml")?;
//! let request = parser::parse_request_file("precision.yaml")?;
//! let spec = resolve_request(&catalog, &request)?;
//! let query = plan_query(&spec)?;
//! println!("{}", query.sql()?);
//! ```

pub mod model;
pub mod query;
pub mod resolver;
pub mod plan;
pub mod planner;
pub mod emitter;
pub mod executor;
pub mod parser;
pub mod error;

// Re-export commonly used types
pub use model::{
    Catalog, DataSource, MetadataTable, FilterSet, RoleFilter, MetricShape, MetricTemplate,
    ThresholdLadder, Buckets, GroupingStrategy, GroupOutcome,
};
pub use query::{QueryRequest, QuerySpec, MetricInstance};
pub use resolver::{resolve_request, ResolveError};
pub use plan::{PlanNode, Expr, Predicate, TrustedPredicate};
pub use planner::{plan_query, compose_filters, join_on_key, compose_nested, ComposedQuery, PlanError};
pub use emitter::{emit_sql, EmitError};
pub use executor::{
    execute_all, run_normalized, QueryExecutor, QueryOutcome, ResultTable, RunIdNormalizer, ExecuteError,
};
pub use error::{ParseError, ModelError};
