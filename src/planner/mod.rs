//! Query planner (verb module)
//!
//! Transforms a QuerySpec into a ComposedQuery: base row-set, metric
//! columns, grouping and aggregation. Also exposes the composition helpers
//! (key joins, nested aggregation) used to combine statements.

mod base;
mod build;
mod compose;
mod error;
mod filters;
mod grouping;
mod templates;

pub use base::{build_base_query, base_columns, BaseQueryOptions};
pub use build::plan_query;
pub use compose::{compose_aggregate, compose_nested, join_on_key, ComposedQuery};
pub use error::PlanError;
pub use filters::{compose_filters, stats_filters, stats_filters_clause};
pub use grouping::{resolve_group_by, ResolvedGrouping};
pub use templates::{instantiate, MetricColumns};
