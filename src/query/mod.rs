//! Query types (nouns)
//!
//! `QueryRequest` is the YAML form that names catalog entries; `QuerySpec` is
//! the resolved, self-contained form the planner consumes.

mod request;
mod spec;

pub use request::{QueryRequest, MetricRequest, BucketRef};
pub use spec::{QuerySpec, MetricInstance};
