//! Catalog model types (nouns)
//!
//! Data sources, filter sets, metric templates and grouping strategies, as
//! built in code or parsed from the catalog YAML.

mod catalog;
mod data_source;
mod filters;
mod grouping;
mod metric;

pub use catalog::{Catalog, NormalizerConfig, DEFAULT_RUN_PREFIX, DEFAULT_RUN_SUFFIX};
pub use data_source::{DataSource, MetadataTable, RoleFilter};
pub use filters::FilterSet;
pub use grouping::{GroupingStrategy, GroupOutcome};
pub use metric::{
    MetricShape, MetricTemplate, AliasPattern, Denominator, Sign, ConfusionKind,
    Comparison, ThresholdLadder, Buckets, Bucket, MAX_LADDER_LEN,
};
