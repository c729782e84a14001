use serde::Deserialize;
use crate::model::{GroupingStrategy, MetricTemplate, RoleFilter};

/// Catalog entry a bucketed metric is instantiated over
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BucketRef {
    FilterSet(String),
    Ladder(String),
}

/// One metric in a request: a template plus, optionally, its buckets.
///
/// Without `buckets` the request's `filter_set` is used.
#[derive(Debug, Deserialize, Clone)]
pub struct MetricRequest {
    #[serde(flatten)]
    pub template: MetricTemplate,
    #[serde(default)]
    pub buckets: Option<BucketRef>,
}

/// Request body for a metric query
///
/// Data sources, metadata tables, filter sets and ladders are referenced by
/// their catalog names.
#[derive(Debug, Deserialize, Clone)]
pub struct QueryRequest {
    pub data_source: String,
    #[serde(default)]
    pub metadata: Option<String>,
    /// Externally validated metadata filter, applied verbatim
    #[serde(default)]
    pub metadata_filter: Option<String>,
    #[serde(default)]
    pub role: RoleFilter,
    #[serde(default)]
    pub ca_oriented: bool,
    /// Keep rows the ignore predicate would drop
    #[serde(default)]
    pub include_all: bool,
    #[serde(default)]
    pub extra_filter: String,
    #[serde(default)]
    pub extra_columns: Vec<String>,
    /// Default buckets for metrics that name none
    #[serde(default)]
    pub filter_set: Option<String>,
    pub metrics: Vec<MetricRequest>,
    pub group_by: GroupingStrategy,
    /// Output key name, defaults to the data source's run column
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub secondary_keys: Vec<String>,
}
