use crate::model::{Buckets, DataSource, FilterSet, GroupingStrategy, MetadataTable, MetricTemplate, RoleFilter};
use crate::plan::TrustedPredicate;

/// A template and the buckets it is instantiated over
#[derive(Debug, Clone, PartialEq)]
pub struct MetricInstance {
    pub template: MetricTemplate,
    /// `None` falls back to the query's filter set
    pub buckets: Option<Buckets>,
}

impl MetricInstance {
    pub fn new(template: MetricTemplate) -> Self {
        Self { template, buckets: None }
    }

    pub fn over(template: MetricTemplate, buckets: Buckets) -> Self {
        Self {
            template,
            buckets: Some(buckets),
        }
    }
}

/// Everything needed to plan one metric statement.
///
/// Built fresh for each call.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub data_source: DataSource,
    pub metrics: Vec<MetricInstance>,
    pub filter_set: Option<FilterSet>,
    pub role: RoleFilter,
    pub ca_oriented: bool,
    pub extra_filter: String,
    pub include_all: bool,
    pub extra_columns: Vec<String>,
    pub metadata: Option<MetadataTable>,
    pub metadata_filter: Option<TrustedPredicate>,
    pub group_by: GroupingStrategy,
    /// Output name of the grouping key, defaults to the run column
    pub key: Option<String>,
    pub secondary_keys: Vec<String>,
}

impl QuerySpec {
    pub fn new(data_source: DataSource, group_by: GroupingStrategy) -> Self {
        Self {
            data_source,
            metrics: Vec::new(),
            filter_set: None,
            role: RoleFilter::Any,
            ca_oriented: false,
            extra_filter: String::new(),
            include_all: false,
            extra_columns: Vec::new(),
            metadata: None,
            metadata_filter: None,
            group_by,
            key: None,
            secondary_keys: Vec::new(),
        }
    }

    pub fn with_metric(mut self, metric: MetricInstance) -> Self {
        self.metrics.push(metric);
        self
    }

    pub fn with_filter_set(mut self, filter_set: FilterSet) -> Self {
        self.filter_set = Some(filter_set);
        self
    }

    pub fn with_role(mut self, role: RoleFilter) -> Self {
        self.role = role;
        self
    }

    pub fn with_extra_filter(mut self, predicate: impl Into<String>) -> Self {
        self.extra_filter = predicate.into();
        self
    }

    pub fn with_metadata(mut self, metadata: MetadataTable, filter: Option<TrustedPredicate>) -> Self {
        self.metadata = Some(metadata);
        self.metadata_filter = filter;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn key_alias(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.data_source.run_column)
    }
}
