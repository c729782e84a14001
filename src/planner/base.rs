//! Base row-set: every run's table combined into one filtered relation

use crate::model::{DataSource, MetadataTable, RoleFilter};
use crate::plan::{
    Filter, Intersect, Join, JoinOutput, JoinSide, PlanNode, Predicate, Scan, TrustedPredicate, Union,
};
use crate::query::QuerySpec;
use super::error::PlanError;
use super::filters::stats_filters;

/// Everything besides the data source that shapes the base row-set
#[derive(Debug, Clone, Default)]
pub struct BaseQueryOptions {
    pub metadata: Option<MetadataTable>,
    pub metadata_filter: Option<TrustedPredicate>,
    pub role: RoleFilter,
    pub ca_oriented: bool,
    pub extra_filter: String,
    pub include_all: bool,
    pub extra_columns: Vec<String>,
}

impl From<&QuerySpec> for BaseQueryOptions {
    fn from(spec: &QuerySpec) -> Self {
        Self {
            metadata: spec.metadata.clone(),
            metadata_filter: spec.metadata_filter.clone(),
            role: spec.role.clone(),
            ca_oriented: spec.ca_oriented,
            extra_filter: spec.extra_filter.clone(),
            include_all: spec.include_all,
            extra_columns: spec.extra_columns.clone(),
        }
    }
}

/// Columns of the base row-set, in output order
pub fn base_columns(source: &DataSource, options: &BaseQueryOptions) -> Vec<String> {
    let mut columns = source.union_columns(&options.extra_columns);
    if let Some(meta) = &options.metadata {
        columns.extend(meta.columns.iter().cloned());
    }
    columns
}

/// Build the base row-set for a data source.
///
/// 1. stats filters (ignore, role, extra) on each table, so they may use
///    columns outside the projected list
/// 2. UNION ALL of every table over the declared columns plus extras
/// 3. with several tables, restrict to keys present in all of them
/// 4. metadata join, then the trusted metadata filter
pub fn build_base_query(source: &DataSource, options: &BaseQueryOptions) -> Result<PlanNode, PlanError> {
    source.validate()?;
    let columns = source.union_columns(&options.extra_columns);
    let filters = stats_filters(
        source,
        &options.role,
        options.ca_oriented,
        &options.extra_filter,
        options.include_all,
    );

    let mut scans: Vec<PlanNode> = source
        .tables
        .iter()
        .map(|t| {
            PlanNode::Scan(
                Scan::new(t.clone())
                    .with_columns(columns.clone())
                    .with_filter(filters.clone()),
            )
        })
        .collect();

    let mut plan = if scans.len() == 1 {
        scans.remove(0)
    } else {
        PlanNode::Union(Union { inputs: scans })
    };

    if source.tables.len() > 1 {
        let key_scans = source
            .tables
            .iter()
            .map(|t| PlanNode::Scan(Scan::new(t.clone()).with_columns(source.keys.clone())))
            .collect();
        plan = PlanNode::Join(Join {
            left: Box::new(plan),
            right: Box::new(PlanNode::Intersect(Intersect { inputs: key_scans })),
            on: source.keys.clone(),
            projection: vec![JoinOutput::AllFrom(JoinSide::Left)],
        });
    }

    if let Some(meta) = &options.metadata {
        plan = join_metadata(plan, &columns, meta)?;
    }

    if let Some(trusted) = &options.metadata_filter {
        plan = PlanNode::Filter(Filter {
            input: Box::new(plan),
            predicate: Predicate::Trusted(trusted.clone()),
        });
    }

    Ok(plan)
}

fn join_metadata(plan: PlanNode, columns: &[String], meta: &MetadataTable) -> Result<PlanNode, PlanError> {
    meta.validate()?;
    if let Some(key) = meta.keys.iter().find(|k| !columns.contains(k)) {
        return Err(PlanError::MissingKey(key.clone()));
    }
    if let Some(col) = meta.columns.iter().find(|c| columns.contains(c)) {
        return Err(PlanError::DuplicateAlias(col.clone()));
    }

    let meta_columns: Vec<String> = meta.keys.iter().chain(meta.columns.iter()).cloned().collect();
    let mut projection = vec![JoinOutput::AllFrom(JoinSide::Left)];
    projection.extend(meta.columns.iter().map(|c| JoinOutput::Column {
        side: JoinSide::Right,
        name: c.clone(),
    }));

    Ok(PlanNode::Join(Join {
        left: Box::new(plan),
        right: Box::new(PlanNode::Scan(Scan::new(meta.table.clone()).with_columns(meta_columns))),
        on: meta.keys.clone(),
        projection,
    }))
}
