//! Plan building: a QuerySpec into one composed metric statement

use crate::model::Buckets;
use crate::query::QuerySpec;
use super::base::{base_columns, build_base_query, BaseQueryOptions};
use super::compose::{compose_aggregate, ComposedQuery};
use super::error::PlanError;
use super::grouping::resolve_group_by;
use super::templates::instantiate;

/// Build the metric statement for a query spec
///
/// 1. base row-set (union, key intersection, filters, metadata)
/// 2. grouping and secondary keys, checked against the row-set columns
/// 3. one column per template bucket
/// 4. the aggregate
pub fn plan_query(spec: &QuerySpec) -> Result<ComposedQuery, PlanError> {
    let options = BaseQueryOptions::from(spec);
    let base = build_base_query(&spec.data_source, &options)?;

    let columns = base_columns(&spec.data_source, &options);
    let needed = spec
        .group_by
        .input_columns()
        .into_iter()
        .chain(spec.secondary_keys.iter().map(String::as_str));
    for column in needed {
        if !columns.iter().any(|c| c == column) {
            return Err(PlanError::UnknownColumn(column.to_string()));
        }
    }

    let default_buckets = spec.filter_set.clone().map(Buckets::Filters);
    let mut metrics = Vec::new();
    for instance in &spec.metrics {
        let buckets = instance.buckets.as_ref().or(default_buckets.as_ref());
        metrics.extend(instantiate(&instance.template, buckets)?);
    }

    let grouping = resolve_group_by(&spec.group_by, spec.key_alias())?;
    let query = compose_aggregate(base, &grouping, &spec.secondary_keys, metrics)?;

    tracing::debug!(
        data_source = %spec.data_source.name,
        tables = spec.data_source.tables.len(),
        columns = query.aliases.len(),
        "planned metric query"
    );
    Ok(query)
}
