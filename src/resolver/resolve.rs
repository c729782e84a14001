use crate::model::{Buckets, Catalog};
use crate::plan::TrustedPredicate;
use crate::query::{BucketRef, MetricInstance, QueryRequest, QuerySpec};
use super::error::ResolveError;

/// Resolve a query request against a catalog
///
/// This turns the catalog names in the request (data source, metadata table,
/// filter sets, ladders) into owned values.
pub fn resolve_request(catalog: &Catalog, request: &QueryRequest) -> Result<QuerySpec, ResolveError> {
    // 1. Data source
    let data_source = catalog
        .get_data_source(&request.data_source)
        .ok_or_else(|| ResolveError::DataSourceNotFound(request.data_source.clone()))?;

    // 2. Metadata table and its filter
    let metadata = request
        .metadata
        .as_deref()
        .map(|name| {
            catalog
                .get_metadata(name)
                .cloned()
                .ok_or_else(|| ResolveError::MetadataNotFound(name.to_string()))
        })
        .transpose()?;
    let metadata_filter = request.metadata_filter.clone().and_then(TrustedPredicate::new);

    // 3. Default filter set
    let filter_set = request
        .filter_set
        .as_deref()
        .map(|name| {
            catalog
                .get_filter_set(name)
                .cloned()
                .ok_or_else(|| ResolveError::FilterSetNotFound(name.to_string()))
        })
        .transpose()?;

    // 4. Metrics and their buckets
    let metrics = request
        .metrics
        .iter()
        .map(|metric| {
            let buckets = metric
                .buckets
                .as_ref()
                .map(|r| resolve_buckets(catalog, r))
                .transpose()?;
            Ok(MetricInstance {
                template: metric.template.clone(),
                buckets,
            })
        })
        .collect::<Result<Vec<_>, ResolveError>>()?;

    Ok(QuerySpec {
        data_source: data_source.clone(),
        metrics,
        filter_set,
        role: request.role.clone(),
        ca_oriented: request.ca_oriented,
        extra_filter: request.extra_filter.clone(),
        include_all: request.include_all,
        extra_columns: request.extra_columns.clone(),
        metadata,
        metadata_filter,
        group_by: request.group_by.clone(),
        key: request.key.clone(),
        secondary_keys: request.secondary_keys.clone(),
    })
}

fn resolve_buckets(catalog: &Catalog, bucket_ref: &BucketRef) -> Result<Buckets, ResolveError> {
    match bucket_ref {
        BucketRef::FilterSet(name) => catalog
            .get_filter_set(name)
            .cloned()
            .map(Buckets::Filters)
            .ok_or_else(|| ResolveError::FilterSetNotFound(name.clone())),
        BucketRef::Ladder(name) => catalog
            .get_ladder(name)
            .cloned()
            .map(Buckets::Ladder)
            .ok_or_else(|| ResolveError::LadderNotFound(name.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RoleFilter;

    const CATALOG: &str = r#"
data_sources:
  - name: detections
    tables: [run_a]
    columns: [clip, frame, net_id, score, label]
filter_sets:
  road:
    urban: road_type = 'urban'
ladders:
  scores:
    column: score
    range: { start: 0.0, stop: 1.0, step: 0.5 }
"#;

    fn catalog() -> Catalog {
        serde_yaml::from_str(CATALOG).unwrap()
    }

    #[test]
    fn test_resolve_buckets_and_defaults() {
        let request: QueryRequest = serde_yaml::from_str(
            r#"
data_source: detections
role: host
metadata_filter: "  "
filter_set: road
metrics:
  - shape: count_filtered
  - shape: ratio_filtered
    alias: "precision_{name}"
    condition: label = 1
    buckets: { ladder: scores }
group_by:
  simple: { column: net_id }
"#,
        )
        .unwrap();

        let spec = resolve_request(&catalog(), &request).unwrap();
        assert_eq!(spec.role, RoleFilter::One("host".into()));
        assert!(spec.metadata_filter.is_none());
        assert_eq!(spec.filter_set.as_ref().map(|f| f.len()), Some(1));
        assert!(spec.metrics[0].buckets.is_none());
        assert!(matches!(&spec.metrics[1].buckets, Some(Buckets::Ladder(l)) if l.len() == 3));
        assert_eq!(spec.key_alias(), "net_id");
    }

    #[test]
    fn test_unknown_names() {
        let request: QueryRequest = serde_yaml::from_str(
            "data_source: nope\nmetrics: []\ngroup_by: { simple: { column: net_id } }\n",
        )
        .unwrap();
        assert!(matches!(
            resolve_request(&catalog(), &request),
            Err(ResolveError::DataSourceNotFound(name)) if name == "nope"
        ));

        let request: QueryRequest = serde_yaml::from_str(
            "data_source: detections\nmetrics:\n  - shape: count_filtered\n    buckets: { ladder: missing }\ngroup_by: { simple: { column: net_id } }\n",
        )
        .unwrap();
        assert!(matches!(
            resolve_request(&catalog(), &request),
            Err(ResolveError::LadderNotFound(_))
        ));
    }
}
