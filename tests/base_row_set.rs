//! Integration tests for the base row-set
//!
//! Tests the union of per-run tables, the key intersection, stats filters
//! and the metadata join.

mod common;

use common::{fixture_sql, load_catalog, run_pipeline};
use netmetrics::planner::{build_base_query, stats_filters_clause, BaseQueryOptions};
use netmetrics::{parser, RoleFilter, TrustedPredicate};

#[test]
fn test_intersection_only_with_several_tables() {
    let catalog = load_catalog("catalog.yaml");

    // Single-table source: the key restriction is a no-op
    let lanes = catalog.get_data_source("lanes").unwrap();
    let plan = build_base_query(lanes, &BaseQueryOptions::default()).unwrap();
    assert!(!plan.has_intersect());
    assert_eq!(plan.count_scans_of("lanes_run_a"), 1);

    // Three tables: each is scanned once for rows and once for keys
    let tracks = catalog.get_data_source("tracks").unwrap();
    let plan = build_base_query(tracks, &BaseQueryOptions::default()).unwrap();
    assert!(plan.has_intersect());
    for table in ["tracks_a", "tracks_b", "tracks_c"] {
        assert_eq!(plan.count_scans_of(table), 2, "{}", table);
    }
}

#[test]
fn test_intersection_joins_on_every_key() {
    let catalog = load_catalog("catalog.yaml");
    let tracks = catalog.get_data_source("tracks").unwrap();
    let sql = netmetrics::emit_sql(&build_base_query(tracks, &BaseQueryOptions::default()).unwrap()).unwrap();
    assert!(sql.contains("SELECT clip, frame, track_id\n"), "{}", sql);
    assert!(
        sql.contains("ON _left.\"clip\" = _right.\"clip\" AND _left.\"frame\" = _right.\"frame\" AND _left.\"track_id\" = _right.\"track_id\""),
        "{}",
        sql
    );
}

#[test]
fn test_precision_request_row_set() {
    let sql = fixture_sql("request_precision.yaml");

    assert!(sql.contains("FROM run_a_pred"));
    assert!(sql.contains("FROM run_b_pred"));
    assert!(sql.contains("UNION ALL"));
    assert!(sql.contains("INTERSECT"));

    // Stats filters, then metadata join, then the trusted filter
    assert!(sql.contains("WHERE is_ignored = FALSE AND role = 'host'"), "{}", sql);
    assert!(sql.contains("_right.\"weather\" AS \"weather\", _right.\"country\" AS \"country\""), "{}", sql);
    assert!(sql.contains("WHERE weather = 'rain'"), "{}", sql);

    let stats = sql.find("WHERE is_ignored").unwrap();
    let meta = sql.find("WHERE weather").unwrap();
    assert!(stats < meta, "metadata filter should wrap the stats filter:\n{}", sql);
}

#[test]
fn test_ca_oriented_request() {
    let catalog = load_catalog("catalog.yaml");
    let request = parser::parse_request_str(
        r#"
data_source: detections
ca_oriented: true
role: host
extra_filter: distance < 80
metrics:
  - shape: count_all
group_by:
  simple: { column: net_id }
"#,
    )
    .unwrap();
    let sql = run_pipeline(&catalog, &request).unwrap().sql().unwrap();
    assert!(sql.contains("WHERE ca_ignored = FALSE AND ca_role = 'host' AND distance < 80"), "{}", sql);
}

#[test]
fn test_stats_filters_for_fixture_source() {
    let catalog = load_catalog("catalog.yaml");
    let tracks = catalog.get_data_source("tracks").unwrap();

    // No ignore predicate and no role: nothing to add
    assert_eq!(stats_filters_clause(tracks, &RoleFilter::Any, false, "", false), "");
    assert_eq!(
        stats_filters_clause(tracks, &RoleFilter::Any, false, "score > 0.1 OR label = 1", false),
        "AND (score > 0.1 OR label = 1)"
    );
}

#[test]
fn test_metadata_filter_without_metadata_table() {
    let catalog = load_catalog("catalog.yaml");
    let lanes = catalog.get_data_source("lanes").unwrap();
    let options = BaseQueryOptions {
        metadata_filter: TrustedPredicate::new("clip LIKE 'highway%'"),
        include_all: true,
        ..Default::default()
    };
    let sql = netmetrics::emit_sql(&build_base_query(lanes, &options).unwrap()).unwrap();
    assert!(sql.ends_with("WHERE clip LIKE 'highway%'"), "{}", sql);
}
