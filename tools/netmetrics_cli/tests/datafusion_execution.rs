//! Composed statements executed end to end on DataFusion
//!
//! Tables are registered from in-memory batches or Parquet files, so these
//! tests check that the emitted SQL is accepted by a real engine and returns
//! the expected rows.

use std::fs::File;
use std::sync::Arc;
use datafusion::arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use datafusion::arrow::datatypes::{DataType, Field, Schema};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::parquet::arrow::ArrowWriter;
use netmetrics::executor::Value;
use netmetrics::model::{MetricShape, MetricTemplate, NormalizerConfig};
use netmetrics::query::MetricInstance;
use netmetrics::executor::NormalizedResult;
use netmetrics::{
    join_on_key, plan_query, run_normalized, ComposedQuery, DataSource, FilterSet, GroupingStrategy, MetadataTable,
    QueryOutcome, QuerySpec, RoleFilter, RunIdNormalizer, TrustedPredicate,
};
use netmetrics_cli::DataFusionExecutor;

fn detections(rows: &[(&str, i64, &str, f64)]) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("clip", DataType::Utf8, false),
        Field::new("frame", DataType::Int64, false),
        Field::new("net_id", DataType::Utf8, false),
        Field::new("score", DataType::Float64, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(rows.iter().map(|r| r.0).collect::<Vec<_>>())),
        Arc::new(Int64Array::from(rows.iter().map(|r| r.1).collect::<Vec<_>>())),
        Arc::new(StringArray::from(rows.iter().map(|r| r.2).collect::<Vec<_>>())),
        Arc::new(Float64Array::from(rows.iter().map(|r| r.3).collect::<Vec<_>>())),
    ];
    RecordBatch::try_new(schema, columns).unwrap()
}

/// Rows of run `a` in clip `c1`: (frame, is_ignored, ca_ignored, role, ca_role)
fn tagged(rows: &[(i64, bool, bool, &str, &str)]) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("clip", DataType::Utf8, false),
        Field::new("frame", DataType::Int64, false),
        Field::new("net_id", DataType::Utf8, false),
        Field::new("is_ignored", DataType::Boolean, false),
        Field::new("ca_ignored", DataType::Boolean, false),
        Field::new("role", DataType::Utf8, false),
        Field::new("ca_role", DataType::Utf8, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec!["c1"; rows.len()])),
        Arc::new(Int64Array::from(rows.iter().map(|r| r.0).collect::<Vec<_>>())),
        Arc::new(StringArray::from(vec!["a"; rows.len()])),
        Arc::new(BooleanArray::from(rows.iter().map(|r| r.1).collect::<Vec<_>>())),
        Arc::new(BooleanArray::from(rows.iter().map(|r| r.2).collect::<Vec<_>>())),
        Arc::new(StringArray::from(rows.iter().map(|r| r.3).collect::<Vec<_>>())),
        Arc::new(StringArray::from(rows.iter().map(|r| r.4).collect::<Vec<_>>())),
    ];
    RecordBatch::try_new(schema, columns).unwrap()
}

fn source(tables: &[&str]) -> DataSource {
    DataSource::new(tables.iter().copied(), ["clip", "frame", "net_id", "score"]).with_name("detections")
}

fn count_all() -> MetricInstance {
    MetricInstance::new(MetricTemplate::new(MetricShape::CountAll))
}

fn normalizer() -> RunIdNormalizer {
    RunIdNormalizer::from_config(&NormalizerConfig::default()).unwrap()
}

fn normalized(outcome: QueryOutcome) -> NormalizedResult {
    match outcome {
        QueryOutcome::Rows(result) => result,
        other => panic!("expected rows, got {:?}", other),
    }
}

fn rows(outcome: QueryOutcome) -> Vec<(String, i64)> {
    let result = normalized(outcome);
    (0..result.table.len())
        .map(|i| {
            let id = result.table.get(i, "net_id").and_then(Value::to_text).unwrap();
            let count = match result.table.get(i, "count_all") {
                Some(Value::Int(n)) => *n,
                other => panic!("unexpected count {:?}", other),
            };
            (id, count)
        })
        .collect()
}

#[test]
fn test_per_entity_grouping_drops_unmatched_rows() {
    let executor = DataFusionExecutor::new().unwrap();
    executor
        .register_batches(
            "scores",
            vec![detections(&[
                ("c1", 1, "A", 0.4),
                ("c1", 2, "A", 0.2),
                ("c1", 1, "B", 0.6),
                ("c1", 2, "B", 0.5),
                ("c1", 1, "C", 0.9),
            ])],
        )
        .unwrap();

    let spec = QuerySpec::new(
        source(&["scores"]),
        GroupingStrategy::per_entity("net_id", "score", [("A", 0.3), ("B", 0.5)]),
    )
    .with_metric(count_all());
    let query = plan_query(&spec).unwrap();

    let outcome = run_normalized(&executor, &query, &normalizer()).unwrap();
    assert_eq!(rows(outcome), vec![("A".to_string(), 1), ("B".to_string(), 2)]);
}

#[test]
fn test_runs_restricted_to_shared_keys_and_normalized() {
    let executor = DataFusionExecutor::new().unwrap();
    executor
        .register_batches(
            "run_a_pred",
            vec![detections(&[
                ("c1", 1, "20240101000000_a_pred", 0.9),
                ("c1", 2, "20240101000000_a_pred", 0.9),
                ("c2", 1, "20240101000000_a_pred", 0.9),
            ])],
        )
        .unwrap();
    executor
        .register_batches(
            "run_b_gt",
            vec![detections(&[
                ("c1", 1, "b_gt", 0.1),
                ("c2", 1, "b_gt", 0.1),
                ("c3", 1, "b_gt", 0.1),
            ])],
        )
        .unwrap();

    let spec = QuerySpec::new(source(&["run_a_pred", "run_b_gt"]), GroupingStrategy::simple("net_id"))
        .with_metric(count_all());
    let query = plan_query(&spec).unwrap();

    let outcome = run_normalized(&executor, &query, &normalizer()).unwrap();
    assert_eq!(rows(outcome), vec![("a".to_string(), 2), ("b".to_string(), 2)]);
}

#[test]
fn test_joined_statements_execute() {
    let executor = DataFusionExecutor::new().unwrap();
    executor
        .register_batches(
            "scores",
            vec![detections(&[
                ("c1", 1, "a", 0.9),
                ("c1", 2, "a", 0.2),
                ("c1", 1, "b", 0.7),
            ])],
        )
        .unwrap();

    let totals = plan_query(
        &QuerySpec::new(source(&["scores"]), GroupingStrategy::simple("net_id")).with_metric(count_all()),
    )
    .unwrap();
    let confident = plan_query(
        &QuerySpec::new(source(&["scores"]), GroupingStrategy::simple("net_id"))
            .with_filter_set(FilterSet::new(vec![("confident", "score >= 0.5")]).unwrap())
            .with_metric(MetricInstance::new(MetricTemplate::new(MetricShape::CountFiltered {
                condition: None,
            }))),
    )
    .unwrap();
    let joined = join_on_key(totals, confident, "net_id").unwrap();
    assert_eq!(joined.aliases, vec!["net_id", "count_all", "count_confident"]);

    let QueryOutcome::Rows(result) = run_normalized(&executor, &joined, &normalizer()).unwrap() else {
        panic!("expected rows");
    };
    assert_eq!(result.table.len(), 2);
    assert_eq!(result.table.get(0, "net_id"), Some(&Value::String("a".into())));
    assert_eq!(result.table.get(0, "count_all"), Some(&Value::Int(2)));
    assert_eq!(result.table.get(0, "count_confident"), Some(&Value::Int(1)));
    assert_eq!(result.table.get(1, "count_confident"), Some(&Value::Int(1)));
}

#[test]
fn test_unknown_column_is_reported() {
    let executor = DataFusionExecutor::new().unwrap();
    executor
        .register_batches("scores", vec![detections(&[("c1", 1, "a", 0.9)])])
        .unwrap();

    let spec = QuerySpec::new(source(&["scores"]), GroupingStrategy::simple("net_id"))
        .with_extra_filter("lane_width > 1")
        .with_metric(count_all());
    let query = plan_query(&spec).unwrap();

    match run_normalized(&executor, &query, &normalizer()).unwrap() {
        QueryOutcome::UnknownColumn { column } => assert!(column.ends_with("lane_width"), "{}", column),
        other => panic!("expected an unknown column, got {:?}", other),
    }
}

#[test]
fn test_parquet_tables_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run_a_pred.parquet");
    let batch = detections(&[("c1", 1, "a_pred", 0.9), ("c1", 2, "a_pred", 0.4)]);
    let file = File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let executor = DataFusionExecutor::new().unwrap();
    executor.register_file("run_a_pred", &path).unwrap();
    assert!(executor.register_file("notes", &dir.path().join("notes.txt")).is_err());

    let spec = QuerySpec::new(source(&["run_a_pred"]), GroupingStrategy::simple("net_id")).with_metric(count_all());
    let outcome = run_normalized(&executor, &plan_query(&spec).unwrap(), &normalizer()).unwrap();
    assert_eq!(rows(outcome), vec![("a".to_string(), 2)]);
}

#[test]
fn test_stats_filters_use_unprojected_columns() {
    let executor = DataFusionExecutor::new().unwrap();
    executor
        .register_batches(
            "t1",
            vec![tagged(&[
                (1, false, false, "host", "target"),
                (2, true, false, "host", "host"),
                (3, false, true, "host", "host"),
                (4, false, true, "target", "host"),
                (5, false, false, "host", "host"),
            ])],
        )
        .unwrap();

    // Neither the ignore flags nor the role columns are in the projected list
    let tagged_source = DataSource::new(["t1"], ["clip", "frame", "net_id"])
        .with_ignore("is_ignored = FALSE")
        .with_ca_ignore("ca_ignored = FALSE")
        .with_role_columns("role", Some("ca_role".to_string()));
    let spec = QuerySpec::new(tagged_source, GroupingStrategy::simple("net_id"))
        .with_role(RoleFilter::One("host".into()))
        .with_metric(count_all());
    let count = |spec: &QuerySpec| {
        let query = plan_query(spec).unwrap();
        rows(run_normalized(&executor, &query, &normalizer()).unwrap())
    };

    assert_eq!(count(&spec), vec![("a".to_string(), 3)]);

    let mut ca = spec.clone();
    ca.ca_oriented = true;
    assert_eq!(count(&ca), vec![("a".to_string(), 2)]);

    let mut all = spec.clone();
    all.include_all = true;
    assert_eq!(count(&all), vec![("a".to_string(), 4)]);
}

#[test]
fn test_key_join_is_associative_on_rows() {
    let executor = DataFusionExecutor::new().unwrap();
    executor
        .register_batches(
            "scores",
            vec![detections(&[
                ("c1", 1, "a", 0.9),
                ("c1", 2, "a", 0.2),
                ("c1", 3, "a", 0.3),
                ("c1", 1, "b", 0.7),
            ])],
        )
        .unwrap();

    let totals = || {
        plan_query(&QuerySpec::new(source(&["scores"]), GroupingStrategy::simple("net_id")).with_metric(count_all()))
            .unwrap()
    };
    let bucketed = |name: &str, predicate: &str| -> ComposedQuery {
        plan_query(
            &QuerySpec::new(source(&["scores"]), GroupingStrategy::simple("net_id"))
                .with_filter_set(FilterSet::new(vec![(name, predicate)]).unwrap())
                .with_metric(MetricInstance::new(MetricTemplate::new(MetricShape::CountFiltered {
                    condition: None,
                }))),
        )
        .unwrap()
    };
    let confident = || bucketed("confident", "score >= 0.5");
    let weak = || bucketed("weak", "score < 0.5");

    let left_first = join_on_key(join_on_key(totals(), confident(), "net_id").unwrap(), weak(), "net_id").unwrap();
    let right_first = join_on_key(totals(), join_on_key(confident(), weak(), "net_id").unwrap(), "net_id").unwrap();
    assert_eq!(left_first.aliases, right_first.aliases);

    let left = normalized(run_normalized(&executor, &left_first, &normalizer()).unwrap());
    let right = normalized(run_normalized(&executor, &right_first, &normalizer()).unwrap());
    assert_eq!(left, right);
    assert_eq!(left.table.columns, vec!["net_id", "count_all", "count_confident", "count_weak"]);
    assert_eq!(
        left.table.rows,
        vec![
            vec![Value::String("a".into()), Value::Int(3), Value::Int(1), Value::Int(2)],
            vec![Value::String("b".into()), Value::Int(1), Value::Int(1), Value::Int(0)],
        ]
    );
}

#[test]
fn test_metadata_join_with_trusted_filter() {
    let executor = DataFusionExecutor::new().unwrap();
    executor
        .register_batches(
            "scores",
            vec![detections(&[
                ("c1", 1, "a", 0.9),
                ("c1", 2, "a", 0.2),
                ("c2", 1, "a", 0.8),
                ("c1", 1, "b", 0.7),
                ("c2", 1, "b", 0.6),
            ])],
        )
        .unwrap();
    let meta_schema = Arc::new(Schema::new(vec![
        Field::new("clip", DataType::Utf8, false),
        Field::new("weather", DataType::Utf8, false),
    ]));
    let meta = RecordBatch::try_new(
        meta_schema,
        vec![
            Arc::new(StringArray::from(vec!["c1", "c2"])) as ArrayRef,
            Arc::new(StringArray::from(vec!["rain", "dry"])) as ArrayRef,
        ],
    )
    .unwrap();
    executor.register_batches("clip_meta", vec![meta]).unwrap();

    let spec = QuerySpec::new(source(&["scores"]), GroupingStrategy::simple("net_id"))
        .with_metadata(
            MetadataTable::new("clip_meta", ["clip"], ["weather"]),
            TrustedPredicate::new("weather = 'rain'"),
        )
        .with_metric(count_all());
    let outcome = run_normalized(&executor, &plan_query(&spec).unwrap(), &normalizer()).unwrap();
    assert_eq!(rows(outcome), vec![("a".to_string(), 2), ("b".to_string(), 1)]);
}
