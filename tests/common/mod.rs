//! Shared test utilities for integration tests

#![allow(dead_code)]

use std::sync::Mutex;
use netmetrics::executor::Value;
use netmetrics::{
    parser, plan_query, resolve_request, Catalog, ComposedQuery, ExecuteError, QueryExecutor,
    QueryRequest, ResultTable,
};

/// Load a catalog fixture from the tests/test_data directory
pub fn load_catalog(name: &str) -> Catalog {
    let path = format!("tests/test_data/{}", name);
    parser::parse_file(&path)
        .unwrap_or_else(|e| panic!("Failed to load catalog {}: {}", name, e))
}

/// Load a request fixture from the tests/test_data directory
pub fn load_request(name: &str) -> QueryRequest {
    let path = format!("tests/test_data/{}", name);
    parser::parse_request_file(&path)
        .unwrap_or_else(|e| panic!("Failed to load request {}: {}", name, e))
}

/// Run the full pipeline: catalog + request → composed query
pub fn run_pipeline(catalog: &Catalog, request: &QueryRequest) -> Result<ComposedQuery, String> {
    let spec = resolve_request(catalog, request).map_err(|e| format!("Resolution failed: {}", e))?;
    plan_query(&spec).map_err(|e| format!("Planning failed: {}", e))
}

/// Pipeline plus emission, for fixtures that must succeed
pub fn fixture_sql(request: &str) -> String {
    let catalog = load_catalog("catalog.yaml");
    let request = load_request(request);
    let query = run_pipeline(&catalog, &request).expect("Pipeline should succeed");
    query.sql().expect("Emission should succeed")
}

// =============================================================================
// Fake engine
// =============================================================================

/// Engine stub answering every statement from a fixed table
///
/// Statements mentioning `missing_column` fail the way Presto reports an
/// unresolvable column.
pub struct CannedExecutor {
    pub result: ResultTable,
    pub seen: Mutex<Vec<String>>,
}

impl CannedExecutor {
    pub fn new(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Self {
            result: ResultTable {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows,
            },
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn statements(&self) -> Vec<String> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl QueryExecutor for CannedExecutor {
    fn execute(&self, sql: &str) -> Result<ResultTable, ExecuteError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(sql.to_string());
        }
        if sql.contains("missing_column") {
            return Err(ExecuteError::classify(
                "SYNTAX_ERROR: line 1:8: Column 'missing_column' cannot be resolved",
            ));
        }
        Ok(self.result.clone())
    }
}

/// Text cell
pub fn text(value: &str) -> Value {
    Value::String(value.to_string())
}
