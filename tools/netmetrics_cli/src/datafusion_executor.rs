use std::path::Path;
use std::sync::Arc;
use anyhow::Context;
use datafusion::arrow::array::{Array, ArrayRef, AsArray};
use datafusion::arrow::compute::cast;
use datafusion::arrow::datatypes::{DataType, Float64Type, Int64Type};
use datafusion::arrow::error::ArrowError;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::datasource::MemTable;
use datafusion::prelude::{CsvReadOptions, ParquetReadOptions, SessionContext};
use netmetrics::executor::Value;
use netmetrics::{ExecuteError, QueryExecutor, ResultTable};
use tokio::runtime::Runtime;

/// Runs composed SQL on local tables through DataFusion
///
/// The executor owns its runtime so it can serve the blocking
/// [`QueryExecutor`] interface from any thread.
pub struct DataFusionExecutor {
    ctx: SessionContext,
    runtime: Runtime,
}

impl DataFusionExecutor {
    pub fn new() -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start the query runtime")?;
        Ok(Self {
            ctx: SessionContext::new(),
            runtime,
        })
    }

    /// Register a CSV or Parquet file under `name`, by extension
    pub fn register_file(&self, name: &str, path: &Path) -> anyhow::Result<()> {
        let location = path.to_string_lossy().to_string();
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        self.runtime.block_on(async {
            match extension {
                "parquet" => self
                    .ctx
                    .register_parquet(name, &location, ParquetReadOptions::default())
                    .await,
                "csv" => self.ctx.register_csv(name, &location, CsvReadOptions::new()).await,
                other => {
                    return Err(anyhow::anyhow!("unsupported table format '{}' for {}", other, location));
                }
            }
            .with_context(|| format!("failed to register {} from {}", name, location))
        })?;
        tracing::debug!(table = name, path = %location, "registered table");
        Ok(())
    }

    /// Register in-memory batches under `name`
    pub fn register_batches(&self, name: &str, batches: Vec<RecordBatch>) -> anyhow::Result<()> {
        let schema = batches
            .first()
            .map(|b| b.schema())
            .ok_or_else(|| anyhow::anyhow!("table {} has no batches", name))?;
        let table = MemTable::try_new(schema, vec![batches])?;
        self.ctx.register_table(name, Arc::new(table))?;
        Ok(())
    }
}

impl QueryExecutor for DataFusionExecutor {
    fn execute(&self, sql: &str) -> Result<ResultTable, ExecuteError> {
        self.runtime.block_on(async {
            let df = self
                .ctx
                .sql(sql)
                .await
                .map_err(|e| ExecuteError::classify(e.to_string()))?;
            let batches = df
                .collect()
                .await
                .map_err(|e| ExecuteError::classify(e.to_string()))?;
            to_result_table(&batches).map_err(|e| ExecuteError::Remote(e.to_string()))
        })
    }
}

/// Convert Arrow batches into a result table
pub fn to_result_table(batches: &[RecordBatch]) -> Result<ResultTable, ArrowError> {
    let Some(first) = batches.first() else {
        return Ok(ResultTable::default());
    };
    let columns = first
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect();
    let mut table = ResultTable::new(columns);

    for batch in batches {
        let values: Vec<Vec<Value>> = batch
            .columns()
            .iter()
            .map(column_values)
            .collect::<Result<_, _>>()?;
        for row in 0..batch.num_rows() {
            table.rows.push(values.iter().map(|col| col[row].clone()).collect());
        }
    }
    Ok(table)
}

fn column_values(array: &ArrayRef) -> Result<Vec<Value>, ArrowError> {
    let len = array.len();
    let values = match array.data_type() {
        DataType::Null => vec![Value::Null; len],
        DataType::Boolean => {
            let a = array.as_boolean();
            (0..len)
                .map(|i| if a.is_null(i) { Value::Null } else { Value::Bool(a.value(i)) })
                .collect()
        }
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => {
            let ints = cast(array, &DataType::Int64)?;
            let a = ints.as_primitive::<Int64Type>();
            (0..len)
                .map(|i| if a.is_null(i) { Value::Null } else { Value::Int(a.value(i)) })
                .collect()
        }
        DataType::Float16 | DataType::Float32 | DataType::Float64 | DataType::Decimal128(..) => {
            let floats = cast(array, &DataType::Float64)?;
            let a = floats.as_primitive::<Float64Type>();
            (0..len)
                .map(|i| if a.is_null(i) { Value::Null } else { Value::Float(a.value(i)) })
                .collect()
        }
        _ => {
            let strings = cast(array, &DataType::Utf8)?;
            let a = strings.as_string::<i32>();
            (0..len)
                .map(|i| {
                    if a.is_null(i) {
                        Value::Null
                    } else {
                        Value::String(a.value(i).to_string())
                    }
                })
                .collect()
        }
    };
    Ok(values)
}
