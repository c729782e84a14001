//! netmetrics command-line support: a DataFusion-backed query executor

pub mod datafusion_executor;

pub use datafusion_executor::{to_result_table, DataFusionExecutor};
