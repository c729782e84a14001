use std::sync::LazyLock;
use regex::Regex;
use crate::planner::PlanError;

/// Presto/Athena: `Column 'x' cannot be resolved`
static PRESTO_UNKNOWN_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Column '([^']+)' cannot be resolved").expect("valid regex"));

/// DataFusion: `No field named x` or `No field named "x"`
static DATAFUSION_UNKNOWN_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"No field named "?([A-Za-z_][A-Za-z0-9_.]*[A-Za-z0-9_])"?"#).expect("valid regex")
});

/// Errors raised while executing a composed query
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// The engine rejected a column reference
    #[error("Unknown column '{column}'")]
    UnknownColumn { column: String },
    /// Any other failure reported by the engine
    #[error("Query failed: {0}")]
    Remote(String),
    /// The result has no column with the run identifier
    #[error("Result has no column '{0}'")]
    MissingKeyColumn(String),
    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl ExecuteError {
    /// Classify an engine error message.
    ///
    /// Messages naming an unresolvable column become `UnknownColumn`; the
    /// rest are `Remote`.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let column = PRESTO_UNKNOWN_COLUMN
            .captures(&message)
            .or_else(|| DATAFUSION_UNKNOWN_COLUMN.captures(&message))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());
        match column {
            Some(column) => ExecuteError::UnknownColumn { column },
            None => ExecuteError::Remote(message),
        }
    }
}
