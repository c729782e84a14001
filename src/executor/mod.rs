//! Query execution (verb module)
//!
//! Runs composed statements through a [`QueryExecutor`] and normalizes the
//! run identifiers of their results.

mod error;
mod normalize;
mod run;
mod table;

pub use error::ExecuteError;
pub use normalize::{normalize, NormalizedResult, RunIdNormalizer};
pub use run::{execute_all, run_normalized, QueryExecutor, QueryOutcome};
pub use table::{ResultTable, Value};
