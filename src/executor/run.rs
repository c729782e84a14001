use rayon::prelude::*;
use tracing::{debug, warn};
use crate::planner::ComposedQuery;
use super::error::ExecuteError;
use super::normalize::{normalize, NormalizedResult, RunIdNormalizer};
use super::table::ResultTable;

/// Boundary to the SQL engine.
///
/// One executor is shared by the workers of [`execute_all`].
pub trait QueryExecutor: Sync {
    fn execute(&self, sql: &str) -> Result<ResultTable, ExecuteError>;
}

/// Result of running one composed query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Rows(NormalizedResult),
    /// The statement referenced a column the tables do not have
    UnknownColumn { column: String },
}

/// Execute a composed query and normalize its run identifiers.
///
/// An unknown-column failure is reported as [`QueryOutcome::UnknownColumn`];
/// other failures propagate.
pub fn run_normalized<E>(
    executor: &E,
    query: &ComposedQuery,
    normalizer: &RunIdNormalizer,
) -> Result<QueryOutcome, ExecuteError>
where
    E: QueryExecutor + ?Sized,
{
    let sql = query.sql()?;
    debug!(key = %query.key, columns = query.aliases.len(), "executing metric query");

    match executor.execute(&sql) {
        Ok(table) => {
            let result = normalize(table, &query.key, normalizer)?;
            debug!(rows = result.table.len(), excluded = result.excluded, "normalized result");
            Ok(QueryOutcome::Rows(result))
        }
        Err(ExecuteError::UnknownColumn { column }) => {
            warn!(%column, key = %query.key, "query references an unknown column");
            Ok(QueryOutcome::UnknownColumn { column })
        }
        Err(e) => Err(e),
    }
}

/// Run several composed queries on the rayon pool.
///
/// Outcomes are returned in input order; the first failure is returned
/// instead.
pub fn execute_all<E>(
    executor: &E,
    queries: &[ComposedQuery],
    normalizer: &RunIdNormalizer,
) -> Result<Vec<QueryOutcome>, ExecuteError>
where
    E: QueryExecutor + ?Sized,
{
    queries
        .par_iter()
        .map(|query| run_normalized(executor, query, normalizer))
        .collect()
}
