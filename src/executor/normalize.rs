//! Run identifier normalization
//!
//! Physical table names carry a timestamp prefix and a marker suffix
//! (`20240101120000_resnet_v2_pred`). Results are keyed by the bare run name
//! (`resnet_v2`) so the same run lines up across statements.

use regex::Regex;
use crate::error::ModelError;
use crate::model::NormalizerConfig;
use super::error::ExecuteError;
use super::table::{ResultTable, Value};

/// Strips the configured prefix and suffix from run identifiers
#[derive(Debug, Clone)]
pub struct RunIdNormalizer {
    prefix: Regex,
    suffix: Regex,
}

impl RunIdNormalizer {
    pub fn new(prefix: &str, suffix: &str) -> Result<Self, ModelError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|source| ModelError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
        };
        Ok(Self {
            prefix: compile(prefix)?,
            suffix: compile(suffix)?,
        })
    }

    pub fn from_config(config: &NormalizerConfig) -> Result<Self, ModelError> {
        Self::new(&config.prefix, &config.suffix)
    }

    pub fn canonical(&self, id: &str) -> String {
        let stripped = self.prefix.replace(id, "");
        self.suffix.replace(&stripped, "").into_owned()
    }
}

/// Rows with canonical run identifiers, sorted by them
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResult {
    pub table: ResultTable,
    /// Rows dropped because their identifier was NULL
    pub excluded: usize,
}

/// Canonicalize the `key` column of every row and sort by it.
///
/// The sort is stable, so rows sharing an identifier keep engine order.
pub fn normalize(
    table: ResultTable,
    key: &str,
    normalizer: &RunIdNormalizer,
) -> Result<NormalizedResult, ExecuteError> {
    let idx = table
        .column_index(key)
        .ok_or_else(|| ExecuteError::MissingKeyColumn(key.to_string()))?;

    let ResultTable { columns, rows } = table;
    let mut excluded = 0;
    let mut keyed: Vec<(String, Vec<Value>)> = Vec::with_capacity(rows.len());
    for mut row in rows {
        match row.get(idx).and_then(Value::to_text) {
            Some(id) => {
                let canonical = normalizer.canonical(&id);
                row[idx] = Value::String(canonical.clone());
                keyed.push((canonical, row));
            }
            None => excluded += 1,
        }
    }
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(NormalizedResult {
        table: ResultTable {
            columns,
            rows: keyed.into_iter().map(|(_, row)| row).collect(),
        },
        excluded,
    })
}
