//! Grouping strategies - how result rows are bucketed per run

use std::collections::BTreeMap;
use serde::Deserialize;

/// How the grouping key of an aggregate is derived.
///
/// `PerEntityCase` maps each row to the entity that owns it when the compared
/// column reaches the entity's threshold. Rows that match no entry are
/// excluded from the result instead of forming a NULL group.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingStrategy {
    /// Group by a plain column
    Simple { column: String },
    /// Group by `CASE WHEN entity = 'id' AND compared >= t THEN 'id' ... END`
    PerEntityCase {
        entity_column: String,
        compared_column: String,
        /// Entity id to minimum compared value
        thresholds: BTreeMap<String, f64>,
    },
}

/// Where one row lands under a grouping strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOutcome {
    Group(String),
    Excluded,
}

impl GroupingStrategy {
    pub fn simple(column: impl Into<String>) -> Self {
        GroupingStrategy::Simple { column: column.into() }
    }

    pub fn per_entity<I, K>(entity_column: impl Into<String>, compared_column: impl Into<String>, thresholds: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        GroupingStrategy::PerEntityCase {
            entity_column: entity_column.into(),
            compared_column: compared_column.into(),
            thresholds: thresholds.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Columns the strategy reads from its input
    pub fn input_columns(&self) -> Vec<&str> {
        match self {
            GroupingStrategy::Simple { column } => vec![column.as_str()],
            GroupingStrategy::PerEntityCase { entity_column, compared_column, .. } => {
                vec![entity_column.as_str(), compared_column.as_str()]
            }
        }
    }

    /// Classify a row client-side, with the same rule the SQL applies.
    ///
    /// For `Simple`, the entity is the group value and `value` is ignored.
    pub fn classify(&self, entity: &str, value: f64) -> GroupOutcome {
        match self {
            GroupingStrategy::Simple { .. } => GroupOutcome::Group(entity.to_string()),
            GroupingStrategy::PerEntityCase { thresholds, .. } => match thresholds.get(entity) {
                Some(min) if value >= *min => GroupOutcome::Group(entity.to_string()),
                _ => GroupOutcome::Excluded,
            },
        }
    }
}
