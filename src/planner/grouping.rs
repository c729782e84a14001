//! Grouping resolution: a grouping strategy into the key expression of an
//! aggregate

use crate::model::GroupingStrategy;
use crate::plan::{BinaryOperator, Expr, Predicate};
use super::error::PlanError;

/// The grouping key of one aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGrouping {
    /// Key expression, also used in GROUP BY
    pub expr: Expr,
    /// Output name of the key
    pub alias: String,
    /// Rows to drop before aggregating (unmatched per-entity rows)
    pub exclusion: Option<Predicate>,
}

/// Resolve a strategy into a key expression named `key_alias`
pub fn resolve_group_by(strategy: &GroupingStrategy, key_alias: &str) -> Result<ResolvedGrouping, PlanError> {
    match strategy {
        GroupingStrategy::Simple { column } => Ok(ResolvedGrouping {
            expr: Expr::column(column.as_str()),
            alias: key_alias.to_string(),
            exclusion: None,
        }),
        GroupingStrategy::PerEntityCase {
            entity_column,
            compared_column,
            thresholds,
        } => {
            if thresholds.is_empty() {
                return Err(PlanError::EmptyEntityMap(entity_column.clone()));
            }
            let when_then = thresholds
                .iter()
                .map(|(entity, min)| {
                    let matches = Predicate::column_eq(entity_column.as_str(), entity.as_str()).and(
                        Predicate::compare(
                            Expr::column(compared_column.as_str()),
                            BinaryOperator::GtEq,
                            Expr::float(*min),
                        ),
                    );
                    (matches, Expr::string(entity.as_str()))
                })
                .collect();
            let expr = Expr::Case {
                when_then,
                else_result: None,
            };
            Ok(ResolvedGrouping {
                exclusion: Some(Predicate::is_not_null(expr.clone())),
                expr,
                alias: key_alias.to_string(),
            })
        }
    }
}
