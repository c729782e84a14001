//! Query composition: aggregate statements, key joins and nested aggregation

use crate::emitter::emit_sql;
use crate::model::GroupingStrategy;
use crate::plan::{Aggregate, Expr, Filter, Join, JoinOutput, JoinSide, PlanNode, ProjectExpr};
use super::error::PlanError;
use super::grouping::{resolve_group_by, ResolvedGrouping};
use super::templates::MetricColumns;

/// One aggregation level: its plan and the columns it declares
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedQuery {
    pub plan: PlanNode,
    /// Name of the grouping key column
    pub key: String,
    /// Output columns: key, then secondary keys, then metrics
    pub aliases: Vec<String>,
    pub secondary_keys: Vec<String>,
}

impl ComposedQuery {
    /// Render the statement
    pub fn sql(&self) -> Result<String, PlanError> {
        Ok(emit_sql(&self.plan)?)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.aliases.iter().any(|a| a == name)
    }

    /// Metric columns, without key and secondary keys
    pub fn metric_aliases(&self) -> &[String] {
        let skip = (1 + self.secondary_keys.len()).min(self.aliases.len());
        &self.aliases[skip..]
    }
}

/// `SELECT <group> AS key, <secondary keys>, <metrics> FROM (<input>) GROUP BY ...`
///
/// When the grouping carries an exclusion predicate it is applied to the
/// input first, so unmatched rows never form a NULL group.
pub fn compose_aggregate(
    input: PlanNode,
    grouping: &ResolvedGrouping,
    secondary_keys: &[String],
    metrics: Vec<ProjectExpr>,
) -> Result<ComposedQuery, PlanError> {
    if metrics.is_empty() {
        return Err(PlanError::EmptyQuery);
    }

    let mut columns = MetricColumns::new();
    columns.reserve(&grouping.alias)?;
    for key in secondary_keys {
        columns.reserve(key)?;
    }
    columns.extend(metrics)?;

    let mut aliases = Vec::with_capacity(1 + secondary_keys.len() + columns.len());
    aliases.push(grouping.alias.clone());
    aliases.extend(secondary_keys.iter().cloned());
    aliases.extend(columns.aliases());

    let input = match &grouping.exclusion {
        Some(predicate) => PlanNode::Filter(Filter {
            input: Box::new(input),
            predicate: predicate.clone(),
        }),
        None => input,
    };

    let mut group_by = vec![ProjectExpr::new(grouping.expr.clone(), grouping.alias.as_str())];
    group_by.extend(
        secondary_keys
            .iter()
            .map(|k| ProjectExpr::new(Expr::column(k.as_str()), k.as_str())),
    );

    Ok(ComposedQuery {
        plan: PlanNode::Aggregate(Aggregate {
            input: Box::new(input),
            group_by,
            aggregates: columns.into_columns(),
        }),
        key: grouping.alias.clone(),
        aliases,
        secondary_keys: secondary_keys.to_vec(),
    })
}

/// Inner join two composed queries on `key`.
///
/// The output is `key`, then the other columns of `left`, then the other
/// columns of `right`, so chains of joins are associative.
pub fn join_on_key(left: ComposedQuery, right: ComposedQuery, key: &str) -> Result<ComposedQuery, PlanError> {
    if !left.has_column(key) || !right.has_column(key) {
        return Err(PlanError::MissingKey(key.to_string()));
    }

    let left_cols: Vec<String> = left.aliases.iter().filter(|a| *a != key).cloned().collect();
    let right_cols: Vec<String> = right.aliases.iter().filter(|a| *a != key).cloned().collect();
    if let Some(dup) = right_cols.iter().find(|c| left_cols.contains(c)) {
        return Err(PlanError::DuplicateAlias(dup.clone()));
    }

    let column = |side: JoinSide, name: &String| JoinOutput::Column {
        side,
        name: name.clone(),
    };
    let mut projection = vec![column(JoinSide::Left, &key.to_string())];
    projection.extend(left_cols.iter().map(|c| column(JoinSide::Left, c)));
    projection.extend(right_cols.iter().map(|c| column(JoinSide::Right, c)));

    let mut aliases = vec![key.to_string()];
    aliases.extend(left_cols);
    aliases.extend(right_cols);

    // Secondary keys of either side are plain columns of the joined output
    let secondary_keys = left
        .secondary_keys
        .iter()
        .chain(right.secondary_keys.iter())
        .filter(|k| *k != key)
        .cloned()
        .collect();

    Ok(ComposedQuery {
        plan: PlanNode::Join(Join {
            left: Box::new(left.plan),
            right: Box::new(right.plan),
            on: vec![key.to_string()],
            projection,
        }),
        key: key.to_string(),
        aliases,
        secondary_keys,
    })
}

/// Aggregate over the output of an earlier composed query.
///
/// Grouping and secondary-key columns must be produced by `inner`.
pub fn compose_nested(
    inner: ComposedQuery,
    strategy: &GroupingStrategy,
    key_alias: &str,
    secondary_keys: &[String],
    metrics: Vec<ProjectExpr>,
) -> Result<ComposedQuery, PlanError> {
    let needed = strategy
        .input_columns()
        .into_iter()
        .chain(secondary_keys.iter().map(String::as_str));
    for column in needed {
        if !inner.has_column(column) {
            return Err(PlanError::UnknownColumn(column.to_string()));
        }
    }

    let grouping = resolve_group_by(strategy, key_alias)?;
    compose_aggregate(inner.plan, &grouping, secondary_keys, metrics)
}
