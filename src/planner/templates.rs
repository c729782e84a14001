//! Metric template instantiation: one aggregate column per bucket (and per
//! confusion kind)

use std::collections::HashSet;
use crate::model::{
    AliasPattern, Bucket, Buckets, ConfusionKind, Denominator, MetricShape, MetricTemplate, Sign,
};
use crate::plan::{BinaryOperator, Expr, Literal, Predicate, ProjectExpr};
use super::error::PlanError;

/// Output columns of one statement, unique by alias
#[derive(Debug, Clone, Default)]
pub struct MetricColumns {
    columns: Vec<ProjectExpr>,
    seen: HashSet<String>,
}

impl MetricColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim an alias that is produced elsewhere in the statement (keys)
    pub fn reserve(&mut self, alias: &str) -> Result<(), PlanError> {
        if !self.seen.insert(alias.to_string()) {
            return Err(PlanError::DuplicateAlias(alias.to_string()));
        }
        Ok(())
    }

    pub fn push(&mut self, column: ProjectExpr) -> Result<(), PlanError> {
        self.reserve(&column.alias)?;
        self.columns.push(column);
        Ok(())
    }

    pub fn extend<I>(&mut self, columns: I) -> Result<(), PlanError>
    where
        I: IntoIterator<Item = ProjectExpr>,
    {
        for column in columns {
            self.push(column)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn aliases(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.alias.clone()).collect()
    }

    pub fn into_columns(self) -> Vec<ProjectExpr> {
        self.columns
    }
}

/// Instantiate a template over its buckets.
///
/// `CountAll` ignores `buckets`. Every other shape needs them, and its alias
/// pattern must contain `{name}` (and `{kind}` for confusion counts).
pub fn instantiate(template: &MetricTemplate, buckets: Option<&Buckets>) -> Result<Vec<ProjectExpr>, PlanError> {
    let pattern = template.alias();

    if let MetricShape::CountAll = template.shape {
        return Ok(vec![ProjectExpr::new(Expr::CountStar, pattern.as_str())]);
    }

    if !pattern.has_name() {
        return Err(PlanError::InvalidAliasPattern {
            pattern: pattern.as_str().to_string(),
            placeholder: "{name}",
        });
    }
    let buckets = buckets.ok_or_else(|| PlanError::MissingBuckets(pattern.as_str().to_string()))?;

    match &template.shape {
        MetricShape::CountAll => Ok(Vec::new()),
        MetricShape::CountFiltered { condition } => {
            let condition = condition.as_deref().and_then(Predicate::raw);
            Ok(per_bucket(buckets, &pattern, |bucket| {
                Expr::count_if(restrict(bucket, condition.clone()))
            }))
        }
        MetricShape::RatioFiltered { condition, denominator } => {
            let condition = condition.as_deref().and_then(Predicate::raw);
            Ok(per_bucket(buckets, &pattern, |bucket| {
                let numerator = Expr::count_if(restrict(bucket, condition.clone()));
                let denominator = match denominator {
                    Denominator::AllRows => Expr::CountStar,
                    Denominator::Bucket => Expr::count_if(bucket.predicate.clone()),
                    Denominator::Predicate(text) => match Predicate::raw(text) {
                        Some(p) => Expr::count_if(p),
                        None => Expr::CountStar,
                    },
                };
                Expr::ratio(numerator, denominator)
            }))
        }
        MetricShape::ThresholdSweepRatio { condition } => {
            if !buckets.is_ladder() {
                return Err(PlanError::LadderRequired(pattern.as_str().to_string()));
            }
            let condition = Predicate::raw(condition);
            let base = match &condition {
                Some(p) => Expr::count_if(p.clone()),
                None => Expr::CountStar,
            };
            Ok(per_bucket(buckets, &pattern, |bucket| {
                Expr::ratio(Expr::count_if(restrict(bucket, condition.clone())), base.clone())
            }))
        }
        MetricShape::WeightedSum { column } => Ok(per_bucket(buckets, &pattern, |bucket| {
            Expr::sum_if(bucket.predicate.clone(), Expr::column(column.as_str()))
        })),
        MetricShape::ConfusionCounts {
            label_column,
            label_sign,
            prediction_column,
            prediction_sign,
            threshold,
        } => {
            if !pattern.has_kind() {
                return Err(PlanError::InvalidAliasPattern {
                    pattern: pattern.as_str().to_string(),
                    placeholder: "{kind}",
                });
            }
            let expanded = buckets.expand();
            let mut columns = Vec::with_capacity(expanded.len() * ConfusionKind::ALL.len());
            for kind in ConfusionKind::ALL {
                let (label_positive, predicted_positive) = kind.polarity();
                for bucket in &expanded {
                    // Ladder buckets carry the threshold; filter buckets restrict rows
                    let (t, rows) = match bucket.threshold {
                        Some(t) => (t, None),
                        None => (*threshold, Some(bucket.predicate.clone())),
                    };
                    let predicate = Predicate::all([
                        rows,
                        Some(label_side(label_column, *label_sign, label_positive)),
                        Some(prediction_side(prediction_column, *prediction_sign, t, predicted_positive)),
                    ]);
                    if let Some(predicate) = predicate {
                        columns.push(ProjectExpr::new(
                            Expr::count_if(predicate),
                            pattern.render_kind(kind, &bucket.name),
                        ));
                    }
                }
            }
            Ok(columns)
        }
    }
}

fn per_bucket<F>(buckets: &Buckets, pattern: &AliasPattern, build: F) -> Vec<ProjectExpr>
where
    F: Fn(&Bucket) -> Expr,
{
    buckets
        .expand()
        .iter()
        .map(|bucket| ProjectExpr::new(build(bucket), pattern.render(&bucket.name)))
        .collect()
}

/// `bucket AND condition`
fn restrict(bucket: &Bucket, condition: Option<Predicate>) -> Predicate {
    Predicate::all([Some(bucket.predicate.clone()), condition])
        .unwrap_or_else(|| bucket.predicate.clone())
}

fn zero() -> Expr {
    Expr::Literal(Literal::Int(0))
}

/// Positive labels are `> 0` (`< 0` for a negative sign)
fn label_side(column: &str, sign: Sign, positive: bool) -> Predicate {
    let op = match (sign, positive) {
        (Sign::Positive, true) => BinaryOperator::Gt,
        (Sign::Positive, false) => BinaryOperator::LtEq,
        (Sign::Negative, true) => BinaryOperator::Lt,
        (Sign::Negative, false) => BinaryOperator::GtEq,
    };
    Predicate::compare(Expr::column(column), op, zero())
}

/// Positive predictions are `>= t` (`<= -t` for a negative sign)
fn prediction_side(column: &str, sign: Sign, threshold: f64, positive: bool) -> Predicate {
    let (op, bound) = match (sign, positive) {
        (Sign::Positive, true) => (BinaryOperator::GtEq, threshold),
        (Sign::Positive, false) => (BinaryOperator::Lt, threshold),
        (Sign::Negative, true) => (BinaryOperator::LtEq, -threshold),
        (Sign::Negative, false) => (BinaryOperator::Gt, -threshold),
    };
    Predicate::compare(Expr::column(column), op, Expr::float(bound))
}
