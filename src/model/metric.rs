//! Metric templates - parametrized aggregate shapes and the buckets they
//! are instantiated over

use serde::Deserialize;
use crate::error::ModelError;
use crate::plan::{BinaryOperator, Expr, Predicate};
use super::filters::FilterSet;

/// Sign of a label or prediction column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sign {
    #[default]
    Positive,
    Negative,
}

/// Denominator of a ratio metric
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Denominator {
    /// COUNT(*) over the row-set
    #[default]
    AllRows,
    /// Rows matching the bucket
    Bucket,
    /// Rows matching a separate predicate
    Predicate(String),
}

/// Aggregate shapes
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum MetricShape {
    /// `COUNT(*)`, one column regardless of buckets
    CountAll,
    /// Rows matching the bucket (and `condition`, when set)
    CountFiltered {
        #[serde(default)]
        condition: Option<String>,
    },
    /// Rows matching bucket and `condition`, over the denominator
    RatioFiltered {
        #[serde(default)]
        condition: Option<String>,
        #[serde(default)]
        denominator: Denominator,
    },
    /// Share of `condition` rows passing each ladder threshold
    ThresholdSweepRatio { condition: String },
    /// `SUM(column)` over rows matching the bucket
    WeightedSum { column: String },
    /// True/false positive/negative counts
    ConfusionCounts {
        label_column: String,
        #[serde(default)]
        label_sign: Sign,
        prediction_column: String,
        #[serde(default)]
        prediction_sign: Sign,
        /// Operating point used with filter buckets; ladder buckets carry their own
        #[serde(default)]
        threshold: f64,
    },
}

impl MetricShape {
    pub fn default_alias(&self) -> &'static str {
        match self {
            MetricShape::CountAll => "count_all",
            MetricShape::CountFiltered { .. } => "count_{name}",
            MetricShape::RatioFiltered { .. } => "score_{name}",
            MetricShape::ThresholdSweepRatio { .. } => "sweep_{name}",
            MetricShape::WeightedSum { .. } => "sum_{name}",
            MetricShape::ConfusionCounts { .. } => "{kind}_{name}",
        }
    }
}

/// The four confusion-matrix cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfusionKind {
    TruePositive,
    FalsePositive,
    TrueNegative,
    FalseNegative,
}

impl ConfusionKind {
    pub const ALL: [ConfusionKind; 4] = [
        ConfusionKind::TruePositive,
        ConfusionKind::FalsePositive,
        ConfusionKind::TrueNegative,
        ConfusionKind::FalseNegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfusionKind::TruePositive => "tp",
            ConfusionKind::FalsePositive => "fp",
            ConfusionKind::TrueNegative => "tn",
            ConfusionKind::FalseNegative => "fn",
        }
    }

    /// (label is positive, prediction is positive)
    pub fn polarity(&self) -> (bool, bool) {
        match self {
            ConfusionKind::TruePositive => (true, true),
            ConfusionKind::FalsePositive => (false, true),
            ConfusionKind::TrueNegative => (false, false),
            ConfusionKind::FalseNegative => (true, false),
        }
    }
}

/// Alias template with a `{name}` placeholder (and `{kind}` for confusion counts)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct AliasPattern(String);

impl AliasPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn has_name(&self) -> bool {
        self.0.contains("{name}")
    }

    pub fn has_kind(&self) -> bool {
        self.0.contains("{kind}")
    }

    pub fn render(&self, name: &str) -> String {
        self.0.replace("{name}", name)
    }

    pub fn render_kind(&self, kind: ConfusionKind, name: &str) -> String {
        self.0.replace("{kind}", kind.as_str()).replace("{name}", name)
    }
}

/// A metric shape together with its alias pattern
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetricTemplate {
    #[serde(flatten)]
    pub shape: MetricShape,
    #[serde(default)]
    alias: Option<AliasPattern>,
}

impl MetricTemplate {
    /// Template using the shape's default alias pattern
    pub fn new(shape: MetricShape) -> Self {
        Self { shape, alias: None }
    }

    pub fn with_alias(mut self, pattern: impl Into<String>) -> Self {
        self.alias = Some(AliasPattern::new(pattern));
        self
    }

    pub fn alias(&self) -> AliasPattern {
        self.alias
            .clone()
            .unwrap_or_else(|| AliasPattern::new(self.shape.default_alias()))
    }
}

/// Comparison used by a threshold ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    #[default]
    Ge,
    Gt,
    Le,
    Lt,
}

impl Comparison {
    pub fn operator(&self) -> BinaryOperator {
        match self {
            Comparison::Ge => BinaryOperator::GtEq,
            Comparison::Gt => BinaryOperator::Gt,
            Comparison::Le => BinaryOperator::LtEq,
            Comparison::Lt => BinaryOperator::Lt,
        }
    }
}

/// Fixed, monotonic sequence of thresholds over one column
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "LadderDef")]
pub struct ThresholdLadder {
    column: String,
    comparison: Comparison,
    values: Vec<f64>,
}

#[derive(Deserialize)]
struct LadderDef {
    column: String,
    #[serde(default)]
    comparison: Comparison,
    #[serde(default)]
    values: Option<Vec<f64>>,
    #[serde(default)]
    range: Option<LadderRange>,
}

#[derive(Deserialize)]
struct LadderRange {
    start: f64,
    stop: f64,
    step: f64,
}

impl TryFrom<LadderDef> for ThresholdLadder {
    type Error = ModelError;

    fn try_from(def: LadderDef) -> Result<Self, Self::Error> {
        let ladder = match (def.values, def.range) {
            (Some(values), None) => ThresholdLadder::new(def.column, values)?,
            (None, Some(r)) => ThresholdLadder::range(def.column, r.start, r.stop, r.step)?,
            _ => {
                return Err(ModelError::InvalidThresholds {
                    column: def.column,
                    reason: "give exactly one of 'values' or 'range'".to_string(),
                })
            }
        };
        Ok(ladder.with_comparison(def.comparison))
    }
}

/// Most thresholds a `range` ladder may expand to
pub const MAX_LADDER_LEN: usize = 10_000;

impl ThresholdLadder {
    /// Ladder from explicit values, which must be strictly monotonic
    pub fn new(column: impl Into<String>, values: Vec<f64>) -> Result<Self, ModelError> {
        let column = column.into();
        let invalid = |reason: &str| ModelError::InvalidThresholds {
            column: column.clone(),
            reason: reason.to_string(),
        };
        if values.is_empty() {
            return Err(invalid("the ladder is empty"));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(invalid("thresholds must be finite"));
        }
        let increasing = values.windows(2).all(|w| w[0] < w[1]);
        let decreasing = values.windows(2).all(|w| w[0] > w[1]);
        if !increasing && !decreasing {
            return Err(invalid("thresholds must be strictly monotonic"));
        }
        Ok(Self {
            column,
            comparison: Comparison::Ge,
            values,
        })
    }

    /// `start, start + step, ...` up to and including `stop`
    pub fn range(column: impl Into<String>, start: f64, stop: f64, step: f64) -> Result<Self, ModelError> {
        let column = column.into();
        if !(step.is_finite() && step > 0.0 && start.is_finite() && stop.is_finite() && stop >= start) {
            return Err(ModelError::InvalidThresholds {
                column,
                reason: "range needs finite start <= stop and a positive step".to_string(),
            });
        }
        let steps = ((stop - start) / step + 1e-9).floor();
        if steps >= MAX_LADDER_LEN as f64 {
            return Err(ModelError::InvalidThresholds {
                column,
                reason: format!("range yields more than {} thresholds", MAX_LADDER_LEN),
            });
        }
        let count = steps as usize + 1;
        let values = (0..count)
            .map(|i| ((start + i as f64 * step) * 1e9).round() / 1e9)
            .collect();
        Self::new(column, values)
    }

    pub fn with_comparison(mut self, comparison: Comparison) -> Self {
        self.comparison = comparison;
        self
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `column >= value` (per the ladder's comparison)
    pub fn predicate(&self, value: f64) -> Predicate {
        Predicate::compare(Expr::column(&self.column), self.comparison.operator(), Expr::float(value))
    }
}

/// What a bucketed template is instantiated over
#[derive(Debug, Clone, PartialEq)]
pub enum Buckets {
    /// One bucket per named filter
    Filters(FilterSet),
    /// One bucket per ladder position, named by index
    Ladder(ThresholdLadder),
}

/// One bucket: a name for alias derivation and the rows it selects
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub name: String,
    pub predicate: Predicate,
    /// The ladder threshold, for ladder buckets
    pub threshold: Option<f64>,
}

impl Buckets {
    pub fn expand(&self) -> Vec<Bucket> {
        match self {
            Buckets::Filters(set) => set
                .iter()
                .map(|(name, predicate)| Bucket {
                    name: name.to_string(),
                    predicate: Predicate::Sql(predicate.to_string()),
                    threshold: None,
                })
                .collect(),
            Buckets::Ladder(ladder) => ladder
                .values()
                .iter()
                .enumerate()
                .map(|(idx, value)| Bucket {
                    name: idx.to_string(),
                    predicate: ladder.predicate(*value),
                    threshold: Some(*value),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Buckets::Filters(set) => set.len(),
            Buckets::Ladder(ladder) => ladder.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_ladder(&self) -> bool {
        matches!(self, Buckets::Ladder(_))
    }
}
