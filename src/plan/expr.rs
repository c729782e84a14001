//! Expression types for the logical plan

/// An unqualified column reference
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
        }
    }
}

/// Aggregate functions used by metric templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Count,
    Sum,
}

/// Scalar and aggregate expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference
    Column(Column),
    /// Literal value
    Literal(Literal),
    /// CASE WHEN expression
    Case {
        /// List of (condition, result) pairs
        when_then: Vec<(Predicate, Expr)>,
        /// Optional ELSE result
        else_result: Option<Box<Expr>>,
    },
    /// COUNT(*)
    CountStar,
    /// func(arg)
    Aggregate {
        func: Aggregation,
        arg: Box<Expr>,
    },
    /// Division, rendered in floating point
    Divide(Box<Expr>, Box<Expr>),
    /// NULLIF(a, b)
    NullIf(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(Column::new(name))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(value.into()))
    }

    pub fn float(value: f64) -> Self {
        Expr::Literal(Literal::Float(value))
    }

    /// `COUNT(CASE WHEN <predicate> THEN 1 END)`
    pub fn count_if(predicate: Predicate) -> Self {
        Expr::Aggregate {
            func: Aggregation::Count,
            arg: Box::new(Expr::Case {
                when_then: vec![(predicate, Expr::Literal(Literal::Int(1)))],
                else_result: None,
            }),
        }
    }

    /// `SUM(CASE WHEN <predicate> THEN <value> ELSE 0 END)`
    pub fn sum_if(predicate: Predicate, value: Expr) -> Self {
        Expr::Aggregate {
            func: Aggregation::Sum,
            arg: Box::new(Expr::Case {
                when_then: vec![(predicate, value)],
                else_result: Some(Box::new(Expr::Literal(Literal::Int(0)))),
            }),
        }
    }

    /// `numerator / NULLIF(denominator, 0)`: a zero denominator yields NULL.
    pub fn ratio(numerator: Expr, denominator: Expr) -> Self {
        Expr::Divide(
            Box::new(numerator),
            Box::new(Expr::NullIf(
                Box::new(denominator),
                Box::new(Expr::Literal(Literal::Int(0))),
            )),
        )
    }
}

/// A boolean SQL predicate text that was validated outside this crate.
///
/// The metadata filter built by the dashboard's filter editor arrives here
/// already checked; it is rendered verbatim and never inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedPredicate(String);

impl TrustedPredicate {
    /// Wrap externally validated text. Blank text yields `None`.
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Boolean expressions
///
/// Conjunctions are only built through [`Predicate::all`], which drops absent
/// parts, so an empty operand never reaches the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Raw boolean SQL (filter-set entries, ignore predicates, caller extras)
    Sql(String),
    /// Externally validated filter text
    Trusted(TrustedPredicate),
    /// left op right
    Compare {
        left: Expr,
        op: BinaryOperator,
        right: Expr,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    IsNotNull(Expr),
}

impl Predicate {
    /// A raw predicate, or `None` when the text is blank.
    pub fn raw(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Predicate::Sql(trimmed.to_string()))
        }
    }

    pub fn compare(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Predicate::Compare { left, op, right }
    }

    /// `column = 'value'`
    pub fn column_eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::compare(Expr::column(column), BinaryOperator::Eq, Expr::string(value))
    }

    /// Conjunction of the present parts.
    ///
    /// Absent parts are skipped and nested conjunctions are flattened. Returns
    /// `None` when nothing is left, and the part itself when only one is.
    pub fn all<I>(parts: I) -> Option<Self>
    where
        I: IntoIterator<Item = Option<Predicate>>,
    {
        let mut flat = Vec::new();
        for part in parts.into_iter().flatten() {
            match part {
                Predicate::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Predicate::And(flat)),
        }
    }

    /// Disjunction of the given parts, `None` when empty.
    pub fn any<I>(parts: I) -> Option<Self>
    where
        I: IntoIterator<Item = Predicate>,
    {
        let mut flat: Vec<Predicate> = parts.into_iter().collect();
        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Predicate::Or(flat)),
        }
    }

    /// `self AND other`
    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(vec![self, other])
    }

    pub fn is_not_null(expr: Expr) -> Self {
        Predicate::IsNotNull(expr)
    }
}

/// An expression with its output alias
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectExpr {
    /// The expression to compute
    pub expr: Expr,
    /// Output column name
    pub alias: String,
}

impl ProjectExpr {
    pub fn new(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: alias.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_blank_is_absent() {
        assert!(Predicate::raw("").is_none());
        assert!(Predicate::raw("   \n").is_none());
        assert_eq!(Predicate::raw(" a = 1 "), Some(Predicate::Sql("a = 1".into())));
    }

    #[test]
    fn test_all_skips_absent_parts() {
        assert_eq!(Predicate::all(vec![None, None]), None);

        let single = Predicate::all(vec![None, Predicate::raw("x > 1"), None]);
        assert_eq!(single, Some(Predicate::Sql("x > 1".into())));
    }

    #[test]
    fn test_all_flattens_nested_conjunctions() {
        let inner = Predicate::all(vec![Predicate::raw("a"), Predicate::raw("b")]);
        let outer = Predicate::all(vec![inner, Predicate::raw("c")]).unwrap();
        match outer {
            Predicate::And(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected conjunction, got {:?}", other),
        }
    }

    #[test]
    fn test_any_of_one_is_the_part() {
        let p = Predicate::any(vec![Predicate::column_eq("role", "host")]).unwrap();
        assert!(matches!(p, Predicate::Compare { .. }));
        assert!(Predicate::any(Vec::new()).is_none());
    }

    #[test]
    fn test_trusted_blank_is_absent() {
        assert!(TrustedPredicate::new("  ").is_none());
        assert_eq!(TrustedPredicate::new(" w = 'dry' ").unwrap().as_str(), "w = 'dry'");
    }
}
