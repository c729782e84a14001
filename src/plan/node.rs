//! Plan node types

use super::expr::{Predicate, ProjectExpr};

/// A node in the logical plan tree
#[derive(Debug, Clone, PartialEq)]
pub enum PlanNode {
    /// Scan a table
    Scan(Scan),
    /// Union multiple relations (UNION ALL)
    Union(Union),
    /// Rows present in every input (INTERSECT)
    Intersect(Intersect),
    /// Inner join of two relations on shared key columns
    Join(Join),
    /// Filter rows
    Filter(Filter),
    /// Aggregate (GROUP BY)
    Aggregate(Aggregate),
}

/// Scan a table
#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    /// Table name (schema.table)
    pub table: String,
    /// Columns to read; empty means `*`
    pub columns: Vec<String>,
    /// Row filter evaluated against the table itself, before projection
    pub filter: Option<Predicate>,
}

impl Scan {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filter: None,
        }
    }

    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_filter(mut self, filter: Option<Predicate>) -> Self {
        self.filter = filter;
        self
    }
}

/// Union multiple relations (UNION ALL)
///
/// All inputs must have the same column list in the same order; the union
/// is positional.
#[derive(Debug, Clone, PartialEq)]
pub struct Union {
    /// Input relations to union (must have at least 2)
    pub inputs: Vec<PlanNode>,
}

/// Distinct rows common to every input (INTERSECT)
#[derive(Debug, Clone, PartialEq)]
pub struct Intersect {
    /// Input relations (must have at least 2)
    pub inputs: Vec<PlanNode>,
}

/// Which side of a join a projected column comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSide {
    Left,
    Right,
}

impl JoinSide {
    pub fn alias(&self) -> &'static str {
        match self {
            JoinSide::Left => "_left",
            JoinSide::Right => "_right",
        }
    }
}

/// One item of a join's select list
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutput {
    /// Every column of one side (`_left.*`)
    AllFrom(JoinSide),
    /// A single column of one side, kept under its own name
    Column { side: JoinSide, name: String },
}

/// Inner join on columns that carry the same name on both sides
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Left input
    pub left: Box<PlanNode>,
    /// Right input
    pub right: Box<PlanNode>,
    /// Key columns, equal-named on both sides
    pub on: Vec<String>,
    /// Select list; must not repeat a name
    pub projection: Vec<JoinOutput>,
}

/// Filter rows (WHERE clause)
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Input relation
    pub input: Box<PlanNode>,
    /// Filter predicate
    pub predicate: Predicate,
}

/// Aggregate (GROUP BY)
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    /// Input relation
    pub input: Box<PlanNode>,
    /// Grouping expressions with their output aliases
    pub group_by: Vec<ProjectExpr>,
    /// Aggregate expressions
    pub aggregates: Vec<ProjectExpr>,
}

impl PlanNode {
    /// Number of scans of `table` anywhere in the tree
    pub fn count_scans_of(&self, table: &str) -> usize {
        match self {
            PlanNode::Scan(scan) => usize::from(scan.table == table),
            PlanNode::Union(u) => u.inputs.iter().map(|n| n.count_scans_of(table)).sum(),
            PlanNode::Intersect(i) => i.inputs.iter().map(|n| n.count_scans_of(table)).sum(),
            PlanNode::Join(j) => j.left.count_scans_of(table) + j.right.count_scans_of(table),
            PlanNode::Filter(f) => f.input.count_scans_of(table),
            PlanNode::Aggregate(a) => a.input.count_scans_of(table),
        }
    }

    /// Whether an INTERSECT node appears anywhere in the tree
    pub fn has_intersect(&self) -> bool {
        match self {
            PlanNode::Scan(_) => false,
            PlanNode::Intersect(_) => true,
            PlanNode::Union(u) => u.inputs.iter().any(PlanNode::has_intersect),
            PlanNode::Join(j) => j.left.has_intersect() || j.right.has_intersect(),
            PlanNode::Filter(f) => f.input.has_intersect(),
            PlanNode::Aggregate(a) => a.input.has_intersect(),
        }
    }
}
