//! Logical plan types (noun module)
//!
//! A small relational tree plus typed predicates and expressions. Every
//! statement the planner produces is built from these and rendered to SQL in
//! one pass by the emitter.

mod node;
mod expr;

pub use node::{PlanNode, Scan, Union, Intersect, Join, JoinSide, JoinOutput, Filter, Aggregate};
pub use expr::{Expr, Predicate, TrustedPredicate, ProjectExpr, Column, Literal, BinaryOperator, Aggregation};
