//! SQL emitter
//!
//! Transforms a PlanNode tree into a pretty-printed SQL string. Generated
//! aliases are always double-quoted; table and data column names are emitted
//! as given.

use crate::plan::{
    Aggregate, Aggregation, Expr, Filter, Intersect, Join, JoinOutput, JoinSide, Literal,
    PlanNode, Predicate, ProjectExpr, Scan, Union,
};
use super::error::EmitError;

/// Emit a pretty-printed SQL string from a PlanNode.
pub fn emit_sql(node: &PlanNode) -> Result<String, EmitError> {
    emit_node(node, 0)
}

/// Quote an identifier for use as an alias or a reference to one.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn pad(indent: usize) -> String {
    "  ".repeat(indent)
}

// ---------------------------------------------------------------------------
// Node dispatch
// ---------------------------------------------------------------------------

fn emit_node(node: &PlanNode, indent: usize) -> Result<String, EmitError> {
    match node {
        PlanNode::Scan(scan) => Ok(emit_scan(scan, indent)),
        PlanNode::Union(union) => emit_union(union, indent),
        PlanNode::Intersect(intersect) => emit_intersect(intersect, indent),
        PlanNode::Join(join) => emit_join(join, indent),
        PlanNode::Filter(filter) => emit_filter(filter, indent),
        PlanNode::Aggregate(agg) => emit_aggregate(agg, indent),
    }
}

// ---------------------------------------------------------------------------
// Relation nodes
// ---------------------------------------------------------------------------

fn emit_scan(scan: &Scan, indent: usize) -> String {
    let p = pad(indent);
    let cols = if scan.columns.is_empty() {
        "*".to_string()
    } else {
        scan.columns.join(", ")
    };
    match &scan.filter {
        Some(predicate) => format!(
            "{p}SELECT {cols}\n{p}FROM {table}\n{p}WHERE {pred}",
            table = scan.table,
            pred = emit_predicate(predicate),
        ),
        None => format!("{p}SELECT {cols}\n{p}FROM {table}", table = scan.table),
    }
}

fn emit_set_operation(
    inputs: &[PlanNode],
    keyword: &str,
    indent: usize,
) -> Result<String, EmitError> {
    if inputs.len() < 2 {
        return Err(EmitError::InvalidPlan(format!(
            "{} requires at least 2 inputs",
            keyword
        )));
    }

    let parts: Vec<String> = inputs
        .iter()
        .map(|n| emit_node(n, indent))
        .collect::<Result<Vec<_>, _>>()?;

    let p = pad(indent);
    Ok(parts.join(&format!("\n{p}{keyword}\n")))
}

fn emit_union(union: &Union, indent: usize) -> Result<String, EmitError> {
    emit_set_operation(&union.inputs, "UNION ALL", indent)
}

fn emit_intersect(intersect: &Intersect, indent: usize) -> Result<String, EmitError> {
    emit_set_operation(&intersect.inputs, "INTERSECT", indent)
}

fn emit_join(join: &Join, indent: usize) -> Result<String, EmitError> {
    if join.on.is_empty() {
        return Err(EmitError::InvalidPlan("Join requires at least one key column".to_string()));
    }
    if join.projection.is_empty() {
        return Err(EmitError::InvalidPlan("Join requires a non-empty select list".to_string()));
    }

    let p = pad(indent);
    let left = emit_node(&join.left, indent + 1)?;
    let right = emit_node(&join.right, indent + 1)?;

    let select: Vec<String> = join.projection.iter().map(emit_join_output).collect();
    let on: Vec<String> = join.on
        .iter()
        .map(|key| {
            format!(
                "{l}.{k} = {r}.{k}",
                l = JoinSide::Left.alias(),
                r = JoinSide::Right.alias(),
                k = quote_ident(key),
            )
        })
        .collect();

    Ok(format!(
        "{p}SELECT {sel}\n{p}FROM (\n{left}\n{p}) AS _left\n{p}INNER JOIN (\n{right}\n{p}) AS _right\n{p}  ON {on}",
        sel = select.join(", "),
        on = on.join(" AND "),
    ))
}

fn emit_join_output(output: &JoinOutput) -> String {
    match output {
        JoinOutput::AllFrom(side) => format!("{}.*", side.alias()),
        JoinOutput::Column { side, name } => {
            let quoted = quote_ident(name);
            format!("{}.{} AS {}", side.alias(), quoted, quoted)
        }
    }
}

fn emit_filter(filter: &Filter, indent: usize) -> Result<String, EmitError> {
    let p = pad(indent);
    let input = emit_node(&filter.input, indent + 1)?;
    let predicate = emit_predicate(&filter.predicate);
    Ok(format!(
        "{p}SELECT *\n{p}FROM (\n{input}\n{p}) AS _f\n{p}WHERE {predicate}"
    ))
}

fn emit_aggregate(agg: &Aggregate, indent: usize) -> Result<String, EmitError> {
    if agg.aggregates.is_empty() {
        return Err(EmitError::InvalidPlan(
            "Aggregate requires at least one aggregate expression".to_string(),
        ));
    }

    let p = pad(indent);
    let input = emit_node(&agg.input, indent + 1)?;

    let mut select_items: Vec<String> = agg.group_by.iter().map(emit_project_expr).collect();
    select_items.extend(agg.aggregates.iter().map(emit_project_expr));

    if agg.group_by.is_empty() {
        Ok(format!(
            "{p}SELECT {sel}\n{p}FROM (\n{input}\n{p}) AS _agg",
            sel = select_items.join(&format!(",\n{p}  ")),
        ))
    } else {
        let group_exprs: Vec<String> = agg.group_by.iter().map(|g| emit_expr(&g.expr)).collect();
        Ok(format!(
            "{p}SELECT {sel}\n{p}FROM (\n{input}\n{p}) AS _agg\n{p}GROUP BY {grp}",
            sel = select_items.join(&format!(",\n{p}  ")),
            grp = group_exprs.join(", "),
        ))
    }
}

fn emit_project_expr(item: &ProjectExpr) -> String {
    format!("{} AS {}", emit_expr(&item.expr), quote_ident(&item.alias))
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// Render a scalar or aggregate expression.
pub fn emit_expr(expr: &Expr) -> String {
    match expr {
        Expr::Column(col) => col.name.clone(),
        Expr::Literal(lit) => emit_literal(lit),
        Expr::Case { when_then, else_result } => {
            if when_then.is_empty() {
                // A CASE with no branch matches nothing.
                return match else_result {
                    Some(el) => emit_expr(el),
                    None => "NULL".to_string(),
                };
            }
            let mut sql = String::from("CASE");
            for (cond, then) in when_then {
                sql.push_str(&format!(" WHEN {} THEN {}", emit_predicate(cond), emit_expr(then)));
            }
            if let Some(el) = else_result {
                sql.push_str(&format!(" ELSE {}", emit_expr(el)));
            }
            sql.push_str(" END");
            sql
        }
        Expr::CountStar => "COUNT(*)".to_string(),
        Expr::Aggregate { func, arg } => {
            let inner = emit_expr(arg);
            match func {
                Aggregation::Count => format!("COUNT({})", inner),
                Aggregation::Sum => format!("SUM({})", inner),
            }
        }
        Expr::Divide(a, b) => format!(
            "(CAST({} AS DOUBLE) / CAST({} AS DOUBLE))",
            emit_expr(a),
            emit_expr(b),
        ),
        Expr::NullIf(a, b) => format!("NULLIF({}, {})", emit_expr(a), emit_expr(b)),
    }
}

fn emit_literal(lit: &Literal) -> String {
    match lit {
        Literal::Bool(b) => if *b { "TRUE".to_string() } else { "FALSE".to_string() },
        Literal::Int(i) => i.to_string(),
        Literal::Float(f) => {
            if !f.is_finite() {
                "NULL".to_string()
            } else if f.fract() == 0.0 {
                format!("{:.1}", f)
            } else {
                format!("{}", f)
            }
        }
        Literal::String(s) => format!("'{}'", s.replace('\'', "''")),
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Render a boolean predicate.
///
/// The outermost conjunction is not parenthesized. Operands of a conjunction
/// that are disjunctions (typed or raw text with a top-level `OR`) are.
pub fn emit_predicate(pred: &Predicate) -> String {
    match pred {
        Predicate::Sql(s) => s.clone(),
        Predicate::Trusted(t) => t.as_str().to_string(),
        Predicate::Compare { left, op, right } => {
            format!("{} {} {}", emit_expr(left), op.as_str(), emit_expr(right))
        }
        Predicate::And(parts) => {
            if parts.is_empty() {
                return "TRUE".to_string();
            }
            parts.iter().map(emit_conjunct).collect::<Vec<_>>().join(" AND ")
        }
        Predicate::Or(parts) => {
            if parts.is_empty() {
                return "FALSE".to_string();
            }
            parts
                .iter()
                .map(|p| match p {
                    Predicate::And(_) => format!("({})", emit_predicate(p)),
                    _ => emit_predicate(p),
                })
                .collect::<Vec<_>>()
                .join(" OR ")
        }
        Predicate::IsNotNull(e) => format!("{} IS NOT NULL", emit_expr(e)),
    }
}

/// Render `pred` so it can stand as one operand of `AND`: a top-level `OR`
/// is parenthesized.
pub fn emit_conjunct(pred: &Predicate) -> String {
    let rendered = emit_predicate(pred);
    let needs_group = match pred {
        Predicate::Or(parts) => !parts.is_empty(),
        Predicate::Sql(text) => has_top_level_or(text),
        Predicate::Trusted(t) => has_top_level_or(t.as_str()),
        _ => false,
    };
    if needs_group {
        format!("({})", rendered)
    } else {
        rendered
    }
}

/// Whether `text` contains an `OR` keyword outside parentheses and quotes.
fn has_top_level_or(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut depth: i32 = 0;
    let mut quote: Option<u8> = None;
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';

    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'(' => depth += 1,
                b')' => depth -= 1,
                _ if depth == 0
                    && i + 1 < bytes.len()
                    && bytes[i..i + 2].eq_ignore_ascii_case(b"or")
                    && (i == 0 || !is_word(bytes[i - 1]))
                    && (i + 2 == bytes.len() || !is_word(bytes[i + 2])) =>
                {
                    return true;
                }
                _ => {}
            },
        }
        i += 1;
    }
    false
}
