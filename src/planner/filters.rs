//! Filter composition: optional predicate fragments into one conjunction

use crate::emitter::emit_conjunct;
use crate::model::{DataSource, RoleFilter};
use crate::plan::Predicate;

/// Join the present, non-blank parts with `AND`.
///
/// The result is prefixed with `AND ` so it can follow an existing WHERE
/// condition, and is empty when no part is left.
pub fn compose_filters<'a, I>(parts: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let predicate = Predicate::all(parts.into_iter().map(|p| p.and_then(Predicate::raw)));
    render_clause(predicate.as_ref())
}

/// `ignore ∧ role ∧ extra` for a data source.
///
/// `include_all` drops the ignore predicate. `ca_oriented` selects the CA
/// ignore predicate and role column, each falling back to the default.
pub fn stats_filters(
    source: &DataSource,
    role: &RoleFilter,
    ca_oriented: bool,
    extra_filter: &str,
    include_all: bool,
) -> Option<Predicate> {
    let ignore = if include_all {
        None
    } else {
        source.ignore_predicate(ca_oriented)
    };
    let role = role.predicate(source.role_column(ca_oriented));
    Predicate::all([ignore, role, Predicate::raw(extra_filter)])
}

/// [`stats_filters`] rendered as an `AND ...` clause, or `""`
pub fn stats_filters_clause(
    source: &DataSource,
    role: &RoleFilter,
    ca_oriented: bool,
    extra_filter: &str,
    include_all: bool,
) -> String {
    render_clause(stats_filters(source, role, ca_oriented, extra_filter, include_all).as_ref())
}

fn render_clause(predicate: Option<&Predicate>) -> String {
    match predicate {
        Some(p) => format!("AND {}", emit_conjunct(p)),
        None => String::new(),
    }
}
