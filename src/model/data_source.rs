//! Data source descriptors - one logical metric table stored as one
//! physical table per run

use serde::Deserialize;
use crate::error::ModelError;
use crate::plan::Predicate;

fn default_keys() -> Vec<String> {
    vec!["clip".to_string(), "frame".to_string()]
}

fn default_run_column() -> String {
    "net_id".to_string()
}

fn default_role_column() -> String {
    "role".to_string()
}

/// A logical metric table.
///
/// Every table in `tables` must expose `columns` with the same types, in the
/// same order: the tables are combined with a positional UNION ALL.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataSource {
    #[serde(default)]
    pub name: String,
    /// Physical table per run
    pub tables: Vec<String>,
    /// Column list shared by every table
    pub columns: Vec<String>,
    /// Row identity shared by every table (clip, frame)
    #[serde(default = "default_keys")]
    pub keys: Vec<String>,
    /// Column holding the run identifier
    #[serde(default = "default_run_column")]
    pub run_column: String,
    /// Default predicate removing ignored rows
    #[serde(default)]
    pub ignore: String,
    /// Ignore predicate used for CA-oriented evaluation
    #[serde(default)]
    pub ca_ignore: Option<String>,
    #[serde(default = "default_role_column")]
    pub role_column: String,
    /// Role column used for CA-oriented evaluation
    #[serde(default)]
    pub ca_role_column: Option<String>,
}

impl DataSource {
    pub fn new<T, C>(tables: T, columns: C) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            name: String::new(),
            tables: tables.into_iter().map(Into::into).collect(),
            columns: columns.into_iter().map(Into::into).collect(),
            keys: default_keys(),
            run_column: default_run_column(),
            ignore: String::new(),
            ca_ignore: None,
            role_column: default_role_column(),
            ca_role_column: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_ignore(mut self, predicate: impl Into<String>) -> Self {
        self.ignore = predicate.into();
        self
    }

    pub fn with_ca_ignore(mut self, predicate: impl Into<String>) -> Self {
        self.ca_ignore = Some(predicate.into());
        self
    }

    pub fn with_keys<K>(mut self, keys: K) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_run_column(mut self, column: impl Into<String>) -> Self {
        self.run_column = column.into();
        self
    }

    pub fn with_role_columns(mut self, role: impl Into<String>, ca_role: Option<String>) -> Self {
        self.role_column = role.into();
        self.ca_role_column = ca_role;
        self
    }

    /// Check that the descriptor can produce a valid row-set
    pub fn validate(&self) -> Result<(), ModelError> {
        let invalid = |reason: String| ModelError::InvalidDataSource {
            name: self.name.clone(),
            reason,
        };
        if self.tables.is_empty() {
            return Err(invalid("at least one table is required".to_string()));
        }
        if self.columns.is_empty() {
            return Err(invalid("the column list is empty".to_string()));
        }
        if let Some(dup) = first_duplicate(&self.columns) {
            return Err(invalid(format!("column '{}' is listed twice", dup)));
        }
        if self.keys.is_empty() {
            return Err(invalid("at least one key column is required".to_string()));
        }
        for key in &self.keys {
            if !self.has_column(key) {
                return Err(invalid(format!("key column '{}' is not in the column list", key)));
            }
        }
        if !self.has_column(&self.run_column) {
            return Err(invalid(format!(
                "run column '{}' is not in the column list",
                self.run_column
            )));
        }
        Ok(())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Ignore predicate for the selected evaluation mode.
    ///
    /// CA-oriented evaluation falls back to the default predicate when the
    /// source has no CA-specific one.
    pub fn ignore_predicate(&self, ca_oriented: bool) -> Option<Predicate> {
        let text = match (&self.ca_ignore, ca_oriented) {
            (Some(ca), true) => ca.as_str(),
            _ => self.ignore.as_str(),
        };
        Predicate::raw(text)
    }

    /// Role column for the selected evaluation mode
    pub fn role_column(&self, ca_oriented: bool) -> &str {
        match (&self.ca_role_column, ca_oriented) {
            (Some(ca), true) => ca,
            _ => &self.role_column,
        }
    }

    /// Columns to union: the declared list followed by any extra columns not
    /// already present.
    pub fn union_columns(&self, extra_columns: &[String]) -> Vec<String> {
        let mut columns = self.columns.clone();
        for extra in extra_columns {
            if !columns.contains(extra) {
                columns.push(extra.clone());
            }
        }
        columns
    }
}

/// Per-clip metadata joined onto the base row-set
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetadataTable {
    #[serde(default)]
    pub name: String,
    pub table: String,
    /// Join keys, present in both the data source and the metadata table
    pub keys: Vec<String>,
    /// Metadata columns carried into the row-set
    #[serde(default)]
    pub columns: Vec<String>,
}

impl MetadataTable {
    pub fn new<K, C>(table: impl Into<String>, keys: K, columns: C) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            name: String::new(),
            table: table.into(),
            keys: keys.into_iter().map(Into::into).collect(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let invalid = |reason: String| ModelError::InvalidDataSource {
            name: self.table.clone(),
            reason,
        };
        if self.keys.is_empty() {
            return Err(invalid("metadata join needs at least one key".to_string()));
        }
        if let Some(col) = self.columns.iter().find(|c| self.keys.contains(*c)) {
            return Err(invalid(format!("'{}' is both a key and a carried column", col)));
        }
        if let Some(dup) = first_duplicate(&self.columns) {
            return Err(invalid(format!("column '{}' is listed twice", dup)));
        }
        Ok(())
    }
}

/// Which roles to keep
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RoleFilter {
    /// No role restriction
    #[default]
    Any,
    One(String),
    Many(Vec<String>),
}

impl RoleFilter {
    /// Predicate on `column`: an equality, an OR chain, or nothing
    pub fn predicate(&self, column: &str) -> Option<Predicate> {
        match self {
            RoleFilter::Any => None,
            RoleFilter::One(role) if role.trim().is_empty() => None,
            RoleFilter::One(role) => Some(Predicate::column_eq(column, role.trim())),
            RoleFilter::Many(roles) => Predicate::any(
                roles
                    .iter()
                    .map(|r| r.trim())
                    .filter(|r| !r.is_empty())
                    .map(|r| Predicate::column_eq(column, r)),
            ),
        }
    }
}

impl<'de> Deserialize<'de> for RoleFilter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawRole {
            One(String),
            Many(Vec<String>),
        }

        Ok(match Option::<RawRole>::deserialize(deserializer)? {
            None => RoleFilter::Any,
            Some(RawRole::One(role)) if role.trim().is_empty() => RoleFilter::Any,
            Some(RawRole::One(role)) => RoleFilter::One(role),
            Some(RawRole::Many(roles)) if roles.is_empty() => RoleFilter::Any,
            Some(RawRole::Many(roles)) => RoleFilter::Many(roles),
        })
    }
}

fn first_duplicate(items: &[String]) -> Option<&str> {
    items
        .iter()
        .enumerate()
        .find(|(i, item)| items[..*i].contains(*item))
        .map(|(_, item)| item.as_str())
}
