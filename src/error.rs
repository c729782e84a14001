//! Error types for netmetrics configuration

/// Errors raised while building catalog values (filter sets, data sources,
/// ladders) from code or from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A filter set entry whose predicate is blank
    #[error("Filter '{name}' has an empty predicate")]
    EmptyPredicate { name: String },
    /// The same name appears twice in one filter set
    #[error("Filter '{name}' is defined more than once")]
    DuplicateFilter { name: String },
    /// Threshold ladder or histogram edges that are empty, non-finite or not monotonic
    #[error("Invalid threshold values for '{column}': {reason}")]
    InvalidThresholds { column: String, reason: String },
    /// A data source or metadata table that cannot produce a valid row-set
    #[error("Invalid data source '{name}': {reason}")]
    InvalidDataSource { name: String, reason: String },
    /// Two catalog entries of the same kind share a name
    #[error("Duplicate {kind} '{name}' in catalog")]
    DuplicateEntry { kind: &'static str, name: String },
    /// A run-id normalizer pattern that does not compile
    #[error("Invalid normalizer pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors that can occur during parsing
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// IO error reading file
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// YAML deserialization error
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The document parsed but describes an invalid catalog
    #[error("Invalid catalog: {0}")]
    Invalid(#[from] ModelError),
}
