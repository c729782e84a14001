/// Errors that can occur while resolving a request against a catalog
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Data source '{0}' not found")]
    DataSourceNotFound(String),
    #[error("Metadata table '{0}' not found")]
    MetadataNotFound(String),
    #[error("Filter set '{0}' not found")]
    FilterSetNotFound(String),
    #[error("Threshold ladder '{0}' not found")]
    LadderNotFound(String),
}
