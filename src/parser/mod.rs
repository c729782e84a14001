//! Catalog and request parser (verb module)
//!
//! Transforms YAML files into catalog and request types.

use std::path::Path;
use crate::error::ParseError;
use crate::model::Catalog;
use crate::query::QueryRequest;

fn read(path: &Path) -> Result<String, ParseError> {
    std::fs::read_to_string(path).map_err(|e| ParseError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// Parse a catalog from a YAML file
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Catalog, ParseError> {
    parse_str(&read(path.as_ref())?)
}

/// Parse a catalog from a YAML string, then validate it
pub fn parse_str(yaml: &str) -> Result<Catalog, ParseError> {
    let catalog: Catalog = serde_yaml::from_str(yaml)?;
    catalog.validate()?;
    Ok(catalog)
}

/// Parse a query request from a YAML file
pub fn parse_request_file<P: AsRef<Path>>(path: P) -> Result<QueryRequest, ParseError> {
    parse_request_str(&read(path.as_ref())?)
}

/// Parse a query request from a YAML string
pub fn parse_request_str(yaml: &str) -> Result<QueryRequest, ParseError> {
    serde_yaml::from_str(yaml).map_err(ParseError::from)
}
