//! Catalog - the named data sources, metadata tables, filter sets and
//! ladders that query requests refer to

use std::collections::BTreeMap;
use serde::Deserialize;
use crate::error::ModelError;
use super::data_source::{DataSource, MetadataTable};
use super::filters::FilterSet;
use super::metric::ThresholdLadder;

pub const DEFAULT_RUN_PREFIX: &str = r"^\d{14}_";
pub const DEFAULT_RUN_SUFFIX: &str = r"_(pred|preds|gt|meta)$";

fn default_prefix() -> String {
    DEFAULT_RUN_PREFIX.to_string()
}

fn default_suffix() -> String {
    DEFAULT_RUN_SUFFIX.to_string()
}

/// Patterns stripped from run identifiers after execution
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NormalizerConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            suffix: default_suffix(),
        }
    }
}

/// The top-level catalog document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub data_sources: Vec<DataSource>,
    #[serde(default)]
    pub metadata: Vec<MetadataTable>,
    #[serde(default)]
    pub filter_sets: BTreeMap<String, FilterSet>,
    #[serde(default)]
    pub ladders: BTreeMap<String, ThresholdLadder>,
    #[serde(default)]
    pub normalizer: NormalizerConfig,
}

impl Catalog {
    /// Get a data source by name
    pub fn get_data_source(&self, name: &str) -> Option<&DataSource> {
        self.data_sources.iter().find(|d| d.name == name)
    }

    /// Get a metadata table by name
    pub fn get_metadata(&self, name: &str) -> Option<&MetadataTable> {
        self.metadata.iter().find(|m| m.name == name)
    }

    pub fn get_filter_set(&self, name: &str) -> Option<&FilterSet> {
        self.filter_sets.get(name)
    }

    pub fn get_ladder(&self, name: &str) -> Option<&ThresholdLadder> {
        self.ladders.get(name)
    }

    /// Check names are unique and every entry is usable
    pub fn validate(&self) -> Result<(), ModelError> {
        for (idx, source) in self.data_sources.iter().enumerate() {
            if self.data_sources[..idx].iter().any(|d| d.name == source.name) {
                return Err(ModelError::DuplicateEntry {
                    kind: "data source",
                    name: source.name.clone(),
                });
            }
            source.validate()?;
        }
        for (idx, meta) in self.metadata.iter().enumerate() {
            if self.metadata[..idx].iter().any(|m| m.name == meta.name) {
                return Err(ModelError::DuplicateEntry {
                    kind: "metadata table",
                    name: meta.name.clone(),
                });
            }
            meta.validate()?;
        }
        for pattern in [&self.normalizer.prefix, &self.normalizer.suffix] {
            regex::Regex::new(pattern).map_err(|source| ModelError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        }
        Ok(())
    }
}
