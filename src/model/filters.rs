//! Filter sets - named boolean predicates used to slice a metric

use std::fmt;
use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use crate::emitter::emit_predicate;
use crate::error::ModelError;
use crate::plan::{BinaryOperator, Expr, Predicate};

/// Ordered mapping `name -> predicate`.
///
/// Each predicate is a self-contained boolean SQL expression. It is not
/// assumed to be parenthesized; the emitter groups it where precedence
/// requires. Blank predicates and repeated names are rejected on construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    entries: Vec<(String, String)>,
}

impl FilterSet {
    pub fn new<I, N, P>(entries: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: Into<String>,
    {
        let mut set = FilterSet::default();
        for (name, predicate) in entries {
            set.insert(name.into(), predicate.into())?;
        }
        Ok(set)
    }

    fn insert(&mut self, name: String, predicate: String) -> Result<(), ModelError> {
        let predicate = predicate.trim().to_string();
        if predicate.is_empty() {
            return Err(ModelError::EmptyPredicate { name });
        }
        if self.get(&name).is_some() {
            return Err(ModelError::DuplicateFilter { name });
        }
        self.entries.push((name, predicate));
        Ok(())
    }

    /// Histogram bins over `column`, one filter per bin.
    ///
    /// With edges `e0 < e1 < ... < ek`, bin `i` is `[e_i, e_{i+1})` and the last
    /// bin is open-ended (`column >= ek`). Bins are named by index.
    pub fn from_bins(column: &str, edges: &[f64]) -> Result<Self, ModelError> {
        let invalid = |reason: &str| ModelError::InvalidThresholds {
            column: column.to_string(),
            reason: reason.to_string(),
        };
        if edges.is_empty() {
            return Err(invalid("at least one bin edge is required"));
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(invalid("bin edges must be finite"));
        }
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(invalid("bin edges must be strictly increasing"));
        }

        let bound = |op: BinaryOperator, edge: f64| {
            Predicate::compare(Expr::column(column), op, Expr::float(edge))
        };

        let mut set = FilterSet::default();
        for (idx, lower) in edges.iter().enumerate() {
            let upper = edges.get(idx + 1).map(|u| bound(BinaryOperator::Lt, *u));
            let predicate = Predicate::all(vec![Some(bound(BinaryOperator::GtEq, *lower)), upper])
                .map(|p| emit_predicate(&p))
                .unwrap_or_default();
            set.insert(idx.to_string(), predicate)?;
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the predicate text for a filter name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p.as_str())
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p.as_str()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }
}

impl<'de> Deserialize<'de> for FilterSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FilterSetVisitor;

        impl<'de> Visitor<'de> for FilterSetVisitor {
            type Value = FilterSet;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a mapping of filter name to SQL predicate")
            }

            fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut set = FilterSet::default();
                while let Some((name, predicate)) = access.next_entry::<String, String>()? {
                    set.insert(name, predicate).map_err(de::Error::custom)?;
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(FilterSetVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_declaration_order() {
        let set = FilterSet::new(vec![
            ("urban", "road_type = 'urban'"),
            ("highway", "road_type = 'highway'"),
            ("all", "TRUE"),
        ])
        .unwrap();
        assert_eq!(set.names(), vec!["urban", "highway", "all"]);
        assert_eq!(set.get("highway"), Some("road_type = 'highway'"));
    }

    #[test]
    fn test_rejects_blank_predicate() {
        let err = FilterSet::new(vec![("urban", "  ")]).unwrap_err();
        assert!(matches!(err, ModelError::EmptyPredicate { name } if name == "urban"));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let err = FilterSet::new(vec![("a", "x = 1"), ("a", "x = 2")]).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateFilter { .. }));
    }

    #[test]
    fn test_from_bins() {
        let set = FilterSet::from_bins("n_frames", &[0.0, 5.0, 10.0]).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.get("0"), Some("n_frames >= 0.0 AND n_frames < 5.0"));
        assert_eq!(set.get("1"), Some("n_frames >= 5.0 AND n_frames < 10.0"));
        assert_eq!(set.get("2"), Some("n_frames >= 10.0"));
    }

    #[test]
    fn test_from_bins_rejects_unsorted_edges() {
        assert!(FilterSet::from_bins("x", &[1.0, 1.0]).is_err());
        assert!(FilterSet::from_bins("x", &[]).is_err());
    }

    #[test]
    fn test_deserialize_keeps_yaml_order() {
        let set: FilterSet = serde_yaml::from_str("z: a = 1\nb: a = 2\nm: a = 3\n").unwrap();
        assert_eq!(set.names(), vec!["z", "b", "m"]);
    }

    #[test]
    fn test_deserialize_rejects_blank_predicate() {
        let result: Result<FilterSet, _> = serde_yaml::from_str("urban: ''\n");
        assert!(result.is_err());
    }
}
