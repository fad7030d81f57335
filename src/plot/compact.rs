//! Compact column identifiers.
//!
//! Feature IDs can be long (a full taxonomy per feature) and each one is
//! repeated once per sample in the feature-count dataset. Replacing them with
//! their positional index as a string keeps the sample plot small; the
//! mapping is shipped alongside so the original IDs can be recovered.

use crate::data::{Axis, Labeled};
use crate::error::{RrvError, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;

/// Bijective mapping from original identifiers to `"0"`, `"1"`, ...
///
/// Serializes as a JSON object `{original: compact}` in positional order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CompactColumnMap {
    forward: IndexMap<String, String>,
}

impl CompactColumnMap {
    /// Number identifiers in their existing order.
    pub fn new(ids: &[String]) -> Result<Self> {
        let mut forward = IndexMap::with_capacity(ids.len());
        let mut duplicates = HashSet::new();
        for (index, id) in ids.iter().enumerate() {
            if forward.insert(id.clone(), index.to_string()).is_some() {
                duplicates.insert(id.clone());
            }
        }
        if !duplicates.is_empty() {
            let mut ids: Vec<String> = duplicates.into_iter().collect();
            ids.sort();
            return Err(RrvError::DuplicateIdentifier {
                what: "compacted columns".to_string(),
                ids,
            });
        }
        Ok(Self { forward })
    }

    /// The compact identifier of an original identifier.
    pub fn encode(&self, original: &str) -> Option<&str> {
        self.forward.get(original).map(String::as_str)
    }

    /// The original identifier of a compact identifier.
    pub fn decode(&self, compact: &str) -> Option<&str> {
        let index: usize = compact.parse().ok()?;
        let (original, expected) = self.forward.get_index(index)?;
        (expected == compact).then_some(original.as_str())
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// `(original, compact)` pairs in positional order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.forward.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Compact identifiers in positional order.
    pub fn compact_ids(&self) -> Vec<String> {
        self.forward.values().cloned().collect()
    }
}

/// Replace the identifiers along `axis` with compact ones.
///
/// Values are untouched; the returned map records the renaming.
pub fn compact<T: Labeled>(table: &T, axis: Axis) -> Result<(T, CompactColumnMap)> {
    let map = CompactColumnMap::new(table.labels(axis))?;
    let compacted = table.relabel(axis, map.compact_ids())?;
    Ok((compacted, map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CountMatrix;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_ids() {
        let map = CompactColumnMap::new(&ids(&["k__Bacteria;p__Firmicutes", "B", "C"])).unwrap();
        assert_eq!(map.encode("k__Bacteria;p__Firmicutes"), Some("0"));
        assert_eq!(map.encode("C"), Some("2"));
        assert_eq!(map.decode("1"), Some("B"));
        assert_eq!(map.decode("3"), None);
        assert_eq!(map.decode("01"), None);
        assert_eq!(map.decode("x"), None);
        assert_eq!(map.compact_ids(), vec!["0", "1", "2"]);
    }

    #[test]
    fn test_serializes_in_order() {
        let map = CompactColumnMap::new(&ids(&["z", "a"])).unwrap();
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"z":"0","a":"1"}"#);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = CompactColumnMap::new(&ids(&["a", "b", "a"])).unwrap_err();
        assert!(matches!(err, RrvError::DuplicateIdentifier { .. }));
    }

    #[test]
    fn test_compact_matrix_features() {
        let counts = CountMatrix::from_triplets(
            ids(&["long|taxonomy|1", "long|taxonomy|2"]),
            ids(&["S1", "S2"]),
            vec![(0, 1, 7.0), (1, 0, 3.0)],
        )
        .unwrap();
        let (compacted, map) = compact(&counts, Axis::Rows).unwrap();

        assert_eq!(compacted.feature_ids(), &["0", "1"]);
        assert_eq!(compacted.sample_ids(), counts.sample_ids());
        assert_eq!(compacted.get(0, 1), 7.0);
        assert_eq!(map.decode("1"), Some("long|taxonomy|2"));
    }
}
