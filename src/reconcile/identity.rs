//! Feature identifiers enriched with feature metadata (e.g. taxonomy).

use crate::data::{Axis, FeatureRanks, Labeled, Metadata};
use crate::error::{RrvError, Result};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Separator between a feature ID and its metadata values.
pub const ID_SEPARATOR: &str = "|";

/// Optional per-feature metadata used to build display identifiers.
#[derive(Debug, Clone, Default)]
pub enum FeatureAnnotations {
    /// No feature metadata: identifiers are kept as they are.
    #[default]
    Absent,
    /// Feature metadata keyed by feature ID; every column contributes to the
    /// composite identifier, in column order.
    Table(Metadata),
}

impl From<Option<Metadata>> for FeatureAnnotations {
    fn from(metadata: Option<Metadata>) -> Self {
        match metadata {
            Some(table) => FeatureAnnotations::Table(table),
            None => FeatureAnnotations::Absent,
        }
    }
}

/// Mapping from original feature IDs to display IDs, in rank order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRelabeling {
    ids: IndexMap<String, String>,
    n_annotated: usize,
}

impl FeatureRelabeling {
    /// The display ID for an original feature ID.
    pub fn get(&self, original: &str) -> Option<&str> {
        self.ids.get(original).map(String::as_str)
    }

    /// Number of features whose ID was extended with metadata.
    pub fn n_annotated(&self) -> usize {
        self.n_annotated
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// `(original, display)` pairs in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.ids.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether every feature keeps its original ID.
    pub fn is_identity(&self) -> bool {
        self.ids.iter().all(|(k, v)| k == v)
    }

    /// Rename the identifiers along `axis` of `table`.
    ///
    /// Identifiers without a mapping are left unchanged.
    pub fn apply<T: Labeled>(&self, table: &T, axis: Axis) -> Result<T> {
        let labels = table
            .labels(axis)
            .iter()
            .map(|id| self.get(id).unwrap_or(id.as_str()).to_string())
            .collect();
        table.relabel(axis, labels)
    }
}

fn composite_id(feature_id: &str, values: &[crate::data::Variable]) -> String {
    let mut id = String::from(feature_id);
    for value in values {
        id.push_str(ID_SEPARATOR);
        id.push_str(&value.to_string());
    }
    id
}

/// Build display IDs for every ranked feature.
///
/// A feature present in the metadata gets
/// `<id>|<value 1>|<value 2>|...`; others keep their ID. The resulting IDs
/// must be unique, otherwise an `IdentityCollision` error is returned.
pub fn resolve_ids(
    ranks: &FeatureRanks,
    annotations: &FeatureAnnotations,
) -> Result<FeatureRelabeling> {
    let mut ids = IndexMap::with_capacity(ranks.n_rows());
    let mut n_annotated = 0;

    match annotations {
        FeatureAnnotations::Absent => {
            for id in ranks.row_ids() {
                ids.insert(id.clone(), id.clone());
            }
        }
        FeatureAnnotations::Table(metadata) => {
            metadata.ensure_unique_rows("feature metadata")?;
            for id in ranks.row_ids() {
                let display = match metadata.row_by_id(id) {
                    Some(values) => {
                        n_annotated += 1;
                        composite_id(id, values)
                    }
                    None => id.clone(),
                };
                ids.insert(id.clone(), display);
            }
        }
    }

    let mut seen = HashSet::with_capacity(ids.len());
    let mut collisions: Vec<String> = Vec::new();
    for display in ids.values() {
        if !seen.insert(display.as_str()) && !collisions.contains(display) {
            collisions.push(display.clone());
        }
    }
    if !collisions.is_empty() {
        return Err(RrvError::IdentityCollision { ids: collisions });
    }

    log::debug!(
        "Resolved {} feature IDs ({} with feature metadata)",
        ids.len(),
        n_annotated
    );
    Ok(FeatureRelabeling { ids, n_annotated })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Table, Variable};

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn ranks(features: &[&str]) -> FeatureRanks {
        let rows = (0..features.len())
            .map(|i| vec![Variable::Continuous(i as f64)])
            .collect();
        Table::new(ids(features), ids(&["0"]), rows).unwrap()
    }

    fn taxonomy(rows: &[(&str, Vec<&str>)]) -> Metadata {
        let row_ids = rows.iter().map(|(id, _)| id.to_string()).collect();
        let values = rows
            .iter()
            .map(|(_, vals)| {
                vals.iter()
                    .map(|v| Variable::Categorical(v.to_string()))
                    .collect()
            })
            .collect();
        Table::new(row_ids, ids(&["Kingdom", "Phylum"]), values).unwrap()
    }

    #[test]
    fn test_absent_metadata_is_identity() {
        let relabel = resolve_ids(&ranks(&["A", "B"]), &FeatureAnnotations::Absent).unwrap();
        assert!(relabel.is_identity());
        assert_eq!(relabel.n_annotated(), 0);
        assert_eq!(relabel.get("B"), Some("B"));
    }

    #[test]
    fn test_composite_ids_for_annotated_subset() {
        let meta = taxonomy(&[("A", vec!["k1", "k2"]), ("Z", vec!["x", "y"])]);
        let relabel =
            resolve_ids(&ranks(&["A", "B"]), &FeatureAnnotations::Table(meta)).unwrap();

        assert_eq!(relabel.get("A"), Some("A|k1|k2"));
        assert_eq!(relabel.get("B"), Some("B"));
        assert_eq!(relabel.get("Z"), None);
        assert_eq!(relabel.n_annotated(), 1);
        assert_eq!(
            relabel.iter().collect::<Vec<_>>(),
            vec![("A", "A|k1|k2"), ("B", "B")]
        );
    }

    #[test]
    fn test_missing_and_numeric_values_stringified() {
        let meta = Table::new(
            ids(&["A"]),
            ids(&["Level", "Confidence"]),
            vec![vec![Variable::Missing, Variable::Continuous(0.75)]],
        )
        .unwrap();
        let relabel = resolve_ids(&ranks(&["A"]), &FeatureAnnotations::Table(meta)).unwrap();
        assert_eq!(relabel.get("A"), Some("A|nan|0.75"));
    }

    #[test]
    fn test_collision_is_fatal() {
        // "A" + "|x" collides with a feature literally named "A|x".
        let meta = Table::new(
            ids(&["A"]),
            ids(&["Kingdom"]),
            vec![vec![Variable::Categorical("x".to_string())]],
        )
        .unwrap();
        let err = resolve_ids(&ranks(&["A", "A|x"]), &FeatureAnnotations::Table(meta)).unwrap_err();
        match err {
            RrvError::IdentityCollision { ids } => assert_eq!(ids, vec!["A|x"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_feature_metadata_rejected() {
        let meta = taxonomy(&[("A", vec!["k1", "k2"]), ("A", vec!["k3", "k4"])]);
        let err = resolve_ids(&ranks(&["A"]), &FeatureAnnotations::Table(meta)).unwrap_err();
        assert!(matches!(err, RrvError::DuplicateIdentifier { .. }));
    }

    #[test]
    fn test_apply_renames_axis() {
        let meta = taxonomy(&[("B", vec!["k1", "k2"])]);
        let features = ranks(&["A", "B"]);
        let relabel = resolve_ids(&features, &FeatureAnnotations::Table(meta)).unwrap();
        let renamed = relabel.apply(&features, Axis::Rows).unwrap();
        assert_eq!(renamed.row_ids(), &["A", "B|k1|k2"]);
    }

    #[test]
    fn test_from_option() {
        assert!(matches!(FeatureAnnotations::from(None), FeatureAnnotations::Absent));
    }
}
