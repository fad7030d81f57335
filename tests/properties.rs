//! Property-based tests for alignment, feature ID resolution and compaction
//!
//! Uses proptest to check invariants over arbitrary identifier sets.
use proptest::prelude::*;
use rankratioviz::prelude::{
    align, compact, resolve_ids, Axis, CompactColumnMap, FeatureAnnotations, FeatureRanks,
    RrvError, Table, Variable,
};
use std::collections::{BTreeSet, HashSet};

fn id_set() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[A-F][0-9]{0,2}", 1..20)
}

fn table(ids: &[String]) -> Table<f64> {
    let rows = (0..ids.len()).map(|i| vec![i as f64]).collect();
    Table::new(ids.to_vec(), vec!["v".to_string()], rows).unwrap()
}

fn ranks(ids: &[String]) -> FeatureRanks {
    let rows = (0..ids.len()).map(|i| vec![Variable::Continuous(i as f64)]).collect();
    Table::new(ids.to_vec(), vec!["0".to_string()], rows).unwrap()
}

/// Property: aligned identifiers are the reference identifiers, which are a
/// subset of the source, and every source identifier is kept or dropped
#[test]
fn prop_alignment_is_intersection() {
    proptest!(|(reference in id_set(), extra in id_set())| {
        let reference: Vec<String> = reference.into_iter().collect();
        let source: Vec<String> = reference
            .iter()
            .cloned()
            .chain(extra.into_iter().filter(|id| !reference.contains(id)))
            .rev()
            .collect();

        let aligned = align(&table(&source), Axis::Rows, &table(&reference), Axis::Rows, "ids")
            .unwrap();

        prop_assert_eq!(aligned.source.row_ids(), reference.as_slice());
        prop_assert_eq!(aligned.reference.row_ids(), reference.as_slice());
        prop_assert_eq!(aligned.dropped.len() + reference.len(), source.len());
        for id in &aligned.dropped {
            prop_assert!(!reference.contains(id));
        }
        // Values travel with their identifiers.
        for (row, id) in aligned.source.row_ids().iter().enumerate() {
            let original = source.iter().position(|s| s == id).unwrap();
            prop_assert_eq!(*aligned.source.get(row, 0), original as f64);
        }
    });
}

/// Property: a reference identifier absent from the source is always fatal
#[test]
fn prop_alignment_requires_coverage() {
    proptest!(|(ids in id_set())| {
        let source: Vec<String> = ids.iter().cloned().collect();
        let mut reference = source.clone();
        reference.push("Z-missing".to_string());

        let err = align(&table(&source), Axis::Rows, &table(&reference), Axis::Rows, "ids")
            .unwrap_err();
        match err {
            RrvError::Consistency { missing, .. } => {
                prop_assert_eq!(missing, vec!["Z-missing".to_string()])
            }
            other => prop_assert!(false, "unexpected error: {}", other),
        }
    });
}

/// Property: resolved feature IDs are unique and start with the original ID
#[test]
fn prop_resolved_ids_unique() {
    proptest!(|(ids in id_set(), annotate in prop::collection::vec(any::<bool>(), 20))| {
        let features: Vec<String> = ids.into_iter().collect();
        let annotated: Vec<String> = features
            .iter()
            .zip(&annotate)
            .filter(|&(_, &a)| a)
            .map(|(id, _)| id.clone())
            .collect();
        let rows = annotated
            .iter()
            .map(|id| vec![Variable::Categorical(format!("k__{}", id))])
            .collect();
        let taxonomy = Table::new(annotated.clone(), vec!["Taxon".to_string()], rows).unwrap();

        let relabel = resolve_ids(&ranks(&features), &FeatureAnnotations::Table(taxonomy))
            .unwrap();

        prop_assert_eq!(relabel.len(), features.len());
        prop_assert_eq!(relabel.n_annotated(), annotated.len());
        let mut seen = HashSet::new();
        for (original, display) in relabel.iter() {
            prop_assert!(seen.insert(display.to_string()));
            prop_assert!(display.starts_with(original));
            prop_assert_eq!(annotated.iter().any(|a| a == original), display != original);
        }
    });
}

/// Property: compaction is a bijection onto "0".."n-1"
#[test]
fn prop_compaction_bijective() {
    proptest!(|(ids in id_set())| {
        let ids: Vec<String> = ids.into_iter().collect();
        let map = CompactColumnMap::new(&ids).unwrap();

        prop_assert_eq!(map.len(), ids.len());
        for (i, id) in ids.iter().enumerate() {
            let compact = map.encode(id).unwrap();
            prop_assert_eq!(compact, i.to_string());
            prop_assert_eq!(map.decode(compact), Some(id.as_str()));
        }
    });
}

/// Property: compaction depends only on identifier order
#[test]
fn prop_compaction_deterministic() {
    proptest!(|(ids in id_set())| {
        let ids: Vec<String> = ids.into_iter().collect();
        let first = serde_json::to_string(&CompactColumnMap::new(&ids).unwrap()).unwrap();
        let second = serde_json::to_string(&CompactColumnMap::new(&ids).unwrap()).unwrap();
        prop_assert_eq!(first, second);

        let (compacted, _) = compact(&table(&ids), Axis::Rows).unwrap();
        let expected: Vec<String> = (0..ids.len()).map(|i| i.to_string()).collect();
        prop_assert_eq!(compacted.row_ids(), expected.as_slice());
    });
}
