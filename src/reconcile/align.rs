//! Set-intersection alignment of two labeled tables.

use crate::data::{Axis, Labeled};
use crate::error::{RrvError, Result};
use std::collections::HashSet;

/// Result of aligning a source table against an authoritative reference.
#[derive(Debug, Clone)]
pub struct Aligned<S, R> {
    /// The source restricted to the shared identifiers.
    pub source: S,
    /// The reference restricted to the shared identifiers.
    pub reference: R,
    /// Source identifiers that were discarded.
    pub dropped: Vec<String>,
}

/// Restrict two tables to the identifiers they share.
///
/// `reference` is authoritative: every one of its identifiers along
/// `reference_axis` must also exist in `source` along `source_axis`,
/// otherwise a `Consistency` error lists the absent ones. Extra identifiers
/// in `source` are discarded. Both outputs follow the reference's order.
///
/// `what` names the reference identifiers in error messages
/// (e.g. "ranked features").
pub fn align<S: Labeled, R: Labeled>(
    source: &S,
    source_axis: Axis,
    reference: &R,
    reference_axis: Axis,
    what: &str,
) -> Result<Aligned<S, R>> {
    let source_ids: HashSet<&str> = source
        .labels(source_axis)
        .iter()
        .map(String::as_str)
        .collect();

    let (shared, missing): (Vec<String>, Vec<String>) = reference
        .labels(reference_axis)
        .iter()
        .cloned()
        .partition(|id| source_ids.contains(id.as_str()));

    if !missing.is_empty() {
        return Err(RrvError::Consistency {
            what: what.to_string(),
            expected: reference.labels(reference_axis).len(),
            missing,
        });
    }

    let shared_set: HashSet<&str> = shared.iter().map(String::as_str).collect();
    let dropped = source
        .labels(source_axis)
        .iter()
        .filter(|id| !shared_set.contains(id.as_str()))
        .cloned()
        .collect();

    Ok(Aligned {
        source: source.select(source_axis, &shared)?,
        reference: reference.select(reference_axis, &shared)?,
        dropped,
    })
}
