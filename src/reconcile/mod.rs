//! Reconciliation of feature ranks, sample metadata and the abundance table.
//!
//! The abundance table may contain features and samples that are not ranked
//! or described in the metadata; those are discarded. The opposite (a ranked
//! feature or a metadata sample absent from the table) is a consistency
//! error.

mod align;
mod identity;

pub use align::{align, Aligned};
pub use identity::{resolve_ids, FeatureAnnotations, FeatureRelabeling, ID_SEPARATOR};

use crate::data::{Axis, CountMatrix, FeatureRanks, Metadata};
use crate::error::Result;

/// Ranks, abundances and sample metadata restricted to one another.
///
/// Every ranked feature is a feature of `counts` and every metadata sample is
/// a sample of `counts`, in the same order.
#[derive(Debug, Clone)]
pub struct AlignedDataset {
    /// Feature ranks, relabeled with feature metadata when provided.
    pub ranks: FeatureRanks,
    /// Abundances (features × samples) with feature IDs matching `ranks`.
    pub counts: CountMatrix,
    /// Sample metadata in the sample order of `counts`.
    pub metadata: Metadata,
    /// Table features without a rank.
    pub dropped_features: Vec<String>,
    /// Table samples without metadata.
    pub dropped_samples: Vec<String>,
    /// Features whose ID was extended with feature metadata.
    pub n_annotated: usize,
}

/// Match ranks and sample metadata to the abundance table.
///
/// Steps, any of which aborts the whole reconciliation:
/// 1. Feature rank and sample metadata IDs must be unique.
/// 2. Table features are aligned to the ranked features.
/// 3. Table samples are aligned to the metadata samples.
/// 4. With feature metadata, ranks and table features are relabeled.
/// 5. The (relabeled) rank IDs are checked for uniqueness again.
pub fn process_input(
    feature_ranks: &FeatureRanks,
    sample_metadata: &Metadata,
    counts: &CountMatrix,
    annotations: &FeatureAnnotations,
) -> Result<AlignedDataset> {
    feature_ranks.ensure_unique_rows("feature ranks")?;
    sample_metadata.ensure_unique_rows("sample metadata")?;

    let by_feature = align(counts, Axis::Rows, feature_ranks, Axis::Rows, "ranked features")?;
    let by_sample = align(
        &by_feature.source,
        Axis::Columns,
        sample_metadata,
        Axis::Rows,
        "samples in the sample metadata",
    )?;

    if !by_feature.dropped.is_empty() {
        log::warn!(
            "Discarding {} table features without ranks",
            by_feature.dropped.len()
        );
    }
    if !by_sample.dropped.is_empty() {
        log::warn!(
            "Discarding {} table samples without metadata",
            by_sample.dropped.len()
        );
    }

    let relabeling = resolve_ids(&by_feature.reference, annotations)?;
    let (ranks, counts) = if relabeling.is_identity() {
        (by_feature.reference, by_sample.source)
    } else {
        (
            relabeling.apply(&by_feature.reference, Axis::Rows)?,
            relabeling.apply(&by_sample.source, Axis::Rows)?,
        )
    };
    ranks.ensure_unique_rows("labelled feature ranks")?;

    log::info!(
        "Matched {} features and {} samples to the abundance table",
        counts.n_features(),
        counts.n_samples()
    );

    Ok(AlignedDataset {
        ranks,
        counts,
        metadata: by_sample.reference,
        dropped_features: by_feature.dropped,
        dropped_samples: by_sample.dropped,
        n_annotated: relabeling.n_annotated(),
    })
}
