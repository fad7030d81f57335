//! Sample plot: one point per sample, log ratio against a metadata field.
//!
//! The log ratio itself depends on the features selected in the browser, so
//! it is shipped as a column of nulls together with the (compacted) feature
//! counts needed to compute it.

use super::chart::{ChartSpec, Encoding, FieldDef, FieldType, Mark};
use super::compact::compact;
use crate::data::{Axis, CountMatrix, Metadata, VariableType};
use crate::error::{RrvError, Result};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Placeholder log-ratio field, filled in by the front end.
pub const BALANCE_FIELD: &str = "rankratioviz_balance";
pub const SAMPLE_ID_FIELD: &str = "Sample ID";
/// Auxiliary dataset mapping feature IDs to compact IDs.
pub const FEATURE_COL_IDS_DATASET: &str = "rankratioviz_feature_col_ids";
/// Auxiliary dataset of counts keyed by compact feature ID, then sample ID.
pub const FEATURE_COUNTS_DATASET: &str = "rankratioviz_feature_counts";

const TITLE: &str = "Log Ratio of Abundances in Samples";
const Y_AXIS_TITLE: &str = "log(Numerator / Denominator)";

fn field_type(var_type: Option<VariableType>) -> FieldType {
    match var_type {
        Some(VariableType::Categorical) => FieldType::Nominal,
        _ => FieldType::Quantitative,
    }
}

/// `{compact feature ID: {sample ID: count}}` for every feature and sample.
fn feature_counts(counts: &CountMatrix) -> IndexMap<String, IndexMap<String, f64>> {
    counts
        .feature_ids()
        .iter()
        .enumerate()
        .map(|(row, feature)| {
            let per_sample = counts
                .sample_ids()
                .iter()
                .enumerate()
                .map(|(col, sample)| (sample.clone(), counts.get(row, col)))
                .collect();
            (feature.clone(), per_sample)
        })
        .collect()
}

/// Build the sample plot for aligned counts and sample metadata.
///
/// Samples are taken in the order of `counts`; samples without metadata are
/// left out of the plot. The first metadata column is used for both the x
/// axis and the colour.
pub fn build_sample_plot(counts: &CountMatrix, metadata: &Metadata) -> Result<ChartSpec> {
    let default_column = metadata
        .col_ids()
        .first()
        .cloned()
        .ok_or_else(|| RrvError::EmptyData("Sample metadata has no columns".to_string()))?;
    for reserved in [SAMPLE_ID_FIELD, BALANCE_FIELD] {
        if metadata.col_position(reserved).is_some() {
            return Err(RrvError::ReservedColumn(reserved.to_string()));
        }
    }

    let mut records = Vec::with_capacity(counts.n_samples());
    for sample in counts.sample_ids() {
        let Some(values) = metadata.row_by_id(sample) else {
            continue;
        };
        let mut record = Map::new();
        record.insert(SAMPLE_ID_FIELD.to_string(), Value::from(sample.as_str()));
        record.insert(BALANCE_FIELD.to_string(), Value::Null);
        for (name, value) in metadata.col_ids().iter().zip(values) {
            record.insert(name.clone(), serde_json::to_value(value)?);
        }
        records.push(Value::Object(record));
    }
    if records.len() < counts.n_samples() {
        log::debug!(
            "{} table samples have no metadata and are not plotted",
            counts.n_samples() - records.len()
        );
    }

    let (compacted, col_ids) = compact(counts, Axis::Rows)?;
    let counts_by_feature = feature_counts(&compacted);
    log::debug!(
        "Sample plot: {} samples, {} compacted features, coloured by '{}'",
        records.len(),
        col_ids.len(),
        default_column
    );

    let encoding = Encoding {
        x: Some(FieldDef::new(
            &default_column,
            field_type(metadata.column_type(&default_column)),
        )),
        y: Some(FieldDef::new(BALANCE_FIELD, FieldType::Quantitative).title(Y_AXIS_TITLE)),
        color: Some(FieldDef::new(&default_column, FieldType::Nominal)),
        size: None,
        tooltip: vec![FieldDef::new(SAMPLE_ID_FIELD, FieldType::Nominal)],
    };

    Ok(ChartSpec::new(TITLE, Mark::Circle, records)?
        .encoding(encoding)
        .dataset(FEATURE_COL_IDS_DATASET, serde_json::to_value(&col_ids)?)
        .dataset(FEATURE_COUNTS_DATASET, serde_json::to_value(&counts_by_feature)?))
}
