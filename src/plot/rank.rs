//! Rank plot: features ordered by their rank, coloured by classification.

use super::chart::{ChartSpec, Encoding, FieldDef, FieldType, Mark, Scale, Selection, ValueDef};
use crate::data::{FeatureRanks, Variable};
use crate::error::{RrvError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prefix added to rank dimension names for display.
pub const RANK_COLUMN_PREFIX: &str = "Rank ";
/// Auxiliary dataset listing every rank column, in order.
pub const RANK_ORDERING_DATASET: &str = "rankratioviz_rank_ordering";
pub const FEATURE_ID_FIELD: &str = "Feature ID";
pub const CLASSIFICATION_FIELD: &str = "Classification";
/// Sorted position of a feature along the x axis.
pub const POSITION_FIELD: &str = "x";

const TITLE: &str = "Feature Ranks";
const X_AXIS_TITLE: &str = "Features";
const ZOOM_SELECTION: &str = "rank_zoom";
/// Keeps zero-height "None" bars distinguishable from grid lines.
const GRID_OPACITY: f64 = 0.35;
/// Bar width; wider bars appear offset under interval selections.
const BAR_SIZE: f64 = 1.0;

/// Role of a feature in the current log-ratio selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Classification {
    #[default]
    None,
    Numerator,
    Denominator,
    Both,
}

impl Classification {
    pub const ALL: [Classification; 4] = [
        Classification::None,
        Classification::Numerator,
        Classification::Denominator,
        Classification::Both,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Numerator => "Numerator",
            Self::Denominator => "Denominator",
            Self::Both => "Both",
        }
    }

    /// Bar colour in the rank plot.
    pub fn color(&self) -> &'static str {
        match self {
            Self::None => "#e0e0e0",
            Self::Numerator => "#f00",
            Self::Denominator => "#00f",
            Self::Both => "#949",
        }
    }

    fn scale() -> Scale {
        Scale {
            domain: Self::ALL.iter().map(|c| c.name().to_string()).collect(),
            range: Self::ALL.iter().map(|c| c.color().to_string()).collect(),
        }
    }
}

/// Coerce the default rank column to finite numbers, one per feature.
fn numeric_ranks(ranks: &FeatureRanks, column: &str) -> Result<Vec<f64>> {
    ranks
        .row_ids()
        .iter()
        .enumerate()
        .map(|(row, feature)| {
            let value = ranks.get(row, 0);
            match value.to_numeric() {
                Some(v) if v.is_finite() => Ok(v),
                _ => Err(RrvError::NonNumericRank {
                    column: column.to_string(),
                    feature: feature.clone(),
                    value: match value {
                        Variable::Missing => "<missing>".to_string(),
                        other => other.to_string(),
                    },
                }),
            }
        })
        .collect()
}

/// Build the rank plot for a set of feature ranks.
///
/// Rank columns are renamed `Rank <name>` and the first one is drawn.
/// Features are sorted ascending by that rank and `x` is their sorted
/// position. Every feature starts out classified as `None`.
pub fn build_rank_plot(ranks: &FeatureRanks) -> Result<ChartSpec> {
    if ranks.n_cols() == 0 {
        return Err(RrvError::EmptyData("Feature ranks have no rank columns".to_string()));
    }

    let ranks = ranks.map_col_ids(|c| format!("{}{}", RANK_COLUMN_PREFIX, c));
    let rank_columns = ranks.col_ids().to_vec();
    let default_column = rank_columns[0].clone();

    let values = numeric_ranks(&ranks, &default_column)?;
    let mut order: Vec<usize> = (0..ranks.n_rows()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut records = Vec::with_capacity(order.len());
    for (position, &row) in order.iter().enumerate() {
        let mut record = Map::new();
        record.insert(
            FEATURE_ID_FIELD.to_string(),
            Value::from(ranks.row_ids()[row].as_str()),
        );
        record.insert(POSITION_FIELD.to_string(), Value::from(position));
        record.insert(
            CLASSIFICATION_FIELD.to_string(),
            Value::from(Classification::default().name()),
        );
        record.insert(default_column.clone(), Value::from(values[row]));
        for (col, name) in rank_columns.iter().enumerate().skip(1) {
            record.insert(name.clone(), serde_json::to_value(ranks.get(row, col))?);
        }
        records.push(Value::Object(record));
    }

    log::debug!(
        "Rank plot: {} features, {} rank columns, drawing '{}'",
        records.len(),
        rank_columns.len(),
        default_column
    );

    let encoding = Encoding {
        x: Some(FieldDef::new(POSITION_FIELD, FieldType::Quantitative).title(X_AXIS_TITLE)),
        y: Some(FieldDef::new(&default_column, FieldType::Quantitative)),
        color: Some(
            FieldDef::new(CLASSIFICATION_FIELD, FieldType::Nominal).scale(Classification::scale()),
        ),
        size: Some(ValueDef { value: BAR_SIZE }),
        tooltip: vec![
            FieldDef::new(POSITION_FIELD, FieldType::Quantitative),
            FieldDef::new(CLASSIFICATION_FIELD, FieldType::Nominal),
            FieldDef::new(FEATURE_ID_FIELD, FieldType::Nominal),
        ],
    };

    Ok(ChartSpec::new(TITLE, Mark::Bar, records)?
        .encoding(encoding)
        .grid_opacity(GRID_OPACITY)
        .selection(ZOOM_SELECTION, Selection::scale_bound_interval())
        .dataset(RANK_ORDERING_DATASET, serde_json::to_value(&rank_columns)?))
}
