//! Chart specifications for the rank and sample plots.

pub mod chart;
mod compact;
mod rank;
mod sample;

pub use chart::{ChartSpec, FieldType, Mark};
pub use compact::{compact, CompactColumnMap};
pub use rank::{
    build_rank_plot, Classification, CLASSIFICATION_FIELD, FEATURE_ID_FIELD, POSITION_FIELD,
    RANK_COLUMN_PREFIX, RANK_ORDERING_DATASET,
};
pub use sample::{
    build_sample_plot, BALANCE_FIELD, FEATURE_COL_IDS_DATASET, FEATURE_COUNTS_DATASET,
    SAMPLE_ID_FIELD,
};
