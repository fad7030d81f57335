//! Error types for the rankratioviz library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum RrvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid count value '{value}' at row {row}, column {col}")]
    InvalidCount {
        value: String,
        row: usize,
        col: usize,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Duplicate identifiers in {what}: {}", preview(.ids))]
    DuplicateIdentifier { what: String, ids: Vec<String> },

    #[error(
        "Consistency error: {} of {expected} {what} not present in the matched table: {}",
        .missing.len(),
        preview(.missing)
    )]
    Consistency {
        what: String,
        expected: usize,
        missing: Vec<String>,
    },

    #[error("Feature ID collision after adding feature metadata: {}", preview(.ids))]
    IdentityCollision { ids: Vec<String> },

    #[error("Rank column '{column}' is not numeric: feature '{feature}' has value '{value}'")]
    NonNumericRank {
        column: String,
        feature: String,
        value: String,
    },

    #[error("Metadata column '{0}' clashes with a column generated for the sample plot")]
    ReservedColumn(String),

    #[error("Missing asset: couldn't find {entry_point} in {location}")]
    MissingAsset {
        entry_point: String,
        location: String,
    },
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, RrvError>;

/// Identifiers shown in an error message before the remainder is summarised.
const PREVIEW_LIMIT: usize = 10;

fn preview(ids: &[String]) -> String {
    if ids.len() <= PREVIEW_LIMIT {
        return ids.join(", ");
    }
    format!(
        "{}, ... ({} more)",
        ids[..PREVIEW_LIMIT].join(", "),
        ids.len() - PREVIEW_LIMIT
    )
}
