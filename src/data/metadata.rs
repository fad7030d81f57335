//! Metadata tables: sample metadata, feature metadata and differential ranks.

use super::table::Table;
use crate::error::{RrvError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A cell value: categorical text, a number, or missing.
///
/// Serializes untagged: strings, numbers, and `null` for missing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Variable {
    /// Categorical variable with string levels.
    Categorical(String),
    /// Continuous numeric variable.
    Continuous(f64),
    /// Missing value.
    Missing,
}

impl Variable {
    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Variable::Missing)
    }

    /// Try to get as categorical string.
    pub fn as_categorical(&self) -> Option<&str> {
        match self {
            Variable::Categorical(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as continuous f64.
    pub fn as_continuous(&self) -> Option<f64> {
        match self {
            Variable::Continuous(v) => Some(*v),
            _ => None,
        }
    }

    /// Interpret the value as a number.
    ///
    /// Categorical values are accepted when their text parses as a number.
    pub fn to_numeric(&self) -> Option<f64> {
        match self {
            Variable::Continuous(v) => Some(*v),
            Variable::Categorical(s) => s.trim().parse::<f64>().ok(),
            Variable::Missing => None,
        }
    }

    fn parse_as(raw: &str, var_type: VariableType) -> Self {
        let raw = raw.trim();
        if is_missing_token(raw) {
            return Variable::Missing;
        }
        match var_type {
            VariableType::Continuous => raw
                .parse::<f64>()
                .map(Variable::Continuous)
                .unwrap_or(Variable::Missing),
            VariableType::Categorical => Variable::Categorical(raw.to_string()),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variable::Categorical(s) => write!(f, "{}", s),
            Variable::Continuous(v) => write!(f, "{}", v),
            Variable::Missing => write!(f, "nan"),
        }
    }
}

/// Type of a metadata column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    Categorical,
    Continuous,
}

/// Sample or feature metadata: rows are identifiers, columns are fields.
pub type Metadata = Table<Variable>;

/// Feature ranks: rows are feature identifiers, columns are rank dimensions.
pub type FeatureRanks = Table<Variable>;

fn is_missing_token(raw: &str) -> bool {
    matches!(raw, "" | "NA" | "na" | "nan" | "NaN")
}

/// Directive row in QIIME 2 metadata files that declares column types.
const TYPES_DIRECTIVE: &str = "#q2:types";

impl Table<Variable> {
    /// Load a metadata table from a TSV file.
    ///
    /// Expected format:
    /// - First row: header with column names (first column is the identifier)
    /// - Subsequent rows: identifier followed by values
    ///
    /// Rows whose identifier starts with `#` are comments, except a
    /// `#q2:types` row, which fixes column types (`categorical`/`numeric`).
    /// Remaining columns are inferred as continuous if all values parse as
    /// numbers, otherwise categorical.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load a metadata table from any tab-separated source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = rdr.records();
        let header = records
            .next()
            .ok_or_else(|| RrvError::EmptyData("Empty metadata file".to_string()))??;
        if header.len() < 2 {
            return Err(RrvError::EmptyData(
                "Metadata must have at least one column besides the identifier".to_string(),
            ));
        }
        let column_names: Vec<String> = header.iter().skip(1).map(|s| s.trim().to_string()).collect();

        let mut declared: HashMap<usize, VariableType> = HashMap::new();
        let mut raw_rows: Vec<(String, Vec<String>)> = Vec::new();
        for record in records {
            let record = record?;
            let id = match record.get(0) {
                Some(id) => id.trim(),
                None => continue,
            };
            if id.is_empty() && record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            if id == TYPES_DIRECTIVE {
                for (col_idx, raw) in record.iter().skip(1).enumerate() {
                    match raw.trim() {
                        "categorical" => {
                            declared.insert(col_idx, VariableType::Categorical);
                        }
                        "numeric" => {
                            declared.insert(col_idx, VariableType::Continuous);
                        }
                        "" => {}
                        other => {
                            return Err(RrvError::Parse(format!(
                                "Unknown column type '{}' in {} directive",
                                other, TYPES_DIRECTIVE
                            )))
                        }
                    }
                }
                continue;
            }
            if id.starts_with('#') {
                continue;
            }
            let values = record.iter().skip(1).map(|s| s.to_string()).collect();
            raw_rows.push((id.to_string(), values));
        }

        if raw_rows.is_empty() {
            return Err(RrvError::EmptyData("No rows in metadata".to_string()));
        }

        let column_types: Vec<VariableType> = (0..column_names.len())
            .map(|col_idx| {
                declared.get(&col_idx).copied().unwrap_or_else(|| {
                    let all_numeric = raw_rows.iter().all(|(_, values)| {
                        values
                            .get(col_idx)
                            .map(|v| {
                                let v = v.trim();
                                is_missing_token(v) || v.parse::<f64>().is_ok()
                            })
                            .unwrap_or(true)
                    });
                    if all_numeric {
                        VariableType::Continuous
                    } else {
                        VariableType::Categorical
                    }
                })
            })
            .collect();

        let mut row_ids = Vec::with_capacity(raw_rows.len());
        let mut rows = Vec::with_capacity(raw_rows.len());
        for (id, values) in raw_rows {
            let row: Vec<Variable> = column_types
                .iter()
                .enumerate()
                .map(|(col_idx, &var_type)| match values.get(col_idx) {
                    Some(raw) => Variable::parse_as(raw, var_type),
                    None => Variable::Missing,
                })
                .collect();
            row_ids.push(id);
            rows.push(row);
        }

        Table::new(row_ids, column_names, rows)
    }

    /// Type of a column, derived from its non-missing values.
    ///
    /// A column with only missing values reports `Continuous`.
    pub fn column_type(&self, column: &str) -> Option<VariableType> {
        let col = self.col_position(column)?;
        let categorical = self
            .column(col)
            .into_iter()
            .any(|value| matches!(value, Variable::Categorical(_)));
        Some(if categorical {
            VariableType::Categorical
        } else {
            VariableType::Continuous
        })
    }
}
