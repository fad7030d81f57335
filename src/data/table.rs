//! Ordered, string-keyed tables shared by ranks and metadata.

use crate::error::{RrvError, Result};
use std::collections::{HashMap, HashSet};

/// One of the two identifier axes of a labeled table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Rows,
    Columns,
}

/// A two-dimensional container whose axes are labeled by string identifiers.
///
/// Implemented by [`Table`] and [`CountMatrix`](super::CountMatrix) so that
/// alignment and column compaction work the same way on both.
pub trait Labeled: Sized {
    /// Identifiers along `axis`, in storage order.
    fn labels(&self, axis: Axis) -> &[String];

    /// Restrict `axis` to `labels`, in the order given.
    ///
    /// Every label must exist along `axis`.
    fn select(&self, axis: Axis, labels: &[String]) -> Result<Self>;

    /// Replace the identifiers along `axis` positionally.
    fn relabel(&self, axis: Axis, labels: Vec<String>) -> Result<Self>;
}

/// Dense row-major table with ordered row and column identifiers.
///
/// Duplicate identifiers are allowed on construction so that callers can
/// report them; lookups by identifier resolve to the first occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct Table<V> {
    row_ids: Vec<String>,
    col_ids: Vec<String>,
    /// Row-major values, `row_ids.len() * col_ids.len()` long.
    values: Vec<V>,
    row_index: HashMap<String, usize>,
    col_index: HashMap<String, usize>,
}

fn first_positions(ids: &[String]) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        index.entry(id.clone()).or_insert(i);
    }
    index
}

fn duplicates(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    let mut reported = HashSet::new();
    let mut dups = Vec::new();
    for id in ids {
        if !seen.insert(id.as_str()) && reported.insert(id.as_str()) {
            dups.push(id.clone());
        }
    }
    dups
}

impl<V: Clone> Table<V> {
    /// Create a table from row-major rows.
    pub fn new(row_ids: Vec<String>, col_ids: Vec<String>, rows: Vec<Vec<V>>) -> Result<Self> {
        if rows.len() != row_ids.len() {
            return Err(RrvError::DimensionMismatch {
                expected: row_ids.len(),
                actual: rows.len(),
            });
        }
        let mut values = Vec::with_capacity(row_ids.len() * col_ids.len());
        for row in rows {
            if row.len() != col_ids.len() {
                return Err(RrvError::DimensionMismatch {
                    expected: col_ids.len(),
                    actual: row.len(),
                });
            }
            values.extend(row);
        }
        Ok(Self::from_parts(row_ids, col_ids, values))
    }

    fn from_parts(row_ids: Vec<String>, col_ids: Vec<String>, values: Vec<V>) -> Self {
        let row_index = first_positions(&row_ids);
        let col_index = first_positions(&col_ids);
        Self {
            row_ids,
            col_ids,
            values,
            row_index,
            col_index,
        }
    }

    /// Row identifiers in order.
    #[inline]
    pub fn row_ids(&self) -> &[String] {
        &self.row_ids
    }

    /// Column identifiers in order.
    #[inline]
    pub fn col_ids(&self) -> &[String] {
        &self.col_ids
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.row_ids.len()
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.col_ids.len()
    }

    /// Value at a row/column position.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> &V {
        &self.values[row * self.col_ids.len() + col]
    }

    /// Value by row and column identifier.
    pub fn get_by_id(&self, row_id: &str, col_id: &str) -> Option<&V> {
        let row = *self.row_index.get(row_id)?;
        let col = *self.col_index.get(col_id)?;
        Some(self.get(row, col))
    }

    /// One row as a slice.
    pub fn row(&self, row: usize) -> &[V] {
        let width = self.col_ids.len();
        &self.values[row * width..(row + 1) * width]
    }

    /// One row by identifier.
    pub fn row_by_id(&self, row_id: &str) -> Option<&[V]> {
        self.row_index.get(row_id).map(|&row| self.row(row))
    }

    /// All values of a column, in row order.
    pub fn column(&self, col: usize) -> Vec<&V> {
        (0..self.n_rows()).map(|row| self.get(row, col)).collect()
    }

    /// Position of a column identifier.
    pub fn col_position(&self, col_id: &str) -> Option<usize> {
        self.col_index.get(col_id).copied()
    }

    /// Row identifiers occurring more than once, each reported once.
    pub fn duplicate_row_ids(&self) -> Vec<String> {
        duplicates(&self.row_ids)
    }

    /// Fail with `DuplicateIdentifier` unless every row identifier is unique.
    pub fn ensure_unique_rows(&self, what: &str) -> Result<()> {
        let ids = self.duplicate_row_ids();
        if ids.is_empty() {
            Ok(())
        } else {
            Err(RrvError::DuplicateIdentifier {
                what: what.to_string(),
                ids,
            })
        }
    }

    /// Apply `f` to every column identifier.
    pub fn map_col_ids<F: FnMut(&str) -> String>(&self, f: F) -> Self {
        let col_ids = self.col_ids.iter().map(|c| c.as_str()).map(f).collect();
        Self::from_parts(self.row_ids.clone(), col_ids, self.values.clone())
    }

    fn select_rows(&self, positions: &[usize]) -> Self {
        let width = self.n_cols();
        let mut values = Vec::with_capacity(positions.len() * width);
        let mut row_ids = Vec::with_capacity(positions.len());
        for &row in positions {
            row_ids.push(self.row_ids[row].clone());
            values.extend_from_slice(self.row(row));
        }
        Self::from_parts(row_ids, self.col_ids.clone(), values)
    }

    fn select_cols(&self, positions: &[usize]) -> Self {
        let mut values = Vec::with_capacity(self.n_rows() * positions.len());
        for row in 0..self.n_rows() {
            for &col in positions {
                values.push(self.get(row, col).clone());
            }
        }
        let col_ids = positions.iter().map(|&c| self.col_ids[c].clone()).collect();
        Self::from_parts(self.row_ids.clone(), col_ids, values)
    }
}

fn positions_of(index: &HashMap<String, usize>, labels: &[String], what: &str) -> Result<Vec<usize>> {
    let mut missing = Vec::new();
    let positions: Vec<usize> = labels
        .iter()
        .filter_map(|label| match index.get(label) {
            Some(&pos) => Some(pos),
            None => {
                missing.push(label.clone());
                None
            }
        })
        .collect();
    if missing.is_empty() {
        Ok(positions)
    } else {
        Err(RrvError::Consistency {
            what: what.to_string(),
            expected: labels.len(),
            missing,
        })
    }
}

impl<V: Clone> Labeled for Table<V> {
    fn labels(&self, axis: Axis) -> &[String] {
        match axis {
            Axis::Rows => &self.row_ids,
            Axis::Columns => &self.col_ids,
        }
    }

    fn select(&self, axis: Axis, labels: &[String]) -> Result<Self> {
        match axis {
            Axis::Rows => {
                let positions = positions_of(&self.row_index, labels, "row identifiers")?;
                Ok(self.select_rows(&positions))
            }
            Axis::Columns => {
                let positions = positions_of(&self.col_index, labels, "column identifiers")?;
                Ok(self.select_cols(&positions))
            }
        }
    }

    fn relabel(&self, axis: Axis, labels: Vec<String>) -> Result<Self> {
        let current = self.labels(axis).len();
        if labels.len() != current {
            return Err(RrvError::DimensionMismatch {
                expected: current,
                actual: labels.len(),
            });
        }
        Ok(match axis {
            Axis::Rows => Self::from_parts(labels, self.col_ids.clone(), self.values.clone()),
            Axis::Columns => Self::from_parts(self.row_ids.clone(), labels, self.values.clone()),
        })
    }
}
