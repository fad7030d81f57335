//! Feature abundance matrix with sparse storage.

use super::table::{Axis, Labeled};
use crate::error::{RrvError, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use sprs::{CsMat, TriMat};

/// A sparse matrix of feature abundances across samples.
///
/// Rows represent features (taxa/metabolites), columns represent samples, as
/// in BIOM tables. Uses CSR (Compressed Sparse Row) storage.
#[derive(Debug, Clone)]
pub struct CountMatrix {
    data: CsMat<f64>,
    feature_ids: Vec<String>,
    sample_ids: Vec<String>,
}

fn ensure_unique(ids: &[String], what: &str) -> Result<()> {
    let mut seen = HashSet::with_capacity(ids.len());
    let mut reported = HashSet::new();
    let dups: Vec<String> = ids
        .iter()
        .filter(|id| !seen.insert(id.as_str()) && reported.insert(id.as_str()))
        .cloned()
        .collect();
    if dups.is_empty() {
        Ok(())
    } else {
        Err(RrvError::DuplicateIdentifier {
            what: what.to_string(),
            ids: dups,
        })
    }
}

impl CountMatrix {
    /// Wrap a sparse matrix; identifiers must match its shape and be unique.
    pub fn new(data: CsMat<f64>, feature_ids: Vec<String>, sample_ids: Vec<String>) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != feature_ids.len() {
            return Err(RrvError::DimensionMismatch {
                expected: nrows,
                actual: feature_ids.len(),
            });
        }
        if ncols != sample_ids.len() {
            return Err(RrvError::DimensionMismatch {
                expected: ncols,
                actual: sample_ids.len(),
            });
        }
        ensure_unique(&feature_ids, "abundance table features")?;
        ensure_unique(&sample_ids, "abundance table samples")?;
        let data = if data.is_csr() { data } else { data.to_csr() };
        Ok(Self {
            data,
            feature_ids,
            sample_ids,
        })
    }

    /// Build a matrix from `(feature, sample, value)` triplets; zeros are not stored.
    pub fn from_triplets(
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
        triplets: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Result<Self> {
        let shape = (feature_ids.len(), sample_ids.len());
        let mut tri_mat = TriMat::new(shape);
        for (row, col, val) in triplets {
            if row >= shape.0 || col >= shape.1 {
                return Err(RrvError::Parse(format!(
                    "Entry ({}, {}) outside a {} x {} table",
                    row, col, shape.0, shape.1
                )));
            }
            if val != 0.0 {
                tri_mat.add_triplet(row, col, val);
            }
        }
        Self::new(tri_mat.to_csr(), feature_ids, sample_ids)
    }

    /// Load a matrix, choosing BIOM JSON or TSV from the file contents.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        let starts_with_brace = loop {
            let buf = reader.fill_buf()?;
            match buf.iter().position(|b| !b.is_ascii_whitespace()) {
                Some(pos) => break buf[pos] == b'{',
                None if buf.is_empty() => break false,
                None => {
                    let len = buf.len();
                    reader.consume(len);
                }
            }
        };
        if starts_with_brace {
            Self::from_biom_json(path)
        } else {
            Self::from_tsv(path)
        }
    }

    /// Load a matrix from a classic BIOM TSV file (features as rows).
    ///
    /// A leading `# Constructed from biom file` line is skipped; the first
    /// header cell (usually `#OTU ID`) is ignored.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_path(path)?;
        let mut records = reader
            .records()
            .filter(|r| !matches!(r, Ok(rec) if rec.iter().all(|f| f.trim().is_empty())));

        let mut header = records
            .next()
            .ok_or_else(|| RrvError::EmptyData("Empty abundance table".to_string()))??;
        if header.get(0).is_some_and(|f| f.starts_with("# ")) {
            header = records
                .next()
                .ok_or_else(|| RrvError::EmptyData("Abundance table has no header".to_string()))??;
        }
        let sample_ids: Vec<String> = header.iter().skip(1).map(|s| s.trim().to_string()).collect();
        if sample_ids.is_empty() {
            return Err(RrvError::EmptyData("Abundance table has no samples".to_string()));
        }

        let mut feature_ids = Vec::new();
        let mut triplets = Vec::new();
        for (row, record) in records.enumerate() {
            let record = record?;
            let feature_id = record.get(0).unwrap_or_default().trim().to_string();
            let n_values = record.len().saturating_sub(1);
            if n_values != sample_ids.len() {
                let line = record.position().map_or(0, |p| p.line());
                return Err(RrvError::Parse(format!(
                    "Line {}: feature '{}' has {} values but the header names {} samples",
                    line,
                    feature_id,
                    n_values,
                    sample_ids.len()
                )));
            }
            feature_ids.push(feature_id);
            for (col, raw) in record.iter().skip(1).enumerate() {
                let value = raw.trim().parse::<f64>().map_err(|_| RrvError::InvalidCount {
                    value: raw.to_string(),
                    row,
                    col,
                })?;
                triplets.push((row, col, value));
            }
        }
        if feature_ids.is_empty() {
            return Err(RrvError::EmptyData("Abundance table has no features".to_string()));
        }

        log::debug!(
            "Read {} features x {} samples from TSV",
            feature_ids.len(),
            sample_ids.len()
        );
        Self::from_triplets(feature_ids, sample_ids, triplets)
    }

    /// Load a matrix from a BIOM 1.0 (JSON) file.
    pub fn from_biom_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let biom: BiomJson = serde_json::from_reader(BufReader::new(file))?;
        biom.into_matrix()
    }

    /// Abundance of feature `row` in sample `col`; absent entries are zero.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data.get(row, col).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.data.rows()
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.cols()
    }

    /// Number of stored (non-zero) abundances.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.data.nnz()
    }

    #[inline]
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Keep the features at `indices`, in that order.
    pub fn subset_features(&self, indices: &[usize]) -> Result<Self> {
        let feature_ids = pick(&self.feature_ids, indices)?;
        let mut triplets = Vec::with_capacity(self.nnz());
        for (new_row, &old_row) in indices.iter().enumerate() {
            if let Some(view) = self.data.outer_view(old_row) {
                triplets.extend(view.iter().map(|(col, &val)| (new_row, col, val)));
            }
        }
        Self::from_triplets(feature_ids, self.sample_ids.clone(), triplets)
    }

    /// Keep the samples at `indices`, in that order.
    pub fn subset_samples(&self, indices: &[usize]) -> Result<Self> {
        let sample_ids = pick(&self.sample_ids, indices)?;
        let new_position: HashMap<usize, usize> = indices
            .iter()
            .enumerate()
            .map(|(new_col, &old_col)| (old_col, new_col))
            .collect();
        let triplets = self.data.iter().filter_map(|(&val, (row, old_col))| {
            new_position.get(&old_col).map(|&new_col| (row, new_col, val))
        });
        Self::from_triplets(self.feature_ids.clone(), sample_ids, triplets)
    }
}

/// Identifiers at `indices`; an index past the end is a dimension error.
fn pick(ids: &[String], indices: &[usize]) -> Result<Vec<String>> {
    indices
        .iter()
        .map(|&i| {
            ids.get(i).cloned().ok_or(RrvError::DimensionMismatch {
                expected: ids.len(),
                actual: i + 1,
            })
        })
        .collect()
}

fn positions(ids: &[String], labels: &[String], what: &str) -> Result<Vec<usize>> {
    let index: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();
    let mut missing = Vec::new();
    let found: Vec<usize> = labels
        .iter()
        .filter_map(|label| {
            let pos = index.get(label.as_str()).copied();
            if pos.is_none() {
                missing.push(label.clone());
            }
            pos
        })
        .collect();
    if missing.is_empty() {
        Ok(found)
    } else {
        Err(RrvError::Consistency {
            what: what.to_string(),
            expected: labels.len(),
            missing,
        })
    }
}

/// `Axis::Rows` is the feature axis, `Axis::Columns` the sample axis.
impl Labeled for CountMatrix {
    fn labels(&self, axis: Axis) -> &[String] {
        match axis {
            Axis::Rows => &self.feature_ids,
            Axis::Columns => &self.sample_ids,
        }
    }

    fn select(&self, axis: Axis, labels: &[String]) -> Result<Self> {
        match axis {
            Axis::Rows => self.subset_features(&positions(&self.feature_ids, labels, "features")?),
            Axis::Columns => self.subset_samples(&positions(&self.sample_ids, labels, "samples")?),
        }
    }

    fn relabel(&self, axis: Axis, labels: Vec<String>) -> Result<Self> {
        match axis {
            Axis::Rows => Self::new(self.data.clone(), labels, self.sample_ids.clone()),
            Axis::Columns => Self::new(self.data.clone(), self.feature_ids.clone(), labels),
        }
    }
}

/// The subset of a BIOM 1.0 document needed to rebuild the matrix.
#[derive(Debug, Deserialize)]
struct BiomJson {
    rows: Vec<BiomAxisEntry>,
    columns: Vec<BiomAxisEntry>,
    matrix_type: String,
    shape: (usize, usize),
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct BiomAxisEntry {
    id: String,
}

impl BiomJson {
    fn into_matrix(self) -> Result<CountMatrix> {
        let feature_ids: Vec<String> = self.rows.into_iter().map(|r| r.id).collect();
        let sample_ids: Vec<String> = self.columns.into_iter().map(|c| c.id).collect();
        if self.shape != (feature_ids.len(), sample_ids.len()) {
            return Err(RrvError::Parse(format!(
                "BIOM shape {:?} does not match {} rows and {} columns",
                self.shape,
                feature_ids.len(),
                sample_ids.len()
            )));
        }

        let triplets: Vec<(usize, usize, f64)> = match self.matrix_type.as_str() {
            "sparse" => {
                let entries: Vec<(usize, usize, f64)> = serde_json::from_value(self.data)?;
                entries
            }
            "dense" => {
                let rows: Vec<Vec<f64>> = serde_json::from_value(self.data)?;
                rows.into_iter()
                    .enumerate()
                    .flat_map(|(r, row)| row.into_iter().enumerate().map(move |(c, v)| (r, c, v)))
                    .collect()
            }
            other => {
                return Err(RrvError::Parse(format!("Unsupported BIOM matrix_type '{}'", other)))
            }
        };

        CountMatrix::from_triplets(feature_ids, sample_ids, triplets)
    }
}
