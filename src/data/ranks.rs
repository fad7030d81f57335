//! Loading feature ranks from differentials or ordination results.
//!
//! Two sources are recognised:
//! - Differentials (e.g. songbird): a TSV with feature IDs in the first
//!   column and one column per coefficient.
//! - Ordination results in the scikit-bio text format (e.g. DEICODE), where
//!   the `Species` section holds per-feature loadings. Loadings become rank
//!   columns named `0`, `1`, ...

use super::metadata::{FeatureRanks, Variable};
use super::table::Table;
use crate::error::{RrvError, Result};
use std::fs;
use std::path::Path;

const ORDINATION_MAGIC: &str = "Eigvals";
const FEATURE_SECTION: &str = "Species";

/// Load ranks, detecting ordination results by their leading `Eigvals` line.
pub fn load_ranks<P: AsRef<Path>>(path: P) -> Result<FeatureRanks> {
    let text = fs::read_to_string(path)?;
    if text.trim_start().starts_with(ORDINATION_MAGIC) {
        parse_ordination(&text)
    } else {
        FeatureRanks::from_reader(text.as_bytes())
    }
}

fn parse_count(field: Option<&str>, line_no: usize) -> Result<usize> {
    field
        .and_then(|f| f.trim().parse::<usize>().ok())
        .ok_or_else(|| {
            RrvError::Parse(format!(
                "Line {}: expected row and column counts after '{}'",
                line_no + 1,
                FEATURE_SECTION
            ))
        })
}

/// Parse the `Species` section of scikit-bio ordination text.
pub fn parse_ordination(text: &str) -> Result<FeatureRanks> {
    let mut lines = text.lines().enumerate();

    let (header_no, header) = lines
        .by_ref()
        .find(|(_, line)| line.split('\t').next() == Some(FEATURE_SECTION))
        .ok_or_else(|| {
            RrvError::Parse(format!("No '{}' section in ordination results", FEATURE_SECTION))
        })?;

    let mut fields = header.split('\t').skip(1);
    let n_features = parse_count(fields.next(), header_no)?;
    let n_axes = parse_count(fields.next(), header_no)?;
    if n_features == 0 || n_axes == 0 {
        return Err(RrvError::EmptyData(
            "Ordination results contain no feature loadings".to_string(),
        ));
    }

    let mut feature_ids = Vec::with_capacity(n_features);
    let mut rows = Vec::with_capacity(n_features);
    for (line_no, line) in lines.take(n_features) {
        let mut fields = line.split('\t');
        let id = fields.next().unwrap_or_default().trim().to_string();
        let row = fields
            .map(|raw| {
                raw.trim().parse::<f64>().map(Variable::Continuous).map_err(|_| {
                    RrvError::Parse(format!(
                        "Line {}: loading '{}' for feature '{}' is not a number",
                        line_no + 1,
                        raw,
                        id
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if row.len() != n_axes {
            return Err(RrvError::DimensionMismatch {
                expected: n_axes,
                actual: row.len(),
            });
        }
        feature_ids.push(id);
        rows.push(row);
    }
    if rows.len() != n_features {
        return Err(RrvError::DimensionMismatch {
            expected: n_features,
            actual: rows.len(),
        });
    }

    let axes = (0..n_axes).map(|i| i.to_string()).collect();
    Table::new(feature_ids, axes, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ORDINATION: &str = "Eigvals\t2\n0.36\t0.18\n\n\
        Proportion explained\t2\n0.6\t0.4\n\n\
        Species\t3\t2\n\
        F1\t0.11\t-0.28\n\
        F2\t-0.5\t0.1\n\
        F3\t0.0\t0.9\n\n\
        Site\t2\t2\nS1\t0.1\t0.2\nS2\t0.3\t0.4\n\n\
        Biplot\t0\t0\n\n\
        Site constraints\t0\t0\n";

    #[test]
    fn test_parse_ordination_species_section() {
        let ranks = parse_ordination(ORDINATION).unwrap();
        assert_eq!(ranks.row_ids(), &["F1", "F2", "F3"]);
        assert_eq!(ranks.col_ids(), &["0", "1"]);
        assert_eq!(ranks.get_by_id("F2", "0"), Some(&Variable::Continuous(-0.5)));
        assert_eq!(ranks.get_by_id("F3", "1"), Some(&Variable::Continuous(0.9)));
    }

    #[test]
    fn test_missing_species_section() {
        let err = parse_ordination("Eigvals\t1\n0.5\n").unwrap_err();
        assert!(matches!(err, RrvError::Parse(_)));
    }

    #[test]
    fn test_truncated_species_section() {
        let err = parse_ordination("Eigvals\t1\n1\n\nSpecies\t3\t1\nF1\t0.1\n").unwrap_err();
        assert!(matches!(
            err,
            RrvError::DimensionMismatch { expected: 3, actual: 1 }
        ));
    }

    #[test]
    fn test_load_ranks_detects_format() {
        let mut ord = NamedTempFile::new().unwrap();
        write!(ord, "{}", ORDINATION).unwrap();
        ord.flush().unwrap();
        assert_eq!(load_ranks(ord.path()).unwrap().n_cols(), 2);

        let mut diff = NamedTempFile::new().unwrap();
        writeln!(diff, "featureid\tIntercept\tGroup[T.b]").unwrap();
        writeln!(diff, "F1\t1.5\t-2").unwrap();
        writeln!(diff, "F2\t0.5\t3").unwrap();
        diff.flush().unwrap();
        let ranks = load_ranks(diff.path()).unwrap();
        assert_eq!(ranks.col_ids(), &["Intercept", "Group[T.b]"]);
        assert_eq!(ranks.get_by_id("F1", "Group[T.b]"), Some(&Variable::Continuous(-2.0)));
    }
}
