//! Integration tests for reconciliation, plot building and emission.

use rankratioviz::emit::{RANK_PLOT_FILE, SAMPLE_PLOT_FILE};
use rankratioviz::plot::{
    BALANCE_FIELD, FEATURE_COL_IDS_DATASET, FEATURE_COUNTS_DATASET, RANK_ORDERING_DATASET,
};
use rankratioviz::prelude::*;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::{NamedTempFile, TempDir};

fn ids(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

fn tsv(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file.flush().unwrap();
    file
}

fn feature_ranks(rows: &[(&str, f64)]) -> FeatureRanks {
    Table::new(
        rows.iter().map(|(id, _)| id.to_string()).collect(),
        ids(&["0"]),
        rows.iter().map(|&(_, v)| vec![Variable::Continuous(v)]).collect(),
    )
    .unwrap()
}

/// 4 features × 3 samples; feature X is unranked in every scenario.
fn counts() -> CountMatrix {
    CountMatrix::from_triplets(
        ids(&["A", "B", "C", "X"]),
        ids(&["S1", "S2", "S3"]),
        vec![
            (0, 0, 12.0),
            (0, 1, 3.0),
            (1, 1, 40.0),
            (1, 2, 8.0),
            (2, 0, 5.0),
            (2, 2, 5.0),
            (3, 0, 100.0),
        ],
    )
    .unwrap()
}

fn sample_metadata() -> Metadata {
    Metadata::from_reader(
        "sample_id\tgroup\tph\n#q2:types\tcategorical\tnumeric\nS1\ta\t6.5\nS2\tb\tNA\nS3\ta\t7.1\n"
            .as_bytes(),
    )
    .unwrap()
}

fn support_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
    fs::write(dir.path().join("main.js"), "").unwrap();
    dir
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn primary_records(chart: &Value) -> &Vec<Value> {
    let name = chart["data"]["name"].as_str().unwrap();
    chart["datasets"][name].as_array().unwrap()
}

#[test]
fn test_rank_plot_sorted_order() {
    let (_, rank_plot, _) = rankratioviz::pipeline::build_plots(
        &feature_ranks(&[("A", 1.0), ("B", -3.0), ("C", 0.0)]),
        &counts(),
        &sample_metadata(),
        &FeatureAnnotations::Absent,
    )
    .unwrap();

    let records = rank_plot.records();
    let order: Vec<&str> = records.iter().map(|r| r["Feature ID"].as_str().unwrap()).collect();
    let xs: Vec<u64> = records.iter().map(|r| r["x"].as_u64().unwrap()).collect();
    let ranks: Vec<f64> = records.iter().map(|r| r["Rank 0"].as_f64().unwrap()).collect();
    assert_eq!(order, vec!["B", "C", "A"]);
    assert_eq!(xs, vec![0, 1, 2]);
    assert_eq!(ranks, vec![-3.0, 0.0, 1.0]);
}

#[test]
fn test_rank_absent_from_table_is_consistency_error() {
    let out = TempDir::new().unwrap();
    let support = support_dir();
    let dest = out.path().join("viz");
    let err = gen_visualization(
        &feature_ranks(&[("A", 1.0), ("D", 2.0)]),
        &counts(),
        &sample_metadata(),
        &FeatureAnnotations::Absent,
        SupportFiles::Directory(support.path()),
        &dest,
    )
    .unwrap_err();

    match &err {
        RrvError::Consistency { missing, .. } => assert_eq!(missing, &vec!["D".to_string()]),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains('D'));
    assert!(!dest.exists());
}

#[test]
fn test_feature_metadata_composite_ids() {
    let taxonomy = tsv("feature_id\tKingdom\tPhylum\nA\tk1\tk2\n");
    let taxonomy = Metadata::from_tsv(taxonomy.path()).unwrap();
    let data = process_input(
        &feature_ranks(&[("A", 1.0), ("B", -3.0)]),
        &sample_metadata(),
        &counts(),
        &FeatureAnnotations::Table(taxonomy),
    )
    .unwrap();

    assert_eq!(data.ranks.row_ids(), &["A|k1|k2", "B"]);
    assert_eq!(data.counts.feature_ids(), &["A|k1|k2", "B"]);
    assert_eq!(data.counts.get(0, 0), 12.0);
    assert_eq!(data.dropped_features, vec!["C", "X"]);
}

#[test]
fn test_full_visualization_from_files() {
    let ranks = tsv("featureid\tIntercept\tgroup[T.b]\nA\t0.4\t1.0\nB\t0.1\t-3.0\nC\t-0.2\t0.0\n");
    let table = tsv(
        r#"{"id": "t", "format": "Biological Observation Matrix 1.0.0",
            "type": "OTU table", "matrix_type": "sparse", "matrix_element_type": "float",
            "shape": [4, 3],
            "rows": [{"id": "A", "metadata": null}, {"id": "B", "metadata": null},
                     {"id": "C", "metadata": null}, {"id": "X", "metadata": null}],
            "columns": [{"id": "S1", "metadata": null}, {"id": "S2", "metadata": null},
                        {"id": "S3", "metadata": null}],
            "data": [[0, 0, 12.0], [0, 1, 3.0], [1, 1, 40.0], [2, 2, 5.0], [3, 0, 100.0]]}"#,
    );
    let metadata = tsv("sample_id\tgroup\tph\nS1\ta\t6.5\nS3\ta\t7.1\n");
    let taxonomy = tsv("feature_id\tTaxon\nB\tk__Bacteria\n");
    let support = support_dir();
    let out = TempDir::new().unwrap();
    let dest = out.path().join("viz");

    let summary = Pipeline::new(ranks.path(), table.path(), metadata.path(), dest.as_path())
        .feature_metadata(taxonomy.path())
        .support_files(support.path())
        .run()
        .unwrap();

    assert_eq!(summary.n_features, 3);
    assert_eq!(summary.n_samples, 2);
    assert_eq!(summary.n_dropped_features, 1);
    assert_eq!(summary.n_dropped_samples, 1);
    assert_eq!(summary.n_annotated, 1);
    assert_eq!(summary.index_path, fs::canonicalize(dest.join("index.html")).unwrap());

    let rank_plot = read_json(&dest.join(RANK_PLOT_FILE));
    assert_eq!(
        rank_plot["datasets"][RANK_ORDERING_DATASET],
        serde_json::json!(["Rank Intercept", "Rank group[T.b]"])
    );
    let order: Vec<&str> = primary_records(&rank_plot)
        .iter()
        .map(|r| r["Feature ID"].as_str().unwrap())
        .collect();
    assert_eq!(order, vec!["C", "B|k__Bacteria", "A"]);

    let sample_plot = read_json(&dest.join(SAMPLE_PLOT_FILE));
    let records = primary_records(&sample_plot);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r[BALANCE_FIELD].is_null()));
    assert_eq!(records[0]["Sample ID"], "S1");
    assert_eq!(sample_plot["encoding"]["x"]["field"], "group");

    let col_ids = sample_plot["datasets"][FEATURE_COL_IDS_DATASET].as_object().unwrap();
    assert_eq!(col_ids.len(), 3);
    assert_eq!(col_ids["B|k__Bacteria"], "1");
    let feature_counts = sample_plot["datasets"][FEATURE_COUNTS_DATASET].as_object().unwrap();
    assert_eq!(feature_counts.len(), 3);
    for per_sample in feature_counts.values() {
        assert_eq!(per_sample.as_object().unwrap().len(), 2);
    }
    assert_eq!(feature_counts["0"]["S1"], 12.0);
    assert_eq!(feature_counts["1"]["S3"], 0.0);
}

#[test]
fn test_ordination_ranks() {
    let ordination = tsv(
        "Eigvals\t2\n0.36\t0.18\n\nProportion explained\t2\n0.6\t0.4\n\n\
         Species\t3\t2\nA\t0.5\t-0.1\nB\t-0.5\t0.2\nC\t0.1\t0.3\n\n\
         Site\t0\t0\n\nBiplot\t0\t0\n\nSite constraints\t0\t0\n",
    );
    let ranks = load_ranks(ordination.path()).unwrap();
    let chart = build_rank_plot(&ranks).unwrap();
    let order: Vec<&str> = chart
        .records()
        .iter()
        .map(|r| r["Feature ID"].as_str().unwrap())
        .collect();
    assert_eq!(order, vec!["B", "C", "A"]);
    assert_eq!(chart.encoding.y.as_ref().unwrap().field, "Rank 0");
}

#[test]
fn test_output_is_deterministic() {
    let build = || {
        rankratioviz::pipeline::build_plots(
            &feature_ranks(&[("A", 1.0), ("B", -3.0), ("C", 0.0)]),
            &counts(),
            &sample_metadata(),
            &FeatureAnnotations::Absent,
        )
        .unwrap()
    };
    let (_, rank_a, sample_a) = build();
    let (_, rank_b, sample_b) = build();
    assert_eq!(rank_a.to_json().unwrap(), rank_b.to_json().unwrap());
    assert_eq!(sample_a.to_json().unwrap(), sample_b.to_json().unwrap());
}

#[test]
fn test_missing_entry_point_aborts_before_writing() {
    let support = TempDir::new().unwrap();
    fs::write(support.path().join("main.js"), "").unwrap();
    let out = TempDir::new().unwrap();
    let dest = out.path().join("viz");

    let err = gen_visualization(
        &feature_ranks(&[("A", 1.0)]),
        &counts(),
        &sample_metadata(),
        &FeatureAnnotations::Absent,
        SupportFiles::Directory(support.path()),
        &dest,
    )
    .unwrap_err();
    assert!(matches!(err, RrvError::MissingAsset { .. }));
    assert!(!dest.exists());
}
