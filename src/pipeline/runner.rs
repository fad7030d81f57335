//! Runner that loads inputs, reconciles them and writes the visualization.

use crate::data::{load_ranks, CountMatrix, FeatureRanks, Metadata};
use crate::emit::{write_visualization, SupportFiles};
use crate::error::{RrvError, Result};
use crate::plot::{build_rank_plot, build_sample_plot, ChartSpec};
use crate::reconcile::{process_input, AlignedDataset, FeatureAnnotations};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Input and output locations of a run, loadable from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Differentials TSV or ordination results.
    pub ranks: PathBuf,
    /// Abundance table (BIOM JSON or TSV).
    pub table: PathBuf,
    pub sample_metadata: PathBuf,
    /// Feature metadata (e.g. taxonomy) appended to feature IDs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_metadata: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Front-end files; the bundled ones when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_files: Option<PathBuf>,
}

impl PipelineConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(RrvError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(RrvError::from)
    }

    /// Load from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    /// A config pointing at placeholder file names.
    pub fn example() -> Self {
        Self {
            ranks: PathBuf::from("differentials.tsv"),
            table: PathBuf::from("table.biom"),
            sample_metadata: PathBuf::from("sample_metadata.tsv"),
            feature_metadata: Some(PathBuf::from("taxonomy.tsv")),
            output_dir: PathBuf::from("rankratioviz_output"),
            support_files: None,
        }
    }
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Absolute path of the visualization entry point.
    pub index_path: PathBuf,
    /// Ranked features plotted.
    pub n_features: usize,
    /// Samples plotted.
    pub n_samples: usize,
    /// Table features discarded for lack of a rank.
    pub n_dropped_features: usize,
    /// Table samples discarded for lack of metadata.
    pub n_dropped_samples: usize,
    /// Features whose ID was extended with feature metadata.
    pub n_annotated: usize,
}

/// Builder for a single visualization run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    ranks: PathBuf,
    table: PathBuf,
    sample_metadata: PathBuf,
    feature_metadata: Option<PathBuf>,
    output_dir: PathBuf,
    support_files: Option<PathBuf>,
}

impl Pipeline {
    /// Create a pipeline with the required inputs.
    pub fn new<P: Into<PathBuf>>(ranks: P, table: P, sample_metadata: P, output_dir: P) -> Self {
        Self {
            ranks: ranks.into(),
            table: table.into(),
            sample_metadata: sample_metadata.into(),
            feature_metadata: None,
            output_dir: output_dir.into(),
            support_files: None,
        }
    }

    /// Create from a config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            ranks: config.ranks.clone(),
            table: config.table.clone(),
            sample_metadata: config.sample_metadata.clone(),
            feature_metadata: config.feature_metadata.clone(),
            output_dir: config.output_dir.clone(),
            support_files: config.support_files.clone(),
        }
    }

    /// Append feature metadata columns to feature IDs.
    pub fn feature_metadata<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.feature_metadata = Some(path.into());
        self
    }

    /// Use a custom front-end directory.
    pub fn support_files<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.support_files = Some(path.into());
        self
    }

    /// Export as a config.
    pub fn to_config(&self) -> PipelineConfig {
        PipelineConfig {
            ranks: self.ranks.clone(),
            table: self.table.clone(),
            sample_metadata: self.sample_metadata.clone(),
            feature_metadata: self.feature_metadata.clone(),
            output_dir: self.output_dir.clone(),
            support_files: self.support_files.clone(),
        }
    }

    /// Load every input, build both plots and write them out.
    pub fn run(&self) -> Result<RunSummary> {
        log::info!("Loading feature ranks from {}", self.ranks.display());
        let ranks = load_ranks(&self.ranks)?;
        log::info!("Loading abundance table from {}", self.table.display());
        let counts = CountMatrix::load(&self.table)?;
        log::info!("Loading sample metadata from {}", self.sample_metadata.display());
        let sample_metadata = Metadata::from_tsv(&self.sample_metadata)?;
        let annotations = match &self.feature_metadata {
            Some(path) => {
                log::info!("Loading feature metadata from {}", path.display());
                FeatureAnnotations::Table(Metadata::from_tsv(path)?)
            }
            None => FeatureAnnotations::Absent,
        };
        log::debug!(
            "Inputs: {} ranked features x {} rank columns, {} x {} table, {} metadata samples",
            ranks.n_rows(),
            ranks.n_cols(),
            counts.n_features(),
            counts.n_samples(),
            sample_metadata.n_rows()
        );

        let support = match &self.support_files {
            Some(dir) => SupportFiles::Directory(dir),
            None => SupportFiles::Bundled,
        };
        gen_visualization(
            &ranks,
            &counts,
            &sample_metadata,
            &annotations,
            support,
            &self.output_dir,
        )
    }
}

/// Reconcile the inputs and build the rank and sample plots.
pub fn build_plots(
    ranks: &FeatureRanks,
    counts: &CountMatrix,
    sample_metadata: &Metadata,
    annotations: &FeatureAnnotations,
) -> Result<(AlignedDataset, ChartSpec, ChartSpec)> {
    let aligned = process_input(ranks, sample_metadata, counts, annotations)?;
    log::info!("Building rank plot");
    let rank_plot = build_rank_plot(&aligned.ranks)?;
    log::info!("Building sample plot");
    let sample_plot = build_sample_plot(&aligned.counts, &aligned.metadata)?;
    Ok((aligned, rank_plot, sample_plot))
}

/// Reconcile in-memory inputs and write the visualization to `output_dir`.
///
/// Nothing is written unless reconciliation and both plots succeed.
pub fn gen_visualization(
    ranks: &FeatureRanks,
    counts: &CountMatrix,
    sample_metadata: &Metadata,
    annotations: &FeatureAnnotations,
    support: SupportFiles<'_>,
    output_dir: &Path,
) -> Result<RunSummary> {
    let (aligned, rank_plot, sample_plot) =
        build_plots(ranks, counts, sample_metadata, annotations)?;
    let index_path = write_visualization(&rank_plot, &sample_plot, support, output_dir)?;
    Ok(RunSummary {
        index_path,
        n_features: aligned.ranks.n_rows(),
        n_samples: sample_plot.records().len(),
        n_dropped_features: aligned.dropped_features.len(),
        n_dropped_samples: aligned.dropped_samples.len(),
        n_annotated: aligned.n_annotated,
    })
}
