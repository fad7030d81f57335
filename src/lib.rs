//! rankratioviz: rank plots and sample log-ratio plots for microbiome data
//!
//! This library turns feature rankings (differentials or ordination
//! loadings), an abundance table and sample metadata into two Vega-Lite
//! chart specifications driving an interactive front end.
//!
//! # Overview
//!
//! - **data**: Input tables (CountMatrix, Metadata, feature ranks) and loaders
//! - **reconcile**: Alignment of ranks, table and metadata; feature IDs
//! - **plot**: Rank plot and sample plot chart specifications
//! - **emit**: Writing the specifications and front-end files
//! - **pipeline**: End-to-end runs and YAML configuration
//!
//! # Example
//!
//! ```no_run
//! use rankratioviz::prelude::*;
//!
//! let summary = Pipeline::new(
//!     "differentials.tsv",
//!     "table.biom",
//!     "sample_metadata.tsv",
//!     "rankratioviz_output",
//! )
//! .feature_metadata("taxonomy.tsv")
//! .run()
//! .unwrap();
//! println!("{}", summary.index_path.display());
//! ```

pub mod data;
pub mod emit;
pub mod error;
pub mod pipeline;
pub mod plot;
pub mod reconcile;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::data::{
        load_ranks, Axis, CountMatrix, FeatureRanks, Labeled, Metadata, Table, Variable,
        VariableType,
    };
    pub use crate::emit::{emit, write_visualization, SupportFiles};
    pub use crate::error::{Result, RrvError};
    pub use crate::pipeline::{gen_visualization, Pipeline, PipelineConfig, RunSummary};
    pub use crate::plot::{
        build_rank_plot, build_sample_plot, compact, ChartSpec, Classification, CompactColumnMap,
    };
    pub use crate::reconcile::{
        align, process_input, resolve_ids, AlignedDataset, FeatureAnnotations, FeatureRelabeling,
    };
}
