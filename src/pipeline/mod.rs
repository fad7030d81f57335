//! End-to-end runs: load inputs, build the plots, write the visualization.

mod runner;

pub use runner::{build_plots, gen_visualization, Pipeline, PipelineConfig, RunSummary};
