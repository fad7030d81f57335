//! rankratioviz - rank plot and sample plot generation
//!
//! Command-line interface for building the interactive rank/log-ratio
//! visualization from feature ranks, an abundance table and sample metadata.

use clap::{Parser, Subcommand};
use rankratioviz::error::Result;
use rankratioviz::pipeline::{Pipeline, PipelineConfig, RunSummary};
use std::path::PathBuf;

/// Visualize feature rankings and log ratios of their abundances
#[derive(Parser)]
#[command(name = "rankratioviz")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// More log output (repeat for debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a visualization from input files
    Plot {
        /// Differentials TSV or ordination results
        #[arg(short, long)]
        ranks: PathBuf,

        /// Abundance table (BIOM JSON or TSV)
        #[arg(short, long)]
        table: PathBuf,

        /// Sample metadata TSV
        #[arg(long, visible_alias = "sm")]
        sample_metadata: PathBuf,

        /// Feature metadata TSV (e.g. taxonomy)
        #[arg(long, visible_alias = "fm")]
        feature_metadata: Option<PathBuf>,

        /// Directory to write the visualization to
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Front-end files to copy instead of the bundled ones
        #[arg(long)]
        support_files: Option<PathBuf>,
    },

    /// Generate a visualization from a YAML configuration file
    Run {
        /// Path to configuration YAML
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Write an example configuration file
    Example {
        /// Output path for the YAML file
        #[arg(short, long, default_value = "rankratioviz.yaml")]
        output: PathBuf,
    },
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Error
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Plot {
            ranks,
            table,
            sample_metadata,
            feature_metadata,
            output_dir,
            support_files,
        } => {
            let mut pipeline = Pipeline::new(ranks, table, sample_metadata, output_dir);
            if let Some(path) = feature_metadata {
                pipeline = pipeline.feature_metadata(path);
            }
            if let Some(path) = support_files {
                pipeline = pipeline.support_files(path);
            }
            cmd_plot(&pipeline)
        }

        Commands::Run { config } => cmd_run(&config),

        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn report(summary: &RunSummary) {
    eprintln!(
        "Plotted {} features and {} samples",
        summary.n_features, summary.n_samples
    );
    if summary.n_annotated > 0 {
        eprintln!("  {} feature IDs extended with feature metadata", summary.n_annotated);
    }
    if summary.n_dropped_features > 0 || summary.n_dropped_samples > 0 {
        eprintln!(
            "  {} table features and {} table samples not plotted",
            summary.n_dropped_features, summary.n_dropped_samples
        );
    }
    println!("{}", summary.index_path.display());
}

/// Run a pipeline built from command-line flags
fn cmd_plot(pipeline: &Pipeline) -> Result<()> {
    let summary = pipeline.run()?;
    report(&summary);
    Ok(())
}

/// Run a pipeline from a YAML configuration file
fn cmd_run(config_path: &PathBuf) -> Result<()> {
    eprintln!("Loading configuration from {:?}...", config_path);
    let config = PipelineConfig::from_file(config_path)?;
    let summary = Pipeline::from_config(&config).run()?;
    report(&summary);
    Ok(())
}

/// Write an example configuration file
fn cmd_example(output_path: &PathBuf) -> Result<()> {
    let yaml = PipelineConfig::example().to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote example configuration to {:?}", output_path);
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);

    Ok(())
}
