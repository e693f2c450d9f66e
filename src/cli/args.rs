// src/cli/args.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codegauge", version, about = "Multi-language code quality analyzer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    /// Enable debug logging (overridden by `RUST_LOG`)
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze every supported file under a directory
    Scan {
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
        /// Number of worker threads
        #[arg(long, short)]
        workers: Option<usize>,
        /// Extra exclude pattern (repeatable)
        #[arg(long, value_name = "PATTERN")]
        exclude: Vec<String>,
        /// Only analyze files matching this pattern (repeatable)
        #[arg(long, value_name = "PATTERN")]
        include: Vec<String>,
        /// Exit non-zero if the quality score is below this value
        #[arg(long, value_name = "SCORE")]
        fail_under: Option<f64>,
        /// Skip the progress line
        #[arg(long, short)]
        quiet: bool,
    },
    /// Analyze a single file
    File {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Show what a scan would pick up, without analyzing
    Walk {
        #[arg(default_value = ".")]
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// List supported languages and extensions
    Languages,
}
