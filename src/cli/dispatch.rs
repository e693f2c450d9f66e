// src/cli/dispatch.rs
//! Routes parsed subcommands to the engine.

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use super::args::Commands;
use super::report;
use crate::config::Config;
use crate::engine::Engine;
use crate::error::GaugeError;
use crate::exit::GaugeExit;
use crate::registry::ParserRegistry;

/// Executes one subcommand.
///
/// # Errors
/// Returns error if configuration loading or the analysis itself fails.
pub fn execute(command: Commands) -> Result<GaugeExit> {
    match command {
        Commands::Scan {
            path,
            json,
            workers,
            exclude,
            include,
            fail_under,
            quiet,
        } => {
            let overrides = ScanOverrides {
                workers,
                exclude,
                include,
            };
            handle_scan(&path, json, &overrides, fail_under, quiet)
        }
        Commands::File { path, json } => handle_file(&path, json),
        Commands::Walk { path, json } => handle_walk(&path, json),
        Commands::Languages => {
            handle_languages();
            Ok(GaugeExit::Success)
        }
    }
}

struct ScanOverrides {
    workers: Option<usize>,
    exclude: Vec<String>,
    include: Vec<String>,
}

fn load_config(root: &Path) -> Result<Config> {
    let dir = if root.is_dir() {
        root.to_path_buf()
    } else {
        root.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    };
    Config::load(&dir).with_context(|| format!("Failed to load config from {}", dir.display()))
}

fn build_engine(config: Config) -> Result<Engine> {
    Engine::new(config, Arc::new(ParserRegistry::with_defaults())).context("Failed to start engine")
}

fn handle_scan(
    root: &Path,
    json: bool,
    overrides: &ScanOverrides,
    fail_under: Option<f64>,
    quiet: bool,
) -> Result<GaugeExit> {
    if !root.is_dir() {
        eprintln!("Not a directory: {}", root.display());
        return Ok(GaugeExit::InvalidInput);
    }

    let mut config = load_config(root)?;
    if let Some(workers) = overrides.workers {
        config.max_workers = workers;
    }
    config.exclude_patterns.extend(overrides.exclude.iter().cloned());
    config.include_patterns.extend(overrides.include.iter().cloned());
    let engine = build_engine(config)?;

    let show_progress = !quiet && !json && std::io::stderr().is_terminal();
    let analysis = engine
        .run_directory(root, |done, total, path| {
            if show_progress {
                let mut err = std::io::stderr();
                let _ = write!(err, "\r\x1b[2K[{done}/{total}] {}", path.display());
                let _ = err.flush();
            }
        })
        .with_context(|| format!("Analysis of {} failed", root.display()))?;
    if show_progress {
        eprintln!();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        report::print_analysis(&analysis);
    }

    match fail_under {
        Some(threshold) if analysis.quality.score < threshold => Ok(GaugeExit::CheckFailed),
        _ => Ok(GaugeExit::Success),
    }
}

fn handle_file(path: &Path, json: bool) -> Result<GaugeExit> {
    let engine = build_engine(load_config(path)?)?;
    let result = match engine.analyze(path) {
        Ok(result) => result,
        Err(e @ (GaugeError::UnsupportedExtension { .. } | GaugeError::FileAccess { .. })) => {
            eprintln!("{e}");
            return Ok(GaugeExit::InvalidInput);
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to analyze {}", path.display())),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        report::print_file(&result);
    }
    Ok(GaugeExit::Success)
}

fn handle_walk(root: &Path, json: bool) -> Result<GaugeExit> {
    if !root.is_dir() {
        eprintln!("Not a directory: {}", root.display());
        return Ok(GaugeExit::InvalidInput);
    }
    let engine = build_engine(load_config(root)?)?;
    let stats = engine.walk_stats(root);
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        report::print_walk(root, &stats);
    }
    Ok(GaugeExit::Success)
}

fn handle_languages() {
    let registry = ParserRegistry::with_defaults();
    report::print_languages(&registry);
}
