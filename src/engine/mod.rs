// src/engine/mod.rs
//! Main execution logic for the analysis engine.
//!
//! A directory run walks the tree, streams jobs into a fresh [`WorkerPool`],
//! collects results as they finish and folds them into one report.

pub mod pool;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::aggregate;
use crate::config::Config;
use crate::error::{GaugeError, Result};
use crate::metrics::MetricsCalculator;
use crate::registry::ParserRegistry;
use crate::types::{AnalysisResult, EnhancedProjectAnalysis, FileFailure, RunSummary};
use crate::walker::{Discovered, FileWalker, WalkStats};

pub use pool::{Job, JobResult, Rejected, StopSignal, WorkerPool, POLL_INTERVAL};

/// Orchestrates discovery, parallel parsing and aggregation.
pub struct Engine {
    config: Config,
    registry: Arc<ParserRegistry>,
}

impl Engine {
    /// Builds an engine over an injected registry.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when the configuration is unusable or no parser
    /// is registered.
    pub fn new(config: Config, registry: Arc<ParserRegistry>) -> Result<Self> {
        config.validate()?;
        if registry.is_empty() {
            return Err(GaugeError::InvalidConfig("no parsers registered".into()));
        }
        Ok(Self { config, registry })
    }

    /// An engine with default configuration and the built-in parsers.
    ///
    /// # Errors
    /// Returns an error if the default configuration fails validation.
    pub fn with_defaults() -> Result<Self> {
        Self::new(Config::default(), Arc::new(ParserRegistry::with_defaults()))
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    #[must_use]
    pub fn supported_extensions(&self) -> Vec<String> {
        self.registry.list_extensions()
    }

    #[must_use]
    pub fn supported_languages(&self) -> Vec<String> {
        self.registry.list_languages()
    }

    #[must_use]
    pub fn supports(&self, path: &Path) -> bool {
        self.registry.supports(path)
    }

    /// Walks `root` without analyzing anything.
    #[must_use]
    pub fn walk_stats(&self, root: &Path) -> WalkStats {
        FileWalker::new(root, &self.config, &self.registry).stats()
    }

    /// Analyzes a single file on the calling thread.
    ///
    /// # Errors
    /// Returns `UnsupportedExtension` when no parser handles the file,
    /// `FileAccess` when it cannot be read or is over the size ceiling, and
    /// `Parse` when the parser rejects it outright.
    pub fn analyze(&self, path: &Path) -> Result<AnalysisResult> {
        let parser = self.registry.resolve(path)?;
        let content = read_capped(path, self.config.max_file_size)?;
        let job = Job {
            path: path.to_path_buf(),
            content,
            parser,
        };
        pool::run_job(job, MetricsCalculator::new()).outcome
    }

    /// Analyzes every supported file under `root`.
    ///
    /// `on_progress(completed, total, path)` runs on the calling thread after
    /// every finished file.
    ///
    /// # Errors
    /// Returns an error if `root` is not a directory or the pool cannot run.
    /// Unreadable or unparsable files do not fail the run.
    pub fn run_directory<F>(&self, root: &Path, on_progress: F) -> Result<EnhancedProjectAnalysis>
    where
        F: FnMut(usize, usize, &Path),
    {
        self.run_directory_with_cancel(root, &StopSignal::new(), on_progress)
    }

    /// Like [`Engine::run_directory`], checking `cancel` between results.
    ///
    /// # Errors
    /// Returns `Cancelled` once `cancel` is raised, plus everything
    /// [`Engine::run_directory`] can return.
    pub fn run_directory_with_cancel<F>(
        &self,
        root: &Path,
        cancel: &StopSignal,
        on_progress: F,
    ) -> Result<EnhancedProjectAnalysis>
    where
        F: FnMut(usize, usize, &Path),
    {
        let start = Instant::now();
        if !root.is_dir() {
            return Err(GaugeError::Io {
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
                path: root.to_path_buf(),
            });
        }

        let mut run = Run::new(cancel, on_progress);
        let files = self.discover(root, &mut run.failures);
        run.total = files.len();
        tracing::info!(root = %root.display(), files = run.total, "starting analysis");

        if !files.is_empty() {
            let pool = WorkerPool::new(self.config.max_workers, self.config.queue_capacity());
            pool.start()?;
            let outcome = self.stream(&pool, files, &mut run);
            pool.stop();
            outcome?;
        }

        let analyzed = run.results.len();
        let failed = run.failed;
        let mut report = aggregate::aggregate(run.results, root);
        report.summary = RunSummary {
            discovered: run.total,
            analyzed,
            failed,
            failures: run.failures,
        };
        report.duration_ms = start.elapsed().as_millis();
        tracing::info!(
            analyzed,
            failed,
            duration_ms = report.duration_ms,
            grade = %report.quality.grade,
            "analysis finished"
        );
        Ok(report)
    }

    /// Walks to completion. Walk errors are recorded, not fatal.
    fn discover(&self, root: &Path, failures: &mut Vec<FileFailure>) -> Vec<Discovered> {
        let walker = FileWalker::new(root, &self.config, &self.registry);
        let mut files = Vec::new();
        for item in walker.walk() {
            match item {
                Ok(found) => files.push(found),
                Err(e) => {
                    tracing::warn!(error = %e, "walk error");
                    failures.push(FileFailure {
                        path: e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf),
                        message: e.to_string(),
                    });
                }
            }
        }
        files
    }

    /// Submits every file, draining a result whenever the job queue is full.
    fn stream<F>(&self, pool: &WorkerPool, files: Vec<Discovered>, run: &mut Run<'_, F>) -> Result<()>
    where
        F: FnMut(usize, usize, &Path),
    {
        let mut in_flight = 0usize;
        for found in files {
            run.check_cancelled()?;
            let content = match read_capped(&found.path, self.config.max_file_size) {
                Ok(content) => content,
                Err(e) => {
                    run.fail(&found.path, &e);
                    continue;
                }
            };

            let mut job = Job {
                path: found.path,
                content,
                parser: found.parser,
            };
            loop {
                match pool.try_submit(job) {
                    Ok(()) => {
                        in_flight += 1;
                        break;
                    }
                    Err(rejected) if matches!(rejected.reason, GaugeError::QueueFull { .. }) && in_flight > 0 => {
                        job = rejected.job;
                        run.collect_one(pool)?;
                        in_flight -= 1;
                    }
                    Err(rejected) => return Err(rejected.into()),
                }
            }
        }

        while in_flight > 0 {
            run.collect_one(pool)?;
            in_flight -= 1;
        }
        Ok(())
    }
}

/// Collector state for one directory run.
struct Run<'c, F> {
    cancel: &'c StopSignal,
    on_progress: F,
    total: usize,
    completed: usize,
    failed: usize,
    results: Vec<AnalysisResult>,
    failures: Vec<FileFailure>,
}

impl<'c, F> Run<'c, F>
where
    F: FnMut(usize, usize, &Path),
{
    fn new(cancel: &'c StopSignal, on_progress: F) -> Self {
        Self {
            cancel,
            on_progress,
            total: 0,
            completed: 0,
            failed: 0,
            results: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_stopped() {
            tracing::info!(completed = self.completed, total = self.total, "analysis cancelled");
            return Err(GaugeError::Cancelled);
        }
        Ok(())
    }

    /// Blocks until one result arrives, checking for cancellation between polls.
    fn collect_one(&mut self, pool: &WorkerPool) -> Result<()> {
        loop {
            self.check_cancelled()?;
            if let Some(result) = pool.recv_result(POLL_INTERVAL)? {
                self.accept(result);
                return Ok(());
            }
        }
    }

    fn accept(&mut self, result: JobResult) {
        match result.outcome {
            Ok(analysis) => {
                self.results.push(analysis);
                self.progress(&result.path);
            }
            Err(e) => self.fail(&result.path, &e),
        }
    }

    fn fail(&mut self, path: &Path, error: &GaugeError) {
        tracing::warn!(path = %path.display(), error = %error, "file skipped");
        self.failed += 1;
        self.failures.push(FileFailure {
            path: PathBuf::from(path),
            message: error.to_string(),
        });
        self.progress(path);
    }

    fn progress(&mut self, path: &Path) {
        self.completed += 1;
        (self.on_progress)(self.completed, self.total, path);
    }
}

/// Reads a file, refusing anything over `limit` bytes without buffering past it.
fn read_capped(path: &Path, limit: u64) -> Result<Vec<u8>> {
    let access = |reason: String| GaugeError::FileAccess {
        path: path.to_path_buf(),
        reason,
    };
    let too_large = |len: u64| access(format!("{len} bytes exceeds the {limit} byte limit"));

    let file = File::open(path).map_err(|e| access(e.to_string()))?;
    let declared = file.metadata().map_err(|e| access(e.to_string()))?.len();
    if declared > limit {
        return Err(too_large(declared));
    }

    // The file may grow between the size check and the read.
    let mut content = Vec::new();
    file.take(limit.saturating_add(1))
        .read_to_end(&mut content)
        .map_err(|e| access(e.to_string()))?;
    if content.len() as u64 > limit {
        return Err(too_large(content.len() as u64));
    }
    Ok(content)
}
