// src/engine/pool.rs
//! Fixed-size worker pool over two bounded queues.
//!
//! Workers poll the job queue with a short timeout so the stop flag is seen
//! between jobs. A job that has started always runs to completion.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::error::{GaugeError, Result};
use crate::metrics::MetricsCalculator;
use crate::parser::Parser;
use crate::types::AnalysisResult;

/// How long an idle worker waits on the job queue before rechecking the stop flag.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One file to analyze.
pub struct Job {
    pub path: PathBuf,
    pub content: Vec<u8>,
    pub parser: Arc<dyn Parser>,
}

/// The outcome of one job, handed back by ownership.
#[derive(Debug)]
pub struct JobResult {
    pub path: PathBuf,
    pub outcome: Result<AnalysisResult>,
}

/// A job the pool did not accept, returned to the caller with the reason.
pub struct Rejected {
    pub job: Job,
    pub reason: GaugeError,
}

impl std::fmt::Debug for Rejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rejected")
            .field("path", &self.job.path)
            .field("reason", &self.reason)
            .finish()
    }
}

impl From<Rejected> for GaugeError {
    fn from(r: Rejected) -> Self {
        r.reason
    }
}

#[derive(Default)]
struct PoolState {
    running: bool,
    workers: Vec<thread::JoinHandle<()>>,
    jobs: Option<SyncSender<Job>>,
    stop: StopSignal,
}

pub struct WorkerPool {
    size: usize,
    capacity: usize,
    metrics: MetricsCalculator,
    state: RwLock<PoolState>,
    results: Mutex<Option<Receiver<JobResult>>>,
}

impl WorkerPool {
    /// A stopped pool of `size` workers (at least one) with queues of `capacity` slots.
    #[must_use]
    pub fn new(size: usize, capacity: usize) -> Self {
        Self {
            size: size.max(1),
            capacity: capacity.max(1),
            metrics: MetricsCalculator::new(),
            state: RwLock::new(PoolState::default()),
            results: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.read().running
    }

    /// Spawns the workers. Does nothing if already running.
    ///
    /// # Errors
    /// Returns an error if a worker thread cannot be spawned.
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.write();
        if state.running {
            return Ok(());
        }

        let (job_tx, job_rx) = mpsc::sync_channel::<Job>(self.capacity);
        let (result_tx, result_rx) = mpsc::sync_channel::<JobResult>(self.capacity);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let stop = StopSignal::new();

        let mut workers = Vec::with_capacity(self.size);
        for id in 0..self.size {
            let jobs = Arc::clone(&job_rx);
            let results = result_tx.clone();
            let worker_stop = stop.clone();
            let metrics = self.metrics;
            let spawned = thread::Builder::new()
                .name(format!("codegauge-worker-{id}"))
                .spawn(move || worker_loop(id, &jobs, &results, &worker_stop, metrics));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    stop.stop();
                    drop(job_tx);
                    join_all(workers);
                    return Err(e.into());
                }
            }
        }

        tracing::debug!(workers = self.size, capacity = self.capacity, "worker pool started");
        *state = PoolState {
            running: true,
            workers,
            jobs: Some(job_tx),
            stop,
        };
        *self.results.lock() = Some(result_rx);
        Ok(())
    }

    /// Signals every worker to exit after its current job and waits for them.
    /// Does nothing if already stopped.
    pub fn stop(&self) {
        let mut state = self.state.write();
        if !state.running {
            return;
        }
        state.stop.stop();
        state.jobs = None;
        // Unblocks workers waiting to hand over a result.
        *self.results.lock() = None;
        join_all(std::mem::take(&mut state.workers));
        state.running = false;
        tracing::debug!("worker pool stopped");
    }

    /// Queues a job without blocking.
    ///
    /// # Errors
    /// Hands the job back with `QueueFull` when the queue has no free slot, or
    /// with `PoolStopped` when the pool is not running.
    pub fn try_submit(&self, job: Job) -> std::result::Result<(), Rejected> {
        let state = self.state.read();
        let Some(sender) = state.jobs.as_ref().filter(|_| state.running) else {
            return Err(Rejected {
                job,
                reason: GaugeError::PoolStopped,
            });
        };
        match sender.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(job)) => Err(Rejected {
                job,
                reason: GaugeError::QueueFull {
                    capacity: self.capacity,
                },
            }),
            Err(TrySendError::Disconnected(job)) => Err(Rejected {
                job,
                reason: GaugeError::PoolStopped,
            }),
        }
    }

    /// Waits up to `timeout` for the next result. `Ok(None)` means nothing arrived.
    ///
    /// # Errors
    /// Returns `PoolStopped` if the pool is not running.
    pub fn recv_result(&self, timeout: Duration) -> Result<Option<JobResult>> {
        let guard = self.results.lock();
        let Some(receiver) = guard.as_ref() else {
            return Err(GaugeError::PoolStopped);
        };
        match receiver.recv_timeout(timeout) {
            Ok(result) => Ok(Some(result)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(GaugeError::PoolStopped),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

fn join_all(workers: Vec<thread::JoinHandle<()>>) {
    for handle in workers {
        if handle.join().is_err() {
            tracing::warn!("worker thread panicked outside a job");
        }
    }
}

fn worker_loop(
    id: usize,
    jobs: &Mutex<Receiver<Job>>,
    results: &SyncSender<JobResult>,
    stop: &StopSignal,
    metrics: MetricsCalculator,
) {
    while !stop.is_stopped() {
        let next = jobs.lock().recv_timeout(POLL_INTERVAL);
        match next {
            Ok(job) => {
                let result = run_job(job, metrics);
                if results.send(result).is_err() {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::trace!(worker = id, "worker exiting");
}

/// Parses and enriches one job. Parser panics become soft failures.
pub(crate) fn run_job(job: Job, metrics: MetricsCalculator) -> JobResult {
    let Job {
        path,
        content,
        parser,
    } = job;

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        parser
            .parse(&path, &content)
            .map(|parsed| metrics.enrich(parsed, &content, parser.comment_syntax()))
    }))
    .unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::warn!(path = %path.display(), %message, "parser panicked");
        Err(GaugeError::Parse {
            path: path.clone(),
            message: format!("parser panicked: {message}"),
        })
    });

    JobResult { path, outcome }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PythonParser;
    use std::path::Path;

    struct Sleepy;

    impl Parser for Sleepy {
        fn parse(&self, path: &Path, _content: &[u8]) -> Result<AnalysisResult> {
            thread::sleep(Duration::from_millis(20));
            Ok(AnalysisResult::new(path, "Sleepy"))
        }
        fn supported_extensions(&self) -> Vec<String> {
            vec![".zz".into()]
        }
        fn language_name(&self) -> &str {
            "Sleepy"
        }
    }

    /// Records when its parse starts and when it finishes.
    #[derive(Default)]
    struct Tracked {
        started: AtomicBool,
        finished: AtomicBool,
    }

    impl Parser for Tracked {
        fn parse(&self, path: &Path, _content: &[u8]) -> Result<AnalysisResult> {
            self.started.store(true, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(200));
            self.finished.store(true, Ordering::SeqCst);
            Ok(AnalysisResult::new(path, "Tracked"))
        }
        fn supported_extensions(&self) -> Vec<String> {
            vec![".tr".into()]
        }
        fn language_name(&self) -> &str {
            "Tracked"
        }
    }

    struct Panicky;

    impl Parser for Panicky {
        fn parse(&self, _path: &Path, _content: &[u8]) -> Result<AnalysisResult> {
            panic!("boom");
        }
        fn supported_extensions(&self) -> Vec<String> {
            vec![".boom".into()]
        }
        fn language_name(&self) -> &str {
            "Panicky"
        }
    }

    fn job(name: &str, parser: Arc<dyn Parser>) -> Job {
        Job {
            path: PathBuf::from(name),
            content: b"x = 1\n".to_vec(),
            parser,
        }
    }

    fn wait_result(pool: &WorkerPool) -> JobResult {
        for _ in 0..200 {
            if let Some(r) = pool.recv_result(POLL_INTERVAL).unwrap() {
                return r;
            }
        }
        panic!("no result within timeout");
    }

    #[test]
    fn test_lifecycle_is_idempotent() {
        let pool = WorkerPool::new(2, 4);
        assert!(!pool.is_running());
        pool.stop();
        pool.start().unwrap();
        pool.start().unwrap();
        assert!(pool.is_running());
        pool.stop();
        pool.stop();
        assert!(!pool.is_running());
    }

    #[test]
    fn test_zero_size_means_one_worker() {
        assert_eq!(WorkerPool::new(0, 0).size(), 1);
    }

    #[test]
    fn test_submit_when_stopped() {
        let pool = WorkerPool::new(1, 1);
        let rejected = pool.try_submit(job("a.py", Arc::new(PythonParser::new()))).unwrap_err();
        assert!(matches!(rejected.reason, GaugeError::PoolStopped));
        assert!(matches!(pool.recv_result(POLL_INTERVAL), Err(GaugeError::PoolStopped)));
    }

    #[test]
    fn test_runs_and_enriches() {
        let pool = WorkerPool::new(2, 4);
        pool.start().unwrap();
        pool.try_submit(job("a.py", Arc::new(PythonParser::new()))).unwrap();
        let result = wait_result(&pool);
        let analysis = result.outcome.unwrap();
        assert_eq!(analysis.language, "Python");
        assert_eq!(analysis.line_count, 1);
        assert_eq!(analysis.code_lines, 1);
        pool.stop();
    }

    #[test]
    fn test_queue_full_returns_job() {
        let pool = WorkerPool::new(1, 1);
        pool.start().unwrap();
        let parser: Arc<dyn Parser> = Arc::new(Sleepy);
        let mut saw_full = false;
        for i in 0..10 {
            if let Err(rejected) = pool.try_submit(job(&format!("{i}.zz"), Arc::clone(&parser))) {
                assert!(matches!(rejected.reason, GaugeError::QueueFull { capacity: 1 }));
                assert_eq!(rejected.job.path, PathBuf::from(format!("{i}.zz")));
                saw_full = true;
                break;
            }
        }
        assert!(saw_full);
        pool.stop();
    }

    #[test]
    fn test_panic_is_soft_failure() {
        let pool = WorkerPool::new(1, 2);
        pool.start().unwrap();
        pool.try_submit(job("bad.boom", Arc::new(Panicky))).unwrap();
        pool.try_submit(job("good.py", Arc::new(PythonParser::new()))).unwrap();

        let first = wait_result(&pool);
        assert!(matches!(first.outcome, Err(GaugeError::Parse { .. })));
        let second = wait_result(&pool);
        assert!(second.outcome.is_ok());
        pool.stop();
    }

    #[test]
    fn test_stop_signal() {
        let signal = StopSignal::new();
        let clone = signal.clone();
        assert!(!clone.is_stopped());
        signal.stop();
        assert!(clone.is_stopped());
    }

    #[test]
    fn test_stop_waits_for_in_flight_job() {
        let pool = WorkerPool::new(1, 1);
        pool.start().unwrap();
        let tracked = Arc::new(Tracked::default());
        pool.try_submit(job("slow.tr", Arc::clone(&tracked) as Arc<dyn Parser>))
            .unwrap();

        for _ in 0..200 {
            if tracked.started.load(Ordering::SeqCst) {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert!(tracked.started.load(Ordering::SeqCst));

        pool.stop();
        assert!(tracked.finished.load(Ordering::SeqCst));
        assert!(!pool.is_running());
        assert!(matches!(
            pool.try_submit(job("late.tr", tracked)).unwrap_err().reason,
            GaugeError::PoolStopped
        ));
    }
}
