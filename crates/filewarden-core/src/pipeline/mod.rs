/// Pipeline module - wires the watcher, queue, workers and sink together.
///
/// ```text
/// filesystem ─▶ DirectoryWatcher ─▶ ScanQueue ─▶ ScanWorker × N ─▶ ResultSink
///                                                     │
///                                                     └─▶ QuarantineManager
/// ```
///
/// One watcher thread produces, `config.workers` threads consume.  All of
/// them share one [`CancelToken`]; cancelling it stops the watcher at its
/// next sleep and each worker at its next dequeue.  In-flight scans finish.
pub mod events;
pub mod worker;

pub use events::PipelineEvent;
pub use worker::ScanWorker;

use crate::cancel::CancelToken;
use crate::config::{ConfigError, ScanConfig};
use crate::model::ScanResult;
use crate::quarantine::QuarantineManager;
use crate::queue::ScanQueue;
use crate::scanner::RiskScanner;
use crate::sink::ResultSink;
use crate::watcher::{spawn_watcher, DirectoryWatcher};

use crossbeam_channel::Receiver;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tracing::info;

/// Maximum number of events that may queue up for the frontend.
///
/// Producers use `try_send`, so a frontend that stops draining loses events
/// (never results, which are in the sink) instead of stalling the pipeline.
pub const EVENT_CHANNEL_CAPACITY: usize = 4_096;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot list watched directory {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Handle to a running pipeline.  Allows cancellation, receiving events,
/// and joining the background threads.
pub struct PipelineHandle {
    /// Events from the watcher and workers.
    pub events_rx: Receiver<PipelineEvent>,
    cancel: CancelToken,
    queue: ScanQueue,
    threads: Vec<thread::JoinHandle<()>>,
}

impl PipelineHandle {
    /// Request every pipeline thread to stop.  Non-blocking.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Clone of the shared token, e.g. for a Ctrl+C handler.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Files discovered but not yet picked up by a worker.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Cancel and wait for every thread to exit.
    pub fn shutdown(self) {
        self.cancel();
        self.join();
    }

    /// Wait for every thread to exit.  Blocks forever unless cancelled.
    pub fn join(self) {
        for handle in self.threads {
            let _ = handle.join();
        }
        info!("Pipeline stopped");
    }
}

fn build_worker(config: &ScanConfig, sink: Arc<dyn ResultSink>) -> ScanWorker {
    ScanWorker::new(
        Arc::new(RiskScanner::new(config.heuristics.clone())),
        Arc::new(QuarantineManager::new(&config.quarantine_dir)),
        sink,
    )
}

/// Start the watcher and the workers on background threads.
pub fn start_pipeline(
    config: &ScanConfig,
    sink: Arc<dyn ResultSink>,
) -> Result<PipelineHandle, PipelineError> {
    config.validate()?;

    let (events_tx, events_rx) =
        crossbeam_channel::bounded::<PipelineEvent>(EVENT_CHANNEL_CAPACITY);
    let cancel = CancelToken::new();
    let queue = ScanQueue::new();
    let worker = build_worker(config, sink);
    let worker_count = config.effective_workers();

    info!(
        "Starting pipeline on {} with {} worker(s), quarantine at {}",
        config.watch_dir.display(),
        worker_count,
        config.quarantine_dir.display()
    );

    let mut threads = Vec::with_capacity(worker_count + 1);
    threads.push(spawn_watcher(
        DirectoryWatcher::new(&config.watch_dir),
        queue.clone(),
        cancel.clone(),
        config.poll_interval(),
        events_tx.clone(),
    ));

    for id in 0..worker_count {
        let worker = worker.clone();
        let queue = queue.clone();
        let cancel = cancel.clone();
        let events = events_tx.clone();
        let handle = thread::Builder::new()
            .name(format!("filewarden-worker-{id}"))
            .spawn(move || worker.run(id, &queue, &cancel, &events))
            .expect("failed to spawn worker thread");
        threads.push(handle);
    }

    Ok(PipelineHandle {
        events_rx,
        cancel,
        queue,
        threads,
    })
}

/// Scan the current contents of the watched directory once, on the calling
/// thread, in file-name order.  Every result is also recorded in `sink`.
pub fn scan_once(
    config: &ScanConfig,
    sink: Arc<dyn ResultSink>,
) -> Result<Vec<ScanResult>, PipelineError> {
    config.validate()?;

    let mut watcher = DirectoryWatcher::new(&config.watch_dir);
    let entries = watcher.poll().map_err(|source| PipelineError::Watch {
        path: watcher.dir().to_path_buf(),
        source,
    })?;
    info!("One-shot scan of {} file(s)", entries.len());

    let worker = build_worker(config, sink);
    Ok(entries
        .iter()
        .map(|entry| worker.process(&entry.path))
        .collect())
}
