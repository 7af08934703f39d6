/// Pipeline events - lightweight messages sent from the watcher and worker
/// threads to whichever frontend is listening.
///
/// The authoritative record of results is the `ResultSink`; these messages
/// exist so a status view can update without polling the sink.
use crate::model::ScanResult;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// The watcher found a new file and queued it.
    Queued { path: PathBuf },
    /// A worker finished a file (already recorded in the sink).
    Scanned(Box<ScanResult>),
    /// A non-fatal watcher error (directory unreadable this tick).
    WatchError { path: PathBuf, message: String },
    /// A worker observed cancellation and exited.
    WorkerStopped { worker: usize },
}
