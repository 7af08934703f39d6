/// FileWarden Core - watcher, risk scoring, quarantine and result sink.
///
/// This crate contains all pipeline logic with zero UI dependencies.
/// Frontends (the headless runner, an interactive status view) consume the
/// same [`model`] types and the [`pipeline::PipelineHandle`] event stream.
///
/// # Modules
///
/// - [`cancel`] - Cancellation token shared by every pipeline thread.
/// - [`config`] - Tunable configuration surface (paths, weights, thresholds).
/// - [`model`] - `WatchEntry`, `ScanResult`, `QuarantineRecord` and summaries.
/// - [`scanner`] - Stateless risk scoring: extension, entropy, token checks.
/// - [`watcher`] - Polling directory watcher with a private seen-set.
/// - [`queue`] - Unbounded FIFO hand-off between watcher and workers.
/// - [`quarantine`] - Collision-free, all-or-nothing file relocation.
/// - [`pipeline`] - Thread orchestration, workers and cancellation.
/// - [`sink`] - Result sink trait and the in-memory live buffer.
/// - [`status`] - Event-draining status board for interactive frontends.
pub mod cancel;
pub mod config;
pub mod model;
pub mod pipeline;
pub mod quarantine;
pub mod queue;
pub mod scanner;
pub mod sink;
pub mod status;
pub mod watcher;

pub use cancel::CancelToken;
pub use config::{ConfigError, HeuristicConfig, ScanConfig};
pub use model::{Outcome, QuarantineRecord, ResultSummary, ScanResult, WatchEntry};
pub use pipeline::{scan_once, start_pipeline, PipelineError, PipelineEvent, PipelineHandle};
pub use quarantine::{QuarantineError, QuarantineManager};
pub use scanner::{Assessment, RiskScanner};
pub use sink::{MemorySink, ResultSink};
pub use status::StatusBoard;
