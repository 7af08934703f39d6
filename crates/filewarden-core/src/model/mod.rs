/// Data model for the scan pipeline.
///
/// Re-exports the immutable records produced by the watcher, the workers
/// and the quarantine manager, plus aggregate summaries.
pub mod result;
pub mod summary;

pub use result::{Outcome, QuarantineRecord, ScanResult, WatchEntry};
pub use summary::ResultSummary;
