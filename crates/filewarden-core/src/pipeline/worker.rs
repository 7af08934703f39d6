/// Scan worker - drains the queue, scores each file, quarantines the risky
/// ones and records every outcome.
use super::events::PipelineEvent;
use crate::cancel::CancelToken;
use crate::model::{Outcome, ScanResult};
use crate::quarantine::QuarantineManager;
use crate::queue::ScanQueue;
use crate::scanner::RiskScanner;
use crate::sink::ResultSink;
use chrono::Local;
use crossbeam_channel::Sender;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything a worker needs; cloned once per worker thread.
#[derive(Clone)]
pub struct ScanWorker {
    scanner: Arc<RiskScanner>,
    quarantine: Arc<QuarantineManager>,
    sink: Arc<dyn ResultSink>,
}

impl ScanWorker {
    pub fn new(
        scanner: Arc<RiskScanner>,
        quarantine: Arc<QuarantineManager>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            scanner,
            quarantine,
            sink,
        }
    }

    /// Scan one file, quarantine it if needed, and build its result.
    ///
    /// Does not record; see [`ScanWorker::process`].
    pub fn evaluate(&self, path: &Path) -> ScanResult {
        let assessment = self.scanner.score(path);
        let mut reasons = assessment.reasons;
        let mut quarantine = None;

        let outcome = if assessment.error.is_some() {
            Outcome::ScanError
        } else if self.scanner.exceeds_threshold(assessment.score) {
            match self.quarantine.quarantine(path) {
                Ok(record) => {
                    quarantine = Some(record);
                    Outcome::Flagged
                }
                Err(err) => {
                    warn!("Failed to quarantine {}: {}", path.display(), err);
                    reasons.push(format!("Quarantine failed: {err}"));
                    Outcome::QuarantineFailed
                }
            }
        } else {
            Outcome::Benign
        };

        ScanResult {
            path: path.to_path_buf(),
            score: assessment.score,
            entropy: assessment.entropy,
            found_tokens: assessment.found_tokens,
            reasons,
            timestamp: Local::now(),
            outcome,
            quarantine,
        }
    }

    /// Evaluate `path` and record the result in the sink.
    pub fn process(&self, path: &Path) -> ScanResult {
        let result = self.evaluate(path);
        info!("{}", result.log_line());
        self.sink.record(result.clone());
        result
    }

    /// Drain `queue` until `cancel` fires.  A scan already in progress when
    /// the token fires runs to completion.
    pub fn run(
        &self,
        id: usize,
        queue: &ScanQueue,
        cancel: &CancelToken,
        events: &Sender<PipelineEvent>,
    ) {
        debug!("Worker {}: started", id);
        while let Some(entry) = queue.pop(cancel) {
            let result = self.process(&entry.path);
            let _ = events.try_send(PipelineEvent::Scanned(Box::new(result)));
        }
        debug!("Worker {}: stopped", id);
        let _ = events.try_send(PipelineEvent::WorkerStopped { worker: id });
    }
}
