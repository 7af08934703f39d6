/// Status board - the frontend-side view of a running pipeline.
///
/// Centralises the counters and recent log lines an interactive frontend
/// renders.  The pipeline threads communicate via the event channel; the
/// board is updated by [`StatusBoard::process_events`], which the frontend
/// calls once per frame (or per tick in the headless runner).
use crate::model::{Outcome, ScanResult};
use crate::pipeline::PipelineEvent;
use crossbeam_channel::Receiver;
use std::collections::VecDeque;

/// Maximum events drained per call.
///
/// Prevents a backlog (e.g. hundreds of files dropped at once) from
/// blocking a render thread for a perceptible duration.
pub const MAX_EVENTS_PER_FRAME: usize = 300;

/// Maximum log lines retained; older lines are evicted first.
pub const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Default)]
pub struct StatusBoard {
    pub queued: u64,
    pub scanned: u64,
    pub benign: u64,
    pub flagged: u64,
    pub quarantine_failed: u64,
    pub scan_errors: u64,
    pub watch_errors: u64,
    pub workers_stopped: usize,
    log: VecDeque<String>,
    /// Results seen since the last [`StatusBoard::take_new_results`] call.
    new_results: Vec<ScanResult>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain up to [`MAX_EVENTS_PER_FRAME`] events.
    ///
    /// Returns `true` if anything changed and the view should repaint.
    pub fn process_events(&mut self, rx: &Receiver<PipelineEvent>) -> bool {
        let mut changed = false;
        for _ in 0..MAX_EVENTS_PER_FRAME {
            match rx.try_recv() {
                Ok(event) => {
                    self.apply(event);
                    changed = true;
                }
                Err(_) => break,
            }
        }
        changed
    }

    pub fn apply(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::Queued { path } => {
                self.queued += 1;
                self.push_log(format!("Queued: {}", path.display()));
            }
            PipelineEvent::Scanned(result) => {
                self.scanned += 1;
                match result.outcome {
                    Outcome::Benign => self.benign += 1,
                    Outcome::Flagged => self.flagged += 1,
                    Outcome::QuarantineFailed => self.quarantine_failed += 1,
                    Outcome::ScanError => self.scan_errors += 1,
                }
                self.push_log(result.log_line());
                if let Some(record) = &result.quarantine {
                    self.push_log(format!(
                        "Quarantined: {} -> {}",
                        record.original_path.display(),
                        record.quarantined_path.display()
                    ));
                }
                self.new_results.push(*result);
            }
            PipelineEvent::WatchError { path, message } => {
                self.watch_errors += 1;
                self.push_log(format!("Watch error on {}: {}", path.display(), message));
            }
            PipelineEvent::WorkerStopped { .. } => {
                self.workers_stopped += 1;
            }
        }
    }

    /// Recent log lines, oldest first.
    pub fn log_lines(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(String::as_str)
    }

    /// Hand over the results received since the previous call.
    pub fn take_new_results(&mut self) -> Vec<ScanResult> {
        std::mem::take(&mut self.new_results)
    }

    /// Files queued but not yet reported as scanned.
    pub fn in_flight(&self) -> u64 {
        self.queued.saturating_sub(self.scanned)
    }

    fn push_log(&mut self, line: String) {
        if self.log.len() == MAX_LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back(line);
    }
}
