/// Records that flow through the pipeline.
///
/// All three types are created exactly once and never mutated afterwards;
/// `ScanResult` is the unit consumed by result sinks and status views.
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A file observed by the watcher for the first time in this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEntry {
    /// Absolute path of the discovered file.
    pub path: PathBuf,
    /// Wall-clock time the watcher first saw the path.
    pub discovered_at: DateTime<Local>,
}

impl WatchEntry {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            discovered_at: Local::now(),
        }
    }
}

/// Final disposition of one scanned file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Score below the quarantine threshold.
    Benign,
    /// Score at or above the threshold and the file was relocated.
    Flagged,
    /// Score at or above the threshold but relocation failed; file untouched.
    QuarantineFailed,
    /// The file could not be read.
    ScanError,
}

impl Outcome {
    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Benign => "benign",
            Self::Flagged => "flagged",
            Self::QuarantineFailed => "quarantine-failed",
            Self::ScanError => "scan-error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Proof of a successful relocation into the quarantine root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarantineRecord {
    pub original_path: PathBuf,
    pub quarantined_path: PathBuf,
    pub timestamp: DateTime<Local>,
    /// `true` when a cross-volume copy succeeded but deleting the original
    /// failed, leaving a duplicate behind.
    pub original_retained: bool,
}

/// Outcome of scanning a single file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub path: PathBuf,
    /// Sum of the weights of every triggered heuristic.
    pub score: u32,
    /// Shannon entropy of the content in bits per byte (0 when unreadable).
    pub entropy: f64,
    /// Matched suspicious tokens, in configuration order, without duplicates.
    pub found_tokens: Vec<String>,
    /// Human-readable explanation for every score contribution or failure.
    pub reasons: Vec<String>,
    pub timestamp: DateTime<Local>,
    pub outcome: Outcome,
    /// Present only when `outcome == Outcome::Flagged`.
    pub quarantine: Option<QuarantineRecord>,
}

impl ScanResult {
    /// `true` if the score reached the threshold (whether or not the
    /// relocation itself succeeded).
    pub fn is_flagged(&self) -> bool {
        matches!(self.outcome, Outcome::Flagged | Outcome::QuarantineFailed)
    }

    /// One-line log form:
    /// `Scanned: <path> | Score: <n> | Outcome: <o> | Reasons: <...>`.
    pub fn log_line(&self) -> String {
        format!(
            "Scanned: {} | Score: {} | Outcome: {} | Reasons: {}",
            self.path.display(),
            self.score,
            self.outcome,
            self.reasons.join(", ")
        )
    }
}
