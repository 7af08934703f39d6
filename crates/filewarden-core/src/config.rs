/// Configuration surface - every path, interval, weight and threshold the
/// pipeline uses.
///
/// Loaded from an optional JSON file; every field has a default so a
/// partial file (or no file at all) is valid.  The runner applies
/// command-line overrides on top before calling [`ScanConfig::validate`].
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Maximum meaningful entropy for byte-oriented data (bits per byte).
pub const MAX_ENTROPY: f64 = 8.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Weights, thresholds and lists used by [`crate::scanner::RiskScanner`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    /// Score at or above which a file is quarantined.
    pub quarantine_threshold: u32,
    /// Entropy (bits/byte) that must be strictly exceeded to count as high.
    pub entropy_threshold: f64,
    pub extension_weight: u32,
    pub entropy_weight: u32,
    pub token_weight: u32,
    /// Deny-listed extensions. Leading dot and case are ignored.
    pub bad_extensions: Vec<String>,
    /// Case-sensitive substrings searched for in the decoded content.
    pub suspicious_tokens: Vec<String>,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            quarantine_threshold: 4,
            entropy_threshold: 7.5,
            extension_weight: 1,
            entropy_weight: 2,
            token_weight: 2,
            bad_extensions: vec![".exe".into(), ".bat".into(), ".js".into()],
            suspicious_tokens: vec![
                "powershell".into(),
                "cmd.exe".into(),
                "eval".into(),
                "exec".into(),
            ],
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory polled for new files.
    pub watch_dir: PathBuf,
    /// Root directory that receives quarantined files.
    pub quarantine_dir: PathBuf,
    /// Delay between two directory listings.
    pub poll_interval_ms: u64,
    /// Number of scan workers draining the queue. `0` means one per CPU.
    pub workers: usize,
    pub heuristics: HeuristicConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            watch_dir: PathBuf::from("./watch_folder"),
            quarantine_dir: PathBuf::from("./quarantine"),
            poll_interval_ms: 2_000,
            workers: 1,
            heuristics: HeuristicConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Read a JSON config file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Worker count with `0` resolved to the number of logical CPUs.
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.workers
        }
    }

    /// Reject values the pipeline cannot run with.
    ///
    /// Threshold layouts that break the "one weak signal is not enough, two
    /// are" rule are allowed but logged, since operators may tune on purpose.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let h = &self.heuristics;

        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than 0".into(),
            ));
        }
        if h.quarantine_threshold == 0 {
            return Err(ConfigError::Invalid(
                "quarantine_threshold must be greater than 0".into(),
            ));
        }
        if !(0.0..=MAX_ENTROPY).contains(&h.entropy_threshold) {
            return Err(ConfigError::Invalid(format!(
                "entropy_threshold must be within 0..={MAX_ENTROPY}, got {}",
                h.entropy_threshold
            )));
        }
        if self.watch_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("watch_dir must not be empty".into()));
        }
        if self.quarantine_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "quarantine_dir must not be empty".into(),
            ));
        }
        // Subdirectories are never listed, so only the folder itself clashes.
        if resolve_dir(&self.quarantine_dir) == resolve_dir(&self.watch_dir) {
            return Err(ConfigError::Invalid(format!(
                "quarantine_dir must differ from watch_dir ({})",
                self.watch_dir.display()
            )));
        }

        let weights = [h.extension_weight, h.entropy_weight, h.token_weight];
        if let Some(w) = weights.iter().find(|&&w| w >= h.quarantine_threshold) {
            warn!(
                "Config: a single heuristic (weight {}) reaches quarantine threshold {}",
                w, h.quarantine_threshold
            );
        }
        let best_pair = h.entropy_weight + h.token_weight.max(h.extension_weight);
        let best_pair = best_pair.max(h.token_weight + h.extension_weight);
        if best_pair < h.quarantine_threshold {
            warn!(
                "Config: no two heuristics combined reach quarantine threshold {}",
                h.quarantine_threshold
            );
        }

        Ok(())
    }
}

/// Absolute form of `dir` for comparison; symlinks are resolved when the
/// directory already exists.
fn resolve_dir(dir: &Path) -> PathBuf {
    std::fs::canonicalize(dir)
        .or_else(|_| std::path::absolute(dir))
        .unwrap_or_else(|_| dir.to_path_buf())
}
