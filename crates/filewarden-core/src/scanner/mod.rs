/// Risk scanner - stateless, additive heuristics over one file's content.
///
/// Three independent checks each contribute a configured weight:
///
/// | check      | default weight | reason                         |
/// |------------|----------------|--------------------------------|
/// | extension  | 1              | `Bad file extension`           |
/// | entropy    | 2              | `High entropy: <H:.2>`         |
/// | tokens     | 2              | `Suspicious strings: a, b`     |
///
/// Scoring is a pure function of the bytes and the file extension, so a
/// caller can always reconstruct *why* a score was assigned from `reasons`.
/// Read failures never propagate: they become an `Error scanning:` reason.
pub mod entropy;

use crate::config::HeuristicConfig;
use std::path::Path;

pub use entropy::shannon_entropy;

/// The heuristic verdict for a single file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Assessment {
    pub score: u32,
    pub entropy: f64,
    pub found_tokens: Vec<String>,
    pub reasons: Vec<String>,
    /// Set when the file could not be read; `reasons` then ends with
    /// the matching `Error scanning:` entry.
    pub error: Option<String>,
}

/// Immutable scoring engine. Cheap to share between workers behind an `Arc`.
#[derive(Debug, Clone)]
pub struct RiskScanner {
    config: HeuristicConfig,
    /// Deny-list normalised to lowercase without the leading dot.
    bad_extensions: Vec<String>,
}

impl RiskScanner {
    pub fn new(config: HeuristicConfig) -> Self {
        let bad_extensions = config
            .bad_extensions
            .iter()
            .map(|e| normalise_extension(e))
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            config,
            bad_extensions,
        }
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    /// `true` if `score` reaches the configured quarantine threshold.
    pub fn exceeds_threshold(&self, score: u32) -> bool {
        score >= self.config.quarantine_threshold
    }

    /// Read the whole file and score it.
    pub fn score(&self, path: &Path) -> Assessment {
        match read_regular_file(path) {
            Ok(data) => self.score_bytes(path, &data),
            Err(err) => {
                let message = err.to_string();
                Assessment {
                    reasons: vec![format!("Error scanning: {message}")],
                    error: Some(message),
                    ..Assessment::default()
                }
            }
        }
    }

    /// Score already-loaded content. `path` is only consulted for its extension.
    pub fn score_bytes(&self, path: &Path, data: &[u8]) -> Assessment {
        let mut out = Assessment::default();

        if self.has_bad_extension(path) {
            out.score += self.config.extension_weight;
            out.reasons.push("Bad file extension".to_string());
        }

        out.entropy = shannon_entropy(data);
        if out.entropy > self.config.entropy_threshold {
            out.score += self.config.entropy_weight;
            out.reasons.push(format!("High entropy: {:.2}", out.entropy));
        }

        out.found_tokens = self.find_tokens(data);
        if !out.found_tokens.is_empty() {
            out.score += self.config.token_weight;
            out.reasons
                .push(format!("Suspicious strings: {}", out.found_tokens.join(", ")));
        }

        out
    }

    /// Check the lowercase extension of `path` against the deny-list.
    pub fn has_bad_extension(&self, path: &Path) -> bool {
        match path.extension().map(|e| e.to_string_lossy()) {
            Some(ext) => {
                let ext = ext.to_lowercase();
                self.bad_extensions.iter().any(|bad| *bad == ext)
            }
            None => false,
        }
    }

    /// Case-sensitive substring search over lossily decoded content.
    ///
    /// Matches are reported in configuration order, each at most once.
    pub fn find_tokens(&self, data: &[u8]) -> Vec<String> {
        let text = String::from_utf8_lossy(data);
        let mut found: Vec<String> = Vec::new();
        for token in &self.config.suspicious_tokens {
            if token.is_empty() || found.contains(token) {
                continue;
            }
            if text.contains(token.as_str()) {
                found.push(token.clone());
            }
        }
        found
    }
}

/// `".EXE"` → `"exe"`, `"bat"` → `"bat"`.
fn normalise_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Read the full content of a regular file.
///
/// Directories and other non-regular entries are rejected up front so the
/// error message is meaningful on every platform.
fn read_regular_file(path: &Path) -> std::io::Result<Vec<u8>> {
    let meta = std::fs::metadata(path)?;
    if !meta.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a regular file",
        ));
    }
    std::fs::read(path)
}
