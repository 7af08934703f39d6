/// Aggregate counters over a batch of scan results.
use super::result::{Outcome, ScanResult};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResultSummary {
    pub total: u64,
    pub benign: u64,
    pub flagged: u64,
    pub quarantine_failed: u64,
    pub scan_errors: u64,
    /// Highest score seen, `0` for an empty batch.
    pub max_score: u32,
}

impl ResultSummary {
    pub fn from_results(results: &[ScanResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.add(result);
        }
        summary
    }

    pub fn add(&mut self, result: &ScanResult) {
        self.total += 1;
        self.max_score = self.max_score.max(result.score);
        match result.outcome {
            Outcome::Benign => self.benign += 1,
            Outcome::Flagged => self.flagged += 1,
            Outcome::QuarantineFailed => self.quarantine_failed += 1,
            Outcome::ScanError => self.scan_errors += 1,
        }
    }
}
