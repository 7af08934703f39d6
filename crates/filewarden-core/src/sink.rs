/// Result sink - where finished `ScanResult`s go.
///
/// Durable storage and report rendering live outside this crate; they only
/// need [`ResultSink::record`] to receive results and
/// [`ResultSink::records`] to export them.  [`MemorySink`] is the in-process
/// implementation and doubles as the live buffer read by status views.
use crate::model::{ResultSummary, ScanResult};
use parking_lot::RwLock;

pub trait ResultSink: Send + Sync {
    /// Append one result.  Must not fail the pipeline.
    fn record(&self, result: ScanResult);

    /// Every result recorded so far, in recording order.
    fn records(&self) -> Vec<ScanResult>;

    fn len(&self) -> usize {
        self.records().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Append-only, in-memory result buffer.
///
/// Writers hold the lock only for a `Vec::push`; readers take snapshots.
/// Recording order is completion order, which may differ from queue order
/// when several workers run.
#[derive(Default)]
pub struct MemorySink {
    results: RwLock<Vec<ScanResult>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every result at index `offset` or later.
    ///
    /// Lets a reader that has already seen `offset` results fetch only the
    /// new ones.
    pub fn records_since(&self, offset: usize) -> Vec<ScanResult> {
        let results = self.results.read();
        results.get(offset..).map(<[_]>::to_vec).unwrap_or_default()
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary::from_results(&self.results.read())
    }
}

impl ResultSink for MemorySink {
    fn record(&self, result: ScanResult) {
        self.results.write().push(result);
    }

    fn records(&self) -> Vec<ScanResult> {
        self.results.read().clone()
    }

    fn len(&self) -> usize {
        self.results.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Outcome;
    use chrono::Local;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn result(name: &str) -> ScanResult {
        ScanResult {
            path: PathBuf::from(name),
            score: 0,
            entropy: 0.0,
            found_tokens: Vec::new(),
            reasons: Vec::new(),
            timestamp: Local::now(),
            outcome: Outcome::Benign,
            quarantine: None,
        }
    }

    #[test]
    fn test_records_keep_append_order() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());
        sink.record(result("a"));
        sink.record(result("b"));
        let paths: Vec<PathBuf> = sink.records().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_records_since_returns_only_new_entries() {
        let sink = MemorySink::new();
        sink.record(result("a"));
        sink.record(result("b"));
        sink.record(result("c"));
        assert_eq!(sink.records_since(2).len(), 1);
        assert_eq!(sink.records_since(3).len(), 0);
        assert_eq!(sink.records_since(99).len(), 0);
    }

    #[test]
    fn test_concurrent_writers_lose_nothing() {
        let sink = Arc::new(MemorySink::new());
        let writers: Vec<_> = (0..4)
            .map(|t| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for i in 0..250 {
                        sink.record(result(&format!("{t}-{i}")));
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }
        assert_eq!(sink.len(), 1_000);
        assert_eq!(sink.summary().benign, 1_000);
    }
}
