/// Scan queue - unbounded FIFO hand-off between the watcher and workers.
///
/// Backed by a crossbeam MPMC channel: the watcher holds the producer side,
/// every worker holds a clone of the consumer side.  The producer is a
/// polling loop that is far slower than the scanners, so the queue is
/// deliberately unbounded.
///
/// [`ScanQueue::pop`] blocks until either work arrives or the cancellation
/// token fires, so idle workers cost no CPU.
use crate::cancel::CancelToken;
use crate::model::WatchEntry;
use crossbeam_channel::{select, Receiver, Sender};

#[derive(Clone)]
pub struct ScanQueue {
    tx: Sender<WatchEntry>,
    rx: Receiver<WatchEntry>,
}

impl Default for ScanQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanQueue {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded::<WatchEntry>();
        Self { tx, rx }
    }

    /// Append an entry. Never blocks.
    pub fn push(&self, entry: WatchEntry) {
        // Both ends live in `self`, so the channel cannot be disconnected here.
        let _ = self.tx.send(entry);
    }

    /// Number of entries waiting to be scanned.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Take the next entry without waiting.
    pub fn try_pop(&self) -> Option<WatchEntry> {
        self.rx.try_recv().ok()
    }

    /// Block until the next entry is available.
    ///
    /// Returns `None` once `cancel` has fired; an entry that races with the
    /// cancellation is left in the queue rather than handed out.
    pub fn pop(&self, cancel: &CancelToken) -> Option<WatchEntry> {
        if cancel.is_cancelled() {
            return None;
        }
        select! {
            recv(self.rx) -> msg => match msg {
                Ok(entry) if cancel.is_cancelled() => {
                    // Put it back so a later session or drain can still see it.
                    self.push(entry);
                    None
                }
                Ok(entry) => Some(entry),
                Err(_) => None,
            },
            recv(cancel.signal()) -> _ => None,
        }
    }

    /// Remove and return every entry currently queued.
    pub fn drain(&self) -> Vec<WatchEntry> {
        self.rx.try_iter().collect()
    }
}
