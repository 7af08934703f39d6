/// Directory watcher - polls one folder and emits every new regular file
/// exactly once per session.
///
/// # Seen-set
///
/// The set of already-queued absolute paths is a private field of
/// [`DirectoryWatcher`], which is moved into the watcher thread and owned
/// there exclusively.  Entries are never removed, so a file that is deleted
/// and recreated under the same name is not rescanned until the watcher is
/// restarted.
///
/// # Cancellation
///
/// The thread sleeps between listings by waiting on the [`CancelToken`], so
/// a stop request interrupts the sleep instead of waiting out the interval.
/// The watcher never closes or drains the queue.
use crate::cancel::CancelToken;
use crate::model::WatchEntry;
use crate::pipeline::PipelineEvent;
use crate::queue::ScanQueue;
use crossbeam_channel::Sender;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct DirectoryWatcher {
    dir: PathBuf,
    seen: HashSet<PathBuf>,
}

impl DirectoryWatcher {
    /// Create a watcher for `dir`.  Relative paths are resolved against the
    /// current working directory so every emitted path is absolute.
    pub fn new(dir: &Path) -> Self {
        let dir = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
        Self {
            dir,
            seen: HashSet::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of distinct paths emitted so far.
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// List the directory once and return the regular files not seen before,
    /// sorted by file name.  Newly returned paths are added to the seen-set.
    pub fn poll(&mut self) -> io::Result<Vec<WatchEntry>> {
        let mut fresh: Vec<PathBuf> = Vec::new();

        for entry in std::fs::read_dir(&self.dir)? {
            // A single unreadable entry must not hide the rest of the listing.
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    debug!("Watcher: skipping unreadable entry in {:?}: {}", self.dir, err);
                    continue;
                }
            };
            let path = entry.path();
            if self.seen.contains(&path) {
                continue;
            }
            // Follows symlinks; vanished files simply fail the check.
            let is_file = std::fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false);
            if is_file {
                fresh.push(path);
            }
        }

        fresh.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(fresh
            .into_iter()
            .filter(|p| self.seen.insert(p.clone()))
            .map(WatchEntry::new)
            .collect())
    }

    /// Poll and push every new entry into `queue`, reporting each to `events`.
    ///
    /// Listing errors are logged and reported; they never stop the watcher.
    pub fn tick(&mut self, queue: &ScanQueue, events: &Sender<PipelineEvent>) -> usize {
        match self.poll() {
            Ok(entries) => {
                let count = entries.len();
                for entry in entries {
                    debug!("Watcher: queued {}", entry.path.display());
                    let _ = events.try_send(PipelineEvent::Queued {
                        path: entry.path.clone(),
                    });
                    queue.push(entry);
                }
                count
            }
            Err(err) => {
                warn!("Watcher: failed to list {}: {}", self.dir.display(), err);
                let _ = events.try_send(PipelineEvent::WatchError {
                    path: self.dir.clone(),
                    message: err.to_string(),
                });
                0
            }
        }
    }

    /// Run until `cancel` fires: one immediate listing, then one per `interval`.
    pub fn run(
        mut self,
        queue: ScanQueue,
        cancel: CancelToken,
        interval: Duration,
        events: Sender<PipelineEvent>,
    ) {
        info!("Watcher: watching {}", self.dir.display());

        let initial = self.tick(&queue, &events);
        info!("Watcher: {} existing file(s) queued", initial);

        while !cancel.wait_timeout(interval) {
            let added = self.tick(&queue, &events);
            if added > 0 {
                info!("Watcher: {} new file(s) detected", added);
            }
        }

        debug!("Watcher: stopped for {}", self.dir.display());
    }
}

/// Spawn the watcher on a named background thread.
pub fn spawn_watcher(
    watcher: DirectoryWatcher,
    queue: ScanQueue,
    cancel: CancelToken,
    interval: Duration,
    events: Sender<PipelineEvent>,
) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("filewarden-watcher".to_owned())
        .spawn(move || watcher.run(queue, cancel, interval, events))
        .expect("failed to spawn watcher thread")
}
