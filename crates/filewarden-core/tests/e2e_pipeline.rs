/// End-to-end pipeline integration tests.
///
/// These tests run the real watcher, queue, worker and quarantine code paths
/// against real temporary directories: threads are spawned, files are moved,
/// and results are read back from the shared `MemorySink`.  Nothing is mocked.
use filewarden_core::pipeline::EVENT_CHANNEL_CAPACITY;
use filewarden_core::{
    scan_once, start_pipeline, MemorySink, Outcome, PipelineEvent, ResultSink, ScanConfig,
    ScanResult, StatusBoard,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// 4 KiB covering every byte value equally: entropy 8.0 bits/byte.
fn random_padding() -> Vec<u8> {
    (0..16).flat_map(|_| 0u8..=255).collect()
}

/// Layout used by most tests:
///
/// ```text
/// tmp/
///   watch/
///     a.txt   benign text
///     b.bat   "powershell;" + high-entropy padding
///   quarantine/   (created on demand)
/// ```
fn build_scenario(tmp: &Path) -> ScanConfig {
    let watch = tmp.join("watch");
    fs::create_dir_all(&watch).unwrap();
    fs::write(watch.join("a.txt"), b"meeting notes for tuesday").unwrap();

    let mut bat = b"powershell; ".to_vec();
    bat.extend_from_slice(&random_padding());
    fs::write(watch.join("b.bat"), bat).unwrap();

    ScanConfig {
        watch_dir: watch,
        quarantine_dir: tmp.join("quarantine"),
        poll_interval_ms: 50,
        ..ScanConfig::default()
    }
}

/// Wait until the sink holds at least `n` results (or panic after 30 s).
fn wait_for_results(sink: &MemorySink, n: usize) -> Vec<ScanResult> {
    let deadline = Instant::now() + Duration::from_secs(30);
    loop {
        let records = sink.records();
        if records.len() >= n {
            return records;
        }
        assert!(
            Instant::now() < deadline,
            "expected {n} results within 30 seconds, got {}",
            records.len()
        );
        std::thread::sleep(Duration::from_millis(10));
    }
}

fn find<'a>(results: &'a [ScanResult], name: &str) -> &'a ScanResult {
    results
        .iter()
        .find(|r| r.path.file_name().is_some_and(|n| n == name))
        .unwrap_or_else(|| panic!("no result for {name}"))
}

fn files_in(dir: &Path) -> Vec<PathBuf> {
    match fs::read_dir(dir) {
        Ok(rd) => rd.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

/// Benign text stays put; the batch file with a suspicious token and random
/// padding is scored 5, flagged, and relocated with a timestamp prefix.
#[test]
fn pipeline_flags_and_quarantines_risky_file() {
    let tmp = TempDir::new().unwrap();
    let config = build_scenario(tmp.path());
    let sink = Arc::new(MemorySink::new());

    let handle = start_pipeline(&config, sink.clone()).expect("pipeline starts");
    let results = wait_for_results(&sink, 2);
    handle.shutdown();

    let a = find(&results, "a.txt");
    assert_eq!(a.outcome, Outcome::Benign);
    assert_eq!(a.score, 0);
    assert!(config.watch_dir.join("a.txt").exists());

    let b = find(&results, "b.bat");
    assert!(b.score >= 4, "b.bat scored {}", b.score);
    assert_eq!(b.outcome, Outcome::Flagged);
    assert_eq!(b.found_tokens, vec!["powershell".to_string()]);
    assert!(!config.watch_dir.join("b.bat").exists(), "original must be gone");

    let quarantined = files_in(&config.quarantine_dir);
    assert_eq!(quarantined.len(), 1, "exactly one quarantined file");
    let name = quarantined[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.ends_with("_b.bat"), "unexpected name {name}");
    assert_eq!(
        b.quarantine.as_ref().unwrap().quarantined_path,
        quarantined[0]
    );
}

/// Files dropped after startup are picked up on a later tick, exactly once.
#[test]
fn pipeline_detects_new_files_once() {
    let tmp = TempDir::new().unwrap();
    let config = build_scenario(tmp.path());
    let sink = Arc::new(MemorySink::new());

    let handle = start_pipeline(&config, sink.clone()).unwrap();
    wait_for_results(&sink, 2);

    fs::write(config.watch_dir.join("late.js"), b"console.log('hi')").unwrap();
    let results = wait_for_results(&sink, 3);
    let late = find(&results, "late.js");
    assert_eq!(late.score, 1);
    assert_eq!(late.outcome, Outcome::Benign);

    // Several more ticks must not re-queue anything.
    std::thread::sleep(Duration::from_millis(300));
    handle.shutdown();
    assert_eq!(sink.len(), 3);
}

/// An unusable quarantine root yields `QuarantineFailed` with the cause in
/// the reasons, keeps the original, and does not block later files.
#[test]
fn pipeline_survives_unwritable_quarantine() {
    let tmp = TempDir::new().unwrap();
    let mut config = build_scenario(tmp.path());
    let blocker = tmp.path().join("blocker");
    fs::write(&blocker, b"regular file, not a directory").unwrap();
    config.quarantine_dir = blocker.join("quarantine");
    let sink = Arc::new(MemorySink::new());

    let handle = start_pipeline(&config, sink.clone()).unwrap();
    wait_for_results(&sink, 2);

    fs::write(config.watch_dir.join("c.txt"), b"after the failure").unwrap();
    let results = wait_for_results(&sink, 3);
    handle.shutdown();

    let b = find(&results, "b.bat");
    assert_eq!(b.outcome, Outcome::QuarantineFailed);
    assert!(b.quarantine.is_none());
    assert!(
        b.reasons.iter().any(|r| r.contains("cannot create quarantine directory")),
        "reasons: {:?}",
        b.reasons
    );
    assert!(config.watch_dir.join("b.bat").exists());
    assert_eq!(find(&results, "c.txt").outcome, Outcome::Benign);
}

/// Several workers draining one queue scan every file exactly once.
#[test]
fn pipeline_with_multiple_workers_scans_each_file_once() {
    let tmp = TempDir::new().unwrap();
    let watch = tmp.path().join("watch");
    fs::create_dir_all(&watch).unwrap();
    for i in 0..40 {
        fs::write(watch.join(format!("doc{i:02}.txt")), format!("file {i}")).unwrap();
    }
    let config = ScanConfig {
        watch_dir: watch,
        quarantine_dir: tmp.path().join("q"),
        poll_interval_ms: 50,
        workers: 4,
        ..ScanConfig::default()
    };
    let sink = Arc::new(MemorySink::new());

    let handle = start_pipeline(&config, sink.clone()).unwrap();
    let results = wait_for_results(&sink, 40);
    std::thread::sleep(Duration::from_millis(200));
    handle.shutdown();

    assert_eq!(sink.len(), 40);
    let mut paths: Vec<&PathBuf> = results.iter().map(|r| &r.path).collect();
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 40, "a file was scanned twice");
}

/// Cancellation stops the watcher and all workers promptly even when the
/// poll interval is long and the queue is empty.
#[test]
fn shutdown_is_prompt_with_idle_workers() {
    let tmp = TempDir::new().unwrap();
    let mut config = build_scenario(tmp.path());
    config.poll_interval_ms = 60_000;
    config.workers = 3;
    let sink = Arc::new(MemorySink::new());

    let handle = start_pipeline(&config, sink.clone()).unwrap();
    wait_for_results(&sink, 2);

    let start = Instant::now();
    handle.shutdown();
    assert!(
        start.elapsed() < Duration::from_secs(10),
        "shutdown took {:?}",
        start.elapsed()
    );
}

/// The status board sees every queued and scanned file and each worker's
/// exit after shutdown.
#[test]
fn status_board_tracks_pipeline_events() {
    let tmp = TempDir::new().unwrap();
    let config = build_scenario(tmp.path());
    let sink = Arc::new(MemorySink::new());

    let handle = start_pipeline(&config, sink.clone()).unwrap();
    let events = handle.events_rx.clone();
    wait_for_results(&sink, 2);
    handle.shutdown();

    let mut board = StatusBoard::new();
    while board.process_events(&events) {}

    assert_eq!(board.queued, 2);
    assert_eq!(board.scanned, 2);
    assert_eq!(board.benign, 1);
    assert_eq!(board.flagged, 1);
    assert_eq!(board.workers_stopped, 1);
    assert!(board.log_lines().any(|l| l.starts_with("Quarantined: ")));
}

/// A missing watch directory is a recoverable watcher error, not a crash;
/// files appear once the directory exists.
#[test]
fn missing_watch_directory_is_retried() {
    let tmp = TempDir::new().unwrap();
    let watch = tmp.path().join("not-yet");
    let config = ScanConfig {
        watch_dir: watch.clone(),
        quarantine_dir: tmp.path().join("q"),
        poll_interval_ms: 50,
        ..ScanConfig::default()
    };
    let sink = Arc::new(MemorySink::new());
    let handle = start_pipeline(&config, sink.clone()).unwrap();

    let deadline = Instant::now() + Duration::from_secs(30);
    let mut saw_error = false;
    while !saw_error {
        assert!(Instant::now() < deadline, "no WatchError reported");
        if let Ok(PipelineEvent::WatchError { .. }) =
            handle.events_rx.recv_timeout(Duration::from_millis(100))
        {
            saw_error = true;
        }
    }

    fs::create_dir_all(&watch).unwrap();
    fs::write(watch.join("x.txt"), b"hello").unwrap();
    wait_for_results(&sink, 1);
    handle.shutdown();
}

/// `scan_once` processes the current contents synchronously.
#[test]
fn scan_once_processes_existing_files() {
    let tmp = TempDir::new().unwrap();
    let config = build_scenario(tmp.path());
    let sink = Arc::new(MemorySink::new());

    let results = scan_once(&config, sink.clone()).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].path.file_name().unwrap(), "a.txt");
    assert_eq!(results[1].outcome, Outcome::Flagged);
    assert_eq!(sink.len(), 2);
    assert_eq!(sink.summary().flagged, 1);
}

/// Invalid configuration is rejected before any thread starts.
#[test]
fn invalid_config_is_rejected() {
    let config = ScanConfig {
        poll_interval_ms: 0,
        ..ScanConfig::default()
    };
    assert!(start_pipeline(&config, Arc::new(MemorySink::new())).is_err());
}

/// Quarantining into the watched folder itself would feed every relocated
/// file back to the watcher, so the pipeline refuses to start.
#[test]
fn quarantine_inside_watched_folder_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let mut config = build_scenario(tmp.path());
    config.quarantine_dir = config.watch_dir.join(".");

    let err = start_pipeline(&config, Arc::new(MemorySink::new()))
        .err()
        .expect("pipeline must not start");
    assert!(err.to_string().contains("quarantine_dir must differ"));
    assert!(scan_once(&config, Arc::new(MemorySink::new())).is_err());
    assert!(config.watch_dir.join("b.bat").exists());
}

/// A quarantine root nested below the watched folder is never listed, so a
/// flagged file is relocated once and not picked up again.
#[test]
fn nested_quarantine_root_is_not_rescanned() {
    let tmp = TempDir::new().unwrap();
    let mut config = build_scenario(tmp.path());
    config.quarantine_dir = config.watch_dir.join("quarantine");
    let sink = Arc::new(MemorySink::new());

    let handle = start_pipeline(&config, sink.clone()).expect("pipeline starts");
    wait_for_results(&sink, 2);
    // Let the watcher run a few more 50 ms ticks.
    std::thread::sleep(Duration::from_millis(500));
    handle.shutdown();

    let results = sink.records();
    assert_eq!(results.len(), 2, "unexpected rescans: {results:?}");
    assert_eq!(sink.summary().flagged, 1);
    assert_eq!(files_in(&config.quarantine_dir).len(), 1);
}

const _: () = assert!(
    EVENT_CHANNEL_CAPACITY > 0,
    "EVENT_CHANNEL_CAPACITY must be > 0"
);
