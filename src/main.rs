//! FileWarden - heuristic folder watcher with quarantine.
//!
//! Thin headless entry point. All pipeline logic lives in the
//! `filewarden-core` crate.

use anyhow::{Context, Result};
use clap::Parser;
use filewarden_core::{scan_once, start_pipeline, MemorySink, ScanConfig, StatusBoard};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// How often the runner drains pipeline events.
const STATUS_TICK: Duration = Duration::from_millis(200);

#[derive(Parser, Debug)]
#[command(name = "filewarden")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file; flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to watch.
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Quarantine root directory.
    #[arg(short, long)]
    quarantine: Option<PathBuf>,

    /// Milliseconds between directory listings.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Score at or above which files are quarantined.
    #[arg(short, long)]
    threshold: Option<u32>,

    /// Scan workers (0 = one per CPU).
    #[arg(short, long)]
    workers: Option<usize>,

    /// Scan the current folder contents once and exit.
    #[arg(long, default_value_t = false)]
    once: bool,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Result<(ScanConfig, bool)> {
        let mut config = match &self.config {
            Some(path) => ScanConfig::load(path)?,
            None => ScanConfig::default(),
        };
        if let Some(dir) = self.dir {
            config.watch_dir = dir;
        }
        if let Some(q) = self.quarantine {
            config.quarantine_dir = q;
        }
        if let Some(ms) = self.interval_ms {
            config.poll_interval_ms = ms;
        }
        if let Some(t) = self.threshold {
            config.heuristics.quarantine_threshold = t;
        }
        if let Some(w) = self.workers {
            config.workers = w;
        }
        config.validate()?;
        Ok((config, self.once))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let (config, once) = args.into_config()?;

    std::fs::create_dir_all(&config.watch_dir).with_context(|| {
        format!(
            "Failed to create watch directory {}",
            config.watch_dir.display()
        )
    })?;

    let sink = Arc::new(MemorySink::new());

    if once {
        scan_once(&config, sink.clone())?;
    } else {
        run_watch(&config, sink.clone())?;
    }

    let summary = sink.summary();
    info!(
        "Summary: {} scanned, {} benign, {} quarantined, {} quarantine failures, {} scan errors (max score {})",
        summary.total,
        summary.benign,
        summary.flagged,
        summary.quarantine_failed,
        summary.scan_errors,
        summary.max_score
    );
    Ok(())
}

/// Watch until Ctrl+C, pumping the status board on a fixed tick.
fn run_watch(config: &ScanConfig, sink: Arc<MemorySink>) -> Result<()> {
    let handle = start_pipeline(config, sink)?;

    let token = handle.cancel_token();
    ctrlc::set_handler(move || token.cancel()).context("Failed to set Ctrl+C handler")?;

    info!("Monitoring started. Press Ctrl+C to stop.");

    let mut board = StatusBoard::new();
    let cancel = handle.cancel_token();
    while !cancel.wait_timeout(STATUS_TICK) {
        if board.process_events(&handle.events_rx) {
            for result in board.take_new_results() {
                if result.is_flagged() {
                    info!(
                        "ALERT {} ({}): {}",
                        result.path.display(),
                        result.outcome,
                        result.reasons.join(" | ")
                    );
                }
            }
        }
    }

    info!("Stopping; {} file(s) were still queued", handle.pending());
    handle.join();
    Ok(())
}
