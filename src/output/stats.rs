//! Run counters and the final summary
//!
//! Counters only ever grow during one invocation and are never persisted.

use chrono::{DateTime, Utc};
use std::ops::AddAssign;
use std::path::PathBuf;

/// Totals accumulated over one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Pages handed out by the frontier (loaded or not)
    pub pages_visited: usize,

    /// Pages that could not be loaded
    pub pages_failed: usize,

    /// Distinct root pages found or supplied
    pub roots_found: usize,

    /// Roots whose extraction completed
    pub roots_processed: usize,

    /// Roots whose extraction failed
    pub roots_failed: usize,

    /// Files saved from click-triggered downloads
    pub click_downloads: usize,

    /// Files saved from direct fetches
    pub direct_downloads: usize,
}

impl RunCounters {
    pub fn files_downloaded(&self) -> usize {
        self.click_downloads + self.direct_downloads
    }
}

impl AddAssign for RunCounters {
    fn add_assign(&mut self, other: Self) {
        self.pages_visited += other.pages_visited;
        self.pages_failed += other.pages_failed;
        self.roots_found += other.roots_found;
        self.roots_processed += other.roots_processed;
        self.roots_failed += other.roots_failed;
        self.click_downloads += other.click_downloads;
        self.direct_downloads += other.direct_downloads;
    }
}

/// Final report of one run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub mode: String,
    pub counters: RunCounters,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub out_dir: PathBuf,
}

impl RunSummary {
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Prints the summary to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The summary to display
pub fn print_summary(summary: &RunSummary) {
    let c = &summary.counters;
    let out_dir = std::fs::canonicalize(&summary.out_dir).unwrap_or_else(|_| summary.out_dir.clone());

    println!();
    println!("=== Harvest Summary ({}) ===\n", summary.mode);

    if c.pages_visited > 0 {
        println!("Discovery:");
        println!("  Pages visited: {}", c.pages_visited);
        println!("  Pages failed: {}", c.pages_failed);
        println!();
    }

    println!("Roots:");
    println!("  Found: {}", c.roots_found);
    println!("  Processed: {}", c.roots_processed);
    println!("  Failed: {}", c.roots_failed);
    println!();

    println!("Files downloaded: {}", c.files_downloaded());
    println!("  via download controls: {}", c.click_downloads);
    println!("  via direct fetch: {}", c.direct_downloads);
    println!();

    println!(
        "Started {} / finished {} ({}s)",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        summary.finished_at.format("%Y-%m-%d %H:%M:%S UTC"),
        summary.duration_seconds()
    );
    println!("Output directory: {}", out_dir.display());
}
