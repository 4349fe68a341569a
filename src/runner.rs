//! Run orchestration
//!
//! Picks one of the three invocation modes, drives it to completion over a
//! shared browser, and returns the totals. Per-root failures are logged and
//! counted here; only configuration problems stop a run.

use crate::browser::Browser;
use crate::config::{validate_start_urls, Config};
use crate::crawler::{Crawler, LoadPolicy, Navigator};
use crate::extract::{ResourceExtractor, RootExtraction, RootProcessor};
use crate::output::{read_roots_file, RootsWriter, RunCounters, RunSummary};
use crate::{ConfigError, HarvestError};
use chrono::Utc;
use reqwest::Client;
use std::path::{Path, PathBuf};

/// Where the roots to harvest come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Read roots from a file; no crawl
    RootsFile(PathBuf),

    /// Crawl from seeds, then harvest every root found
    Batch(Vec<String>),

    /// Crawl from seeds, harvesting each root as it is found
    Streaming(Vec<String>),
}

impl RunMode {
    pub fn name(&self) -> &'static str {
        match self {
            RunMode::RootsFile(_) => "roots-file",
            RunMode::Batch(_) => "batch",
            RunMode::Streaming(_) => "streaming",
        }
    }
}

/// Chooses the run mode from the invocation flags
///
/// Exactly one of a roots file or a non-empty seed list must be given, and
/// streaming only applies to discovery.
///
/// # Arguments
///
/// * `roots_file` - `--roots-file` value
/// * `seeds` - `--discover` values
/// * `stream` - whether `--stream` was passed
pub fn select_mode(
    roots_file: Option<PathBuf>,
    seeds: Vec<String>,
    stream: bool,
) -> Result<RunMode, ConfigError> {
    match (roots_file, seeds.is_empty()) {
        (Some(_), false) => Err(ConfigError::ConflictingModes(
            "--roots-file and --discover were both given".to_string(),
        )),
        (Some(_), true) if stream => Err(ConfigError::ConflictingModes(
            "--stream only applies to --discover".to_string(),
        )),
        (Some(path), true) => Ok(RunMode::RootsFile(path)),
        (None, true) => Err(ConfigError::NoModeSelected),
        (None, false) => {
            validate_start_urls(&seeds)?;
            if stream {
                Ok(RunMode::Streaming(seeds))
            } else {
                Ok(RunMode::Batch(seeds))
            }
        }
    }
}

/// Runs one invocation to completion
///
/// # Arguments
///
/// * `browser` - Shared browsing context, already carrying the session
/// * `config` - Effective configuration
/// * `client` - HTTP client carrying the session cookies
/// * `mode` - The selected run mode
/// * `save_roots` - Optional file to record discovered roots in
///
/// # Returns
///
/// * `Ok(RunSummary)` - Totals of the run
/// * `Err(HarvestError)` - The output directory or roots file was unusable
pub async fn run<B: Browser>(
    browser: &B,
    config: &Config,
    client: Client,
    mode: RunMode,
    save_roots: Option<&Path>,
) -> Result<RunSummary, HarvestError> {
    let started_at = Utc::now();
    let out_dir = config.output.out_dir.clone();
    tokio::fs::create_dir_all(&out_dir).await?;

    let extractor = ResourceExtractor::new(config.extraction.clone(), client, &out_dir);
    let mut processor = RootExtraction::new(
        Navigator::new(browser, &config.navigation),
        LoadPolicy::root(&config.navigation),
        extractor,
    );
    let mut counters = RunCounters::default();

    match &mode {
        RunMode::RootsFile(path) => {
            let roots = read_roots_file(path, config.crawl.max_roots)?;
            tracing::info!("Loaded {} roots from {}", roots.len(), path.display());
            counters.roots_found = roots.len();
            process_roots(&mut processor, &roots, &mut counters).await;
        }

        RunMode::Batch(seeds) => {
            tracing::info!("Discovering roots from {} seed(s)", seeds.len());
            let outcome = Crawler::new(browser, config, seeds).discover_batch().await;
            counters += outcome.counters;

            if let Some(path) = save_roots {
                let mut sorted = outcome.roots.clone();
                sorted.sort();
                match RootsWriter::create(path).and_then(|w| w.write_all(&sorted)) {
                    Ok(()) => tracing::info!("Roots written to {}", path.display()),
                    Err(e) => tracing::warn!("Could not write roots to {}: {}", path.display(), e),
                }
            }

            if outcome.roots.is_empty() {
                tracing::warn!("No root pages found");
            } else {
                let roots: Vec<String> = outcome
                    .roots
                    .into_iter()
                    .take(config.crawl.max_roots)
                    .collect();
                tracing::info!("Preparing to process {} root(s)", roots.len());
                process_roots(&mut processor, &roots, &mut counters).await;
            }
        }

        RunMode::Streaming(seeds) => {
            tracing::info!("Streaming discovery from {} seed(s)", seeds.len());
            let mut writer = save_roots.and_then(|path| match RootsWriter::create(path) {
                Ok(writer) => Some(writer),
                Err(e) => {
                    tracing::warn!("Could not create {}: {}", path.display(), e);
                    None
                }
            });
            let outcome = Crawler::new(browser, config, seeds)
                .discover_streaming(&mut processor, writer.as_mut())
                .await;
            counters += outcome.counters;
        }
    }

    counters += *processor.counters();

    Ok(RunSummary {
        mode: mode.name().to_string(),
        counters,
        started_at,
        finished_at: Utc::now(),
        out_dir,
    })
}

/// Harvests roots one after another; a failing root never stops the rest
async fn process_roots<P: RootProcessor>(
    processor: &mut P,
    roots: &[String],
    counters: &mut RunCounters,
) {
    for (i, root) in roots.iter().enumerate() {
        tracing::debug!("Root {}/{}", i + 1, roots.len());
        if let Err(e) = processor.process_root(root).await {
            tracing::warn!("Root {} failed: {}", root, e);
            counters.roots_failed += 1;
        }
    }
}
