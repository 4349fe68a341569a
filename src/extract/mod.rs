//! Resource extraction from root pages
//!
//! A loaded root page is first settled (scrolled, catalog sections
//! expanded), then harvested two ways:
//!
//! - **click downloads**: every visible download control is clicked in turn
//!   and any download it triggers is saved under its suggested name
//! - **direct fetch**: every resource link on the page is fetched over HTTP
//!   with the session cookies and saved if it really is the expected type
//!
//! Both write into one flat output directory; a later file with the same
//! name replaces an earlier one.

mod filename;

pub use filename::{
    disposition_filename, download_filename, ensure_resource_extension, resource_filename,
    sanitize,
};

use crate::browser::{Browser, ClickOutcome, DownloadSelectors, PageHandle};
use crate::config::ExtractionConfig;
use crate::crawler::{extract_links, fetch_resource, FetchResult, LoadPolicy, Navigator};
use crate::output::RunCounters;
use crate::url::is_resource;
use crate::HarvestError;
use reqwest::Client;
use std::path::{Path, PathBuf};
use url::Url;

/// How a file was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadVia {
    Click,
    Direct,
}

/// One file written to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRecord {
    pub source_url: String,
    pub filename: String,
    pub size: u64,
    pub via: DownloadVia,
}

/// What happened to one candidate download control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateStatus {
    Saved(String),
    NotVisible,
    NoDownload,
    Failed(String),
}

/// Everything one extraction produced
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub records: Vec<DownloadRecord>,

    /// Per-candidate results of the click strategy, in document order
    pub candidates: Vec<(usize, CandidateStatus)>,

    /// Resource links that were fetched but not saved
    pub direct_failures: usize,
}

impl ExtractionReport {
    /// Total files saved by both strategies
    pub fn downloaded(&self) -> usize {
        self.records.len()
    }

    pub fn count_via(&self, via: DownloadVia) -> usize {
        self.records.iter().filter(|r| r.via == via).count()
    }
}

/// Harvests resources from loaded root pages
pub struct ResourceExtractor {
    config: ExtractionConfig,
    client: Client,
    out_dir: PathBuf,
}

impl ResourceExtractor {
    /// Creates an extractor writing into `out_dir`
    ///
    /// `client` should carry the session cookies (see
    /// [`crate::crawler::build_http_client`]).
    pub fn new(config: ExtractionConfig, client: Client, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            client,
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Runs the settle step and both strategies on `page`
    ///
    /// A page where nothing is found yields an empty report, not an error.
    pub async fn extract<P: PageHandle>(&self, page: &P) -> ExtractionReport {
        let mut report = ExtractionReport::default();

        self.settle(page).await;
        self.click_downloads(page, &mut report).await;
        self.fetch_direct(page, &mut report).await;

        report
    }

    /// Scrolls, expands catalog sections, scrolls again
    async fn settle<P: PageHandle>(&self, page: &P) {
        let cfg = &self.config;

        if let Err(e) = page
            .scroll(cfg.pre_expand_scrolls, cfg.scroll_px, cfg.scroll_pause())
            .await
        {
            tracing::debug!("Scrolling {} failed: {}", page.url(), e);
        }

        self.expand(page).await;

        if let Err(e) = page
            .scroll(cfg.post_expand_scrolls, cfg.scroll_px, cfg.scroll_pause())
            .await
        {
            tracing::debug!("Scrolling {} failed: {}", page.url(), e);
        }
    }

    /// Clicks the first visible match of each expand label
    ///
    /// Returns how many controls were clicked; zero is normal.
    pub async fn expand<P: PageHandle>(&self, page: &P) -> usize {
        let mut clicked = 0;
        for label in &self.config.expand_labels {
            match page.click_text(label).await {
                Ok(true) => {
                    tracing::debug!("Expanded \"{}\" on {}", label, page.url());
                    clicked += 1;
                    tokio::time::sleep(self.config.expand_pause()).await;
                }
                Ok(false) => {}
                Err(e) => tracing::debug!("Expand \"{}\" failed on {}: {}", label, page.url(), e),
            }
        }
        clicked
    }

    async fn click_downloads<P: PageHandle>(&self, page: &P, report: &mut ExtractionReport) {
        let selectors = DownloadSelectors {
            text_labels: &self.config.download_labels,
            aria_labels: &self.config.aria_labels,
        };

        let candidates = match page.download_candidates(selectors).await {
            Ok(set) => set,
            Err(e) => {
                tracing::debug!("Could not locate download controls on {}: {}", page.url(), e);
                return;
            }
        };
        tracing::debug!("{} download candidates on {}", candidates.len(), page.url());

        for index in candidates.indices() {
            let outcome = page
                .click_download(
                    index,
                    self.config.click_timeout(),
                    self.config.download_timeout(),
                )
                .await;

            let status = match outcome {
                ClickOutcome::Downloaded(download) => {
                    let filename = download_filename(&download.suggested_filename, &self.config);
                    match self.save(&filename, &download.bytes).await {
                        Ok(size) => {
                            tracing::info!("click-download: {}", filename);
                            report.records.push(DownloadRecord {
                                source_url: download.url,
                                filename: filename.clone(),
                                size,
                                via: DownloadVia::Click,
                            });
                            CandidateStatus::Saved(filename)
                        }
                        Err(e) => {
                            tracing::warn!("Could not save {}: {}", filename, e);
                            CandidateStatus::Failed(e.to_string())
                        }
                    }
                }
                ClickOutcome::NotVisible => CandidateStatus::NotVisible,
                ClickOutcome::NoDownload => CandidateStatus::NoDownload,
                ClickOutcome::Failed(message) => {
                    tracing::trace!("Candidate {} on {}: {}", index, page.url(), message);
                    CandidateStatus::Failed(message)
                }
            };
            report.candidates.push((index, status));
        }
    }

    async fn fetch_direct<P: PageHandle>(&self, page: &P, report: &mut ExtractionReport) {
        let html = match page.html().await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Could not read {}: {}", page.url(), e);
                return;
            }
        };
        let Ok(base) = Url::parse(page.url()) else {
            tracing::warn!("Page has an unusable URL: {}", page.url());
            return;
        };

        let links: Vec<Url> = extract_links(&html, &base)
            .into_iter()
            .filter(|link| is_resource(link))
            .filter_map(|link| Url::parse(&link).ok())
            .collect();

        for link in links {
            match fetch_resource(&self.client, &link, &self.config).await {
                FetchResult::Success {
                    final_url,
                    filename,
                    bytes,
                } => match self.save(&filename, &bytes).await {
                    Ok(size) => {
                        tracing::info!("direct-fetch: {}", filename);
                        report.records.push(DownloadRecord {
                            source_url: final_url,
                            filename,
                            size,
                            via: DownloadVia::Direct,
                        });
                    }
                    Err(e) => {
                        tracing::warn!("Could not save {} from {}: {}", filename, link, e);
                        report.direct_failures += 1;
                    }
                },
                FetchResult::ContentMismatch { content_type } => {
                    tracing::warn!("Skipping {}: content type is {:?}", link, content_type);
                    report.direct_failures += 1;
                }
                FetchResult::HttpError { status_code } => {
                    tracing::warn!("Skipping {}: HTTP {}", link, status_code);
                    report.direct_failures += 1;
                }
                FetchResult::NetworkError { error } => {
                    tracing::warn!("Direct fetch failed for {}: {}", link, error);
                    report.direct_failures += 1;
                }
            }
        }
    }

    /// Writes a file into the output directory, replacing any existing one
    async fn save(&self, filename: &str, bytes: &[u8]) -> std::io::Result<u64> {
        tokio::fs::create_dir_all(&self.out_dir).await?;
        tokio::fs::write(self.out_dir.join(filename), bytes).await?;
        Ok(bytes.len() as u64)
    }
}

/// Processes one root page; the crawler and the runner drive this
#[allow(async_fn_in_trait)]
pub trait RootProcessor {
    /// Loads and harvests `url`, returning the number of files saved
    async fn process_root(&mut self, url: &str) -> Result<usize, HarvestError>;
}

/// Root processing backed by a browser: navigate, then extract
pub struct RootExtraction<'a, B: Browser> {
    navigator: Navigator<'a, B>,
    policy: LoadPolicy,
    extractor: ResourceExtractor,
    counters: RunCounters,
}

impl<'a, B: Browser> RootExtraction<'a, B> {
    pub fn new(navigator: Navigator<'a, B>, policy: LoadPolicy, extractor: ResourceExtractor) -> Self {
        Self {
            navigator,
            policy,
            extractor,
            counters: RunCounters::default(),
        }
    }

    /// Download counts accumulated so far (roots processed, files by strategy)
    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }
}

impl<B: Browser> RootProcessor for RootExtraction<'_, B> {
    async fn process_root(&mut self, url: &str) -> Result<usize, HarvestError> {
        tracing::info!("=== Root page: {}", url);

        let page = self.navigator.load(url, self.policy).await?;
        let report = self.extractor.extract(&page).await;
        if let Err(e) = page.close().await {
            tracing::debug!("Closing {} failed: {}", url, e);
        }

        self.counters.roots_processed += 1;
        self.counters.click_downloads += report.count_via(DownloadVia::Click);
        self.counters.direct_downloads += report.count_via(DownloadVia::Direct);

        tracing::info!("Files downloaded on this page: {}", report.downloaded());
        Ok(report.downloaded())
    }
}
