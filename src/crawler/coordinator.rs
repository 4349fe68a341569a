//! Crawler coordinator - breadth-first discovery of root pages
//!
//! This module contains the crawl loop shared by both discovery modes:
//! - Taking URLs from the frontier in BFS order
//! - Loading each page through the navigator and letting it settle
//! - Extracting and classifying links
//! - Recording roots, and in streaming mode harvesting them on the spot

use crate::browser::{Browser, PageHandle};
use crate::config::{Config, CrawlConfig};
use crate::crawler::frontier::{Frontier, RootSet};
use crate::crawler::navigator::{LoadPolicy, Navigator};
use crate::crawler::parser::extract_links;
use crate::extract::RootProcessor;
use crate::output::{RootsWriter, RunCounters};
use crate::url::{is_expandable, is_root, same_site};
use std::time::{Duration, Instant};
use url::Url;

/// What a crawl produced
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    /// Roots in discovery order
    pub roots: Vec<String>,

    /// Page and root totals for this crawl
    pub counters: RunCounters,
}

/// Why the crawl loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Continue,
    RootCap,
}

/// Main crawler structure
///
/// Owns the frontier and the root set for one crawl; build a new one for
/// every run.
pub struct Crawler<'a, B: Browser> {
    navigator: Navigator<'a, B>,
    policy: LoadPolicy,
    crawl: CrawlConfig,
    scroll_px: u32,
    scroll_pause: Duration,
    frontier: Frontier,
    roots: RootSet,
    counters: RunCounters,
}

impl<'a, B: Browser> Crawler<'a, B> {
    /// Creates a crawler seeded with `seeds`
    ///
    /// # Arguments
    ///
    /// * `browser` - The shared browsing context
    /// * `config` - Full configuration (crawl, navigation, scrolling)
    /// * `seeds` - Entry points, visited in order
    pub fn new(browser: &'a B, config: &Config, seeds: &[String]) -> Self {
        Self {
            navigator: Navigator::new(browser, &config.navigation),
            policy: LoadPolicy::discovery(&config.navigation),
            crawl: config.crawl.clone(),
            scroll_px: config.extraction.scroll_px,
            scroll_pause: config.extraction.scroll_pause(),
            frontier: Frontier::new(seeds.iter().cloned(), config.crawl.max_pages),
            roots: RootSet::new(),
            counters: RunCounters::default(),
        }
    }

    /// Crawls until the frontier is empty or the page budget is spent,
    /// collecting roots without processing them
    pub async fn discover_batch(mut self) -> CrawlOutcome {
        tracing::info!("Starting batch discovery");
        let start_time = Instant::now();

        while let Some(url) = self.frontier.next_url() {
            if let Some((base, links)) = self.visit(&url).await {
                for link in links {
                    if let Some(parsed) = self.admit(&base, &link) {
                        if is_root(&link) && self.roots.insert(&link) {
                            tracing::info!("Found root: {}", link);
                        }
                        self.enqueue(&parsed, link);
                    }
                }
            }
            self.report_progress(start_time);
        }

        self.finish(start_time)
    }

    /// Crawls like [`discover_batch`](Self::discover_batch) but harvests each
    /// new root the moment it is found
    ///
    /// The crawl blocks while a root is processed. A failing root is logged
    /// and counted, and the crawl goes on. Once `max_roots` roots have been
    /// taken the crawl stops, even in the middle of a page's links. When a
    /// writer is given, each root is appended to it as soon as it is found.
    pub async fn discover_streaming<P: RootProcessor>(
        mut self,
        processor: &mut P,
        mut roots_out: Option<&mut RootsWriter>,
    ) -> CrawlOutcome {
        tracing::info!(
            "Starting streaming discovery (max {} roots)",
            self.crawl.max_roots
        );
        let start_time = Instant::now();
        let mut stop = Stop::Continue;

        while stop == Stop::Continue {
            let Some(url) = self.frontier.next_url() else {
                break;
            };

            if let Some((base, links)) = self.visit(&url).await {
                for link in links {
                    let Some(parsed) = self.admit(&base, &link) else {
                        continue;
                    };

                    if is_root(&link) && !self.roots.contains(&link) {
                        if self.roots.len() >= self.crawl.max_roots {
                            stop = Stop::RootCap;
                            break;
                        }
                        self.roots.insert(&link);
                        tracing::info!("Found root: {}", link);

                        if let Some(writer) = roots_out.as_deref_mut() {
                            if let Err(e) = writer.append(&link) {
                                tracing::warn!(
                                    "Could not append to {}: {}",
                                    writer.path().display(),
                                    e
                                );
                            }
                        }

                        if let Err(e) = processor.process_root(&link).await {
                            tracing::warn!("Root {} failed: {}", link, e);
                            self.counters.roots_failed += 1;
                        }

                        if self.roots.len() >= self.crawl.max_roots {
                            stop = Stop::RootCap;
                            break;
                        }
                    }

                    self.enqueue(&parsed, link);
                }
            }
            self.report_progress(start_time);
        }

        if stop == Stop::RootCap {
            tracing::info!("Reached root cap of {}", self.crawl.max_roots);
        }
        self.finish(start_time)
    }

    /// Loads one page and returns its final URL and links
    ///
    /// Failures are logged and counted; the page is skipped.
    async fn visit(&mut self, url: &str) -> Option<(Url, Vec<String>)> {
        tracing::debug!("Visiting {}", url);
        self.counters.pages_visited += 1;

        let page = match self.navigator.load(url, self.policy).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Skipping page: {}", e);
                self.counters.pages_failed += 1;
                return None;
            }
        };

        if let Err(e) = page
            .scroll(self.crawl.discovery_scrolls, self.scroll_px, self.scroll_pause)
            .await
        {
            tracing::debug!("Scrolling {} failed: {}", url, e);
        }

        let html = page.html().await;
        let base = Url::parse(page.url()).or_else(|_| Url::parse(url));
        if let Err(e) = page.close().await {
            tracing::debug!("Closing {} failed: {}", url, e);
        }

        match (html, base) {
            (Ok(html), Ok(base)) => {
                let links = extract_links(&html, &base);
                tracing::debug!("{} links on {}", links.len(), base);
                Some((base, links))
            }
            (Err(e), _) => {
                tracing::warn!("Could not read {}: {}", url, e);
                self.counters.pages_failed += 1;
                None
            }
            (_, Err(e)) => {
                tracing::warn!("Unusable URL {}: {}", url, e);
                self.counters.pages_failed += 1;
                None
            }
        }
    }

    /// Parses a link and applies the same-site restriction
    fn admit(&self, base: &Url, link: &str) -> Option<Url> {
        let parsed = Url::parse(link).ok()?;
        if self.crawl.same_site_only && !same_site(base, &parsed) {
            return None;
        }
        Some(parsed)
    }

    /// Adds a link to the frontier when it is shallow and not a resource
    fn enqueue(&mut self, parsed: &Url, link: String) {
        if is_expandable(parsed, self.crawl.max_path_depth) {
            self.frontier.push(link);
        }
    }

    fn report_progress(&self, start_time: Instant) {
        let visited = self.frontier.visited_count();
        if visited > 0 && visited % 10 == 0 {
            let rate = visited as f64 / start_time.elapsed().as_secs_f64().max(f64::EPSILON);
            tracing::info!(
                "Progress: {} pages visited, {} in frontier, {} roots, {:.2} pages/sec",
                visited,
                self.frontier.len(),
                self.roots.len(),
                rate
            );
        }
    }

    fn finish(self, start_time: Instant) -> CrawlOutcome {
        let mut counters = self.counters;
        counters.roots_found = self.roots.len();

        tracing::info!(
            "Discovery finished: {} pages visited, {} roots found in {:?}",
            self.frontier.visited_count(),
            counters.roots_found,
            start_time.elapsed()
        );

        CrawlOutcome {
            roots: self.roots.as_slice().to_vec(),
            counters,
        }
    }
}
