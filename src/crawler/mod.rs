//! Crawler module for root discovery and resource fetching
//!
//! This module contains the core crawling logic, including:
//! - Page loading with retry and backoff
//! - HTML parsing and link extraction
//! - Frontier and root-set bookkeeping
//! - Overall crawl coordination in batch and streaming modes
//! - Direct HTTP fetches of resource links

mod coordinator;
mod fetcher;
mod frontier;
mod navigator;
mod parser;

pub use coordinator::{CrawlOutcome, Crawler};
pub use fetcher::{build_http_client, fetch_resource, FetchResult};
pub use frontier::{Frontier, RootSet};
pub use navigator::{AttemptOutcome, LoadPolicy, NavState, NavigationError, Navigator};
pub use parser::{extract_links, resolve_link};
