//! Browser collaborator seam
//!
//! The crawler and the extractor never talk to a browser directly. They see
//! two traits: [`Browser`] opens pages in the shared authenticated context,
//! and [`PageHandle`] is one loaded page that can be read, scrolled and
//! clicked. [`chromium`] implements both over the DevTools protocol; tests
//! provide an in-memory double.

pub mod chromium;
mod scripts;

use std::time::Duration;
use thiserror::Error;

pub use chromium::{ChromiumBrowser, LaunchOptions};

/// Errors reported by the browser collaborator
#[derive(Debug, Clone, Error)]
pub enum BrowserError {
    /// Navigation failed; the message carries the browser's error text
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Navigation did not finish within the hard cutoff
    #[error("navigation timed out after {0:?}")]
    Timeout(Duration),

    /// Talking to the browser failed (closed target, protocol error)
    #[error("browser protocol error: {0}")]
    Protocol(String),

    /// Script evaluation returned something unexpected
    #[error("script error: {0}")]
    Script(String),

    /// The browser could not be launched or configured
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for BrowserError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// A file captured from a browser download event
#[derive(Debug, Clone)]
pub struct CapturedDownload {
    /// Filename suggested by the browser (unsanitized)
    pub suggested_filename: String,

    /// The URL the download was served from
    pub url: String,

    /// Downloaded bytes
    pub bytes: Vec<u8>,
}

/// Result of clicking one candidate download control
#[derive(Debug, Clone)]
pub enum ClickOutcome {
    /// The click started a download that completed
    Downloaded(CapturedDownload),

    /// The candidate is no longer visible or no longer in the DOM
    NotVisible,

    /// The click produced no download event within the timeout
    NoDownload,

    /// The click itself failed
    Failed(String),
}

/// Candidate download controls found on a page
///
/// The set only records how many controls matched. Each control is
/// re-resolved by index when it is clicked, so the sequence can be walked
/// again after the DOM changes underneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CandidateSet {
    count: usize,
}

impl CandidateSet {
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Iterates the candidate indices in document order
    pub fn indices(&self) -> std::ops::Range<usize> {
        0..self.count
    }
}

/// Label lists used to locate download controls
#[derive(Debug, Clone, Copy)]
pub struct DownloadSelectors<'a> {
    /// Visible text of `<a>` / `<button>` download controls
    pub text_labels: &'a [String],

    /// Fragments of `aria-label` attributes
    pub aria_labels: &'a [String],
}

/// The shared authenticated browsing context
///
/// One instance is created per run and every page is opened from it, one at
/// a time.
#[allow(async_fn_in_trait)]
pub trait Browser {
    type Page: PageHandle;

    /// Opens a new page and navigates it to `url`
    ///
    /// Implementations report navigation failures as
    /// [`BrowserError::Navigation`] carrying the browser's error text, which
    /// the navigator inspects to decide whether to retry. A navigation still
    /// running after `timeout` is abandoned, its page closed, and
    /// [`BrowserError::Timeout`] returned.
    async fn open(&self, url: &str, timeout: Duration) -> Result<Self::Page, BrowserError>;
}

/// One loaded page
#[allow(async_fn_in_trait)]
pub trait PageHandle {
    /// The page's current URL (after redirects)
    fn url(&self) -> &str;

    /// Serialized DOM of the page
    async fn html(&self) -> Result<String, BrowserError>;

    /// Scrolls down `steps` times by `px` pixels, pausing between steps
    async fn scroll(&self, steps: u32, px: u32, pause: Duration) -> Result<(), BrowserError>;

    /// Clicks the first visible element whose text contains `label`
    ///
    /// Returns whether anything was clicked.
    async fn click_text(&self, label: &str) -> Result<bool, BrowserError>;

    /// Locates visible candidate download controls
    async fn download_candidates(
        &self,
        selectors: DownloadSelectors<'_>,
    ) -> Result<CandidateSet, BrowserError>;

    /// Scrolls candidate `index` into view, clicks it and waits up to
    /// `click_timeout` for a download to start and `download_timeout` for it
    /// to finish
    async fn click_download(
        &self,
        index: usize,
        click_timeout: Duration,
        download_timeout: Duration,
    ) -> ClickOutcome;

    /// Closes the page
    async fn close(self) -> Result<(), BrowserError>;
}
