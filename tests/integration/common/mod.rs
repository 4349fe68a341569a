//! In-memory browser double
//!
//! Pages are HTML strings keyed by URL. Navigation failures and click
//! downloads are scripted per page, and every open is recorded.

use combo_harvest::browser::{
    Browser, BrowserError, CandidateSet, CapturedDownload, ClickOutcome, DownloadSelectors,
    PageHandle,
};
use combo_harvest::config::Config;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::time::Duration;

/// A 36-character root id ending in `n`
pub fn root_url(host: &str, n: u32) -> String {
    format!("{}/learning/megacombo/00000000-0000-0000-0000-{:012x}", host, n)
}

/// Configuration with all waits removed and output under `out_dir`
pub fn test_config(out_dir: &Path) -> Config {
    let mut config = Config::default();
    config.extraction.scroll_pause_ms = 0;
    config.extraction.expand_pause_ms = 0;
    config.output.out_dir = out_dir.to_path_buf();
    config
}

/// What clicking one download candidate does
#[derive(Debug, Clone)]
pub enum FakeClick {
    Download { name: String, bytes: Vec<u8> },
    Nothing,
    Hidden,
}

/// One page of the fake site
#[derive(Debug, Clone, Default)]
pub struct PageSpec {
    pub html: String,
    pub clicks: Vec<FakeClick>,
    /// Label that reveals `expanded_html` when clicked
    pub expand: Option<(String, String)>,
}

impl PageSpec {
    pub fn html(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Default::default()
        }
    }

    /// A page consisting only of links to `targets`
    pub fn links<S: AsRef<str>>(targets: &[S]) -> Self {
        let body: String = targets
            .iter()
            .map(|t| format!(r#"<a href="{}">link</a>"#, t.as_ref()))
            .collect();
        Self::html(format!("<html><body>{}</body></html>", body))
    }

    pub fn with_click(mut self, click: FakeClick) -> Self {
        self.clicks.push(click);
        self
    }

    pub fn with_expand(mut self, label: &str, html: impl Into<String>) -> Self {
        self.expand = Some((label.to_string(), html.into()));
        self
    }
}

#[derive(Default)]
pub struct FakeBrowser {
    pages: HashMap<String, PageSpec>,
    failures: RefCell<HashMap<String, VecDeque<BrowserError>>>,
    opened: RefCell<Vec<String>>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, spec: PageSpec) -> Self {
        self.pages.insert(url.into(), spec);
        self
    }

    /// Makes the next loads of `url` fail with `errors`, in order
    pub fn fail(self, url: &str, errors: Vec<BrowserError>) -> Self {
        self.failures
            .borrow_mut()
            .insert(url.to_string(), errors.into());
        self
    }

    /// Every URL passed to `open`, in order
    pub fn opened(&self) -> Vec<String> {
        self.opened.borrow().clone()
    }

    pub fn open_count(&self, url: &str) -> usize {
        self.opened.borrow().iter().filter(|u| *u == url).count()
    }
}

impl Browser for FakeBrowser {
    type Page = FakeTab;

    async fn open(&self, url: &str, _timeout: Duration) -> Result<FakeTab, BrowserError> {
        self.opened.borrow_mut().push(url.to_string());

        if let Some(queue) = self.failures.borrow_mut().get_mut(url) {
            if let Some(error) = queue.pop_front() {
                return Err(error);
            }
        }

        match self.pages.get(url) {
            Some(spec) => Ok(FakeTab {
                url: url.to_string(),
                spec: spec.clone(),
                expanded: Cell::new(false),
            }),
            None => Err(BrowserError::Navigation(format!(
                "net::ERR_NAME_NOT_RESOLVED at {}",
                url
            ))),
        }
    }
}

pub struct FakeTab {
    url: String,
    spec: PageSpec,
    expanded: Cell<bool>,
}

impl PageHandle for FakeTab {
    fn url(&self) -> &str {
        &self.url
    }

    async fn html(&self) -> Result<String, BrowserError> {
        let mut html = self.spec.html.clone();
        if self.expanded.get() {
            if let Some((_, extra)) = &self.spec.expand {
                html.push_str(extra);
            }
        }
        Ok(html)
    }

    async fn scroll(&self, _steps: u32, _px: u32, _pause: Duration) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn click_text(&self, label: &str) -> Result<bool, BrowserError> {
        match &self.spec.expand {
            Some((expand_label, _)) if expand_label == label && !self.expanded.get() => {
                self.expanded.set(true);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn download_candidates(
        &self,
        selectors: DownloadSelectors<'_>,
    ) -> Result<CandidateSet, BrowserError> {
        assert!(!selectors.text_labels.is_empty() || !selectors.aria_labels.is_empty());
        Ok(CandidateSet::new(self.spec.clicks.len()))
    }

    async fn click_download(
        &self,
        index: usize,
        _click_timeout: Duration,
        _download_timeout: Duration,
    ) -> ClickOutcome {
        match self.spec.clicks.get(index) {
            Some(FakeClick::Download { name, bytes }) => {
                ClickOutcome::Downloaded(CapturedDownload {
                    suggested_filename: name.clone(),
                    url: self.url.clone(),
                    bytes: bytes.clone(),
                })
            }
            Some(FakeClick::Nothing) => ClickOutcome::NoDownload,
            Some(FakeClick::Hidden) | None => ClickOutcome::NotVisible,
        }
    }

    async fn close(self) -> Result<(), BrowserError> {
        Ok(())
    }
}
