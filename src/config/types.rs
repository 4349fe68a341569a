use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Combo-Harvest
///
/// Every key has a default, so an empty file (or no file at all) yields a
/// working configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub navigation: NavigationConfig,
    pub extraction: ExtractionConfig,
    pub browser: BrowserConfig,
    pub output: OutputConfig,
}

/// Frontier crawl limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Maximum number of pages navigated during discovery
    pub max_pages: usize,

    /// Maximum number of roots processed in one run
    pub max_roots: usize,

    /// Links whose path has more slashes than this are never enqueued
    pub max_path_depth: usize,

    /// Only follow links on the same scheme and host as the current page
    pub same_site_only: bool,

    /// Scroll steps applied to each discovery page before reading links
    pub discovery_scrolls: u32,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 100,
            max_roots: 500,
            max_path_depth: 5,
            same_site_only: true,
            discovery_scrolls: 4,
        }
    }
}

/// Navigation retry and timeout settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NavigationConfig {
    /// Attempts per page during frontier expansion
    pub discovery_attempts: u32,

    /// Attempts per root page during extraction
    pub root_attempts: u32,

    /// Hard cutoff for one navigation during frontier expansion (seconds)
    pub discovery_timeout_secs: u64,

    /// Hard cutoff for one navigation to a root page (seconds)
    pub root_timeout_secs: u64,

    /// Wait before retry n is `backoff-base-ms * n`
    pub backoff_base_ms: u64,

    /// Error-message fragments that mark a navigation failure as transient
    pub transient_signatures: Vec<String>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            discovery_attempts: 3,
            root_attempts: 4,
            discovery_timeout_secs: 15,
            root_timeout_secs: 20,
            backoff_base_ms: 1500,
            transient_signatures: vec![
                "ERR_NETWORK_IO_SUSPENDED".to_string(),
                "ERR_NETWORK_CHANGED".to_string(),
                "ERR_CONNECTION_RESET".to_string(),
                "ERR_INTERNET_DISCONNECTED".to_string(),
            ],
        }
    }
}

/// Resource extraction settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtractionConfig {
    /// Visible text of links and buttons that trigger a download
    pub download_labels: Vec<String>,

    /// Fragments of `aria-label` attributes that mark download controls
    pub aria_labels: Vec<String>,

    /// Visible text of controls that expand collapsed catalog sections
    pub expand_labels: Vec<String>,

    /// How long a click may take to start a download (milliseconds)
    pub click_timeout_ms: u64,

    /// How long a started download may take to finish (seconds)
    pub download_timeout_secs: u64,

    pub scroll_px: u32,
    pub scroll_pause_ms: u64,
    pub expand_pause_ms: u64,
    pub pre_expand_scrolls: u32,
    pub post_expand_scrolls: u32,

    /// Token a direct-fetch Content-Type must contain to be accepted
    pub resource_media_token: String,

    /// Maximum length of a saved filename, in UTF-8 bytes
    pub max_filename_len: usize,

    /// Name used when a suggested filename sanitizes to nothing
    pub fallback_filename: String,

    /// Name used when a direct-fetch URL has no usable last segment
    pub fallback_resource_name: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            download_labels: vec!["下載".to_string(), "Download".to_string()],
            aria_labels: vec!["下載".to_string(), "download".to_string()],
            expand_labels: [
                "Expand",
                "Show more",
                "Load more",
                "Catalog",
                "All",
                "Everything",
                "展開",
                "顯示更多",
                "載入更多",
                "目錄",
                "全部",
                "所有",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            click_timeout_ms: 3000,
            download_timeout_secs: 60,
            scroll_px: 1400,
            scroll_pause_ms: 350,
            expand_pause_ms: 600,
            pre_expand_scrolls: 8,
            post_expand_scrolls: 4,
            resource_media_token: "pdf".to_string(),
            max_filename_len: 150,
            fallback_filename: "untitled".to_string(),
            fallback_resource_name: "file.pdf".to_string(),
        }
    }
}

impl ExtractionConfig {
    pub fn click_timeout(&self) -> Duration {
        Duration::from_millis(self.click_timeout_ms)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    pub fn expand_pause(&self) -> Duration {
        Duration::from_millis(self.expand_pause_ms)
    }
}

/// Browser launch settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    /// Run the download phase without a visible window (login is always interactive)
    pub headless: bool,

    /// Explicit Chrome/Chromium binary; falls back to `CHROMIUM_PATH`, then auto-detection
    pub chrome_executable: Option<PathBuf>,

    /// Persistent profile used by the login flow
    pub profile_dir: PathBuf,

    /// Overrides the browser's default user agent
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            chrome_executable: None,
            profile_dir: PathBuf::from(".harvest-profile"),
            user_agent: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Flat directory all downloaded files land in
    pub out_dir: PathBuf,

    /// Authenticated-session snapshot written by the login flow
    pub session_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("downloads"),
            session_path: PathBuf::from("state.json"),
        }
    }
}
