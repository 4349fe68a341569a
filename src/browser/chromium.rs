//! Chromium implementation of the browser seam
//!
//! Drives a Chrome/Chromium instance over the DevTools protocol. Downloads
//! are redirected into a private staging directory, picked up by GUID once
//! the browser reports them complete, and handed back as bytes.

use super::scripts;
use super::{
    Browser, BrowserError, CandidateSet, CapturedDownload, ClickOutcome, DownloadSelectors,
    PageHandle,
};
use crate::config::BrowserConfig;
use crate::session::SessionCookie;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpBrowserConfig, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::browser::{
    DownloadProgressState, EventDownloadProgress, EventDownloadWillBegin,
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::network::{CookieParam, SetCookiesParams, TimeSinceEpoch};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::{self, JoinHandle};

/// How long a single DevTools request may take
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for launching the browser
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub headless: bool,
    pub executable: Option<PathBuf>,
    pub profile_dir: Option<PathBuf>,
    pub user_agent: Option<String>,
}

impl LaunchOptions {
    /// Options for the download phase
    pub fn for_downloads(config: &BrowserConfig) -> Self {
        Self {
            headless: config.headless,
            executable: resolve_executable(config),
            profile_dir: None,
            user_agent: config.user_agent.clone(),
        }
    }

    /// Options for the interactive login flow: always headed, persistent profile
    pub fn for_login(config: &BrowserConfig) -> Self {
        Self {
            headless: false,
            executable: resolve_executable(config),
            profile_dir: Some(config.profile_dir.clone()),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Explicit config path first, then `CHROMIUM_PATH`, else let the launcher detect one
fn resolve_executable(config: &BrowserConfig) -> Option<PathBuf> {
    if let Some(path) = &config.chrome_executable {
        return Some(path.clone());
    }

    match std::env::var("CHROMIUM_PATH") {
        Ok(path) if Path::new(&path).exists() => {
            tracing::info!("Using browser from CHROMIUM_PATH: {}", path);
            Some(PathBuf::from(path))
        }
        Ok(path) => {
            tracing::warn!("CHROMIUM_PATH points to a missing file: {}", path);
            None
        }
        Err(_) => None,
    }
}

fn protocol_error(e: impl std::fmt::Display) -> BrowserError {
    BrowserError::Protocol(e.to_string())
}

/// Aborts the DevTools event-handler task when dropped
struct HandlerGuard(JoinHandle<()>);

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A running browser plus its event-handler task
///
/// The handler task is aborted when this value is dropped, which also lets
/// the browser process exit.
pub struct ChromiumBrowser {
    browser: Arc<CdpBrowser>,
    handler: HandlerGuard,
    /// Holds the download staging directory and, unless a profile was
    /// given, the throwaway browser profile
    scratch: TempDir,
    staging: PathBuf,
}

impl ChromiumBrowser {
    /// Launches a browser and routes its downloads into a staging directory
    pub async fn launch(options: LaunchOptions) -> Result<Self, BrowserError> {
        let mut builder = CdpBrowserConfig::builder()
            .request_timeout(REQUEST_TIMEOUT)
            .window_size(1366, 900);

        builder = if options.headless {
            builder.headless_mode(HeadlessMode::New)
        } else {
            builder.with_head()
        };

        if let Some(path) = options.executable {
            builder = builder.chrome_executable(path);
        }
        let scratch = TempDir::new()?;
        let staging = scratch.path().join("downloads");
        std::fs::create_dir_all(&staging)?;

        // A dedicated profile keeps concurrent Chrome instances from fighting over a lock
        let profile = options
            .profile_dir
            .unwrap_or_else(|| scratch.path().join("profile"));
        std::fs::create_dir_all(&profile)?;
        builder = builder.user_data_dir(profile);
        if let Some(agent) = options.user_agent {
            builder = builder.arg(format!("--user-agent={}", agent));
        }

        let config = builder.build().map_err(BrowserError::Launch)?;

        tracing::info!(
            "Launching browser ({})",
            if options.headless { "headless" } else { "headed" }
        );
        let (browser, mut handler) = CdpBrowser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = task::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {:?}", e);
                }
            }
            tracing::debug!("Browser event handler task completed");
        });

        let params = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::AllowAndName)
            .download_path(staging.to_string_lossy().to_string())
            .events_enabled(true)
            .build()
            .map_err(BrowserError::Launch);
        let configured = match params {
            Ok(params) => browser.execute(params).await.map_err(protocol_error),
            Err(e) => Err(e),
        };
        if let Err(e) = configured {
            handler.abort();
            return Err(e);
        }

        Ok(Self {
            browser: Arc::new(browser),
            handler: HandlerGuard(handler),
            scratch,
            staging,
        })
    }

    /// Installs session cookies into the browser's cookie store
    pub async fn install_cookies(&self, cookies: &[SessionCookie]) -> Result<(), BrowserError> {
        if cookies.is_empty() {
            return Ok(());
        }

        let mut params = Vec::with_capacity(cookies.len());
        for cookie in cookies {
            let mut builder = CookieParam::builder()
                .name(cookie.name.clone())
                .value(cookie.value.clone())
                .domain(cookie.domain.clone())
                .path(cookie.path.clone())
                .secure(cookie.secure)
                .http_only(cookie.http_only);
            if cookie.expires > 0.0 {
                builder = builder.expires(TimeSinceEpoch::new(cookie.expires));
            }
            params.push(builder.build().map_err(BrowserError::Protocol)?);
        }

        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(protocol_error)?;
        let result = page.execute(SetCookiesParams::new(params)).await;
        let _ = page.close().await;
        result.map_err(protocol_error)?;

        tracing::debug!("Installed {} session cookies", cookies.len());
        Ok(())
    }

    /// Reads every cookie the browser currently holds
    pub async fn export_cookies(&self) -> Result<Vec<SessionCookie>, BrowserError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(protocol_error)?;
        let result = page.get_cookies().await;
        let _ = page.close().await;

        Ok(result
            .map_err(protocol_error)?
            .into_iter()
            .map(|c| SessionCookie {
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
                expires: c.expires,
                http_only: c.http_only,
                secure: c.secure,
            })
            .collect())
    }

    /// Closes the browser and waits for the process to exit
    pub async fn shutdown(self) {
        let Self {
            browser,
            handler,
            scratch,
            ..
        } = self;

        if let Ok(mut browser) = Arc::try_unwrap(browser) {
            if let Err(e) = browser.close().await {
                tracing::debug!("Browser close failed: {}", e);
            }
            let _ = browser.wait().await;
        }
        drop(handler);
        drop(scratch);
    }
}

impl Browser for ChromiumBrowser {
    type Page = ChromiumPage;

    async fn open(&self, url: &str, timeout: Duration) -> Result<ChromiumPage, BrowserError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(protocol_error)?;

        let navigation = async {
            page.goto(url)
                .await
                .map_err(|e| BrowserError::Navigation(e.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| BrowserError::Navigation(e.to_string()))?;
            Ok::<_, BrowserError>(())
        };

        let outcome = match tokio::time::timeout(timeout, navigation).await {
            Ok(result) => result,
            Err(_) => Err(BrowserError::Timeout(timeout)),
        };

        if let Err(e) = outcome {
            let _ = page.close().await;
            return Err(e);
        }

        let current_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        Ok(ChromiumPage {
            page,
            browser: Arc::clone(&self.browser),
            staging: self.staging.clone(),
            url: current_url,
        })
    }
}

/// A page opened by [`ChromiumBrowser`]
pub struct ChromiumPage {
    page: Page,
    browser: Arc<CdpBrowser>,
    staging: PathBuf,
    url: String,
}

impl ChromiumPage {
    async fn eval<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T, BrowserError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| BrowserError::Script(e.to_string()))
    }

    async fn try_click_download(
        &self,
        index: usize,
        click_timeout: Duration,
        download_timeout: Duration,
    ) -> Result<ClickOutcome, BrowserError> {
        if !self.eval::<bool>(&scripts::candidate_visible(index)).await? {
            return Ok(ClickOutcome::NotVisible);
        }

        let element = match self
            .page
            .find_element(scripts::candidate_selector(index))
            .await
        {
            Ok(element) => element,
            Err(_) => return Ok(ClickOutcome::NotVisible),
        };

        // Subscribe before clicking so the start event cannot be missed
        let mut started = self
            .browser
            .event_listener::<EventDownloadWillBegin>()
            .await
            .map_err(protocol_error)?;
        let mut progress = self
            .browser
            .event_listener::<EventDownloadProgress>()
            .await
            .map_err(protocol_error)?;

        element.scroll_into_view().await.map_err(protocol_error)?;
        element.click().await.map_err(protocol_error)?;

        let begin = match tokio::time::timeout(click_timeout, started.next()).await {
            Ok(Some(event)) => event,
            _ => return Ok(ClickOutcome::NoDownload),
        };
        let guid = begin.guid.clone();

        let completion = async {
            while let Some(event) = progress.next().await {
                if event.guid != guid {
                    continue;
                }
                match event.state {
                    DownloadProgressState::Completed => return Ok(()),
                    DownloadProgressState::Canceled => {
                        return Err(format!("download {} was canceled", guid))
                    }
                    _ => {}
                }
            }
            Err("download event stream closed".to_string())
        };

        match tokio::time::timeout(download_timeout, completion).await {
            Ok(Ok(())) => {}
            Ok(Err(message)) => return Ok(ClickOutcome::Failed(message)),
            Err(_) => {
                return Ok(ClickOutcome::Failed(format!(
                    "download did not finish within {:?}",
                    download_timeout
                )))
            }
        }

        let staged = self.staging.join(&guid);
        let bytes = tokio::fs::read(&staged).await?;
        let _ = tokio::fs::remove_file(&staged).await;

        Ok(ClickOutcome::Downloaded(CapturedDownload {
            suggested_filename: begin.suggested_filename.clone(),
            url: begin.url.clone(),
            bytes,
        }))
    }
}

impl PageHandle for ChromiumPage {
    fn url(&self) -> &str {
        &self.url
    }

    async fn html(&self) -> Result<String, BrowserError> {
        self.page.content().await.map_err(protocol_error)
    }

    async fn scroll(&self, steps: u32, px: u32, pause: Duration) -> Result<(), BrowserError> {
        let script = scripts::scroll_by(px);
        for _ in 0..steps {
            self.eval::<bool>(&script).await?;
            tokio::time::sleep(pause).await;
        }
        Ok(())
    }

    async fn click_text(&self, label: &str) -> Result<bool, BrowserError> {
        self.eval::<bool>(&scripts::click_text(label)).await
    }

    async fn download_candidates(
        &self,
        selectors: DownloadSelectors<'_>,
    ) -> Result<CandidateSet, BrowserError> {
        let script =
            scripts::tag_download_candidates(selectors.text_labels, selectors.aria_labels);
        let count = self.eval::<usize>(&script).await?;
        Ok(CandidateSet::new(count))
    }

    async fn click_download(
        &self,
        index: usize,
        click_timeout: Duration,
        download_timeout: Duration,
    ) -> ClickOutcome {
        match self
            .try_click_download(index, click_timeout, download_timeout)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => ClickOutcome::Failed(e.to_string()),
        }
    }

    async fn close(self) -> Result<(), BrowserError> {
        self.page.close().await.map_err(protocol_error)
    }
}
