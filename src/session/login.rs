//! Interactive login flow
//!
//! Opens a headed browser on the seed page so the operator can sign in by
//! hand, then saves the resulting cookies as the session snapshot used by
//! later download runs.

use super::SessionSnapshot;
use crate::browser::{Browser, ChromiumBrowser, LaunchOptions, PageHandle};
use crate::config::Config;
use crate::HarvestError;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Seed page opened when `--seed` is not given
pub const DEFAULT_LOGIN_URL: &str = "https://online-academy.fishhuang.com/";

/// How long the login page may take to load
const LOGIN_PAGE_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs the login flow and writes the snapshot to `session_path`
///
/// # Arguments
///
/// * `config` - Configuration (browser section is used)
/// * `seed` - Page to open for signing in
/// * `session_path` - Where to save the snapshot
///
/// # Returns
///
/// * `Ok(usize)` - Number of cookies saved
/// * `Err(HarvestError)` - Launching, navigating or saving failed
pub async fn run_login(
    config: &Config,
    seed: &str,
    session_path: &Path,
) -> Result<usize, HarvestError> {
    let browser = ChromiumBrowser::launch(LaunchOptions::for_login(&config.browser)).await?;

    let page = browser.open(seed, LOGIN_PAGE_TIMEOUT).await?;
    tracing::info!("Opened {} for login", page.url());

    println!("Sign in within the browser window, then press Enter here to save the session.");
    wait_for_enter().await?;

    let cookies = browser.export_cookies().await?;
    let count = cookies.len();
    SessionSnapshot::new(cookies).save(session_path)?;

    if let Err(e) = page.close().await {
        tracing::debug!("Closing login page failed: {}", e);
    }
    browser.shutdown().await;

    tracing::info!("Saved {} cookies to {}", count, session_path.display());
    Ok(count)
}

async fn wait_for_enter() -> Result<(), HarvestError> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(())
}
