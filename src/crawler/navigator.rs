//! Page loading with bounded retries
//!
//! Each load is a tiny state machine:
//!
//! ```text
//! Attempting(n) --loaded-------------------> Success
//! Attempting(n) --transient, n < max-------> Attempting(n + 1)   (after backoff)
//! Attempting(n) --transient, n == max------> GaveUp
//! Attempting(n) --anything else------------> Fatal
//! ```
//!
//! A failure is transient when the browser's error text contains one of the
//! configured signatures. The per-attempt timeout is a hard cutoff enforced
//! by the browser; a timed-out attempt is not retried.

use crate::browser::{Browser, BrowserError};
use crate::config::NavigationConfig;
use std::time::Duration;
use thiserror::Error;

/// Why a load did not produce a page
///
/// Callers treat every variant as a per-page skip.
#[derive(Debug, Clone, Error)]
pub enum NavigationError {
    #[error("navigation to {url} failed: {message}")]
    Fatal { url: String, message: String },

    #[error("navigation to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("gave up on {url} after {attempts} attempts: {last}")]
    GaveUp {
        url: String,
        attempts: u32,
        last: String,
    },
}

/// Retry budget and hard cutoff for one kind of page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadPolicy {
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl LoadPolicy {
    /// Policy for pages visited while expanding the frontier
    pub fn discovery(config: &NavigationConfig) -> Self {
        Self {
            max_attempts: config.discovery_attempts,
            timeout: Duration::from_secs(config.discovery_timeout_secs),
        }
    }

    /// Policy for root pages about to be extracted
    pub fn root(config: &NavigationConfig) -> Self {
        Self {
            max_attempts: config.root_attempts,
            timeout: Duration::from_secs(config.root_timeout_secs),
        }
    }
}

/// State of a single load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    /// Attempt number `n` (1-based) is in flight
    Attempting(u32),
    Success,
    GaveUp,
    Fatal,
}

/// What one attempt produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Loaded,
    Transient,
    NonTransient,
}

impl NavState {
    /// Applies one attempt's outcome
    ///
    /// Terminal states are absorbing.
    pub fn advance(self, outcome: AttemptOutcome, max_attempts: u32) -> NavState {
        match (self, outcome) {
            (NavState::Attempting(_), AttemptOutcome::Loaded) => NavState::Success,
            (NavState::Attempting(n), AttemptOutcome::Transient) if n < max_attempts => {
                NavState::Attempting(n + 1)
            }
            (NavState::Attempting(_), AttemptOutcome::Transient) => NavState::GaveUp,
            (NavState::Attempting(_), AttemptOutcome::NonTransient) => NavState::Fatal,
            (terminal, _) => terminal,
        }
    }
}

/// Loads pages from a shared browser with retry and backoff
pub struct Navigator<'a, B: Browser> {
    browser: &'a B,
    signatures: Vec<String>,
    backoff_base: Duration,
}

impl<'a, B: Browser> Navigator<'a, B> {
    pub fn new(browser: &'a B, config: &NavigationConfig) -> Self {
        Self {
            browser,
            signatures: config.transient_signatures.clone(),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        }
    }

    /// Wait after failed attempt `attempt`: `base × attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base * attempt
    }

    /// Classifies a browser failure
    pub fn classify(&self, error: &BrowserError) -> AttemptOutcome {
        match error {
            BrowserError::Navigation(message) | BrowserError::Protocol(message)
                if self.signatures.iter().any(|s| message.contains(s.as_str())) =>
            {
                AttemptOutcome::Transient
            }
            _ => AttemptOutcome::NonTransient,
        }
    }

    /// Loads `url`, retrying transient failures
    ///
    /// # Arguments
    ///
    /// * `url` - The page to open
    /// * `policy` - Attempt budget and per-attempt timeout
    ///
    /// # Returns
    ///
    /// * `Ok(Page)` - The loaded page
    /// * `Err(NavigationError)` - The page should be skipped
    pub async fn load(&self, url: &str, policy: LoadPolicy) -> Result<B::Page, NavigationError> {
        let mut attempt = 1;

        loop {
            let error = match self.browser.open(url, policy.timeout).await {
                Ok(page) => {
                    if attempt > 1 {
                        tracing::info!("Loaded {} on attempt {}", url, attempt);
                    }
                    return Ok(page);
                }
                Err(e) => e,
            };

            let state =
                NavState::Attempting(attempt).advance(self.classify(&error), policy.max_attempts);

            match state {
                NavState::Attempting(next) => {
                    let wait = self.backoff(attempt);
                    tracing::warn!(
                        "Transient failure loading {} (attempt {}/{}): {}; retrying in {:?}",
                        url,
                        attempt,
                        policy.max_attempts,
                        error,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt = next;
                }
                NavState::GaveUp => {
                    return Err(NavigationError::GaveUp {
                        url: url.to_string(),
                        attempts: attempt,
                        last: error.to_string(),
                    });
                }
                NavState::Fatal | NavState::Success => {
                    return Err(match error {
                        BrowserError::Timeout(timeout) => NavigationError::Timeout {
                            url: url.to_string(),
                            timeout,
                        },
                        other => NavigationError::Fatal {
                            url: url.to_string(),
                            message: other.to_string(),
                        },
                    });
                }
            }
        }
    }
}
