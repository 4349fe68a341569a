//! Direct resource fetcher
//!
//! This module handles the HTTP side of resource harvesting:
//! - Building an HTTP client that carries the authenticated session cookies
//! - GET requests for resource links found on root pages
//! - Content-Type verification against the expected media type
//! - Error classification

use crate::config::ExtractionConfig;
use crate::extract::resource_filename;
use crate::session::SessionSnapshot;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default user agent when none is configured
const DEFAULT_USER_AGENT: &str = concat!("combo-harvest/", env!("CARGO_PKG_VERSION"));

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Resource fetched and accepted
    Success {
        /// Final URL after redirects
        final_url: String,
        /// Derived, sanitized destination filename
        filename: String,
        /// Response body
        bytes: Vec<u8>,
    },

    /// The response is not the expected media type
    ContentMismatch {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Non-success HTTP status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, body read failure)
    NetworkError {
        /// Error description
        error: String,
    },
}

/// Builds an HTTP client that presents the session's cookies
///
/// # Arguments
///
/// * `session` - The authenticated session snapshot
/// * `user_agent` - Optional user agent override
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    session: &SessionSnapshot,
    user_agent: Option<&str>,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
        .cookie_provider(Arc::new(session.cookie_jar()))
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one resource link
///
/// # Request Flow
///
/// 1. GET the URL, following redirects
/// 2. Non-success status → `HttpError`
/// 3. Content-Type not containing the media token → `ContentMismatch`
/// 4. Read the body and derive the filename from `Content-Disposition` or the URL
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The resource URL
/// * `config` - Media token and filename rules
///
/// # Returns
///
/// A FetchResult indicating success or the type of failure
pub async fn fetch_resource(client: &Client, url: &Url, config: &ExtractionConfig) -> FetchResult {
    let response = match client.get(url.clone()).send().await {
        Ok(r) => r,
        Err(e) => return classify_error(e),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let content_type = header_value(&response, CONTENT_TYPE).unwrap_or_default();
    if !content_type
        .to_lowercase()
        .contains(&config.resource_media_token.to_lowercase())
    {
        return FetchResult::ContentMismatch { content_type };
    }

    let disposition = header_value(&response, CONTENT_DISPOSITION);
    let final_url = response.url().clone();
    let filename = resource_filename(disposition.as_deref(), url, config);

    match response.bytes().await {
        Ok(bytes) => FetchResult::Success {
            final_url: final_url.to_string(),
            filename,
            bytes: bytes.to_vec(),
        },
        Err(e) => classify_error(e),
    }
}

fn header_value(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn classify_error(e: reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        format!("Request timeout: {}", e)
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    };
    FetchResult::NetworkError { error }
}
