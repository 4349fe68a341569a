//! Authenticated-session snapshot
//!
//! The login flow saves the browser's cookies to a JSON snapshot; download
//! runs load it, install it into the browser and into the HTTP client used
//! for direct resource fetches. The layout follows the common
//! `{"cookies": [...]}` storage-state shape, and unknown keys are ignored.

mod login;

pub use login::{run_login, DEFAULT_LOGIN_URL};

use crate::{ConfigError, HarvestError};
use reqwest::cookie::Jar;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// One cookie in the snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,

    #[serde(default = "default_path")]
    pub path: String,

    /// Unix timestamp in seconds; negative for session cookies
    #[serde(default = "default_expires")]
    pub expires: f64,

    #[serde(default)]
    pub http_only: bool,

    #[serde(default)]
    pub secure: bool,
}

fn default_path() -> String {
    "/".to_string()
}

fn default_expires() -> f64 {
    -1.0
}

impl SessionCookie {
    /// Host the cookie belongs to, without a leading dot
    pub fn host(&self) -> &str {
        self.domain.trim_start_matches('.')
    }

    /// URL the cookie is scoped to, used when seeding a cookie jar
    fn scope_url(&self) -> Option<Url> {
        let scheme = if self.secure { "https" } else { "http" };
        Url::parse(&format!("{}://{}{}", scheme, self.host(), self.path)).ok()
    }

    /// `Set-Cookie` form understood by cookie jars
    fn set_cookie_header(&self) -> String {
        let mut header = format!("{}={}; Path={}", self.name, self.value, self.path);
        if self.domain.starts_with('.') {
            header.push_str(&format!("; Domain={}", self.host()));
        }
        if self.secure {
            header.push_str("; Secure");
        }
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        header
    }
}

/// A persisted authenticated session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub cookies: Vec<SessionCookie>,
}

impl SessionSnapshot {
    pub fn new(cookies: Vec<SessionCookie>) -> Self {
        Self { cookies }
    }

    /// Loads a snapshot, reporting a missing file as a configuration error
    pub fn load(path: &Path) -> Result<Self, HarvestError> {
        if !path.exists() {
            return Err(ConfigError::MissingSession(path.to_path_buf()).into());
        }

        let content = std::fs::read_to_string(path)?;
        let snapshot: SessionSnapshot = serde_json::from_str(&content)?;
        tracing::debug!(
            "Loaded session snapshot with {} cookies from {}",
            snapshot.cookies.len(),
            path.display()
        );
        Ok(snapshot)
    }

    /// Writes the snapshot as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<(), HarvestError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Builds a cookie jar carrying every cookie in the snapshot
    ///
    /// Cookies whose domain cannot form a URL are skipped with a debug log.
    pub fn cookie_jar(&self) -> Jar {
        let jar = Jar::default();
        for cookie in &self.cookies {
            match cookie.scope_url() {
                Some(url) => jar.add_cookie_str(&cookie.set_cookie_header(), &url),
                None => tracing::debug!("Skipping cookie {} with unusable domain", cookie.name),
            }
        }
        jar
    }
}
