//! Combo-Harvest: resource harvester for course "megacombo" pages
//!
//! This crate crawls a learning platform from seed pages, recognizes the
//! per-course root pages, and downloads the PDF resources published behind
//! them into a flat output directory.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod runner;
pub mod session;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

pub use browser::BrowserError;
pub use crawler::NavigationError;

/// Main error type for Combo-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and invocation errors
///
/// These are the only errors that stop a whole run. Everything else is
/// handled per page, per root or per link.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Session snapshot not found at {}", .0.display())]
    MissingSession(PathBuf),

    #[error("No run mode selected: pass --roots-file or --discover")]
    NoModeSelected,

    #[error("Conflicting run modes: {0}")]
    ConflictingModes(String),
}

impl ConfigError {
    /// Returns operator-facing instructions for fixing this error
    pub fn remediation(&self) -> &'static str {
        match self {
            Self::MissingSession(_) => {
                "Log in first to create a session snapshot:\n   \
                 combo-harvest --login --seed \"https://online-academy.fishhuang.com/learning/megacombo\""
            }
            Self::NoModeSelected => {
                "Provide --roots-file <FILE> or --discover <SEED>... (one is required in download mode)"
            }
            Self::ConflictingModes(_) => "Use either --roots-file or --discover, not both",
            Self::Io(_) | Self::Parse(_) => "Check the file passed with --config",
            Self::Validation(_) | Self::InvalidUrl(_) => {
                "Fix the value in the config file or on the command line"
            }
        }
    }
}

/// Result type alias for Combo-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crate::url::{is_resource, is_root};
