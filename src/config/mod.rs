//! Configuration module for Combo-Harvest
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Command-line flags are layered on top in `main`.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{
    BrowserConfig, Config, CrawlConfig, ExtractionConfig, NavigationConfig, OutputConfig,
};
pub use validation::{validate, validate_start_urls};
