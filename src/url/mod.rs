//! URL classification for Combo-Harvest
//!
//! This module decides what a discovered link is: a resource root page, a
//! downloadable resource, or an ordinary page that may be expanded. It never
//! touches the network or the DOM.

mod domain;
mod matcher;

use ::url::Url;

pub use domain::{extract_host, same_site};
pub use matcher::{is_resource, is_root, is_root_path, path_depth};

/// How the crawler treats a discovered link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkClass {
    /// Matches the root-page pattern
    Root,
    /// Downloadable resource, never expanded
    Resource,
    /// Ordinary page
    Page,
}

/// Classifies a link for the crawler
///
/// Root and resource are mutually exclusive for the URLs this tool expects;
/// the root pattern wins if both would apply.
pub fn classify_link(url: &str) -> LinkClass {
    if is_root(url) {
        LinkClass::Root
    } else if is_resource(url) {
        LinkClass::Resource
    } else {
        LinkClass::Page
    }
}

/// Checks whether a link may enter the frontier
///
/// Resources never do, and neither do pages deeper than `max_path_depth`.
pub fn is_expandable(url: &Url, max_path_depth: usize) -> bool {
    path_depth(url) <= max_path_depth && classify_link(url.as_str()) != LinkClass::Resource
}
