//! HTML parser for extracting links
//!
//! Reads the serialized DOM of a loaded page and turns its hyperlinks into
//! absolute URLs resolved against the page's current URL.

use scraper::{Html, Selector};
use std::collections::BTreeSet;
use url::Url;

/// Extracts every followable hyperlink target from a page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document, including controls marked
///   `download` (resource links are what the harvester is after)
///
/// **Exclude:**
/// - Empty `href` values
/// - Fragment-only references (`#section`)
/// - `javascript:` references
/// - Anything that does not resolve to an HTTP(S) URL
///
/// The result is deduplicated and sorted so reporting is deterministic.
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The page's current URL, used to resolve relative links
///
/// # Returns
///
/// Sorted, unique absolute URLs
///
/// # Example
///
/// ```
/// use combo_harvest::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/learning">Learning</a><a href="/learning">Again</a>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// assert_eq!(extract_links(html, &base), vec!["https://example.com/learning"]);
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);

    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs
/// - `javascript:` references
/// - invalid URLs
/// - non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href
        .get(..11)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:"))
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
