use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Root pages live at `/learning/megacombo/<36-char id>`, nothing after the id
static ROOT_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/learning/megacombo/[0-9a-fA-F-]{36}$").expect("root pattern is valid")
});

const RESOURCE_SUFFIX: &str = ".pdf";

/// Checks whether a URL path identifies a resource root page
///
/// # Examples
///
/// ```
/// use combo_harvest::url::is_root_path;
///
/// assert!(is_root_path("/learning/megacombo/0b7c2f1e-3a4d-4e5f-8a9b-0c1d2e3f4a5b"));
/// assert!(!is_root_path("/learning/megacombo/0b7c2f1e-3a4d-4e5f-8a9b-0c1d2e3f4a5b/lesson"));
/// assert!(!is_root_path("/learning/megacombo"));
/// ```
pub fn is_root_path(path: &str) -> bool {
    ROOT_PATH.is_match(path)
}

/// Checks whether a URL string points at a resource root page
///
/// Only the path is inspected; query and fragment are ignored. Strings that
/// do not parse as absolute URLs are never roots.
pub fn is_root(url: &str) -> bool {
    Url::parse(url)
        .map(|u| is_root_path(u.path()))
        .unwrap_or(false)
}

/// Checks whether a URL string points at a downloadable resource
///
/// True when the path or the query ends with `.pdf`, compared
/// case-insensitively. Resources are terminal: they are fetched, never
/// expanded.
///
/// # Examples
///
/// ```
/// use combo_harvest::url::is_resource;
///
/// assert!(is_resource("https://example.com/files/Guide.PDF"));
/// assert!(is_resource("https://example.com/get?file=notes.pdf"));
/// assert!(!is_resource("https://example.com/files/guide.pdf.html"));
/// ```
pub fn is_resource(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    ends_with_ignore_case(parsed.path(), RESOURCE_SUFFIX)
        || parsed
            .query()
            .map(|q| ends_with_ignore_case(q, RESOURCE_SUFFIX))
            .unwrap_or(false)
}

/// Number of `/` characters in a URL's path
///
/// The frontier never holds URLs deeper than the configured limit.
pub fn path_depth(url: &Url) -> usize {
    url.path().matches('/').count()
}

fn ends_with_ignore_case(haystack: &str, suffix: &str) -> bool {
    haystack.len() >= suffix.len()
        && haystack.is_char_boundary(haystack.len() - suffix.len())
        && haystack[haystack.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}
