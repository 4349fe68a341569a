use url::Url;

/// Checks whether two URLs belong to the same site
///
/// Two URLs are on the same site when their scheme, host (compared
/// lowercase) and effective port all match.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use combo_harvest::url::same_site;
///
/// let a = Url::parse("https://academy.example.com/learning").unwrap();
/// let b = Url::parse("https://ACADEMY.example.com/courses?page=2").unwrap();
/// let c = Url::parse("http://academy.example.com/learning").unwrap();
///
/// assert!(same_site(&a, &b));
/// assert!(!same_site(&a, &c));
/// ```
pub fn same_site(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && extract_host(a) == extract_host(b)
        && a.port_or_known_default() == b.port_or_known_default()
}

/// Extracts the lowercase host from a URL
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
