//! Output filename derivation
//!
//! Every file lands in one flat directory, so names coming from the server
//! or the browser are reduced to a single safe path component here.

use crate::config::ExtractionConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Characters that are unsafe in a filename on common filesystems
static ILLEGAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/*?:"<>|\n\r\t]"#).expect("illegal-char pattern is valid"));

/// `filename=` and `filename*=` parameters, quoted or bare
static DISPOSITION_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bfilename(\*)?\s*=\s*(?:"([^"]*)"|([^;]+))"#)
        .expect("disposition pattern is valid")
});

const RESOURCE_EXTENSION: &str = ".pdf";

/// Makes `name` safe to use as a single path component
///
/// Trims surrounding whitespace, replaces illegal characters with `_`, caps
/// the UTF-8 length at `max_len` bytes without splitting a character, and
/// falls back to `fallback` when nothing is left.
///
/// # Examples
///
/// ```
/// use combo_harvest::extract::sanitize;
///
/// assert_eq!(sanitize("  a/b:c.pdf ", 150, "untitled"), "a_b_c.pdf");
/// assert_eq!(sanitize("   ", 150, "untitled"), "untitled");
/// ```
pub fn sanitize(name: &str, max_len: usize, fallback: &str) -> String {
    let replaced = ILLEGAL.replace_all(name.trim(), "_");
    let end = replaced
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|&end| end <= max_len)
        .last()
        .unwrap_or(0);
    let capped = replaced[..end].trim_end();
    if capped.is_empty() {
        fallback.to_string()
    } else {
        capped.to_string()
    }
}

/// Pulls the filename out of a `Content-Disposition` header value
///
/// `filename*` wins over `filename`. For the extended form the
/// `charset'lang'` prefix is dropped and the rest is percent-decoded.
/// Surrounding quotes are stripped from either form.
pub fn disposition_filename(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for caps in DISPOSITION_PARAM.captures_iter(header) {
        let raw = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().trim().trim_matches(|c| c == '"' || c == '\''))
            .unwrap_or_default();

        if caps.get(1).is_some() {
            let encoded = raw.rsplit_once("''").map(|(_, v)| v).unwrap_or(raw);
            let decoded = urlencoding::decode(encoded)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| encoded.to_string());
            extended = Some(decoded);
        } else {
            plain = Some(raw.to_string());
        }
    }

    extended
        .or(plain)
        .filter(|name| !name.trim().is_empty())
}

/// Last non-empty path segment of `url`, percent-decoded
fn url_basename(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?;
    Some(
        urlencoding::decode(segment)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| segment.to_string()),
    )
}

/// Appends the resource extension unless already present (any case)
pub fn ensure_resource_extension(name: String) -> String {
    let lower = name.to_lowercase();
    if lower.ends_with(RESOURCE_EXTENSION) {
        name
    } else {
        name + RESOURCE_EXTENSION
    }
}

/// Name for a directly fetched resource
///
/// Uses the `Content-Disposition` filename when present, else the URL's last
/// path segment, else the configured placeholder. The result is sanitized
/// and always ends in `.pdf`.
///
/// # Arguments
///
/// * `content_disposition` - Raw header value, if the response had one
/// * `url` - The URL the resource was fetched from
/// * `config` - Sanitization limits and placeholders
pub fn resource_filename(
    content_disposition: Option<&str>,
    url: &Url,
    config: &ExtractionConfig,
) -> String {
    let raw = content_disposition
        .and_then(disposition_filename)
        .or_else(|| url_basename(url))
        .unwrap_or_else(|| config.fallback_resource_name.clone());

    ensure_resource_extension(sanitize(
        &raw,
        config.max_filename_len,
        &config.fallback_filename,
    ))
}

/// Name for a file captured from a click-triggered download
pub fn download_filename(suggested: &str, config: &ExtractionConfig) -> String {
    sanitize(suggested, config.max_filename_len, &config.fallback_filename)
}
