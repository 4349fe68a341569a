//! JavaScript evaluated inside pages
//!
//! Each builder returns a complete expression; arguments are embedded as JSON
//! literals so label text never needs manual escaping.

/// Attribute that tags download candidates with their index
pub const CANDIDATE_ATTR: &str = "data-harvest-candidate";

/// Shared visibility check: laid out, non-zero size, not hidden by style
const VISIBLE_FN: &str = r#"
    const visible = (el) => {
        const rect = el.getBoundingClientRect();
        const style = window.getComputedStyle(el);
        return rect.width > 0 && rect.height > 0
            && style.visibility !== 'hidden' && style.display !== 'none';
    };
"#;

/// Scrolls the window down by `px` pixels
pub fn scroll_by(px: u32) -> String {
    format!("(() => {{ window.scrollBy(0, {}); return true; }})()", px)
}

/// Clicks the innermost visible element whose text contains `label`
pub fn click_text(label: &str) -> String {
    format!(
        r#"((label) => {{
    {visible}
    const containing = Array.from(document.body ? document.body.querySelectorAll('*') : [])
        .filter((el) => (el.innerText || '').includes(label))
        .filter((el) => !Array.from(el.children).some((c) => (c.innerText || '').includes(label)));
    const target = containing.find(visible);
    if (!target) {{ return false; }}
    target.click();
    return true;
}})({label})"#,
        visible = VISIBLE_FN,
        label = json_string(label),
    )
}

/// Tags every visible download control and returns how many were tagged
///
/// `<a>` and `<button>` elements match on visible text; any element matches
/// on its `aria-label`. Tags from an earlier scan are cleared first.
pub fn tag_download_candidates(text_labels: &[String], aria_labels: &[String]) -> String {
    format!(
        r#"((textLabels, ariaLabels) => {{
    {visible}
    document.querySelectorAll('[{attr}]').forEach((el) => el.removeAttribute('{attr}'));
    const matches = [];
    document.querySelectorAll('a, button, [aria-label]').forEach((el) => {{
        const tag = el.tagName.toLowerCase();
        const text = el.innerText || el.textContent || '';
        const aria = el.getAttribute('aria-label') || '';
        const byText = (tag === 'a' || tag === 'button') && textLabels.some((l) => text.includes(l));
        const byAria = ariaLabels.some((l) => aria.includes(l));
        if ((byText || byAria) && visible(el)) {{ matches.push(el); }}
    }});
    matches.forEach((el, i) => el.setAttribute('{attr}', String(i)));
    return matches.length;
}})({text}, {aria})"#,
        visible = VISIBLE_FN,
        attr = CANDIDATE_ATTR,
        text = json_list(text_labels),
        aria = json_list(aria_labels),
    )
}

/// Returns whether tagged candidate `index` is still present and visible
pub fn candidate_visible(index: usize) -> String {
    format!(
        r#"(() => {{
    {visible}
    const el = document.querySelector('{selector}');
    return !!el && visible(el);
}})()"#,
        visible = VISIBLE_FN,
        selector = candidate_selector(index),
    )
}

/// CSS selector for tagged candidate `index`
pub fn candidate_selector(index: usize) -> String {
    format!("[{}=\"{}\"]", CANDIDATE_ATTR, index)
}

fn json_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn json_list(items: &[String]) -> String {
    serde_json::Value::Array(
        items
            .iter()
            .map(|s| serde_json::Value::String(s.clone()))
            .collect(),
    )
    .to_string()
}
