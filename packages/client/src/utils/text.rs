//! Text cleanup helpers for export formats
//!
//! WorkFlowy list names and notes may contain inline HTML tags
//! (`<b>`, `<i>`, time tags, mention spans) and a small set of HTML
//! entities. The plain text exporter wants neither; the OPML exporter
//! needs attribute-safe XML escaping.

use regex::Regex;
use std::sync::LazyLock;

/// Matches any HTML-ish tag, opening or closing, including attributes.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Strip HTML-ish tags from content, keeping the inner text.
///
/// # Examples
///
/// ```
/// use workflowy_client::utils::strip_tags;
///
/// assert_eq!(strip_tags("<b>bold</b> name"), "bold name");
/// assert_eq!(strip_tags("no markup"), "no markup");
/// ```
pub fn strip_tags(content: &str) -> String {
    TAG_RE.replace_all(content, "").to_string()
}

/// Decode the three HTML entities WorkFlowy stores in list content.
///
/// Only `&lt;`, `&gt;` and `&amp;` are decoded; `&amp;` goes last so
/// that `&amp;lt;` decodes to the literal text `&lt;` rather than `<`.
pub fn decode_entities(content: &str) -> String {
    content
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Escape text for use inside an OPML attribute value.
///
/// The ampersand is escaped first and already-escaped `&amp;` sequences
/// are collapsed back, so source text that mixes raw `&` and `&amp;`
/// normalizes to a single level of escaping instead of double-escaping.
pub fn escape_xml(content: &str) -> String {
    content
        .replace('&', "&amp;")
        .replace("&amp;amp;", "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
