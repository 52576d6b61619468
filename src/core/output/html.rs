//! HTML building blocks shared by the page renderers.

use std::sync::LazyLock;

use chrono::{DateTime, Local, Utc};
use regex::{Captures, Regex};

/// Stylesheet link target, relative to the output root.
pub const STYLESHEET_HREF: &str = "assets/beepex.css";

/// Gallery script, relative to the output root.
pub const GALLERY_SCRIPT_HREF: &str = "assets/gallery.js";

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bhttps?://(?:[^\s<>"'&]|&amp;)+"#).unwrap());

/// Characters that end a sentence rather than a URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ':', '!', '?', ')', ']', '\''];

/// Escapes text for use in element content and attribute values.
///
/// ```
/// use beepex::core::output::escape;
///
/// assert_eq!(escape(r#"<a href="x">&</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
/// ```
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escapes text for element content only; quotes stay readable.
fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Wraps `http(s)://` URLs in already-escaped text with links.
pub fn linkify(escaped: &str) -> String {
    URL.replace_all(escaped, |caps: &Captures<'_>| {
        let matched = &caps[0];
        let url = matched.trim_end_matches(TRAILING_PUNCTUATION);
        let tail = &matched[url.len()..];
        format!(r#"<a href="{url}" rel="noopener noreferrer">{url}</a>{tail}"#)
    })
    .into_owned()
}

/// Message text as HTML: escaped, linkified, newlines as `<br>`.
///
/// ```
/// use beepex::core::output::text_to_html;
///
/// assert_eq!(
///     text_to_html("see https://example.com.\n<ok>"),
///     "see <a href=\"https://example.com\" rel=\"noopener noreferrer\">https://example.com</a>.<br>\n&lt;ok&gt;"
/// );
/// ```
pub fn text_to_html(text: &str) -> String {
    linkify(&escape_text(text)).replace('\n', "<br>\n")
}

/// Timestamp in the local zone of the machine running the export.
pub fn local_time(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn utc_time(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Opening markup of a page, through `<body>`.
pub(crate) fn document_start(out: &mut String, title: &str) {
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("  <meta charset=\"UTF-8\">\n");
    out.push_str(
        "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    out.push_str(&format!(
        "  <meta name=\"generator\" content=\"beepex {}\">\n",
        env!("CARGO_PKG_VERSION")
    ));
    out.push_str(&format!("  <title>{}</title>\n", escape(title)));
    out.push_str(&format!(
        "  <link rel=\"stylesheet\" href=\"{STYLESHEET_HREF}\">\n"
    ));
    out.push_str("</head>\n<body>\n");
}

/// Site navigation shown on every page.
pub(crate) fn nav(out: &mut String) {
    out.push_str(
        "<nav class=\"site-nav\"><a href=\"index.html\">Chats</a> <a href=\"gallery.html\">Gallery</a></nav>\n",
    );
}

pub(crate) fn document_end(out: &mut String) {
    out.push_str("</body>\n</html>\n");
}
