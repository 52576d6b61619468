//! File names, anchors and labels shared by the media collector and the renderer.
//!
//! # Examples
//!
//! ```
//! use beepex::core::naming::{sanitize_file_name, timestamp_label};
//!
//! assert_eq!(sanitize_file_name("a/b: c?"), "ab c");
//! assert_eq!(sanitize_file_name("con"), "con_");
//! assert_eq!(timestamp_label("2024-05-01_14-30-12_photo.jpg"), "2024-05-01 14:30");
//! assert_eq!(timestamp_label("photo.jpg"), "photo.jpg");
//! ```

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::Regex;

/// Names Windows refuses as file names, compared case-insensitively.
const RESERVED_NAMES: &[&str] = &[
    "aux", "con", "nul", "prn", "com0", "com1", "com2", "com3", "com4", "com5", "com6", "com7",
    "com8", "com9", "lpt0", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// Longest stem kept when building file names from user-provided text.
const MAX_STEM_CHARS: usize = 120;

/// Timestamp layout used as a prefix for exported media file names.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Bytes escaped when a file name is used as one relative URL path segment.
const HREF_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

static RESERVED_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["*/:<>?\\|\x00-\x1f]"#).unwrap());

static TIMESTAMP_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})_(\d{2})-(\d{2})").unwrap());

static ANCHOR_UNSAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

/// Percent-encodes a file name for use as a relative link.
///
/// Names may contain `#`, `%` or spaces, which a browser would otherwise read
/// as a fragment, an escape or a broken URL.
pub fn href_segment(file_name: &str) -> String {
    utf8_percent_encode(file_name, HREF_SEGMENT).to_string()
}

/// Makes `name` safe to use as a file name on every major platform.
///
/// Reserved characters are removed, surrounding whitespace and dots are
/// stripped, an empty result becomes `_` and reserved device names get a
/// trailing `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned = RESERVED_CHARS.replace_all(name, "");
    let trimmed: String = cleaned
        .trim_matches(|c: char| c.is_whitespace() || c == '.')
        .chars()
        .take(MAX_STEM_CHARS)
        .collect();
    let mut safe = trimmed
        .trim_end_matches(|c: char| c.is_whitespace() || c == '.')
        .to_string();
    if safe.is_empty() || RESERVED_NAMES.contains(&safe.to_lowercase().as_str()) {
        safe.push('_');
    }
    safe
}

/// Splits a file name into stem and extension (with the dot).
///
/// The extension is lowercased; dotfiles and names without a dot have no extension.
pub fn split_extension(file_name: &str) -> (&str, String) {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            (stem, format!(".{}", ext.to_lowercase()))
        }
        _ => (file_name, String::new()),
    }
}

/// Preferred output name for an attachment sent at `timestamp`.
///
/// ```
/// use beepex::core::naming::media_file_name;
/// use chrono::{TimeZone, Utc};
///
/// let ts = Utc.with_ymd_and_hms(2024, 5, 1, 14, 30, 12).unwrap();
/// assert_eq!(media_file_name(ts, "My Photo.JPG"), "2024-05-01_14-30-12_My Photo.jpg");
/// ```
pub fn media_file_name(timestamp: DateTime<Utc>, original_name: &str) -> String {
    let (stem, ext) = split_extension(original_name);
    let prefixed = format!("{}_{}", timestamp.format(FILE_TIMESTAMP_FORMAT), stem);
    let ext = RESERVED_CHARS.replace_all(&ext, "");
    format!("{}{}", sanitize_file_name(&prefixed), ext)
}

/// Display label for a media file name.
///
/// Names starting with `YYYY-MM-DD_HH-MM` render as `YYYY-MM-DD HH:MM`;
/// anything else is returned verbatim.
pub fn timestamp_label(file_name: &str) -> String {
    match TIMESTAMP_PREFIX.captures(file_name) {
        Some(caps) => format!("{} {}:{}", &caps[1], &caps[2], &caps[3]),
        None => file_name.to_string(),
    }
}

/// HTML anchor for a message, usable both as `id` and URL fragment.
pub fn anchor_id(message_id: &str) -> String {
    format!("msg-{}", ANCHOR_UNSAFE.replace_all(message_id, "_"))
}
