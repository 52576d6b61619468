//! The media gallery page.
//!
//! Every exported attachment becomes one tile, in the order the entries are
//! given. Tiles link to the full file and back to the message that sent it.
//! The page embeds the full listing as JSON in
//! `<script type="application/json" id="media-index">`, one
//! `[fileName, messageId, hasThumbnail, threadHref, chatName]` tuple per tile,
//! and `assets/gallery.js` filters tiles from the search box.

use std::path::Path;

use super::html::{GALLERY_SCRIPT_HREF, document_end, document_start, escape, nav};
use super::write_page;
use crate::core::models::MediaEntry;
use crate::error::Result;
use crate::media::MediaKind;

/// One row of the embedded media index.
type IndexRow<'a> = (&'a str, &'a str, bool, &'a str, &'a str);

/// The embedded media index as JSON, safe to place inside a `<script>` element.
pub fn media_index_json(entries: &[MediaEntry]) -> Result<String> {
    let rows: Vec<IndexRow<'_>> = entries
        .iter()
        .map(|e| {
            (
                e.file_name.as_str(),
                e.message_id.as_str(),
                e.has_thumb,
                e.thread_href.as_str(),
                e.chat_name.as_str(),
            )
        })
        .collect();
    let json = serde_json::to_string(&rows)?;
    Ok(json.replace("</", "<\\/"))
}

/// Renders the gallery page.
///
/// # Errors
///
/// Returns [`BeepexError::Json`](crate::BeepexError::Json) if the media index
/// cannot be serialized.
pub fn render_gallery(entries: &[MediaEntry]) -> Result<String> {
    let mut out = String::with_capacity(2048 + entries.len() * 384);
    document_start(&mut out, "Media gallery");
    nav(&mut out);

    out.push_str("<header class=\"gallery-header\">\n<h1>Media gallery</h1>\n");
    out.push_str(&format!(
        "<p class=\"gallery-count\" id=\"gallery-count\">{} files</p>\n",
        entries.len()
    ));
    out.push_str(
        "<input type=\"search\" id=\"gallery-search\" placeholder=\"Filter by chat, date or file name\" autocomplete=\"off\">\n",
    );
    out.push_str("</header>\n");

    out.push_str("<main class=\"gallery\" id=\"gallery\">\n");
    for entry in entries {
        write_tile(&mut out, entry);
    }
    out.push_str("</main>\n");

    out.push_str(&format!(
        "<script type=\"application/json\" id=\"media-index\">{}</script>\n",
        media_index_json(entries)?
    ));
    out.push_str(&format!("<script src=\"{GALLERY_SCRIPT_HREF}\"></script>\n"));

    document_end(&mut out);
    Ok(out)
}

/// Renders and writes the gallery page to `path`.
pub fn write_gallery(path: &Path, entries: &[MediaEntry]) -> Result<()> {
    write_page(path, &render_gallery(entries)?)
}

fn write_tile(out: &mut String, entry: &MediaEntry) {
    let label = entry.label();
    let search = format!("{} {} {}", entry.chat_name, label, entry.file_name).to_lowercase();
    let media_href = escape(&entry.media_href());

    out.push_str(&format!(
        "<figure class=\"tile tile-{}\" data-search=\"{}\">\n",
        entry.kind,
        escape(&search)
    ));

    let preview = match entry.kind {
        MediaKind::Image => format!(
            "<img loading=\"lazy\" src=\"{}\" alt=\"{}\">",
            escape(&entry.thumb_href()),
            escape(&entry.file_name)
        ),
        MediaKind::Video if entry.has_thumb => format!(
            "<img loading=\"lazy\" src=\"{}\" alt=\"{}\"><span class=\"tile-play\">&#x25B6;&#xFE0E;</span>",
            escape(&entry.thumb_href()),
            escape(&entry.file_name)
        ),
        MediaKind::Video => format!("<video muted preload=\"metadata\" src=\"{media_href}\"></video>"),
        MediaKind::Audio => "<span class=\"tile-icon\">&#x1F3B5;</span>".to_string(),
        MediaKind::Other => "<span class=\"tile-icon\">&#x1F4CE;</span>".to_string(),
    };
    out.push_str(&format!("<a class=\"tile-media\" href=\"{media_href}\">{preview}</a>\n"));

    out.push_str(&format!(
        "<figcaption><a class=\"tile-backlink\" href=\"{}\">{}</a> <span class=\"tile-chat\">{}</span></figcaption>\n",
        escape(&entry.backlink_href()),
        escape(&label),
        escape(&entry.chat_name)
    ));
    out.push_str("</figure>\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(file_name: &str, message_id: &str, chat_name: &str, has_thumb: bool) -> MediaEntry {
        MediaEntry {
            file_name: file_name.into(),
            kind: MediaKind::from_file_name(file_name),
            message_id: message_id.into(),
            chat_id: "c1".into(),
            chat_name: chat_name.into(),
            thread_href: format!("{chat_name}.html"),
            has_thumb,
        }
    }

    #[test]
    fn test_tiles_keep_entry_order() {
        let entries = vec![
            entry("2024-05-02_10-00-00_b.jpg", "m2", "Bob", true),
            entry("2024-05-01_09-00-00_a.jpg", "m1", "Alice", false),
        ];
        let html = render_gallery(&entries).unwrap();
        let b = html.find("thumbs/2024-05-02_10-00-00_b.jpg.webp").unwrap();
        let a = html.find("media/2024-05-01_09-00-00_a.jpg").unwrap();
        assert!(b < a);
        assert!(html.contains("href=\"Alice.html#msg-m1\""));
        assert!(html.contains(">2024-05-01 09:00</a>"));
        assert!(html.contains("2 files"));
    }

    #[test]
    fn test_embedded_index() {
        let entries = vec![entry("x.png", "m1", "Alice", true)];
        let json = media_index_json(&entries).unwrap();
        assert_eq!(json, r#"[["x.png","m1",true,"Alice.html","Alice"]]"#);

        let html = render_gallery(&entries).unwrap();
        assert!(html.contains(&format!("id=\"media-index\">{json}</script>")));
        assert!(html.contains("src=\"assets/gallery.js\""));
        assert!(html.contains("loading=\"lazy\""));
    }

    #[test]
    fn test_index_cannot_close_script() {
        let entries = vec![entry("a.png", "m1", "</script><b>", false)];
        let json = media_index_json(&entries).unwrap();
        assert!(!json.contains("</script>"));

        let html = render_gallery(&entries).unwrap();
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn test_non_visual_tiles() {
        let entries = vec![
            entry("song.mp3", "m1", "Alice", false),
            entry("doc.pdf", "m2", "Alice", false),
        ];
        let html = render_gallery(&entries).unwrap();
        assert!(html.contains("tile tile-audio"));
        assert!(html.contains("tile tile-other"));
    }

    #[test]
    fn test_empty_gallery() {
        let html = render_gallery(&[]).unwrap();
        assert!(html.contains("0 files"));
        assert!(html.contains("id=\"media-index\">[]</script>"));
    }
}
