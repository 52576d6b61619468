//! The chat index page (`index.html`).

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Local, Utc};

use super::html::{document_end, document_start, escape, nav};
use super::write_page;
use crate::core::models::ChatPage;
use crate::core::naming::href_segment;
use crate::error::Result;

/// Group heading for chats without a network name.
const UNKNOWN_NETWORK: &str = "Other";

/// Renders the chat index: pages grouped by network, networks and chats
/// sorted case-insensitively.
pub fn render_index(pages: &[ChatPage], exported_at: DateTime<Utc>) -> String {
    let mut networks: BTreeMap<String, (&str, Vec<&ChatPage>)> = BTreeMap::new();
    for page in pages {
        let name = if page.network.trim().is_empty() {
            UNKNOWN_NETWORK
        } else {
            page.network.as_str()
        };
        networks
            .entry(name.to_lowercase())
            .or_insert_with(|| (name, Vec::new()))
            .1
            .push(page);
    }

    let mut out = String::with_capacity(1024 + pages.len() * 128);
    document_start(&mut out, "Beeper Chats");
    nav(&mut out);
    out.push_str("<h1>Beeper Chats</h1>\n");

    let local = exported_at.with_timezone(&Local);
    out.push_str(&format!(
        "<p class=\"export-info\">Exported on {} at {}, {} chats</p>\n",
        local.format("%Y-%m-%d"),
        local.format("%H:%M:%S"),
        pages.len()
    ));
    out.push_str("<p><a href=\"gallery.html\">Media gallery</a></p>\n");

    out.push_str("<ul class=\"networks\">\n");
    for (name, mut chats) in networks.into_values() {
        chats.sort_by_cached_key(|p| (p.title.to_lowercase(), p.chat_id.clone()));
        out.push_str(&format!("<li>{}\n<ul>\n", escape(name)));
        for page in chats {
            out.push_str(&format!(
                "<li><a href=\"{}\">{}</a> <span class=\"chat-stats\">{} messages",
                escape(&href_segment(&page.href)),
                escape(&page.title),
                page.message_count
            ));
            if page.media_count > 0 {
                out.push_str(&format!(", {} media", page.media_count));
            }
            out.push_str("</span></li>\n");
        }
        out.push_str("</ul>\n</li>\n");
    }
    out.push_str("</ul>\n");

    document_end(&mut out);
    out
}

/// Renders and writes the chat index to `path`.
pub fn write_index(path: &Path, pages: &[ChatPage], exported_at: DateTime<Utc>) -> Result<()> {
    write_page(path, &render_index(pages, exported_at))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(title: &str, network: &str, href: &str) -> ChatPage {
        ChatPage {
            chat_id: href.trim_end_matches(".html").to_string(),
            title: title.into(),
            network: network.into(),
            href: href.into(),
            message_count: 3,
            media_count: 0,
        }
    }

    #[test]
    fn test_grouped_and_sorted() {
        let pages = vec![
            page("zoe", "WhatsApp", "zoe.html"),
            page("Book club", "signal", "Book club.html"),
            page("alice", "WhatsApp", "alice.html"),
            page("Loose", "", "Loose.html"),
        ];
        let html = render_index(&pages, Utc::now());

        let other = html.find("<li>Other").unwrap();
        let signal = html.find("<li>signal").unwrap();
        let whatsapp = html.find("<li>WhatsApp").unwrap();
        assert!(other < signal && signal < whatsapp);

        let alice = html.find("href=\"alice.html\"").unwrap();
        let zoe = html.find("href=\"zoe.html\"").unwrap();
        assert!(whatsapp < alice && alice < zoe);
        assert!(html.contains("4 chats"));
        assert!(html.contains("href=\"gallery.html\""));
    }

    #[test]
    fn test_titles_escaped() {
        let html = render_index(&[page("<i>x</i>", "Telegram", "x.html")], Utc::now());
        assert!(html.contains("&lt;i&gt;x&lt;/i&gt;"));
    }

    #[test]
    fn test_page_links_are_percent_encoded() {
        let pages = vec![
            page("#general", "Slack", "#general.html"),
            page("Book club", "signal", "Book club.html"),
        ];
        let html = render_index(&pages, Utc::now());
        assert!(html.contains("href=\"%23general.html\""));
        assert!(html.contains("href=\"Book%20club.html\""));
    }
}
