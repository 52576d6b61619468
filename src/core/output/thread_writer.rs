//! Per-chat thread page.

use std::collections::HashMap;
use std::path::Path;

use super::html::{document_end, document_start, escape, local_time, nav, text_to_html, utc_time};
use super::write_page;
use crate::core::models::{Chat, MediaEntry};
use crate::core::naming::anchor_id;
use crate::error::Result;
use crate::media::MediaKind;
use crate::message::Message;

/// Renders the thread page of `chat`.
///
/// `messages` are rendered in the given order. `media` holds the exported
/// attachments of those messages; each is shown inline under the message whose
/// id it carries.
pub fn render_thread(chat: &Chat, messages: &[Message], media: &[MediaEntry]) -> String {
    let mut by_message: HashMap<&str, Vec<&MediaEntry>> = HashMap::new();
    for entry in media {
        by_message
            .entry(entry.message_id.as_str())
            .or_default()
            .push(entry);
    }

    let mut out = String::with_capacity(1024 + messages.len() * 256);
    document_start(&mut out, &format!("Chat: {}", chat.title));
    nav(&mut out);
    write_header(&mut out, chat);

    out.push_str("<main class=\"thread\">\n");
    for msg in messages {
        let entries = by_message.get(msg.id.as_str()).map_or(&[][..], Vec::as_slice);
        write_message(&mut out, msg, entries);
    }
    if messages.is_empty() {
        out.push_str("<p class=\"empty\">No messages.</p>\n");
    }
    out.push_str("</main>\n");

    document_end(&mut out);
    out
}

/// Renders and writes the thread page to `path`.
pub fn write_thread(
    path: &Path,
    chat: &Chat,
    messages: &[Message],
    media: &[MediaEntry],
) -> Result<()> {
    write_page(path, &render_thread(chat, messages, media))
}

fn write_header(out: &mut String, chat: &Chat) {
    out.push_str("<header class=\"chat-header\">\n");
    out.push_str(&format!("<h1>{}</h1>\n", escape(&chat.title)));
    out.push_str("<details>\n<summary>Details</summary>\n");
    for (label, value) in [
        ("Network", chat.network.as_str()),
        ("Account ID", chat.account_id.as_str()),
        ("Chat ID", chat.id.as_str()),
    ] {
        out.push_str(&format!(
            "<div><span class=\"chat-details-label\">{label}: </span><span>{}</span></div>\n",
            escape(value)
        ));
    }
    let names = chat.participant_names();
    if !names.is_empty() {
        out.push_str("<div><span class=\"chat-details-label\">Participants:</span></div>\n<ul class=\"participants\">\n");
        for name in names {
            out.push_str(&format!("<li>{}</li>\n", escape(name)));
        }
        out.push_str("</ul>\n");
    }
    out.push_str("</details>\n</header>\n");
}

fn write_message(out: &mut String, msg: &Message, media: &[&MediaEntry]) {
    let anchor = anchor_id(&msg.id);
    let class = if msg.is_sender { "msg-self" } else { "msg-them" };
    let sender = if msg.sender_name.is_empty() {
        msg.sender_id.as_str()
    } else {
        msg.sender_name.as_str()
    };

    out.push_str(&format!("<section class=\"msg {class}\" id=\"{anchor}\">\n"));
    out.push_str(&format!(
        "<div class=\"msg-header\"><span class=\"msg-contact-name\">{}</span> \
         <time class=\"msg-datetime\" datetime=\"{}\" title=\"{}\">{}</time> \
         <a class=\"permalink\" title=\"Message {}\" href=\"#{anchor}\">&#x1F517;&#xFE0E;</a></div>\n",
        escape(sender),
        msg.timestamp.to_rfc3339(),
        utc_time(&msg.timestamp),
        local_time(&msg.timestamp),
        escape(&msg.id),
    ));

    if let Some(text) = msg.text.as_deref().filter(|t| !t.is_empty()) {
        out.push_str(&format!("<div class=\"msg-text\">{}</div>\n", text_to_html(text)));
    }

    if !media.is_empty() {
        out.push_str("<div class=\"msg-media\">\n");
        for entry in media {
            write_media(out, entry);
        }
        out.push_str("</div>\n");
    }
    out.push_str("</section>\n");
}

fn write_media(out: &mut String, entry: &MediaEntry) {
    let href = escape(&entry.media_href());
    let name = escape(&entry.file_name);
    match entry.kind {
        MediaKind::Image => out.push_str(&format!(
            "<a href=\"{href}\"><img loading=\"lazy\" src=\"{href}\" alt=\"{name}\"></a>\n"
        )),
        MediaKind::Video => {
            let poster = if entry.has_thumb {
                format!(" poster=\"{}\"", escape(&entry.thumb_href()))
            } else {
                String::new()
            };
            out.push_str(&format!(
                "<video controls playsinline preload=\"metadata\"{poster} src=\"{href}\"></video>\n"
            ));
        }
        MediaKind::Audio => out.push_str(&format!(
            "<audio controls preload=\"none\" src=\"{href}\"></audio>\n"
        )),
        MediaKind::Other => out.push_str(&format!(
            "<a class=\"attachment\" href=\"{href}\" download>&#x1F4CE; {name}</a>\n"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Participant;
    use chrono::{TimeZone, Utc};

    fn chat() -> Chat {
        Chat::new("c1", "Family <3", "a1")
            .with_network("WhatsApp")
            .with_participant(Participant::new("u2", "zed"))
            .with_participant(Participant::new("u1", "Anna"))
    }

    fn entry(message_id: &str, file_name: &str, kind: MediaKind) -> MediaEntry {
        MediaEntry {
            file_name: file_name.into(),
            kind,
            message_id: message_id.into(),
            chat_id: "c1".into(),
            chat_name: "Family".into(),
            thread_href: "Family.html".into(),
            has_thumb: false,
        }
    }

    fn ts(minute: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 14, minute, 0).unwrap()
    }

    #[test]
    fn test_header_lists_details() {
        let html = render_thread(&chat(), &[], &[]);
        assert!(html.contains("<h1>Family &lt;3</h1>"));
        assert!(html.contains("WhatsApp"));
        assert!(html.contains("Chat ID: </span><span>c1"));
        let anna = html.find("<li>Anna</li>").unwrap();
        let zed = html.find("<li>zed</li>").unwrap();
        assert!(anna < zed);
        assert!(html.contains("No messages."));
    }

    #[test]
    fn test_messages_have_anchors_and_classes() {
        let messages = vec![
            Message::new("m1", "c1", "Anna", ts(0)).with_text("hi <b>"),
            Message::new("m2", "c1", "Me", ts(1)).sent_by_self(),
        ];
        let html = render_thread(&chat(), &messages, &[]);
        assert!(html.contains("class=\"msg msg-them\" id=\"msg-m1\""));
        assert!(html.contains("class=\"msg msg-self\" id=\"msg-m2\""));
        assert!(html.contains("href=\"#msg-m1\""));
        assert!(html.contains("hi &lt;b&gt;"));
        assert!(html.contains("title=\"2024-05-01 14:00:00 UTC\""));
        assert!(html.find("msg-m1").unwrap() < html.find("msg-m2").unwrap());
    }

    #[test]
    fn test_media_rendered_under_owning_message() {
        let messages = vec![
            Message::new("m1", "c1", "Anna", ts(0)),
            Message::new("m2", "c1", "Anna", ts(1)),
        ];
        let media = vec![
            entry("m2", "clip.mp4", MediaKind::Video),
            entry("m1", "cat.png", MediaKind::Image),
            entry("m2", "notes.pdf", MediaKind::Other),
        ];
        let html = render_thread(&chat(), &messages, &media);

        let m2 = html.find("id=\"msg-m2\"").unwrap();
        assert!(html.find("media/cat.png").unwrap() < m2);
        assert!(html.find("<video").unwrap() > m2);
        assert!(html.contains("<img loading=\"lazy\" src=\"media/cat.png\""));
        assert!(html.contains("href=\"media/notes.pdf\" download"));
    }
}
