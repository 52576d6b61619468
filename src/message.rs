//! Message and attachment records as returned by the Beeper Desktop API.
//!
//! # Overview
//!
//! A [`Message`] is an immutable snapshot: who sent it, when, its optional text
//! and an ordered list of [`Attachment`]s. Attachments only carry a source
//! reference; their bytes are fetched lazily through
//! [`ChatSource::fetch_attachment`](crate::source::ChatSource::fetch_attachment).
//!
//! # Examples
//!
//! ```
//! use beepex::{Attachment, Message};
//! use chrono::{TimeZone, Utc};
//!
//! let ts = Utc.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).unwrap();
//! let msg = Message::new("m1", "c1", "Alice", ts)
//!     .with_text("look at this")
//!     .with_attachment(Attachment::new("photo.jpg", "file:///tmp/photo.jpg"));
//!
//! assert_eq!(msg.attachments.len(), 1);
//! assert!(msg.has_attachments());
//! ```
//!
//! ## Deserializing API payloads
//!
//! ```
//! use beepex::Message;
//!
//! let json = r#"{
//!     "id": "m1", "chatID": "c1", "senderID": "@alice", "senderName": "Alice",
//!     "timestamp": "2024-05-01T14:30:00Z", "text": "hi", "isSender": true
//! }"#;
//! let msg: Message = serde_json::from_str(json)?;
//! assert_eq!(msg.sender_name, "Alice");
//! assert!(msg.is_sender);
//! # Ok::<(), serde_json::Error>(())
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::media::MediaKind;

/// A chat message.
///
/// Field names follow the Beeper Desktop API (`chatID`, `senderName`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message identifier, unique within its chat.
    #[serde(alias = "messageID")]
    pub id: String,

    /// Owning chat.
    #[serde(rename = "chatID")]
    pub chat_id: String,

    /// Sender identifier (may be empty for system messages).
    #[serde(rename = "senderID", default)]
    pub sender_id: String,

    /// Display name of the sender.
    #[serde(default)]
    pub sender_name: String,

    /// `true` when the exporting user sent this message.
    #[serde(default)]
    pub is_sender: bool,

    /// When the message was sent.
    pub timestamp: DateTime<Utc>,

    /// Opaque ordering key assigned by Beeper, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<String>,

    /// Text body, absent for pure media messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Attachments in display order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Creates a message without text or attachments.
    pub fn new(
        id: impl Into<String>,
        chat_id: impl Into<String>,
        sender_name: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            chat_id: chat_id.into(),
            sender_id: String::new(),
            sender_name: sender_name.into(),
            is_sender: false,
            timestamp,
            sort_key: None,
            text: None,
            attachments: Vec::new(),
        }
    }

    /// Builder method to set the text body.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder method to set the sender id.
    #[must_use]
    pub fn with_sender_id(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = sender_id.into();
        self
    }

    /// Builder method to mark the message as sent by the exporting user.
    #[must_use]
    pub fn sent_by_self(mut self) -> Self {
        self.is_sender = true;
        self
    }

    /// Builder method to append an attachment.
    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Returns `true` if the message references any attachment.
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// Returns the text body, or an empty string.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

/// Pixel dimensions reported by the API for images and videos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentSize {
    pub width: u32,
    pub height: u32,
}

/// A media file referenced by a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Original file name, if the network provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Source reference: `mxc://`, `localmxc://`, `file://` or `http(s)://`.
    #[serde(rename = "srcURL")]
    pub src_url: String,

    /// Vendor type hint (`img`, `video`, `audio`, `unknown`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,

    /// MIME type, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Pixel size, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<AttachmentSize>,
}

impl Attachment {
    /// Creates an attachment from a file name and source URL.
    pub fn new(file_name: impl Into<String>, src_url: impl Into<String>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            src_url: src_url.into(),
            type_hint: None,
            mime_type: None,
            size: None,
        }
    }

    /// Builder method to set the vendor type hint.
    #[must_use]
    pub fn with_type_hint(mut self, hint: impl Into<String>) -> Self {
        self.type_hint = Some(hint.into());
        self
    }

    /// Builder method to set the pixel size.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some(AttachmentSize { width, height });
        self
    }

    /// The file name to export under.
    ///
    /// Falls back to the last path segment of the source URL, then to
    /// `"attachment"`.
    pub fn display_name(&self) -> &str {
        if let Some(name) = self.file_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name;
        }
        self.src_url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty() && !s.contains(':'))
            .unwrap_or("attachment")
    }

    /// Media kind derived from the file extension.
    ///
    /// Names without an extension fall back to the vendor type hint.
    pub fn kind(&self) -> MediaKind {
        let name = self.display_name();
        if has_extension(name) {
            MediaKind::from_file_name(name)
        } else {
            self.type_hint
                .as_deref()
                .map(MediaKind::from_type_hint)
                .unwrap_or(MediaKind::Other)
        }
    }
}

fn has_extension(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_message_builder() {
        let msg = Message::new("m1", "c1", "Alice", ts())
            .with_text("hello")
            .with_sender_id("@alice")
            .sent_by_self();
        assert_eq!(msg.text(), "hello");
        assert_eq!(msg.sender_id, "@alice");
        assert!(msg.is_sender);
        assert!(!msg.has_attachments());
    }

    #[test]
    fn test_deserialize_api_message() {
        let json = r#"{
            "messageID": "m9",
            "chatID": "c1",
            "senderName": "Bob",
            "timestamp": "2024-05-01T14:30:00Z",
            "attachments": [
                {"type": "img", "srcURL": "mxc://server/abc", "fileName": "cat.png",
                 "size": {"width": 640, "height": 480}}
            ]
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, "m9");
        assert_eq!(msg.timestamp, ts());
        assert!(msg.text.is_none());
        assert_eq!(msg.attachments[0].kind(), MediaKind::Image);
        assert_eq!(
            msg.attachments[0].size,
            Some(AttachmentSize {
                width: 640,
                height: 480
            })
        );
    }

    #[test]
    fn test_display_name_fallbacks() {
        let named = Attachment::new("a.mp3", "file:///x/y.bin");
        assert_eq!(named.display_name(), "a.mp3");

        let mut unnamed = Attachment::new("", "file:///cache/voice.ogg");
        unnamed.file_name = None;
        assert_eq!(unnamed.display_name(), "voice.ogg");

        let mut bare = Attachment::new("", "mxc://");
        bare.file_name = None;
        assert_eq!(bare.display_name(), "attachment");
    }

    #[test]
    fn test_kind_falls_back_to_type_hint() {
        let att = Attachment::new("IMG", "mxc://s/1").with_type_hint("img");
        assert_eq!(att.kind(), MediaKind::Image);

        let att = Attachment::new("clip.MOV", "mxc://s/2").with_type_hint("img");
        assert_eq!(att.kind(), MediaKind::Video);

        let att = Attachment::new("notes.txt", "mxc://s/3");
        assert_eq!(att.kind(), MediaKind::Other);
    }
}
