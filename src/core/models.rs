//! Core data models: accounts, chats and exported media entries.

use serde::{Deserialize, Serialize};

use crate::core::naming::{anchor_id, href_segment, timestamp_label};
use crate::media::MediaKind;

/// Output subdirectory holding deduplicated original media files.
pub const MEDIA_DIR: &str = "media";

/// Output subdirectory holding generated thumbnails.
pub const THUMBS_DIR: &str = "thumbs";

/// A connected messaging identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account identifier.
    #[serde(rename = "accountID", alias = "id")]
    pub id: String,
    /// Network name (e.g. "WhatsApp", "Telegram").
    #[serde(default)]
    pub network: String,
    /// The logged-in user, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Participant>,
}

impl Account {
    pub fn new(id: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            network: network.into(),
            user: None,
        }
    }

    /// Human-readable name: the user's full name, else the account id.
    pub fn display_name(&self) -> &str {
        self.user
            .as_ref()
            .map(Participant::display_name)
            .unwrap_or(&self.id)
    }
}

/// A chat participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_self: bool,
}

impl Participant {
    pub fn new(id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: Some(full_name.into()),
            is_self: false,
        }
    }

    /// Full name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.id)
    }
}

/// Wrapper matching the API's `{"items": [...]}` participant list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Participants {
    #[serde(default)]
    pub items: Vec<Participant>,
}

/// A conversation thread owned by an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    /// Chat identifier.
    pub id: String,
    /// Display name; replaced by the remap table when an override exists.
    #[serde(default)]
    pub title: String,
    /// Owning account.
    #[serde(rename = "accountID")]
    pub account_id: String,
    /// Network name.
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub participants: Participants,
}

impl Chat {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            account_id: account_id.into(),
            network: String::new(),
            participants: Participants::default(),
        }
    }

    #[must_use]
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    #[must_use]
    pub fn with_participant(mut self, participant: Participant) -> Self {
        self.participants.items.push(participant);
        self
    }

    /// Returns a copy of this chat carrying a different title.
    #[must_use]
    pub fn renamed(&self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self.clone()
        }
    }

    /// Participant display names sorted case-insensitively.
    pub fn participant_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .participants
            .items
            .iter()
            .map(Participant::display_name)
            .collect();
        names.sort_by_key(|n| n.to_lowercase());
        names
    }
}

/// An exported, deduplicated attachment plus its backlink metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEntry {
    /// File name inside the media directory.
    pub file_name: String,
    /// Kind derived from the extension.
    pub kind: MediaKind,
    /// Message that referenced the attachment.
    pub message_id: String,
    /// Chat the message belongs to.
    pub chat_id: String,
    /// Display name of the chat (after remapping).
    pub chat_name: String,
    /// Thread page of the chat, relative to the output root.
    pub thread_href: String,
    /// Whether a thumbnail was generated in the thumbnail directory.
    pub has_thumb: bool,
}

impl MediaEntry {
    /// Link to the full media file, relative to the output root.
    pub fn media_href(&self) -> String {
        format!("{MEDIA_DIR}/{}", href_segment(&self.file_name))
    }

    /// Link to the thumbnail, or the full file when none was generated.
    pub fn thumb_href(&self) -> String {
        if self.has_thumb {
            format!("{THUMBS_DIR}/{}", href_segment(&thumb_file_name(&self.file_name)))
        } else {
            self.media_href()
        }
    }

    /// Link back to the originating message.
    pub fn backlink_href(&self) -> String {
        format!(
            "{}#{}",
            href_segment(&self.thread_href),
            anchor_id(&self.message_id)
        )
    }

    /// Display label derived from the file name.
    pub fn label(&self) -> String {
        timestamp_label(&self.file_name)
    }
}

/// A written thread page, as listed on the chat index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPage {
    pub chat_id: String,
    /// Display name (after remapping).
    pub title: String,
    pub network: String,
    /// Page file name, relative to the output root.
    pub href: String,
    pub message_count: usize,
    pub media_count: usize,
}

/// Thumbnail file name for a media file: the full name plus `.webp`.
///
/// Keeping the original extension stops `x.png` and `x.jpg` sharing a thumbnail.
pub fn thumb_file_name(media_file_name: &str) -> String {
    format!("{media_file_name}.webp")
}
