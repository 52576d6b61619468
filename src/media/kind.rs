//! Media kinds derived from file extensions.

use std::fmt;

use serde::{Deserialize, Serialize};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "avif"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "m4v", "mov", "ogv"];
const AUDIO_EXTENSIONS: &[&str] = &["ogg", "mp3", "wav", "m4a", "flac", "opus"];

/// Broad category of an attachment, used to pick how it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    #[default]
    Other,
}

impl MediaKind {
    /// Looks up an extension (without the dot, any case).
    ///
    /// ```
    /// use beepex::media::MediaKind;
    ///
    /// assert_eq!(MediaKind::from_extension("JPG"), MediaKind::Image);
    /// assert_eq!(MediaKind::from_extension("opus"), MediaKind::Audio);
    /// assert_eq!(MediaKind::from_extension("pdf"), MediaKind::Other);
    /// ```
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        let ext = ext.as_str();
        if IMAGE_EXTENSIONS.contains(&ext) {
            MediaKind::Image
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            MediaKind::Video
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            MediaKind::Audio
        } else {
            MediaKind::Other
        }
    }

    /// Looks up the extension of a file name.
    pub fn from_file_name(name: &str) -> Self {
        name.rsplit_once('.')
            .map(|(_, ext)| Self::from_extension(ext))
            .unwrap_or(MediaKind::Other)
    }

    /// Maps the Beeper attachment `type` field.
    pub fn from_type_hint(hint: &str) -> Self {
        match hint {
            "img" | "image" | "sticker" => MediaKind::Image,
            "video" => MediaKind::Video,
            "audio" | "voice" => MediaKind::Audio,
            _ => MediaKind::Other,
        }
    }

    /// Kinds the collector tries to thumbnail.
    pub fn is_visual(&self) -> bool {
        matches!(self, MediaKind::Image | MediaKind::Video)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Other => "other",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
