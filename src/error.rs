//! Unified error types for beepex.
//!
//! Errors fall into three families that decide how an export reacts:
//!
//! | Family | Variant | Effect |
//! |--------|---------|--------|
//! | API | [`BeepexError::Api`] | Fatal, aborts the run |
//! | Configuration | [`BeepexError::Config`], [`BeepexError::RemapCsv`] | Fatal, aborts before any fetch |
//! | Media | [`BeepexError::Media`] | Recovered by the media collector, logged |
//!
//! Everything else ([`BeepexError::Io`], [`BeepexError::Json`]) is passed through
//! from the standard library and `serde_json`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized [`Result`] type for beepex operations.
///
/// # Example
///
/// ```rust
/// use beepex::error::Result;
/// use beepex::Message;
///
/// fn my_function() -> Result<Vec<Message>> {
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, BeepexError>;

/// The error type for all beepex operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BeepexError {
    /// An I/O error occurred while writing the archive.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error (gallery index, API payloads).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The Beeper Desktop API could not be used.
    ///
    /// Covers connection failures, rejected tokens, unexpected status codes
    /// and malformed responses.
    #[error("Beeper API error during {operation}: {source}")]
    Api {
        /// The operation that failed (e.g. "list chats")
        operation: String,
        /// What went wrong
        #[source]
        source: ApiErrorKind,
    },

    /// Invalid configuration (CLI arguments, env file, token).
    #[error("Configuration error: {message}{}", path.as_ref().map(|p| format!(" (file: {})", p.display())).unwrap_or_default())]
    Config {
        /// Description of what's wrong
        message: String,
        /// The offending file, if any
        path: Option<PathBuf>,
    },

    /// The chat name remap CSV could not be loaded.
    #[error("Invalid remap file {} at line {line}: {message}", path.display())]
    RemapCsv {
        /// Path to the remap CSV
        path: PathBuf,
        /// 1-based line number (0 when the file could not be read at all)
        line: u64,
        /// Description of what's wrong
        message: String,
    },

    /// An attachment could not be read or thumbnailed.
    ///
    /// The media collector recovers from these; they only surface when
    /// library users call the media helpers directly.
    #[error("Media error: {0}")]
    Media(#[from] MediaError),
}

/// Kinds of API failures.
#[derive(Debug, Error)]
pub enum ApiErrorKind {
    /// Transport-level failure (connection refused, timeout, TLS).
    #[cfg(feature = "http")]
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Beeper refused the connection; the Desktop API is probably disabled.
    #[error("cannot connect to {url}, make sure the Beeper Desktop API is enabled")]
    Unreachable {
        /// Base URL that was tried
        url: String,
    },

    /// The access token was rejected.
    #[error("access token is invalid or expired (HTTP {status})")]
    Unauthorized {
        /// 401 or 403
        status: u16,
    },

    /// Any other non-success status code.
    #[error("unexpected HTTP status {status}: {body}")]
    Status {
        /// The status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// The response body did not match the expected schema.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The server did not report its version.
    #[error("cannot determine Beeper Desktop version")]
    MissingVersion,

    /// The installed Beeper is older than the API this tool needs.
    #[error("installed Beeper {found} is too old, version {required} is required")]
    UnsupportedVersion {
        /// Version reported by the server
        found: String,
        /// Minimum supported version
        required: &'static str,
    },

    /// An attachment URL could not be resolved to a local file.
    #[error("unsupported asset URL '{0}'")]
    AssetUrl(String),
}

/// Recoverable failures while collecting media.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The attachment bytes could not be fetched.
    #[error("cannot fetch attachment '{name}': {reason}")]
    Fetch {
        /// Attachment file name
        name: String,
        /// Rendered cause
        reason: String,
    },

    /// The image data could not be decoded (corrupt or unsupported codec).
    #[error("cannot decode '{name}': {reason}")]
    Decode {
        /// Attachment file name
        name: String,
        /// Decoder message
        reason: String,
    },

    /// The thumbnail could not be encoded or written.
    #[error("cannot write thumbnail for '{name}': {reason}")]
    Thumbnail {
        /// Attachment file name
        name: String,
        /// Encoder or I/O message
        reason: String,
    },

    /// Thumbnailing is not available for this kind of media.
    #[error("no thumbnail support for '{0}'")]
    Unsupported(String),
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl BeepexError {
    /// Creates an API error for the given operation.
    pub fn api(operation: impl Into<String>, source: ApiErrorKind) -> Self {
        BeepexError::Api {
            operation: operation.into(),
            source,
        }
    }

    /// Creates a configuration error without a file.
    pub fn config(message: impl Into<String>) -> Self {
        BeepexError::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Creates a configuration error pointing at a file.
    pub fn config_file(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        BeepexError::Config {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Creates a remap CSV error.
    pub fn remap_csv(path: impl Into<PathBuf>, line: u64, message: impl Into<String>) -> Self {
        BeepexError::RemapCsv {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Returns `true` if this is an API error.
    pub fn is_api(&self) -> bool {
        matches!(self, BeepexError::Api { .. })
    }

    /// Returns `true` if this is a configuration error (including remap files).
    pub fn is_config(&self) -> bool {
        matches!(self, BeepexError::Config { .. } | BeepexError::RemapCsv { .. })
    }

    /// Returns `true` if this is a recoverable media error.
    pub fn is_media(&self) -> bool {
        matches!(self, BeepexError::Media(_))
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, BeepexError::Io(_))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = BeepexError::from(io_err);
        assert!(err.is_io());
        let display = err.to_string();
        assert!(display.contains("IO error"));
        assert!(display.contains("file not found"));
    }

    #[test]
    fn test_api_error_display() {
        let err = BeepexError::api("list chats", ApiErrorKind::Unauthorized { status: 401 });
        assert!(err.is_api());
        let display = err.to_string();
        assert!(display.contains("list chats"));
        assert!(std::error::Error::source(&err)
            .unwrap()
            .to_string()
            .contains("invalid or expired"));
    }

    #[test]
    fn test_unsupported_version_display() {
        let kind = ApiErrorKind::UnsupportedVersion {
            found: "4.0.1".into(),
            required: "4.1.244",
        };
        let display = kind.to_string();
        assert!(display.contains("4.0.1"));
        assert!(display.contains("4.1.244"));
    }

    #[test]
    fn test_config_error_with_path() {
        let err = BeepexError::config_file("token missing", "/tmp/.env");
        assert!(err.is_config());
        let display = err.to_string();
        assert!(display.contains("token missing"));
        assert!(display.contains("/tmp/.env"));
    }

    #[test]
    fn test_config_error_without_path() {
        let err = BeepexError::config("no output directory");
        assert!(!err.to_string().contains("file:"));
    }

    #[test]
    fn test_remap_error_is_config() {
        let err = BeepexError::remap_csv("names.csv", 3, "expected 2 columns, found 3");
        assert!(err.is_config());
        assert!(!err.is_api());
        let display = err.to_string();
        assert!(display.contains("names.csv"));
        assert!(display.contains("line 3"));
    }

    #[test]
    fn test_media_error_conversion() {
        let err: BeepexError = MediaError::Unsupported("clip.mp4".into()).into();
        assert!(err.is_media());
        assert!(err.to_string().contains("clip.mp4"));
    }
}
