//! # beepex
//!
//! A Rust library for exporting chat history from the Beeper Desktop local API
//! into a browsable static HTML archive.
//!
//! ## Overview
//!
//! An export produces:
//! - **Thread pages** - one page per chat, every message with its sender,
//!   timestamp, permalink and inline media
//! - **A media gallery** - every attachment once per message, with thumbnails,
//!   client-side search and links back to the message that sent it
//! - **A chat index** - chats grouped by network
//!
//! Attachments are stored once per distinct content (SHA-256), so re-running
//! an export into the same directory reuses files instead of duplicating them.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # #[cfg(feature = "http")]
//! # fn main() -> beepex::Result<()> {
//! use beepex::prelude::*;
//!
//! let config = ExportConfig::new("archive")
//!     .with_rule(FilterRule::exclude_accounts(["slack"]))
//!     .with_remap_csv("names.csv");
//!
//! // Loads the remap file; a bad file fails here, before any request
//! let exporter = Exporter::new(config)?;
//!
//! let client = BeeperClient::connect(ClientConfig::new("my-token"))?;
//! let summary = exporter.run(&client)?;
//! println!("{} chats exported", summary.chats_exported);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "http"))]
//! # fn main() {}
//! ```
//!
//! ## Custom Sources
//!
//! The exporter only depends on the [`ChatSource`](source::ChatSource) trait,
//! so any backend (or an in-memory fixture) can feed it.
//!
//! ## Module Structure
//!
//! - [`source`] - [`ChatSource`](source::ChatSource) and the HTTP
//!   [`BeeperClient`](source::BeeperClient)
//! - [`core`] - data models and the pure stages
//!   - [`core::filter`] - ordered include/exclude rules
//!   - [`core::remap`] - chat name overrides from CSV
//!   - [`core::output`] - thread, gallery and index pages
//! - [`media`] - attachment deduplication and thumbnails
//! - [`export`] - the [`Exporter`](export::Exporter) pipeline
//! - [`config`] - [`ExportConfig`](config::ExportConfig),
//!   [`ClientConfig`](config::ClientConfig), token loading
//! - [`progress`] - stage callbacks
//! - [`cli`] - CLI types (requires `cli` feature)
//! - [`error`] - Unified error types ([`BeepexError`], [`Result`])
//! - [`prelude`] - Convenient re-exports

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod media;
pub mod message;
pub mod progress;
pub mod source;

// Re-export the main types at the crate root for convenience
pub use error::{BeepexError, Result};
pub use message::{Attachment, Message};

/// Convenient re-exports for common usage.
///
/// Import everything you need with a single line:
///
/// ```rust
/// use beepex::prelude::*;
/// ```
pub mod prelude {
    // Records
    pub use crate::core::models::{Account, Chat, ChatPage, MediaEntry, Participant};
    pub use crate::message::{Attachment, Message};

    // Error types
    pub use crate::error::{BeepexError, Result};

    // Configuration
    pub use crate::config::{ClientConfig, ExportConfig};

    // Pipeline stages
    pub use crate::core::filter::{FilterAction, FilterRule, FilterTarget};
    pub use crate::core::remap::NameRemapTable;
    pub use crate::media::{DedupIndex, MediaCollector, MediaKind};

    // Rendering
    pub use crate::core::output::{render_gallery, render_index, render_thread};

    // Driving an export
    pub use crate::export::{ExportSummary, Exporter};
    pub use crate::progress::{Progress, ProgressCallback, Stage};
    pub use crate::source::{ChatSource, MessageStream};

    #[cfg(feature = "http")]
    pub use crate::source::BeeperClient;
}
