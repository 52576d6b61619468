//! Where chat data comes from.
//!
//! The exporter only talks to the [`ChatSource`] trait. [`BeeperClient`]
//! implements it over the Beeper Desktop local HTTP API (requires the `http`
//! feature); tests and library users can plug in their own sources.

#[cfg(feature = "http")]
pub mod beeper;

#[cfg(feature = "http")]
pub use beeper::{BeeperClient, MIN_BEEPER_VERSION, version_at_least};

use crate::core::models::{Account, Chat};
use crate::error::Result;
use crate::message::{Attachment, Message};

/// Lazily fetched messages of one chat.
///
/// Implementations fetch the next page only when the previous one is drained.
/// An `Err` item ends the export.
pub type MessageStream<'a> = Box<dyn Iterator<Item = Result<Message>> + 'a>;

/// A paginated source of accounts, chats, messages and attachment bytes.
///
/// # Implementation Guidelines
///
/// - List operations return complete results; pagination stays internal
/// - Any failure is returned as [`BeepexError::Api`](crate::BeepexError::Api)
///   or an I/O error; the exporter treats both as fatal
/// - [`fetch_attachment`](ChatSource::fetch_attachment) errors are recovered
///   by the media collector
pub trait ChatSource {
    /// All connected accounts.
    fn list_accounts(&self) -> Result<Vec<Account>>;

    /// All chats across accounts, in API order.
    fn list_chats(&self) -> Result<Vec<Chat>>;

    /// Messages of one chat, in API order.
    fn list_messages(&self, chat_id: &str) -> Result<MessageStream<'_>>;

    /// Raw bytes of an attachment.
    fn fetch_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>>;
}
