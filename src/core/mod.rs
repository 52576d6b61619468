//! Core export logic for beepex.
//!
//! This module contains:
//! - [`models`] - Accounts, chats, media entries and thread pages
//! - [`filter`] - Ordered include/exclude rules over accounts and chats
//! - [`remap`] - Chat display name overrides from CSV
//! - [`naming`] - File names, anchors and labels
//! - [`output`] - HTML page writers (threads, gallery, index)
//!
//! # Quick Start
//!
//! ```rust
//! use beepex::core::{Chat, FilterRule, NameRemapTable, account_index, apply_filters};
//!
//! let chats = vec![Chat::new("c1", "Alice", "a1"), Chat::new("c2", "Bob", "a2")];
//! let all = chats.iter().map(|c| c.id.clone()).collect();
//! let selected = apply_filters(&[FilterRule::include_accounts(["a2"])], &all, &account_index(&chats));
//! assert_eq!(selected.len(), 1);
//!
//! let mut names = NameRemapTable::new();
//! names.insert("c2", "Robert");
//! ```

pub mod filter;
pub mod models;
pub mod naming;
pub mod output;
pub mod remap;

// Re-export main types for convenience
pub use filter::{FilterAction, FilterRule, FilterTarget, account_index, apply as apply_filters};
pub use models::{Account, Chat, ChatPage, MediaEntry, Participant};
pub use naming::{sanitize_file_name, timestamp_label};
pub use remap::NameRemapTable;

pub use output::{render_gallery, render_index, render_thread};
