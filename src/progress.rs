//! Progress reporting for export runs.
//!
//! This module provides a callback-based progress mechanism: the exporter
//! calls a [`ProgressCallback`] whenever it enters a new [`Stage`] and once
//! per exported chat.
//!
//! # Example
//!
//! ```rust
//! use beepex::progress::{Progress, ProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! let callback: ProgressCallback = Arc::new(|progress| {
//!     if let Some(pct) = progress.percentage() {
//!         println!("{}: {:.0}%", progress.stage, pct);
//!     }
//! });
//!
//! callback(&Progress::new(Stage::RenderThread).with_chats(3, 10));
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Steps of an export run, in order.
///
/// The three per-chat stages repeat for every selected chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Init,
    FetchAccounts,
    FetchChats,
    Filter,
    RemapNames,
    FetchMessages,
    CollectMedia,
    RenderThread,
    RenderGallery,
    RenderIndex,
    WriteStaticAssets,
    Done,
}

impl Stage {
    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Stage::Init => "Initializing",
            Stage::FetchAccounts => "Fetching accounts",
            Stage::FetchChats => "Fetching chats",
            Stage::Filter => "Filtering chats",
            Stage::RemapNames => "Applying chat names",
            Stage::FetchMessages => "Fetching messages",
            Stage::CollectMedia => "Collecting media",
            Stage::RenderThread => "Writing thread",
            Stage::RenderGallery => "Writing gallery",
            Stage::RenderIndex => "Writing index",
            Stage::WriteStaticAssets => "Writing assets",
            Stage::Done => "Done",
        }
    }

    /// Returns `true` for stages that run once per chat.
    pub fn is_per_chat(&self) -> bool {
        matches!(
            self,
            Stage::FetchMessages | Stage::CollectMedia | Stage::RenderThread
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A snapshot of export progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Current stage.
    pub stage: Stage,

    /// Chats finished so far.
    pub chats_done: usize,

    /// Chats selected for export, once known.
    pub chats_total: Option<usize>,

    /// Display name of the chat being exported, during per-chat stages.
    pub current_chat: Option<String>,
}

impl Progress {
    /// Creates a progress snapshot for `stage` with no chat counts.
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            chats_done: 0,
            chats_total: None,
            current_chat: None,
        }
    }

    /// Sets the chat counters.
    #[must_use]
    pub fn with_chats(mut self, done: usize, total: usize) -> Self {
        self.chats_done = done;
        self.chats_total = Some(total);
        self
    }

    /// Sets the chat being exported.
    #[must_use]
    pub fn with_current_chat(mut self, name: impl Into<String>) -> Self {
        self.current_chat = Some(name.into());
        self
    }

    /// Returns finished chats as a percentage (0.0 - 100.0).
    ///
    /// Returns `None` until the number of chats is known.
    ///
    /// # Example
    ///
    /// ```rust
    /// use beepex::progress::{Progress, Stage};
    ///
    /// let progress = Progress::new(Stage::RenderThread).with_chats(5, 20);
    /// assert_eq!(progress.percentage(), Some(25.0));
    /// assert_eq!(Progress::new(Stage::FetchChats).percentage(), None);
    /// ```
    pub fn percentage(&self) -> Option<f64> {
        self.chats_total.map(|total| {
            if total == 0 {
                100.0
            } else {
                (self.chats_done as f64 / total as f64) * 100.0
            }
        })
    }

    /// Returns whether the export has finished.
    pub fn is_complete(&self) -> bool {
        self.stage == Stage::Done
    }
}

/// Callback type for receiving progress updates.
///
/// # Example
///
/// ```rust
/// use beepex::progress::{Progress, ProgressCallback, Stage};
/// use std::sync::Arc;
///
/// let callback: ProgressCallback = Arc::new(|progress| {
///     println!("{}", progress.stage);
/// });
///
/// callback(&Progress::new(Stage::FetchAccounts));
/// ```
pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;

/// Creates a no-op progress callback.
///
/// ```rust
/// use beepex::progress::{no_progress, Progress, Stage};
///
/// let callback = no_progress();
/// callback(&Progress::new(Stage::Init)); // Does nothing
/// ```
pub fn no_progress() -> ProgressCallback {
    Arc::new(|_| {})
}

/// Creates a progress callback that prints one line per chat to stderr.
///
/// ```rust
/// use beepex::progress::{stderr_progress, Progress, Stage};
///
/// let callback = stderr_progress();
/// // Prints "[ 1/4] Family" to stderr
/// callback(&Progress::new(Stage::FetchMessages).with_chats(0, 4).with_current_chat("Family"));
/// ```
pub fn stderr_progress() -> ProgressCallback {
    Arc::new(|progress| {
        if progress.stage != Stage::FetchMessages {
            return;
        }
        if let (Some(total), Some(chat)) = (progress.chats_total, &progress.current_chat) {
            let width = total.to_string().len();
            eprintln!(
                "   [{:>width$}/{total}] {chat}",
                progress.chats_done + 1,
                width = width
            );
        }
    })
}
