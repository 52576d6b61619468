//! The export pipeline.
//!
//! [`Exporter`] drives one run end to end:
//!
//! ```text
//! Init → FetchAccounts → FetchChats → Filter → RemapNames
//!      → per chat: FetchMessages → CollectMedia → RenderThread
//!      → RenderGallery → RenderIndex → WriteStaticAssets → Done
//! ```
//!
//! Nothing is written until the first chat's messages have been fetched, so
//! configuration and API errors up to that point leave no output behind. A
//! failure later on may leave a partial archive.
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(feature = "http")]
//! # fn main() -> beepex::Result<()> {
//! use beepex::config::{ClientConfig, ExportConfig};
//! use beepex::export::Exporter;
//! use beepex::source::BeeperClient;
//!
//! let exporter = Exporter::new(ExportConfig::new("archive").with_remap_csv("names.csv"))?;
//! let client = BeeperClient::connect(ClientConfig::new("token"))?;
//! let summary = exporter.run(&client)?;
//! println!("{} chats, {} messages", summary.chats_exported, summary.messages);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "http"))]
//! # fn main() {}
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use crate::config::ExportConfig;
use crate::core::filter::{self, account_index};
use crate::core::models::{ChatPage, MediaEntry};
use crate::core::naming::sanitize_file_name;
use crate::core::output::{write_gallery, write_index, write_static_assets, write_thread};
use crate::core::remap::{self, NameRemapTable};
use crate::error::Result;
use crate::media::{MediaCollector, MediaStats, ThreadRef};
use crate::message::Message;
use crate::progress::{Progress, ProgressCallback, Stage, no_progress};
use crate::source::ChatSource;

/// Page names the thread pages must not take.
const RESERVED_PAGES: &[&str] = &["index", "gallery"];

/// What an export run produced.
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    /// Root of the archive.
    pub output_dir: PathBuf,
    /// Accounts reported by the source.
    pub accounts: usize,
    /// Chats reported by the source.
    pub chats_seen: usize,
    /// Chats that passed the filter and were written.
    pub chats_exported: usize,
    /// Messages written across all threads.
    pub messages: usize,
    /// Media collector counters.
    pub media: MediaStats,
    /// Thread pages, in export order.
    pub pages: Vec<ChatPage>,
}

/// Runs exports with a fixed configuration.
pub struct Exporter {
    config: ExportConfig,
    names: NameRemapTable,
    progress: ProgressCallback,
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("config", &self.config)
            .field("names", &self.names.len())
            .finish_non_exhaustive()
    }
}

impl Exporter {
    /// Prepares an export, loading the remap file if one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`BeepexError::RemapCsv`](crate::BeepexError::RemapCsv) for an
    /// unreadable or malformed remap file.
    pub fn new(config: ExportConfig) -> Result<Self> {
        let names = match &config.remap_csv {
            Some(path) => NameRemapTable::load(path)?,
            None => NameRemapTable::new(),
        };
        Ok(Self {
            config,
            names,
            progress: no_progress(),
        })
    }

    /// Sets the callback notified at each stage.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = callback;
        self
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// The loaded chat name overrides.
    pub fn names(&self) -> &NameRemapTable {
        &self.names
    }

    fn report(&self, progress: &Progress) {
        if !progress.stage.is_per_chat() {
            info!("{}", progress.stage);
        }
        (self.progress)(progress);
    }

    /// Exports every selected chat from `source`.
    ///
    /// # Errors
    ///
    /// Source failures and write failures abort the run. Attachment
    /// failures do not; they are logged and the attachment is skipped.
    pub fn run<S>(&self, source: &S) -> Result<ExportSummary>
    where
        S: ChatSource + ?Sized,
    {
        let output = self.config.output_dir.as_path();
        let mut summary = ExportSummary {
            output_dir: output.to_path_buf(),
            ..ExportSummary::default()
        };

        self.report(&Progress::new(Stage::Init));
        self.report(&Progress::new(Stage::FetchAccounts));
        let accounts = source.list_accounts()?;
        summary.accounts = accounts.len();
        let networks: HashMap<&str, &str> = accounts
            .iter()
            .map(|a| (a.id.as_str(), a.network.as_str()))
            .collect();

        self.report(&Progress::new(Stage::FetchChats));
        let mut chats = source.list_chats()?;
        summary.chats_seen = chats.len();
        for chat in &mut chats {
            if chat.network.is_empty() {
                if let Some(network) = networks.get(chat.account_id.as_str()) {
                    chat.network = (*network).to_string();
                }
            }
        }

        self.report(&Progress::new(Stage::Filter));
        let all_ids = chats.iter().map(|c| c.id.clone()).collect();
        let selected = filter::apply(&self.config.rules, &all_ids, &account_index(&chats));
        let mut seen = HashSet::new();
        chats.retain(|c| selected.contains(&c.id) && seen.insert(c.id.clone()));
        info!(selected = chats.len(), total = summary.chats_seen, "chats selected");

        self.report(&Progress::new(Stage::RemapNames));
        let chats: Vec<_> = chats
            .iter()
            .map(|chat| remap::apply(chat, &self.names))
            .collect();

        let mut collector = MediaCollector::open(output)?
            .with_thumbnails(self.config.thumbnails)
            .with_thumbnail_size(self.config.thumbnail_size);
        let mut page_names = PageNames::new();
        let mut gallery: Vec<MediaEntry> = Vec::new();
        let total = chats.len();

        for (done, chat) in chats.iter().enumerate() {
            let at = |stage| {
                Progress::new(stage)
                    .with_chats(done, total)
                    .with_current_chat(chat.title.as_str())
            };

            self.report(&at(Stage::FetchMessages));
            let mut messages = source
                .list_messages(&chat.id)?
                .collect::<Result<Vec<Message>>>()?;
            messages.sort_by_key(|m| m.timestamp);

            let href = page_names.allocate(&chat.title, &chat.id);
            let thread = ThreadRef {
                chat_id: &chat.id,
                chat_name: &chat.title,
                href: &href,
            };

            self.report(&at(Stage::CollectMedia));
            let mut media = Vec::new();
            for message in &messages {
                media.extend(collector.collect(message, &thread, source));
            }

            self.report(&at(Stage::RenderThread));
            fs::create_dir_all(output)?;
            write_thread(&output.join(&href), chat, &messages, &media)?;
            debug!(chat = %chat.id, page = %href, messages = messages.len(), media = media.len(), "wrote thread");

            summary.messages += messages.len();
            summary.pages.push(ChatPage {
                chat_id: chat.id.clone(),
                title: chat.title.clone(),
                network: chat.network.clone(),
                href,
                message_count: messages.len(),
                media_count: media.len(),
            });
            gallery.append(&mut media);
        }
        summary.chats_exported = summary.pages.len();

        fs::create_dir_all(output)?;
        self.report(&Progress::new(Stage::RenderGallery).with_chats(total, total));
        write_gallery(&output.join("gallery.html"), &gallery)?;

        self.report(&Progress::new(Stage::RenderIndex).with_chats(total, total));
        write_index(&output.join("index.html"), &summary.pages, Utc::now())?;

        self.report(&Progress::new(Stage::WriteStaticAssets).with_chats(total, total));
        write_static_assets(output)?;

        summary.media = collector.stats();
        self.report(&Progress::new(Stage::Done).with_chats(total, total));
        Ok(summary)
    }
}

/// Allocates unique thread page file names.
///
/// Names are compared case-insensitively so the archive survives being
/// copied to a case-insensitive file system.
#[derive(Debug)]
struct PageNames {
    taken: HashSet<String>,
}

impl PageNames {
    fn new() -> Self {
        Self {
            taken: RESERVED_PAGES.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Page file name (with `.html`) for a chat, unique among all allocated.
    fn allocate(&mut self, title: &str, chat_id: &str) -> String {
        let mut stem = sanitize_file_name(title);
        if self.taken.contains(&stem.to_lowercase()) {
            stem = sanitize_file_name(&format!("{title} {chat_id}"));
        }
        let base = stem.clone();
        let mut n = 2;
        while self.taken.contains(&stem.to_lowercase()) {
            stem = format!("{base} ({n})");
            n += 1;
        }
        self.taken.insert(stem.to_lowercase());
        format!("{stem}.html")
    }
}

/// Returns `true` if `dir` looks like a previous beepex archive.
pub fn is_archive(dir: &Path) -> bool {
    dir.join("index.html").is_file() && dir.join("gallery.html").is_file()
}
