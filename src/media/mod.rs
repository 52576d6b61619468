//! Attachment export: kind detection, deduplication and thumbnails.
//!
//! This module contains:
//! - [`kind`] - [`MediaKind`] lookup from file extensions
//! - [`dedup`] - [`DedupIndex`], the fingerprint → file name map
//! - [`thumbnail`] - WebP thumbnail generation (requires `thumbnails` feature)
//! - [`collector`] - [`MediaCollector`], which ties them together per message
//!
//! # Example
//!
//! ```rust,no_run
//! use beepex::media::{MediaCollector, ThreadRef};
//! use beepex::Message;
//! # fn example(source: &dyn beepex::source::ChatSource, msg: &Message) -> beepex::Result<()> {
//! let mut collector = MediaCollector::open("archive".as_ref())?;
//! let thread = ThreadRef { chat_id: "c1", chat_name: "Alice", href: "Alice.html" };
//! let entries = collector.collect(msg, &thread, source);
//! println!("{} media files", entries.len());
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod dedup;
pub mod kind;
pub mod thumbnail;

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

pub use collector::{MediaCollector, MediaStats, ThreadRef};
pub use dedup::{Claim, DedupIndex, fingerprint};
pub use kind::MediaKind;
pub use thumbnail::{THUMBNAIL_MAX_DIMENSION, make_thumbnail, write_thumbnail};

/// Writes `bytes` to `dest` through a temporary file in `dir`, so readers never
/// observe a half-written file.
pub(crate) fn persist_atomically(dir: &Path, dest: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}
