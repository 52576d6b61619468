//! Static HTML page writers.
//!
//! This module provides one renderer per page kind:
//! - [`render_thread`] / [`write_thread`] - one page per chat
//! - [`render_gallery`] / [`write_gallery`] - every exported attachment, searchable
//! - [`render_index`] / [`write_index`] - chats grouped by network
//!
//! `render_*` functions are pure and return the page as a string; `write_*`
//! functions render and write to a path. [`write_static_assets`] drops the
//! shared stylesheet and gallery script next to the pages.
//!
//! # Output Layout
//!
//! | Path | Content |
//! |------|---------|
//! | `index.html` | chat index |
//! | `gallery.html` | media gallery |
//! | `<chat>.html` | one thread per chat |
//! | `media/` | deduplicated attachments |
//! | `thumbs/` | WebP thumbnails |
//! | `assets/` | `beepex.css`, `gallery.js` |
//!
//! # Example
//!
//! ```rust
//! use beepex::core::models::Chat;
//! use beepex::core::output::{render_gallery, render_thread};
//!
//! let chat = Chat::new("c1", "Alice", "a1");
//! let thread = render_thread(&chat, &[], &[]);
//! assert!(thread.contains("<h1>Alice</h1>"));
//!
//! let gallery = render_gallery(&[])?;
//! assert!(gallery.contains("media-index"));
//! # Ok::<(), beepex::BeepexError>(())
//! ```

mod gallery_writer;
mod html;
mod index_writer;
mod thread_writer;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::error::Result;

pub use gallery_writer::{media_index_json, render_gallery, write_gallery};
pub use html::{escape, linkify, text_to_html};
pub use index_writer::{render_index, write_index};
pub use thread_writer::{render_thread, write_thread};

/// Directory of the shared stylesheet and script, relative to the output root.
pub const ASSETS_DIR: &str = "assets";

const STYLESHEET: &str = include_str!("../../../assets/beepex.css");
const GALLERY_SCRIPT: &str = include_str!("../../../assets/gallery.js");

/// Writes one page, replacing any previous version.
pub(crate) fn write_page(path: &Path, html: &str) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(html.as_bytes())?;
    Ok(())
}

/// Writes `assets/beepex.css` and `assets/gallery.js` under `output_dir`.
pub fn write_static_assets(output_dir: &Path) -> Result<()> {
    let dir = output_dir.join(ASSETS_DIR);
    fs::create_dir_all(&dir)?;
    write_page(&dir.join("beepex.css"), STYLESHEET)?;
    write_page(&dir.join("gallery.js"), GALLERY_SCRIPT)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_assets_written() {
        let dir = tempfile::tempdir().unwrap();
        write_static_assets(dir.path()).unwrap();
        let css = fs::read_to_string(dir.path().join("assets/beepex.css")).unwrap();
        let js = fs::read_to_string(dir.path().join("assets/gallery.js")).unwrap();
        assert!(css.contains(".msg-self"));
        assert!(js.contains("media-index"));
        assert!(js.contains("250"));
    }
}
