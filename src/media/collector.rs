//! Per-message attachment export.
//!
//! [`MediaCollector`] fetches each attachment of a message, stores its bytes once
//! per distinct content in the media directory, and generates thumbnails for
//! images and videos.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::dedup::{Claim, DedupIndex, fingerprint};
use super::kind::MediaKind;
use super::thumbnail::{THUMBNAIL_MAX_DIMENSION, write_thumbnail};
use crate::core::models::{MEDIA_DIR, MediaEntry, THUMBS_DIR, thumb_file_name};
use crate::core::naming::media_file_name;
use crate::error::{MediaError, Result};
use crate::message::{Attachment, Message};
use crate::source::ChatSource;

/// The thread a message is rendered into, copied into each [`MediaEntry`].
#[derive(Debug, Clone, Copy)]
pub struct ThreadRef<'a> {
    pub chat_id: &'a str,
    pub chat_name: &'a str,
    /// Thread page, relative to the output root.
    pub href: &'a str,
}

/// Counters reported in the export summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaStats {
    /// Files written to the media directory.
    pub written: usize,
    /// Attachments whose content was already stored.
    pub reused: usize,
    /// Thumbnails available (generated or already on disk).
    pub thumbnails: usize,
    /// Attachments skipped because they could not be fetched or written.
    pub failed: usize,
}

/// Copies attachments into `media/` and thumbnails into `thumbs/`.
#[derive(Debug)]
pub struct MediaCollector {
    media_dir: PathBuf,
    thumbs_dir: PathBuf,
    index: DedupIndex,
    thumbnails: bool,
    thumbnail_size: u32,
    // file name -> thumbnail outcome, so shared content is encoded once
    thumb_cache: HashMap<String, bool>,
    stats: MediaStats,
}

impl MediaCollector {
    /// Creates a collector over `output_dir` with an explicit index.
    ///
    /// Directories are created on the first write.
    pub fn new(output_dir: &Path, index: DedupIndex) -> Self {
        Self {
            media_dir: output_dir.join(MEDIA_DIR),
            thumbs_dir: output_dir.join(THUMBS_DIR),
            index,
            thumbnails: cfg!(feature = "thumbnails"),
            thumbnail_size: THUMBNAIL_MAX_DIMENSION,
            thumb_cache: HashMap::new(),
            stats: MediaStats::default(),
        }
    }

    /// Creates a collector whose index is seeded from an existing media directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the media directory exists but cannot be read.
    pub fn open(output_dir: &Path) -> Result<Self> {
        let index = DedupIndex::scan(&output_dir.join(MEDIA_DIR))?;
        Ok(Self::new(output_dir, index))
    }

    /// Enables or disables thumbnail generation.
    #[must_use]
    pub fn with_thumbnails(mut self, enabled: bool) -> Self {
        self.thumbnails = enabled;
        self
    }

    /// Sets the longest thumbnail side in pixels.
    #[must_use]
    pub fn with_thumbnail_size(mut self, max_size: u32) -> Self {
        self.thumbnail_size = max_size.max(1);
        self
    }

    pub fn index(&self) -> &DedupIndex {
        &self.index
    }

    pub fn stats(&self) -> MediaStats {
        self.stats
    }

    /// Exports every attachment of `message`, in attachment order.
    ///
    /// Attachments that cannot be fetched or stored are logged and skipped.
    pub fn collect<S>(
        &mut self,
        message: &Message,
        thread: &ThreadRef<'_>,
        source: &S,
    ) -> Vec<MediaEntry>
    where
        S: ChatSource + ?Sized,
    {
        let mut entries = Vec::with_capacity(message.attachments.len());
        for attachment in &message.attachments {
            let bytes = match source.fetch_attachment(attachment) {
                Ok(bytes) => bytes,
                Err(e) => {
                    let err = MediaError::Fetch {
                        name: attachment.display_name().to_string(),
                        reason: e.to_string(),
                    };
                    warn!(message = %message.id, "{err}");
                    self.stats.failed += 1;
                    continue;
                }
            };
            match self.store(message, attachment, &bytes, thread) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(message = %message.id, error = %e, "skipping attachment");
                    self.stats.failed += 1;
                }
            }
        }
        entries
    }

    /// Stores already-fetched attachment bytes and returns their entry.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the media file cannot be written. Thumbnail
    /// failures are not errors; they yield `has_thumb == false`.
    pub fn store(
        &mut self,
        message: &Message,
        attachment: &Attachment,
        bytes: &[u8],
        thread: &ThreadRef<'_>,
    ) -> Result<MediaEntry> {
        let fp = fingerprint(bytes);
        let preferred = media_file_name(message.timestamp, attachment.display_name());
        let claim = self.index.claim(&fp, &preferred);

        if let Claim::New(name) = &claim {
            let written = fs::create_dir_all(&self.media_dir).and_then(|()| {
                super::persist_atomically(&self.media_dir, &self.media_dir.join(name), bytes)
            });
            // An unwritten name must not be handed out for later copies
            if let Err(e) = written {
                self.index.release(&fp);
                return Err(e.into());
            }
            debug!(file = %name, bytes = bytes.len(), "wrote media file");
            self.stats.written += 1;
        } else {
            debug!(file = claim.file_name(), "reusing media file");
            self.stats.reused += 1;
        }

        let file_name = claim.file_name().to_string();
        let kind = match MediaKind::from_file_name(&file_name) {
            MediaKind::Other => attachment.kind(),
            kind => kind,
        };
        let has_thumb = self.thumbnail(&file_name, kind, bytes);

        Ok(MediaEntry {
            file_name,
            kind,
            message_id: message.id.clone(),
            chat_id: thread.chat_id.to_string(),
            chat_name: thread.chat_name.to_string(),
            thread_href: thread.href.to_string(),
            has_thumb,
        })
    }

    fn thumbnail(&mut self, file_name: &str, kind: MediaKind, bytes: &[u8]) -> bool {
        if !self.thumbnails || !kind.is_visual() {
            return false;
        }
        if let Some(&done) = self.thumb_cache.get(file_name) {
            return done;
        }

        let dest = self.thumbs_dir.join(thumb_file_name(file_name));
        let result = fs::create_dir_all(&self.thumbs_dir)
            .map_err(|e| MediaError::Thumbnail {
                name: file_name.to_string(),
                reason: e.to_string(),
            })
            .and_then(|()| write_thumbnail(file_name, bytes, &dest, self.thumbnail_size));

        let done = match result {
            Ok(()) => {
                self.stats.thumbnails += 1;
                true
            }
            // Most video codecs are not decodable here; the player is the preview
            Err(e) if kind == MediaKind::Video => {
                debug!("{e}");
                false
            }
            Err(e) => {
                warn!("{e}");
                false
            }
        };
        self.thumb_cache.insert(file_name.to_string(), done);
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Account, Chat};
    use crate::error::{ApiErrorKind, BeepexError};
    use crate::source::MessageStream;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    /// Serves attachment bytes from a map keyed by source URL.
    struct Blobs(HashMap<String, Vec<u8>>);

    impl ChatSource for Blobs {
        fn list_accounts(&self) -> Result<Vec<Account>> {
            Ok(vec![])
        }

        fn list_chats(&self) -> Result<Vec<Chat>> {
            Ok(vec![])
        }

        fn list_messages(&self, _chat_id: &str) -> Result<MessageStream<'_>> {
            Ok(Box::new(std::iter::empty()))
        }

        fn fetch_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>> {
            self.0.get(&attachment.src_url).cloned().ok_or_else(|| {
                BeepexError::api(
                    "fetch attachment",
                    ApiErrorKind::AssetUrl(attachment.src_url.clone()),
                )
            })
        }
    }

    const THREAD: ThreadRef<'static> = ThreadRef {
        chat_id: "c1",
        chat_name: "Alice",
        href: "Alice.html",
    };

    fn message(id: &str, second: u32, attachments: &[(&str, &str)]) -> Message {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 14, 30, second).unwrap();
        attachments
            .iter()
            .fold(Message::new(id, "c1", "Alice", ts), |m, (name, url)| {
                m.with_attachment(Attachment::new(*name, *url))
            })
    }

    fn blobs(items: &[(&str, &[u8])]) -> Blobs {
        Blobs(
            items
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.to_vec()))
                .collect(),
        )
    }

    #[test]
    fn test_collect_writes_media_file() {
        let dir = tempdir().unwrap();
        let source = blobs(&[("file:///a", b"hello")]);
        let mut collector = MediaCollector::open(dir.path()).unwrap();

        let entries = collector.collect(&message("m1", 0, &[("notes.txt", "file:///a")]), &THREAD, &source);

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.file_name, "2024-05-01_14-30-00_notes.txt");
        assert_eq!(entry.kind, MediaKind::Other);
        assert_eq!(entry.message_id, "m1");
        assert_eq!(entry.backlink_href(), "Alice.html#msg-m1");
        assert!(!entry.has_thumb);
        assert_eq!(
            fs::read(dir.path().join("media").join(&entry.file_name)).unwrap(),
            b"hello"
        );
        assert_eq!(collector.stats().written, 1);
    }

    #[test]
    fn test_identical_bytes_stored_once() {
        let dir = tempdir().unwrap();
        let source = blobs(&[("file:///1", b"same"), ("file:///2", b"same")]);
        let mut collector = MediaCollector::open(dir.path()).unwrap().with_thumbnails(false);

        let first = collector.collect(&message("m1", 0, &[("photo.jpg", "file:///1")]), &THREAD, &source);
        let second = collector.collect(&message("m2", 5, &[("photo.jpg", "file:///2")]), &THREAD, &source);

        assert_eq!(first[0].file_name, second[0].file_name);
        assert_ne!(first[0].message_id, second[0].message_id);
        assert_eq!(fs::read_dir(dir.path().join("media")).unwrap().count(), 1);
        assert_eq!(collector.stats().written, 1);
        assert_eq!(collector.stats().reused, 1);
    }

    #[test]
    fn test_fetch_failure_skips_attachment() {
        let dir = tempdir().unwrap();
        let source = blobs(&[("file:///ok", b"ok")]);
        let mut collector = MediaCollector::open(dir.path()).unwrap();

        let msg = message("m1", 0, &[("gone.txt", "file:///missing"), ("ok.txt", "file:///ok")]);
        let entries = collector.collect(&msg, &THREAD, &source);

        assert_eq!(entries.len(), 1);
        assert!(entries[0].file_name.ends_with("ok.txt"));
        assert_eq!(collector.stats().failed, 1);
    }

    #[test]
    fn test_undecodable_image_has_no_thumb() {
        let dir = tempdir().unwrap();
        let source = blobs(&[("file:///bad", b"not really a jpeg")]);
        let mut collector = MediaCollector::open(dir.path()).unwrap();

        let entries = collector.collect(&message("m1", 0, &[("bad.jpg", "file:///bad")]), &THREAD, &source);

        assert_eq!(entries[0].kind, MediaKind::Image);
        assert!(!entries[0].has_thumb);
        assert_eq!(entries[0].thumb_href(), entries[0].media_href());
    }

    #[test]
    fn test_reopen_reuses_existing_names() {
        let dir = tempdir().unwrap();
        let source = blobs(&[("file:///1", b"payload")]);
        let msg = message("m1", 0, &[("doc.pdf", "file:///1")]);

        let first = MediaCollector::open(dir.path())
            .unwrap()
            .collect(&msg, &THREAD, &source);
        let mut again = MediaCollector::open(dir.path()).unwrap();
        let second = again.collect(&msg, &THREAD, &source);

        assert_eq!(first, second);
        assert_eq!(again.stats().written, 0);
        assert_eq!(again.stats().reused, 1);
    }

    #[test]
    fn test_failed_write_is_not_reused() {
        let dir = tempdir().unwrap();
        // A plain file where the media directory should be
        fs::write(dir.path().join("media"), b"in the way").unwrap();
        let source = blobs(&[("file:///1", b"payload"), ("file:///2", b"payload")]);
        let mut collector = MediaCollector::new(dir.path(), DedupIndex::new()).with_thumbnails(false);

        let first = collector.collect(&message("m1", 0, &[("doc.pdf", "file:///1")]), &THREAD, &source);
        assert!(first.is_empty());
        assert_eq!(collector.stats().failed, 1);
        assert!(collector.index().is_empty());

        fs::remove_file(dir.path().join("media")).unwrap();
        let second = collector.collect(&message("m2", 5, &[("doc.pdf", "file:///2")]), &THREAD, &source);

        assert_eq!(second.len(), 1);
        assert_eq!(collector.stats().written, 1);
        assert_eq!(collector.stats().reused, 0);
        assert_eq!(
            fs::read(dir.path().join("media").join(&second[0].file_name)).unwrap(),
            b"payload"
        );
    }

    #[cfg(feature = "thumbnails")]
    fn png(color: [u8; 3]) -> Vec<u8> {
        use std::io::Cursor;

        let img = image::RgbImage::from_pixel(800, 600, image::Rgb(color));
        let mut png = Cursor::new(Vec::new());
        img.write_to(&mut png, image::ImageFormat::Png).unwrap();
        png.into_inner()
    }

    #[cfg(feature = "thumbnails")]
    #[test]
    fn test_same_stem_images_get_own_thumbnails() {
        let dir = tempdir().unwrap();
        let black = png([0, 0, 0]);
        let white = png([255, 255, 255]);
        let source = blobs(&[("file:///a", black.as_slice()), ("file:///b", white.as_slice())]);
        let mut collector = MediaCollector::open(dir.path()).unwrap();

        // Same stem and timestamp, different extension
        let msg = message("m1", 0, &[("x.png", "file:///a"), ("x.jpg", "file:///b")]);
        let entries = collector.collect(&msg, &THREAD, &source);

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.has_thumb));
        assert_ne!(entries[0].thumb_href(), entries[1].thumb_href());
        assert_eq!(fs::read_dir(dir.path().join("thumbs")).unwrap().count(), 2);
        assert_eq!(collector.stats().thumbnails, 2);

        let first = image::open(dir.path().join(entries[0].thumb_href())).unwrap().to_rgb8();
        let second = image::open(dir.path().join(entries[1].thumb_href())).unwrap().to_rgb8();
        assert!(first.get_pixel(0, 0).0[0] < 16);
        assert!(second.get_pixel(0, 0).0[0] > 240);
    }

    #[cfg(feature = "thumbnails")]
    #[test]
    fn test_image_gets_thumbnail() {
        let png = png([10, 120, 200]);
        let dir = tempdir().unwrap();
        let source = blobs(&[("file:///img", png.as_slice())]);
        let mut collector = MediaCollector::open(dir.path()).unwrap();

        let entries = collector.collect(&message("m1", 0, &[("cat.png", "file:///img")]), &THREAD, &source);

        assert!(entries[0].has_thumb);
        assert_eq!(entries[0].thumb_href(), "thumbs/2024-05-01_14-30-00_cat.png.webp");
        assert!(dir.path().join(entries[0].thumb_href()).is_file());
        assert_eq!(collector.stats().thumbnails, 1);
    }
}
