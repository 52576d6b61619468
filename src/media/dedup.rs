//! Content-addressed deduplication of exported media.
//!
//! [`DedupIndex`] maps a content fingerprint (SHA-256, hex) to the one file name
//! that content is stored under, and remembers which names are taken so two
//! different files never share a name.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::core::naming::split_extension;

/// Hex characters of the fingerprint appended to disambiguate name clashes.
const CLASH_SUFFIX_LEN: usize = 8;

/// Hex-encoded SHA-256 of `bytes`.
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Outcome of [`DedupIndex::claim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// The content is already stored under this name; nothing to write.
    Existing(String),
    /// The content is new and must be written under this name.
    New(String),
}

impl Claim {
    pub fn file_name(&self) -> &str {
        match self {
            Claim::Existing(name) | Claim::New(name) => name,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Claim::New(_))
    }
}

/// Fingerprint → file name index for one media directory.
#[derive(Debug, Clone, Default)]
pub struct DedupIndex {
    by_fingerprint: HashMap<String, String>,
    by_name: HashMap<String, String>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an index from the files already present in `dir`.
    ///
    /// A missing directory yields an empty index. When two existing files hold
    /// the same content, the lexicographically smaller name wins.
    pub fn scan(dir: &Path) -> io::Result<Self> {
        let mut index = Self::new();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(index),
            Err(e) => return Err(e),
        };

        let mut files: Vec<_> = entries
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|e| e.file_name().into_string().ok().map(|n| (n, e.path())))
            .collect();
        files.sort();

        for (name, path) in files {
            let bytes = fs::read(&path)?;
            let fp = fingerprint(&bytes);
            index.by_name.insert(name.clone(), fp.clone());
            index.by_fingerprint.entry(fp).or_insert(name);
        }
        debug!(dir = %dir.display(), files = index.len(), "seeded media index");
        Ok(index)
    }

    /// File name already holding this content, if any.
    pub fn lookup(&self, fingerprint: &str) -> Option<&str> {
        self.by_fingerprint.get(fingerprint).map(String::as_str)
    }

    /// Returns the file name for content with `fingerprint`, preferring `preferred`.
    ///
    /// Known content reuses its name. New content gets `preferred` unless that
    /// name holds different content, in which case a fingerprint suffix is
    /// inserted before the extension.
    pub fn claim(&mut self, fingerprint: &str, preferred: &str) -> Claim {
        if let Some(name) = self.lookup(fingerprint) {
            return Claim::Existing(name.to_string());
        }

        let name = if self.by_name.contains_key(preferred) {
            let (stem, ext) = split_extension(preferred);
            let short = &fingerprint[..CLASH_SUFFIX_LEN.min(fingerprint.len())];
            let candidate = format!("{stem}_{short}{ext}");
            if self.by_name.contains_key(&candidate) {
                format!("{fingerprint}{ext}")
            } else {
                candidate
            }
        } else {
            preferred.to_string()
        };

        self.by_name.insert(name.clone(), fingerprint.to_string());
        self.by_fingerprint
            .insert(fingerprint.to_string(), name.clone());
        Claim::New(name)
    }

    /// Undoes a [`Claim::New`] whose file could not be written.
    ///
    /// The content and its name become unknown again, so a later claim for the
    /// same bytes is `New` and writes the file.
    pub fn release(&mut self, fingerprint: &str) {
        if let Some(name) = self.by_fingerprint.remove(fingerprint) {
            if self.by_name.get(&name).is_some_and(|fp| fp == fingerprint) {
                self.by_name.remove(&name);
            }
        }
    }

    /// Number of distinct contents indexed.
    pub fn len(&self) -> usize {
        self.by_fingerprint.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_fingerprint.is_empty()
    }
}
