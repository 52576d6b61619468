//! Override chat display names from a CSV file.
//!
//! The file has two columns, chat id and name, and no header:
//!
//! ```text
//! !abc:beeper.local,Alice
//! 1234567890,Book club
//! ```
//!
//! Later rows win over earlier rows for the same chat id.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::core::models::Chat;
use crate::error::{BeepexError, Result};

/// Mapping from chat id to override name. Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameRemapTable {
    names: HashMap<String, String>,
}

impl NameRemapTable {
    /// Creates an empty table (no overrides).
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a table from a two-column CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`BeepexError::RemapCsv`] if the file cannot be read, is not
    /// valid CSV, or a row does not have exactly two columns.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| BeepexError::remap_csv(path, 0, format!("cannot open: {e}")))?;
        let table = Self::from_reader(file, path)?;
        debug!(path = %path.display(), entries = table.len(), "loaded chat name remap table");
        Ok(table)
    }

    /// Parses a table from any reader; `origin` is only used in error messages.
    pub fn from_reader<R: Read>(reader: R, origin: &Path) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut names = HashMap::new();
        for record in csv_reader.records() {
            let record = record.map_err(|e| {
                let line = e.position().map(|p| p.line()).unwrap_or_default();
                BeepexError::remap_csv(origin, line, e.to_string())
            })?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            if record.iter().all(str::is_empty) {
                continue;
            }
            if record.len() != 2 {
                return Err(BeepexError::remap_csv(
                    origin,
                    line,
                    format!("expected 2 columns, found {}", record.len()),
                ));
            }
            let (id, name) = (&record[0], &record[1]);
            if id.is_empty() {
                return Err(BeepexError::remap_csv(origin, line, "empty chat id"));
            }
            names.insert(id.to_string(), name.to_string());
        }

        Ok(Self { names })
    }

    /// Adds or replaces one override.
    pub fn insert(&mut self, chat_id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(chat_id.into(), name.into());
    }

    /// Override name for a chat id, if any.
    pub fn get(&self, chat_id: &str) -> Option<&str> {
        self.names.get(chat_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Name to display for `chat`: the override if one exists, else the API title.
pub fn resolve(chat: &Chat, table: &NameRemapTable) -> String {
    table
        .get(&chat.id)
        .map(str::to_string)
        .unwrap_or_else(|| chat.title.clone())
}

/// Returns a copy of `chat` carrying its resolved name.
pub fn apply(chat: &Chat, table: &NameRemapTable) -> Chat {
    chat.renamed(resolve(chat, table))
}
