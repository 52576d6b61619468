//! Configuration types for the API client and the exporter.
//!
//! This module provides plain configuration structs for library usage,
//! without any CLI framework dependencies.
//!
//! - [`ClientConfig`] - where the Beeper Desktop API lives and how to authenticate
//! - [`ExportConfig`] - output directory, filter rules, remap file, thumbnails
//!
//! # Example
//!
//! ```rust
//! use beepex::config::{ClientConfig, ExportConfig};
//! use beepex::core::filter::FilterRule;
//!
//! let client = ClientConfig::new("secret-token")
//!     .with_base_url("http://localhost:23373")
//!     .with_timeout_secs(60);
//!
//! let export = ExportConfig::new("archive")
//!     .with_rule(FilterRule::exclude_chats(["!spam:beeper.local"]))
//!     .with_thumbnails(false);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::filter::FilterRule;
use crate::error::{BeepexError, Result};
use crate::media::THUMBNAIL_MAX_DIMENSION;

/// Where Beeper Desktop serves its local API by default.
pub const DEFAULT_BASE_URL: &str = "http://localhost:23373";

/// Environment variable holding the access token.
pub const TOKEN_ENV_VAR: &str = "BEEPER_ACCESS_TOKEN";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`BeeperClient`](crate::source::BeeperClient).
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API root, without the `/v1` suffix (default: `http://localhost:23373`)
    pub base_url: String,

    /// Bearer token from Beeper Desktop's developer settings
    pub token: String,

    /// Per-request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Creates a configuration for the default local endpoint.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets the API root. A trailing slash is dropped.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs.max(1);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Keeps the token out of logs
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Settings for one export run.
///
/// # Example
///
/// ```rust
/// use beepex::config::ExportConfig;
///
/// let config = ExportConfig::new("out").with_remap_csv("names.csv");
/// assert_eq!(config.remap_csv.as_deref(), Some("names.csv".as_ref()));
/// assert!(config.rules.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Root of the generated archive
    pub output_dir: PathBuf,

    /// Optional chat id → name CSV
    pub remap_csv: Option<PathBuf>,

    /// Include/exclude rules, applied in order
    pub rules: Vec<FilterRule>,

    /// Generate gallery thumbnails (default: true when the `thumbnails` feature is on)
    pub thumbnails: bool,

    /// Longest thumbnail side in pixels (default: 320)
    pub thumbnail_size: u32,
}

impl ExportConfig {
    /// Creates a configuration exporting every chat into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            remap_csv: None,
            rules: Vec::new(),
            thumbnails: cfg!(feature = "thumbnails"),
            thumbnail_size: THUMBNAIL_MAX_DIMENSION,
        }
    }

    /// Sets the chat name remap file.
    #[must_use]
    pub fn with_remap_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.remap_csv = Some(path.into());
        self
    }

    /// Appends one filter rule.
    #[must_use]
    pub fn with_rule(mut self, rule: FilterRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Replaces the filter rules.
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<FilterRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Enables or disables thumbnails.
    #[must_use]
    pub fn with_thumbnails(mut self, enabled: bool) -> Self {
        self.thumbnails = enabled;
        self
    }

    /// Sets the longest thumbnail side in pixels.
    #[must_use]
    pub fn with_thumbnail_size(mut self, size: u32) -> Self {
        self.thumbnail_size = size;
        self
    }
}

/// Reads a dotenv-style file of `KEY=VALUE` lines.
///
/// Blank lines and `#` comments are skipped, an `export ` prefix is allowed and
/// matching surrounding quotes are removed from values.
///
/// # Errors
///
/// Returns a configuration error naming the file if it cannot be read or a
/// line has no `=`.
pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let content = fs::read_to_string(path)
        .map_err(|e| BeepexError::config_file(format!("cannot read env file: {e}"), path))?;

    let mut vars = HashMap::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            return Err(BeepexError::config_file(
                format!("line {}: expected KEY=VALUE", idx + 1),
                path,
            ));
        };
        vars.insert(key.trim().to_string(), unquote(value.trim()).to_string());
    }
    Ok(vars)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Picks the access token: explicit value, then the environment, then the env file.
///
/// # Errors
///
/// Returns a configuration error when no source provides a non-empty token.
pub fn resolve_token(explicit: Option<&str>, env_file: Option<&Path>) -> Result<String> {
    resolve_token_with(explicit, std::env::var(TOKEN_ENV_VAR).ok(), env_file)
}

fn resolve_token_with(
    explicit: Option<&str>,
    from_env: Option<String>,
    env_file: Option<&Path>,
) -> Result<String> {
    let non_empty = |s: &str| !s.trim().is_empty();

    if let Some(token) = explicit.filter(|t| non_empty(t)) {
        return Ok(token.trim().to_string());
    }
    if let Some(token) = from_env.filter(|t| non_empty(t)) {
        return Ok(token.trim().to_string());
    }
    if let Some(path) = env_file {
        let vars = load_env_file(path)?;
        return vars
            .get(TOKEN_ENV_VAR)
            .filter(|t| non_empty(t))
            .cloned()
            .ok_or_else(|| {
                BeepexError::config_file(format!("{TOKEN_ENV_VAR} is not set"), path)
            });
    }
    Err(BeepexError::config(format!(
        "no access token, pass --token, set {TOKEN_ENV_VAR} or use --env-file"
    )))
}
