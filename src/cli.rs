//! Command-line interface definition using clap.
//!
//! This module defines:
//! - [`Args`] - CLI argument structure (for use with clap)
//! - [`filter_rules`] - the include/exclude flags as ordered [`FilterRule`]s
//!
//! The four filter flags may be repeated and mixed; their relative order on
//! the command line is the order the rules apply in, which plain clap fields
//! lose. [`parse`] and [`try_parse_from`] return the rules alongside [`Args`].
//!
//! ```rust
//! use beepex::cli::try_parse_from;
//! use beepex::core::filter::FilterRule;
//!
//! let (args, rules) = try_parse_from([
//!     "beepex", "out",
//!     "--exclude-account", "a1",
//!     "--include-chat", "c1,c2",
//! ]).unwrap();
//!
//! assert_eq!(args.output_dir.to_str(), Some("out"));
//! assert_eq!(rules, vec![
//!     FilterRule::exclude_accounts(["a1"]),
//!     FilterRule::include_chats(["c1", "c2"]),
//! ]);
//! ```

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};

use crate::config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, ExportConfig};
use crate::core::filter::{FilterAction, FilterRule, FilterTarget};

/// Export Beeper Desktop chats into a static HTML archive
/// with a searchable media gallery.
#[derive(Parser, Debug, Clone)]
#[command(name = "beepex")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    beepex ~/beeper-archive
    beepex out --env-file .env --remap names.csv
    beepex out --include-account whatsapp --exclude-chat '!abc:beeper.local'
    beepex out --exclude-account slack,discord --no-thumbnails")]
pub struct Args {
    /// Directory to write the archive into
    pub output_dir: PathBuf,

    /// Beeper Desktop API access token
    #[arg(long, env = "BEEPER_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Read BEEPER_ACCESS_TOKEN from a KEY=VALUE file
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Export chats of these accounts (repeatable, comma-separated)
    #[arg(long, value_name = "ID", value_delimiter = ',')]
    pub include_account: Vec<String>,

    /// Skip chats of these accounts (repeatable, comma-separated)
    #[arg(long, value_name = "ID", value_delimiter = ',')]
    pub exclude_account: Vec<String>,

    /// Export these chats (repeatable, comma-separated)
    #[arg(long, value_name = "ID", value_delimiter = ',')]
    pub include_chat: Vec<String>,

    /// Skip these chats (repeatable, comma-separated)
    #[arg(long, value_name = "ID", value_delimiter = ',')]
    pub exclude_chat: Vec<String>,

    /// CSV file of chat id → display name overrides
    #[arg(long, value_name = "CSV")]
    pub remap: Option<PathBuf>,

    /// Beeper Desktop API address
    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub host: String,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Do not generate gallery thumbnails
    #[arg(long)]
    pub no_thumbnails: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// API client settings for the given token.
    pub fn client_config(&self, token: impl Into<String>) -> ClientConfig {
        ClientConfig::new(token)
            .with_base_url(self.host.as_str())
            .with_timeout_secs(self.timeout)
    }

    /// Export settings with the given filter rules.
    pub fn export_config(&self, rules: Vec<FilterRule>) -> ExportConfig {
        let mut config = ExportConfig::new(&self.output_dir)
            .with_rules(rules)
            .with_thumbnails(cfg!(feature = "thumbnails") && !self.no_thumbnails);
        if let Some(remap) = &self.remap {
            config = config.with_remap_csv(remap);
        }
        config
    }
}

const RULE_FLAGS: [(&str, FilterAction, FilterTarget); 4] = [
    ("include_account", FilterAction::Include, FilterTarget::Account),
    ("exclude_account", FilterAction::Exclude, FilterTarget::Account),
    ("include_chat", FilterAction::Include, FilterTarget::Chat),
    ("exclude_chat", FilterAction::Exclude, FilterTarget::Chat),
];

/// Filter rules in command-line order.
///
/// Consecutive values of the same flag kind are merged into one rule.
pub fn filter_rules(matches: &ArgMatches) -> Vec<FilterRule> {
    let mut tagged: Vec<(usize, FilterAction, FilterTarget, String)> = Vec::new();
    for (id, action, target) in RULE_FLAGS {
        let (Some(values), Some(indices)) =
            (matches.get_many::<String>(id), matches.indices_of(id))
        else {
            continue;
        };
        for (value, index) in values.zip(indices) {
            let value = value.trim();
            if !value.is_empty() {
                tagged.push((index, action, target, value.to_string()));
            }
        }
    }
    tagged.sort_by_key(|(index, ..)| *index);

    let mut rules: Vec<FilterRule> = Vec::new();
    for (_, action, target, value) in tagged {
        match rules.last_mut() {
            Some(last) if last.action == action && last.target == target => last.ids.push(value),
            _ => rules.push(FilterRule::new(action, target, [value])),
        }
    }
    rules
}

/// Parses the process arguments, exiting with usage on error.
pub fn parse() -> (Args, Vec<FilterRule>) {
    let matches = Args::command().get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    let rules = filter_rules(&matches);
    (args, rules)
}

/// Parses the given arguments.
pub fn try_parse_from<I, T>(itr: I) -> Result<(Args, Vec<FilterRule>), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = Args::command().try_get_matches_from(itr)?;
    let args = Args::from_arg_matches(&matches)?;
    let rules = filter_rules(&matches);
    Ok((args, rules))
}
