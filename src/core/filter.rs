//! Select which chats to export with ordered include/exclude rules.
//!
//! This module provides [`FilterRule`] for describing one rule and [`apply`]
//! for folding a rule sequence over the known chats.
//!
//! # Rule Semantics
//!
//! | Action | Target | Effect on the running set |
//! |--------|--------|---------------------------|
//! | include | account | adds every chat owned by the accounts |
//! | include | chat | adds the chats |
//! | exclude | account | removes every chat owned by the accounts |
//! | exclude | chat | removes the chats |
//!
//! The **first** rule decides the starting set: an include rule starts from
//! nothing, an exclude rule starts from every known chat. Without rules every
//! chat is exported.
//!
//! # Examples
//!
//! ```
//! use std::collections::{BTreeSet, HashMap};
//! use beepex::core::filter::{FilterRule, apply};
//!
//! let all: BTreeSet<String> = ["c1", "c2", "c3"].map(String::from).into();
//! let mut owners = HashMap::new();
//! owners.insert("a1".to_string(), BTreeSet::from(["c1".to_string(), "c2".to_string()]));
//!
//! // Everything from a1 except c2
//! let rules = vec![
//!     FilterRule::include_accounts(["a1"]),
//!     FilterRule::exclude_chats(["c2"]),
//! ];
//! let selected = apply(&rules, &all, &owners);
//! assert_eq!(selected, BTreeSet::from(["c1".to_string()]));
//! ```
//!
//! # Behavior Notes
//!
//! - Results are sets, so API response order never affects them
//! - Ids that match no known account or chat are ignored (logged at `warn`)
//! - An empty result is valid and exports nothing

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::models::Chat;

/// Whether a rule adds or removes chats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterAction {
    Include,
    Exclude,
}

/// What the ids of a rule refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterTarget {
    Account,
    Chat,
}

/// One include/exclude step over account or chat ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    pub action: FilterAction,
    pub target: FilterTarget,
    pub ids: Vec<String>,
}

impl FilterRule {
    /// Creates a rule from its parts.
    pub fn new<I, S>(action: FilterAction, target: FilterTarget, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            action,
            target,
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Include every chat of the given accounts.
    pub fn include_accounts<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(FilterAction::Include, FilterTarget::Account, ids)
    }

    /// Exclude every chat of the given accounts.
    pub fn exclude_accounts<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(FilterAction::Exclude, FilterTarget::Account, ids)
    }

    /// Include the given chats.
    pub fn include_chats<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(FilterAction::Include, FilterTarget::Chat, ids)
    }

    /// Exclude the given chats.
    pub fn exclude_chats<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(FilterAction::Exclude, FilterTarget::Chat, ids)
    }

    /// Resolves this rule's ids to chat ids.
    fn resolve(
        &self,
        all_chat_ids: &BTreeSet<String>,
        account_to_chats: &HashMap<String, BTreeSet<String>>,
    ) -> BTreeSet<String> {
        let mut resolved = BTreeSet::new();
        for id in &self.ids {
            match self.target {
                FilterTarget::Account => match account_to_chats.get(id) {
                    Some(chats) => resolved.extend(chats.iter().cloned()),
                    None => warn!(account = %id, "filter rule references an unknown account"),
                },
                FilterTarget::Chat => {
                    if all_chat_ids.contains(id) {
                        resolved.insert(id.clone());
                    } else {
                        warn!(chat = %id, "filter rule references an unknown chat");
                    }
                }
            }
        }
        resolved
    }
}

impl fmt::Display for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.action {
            FilterAction::Include => "include",
            FilterAction::Exclude => "exclude",
        };
        let target = match self.target {
            FilterTarget::Account => "account",
            FilterTarget::Chat => "chat",
        };
        write!(f, "{action} {target} [{}]", self.ids.join(", "))
    }
}

/// Builds the account → chats map used to expand account rules.
pub fn account_index(chats: &[Chat]) -> HashMap<String, BTreeSet<String>> {
    let mut index: HashMap<String, BTreeSet<String>> = HashMap::new();
    for chat in chats {
        index
            .entry(chat.account_id.clone())
            .or_default()
            .insert(chat.id.clone());
    }
    index
}

/// Folds `rules` over the known chats and returns the ids to export.
///
/// # Examples
///
/// ```
/// use std::collections::{BTreeSet, HashMap};
/// use beepex::core::filter::{FilterRule, apply};
///
/// let all: BTreeSet<String> = ["c1", "c2", "c3"].map(String::from).into();
/// let selected = apply(&[FilterRule::exclude_chats(["c1"])], &all, &HashMap::new());
/// assert_eq!(selected, ["c2", "c3"].map(String::from).into());
/// ```
pub fn apply(
    rules: &[FilterRule],
    all_chat_ids: &BTreeSet<String>,
    account_to_chats: &HashMap<String, BTreeSet<String>>,
) -> BTreeSet<String> {
    let mut current = match rules.first().map(|r| r.action) {
        Some(FilterAction::Include) => BTreeSet::new(),
        Some(FilterAction::Exclude) | None => all_chat_ids.clone(),
    };

    for rule in rules {
        let resolved = rule.resolve(all_chat_ids, account_to_chats);
        match rule.action {
            FilterAction::Include => current.extend(resolved),
            FilterAction::Exclude => current.retain(|id| !resolved.contains(id)),
        }
    }

    current
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn fixture() -> (BTreeSet<String>, HashMap<String, BTreeSet<String>>) {
        let chats = vec![
            Chat::new("c1", "One", "a1"),
            Chat::new("c2", "Two", "a1"),
            Chat::new("c3", "Three", "a2"),
            Chat::new("c4", "Four", "a3"),
        ];
        let all = chats.iter().map(|c| c.id.clone()).collect();
        (all, account_index(&chats))
    }

    #[test]
    fn test_no_rules_selects_everything() {
        let (all, owners) = fixture();
        assert_eq!(apply(&[], &all, &owners), all);
    }

    #[test]
    fn test_first_include_starts_empty() {
        let (all, owners) = fixture();
        let rules = [FilterRule::include_chats(["c3"])];
        assert_eq!(apply(&rules, &all, &owners), ids(&["c3"]));
    }

    #[test]
    fn test_first_exclude_starts_full() {
        let (all, owners) = fixture();
        let rules = [FilterRule::exclude_accounts(["a1"])];
        assert_eq!(apply(&rules, &all, &owners), ids(&["c3", "c4"]));
    }

    #[test]
    fn test_later_include_restores_excluded_chat() {
        let (all, owners) = fixture();
        let rules = [
            FilterRule::exclude_accounts(["a1"]),
            FilterRule::include_chats(["c2"]),
        ];
        assert_eq!(apply(&rules, &all, &owners), ids(&["c2", "c3", "c4"]));
    }

    #[test]
    fn test_rule_order_matters() {
        let (all, owners) = fixture();
        let a = [
            FilterRule::include_accounts(["a1"]),
            FilterRule::exclude_chats(["c1"]),
        ];
        let b = [
            FilterRule::exclude_chats(["c1"]),
            FilterRule::include_accounts(["a1"]),
        ];
        assert_eq!(apply(&a, &all, &owners), ids(&["c2"]));
        assert_eq!(apply(&b, &all, &owners), all);
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let (all, owners) = fixture();
        let rules = [
            FilterRule::include_accounts(["nope"]),
            FilterRule::include_chats(["c9", "c4"]),
        ];
        assert_eq!(apply(&rules, &all, &owners), ids(&["c4"]));
    }

    #[test]
    fn test_empty_result_is_valid() {
        let (all, owners) = fixture();
        let rules = [FilterRule::include_accounts(["missing"])];
        assert!(apply(&rules, &all, &owners).is_empty());
    }

    #[test]
    fn test_rule_display() {
        let rule = FilterRule::exclude_chats(["c1", "c2"]);
        assert_eq!(rule.to_string(), "exclude chat [c1, c2]");
    }
}
