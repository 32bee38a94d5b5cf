//! The funding state record.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Key of the singleton row every consumer reads and writes.
pub const DEFAULT_ID: &str = "default";

/// One of the two item lists carried by a [`FundingState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Applied,
    Irrelevant,
}

impl ListKind {
    /// Column holding this list.
    pub fn column(self) -> &'static str {
        match self {
            ListKind::Applied => "applied",
            ListKind::Irrelevant => "irrelevant",
        }
    }

    pub fn other(self) -> Self {
        match self {
            ListKind::Applied => ListKind::Irrelevant,
            ListKind::Irrelevant => ListKind::Applied,
        }
    }
}

impl std::fmt::Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "applied" => Ok(ListKind::Applied),
            "irrelevant" => Ok(ListKind::Irrelevant),
            other => Err(format!(
                "unknown list '{other}' (expected 'applied' or 'irrelevant')"
            )),
        }
    }
}

/// A row of the `funding_state` table.
///
/// `applied` and `irrelevant` are opaque, ordered lists of item identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingState {
    pub id: String,
    #[serde(default)]
    pub applied: Vec<String>,
    #[serde(default)]
    pub irrelevant: Vec<String>,
}

impl FundingState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            applied: Vec::new(),
            irrelevant: Vec::new(),
        }
    }

    pub fn list(&self, kind: ListKind) -> &[String] {
        match kind {
            ListKind::Applied => &self.applied,
            ListKind::Irrelevant => &self.irrelevant,
        }
    }

    pub fn list_mut(&mut self, kind: ListKind) -> &mut Vec<String> {
        match kind {
            ListKind::Applied => &mut self.applied,
            ListKind::Irrelevant => &mut self.irrelevant,
        }
    }

    /// The list that currently holds `item`, checking `applied` first.
    pub fn status(&self, item: &str) -> Option<ListKind> {
        [ListKind::Applied, ListKind::Irrelevant]
            .into_iter()
            .find(|&kind| self.list(kind).iter().any(|i| i == item))
    }

    /// Record `item` as applied, taking it off the irrelevant list.
    ///
    /// Returns `true` if either list changed.
    pub fn mark_applied(&mut self, item: &str) -> bool {
        self.mark(ListKind::Applied, item)
    }

    /// Record `item` as irrelevant, taking it off the applied list.
    pub fn mark_irrelevant(&mut self, item: &str) -> bool {
        self.mark(ListKind::Irrelevant, item)
    }

    /// Remove every occurrence of `item` from one list.
    pub fn unmark(&mut self, kind: ListKind, item: &str) -> bool {
        remove_all(self.list_mut(kind), item)
    }

    fn mark(&mut self, kind: ListKind, item: &str) -> bool {
        let removed = remove_all(self.list_mut(kind.other()), item);
        let target = self.list_mut(kind);
        let added = !target.iter().any(|i| i == item);
        if added {
            target.push(item.to_string());
        }
        added || removed
    }
}

impl Default for FundingState {
    fn default() -> Self {
        Self::new(DEFAULT_ID)
    }
}

fn remove_all(list: &mut Vec<String>, item: &str) -> bool {
    let before = list.len();
    list.retain(|i| i != item);
    list.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty_singleton() {
        let state = FundingState::default();
        assert_eq!(state.id, "default");
        assert!(state.applied.is_empty());
        assert!(state.irrelevant.is_empty());
    }

    #[test]
    fn test_mark_moves_between_lists() {
        let mut state = FundingState::default();
        assert!(state.mark_irrelevant("afcn-12"));
        assert_eq!(state.status("afcn-12"), Some(ListKind::Irrelevant));

        assert!(state.mark_applied("afcn-12"));
        assert_eq!(state.applied, vec!["afcn-12"]);
        assert!(state.irrelevant.is_empty());

        // already applied
        assert!(!state.mark_applied("afcn-12"));
        assert_eq!(state.applied.len(), 1);
    }

    #[test]
    fn test_mark_keeps_existing_order() {
        let mut state = FundingState::default();
        for id in ["c", "a", "b"] {
            state.mark_applied(id);
        }
        state.mark_irrelevant("a");
        assert_eq!(state.applied, vec!["c", "b"]);
        assert_eq!(state.irrelevant, vec!["a"]);
    }

    #[test]
    fn test_unmark() {
        let mut state = FundingState::default();
        state.mark_applied("x");
        assert!(!state.unmark(ListKind::Irrelevant, "x"));
        assert!(state.unmark(ListKind::Applied, "x"));
        assert_eq!(state.status("x"), None);
    }

    #[test]
    fn test_list_kind_parse() {
        assert_eq!("applied".parse::<ListKind>(), Ok(ListKind::Applied));
        assert_eq!("irrelevant".parse::<ListKind>(), Ok(ListKind::Irrelevant));
        assert!("seen".parse::<ListKind>().is_err());
    }

    #[test]
    fn test_serializes_as_plain_record() {
        let json = serde_json::to_value(FundingState::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "default", "applied": [], "irrelevant": []})
        );
    }
}
