/// Live index of open tabs keyed by domain
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::extract_key;
use crate::tab_data::{Tab, TabId};

/// Tabs sharing a domain key, in the order the host reported them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainGroup {
    pub tabs: Vec<Tab>,
    /// First non-empty favicon seen among the group's tabs
    pub favicon: Option<String>,
}

impl DomainGroup {
    fn push(&mut self, tab: Tab) {
        if self.favicon.is_none() {
            self.favicon = tab.favicon().map(str::to_string);
        }
        self.tabs.push(tab);
    }

    pub fn tab_ids(&self) -> Vec<TabId> {
        self.tabs.iter().map(|tab| tab.id).collect()
    }

    pub fn urls(&self) -> Vec<String> {
        self.tabs.iter().map(|tab| tab.url.clone()).collect()
    }
}

/// Mapping from domain key to its group
///
/// Never holds an empty group. Serializes as a plain object of
/// `{ "<domain>": { "tabs": [...], "favicon": ... } }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabIndex {
    groups: BTreeMap<String, DomainGroup>,
}

impl TabIndex {
    pub fn new() -> Self {
        TabIndex::default()
    }

    /// Partition a complete tab list into domain groups
    pub fn from_tabs(tabs: impl IntoIterator<Item = Tab>) -> Self {
        let mut groups: BTreeMap<String, DomainGroup> = BTreeMap::new();
        for tab in tabs {
            groups.entry(extract_key(&tab.url)).or_default().push(tab);
        }
        TabIndex { groups }
    }

    /// Drop a tab from whichever group holds it, deleting groups left empty
    ///
    /// Every group is scanned so a tab id listed under several keys is
    /// removed from all of them. Returns whether anything was removed.
    pub fn remove_tab(&mut self, tab_id: TabId) -> bool {
        let mut removed = false;
        self.groups.retain(|_, group| {
            let before = group.tabs.len();
            group.tabs.retain(|tab| tab.id != tab_id);
            removed |= group.tabs.len() < before;
            !group.tabs.is_empty()
        });
        removed
    }

    pub fn get(&self, key: &str) -> Option<&DomainGroup> {
        self.groups.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.groups.contains_key(key)
    }

    /// Domain keys in ascending order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &DomainGroup)> {
        self.groups.iter().map(|(key, group)| (key.as_str(), group))
    }

    /// Number of domain groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn tab_count(&self) -> usize {
        self.groups.values().map(|group| group.tabs.len()).sum()
    }
}
