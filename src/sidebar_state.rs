/// View-local state of the sidebar
///
/// Everything here is derived from the `updateSidebar` snapshots and the
/// stash list; collapse flags never leave the view.
use std::collections::HashMap;

use crate::tab_data::{Stash, StashId, Tab, TabId, WindowId};
use crate::tab_index::{DomainGroup, TabIndex};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SidebarState {
    pub index: TabIndex,
    pub stashes: Vec<Stash>,
    /// Domain key → collapsed
    pub domain_states: HashMap<String, bool>,
    /// Stash id → collapsed
    pub stash_states: HashMap<StashId, bool>,
    pub search_term: String,
    /// The window this sidebar belongs to, once the host has said
    pub window_id: Option<WindowId>,
}

/// A domain group as currently shown
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleDomain<'a> {
    pub domain: &'a str,
    pub group: &'a DomainGroup,
    pub tabs: Vec<&'a Tab>,
    pub collapsed: bool,
    /// The highlighted tab, when it is one of `tabs`
    pub active_tab: Option<TabId>,
}

impl SidebarState {
    /// Take a new snapshot; new domains start expanded
    pub fn apply_update(&mut self, index: TabIndex) {
        self.domain_states.retain(|domain, _| index.contains(domain));
        for domain in index.keys() {
            self.domain_states.entry(domain.to_string()).or_insert(false);
        }
        self.index = index;
    }

    /// Take a new stash list; new stashes start collapsed
    pub fn sync_stashes(&mut self, stashes: Vec<Stash>) {
        self.stash_states
            .retain(|id, _| stashes.iter().any(|stash| stash.id == *id));
        for stash in &stashes {
            self.stash_states.entry(stash.id).or_insert(true);
        }
        self.stashes = stashes;
    }

    pub fn toggle_domain(&mut self, domain: &str) {
        if let Some(collapsed) = self.domain_states.get_mut(domain) {
            *collapsed = !*collapsed;
        }
    }

    pub fn toggle_stash(&mut self, stash_id: StashId) {
        if let Some(collapsed) = self.stash_states.get_mut(&stash_id) {
            *collapsed = !*collapsed;
        }
    }

    /// Collapse everything, or expand everything if all are collapsed
    pub fn toggle_all(&mut self) {
        let collapse = !self.all_collapsed();
        for collapsed in self.domain_states.values_mut() {
            *collapsed = collapse;
        }
    }

    pub fn all_collapsed(&self) -> bool {
        self.domain_states.values().all(|collapsed| *collapsed)
    }

    pub fn is_domain_collapsed(&self, domain: &str) -> bool {
        self.domain_states.get(domain).copied().unwrap_or(false)
    }

    pub fn is_stash_collapsed(&self, stash_id: StashId) -> bool {
        self.stash_states.get(&stash_id).copied().unwrap_or(true)
    }

    pub fn set_search(&mut self, term: &str) {
        self.search_term = term.to_string();
    }

    pub fn set_window(&mut self, window_id: WindowId) {
        self.window_id = Some(window_id);
    }

    /// The active tab of this sidebar's window, or of any window while the
    /// sidebar's own window is unknown
    pub fn active_tab(&self) -> Option<&Tab> {
        self.index
            .groups()
            .flat_map(|(_, group)| group.tabs.iter())
            .find(|tab| tab.active && self.window_id.is_none_or(|window_id| tab.window_id == window_id))
    }

    /// Domains in ascending order, holding only tabs whose title or URL
    /// contains the search term (case-insensitive)
    pub fn visible_domains(&self) -> Vec<VisibleDomain<'_>> {
        let term = self.search_term.to_lowercase();
        let active = self.active_tab().map(|tab| tab.id);
        self.index
            .groups()
            .filter_map(|(domain, group)| {
                let tabs: Vec<&Tab> = group
                    .tabs
                    .iter()
                    .filter(|tab| matches_term(tab, &term))
                    .collect();
                if tabs.is_empty() {
                    return None;
                }
                let active_tab = active.filter(|id| tabs.iter().any(|tab| tab.id == *id));
                Some(VisibleDomain {
                    domain,
                    group,
                    tabs,
                    collapsed: self.is_domain_collapsed(domain),
                    active_tab,
                })
            })
            .collect()
    }

    pub fn visible_tab_count(&self) -> usize {
        self.visible_domains().iter().map(|domain| domain.tabs.len()).sum()
    }

    /// "Total tabs: N", or "Showing V of N tabs" while a search hides some
    pub fn tab_count_label(&self) -> String {
        let total = self.index.tab_count();
        let visible = self.visible_tab_count();
        if visible == total {
            format!("Total tabs: {}", total)
        } else {
            format!("Showing {} of {} tabs", visible, total)
        }
    }
}

fn matches_term(tab: &Tab, term: &str) -> bool {
    term.is_empty() || tab.title.to_lowercase().contains(term) || tab.url.to_lowercase().contains(term)
}
