/// Data structures shared by the background and the sidebar
use serde::{Deserialize, Serialize};

pub type TabId = i32;
pub type WindowId = i32;

/// Stash identifier: the millisecond timestamp the stash was created at
pub type StashId = i64;

/// A browser tab as reported by `tabs.query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    pub window_id: WindowId,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub fav_icon_url: Option<String>,
    /// Whether this is the selected tab of its window
    #[serde(default)]
    pub active: bool,
}

impl Tab {
    pub fn new(id: TabId, window_id: WindowId, url: &str, title: &str) -> Tab {
        Tab {
            id,
            window_id,
            url: url.to_string(),
            title: title.to_string(),
            fav_icon_url: None,
            active: false,
        }
    }

    pub fn activated(mut self) -> Tab {
        self.active = true;
        self
    }

    pub fn with_favicon(mut self, favicon: &str) -> Tab {
        self.fav_icon_url = Some(favicon.to_string());
        self
    }

    /// The favicon, if the host reported a non-empty one
    pub fn favicon(&self) -> Option<&str> {
        self.fav_icon_url.as_deref().filter(|icon| !icon.is_empty())
    }
}

/// A named snapshot of a window's tabs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stash {
    pub id: StashId,
    pub name: String,
    pub tabs: Vec<StashedTab>,
}

impl Stash {
    /// Capture URL and title of each tab; tab and window ids are dropped
    pub fn capture(id: StashId, name: String, tabs: &[Tab]) -> Stash {
        Stash {
            id,
            name,
            tabs: tabs.iter().map(StashedTab::from).collect(),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.tabs.iter().map(|tab| tab.url.clone()).collect()
    }
}

/// A saved tab within a stash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StashedTab {
    pub url: String,
    pub title: String,
}

impl From<&Tab> for StashedTab {
    fn from(tab: &Tab) -> Self {
        StashedTab {
            url: tab.url.clone(),
            title: tab.title.clone(),
        }
    }
}
