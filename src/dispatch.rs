//! Routing of host lifecycle events to index reactions.
//!
//! The JS bridge subscribes to every name in [`LIFECYCLE_EVENTS`] and
//! forwards each notification as `(name, detail)`. [`HostEvent::from_name`]
//! parses it and [`route`] decides, without touching any state, what the
//! background does about it.

use serde::Deserialize;

use crate::tab_data::TabId;

/// Host events the background listens to
pub const LIFECYCLE_EVENTS: &[&str] = &[
    "tabs.onCreated",
    "tabs.onMoved",
    "tabs.onActivated",
    "tabs.onUpdated",
    "tabs.onRemoved",
    "windows.onFocusChanged",
    "runtime.onStartup",
    "runtime.onInstalled",
    "runtime.onSuspend",
];

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    TabCreated,
    TabMoved,
    TabActivated,
    TabUpdated { url_changed: bool },
    TabRemoved { tab_id: TabId },
    WindowFocusChanged,
    Startup,
    Installed,
    Suspend,
}

/// Detail the bridge attaches to a notification
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDetail {
    pub tab_id: Option<TabId>,
    pub url_changed: bool,
}

impl HostEvent {
    /// Parse a bridge notification; `None` for unknown names or a removal
    /// without a tab id
    pub fn from_name(name: &str, detail: &EventDetail) -> Option<HostEvent> {
        let event = match name {
            "tabs.onCreated" => HostEvent::TabCreated,
            "tabs.onMoved" => HostEvent::TabMoved,
            "tabs.onActivated" => HostEvent::TabActivated,
            "tabs.onUpdated" => HostEvent::TabUpdated {
                url_changed: detail.url_changed,
            },
            "tabs.onRemoved" => HostEvent::TabRemoved {
                tab_id: detail.tab_id?,
            },
            "windows.onFocusChanged" => HostEvent::WindowFocusChanged,
            "runtime.onStartup" => HostEvent::Startup,
            "runtime.onInstalled" => HostEvent::Installed,
            "runtime.onSuspend" => HostEvent::Suspend,
            _ => return None,
        };
        Some(event)
    }

    pub fn name(&self) -> &'static str {
        match self {
            HostEvent::TabCreated => "tabs.onCreated",
            HostEvent::TabMoved => "tabs.onMoved",
            HostEvent::TabActivated => "tabs.onActivated",
            HostEvent::TabUpdated { .. } => "tabs.onUpdated",
            HostEvent::TabRemoved { .. } => "tabs.onRemoved",
            HostEvent::WindowFocusChanged => "windows.onFocusChanged",
            HostEvent::Startup => "runtime.onStartup",
            HostEvent::Installed => "runtime.onInstalled",
            HostEvent::Suspend => "runtime.onSuspend",
        }
    }
}

/// What the background does in response to an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Requery every tab and replace the index
    Rebuild,
    /// Patch the index in place
    RemoveTab(TabId),
    /// Tear down the view connection
    Shutdown,
    Ignore,
}

/// Removal is the only event patched incrementally; everything else that
/// can change grouping or order triggers a full rebuild.
pub fn route(event: &HostEvent) -> Reaction {
    match event {
        HostEvent::TabRemoved { tab_id } => Reaction::RemoveTab(*tab_id),
        HostEvent::TabUpdated { url_changed: false } => Reaction::Ignore,
        HostEvent::Suspend => Reaction::Shutdown,
        HostEvent::TabCreated
        | HostEvent::TabMoved
        | HostEvent::TabActivated
        | HostEvent::TabUpdated { url_changed: true }
        | HostEvent::WindowFocusChanged
        | HostEvent::Startup
        | HostEvent::Installed => Reaction::Rebuild,
    }
}
