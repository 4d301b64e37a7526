//! Messages exchanged between the background and the sidebar.
//!
//! | Channel | Direction | Actions |
//! |---------|-----------|---------|
//! | port | view → core | `requestInitialData` |
//! | port | core → view | `updateSidebar` |
//! | one-shot | view → core | `saveStash`, `loadStash`, `deleteStash`, `listStashes`, `focusTab`, `groupDomain`, `openDomainInNewWindow` |

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::tab_data::{Stash, StashId, TabId, WindowId};
use crate::tab_index::TabIndex;

/// Sent by the view over its long-lived port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PortMessage {
    RequestInitialData,
}

/// Pushed to the connected view after every index change
///
/// The background lends its index; the view decodes an owned copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum CoreMessage<'a> {
    UpdateSidebar { data: Cow<'a, TabIndex> },
}

/// One-shot requests from the view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    /// Append `stash` as given, or capture `window_id` (current window when absent)
    SaveStash {
        #[serde(default)]
        stash: Option<Stash>,
        #[serde(default)]
        window_id: Option<WindowId>,
    },
    /// Reopen `stash` in a new window, or in `window_id` (current window when absent)
    LoadStash {
        stash: Stash,
        #[serde(default)]
        new_window: bool,
        #[serde(default)]
        window_id: Option<WindowId>,
    },
    DeleteStash {
        stash_id: StashId,
    },
    ListStashes,
    FocusTab {
        tab_id: TabId,
        window_id: WindowId,
    },
    GroupDomain {
        domain: String,
    },
    OpenDomainInNewWindow {
        domain: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandReply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stashes: Option<Vec<Stash>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandReply {
    pub fn ok() -> Self {
        CommandReply {
            ok: true,
            ..CommandReply::default()
        }
    }

    pub fn with_stashes(stashes: Vec<Stash>) -> Self {
        CommandReply {
            ok: true,
            stashes: Some(stashes),
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        CommandReply {
            ok: false,
            stashes: None,
            error: Some(error.to_string()),
        }
    }
}
