/// In-memory fakes of the host seams for native unit tests
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::host::{KeyValueStore, TabHost, ViewSink};
use crate::messages::CoreMessage;
use crate::tab_data::{Tab, TabId, WindowId};
use crate::tab_index::TabIndex;

/// Host calls observed by [`FakeTabs`]
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    CreateTab { url: String, window_id: WindowId },
    CreateWindow { urls: Vec<String> },
    MoveTabs { tab_ids: Vec<TabId>, window_id: WindowId },
    RemoveTabs { tab_ids: Vec<TabId> },
    ActivateTab { tab_id: TabId },
    FocusWindow { window_id: WindowId },
}

#[derive(Default)]
struct TabsState {
    tabs: Vec<Tab>,
    current_window: WindowId,
    calls: Vec<HostCall>,
    failing_urls: Vec<String>,
    fail_queries: bool,
}

/// Fake browser tabs; clones share state
#[derive(Clone, Default)]
pub struct FakeTabs {
    state: Rc<RefCell<TabsState>>,
}

impl FakeTabs {
    pub fn new(tabs: Vec<Tab>) -> Self {
        let fake = FakeTabs::default();
        fake.state.borrow_mut().current_window = tabs.first().map_or(1, |tab| tab.window_id);
        fake.state.borrow_mut().tabs = tabs;
        fake
    }

    pub fn set_tabs(&self, tabs: Vec<Tab>) {
        self.state.borrow_mut().tabs = tabs;
    }

    pub fn set_current_window(&self, window_id: WindowId) {
        self.state.borrow_mut().current_window = window_id;
    }

    /// Make `create_tab` reject this URL
    pub fn fail_url(&self, url: &str) {
        self.state.borrow_mut().failing_urls.push(url.to_string());
    }

    pub fn fail_queries(&self) {
        self.state.borrow_mut().fail_queries = true;
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state.borrow().calls.clone()
    }

    fn record(&self, call: HostCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl TabHost for FakeTabs {
    async fn query_tabs(&self) -> Result<Vec<Tab>> {
        let state = self.state.borrow();
        if state.fail_queries {
            return Err(Error::host("tabs.query", "query rejected"));
        }
        Ok(state.tabs.clone())
    }

    async fn window_tabs(&self, window_id: Option<WindowId>) -> Result<Vec<Tab>> {
        let state = self.state.borrow();
        let window_id = window_id.unwrap_or(state.current_window);
        Ok(state
            .tabs
            .iter()
            .filter(|tab| tab.window_id == window_id)
            .cloned()
            .collect())
    }

    async fn current_window(&self) -> Result<WindowId> {
        Ok(self.state.borrow().current_window)
    }

    async fn create_tab(&self, url: &str, window_id: WindowId) -> Result<()> {
        if self.state.borrow().failing_urls.iter().any(|failing| failing == url) {
            return Err(Error::host("tabs.create", format!("cannot open {url}")));
        }
        self.record(HostCall::CreateTab {
            url: url.to_string(),
            window_id,
        });
        Ok(())
    }

    async fn create_window(&self, urls: &[String]) -> Result<()> {
        self.record(HostCall::CreateWindow {
            urls: urls.to_vec(),
        });
        Ok(())
    }

    async fn move_tabs(&self, tab_ids: &[TabId], window_id: WindowId) -> Result<()> {
        self.record(HostCall::MoveTabs {
            tab_ids: tab_ids.to_vec(),
            window_id,
        });
        Ok(())
    }

    async fn remove_tabs(&self, tab_ids: &[TabId]) -> Result<()> {
        self.record(HostCall::RemoveTabs {
            tab_ids: tab_ids.to_vec(),
        });
        self.state
            .borrow_mut()
            .tabs
            .retain(|tab| !tab_ids.contains(&tab.id));
        Ok(())
    }

    async fn activate_tab(&self, tab_id: TabId) -> Result<()> {
        self.record(HostCall::ActivateTab { tab_id });
        Ok(())
    }

    async fn focus_window(&self, window_id: WindowId) -> Result<()> {
        self.record(HostCall::FocusWindow { window_id });
        Ok(())
    }
}

/// Fake `storage.local` holding JSON values; clones share state
#[derive(Clone, Default)]
pub struct FakeStore {
    values: Rc<RefCell<HashMap<String, serde_json::Value>>>,
}

impl FakeStore {
    pub fn raw(&self, key: &str) -> Option<serde_json::Value> {
        self.values.borrow().get(key).cloned()
    }

    pub fn put_raw(&self, key: &str, value: serde_json::Value) {
        self.values.borrow_mut().insert(key.to_string(), value);
    }
}

impl KeyValueStore for FakeStore {
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.raw(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.put_raw(key, value);
        Ok(())
    }
}

#[derive(Default)]
struct SinkState {
    snapshots: Vec<TabIndex>,
    closed: bool,
}

/// View port that records what it is sent; clones share state
#[derive(Clone, Default)]
pub struct RecordingSink {
    state: Rc<RefCell<SinkState>>,
}

impl RecordingSink {
    /// Simulate the view going away without a disconnect event
    pub fn close(&self) {
        self.state.borrow_mut().closed = true;
    }

    pub fn snapshots(&self) -> Vec<TabIndex> {
        self.state.borrow().snapshots.clone()
    }

    pub fn last(&self) -> Option<TabIndex> {
        self.snapshots().pop()
    }
}

impl ViewSink for RecordingSink {
    fn post(&self, message: &CoreMessage<'_>) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.closed {
            return Err(Error::Disconnected);
        }
        let CoreMessage::UpdateSidebar { data } = message;
        state.snapshots.push(data.clone().into_owned());
        Ok(())
    }
}
