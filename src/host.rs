/// Seams between the core and the host browser
///
/// The background only reaches the browser through these traits. The
/// WASM build implements them over the JS bridge (`crate::browser`);
/// unit tests use in-memory fakes.
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::messages::CoreMessage;
use crate::tab_data::{Tab, TabId, WindowId};

/// Tab and window operations
#[allow(async_fn_in_trait)]
pub trait TabHost {
    /// Every open tab across all windows
    async fn query_tabs(&self) -> Result<Vec<Tab>>;

    /// Tabs of one window, or of the current window when `window_id` is None
    async fn window_tabs(&self, window_id: Option<WindowId>) -> Result<Vec<Tab>>;

    async fn current_window(&self) -> Result<WindowId>;

    async fn create_tab(&self, url: &str, window_id: WindowId) -> Result<()>;

    /// Open a new window holding one tab per URL
    async fn create_window(&self, urls: &[String]) -> Result<()>;

    /// Move tabs to the end of a window
    async fn move_tabs(&self, tab_ids: &[TabId], window_id: WindowId) -> Result<()>;

    async fn remove_tabs(&self, tab_ids: &[TabId]) -> Result<()>;

    async fn activate_tab(&self, tab_id: TabId) -> Result<()>;

    async fn focus_window(&self, window_id: WindowId) -> Result<()>;
}

/// Durable key-value storage (`storage.local`)
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    /// Read a key; `None` when it was never written
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>>;

    async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()>;
}

/// A connected view's end of the port
pub trait ViewSink {
    fn post(&self, message: &CoreMessage<'_>) -> Result<()>;
}
