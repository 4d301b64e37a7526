/// Host seams implemented over the `browser.*` WebExtension APIs
///
/// Every call goes through the JS bridge in `/background.js`.
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use crate::background::Background;
use crate::dispatch::{EventDetail, HostEvent, LIFECYCLE_EVENTS};
use crate::error::{Error, Result};
use crate::host::{KeyValueStore, TabHost, ViewSink};
use crate::messages::{Command, CommandReply, CoreMessage, PortMessage};
use crate::notifier::ConnectionId;
use crate::tab_data::{Tab, TabId, WindowId};

// Import JS bridge functions
#[wasm_bindgen(module = "/background.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn queryTabs() -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getWindowTabs(window_id: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getCurrentWindowId() -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn createTab(url: &str, window_id: i32) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn createWindow(urls: JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn moveTabs(tab_ids: JsValue, window_id: i32) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn removeTabs(tab_ids: JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn activateTab(tab_id: i32) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn focusWindow(window_id: i32) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn getStorage(key: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(key: &str, value: JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn postToPort(port: &JsValue, message: JsValue) -> std::result::Result<(), JsValue>;

    fn registerListeners(
        events: &js_sys::Array,
        on_event: &js_sys::Function,
        on_connect: &js_sys::Function,
        on_port_message: &js_sys::Function,
        on_disconnect: &js_sys::Function,
        on_command: &js_sys::Function,
    );
}

pub type BrowserBackground = Background<BrowserHost, BrowserHost, PortSink>;

/// Serialize to plain JS objects and numbers, which is what ports and
/// `storage.local` expect
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(Error::serialization)
}

pub fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T> {
    serde_wasm_bindgen::from_value(value).map_err(Error::serialization)
}

fn host_error(operation: &'static str) -> impl FnOnce(JsValue) -> Error {
    move |err| Error::host(operation, js_error_message(&err))
}

/// Readable text of a rejection: a thrown `Error`'s message, a string as is
fn js_error_message(err: &JsValue) -> String {
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

/// The `browser.*` namespace of the running extension
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserHost;

impl TabHost for BrowserHost {
    async fn query_tabs(&self) -> Result<Vec<Tab>> {
        let tabs = queryTabs().await.map_err(host_error("tabs.query"))?;
        from_js(tabs)
    }

    async fn window_tabs(&self, window_id: Option<WindowId>) -> Result<Vec<Tab>> {
        let window_id = window_id.map_or(JsValue::NULL, JsValue::from);
        let tabs = getWindowTabs(window_id)
            .await
            .map_err(host_error("windows.get"))?;
        from_js(tabs)
    }

    async fn current_window(&self) -> Result<WindowId> {
        let window_id = getCurrentWindowId()
            .await
            .map_err(host_error("windows.getLastFocused"))?;
        from_js(window_id)
    }

    async fn create_tab(&self, url: &str, window_id: WindowId) -> Result<()> {
        createTab(url, window_id).await.map_err(host_error("tabs.create"))
    }

    async fn create_window(&self, urls: &[String]) -> Result<()> {
        createWindow(to_js(urls)?)
            .await
            .map_err(host_error("windows.create"))
    }

    async fn move_tabs(&self, tab_ids: &[TabId], window_id: WindowId) -> Result<()> {
        moveTabs(to_js(tab_ids)?, window_id)
            .await
            .map_err(host_error("tabs.move"))
    }

    async fn remove_tabs(&self, tab_ids: &[TabId]) -> Result<()> {
        removeTabs(to_js(tab_ids)?)
            .await
            .map_err(host_error("tabs.remove"))
    }

    async fn activate_tab(&self, tab_id: TabId) -> Result<()> {
        activateTab(tab_id).await.map_err(host_error("tabs.update"))
    }

    async fn focus_window(&self, window_id: WindowId) -> Result<()> {
        focusWindow(window_id)
            .await
            .map_err(host_error("windows.update"))
    }
}

impl KeyValueStore for BrowserHost {
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let value = getStorage(key).await.map_err(host_error("storage.local.get"))?;
        if value.is_null() || value.is_undefined() {
            Ok(None)
        } else {
            from_js(value).map(Some)
        }
    }

    async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        setStorage(key, to_js(value)?)
            .await
            .map_err(host_error("storage.local.set"))
    }
}

/// A sidebar's `runtime.Port`
pub struct PortSink(pub JsValue);

impl ViewSink for PortSink {
    fn post(&self, message: &CoreMessage<'_>) -> Result<()> {
        postToPort(&self.0, to_js(message)?).map_err(|_| Error::Disconnected)
    }
}

fn event_detail(detail: JsValue) -> EventDetail {
    if detail.is_null() || detail.is_undefined() {
        return EventDetail::default();
    }
    from_js(detail).unwrap_or_else(|err| {
        log::warn!("Unreadable event detail: {}", err);
        EventDetail::default()
    })
}

/// Subscribe the background to host events, ports and commands
///
/// The listeners live as long as the background page.
pub fn subscribe(background: Rc<BrowserBackground>) {
    let on_event = {
        let background = background.clone();
        Closure::wrap(Box::new(move |name: String, detail: JsValue| {
            let Some(event) = HostEvent::from_name(&name, &event_detail(detail)) else {
                log::warn!("Ignoring host event {}", name);
                return;
            };
            let background = background.clone();
            spawn_local(async move {
                background.handle_event(event).await;
            });
        }) as Box<dyn Fn(String, JsValue)>)
    };

    let on_connect = {
        let background = background.clone();
        Closure::wrap(Box::new(move |port: JsValue| -> u32 {
            background.connect(PortSink(port)).0
        }) as Box<dyn Fn(JsValue) -> u32>)
    };

    let on_port_message = {
        let background = background.clone();
        Closure::wrap(Box::new(move |connection: u32, message: JsValue| {
            let message: PortMessage = match from_js(message) {
                Ok(message) => message,
                Err(err) => {
                    log::warn!("Ignoring port message: {}", err);
                    return;
                }
            };
            let background = background.clone();
            spawn_local(async move {
                background
                    .handle_port_message(ConnectionId(connection), message)
                    .await;
            });
        }) as Box<dyn Fn(u32, JsValue)>)
    };

    let on_disconnect = {
        let background = background.clone();
        Closure::wrap(Box::new(move |connection: u32| {
            background.disconnect(ConnectionId(connection));
        }) as Box<dyn Fn(u32)>)
    };

    let on_command = Closure::wrap(Box::new(move |message: JsValue| -> js_sys::Promise {
        let background = background.clone();
        future_to_promise(async move {
            let reply = match from_js::<Command>(message) {
                Ok(command) => background.handle_command(command).await,
                Err(err) => {
                    log::warn!("Rejecting command: {}", err);
                    CommandReply::failed(err)
                }
            };
            to_js(&reply).map_err(|err| JsValue::from_str(&err.to_string()))
        })
    }) as Box<dyn Fn(JsValue) -> js_sys::Promise>);

    let events: js_sys::Array = LIFECYCLE_EVENTS
        .iter()
        .map(|name| JsValue::from_str(name))
        .collect();

    registerListeners(
        &events,
        on_event.as_ref().unchecked_ref(),
        on_connect.as_ref().unchecked_ref(),
        on_port_message.as_ref().unchecked_ref(),
        on_disconnect.as_ref().unchecked_ref(),
        on_command.as_ref().unchecked_ref(),
    );

    on_event.forget();
    on_connect.forget();
    on_port_message.forget();
    on_disconnect.forget();
    on_command.forget();
}
