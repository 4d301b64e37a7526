/// Tab Shelf - sidebar extension grouping open tabs by domain
/// Built with Rust + WASM + Yew

pub mod background;
pub mod browser;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod host;
pub mod messages;
pub mod notifier;
pub mod sidebar_state;
pub mod stash;
pub mod tab_data;
pub mod tab_index;
pub mod ui;

#[cfg(test)]
mod testing;

use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::background::Background;
use crate::browser::BrowserHost;
use crate::config::Settings;
use crate::dispatch::HostEvent;
use crate::tab_data::StashId;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
}

// Re-export the domain key extractor for JavaScript access
#[wasm_bindgen]
pub fn extract_domain(url: &str) -> String {
    domain::extract_key(url)
}

// Build the background core and subscribe it to host events
#[wasm_bindgen]
pub fn start_background(options: JsValue) {
    let settings = if options.is_null() || options.is_undefined() {
        Settings::default()
    } else {
        browser::from_js(options).unwrap_or_else(|err| {
            web_sys::console::warn_1(&format!("Invalid options, using defaults: {}", err).into());
            Settings::default()
        })
    };
    wasm_logger::init(wasm_logger::Config::new(settings.level()));
    log::info!("Starting background");

    let background = Background::new(BrowserHost, BrowserHost, &settings, || {
        js_sys::Date::now() as StashId
    });
    let background = Rc::new(background);
    browser::subscribe(background.clone());

    // Index whatever is already open
    wasm_bindgen_futures::spawn_local(async move {
        background.handle_event(HostEvent::Startup).await;
    });
}

// Start the Yew app for the sidebar
#[wasm_bindgen]
pub fn start_sidebar() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<ui::sidebar::Sidebar>::new().render();
}
