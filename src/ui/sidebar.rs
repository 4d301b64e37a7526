/// Sidebar view: renders the domain index and the stash list

use std::rc::Rc;

use patternfly_yew::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::browser::{from_js, to_js};
use crate::messages::{Command, CommandReply, CoreMessage, PortMessage};
use crate::sidebar_state::{SidebarState, VisibleDomain};
use crate::tab_data::{Stash, StashId, Tab, TabId, WindowId};
use crate::tab_index::TabIndex;

const DEFAULT_FAVICON: &str = "favicon.png";

// Import JS bridge functions
#[wasm_bindgen(module = "/sidebar.js")]
extern "C" {
    fn connectPort(on_message: &js_sys::Function) -> JsValue;

    #[wasm_bindgen(catch)]
    fn postToPort(port: &JsValue, message: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendCommand(command: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getCurrentWindowId() -> Result<JsValue, JsValue>;
}

pub enum SidebarAction {
    Update(TabIndex),
    Stashes(Vec<Stash>),
    ToggleDomain(String),
    ToggleStash(StashId),
    ToggleAll,
    Search(String),
    Window(WindowId),
}

impl Reducible for SidebarState {
    type Action = SidebarAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        match action {
            SidebarAction::Update(index) => next.apply_update(index),
            SidebarAction::Stashes(stashes) => next.sync_stashes(stashes),
            SidebarAction::ToggleDomain(domain) => next.toggle_domain(&domain),
            SidebarAction::ToggleStash(stash_id) => next.toggle_stash(stash_id),
            SidebarAction::ToggleAll => next.toggle_all(),
            SidebarAction::Search(term) => next.set_search(&term),
            SidebarAction::Window(window_id) => next.set_window(window_id),
        }
        Rc::new(next)
    }
}

#[function_component(Sidebar)]
pub fn sidebar() -> Html {
    let state = use_reducer(SidebarState::default);
    let error = use_state(|| None::<String>);
    let port = use_mut_ref(|| None::<JsValue>);

    // Connect to the background and ask for the first snapshot
    {
        let dispatcher = state.dispatcher();
        let error = error.clone();
        let port_ref = port.clone();

        use_effect_with((), move |_| {
            let on_message = {
                let dispatcher = dispatcher.clone();
                Closure::wrap(Box::new(move |message: JsValue| {
                    match from_js::<CoreMessage<'static>>(message) {
                        Ok(CoreMessage::UpdateSidebar { data }) => {
                            dispatcher.dispatch(SidebarAction::Update(data.into_owned()));
                        }
                        Err(e) => log::warn!("Ignoring background message: {}", e),
                    }
                }) as Box<dyn Fn(JsValue)>)
            };

            let port = connectPort(on_message.as_ref().unchecked_ref());
            on_message.forget();

            if let Err(e) = request_initial_data(&port) {
                error.set(Some(e));
            }
            *port_ref.borrow_mut() = Some(port);

            {
                let dispatcher = dispatcher.clone();
                spawn_local(async move {
                    match getCurrentWindowId().await.map(from_js::<WindowId>) {
                        Ok(Ok(window_id)) => dispatcher.dispatch(SidebarAction::Window(window_id)),
                        _ => log::warn!("Sidebar window unknown, using the focused window"),
                    }
                });
            }

            run_command(Command::ListStashes, dispatcher, error);
            || ()
        });
    }

    // Keep the highlighted tab in view
    {
        let active = state.active_tab().map(|tab| tab.id);
        use_effect_with(active, |active| {
            if active.is_some() {
                scroll_to_active();
            }
            || ()
        });
    }

    let on_refresh = {
        let dispatcher = state.dispatcher();
        let error = error.clone();
        let port = port.clone();
        Callback::from(move |_: ()| {
            if let Some(port) = port.borrow().as_ref() {
                match request_initial_data(port) {
                    Ok(()) => error.set(None),
                    Err(e) => error.set(Some(e)),
                }
            }
            run_command(Command::ListStashes, dispatcher.clone(), error.clone());
        })
    };

    let on_search_input = {
        let dispatcher = state.dispatcher();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                dispatcher.dispatch(SidebarAction::Search(input.value()));
            }
        })
    };

    let on_toggle_all = {
        let dispatcher = state.dispatcher();
        Callback::from(move |_| dispatcher.dispatch(SidebarAction::ToggleAll))
    };

    let on_save_stash = {
        let dispatcher = state.dispatcher();
        let error = error.clone();
        let window_id = state.window_id;
        Callback::from(move |_| {
            run_command(
                Command::SaveStash { stash: None, window_id },
                dispatcher.clone(),
                error.clone(),
            );
        })
    };

    let on_toggle_domain = {
        let dispatcher = state.dispatcher();
        Callback::from(move |domain: String| dispatcher.dispatch(SidebarAction::ToggleDomain(domain)))
    };

    let on_toggle_stash = {
        let dispatcher = state.dispatcher();
        Callback::from(move |stash_id: StashId| dispatcher.dispatch(SidebarAction::ToggleStash(stash_id)))
    };

    let on_command = {
        let dispatcher = state.dispatcher();
        let error = error.clone();
        Callback::from(move |command: Command| {
            run_command(command, dispatcher.clone(), error.clone());
        })
    };

    let visible = state.visible_domains();

    html! {
        <div class="sidebar">
            <div class="sidebar-toolbar">
                <input
                    type="text"
                    placeholder="Search tabs..."
                    value={state.search_term.clone()}
                    oninput={on_search_input}
                    onfocus={on_refresh.reform(|_: FocusEvent| ())}
                    class="search-input"
                />
                <Button onclick={on_refresh.reform(|_| ())} variant={ButtonVariant::Secondary}>
                    {"Refresh"}
                </Button>
                <Button onclick={on_toggle_all} variant={ButtonVariant::Secondary}>
                    {if state.all_collapsed() { "Expand all" } else { "Collapse all" }}
                </Button>
                <Button onclick={on_save_stash}>
                    {"Stash window"}
                </Button>
            </div>

            if let Some(err) = (*error).clone() {
                <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                    {err}
                </Alert>
            }

            <p class="total-tab-count">{state.tab_count_label()}</p>

            <div class="tab-tree">
                {for visible.iter().map(|domain| domain_view(domain, &on_toggle_domain, &on_command))}
            </div>

            <h2 class="stash-heading">{"Stashes"}</h2>
            <div class="stash-list">
                {for state.stashes.iter().map(|stash| {
                    stash_view(
                        stash,
                        state.is_stash_collapsed(stash.id),
                        state.window_id,
                        &on_toggle_stash,
                        &on_command,
                    )
                })}
            </div>
        </div>
    }
}

fn domain_view(
    domain: &VisibleDomain<'_>,
    on_toggle: &Callback<String>,
    on_command: &Callback<Command>,
) -> Html {
    let name = domain.domain.to_string();
    let favicon = domain
        .group
        .favicon
        .clone()
        .unwrap_or_else(|| DEFAULT_FAVICON.to_string());

    html! {
        <div key={name.clone()} class="domain">
            <div class="domain-title" onclick={on_toggle.reform({
                let name = name.clone();
                move |_| name.clone()
            })}>
                <img src={favicon} class="domain-favicon" />
                <span class="domain-name">{&name}</span>
                <span class="tab-count">{format!("({})", domain.tabs.len())}</span>
                <Button
                    onclick={on_command.reform({
                        let domain = name.clone();
                        move |e: MouseEvent| {
                            e.stop_propagation();
                            Command::GroupDomain { domain: domain.clone() }
                        }
                    })}
                    variant={ButtonVariant::Secondary}
                    size={ButtonSize::Small}
                >
                    {"Group"}
                </Button>
                <Button
                    onclick={on_command.reform({
                        let domain = name.clone();
                        move |e: MouseEvent| {
                            e.stop_propagation();
                            Command::OpenDomainInNewWindow { domain: domain.clone() }
                        }
                    })}
                    variant={ButtonVariant::Secondary}
                    size={ButtonSize::Small}
                >
                    {"New window"}
                </Button>
            </div>
            if !domain.collapsed {
                <div class="tab-list">
                    {for domain.tabs.iter().map(|tab| tab_view(tab, domain.active_tab == Some(tab.id), on_command))}
                </div>
            }
        </div>
    }
}

fn tab_view(tab: &Tab, active: bool, on_command: &Callback<Command>) -> Html {
    let (tab_id, window_id): (TabId, WindowId) = (tab.id, tab.window_id);

    html! {
        <div
            key={tab.id.to_string()}
            class={classes!("tab", active.then_some("active"))}
            title={tab.url.clone()}
            onclick={on_command.reform(move |_| Command::FocusTab { tab_id, window_id })}
        >
            {&tab.title}
        </div>
    }
}

fn stash_view(
    stash: &Stash,
    collapsed: bool,
    window_id: Option<WindowId>,
    on_toggle: &Callback<StashId>,
    on_command: &Callback<Command>,
) -> Html {
    let stash_id = stash.id;
    let load = |new_window: bool| {
        let stash = stash.clone();
        on_command.reform(move |e: MouseEvent| {
            e.stop_propagation();
            Command::LoadStash {
                stash: stash.clone(),
                new_window,
                window_id,
            }
        })
    };

    html! {
        <div key={stash_id.to_string()} class="stash">
            <div class="stash-title" onclick={on_toggle.reform(move |_| stash_id)}>
                <span class="stash-name">{&stash.name}</span>
                <span class="tab-count">{format!("({})", stash.tabs.len())}</span>
                <Button onclick={load(false)} size={ButtonSize::Small}>
                    {"Restore"}
                </Button>
                <Button onclick={load(true)} variant={ButtonVariant::Secondary} size={ButtonSize::Small}>
                    {"Open"}
                </Button>
                <Button
                    onclick={on_command.reform(move |e: MouseEvent| {
                        e.stop_propagation();
                        Command::DeleteStash { stash_id }
                    })}
                    variant={ButtonVariant::Danger}
                    size={ButtonSize::Small}
                >
                    {"X"}
                </Button>
            </div>
            if !collapsed {
                <div class="stash-tabs">
                    {for stash.tabs.iter().map(|tab| html! {
                        <div class="stash-tab" title={tab.url.clone()}>{&tab.title}</div>
                    })}
                </div>
            }
        </div>
    }
}

fn request_initial_data(port: &JsValue) -> Result<(), String> {
    let request = to_js(&PortMessage::RequestInitialData).map_err(|e| e.to_string())?;
    postToPort(port, request).map_err(|e| format!("Failed to reach background: {:?}", e))
}

fn scroll_to_active() {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };
    if let Ok(Some(element)) = document.query_selector(".tab.active") {
        element.scroll_into_view();
    }
}

/// Send a command to the background; a returned stash list refreshes the view
fn run_command(
    command: Command,
    dispatcher: UseReducerDispatcher<SidebarState>,
    error: UseStateHandle<Option<String>>,
) {
    spawn_local(async move {
        match send_command(&command).await {
            Ok(CommandReply { ok: true, stashes, .. }) => {
                if let Some(stashes) = stashes {
                    dispatcher.dispatch(SidebarAction::Stashes(stashes));
                }
            }
            Ok(CommandReply { error: reason, .. }) => {
                error.set(Some(reason.unwrap_or_else(|| "Command failed".to_string())));
            }
            Err(e) => error.set(Some(e)),
        }
    });
}

async fn send_command(command: &Command) -> Result<CommandReply, String> {
    let command_js = to_js(command).map_err(|e| format!("Failed to serialize: {}", e))?;
    let reply_js = sendCommand(command_js)
        .await
        .map_err(|e| format!("Failed to reach background: {:?}", e))?;
    from_js(reply_js).map_err(|e| format!("Failed to parse reply: {}", e))
}
