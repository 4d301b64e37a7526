/// The long-lived background core
///
/// Owns the tab index, the view connection and the stash store. The WASM
/// entry point constructs one instance at startup and hands it to the
/// event bridge; nothing here is global.
use std::cell::{Ref, RefCell};

use crate::config::Settings;
use crate::dispatch::{HostEvent, Reaction, route};
use crate::error::Result;
use crate::host::{KeyValueStore, TabHost, ViewSink};
use crate::messages::{Command, CommandReply, PortMessage};
use crate::notifier::{ChangeNotifier, ConnectionId};
use crate::stash::{RestoreTarget, StashStore};
use crate::tab_data::{StashId, TabId, WindowId};
use crate::tab_index::TabIndex;

pub struct Background<T, K, S> {
    tabs: T,
    index: RefCell<TabIndex>,
    notifier: ChangeNotifier<S>,
    stashes: StashStore<K>,
    clock: Box<dyn Fn() -> StashId>,
}

impl<T, K, S> Background<T, K, S>
where
    T: TabHost,
    K: KeyValueStore,
    S: ViewSink,
{
    /// `clock` returns the current time in milliseconds
    pub fn new(tabs: T, store: K, settings: &Settings, clock: impl Fn() -> StashId + 'static) -> Self {
        Background {
            tabs,
            index: RefCell::new(TabIndex::new()),
            notifier: ChangeNotifier::new(),
            stashes: StashStore::new(store, settings),
            clock: Box::new(clock),
        }
    }

    /// The current index
    pub fn index(&self) -> Ref<'_, TabIndex> {
        self.index.borrow()
    }

    pub fn stashes(&self) -> &StashStore<K> {
        &self.stashes
    }

    /// Requery every tab, replace the index and publish it
    ///
    /// If two rebuilds interleave, the one that finishes last wins.
    pub async fn rebuild(&self) -> Result<()> {
        let tabs = self.tabs.query_tabs().await?;
        let index = TabIndex::from_tabs(tabs);
        log::debug!("Rebuilt index: {} domains, {} tabs", index.len(), index.tab_count());
        self.index.replace(index);
        self.publish();
        Ok(())
    }

    /// Patch a closed tab out of the index and publish it
    pub fn remove_tab(&self, tab_id: TabId) {
        if !self.index.borrow_mut().remove_tab(tab_id) {
            log::debug!("Removed tab {} was not indexed", tab_id);
        }
        self.publish();
    }

    fn publish(&self) {
        self.notifier.publish(&self.index.borrow());
    }

    /// React to one host lifecycle event; failures are logged and dropped
    pub async fn handle_event(&self, event: HostEvent) {
        log::debug!("Host event {}", event.name());
        match route(&event) {
            Reaction::Rebuild => {
                if let Err(err) = self.rebuild().await {
                    log::error!("Rebuild after {} abandoned: {}", event.name(), err);
                }
            }
            Reaction::RemoveTab(tab_id) => self.remove_tab(tab_id),
            Reaction::Shutdown => self.shutdown(),
            Reaction::Ignore => {}
        }
    }

    /// A view opened a port
    pub fn connect(&self, sink: S) -> ConnectionId {
        let id = self.notifier.connect(sink);
        log::info!("View connected ({})", id.0);
        id
    }

    pub async fn handle_port_message(&self, connection: ConnectionId, message: PortMessage) {
        match message {
            PortMessage::RequestInitialData => {
                log::debug!("Initial data requested by connection {}", connection.0);
                if let Err(err) = self.rebuild().await {
                    log::error!("Initial rebuild abandoned: {}", err);
                }
            }
        }
    }

    pub fn disconnect(&self, connection: ConnectionId) {
        if self.notifier.disconnect(connection) {
            log::info!("View disconnected ({})", connection.0);
        }
    }

    /// Drop the view connection; the index stays as it is
    pub fn shutdown(&self) {
        self.notifier.clear();
        log::info!("Background shut down");
    }

    pub async fn handle_command(&self, command: Command) -> CommandReply {
        match self.run_command(command).await {
            Ok(reply) => reply,
            Err(err) => {
                log::error!("Command failed: {}", err);
                CommandReply::failed(err)
            }
        }
    }

    async fn run_command(&self, command: Command) -> Result<CommandReply> {
        match command {
            Command::SaveStash { stash: Some(stash), .. } => {
                self.stashes.insert(stash).await?;
                self.list_stashes().await
            }
            Command::SaveStash { stash: None, window_id } => {
                let window_tabs = self.tabs.window_tabs(window_id).await?;
                self.stashes.save(&window_tabs, (self.clock)()).await?;
                self.list_stashes().await
            }
            Command::LoadStash {
                stash,
                new_window,
                window_id,
            } => {
                let target = self.restore_target(new_window, window_id).await?;
                // Restores what is stored under the id, not the view's copy
                if let Some(opened) = self.stashes.restore(&self.tabs, stash.id, target).await? {
                    log::info!("Restored {} tabs from {}", opened, stash.name);
                }
                Ok(CommandReply::ok())
            }
            Command::DeleteStash { stash_id } => {
                self.stashes.delete(stash_id).await?;
                self.list_stashes().await
            }
            Command::ListStashes => self.list_stashes().await,
            Command::FocusTab { tab_id, window_id } => {
                self.tabs.activate_tab(tab_id).await?;
                self.tabs.focus_window(window_id).await?;
                Ok(CommandReply::ok())
            }
            Command::GroupDomain { domain } => {
                let Some((tab_ids, window_id)) = self.domain_tabs(&domain) else {
                    log::warn!("No tabs open for {}", domain);
                    return Ok(CommandReply::ok());
                };
                self.tabs.move_tabs(&tab_ids, window_id).await?;
                log::info!("Grouped {} tabs for {}", tab_ids.len(), domain);
                self.rebuild().await?;
                Ok(CommandReply::ok())
            }
            Command::OpenDomainInNewWindow { domain } => {
                let Some(urls) = self.index.borrow().get(&domain).map(|group| group.urls()) else {
                    log::warn!("No tabs open for {}", domain);
                    return Ok(CommandReply::ok());
                };
                let tab_ids = self.domain_tabs(&domain).map(|(ids, _)| ids).unwrap_or_default();
                self.tabs.create_window(&urls).await?;
                self.tabs.remove_tabs(&tab_ids).await?;
                Ok(CommandReply::ok())
            }
        }
    }

    async fn list_stashes(&self) -> Result<CommandReply> {
        Ok(CommandReply::with_stashes(self.stashes.load().await?.stashes))
    }

    /// A new window, the view's window, or the host's current one
    async fn restore_target(&self, new_window: bool, window_id: Option<WindowId>) -> Result<RestoreTarget> {
        match (new_window, window_id) {
            (true, _) => Ok(RestoreTarget::NewWindow),
            (false, Some(window_id)) => Ok(RestoreTarget::Window(window_id)),
            (false, None) => Ok(RestoreTarget::Window(self.tabs.current_window().await?)),
        }
    }

    /// Ids of a domain's tabs and the window of its first tab
    fn domain_tabs(&self, domain: &str) -> Option<(Vec<TabId>, WindowId)> {
        let index = self.index.borrow();
        let group = index.get(domain)?;
        let window_id = group.tabs.first()?.window_id;
        Some((group.tab_ids(), window_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tab_data::{Stash, StashedTab, Tab};
    use crate::testing::{FakeStore, FakeTabs, HostCall, RecordingSink};
    use futures::executor::block_on;
    use std::cell::Cell;
    use std::rc::Rc;

    const NOW: StashId = 1_700_000_000_000;

    type TestBackground = Background<FakeTabs, FakeStore, RecordingSink>;

    fn scenario_tabs() -> Vec<Tab> {
        vec![
            Tab::new(1, 1, "https://www.a.com/x", "A x"),
            Tab::new(2, 1, "https://a.com/y", "A y"),
            Tab::new(3, 2, "https://b.com", "B"),
        ]
    }

    fn background(tabs: Vec<Tab>) -> (TestBackground, FakeTabs, FakeStore) {
        let host = FakeTabs::new(tabs);
        let store = FakeStore::default();
        let ticks = Rc::new(Cell::new(NOW));
        let clock = move || {
            let now = ticks.get();
            ticks.set(now + 1);
            now
        };
        let background = Background::new(host.clone(), store.clone(), &Settings::default(), clock);
        (background, host, store)
    }

    fn group_ids(index: &TabIndex, key: &str) -> Vec<TabId> {
        index.get(key).map(|group| group.tab_ids()).unwrap_or_default()
    }

    #[test]
    fn test_initial_data_request_rebuilds_and_publishes() {
        let (background, _, _) = background(scenario_tabs());
        let sink = RecordingSink::default();
        let id = background.connect(sink.clone());

        block_on(background.handle_port_message(id, PortMessage::RequestInitialData));

        let published = sink.last().unwrap();
        assert_eq!(group_ids(&published, "a.com"), vec![1, 2]);
        assert_eq!(group_ids(&published, "b.com"), vec![3]);
        assert_eq!(*background.index(), published);
    }

    #[test]
    fn test_removal_scenario() {
        let (background, _, _) = background(scenario_tabs());
        let sink = RecordingSink::default();
        background.connect(sink.clone());
        block_on(background.handle_event(HostEvent::Startup));

        block_on(background.handle_event(HostEvent::TabRemoved { tab_id: 2 }));
        let after_first = sink.last().unwrap();
        assert_eq!(group_ids(&after_first, "a.com"), vec![1]);
        assert_eq!(group_ids(&after_first, "b.com"), vec![3]);

        block_on(background.handle_event(HostEvent::TabRemoved { tab_id: 1 }));
        let after_second = sink.last().unwrap();
        assert_eq!(after_second.keys().collect::<Vec<_>>(), vec!["b.com"]);
        assert_eq!(sink.snapshots().len(), 3);
    }

    #[test]
    fn test_rebuild_without_view_still_updates_index() {
        let (background, host, _) = background(scenario_tabs());

        block_on(background.handle_event(HostEvent::TabCreated));
        assert_eq!(background.index().tab_count(), 3);

        host.set_tabs(vec![Tab::new(9, 1, "https://c.com", "C")]);
        block_on(background.handle_event(HostEvent::TabActivated));
        assert_eq!(background.index().keys().collect::<Vec<_>>(), vec!["c.com"]);
    }

    #[test]
    fn test_update_without_url_change_is_ignored() {
        let (background, host, _) = background(scenario_tabs());
        let sink = RecordingSink::default();
        background.connect(sink.clone());
        block_on(background.rebuild()).unwrap();

        host.set_tabs(Vec::new());
        block_on(background.handle_event(HostEvent::TabUpdated { url_changed: false }));
        assert_eq!(background.index().tab_count(), 3);
        assert_eq!(sink.snapshots().len(), 1);

        block_on(background.handle_event(HostEvent::TabUpdated { url_changed: true }));
        assert!(background.index().is_empty());
        assert_eq!(sink.snapshots().len(), 2);
    }

    #[test]
    fn test_failed_query_keeps_previous_index() {
        let (background, host, _) = background(scenario_tabs());
        block_on(background.rebuild()).unwrap();
        let before = background.index().clone();

        host.fail_queries();
        block_on(background.handle_event(HostEvent::WindowFocusChanged));

        assert_eq!(*background.index(), before);
    }

    #[test]
    fn test_disconnect_then_reconnect() {
        let (background, _, _) = background(scenario_tabs());
        let first = RecordingSink::default();
        let id = background.connect(first.clone());
        background.disconnect(id);

        block_on(background.handle_event(HostEvent::TabMoved));
        assert!(first.snapshots().is_empty());

        let second = RecordingSink::default();
        let id = background.connect(second.clone());
        block_on(background.handle_port_message(id, PortMessage::RequestInitialData));
        assert_eq!(second.snapshots().len(), 1);
    }

    #[test]
    fn test_suspend_drops_view() {
        let (background, _, _) = background(scenario_tabs());
        let sink = RecordingSink::default();
        background.connect(sink.clone());

        block_on(background.handle_event(HostEvent::Suspend));
        block_on(background.handle_event(HostEvent::TabCreated));

        assert!(sink.snapshots().is_empty());
        assert_eq!(background.index().tab_count(), 3);
    }

    #[test]
    fn test_save_stash_from_current_window() {
        let (background, host, _) = background(scenario_tabs());
        host.set_current_window(1);

        let reply = block_on(background.handle_command(Command::SaveStash {
            stash: None,
            window_id: None,
        }));

        let stashes = reply.stashes.unwrap();
        assert!(reply.ok);
        assert_eq!(stashes.len(), 1);
        assert_eq!(stashes[0].id, NOW);
        assert_eq!(stashes[0].name, "Stash 1");
        assert_eq!(
            stashes[0].tabs,
            vec![
                StashedTab {
                    url: "https://www.a.com/x".to_string(),
                    title: "A x".to_string()
                },
                StashedTab {
                    url: "https://a.com/y".to_string(),
                    title: "A y".to_string()
                },
            ]
        );

        let reply = block_on(background.handle_command(Command::DeleteStash { stash_id: NOW }));
        assert_eq!(reply.stashes, Some(Vec::new()));
    }

    #[test]
    fn test_save_prebuilt_stash() {
        let (background, _, store) = background(Vec::new());
        let stash = Stash::capture(42, "Reading".to_string(), &scenario_tabs());

        let reply = block_on(background.handle_command(Command::SaveStash {
            stash: Some(stash.clone()),
            window_id: None,
        }));

        assert_eq!(reply.stashes, Some(vec![stash]));
        assert!(store.raw("stashes").is_some());
    }

    #[test]
    fn test_load_stash_targets() {
        let (background, host, _) = background(scenario_tabs());
        host.set_current_window(2);
        block_on(background.handle_command(Command::SaveStash {
            stash: None,
            window_id: Some(2),
        }));
        let stash = block_on(background.stashes().load()).unwrap().stashes[0].clone();

        block_on(background.handle_command(Command::LoadStash {
            stash: stash.clone(),
            new_window: false,
            window_id: None,
        }));
        block_on(background.handle_command(Command::LoadStash {
            stash: stash.clone(),
            new_window: false,
            window_id: Some(5),
        }));
        block_on(background.handle_command(Command::LoadStash {
            stash,
            new_window: true,
            window_id: Some(5),
        }));

        assert_eq!(
            host.calls(),
            vec![
                HostCall::CreateTab {
                    url: "https://b.com".to_string(),
                    window_id: 2
                },
                HostCall::CreateTab {
                    url: "https://b.com".to_string(),
                    window_id: 5
                },
                HostCall::CreateWindow {
                    urls: vec!["https://b.com".to_string()]
                },
            ]
        );
    }

    #[test]
    fn test_load_deleted_stash_is_noop() {
        let (background, host, _) = background(scenario_tabs());
        let stash = Stash::capture(99, "Gone".to_string(), &scenario_tabs());

        let reply = block_on(background.handle_command(Command::LoadStash {
            stash,
            new_window: true,
            window_id: None,
        }));

        assert!(reply.ok);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_delete_unknown_stash_replies_ok() {
        let (background, _, _) = background(Vec::new());
        let reply = block_on(background.handle_command(Command::DeleteStash { stash_id: 7 }));
        assert!(reply.ok);
        assert_eq!(reply.stashes, Some(Vec::new()));
    }

    #[test]
    fn test_focus_tab() {
        let (background, host, _) = background(scenario_tabs());

        let reply = block_on(background.handle_command(Command::FocusTab { tab_id: 3, window_id: 2 }));

        assert!(reply.ok);
        assert_eq!(
            host.calls(),
            vec![HostCall::ActivateTab { tab_id: 3 }, HostCall::FocusWindow { window_id: 2 }]
        );
    }

    #[test]
    fn test_group_domain_moves_to_first_window() {
        let mut tabs = scenario_tabs();
        tabs.push(Tab::new(4, 2, "https://a.com/z", "A z"));
        let (background, host, _) = background(tabs);
        let sink = RecordingSink::default();
        background.connect(sink.clone());
        block_on(background.rebuild()).unwrap();

        block_on(background.handle_command(Command::GroupDomain {
            domain: "a.com".to_string(),
        }));

        assert_eq!(
            host.calls(),
            vec![HostCall::MoveTabs {
                tab_ids: vec![1, 2, 4],
                window_id: 1
            }]
        );
        assert_eq!(sink.snapshots().len(), 2);
    }

    #[test]
    fn test_open_domain_in_new_window() {
        let (background, host, _) = background(scenario_tabs());
        block_on(background.rebuild()).unwrap();

        block_on(background.handle_command(Command::OpenDomainInNewWindow {
            domain: "a.com".to_string(),
        }));

        assert_eq!(
            host.calls(),
            vec![
                HostCall::CreateWindow {
                    urls: vec!["https://www.a.com/x".to_string(), "https://a.com/y".to_string()]
                },
                HostCall::RemoveTabs { tab_ids: vec![1, 2] },
            ]
        );
    }

    #[test]
    fn test_unknown_domain_commands_are_noops() {
        let (background, host, _) = background(scenario_tabs());
        block_on(background.rebuild()).unwrap();

        let group = block_on(background.handle_command(Command::GroupDomain {
            domain: "c.com".to_string(),
        }));
        let open = block_on(background.handle_command(Command::OpenDomainInNewWindow {
            domain: "c.com".to_string(),
        }));

        assert!(group.ok && open.ok);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_host_failure_is_reported() {
        let (background, host, _) = background(scenario_tabs());
        block_on(background.rebuild()).unwrap();
        host.fail_queries();

        let reply = block_on(background.handle_command(Command::GroupDomain {
            domain: "b.com".to_string(),
        }));

        assert!(!reply.ok);
        assert_eq!(reply.error.as_deref(), Some("tabs.query failed: query rejected"));
    }
}
