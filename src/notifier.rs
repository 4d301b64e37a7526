/// Single-subscriber channel from the background to the sidebar
use std::borrow::Cow;
use std::cell::{Cell, RefCell};

use crate::host::ViewSink;
use crate::messages::CoreMessage;
use crate::tab_index::TabIndex;

/// Identifies one port connection so a late disconnect from an older
/// view cannot clear a newer one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u32);

/// Holds at most one connected view
///
/// Publishing with no view connected is a no-op; nothing is queued. A view
/// that reconnects recovers by sending `requestInitialData`.
pub struct ChangeNotifier<S> {
    sink: RefCell<Option<(ConnectionId, S)>>,
    next_id: Cell<u32>,
}

impl<S: ViewSink> ChangeNotifier<S> {
    pub fn new() -> Self {
        ChangeNotifier {
            sink: RefCell::new(None),
            next_id: Cell::new(1),
        }
    }

    /// Make `sink` the current view, replacing any earlier one
    pub fn connect(&self, sink: S) -> ConnectionId {
        let id = ConnectionId(self.next_id.get());
        self.next_id.set(id.0.wrapping_add(1));
        if self.sink.replace(Some((id, sink))).is_some() {
            log::debug!("View connection {} replaces the previous one", id.0);
        }
        id
    }

    /// Forget the view if `id` is still the current connection
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let mut sink = self.sink.borrow_mut();
        match sink.as_ref() {
            Some((current, _)) if *current == id => {
                *sink = None;
                true
            }
            _ => false,
        }
    }

    /// Send the full index to the connected view
    ///
    /// Returns whether a view received it. A post failure means the port
    /// is gone, so the sink is dropped.
    pub fn publish(&self, index: &TabIndex) -> bool {
        let mut sink = self.sink.borrow_mut();
        let Some((id, view)) = sink.as_ref() else {
            log::debug!("No view connected, dropping update");
            return false;
        };
        let id = *id;

        let message = CoreMessage::UpdateSidebar {
            data: Cow::Borrowed(index),
        };
        let delivered = view.post(&message);
        match delivered {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Dropping view connection {}: {}", id.0, err);
                *sink = None;
                false
            }
        }
    }

    pub fn clear(&self) {
        self.sink.replace(None);
    }
}

impl<S: ViewSink> Default for ChangeNotifier<S> {
    fn default() -> Self {
        Self::new()
    }
}
