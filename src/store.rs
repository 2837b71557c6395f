use crate::domain::events::{ConnectionState, Event};
use crate::domain::{ErrorPolicy, UtilityValue};
use crate::message_reducer::{reduce_command_dropped, reduce_command_sent, reduce_frame};
use crate::pending_updates::PendingUpdates;
use std::collections::BTreeMap;
use tokio::sync::mpsc::Receiver;
use tokio::sync::watch;
use tokio::sync::watch::{Receiver as WatchReceiver, Sender as WatchSender};
use tracing::{debug, info, instrument, warn};

pub type UtilityState = BTreeMap<String, UtilityValue>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StoreSnapshot {
    utilities: UtilityState,
    connection: ConnectionState,
}

impl StoreSnapshot {
    pub fn new(utilities: UtilityState, connection: ConnectionState) -> Self {
        StoreSnapshot { utilities, connection }
    }

    #[cfg(test)]
    pub fn utilities(&self) -> &UtilityState {
        &self.utilities
    }

    pub fn value(&self, utility: &str) -> Option<&UtilityValue> {
        self.utilities.get(utility)
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }
}

/// Owns the utility state. Every mutation arrives as an [`Event`], every change is published as a snapshot.
#[derive(Debug)]
pub struct Store {
    utilities: UtilityState,
    connection: ConnectionState,
    pending: PendingUpdates,
    error_policy: ErrorPolicy,
    rx: Receiver<Event>,
    notifier_tx: WatchSender<StoreSnapshot>,
    notifier_rx: WatchReceiver<StoreSnapshot>,
}

impl Store {
    pub fn new(rx: Receiver<Event>, error_policy: ErrorPolicy) -> Self {
        let (notifier_tx, notifier_rx) = watch::channel(StoreSnapshot::default());

        Store {
            utilities: UtilityState::new(),
            connection: ConnectionState::default(),
            pending: PendingUpdates::default(),
            error_policy,
            rx,
            notifier_tx,
            notifier_rx,
        }
    }

    pub fn notifier(&self) -> WatchReceiver<StoreSnapshot> {
        self.notifier_rx.clone()
    }

    #[instrument(skip(self))]
    pub async fn listen(&mut self) {
        while let Some(event) = self.rx.recv().await {
            debug!("🔵 Received event: {:?}", event);
            if self.apply(event) {
                self.notifier_tx.send_replace(self.snapshot());
            }
        }
        info!("🔵 Event channel closed, store stopped");
    }

    fn apply(&mut self, event: Event) -> bool {
        match event {
            Event::ConnectionChanged(state) => {
                if state == self.connection {
                    return false;
                }

                if state.is_open() && !self.pending.is_empty() {
                    debug!("🔵 Dropping {} pending update(s), the full read reconciles them", self.pending.len());
                    self.pending.clear();
                }

                match state {
                    ConnectionState::Closed | ConnectionState::Errored => {
                        warn!(was = ?self.connection, "🔴 Device connection {:?}, showing last known state", state)
                    }
                    _ => info!(was = ?self.connection, "🔵 Device connection {:?}", state),
                }
                self.connection = state;
                true
            }
            Event::FrameReceived(text) => {
                let changed = reduce_frame(&mut self.utilities, &mut self.pending, self.error_policy, &text);
                !changed.is_empty()
            }
            Event::CommandSent { id, command } => {
                let changed = reduce_command_sent(&mut self.utilities, &mut self.pending, id, &command);
                !changed.is_empty()
            }
            Event::CommandDropped { id } => {
                let changed = reduce_command_dropped(&mut self.utilities, &mut self.pending, id);
                !changed.is_empty()
            }
        }
    }

    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot::new(self.utilities.clone(), self.connection)
    }
}
