use crate::domain::commands::{CommandEnvelope, OutboundCommand};
use crate::domain::events::Event;
use crate::domain::utility::ALL_UTILITIES;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::Sender;
use tokio::sync::watch::Receiver;
use tracing::{debug, error, instrument, warn};

/// What the connection task writes to the socket.
#[derive(Debug, PartialEq)]
pub enum Outgoing {
    Frame(String),
    Close,
}

/// The outgoing channel of the currently open socket, `None` while the socket is not open.
pub type Link = Option<Sender<Outgoing>>;

/// Turns commands into frames on the open socket. Cheap to clone, every task gets its own handle.
#[derive(Clone, Debug)]
pub struct CommandDispatcher {
    link: Receiver<Link>,
    events_tx: Sender<Event>,
    request_ids: bool,
    next_id: Arc<AtomicU64>,
}

impl CommandDispatcher {
    pub fn new(link: Receiver<Link>, events_tx: Sender<Event>, request_ids: bool) -> Self {
        CommandDispatcher {
            link,
            events_tx,
            request_ids,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn is_open(&self) -> bool {
        self.link.borrow().is_some()
    }

    /// Sends `command` if the socket is open and drops it otherwise. Returns whether the frame was handed to the socket.
    #[instrument(skip_all, fields(action = %command.action()))]
    pub async fn send_command(&self, command: OutboundCommand) -> bool {
        let link = self.link.borrow().clone();
        let Some(tx) = link else {
            debug!("📪 Socket is not open, dropping command {:?}", command);
            return false;
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let text = match CommandEnvelope::new(&command, self.request_ids.then_some(id)).to_text() {
            Ok(text) => text,
            Err(e) => {
                error!("❌ Could not serialize command {:?}: {}", command, e);
                return false;
            }
        };

        // The store applies the optimistic update before the device can possibly answer
        if self.events_tx.send(Event::CommandSent { id, command }).await.is_err() {
            warn!("⚠️ Store is not listening, no optimistic update applied");
        }

        if tx.send(Outgoing::Frame(text.clone())).await.is_err() {
            warn!(frame = text, "⚠️ Socket closed before the command could be sent");
            if self.events_tx.send(Event::CommandDropped { id }).await.is_err() {
                warn!("⚠️ Store is not listening, optimistic update not undone");
            }
            return false;
        }

        debug!(frame = text, request_id = id, "📤 Command sent");
        true
    }

    pub async fn toggle(&self, utility: &str) -> bool {
        self.send_command(OutboundCommand::toggle(utility)).await
    }

    pub async fn set_value(&self, utility: &str, value: u8) -> bool {
        self.send_command(OutboundCommand::write(utility, value)).await
    }

    pub async fn read_utilities<S: AsRef<str>>(&self, utilities: &[S]) -> bool {
        self.send_command(OutboundCommand::read(utilities)).await
    }

    pub async fn read_all(&self) -> bool {
        self.read_utilities(&ALL_UTILITIES).await
    }

    /// Asks the connection task to close the socket without reconnecting.
    pub async fn close(&self) -> bool {
        let link = self.link.borrow().clone();
        match link {
            Some(tx) => tx.send(Outgoing::Close).await.is_ok(),
            None => false,
        }
    }
}
