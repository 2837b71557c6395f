use crate::domain::commands::OutboundCommand;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Closed,
    Errored,
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

#[derive(Debug)]
pub enum Event {
    ConnectionChanged(ConnectionState),
    FrameReceived(String),
    CommandSent { id: u64, command: OutboundCommand },
    /// A command published as sent whose frame never reached the socket.
    CommandDropped { id: u64 },
}
