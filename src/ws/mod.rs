mod connection;
mod dispatcher;

pub use connection::{Config, connect};
pub use dispatcher::CommandDispatcher;

#[cfg(test)]
pub(crate) use dispatcher::Outgoing;
#[cfg(test)]
pub(crate) use dispatcher::tests::open_dispatcher;
