//! TCP transport for the backend.
//!
//! The listener accepts clients on a background thread and hands each one to
//! a [`ConnectionHandler`] on its own thread. Every accepted client is tracked
//! in the shared [`ConnectionSet`] so broadcasts reach it until its handler
//! returns.

mod broadcast;
mod connections;
mod errors;
mod handler;
mod listener;
#[cfg(test)]
mod test_utils;

pub use self::broadcast::BroadcastReport;
pub use self::connections::{Connection, ConnectionId, ConnectionSet};
pub use self::errors::ListenerError;
pub(crate) use self::handler::ConnectionHandler;
pub(crate) use self::listener::{ListenerHandle, SocketListener};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
