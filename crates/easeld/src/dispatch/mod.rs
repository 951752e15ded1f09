//! Request dispatch.
//!
//! Each connection thread reads [`easel_protocol::RequestFrame`]s, resolves
//! the caller's session, and hands the frame to the [`MessageDispatcher`],
//! which routes it by message type to the [`MessageHandler`] a component
//! registered. Handlers never see requests that fail session gating.
//!
//! ## Outcomes
//!
//! - a handler reply is wrapped in a response echoing the correlation id and
//!   session token;
//! - a session-gated type without a live session answers `LoginRequired`;
//! - an unknown type answers `GenericError` with an empty payload;
//! - a handler error closes the connection.

mod connection;
mod dispatcher;
mod errors;
mod handler;

pub(crate) use self::connection::DispatchConnectionHandler;
pub use self::dispatcher::MessageDispatcher;
pub use self::errors::DispatchError;
pub use self::handler::{HandlerError, HandlerReply, MessageHandler, RequestContext};

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
