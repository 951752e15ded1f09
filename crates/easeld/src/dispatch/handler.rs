//! Message handler contract.

use std::net::SocketAddr;

use easel_protocol::{MessageType, ResultCode};
use thiserror::Error;

use crate::identity::Session;

/// Serves one message type on behalf of a component.
pub trait MessageHandler: Send + Sync {
    /// The message type routed to this handler.
    fn message_type(&self) -> MessageType;

    /// Whether requests must carry a live session.
    fn requires_session(&self) -> bool {
        false
    }

    /// Answers one request.
    ///
    /// # Errors
    ///
    /// An error closes the caller's connection. Report ordinary failures as
    /// a [`HandlerReply`] with a non-success result code instead.
    fn handle(
        &self,
        context: &RequestContext<'_>,
        payload: &[u8],
    ) -> Result<HandlerReply, HandlerError>;
}

/// Per-request information passed to a handler.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    /// Resolved session; always present and unexpired for session-gated
    /// handlers.
    pub session: Option<&'a Session>,
    /// Remote address of the caller.
    pub caller: SocketAddr,
    /// Message type being served.
    pub message_type: MessageType,
}

/// A handler's answer, wrapped into a response frame by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerReply {
    /// Outcome of the request.
    pub result_code: ResultCode,
    /// Response body.
    pub payload: Vec<u8>,
}

impl HandlerReply {
    /// A successful reply carrying `payload`.
    #[must_use]
    pub fn success(payload: Vec<u8>) -> Self {
        Self {
            result_code: ResultCode::SUCCESS,
            payload,
        }
    }

    /// A reply with `result_code` and no body.
    #[must_use]
    pub fn failure(result_code: ResultCode) -> Self {
        Self {
            result_code,
            payload: Vec::new(),
        }
    }
}

/// Fatal handler failure.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl HandlerError {
    /// Builds an error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error that wraps an underlying cause.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Human-readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
