//! Error types for request dispatch.

use easel_protocol::{FrameError, MessageType};
use thiserror::Error;

use super::HandlerError;

/// Errors surfaced while building the dispatch table or serving a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Two handlers claimed the same message type.
    #[error("message type {message_type} already has a handler")]
    DuplicateHandler { message_type: MessageType },

    /// A handler failed; the connection is closed.
    #[error("handler for message type {message_type} failed: {source}")]
    Handler {
        message_type: MessageType,
        #[source]
        source: HandlerError,
    },

    /// A frame could not be read or encoded.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}
