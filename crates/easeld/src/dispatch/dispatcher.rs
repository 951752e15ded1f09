//! Routing of request frames to message handlers.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::SystemTime;

use easel_protocol::{MessageType, RequestFrame, ResponseFrame, ResultCode};
use tracing::{debug, warn};

use super::{DISPATCH_TARGET, DispatchError, MessageHandler, RequestContext};
use crate::components::ComponentRegistry;
use crate::identity::Session;

/// Routes requests to the handler registered for their message type.
#[derive(Default)]
pub struct MessageDispatcher {
    handlers: HashMap<MessageType, Arc<dyn MessageHandler>>,
}

impl MessageDispatcher {
    /// Creates a dispatcher with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the handlers every registered component serves.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateHandler`] when two handlers claim
    /// the same message type.
    pub fn from_registry(registry: &ComponentRegistry) -> Result<Self, DispatchError> {
        let mut dispatcher = Self::new();
        for record in registry.records() {
            for handler in Arc::clone(record.component()).handlers() {
                debug!(
                    target: DISPATCH_TARGET,
                    component = %record.id(),
                    message_type = %handler.message_type(),
                    "handler registered"
                );
                dispatcher.register(handler)?;
            }
        }
        Ok(dispatcher)
    }

    /// Adds a handler.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateHandler`] when the message type is
    /// already handled.
    pub fn register(&mut self, handler: Arc<dyn MessageHandler>) -> Result<(), DispatchError> {
        let message_type = handler.message_type();
        match self.handlers.entry(message_type) {
            Entry::Occupied(_) => Err(DispatchError::DuplicateHandler { message_type }),
            Entry::Vacant(slot) => {
                slot.insert(handler);
                Ok(())
            }
        }
    }

    /// Returns `true` when `message_type` has a handler.
    #[must_use]
    pub fn handles(&self, message_type: MessageType) -> bool {
        self.handlers.contains_key(&message_type)
    }

    /// Serves one request.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Handler`] when the handler fails; the caller
    /// should close the connection.
    pub fn handle(
        &self,
        request: &RequestFrame,
        session: Option<&Session>,
        caller: SocketAddr,
    ) -> Result<ResponseFrame, DispatchError> {
        let message_type = request.message_type;
        let Some(handler) = self.handlers.get(&message_type) else {
            warn!(
                target: DISPATCH_TARGET,
                message_type = %message_type,
                caller = %caller,
                "no handler for message type"
            );
            return Ok(ResponseFrame::reply_to(
                request,
                ResultCode::GENERIC_ERROR,
                Vec::new(),
            ));
        };

        if handler.requires_session()
            && session.is_none_or(|session| session.is_expired_at(SystemTime::now()))
        {
            debug!(
                target: DISPATCH_TARGET,
                message_type = %message_type,
                caller = %caller,
                "request rejected without a live session"
            );
            return Ok(ResponseFrame::reply_to(
                request,
                ResultCode::LOGIN_REQUIRED,
                Vec::new(),
            ));
        }

        let context = RequestContext {
            session,
            caller,
            message_type,
        };
        let reply = handler
            .handle(&context, &request.payload)
            .map_err(|source| DispatchError::Handler {
                message_type,
                source,
            })?;
        debug!(
            target: DISPATCH_TARGET,
            message_type = %message_type,
            result = %reply.result_code,
            "request served"
        );
        Ok(ResponseFrame::reply_to(
            request,
            reply.result_code,
            reply.payload,
        ))
    }
}

#[cfg(test)]
mod tests;
