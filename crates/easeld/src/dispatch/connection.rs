//! Per-connection request loop.

use std::io::BufReader;
use std::net::TcpStream;
use std::sync::Arc;

use easel_protocol::{FrameError, RequestFrame};
use tracing::{debug, warn};

use super::{DISPATCH_TARGET, DispatchError, MessageDispatcher};
use crate::identity::{IdentityProvider, Session};
use crate::transport::{Connection, ConnectionHandler};

/// Serves request frames on one connection until it closes.
pub(crate) struct DispatchConnectionHandler {
    dispatcher: Arc<MessageDispatcher>,
    identity: Arc<dyn IdentityProvider>,
}

impl DispatchConnectionHandler {
    pub(crate) fn new(
        dispatcher: Arc<MessageDispatcher>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            dispatcher,
            identity,
        }
    }

    fn resolve_session(&self, connection: &Connection, token: &str) -> Option<Session> {
        if token.is_empty() {
            return None;
        }
        match self.identity.resolve(token) {
            Ok(session) => session,
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    connection = %connection.id(),
                    error = %error,
                    "session lookup failed; treating request as anonymous"
                );
                None
            }
        }
    }

    /// Serves one request and writes the response.
    fn serve_one(
        &self,
        request: &RequestFrame,
        connection: &Connection,
    ) -> Result<(), DispatchError> {
        let session = self.resolve_session(connection, &request.session_token);
        let response = self
            .dispatcher
            .handle(request, session.as_ref(), connection.peer())?;
        let bytes = response.encode()?;
        connection.send(&bytes).map_err(FrameError::Io)?;
        Ok(())
    }
}

impl ConnectionHandler for DispatchConnectionHandler {
    fn handle(&self, reader: TcpStream, connection: &Connection) {
        let mut reader = BufReader::new(reader);
        loop {
            let request = match RequestFrame::read_from(&mut reader) {
                Ok(Some(request)) => request,
                Ok(None) => {
                    debug!(
                        target: DISPATCH_TARGET,
                        connection = %connection.id(),
                        "client closed connection"
                    );
                    return;
                }
                Err(error) if error.is_disconnect() => {
                    debug!(
                        target: DISPATCH_TARGET,
                        connection = %connection.id(),
                        error = %error,
                        "client disconnected mid-frame"
                    );
                    return;
                }
                Err(error) => {
                    warn!(
                        target: DISPATCH_TARGET,
                        connection = %connection.id(),
                        error = %error,
                        "malformed request frame; closing connection"
                    );
                    return;
                }
            };
            if let Err(error) = self.serve_one(&request, connection) {
                warn!(
                    target: DISPATCH_TARGET,
                    connection = %connection.id(),
                    error = %error,
                    "request failed; closing connection"
                );
                return;
            }
        }
    }
}
