//! Per-connection handling contract.

use std::net::TcpStream;

use super::Connection;

/// Serves one accepted client until it disconnects.
///
/// `reader` is the inbound half of the socket. Outbound frames go through
/// [`Connection::send`] so they interleave safely with broadcasts. The
/// listener removes the connection from the live set once this returns.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Runs the read loop for a single client.
    fn handle(&self, reader: TcpStream, connection: &Connection);
}
