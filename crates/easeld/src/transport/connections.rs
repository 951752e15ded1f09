//! Live connection tracking.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::LISTENER_TARGET;

/// Identifier assigned to each accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "conn-{}", self.0)
    }
}

/// The outbound half of an accepted client socket.
///
/// Writes are serialised by a mutex so a response and a broadcast never
/// interleave within one frame.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    peer: SocketAddr,
    writer: Mutex<TcpStream>,
}

impl Connection {
    /// Connection identifier.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Remote address of the client.
    #[must_use]
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Writes one fully encoded frame.
    ///
    /// # Errors
    ///
    /// Returns the socket error when the write or flush fails.
    pub fn send(&self, frame: &[u8]) -> io::Result<()> {
        let mut writer = self.writer();
        writer.write_all(frame)?;
        writer.flush()
    }

    /// Shuts the socket down in both directions, unblocking its reader.
    pub fn close(&self) {
        if let Err(error) = self.writer().shutdown(Shutdown::Both)
            && error.kind() != io::ErrorKind::NotConnected
        {
            debug!(
                target: LISTENER_TARGET,
                connection = %self.id,
                error = %error,
                "failed to shut down connection"
            );
        }
    }

    fn writer(&self) -> MutexGuard<'_, TcpStream> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Shared set of live connections.
///
/// Cloning yields another handle to the same set.
#[derive(Debug, Clone, Default)]
pub struct ConnectionSet {
    inner: Arc<ConnectionSetInner>,
}

#[derive(Debug, Default)]
struct ConnectionSetInner {
    next_id: AtomicU64,
    live: Mutex<HashMap<ConnectionId, Arc<Connection>>>,
}

impl ConnectionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a freshly accepted stream.
    ///
    /// Returns the registered connection and a cloned handle for reading.
    pub(crate) fn register(
        &self,
        stream: TcpStream,
        peer: SocketAddr,
    ) -> io::Result<(Arc<Connection>, TcpStream)> {
        let reader = stream.try_clone()?;
        let id = ConnectionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let connection = Arc::new(Connection {
            id,
            peer,
            writer: Mutex::new(stream),
        });
        self.live().insert(id, Arc::clone(&connection));
        debug!(
            target: LISTENER_TARGET,
            connection = %id,
            peer = %peer,
            "connection registered"
        );
        Ok((connection, reader))
    }

    /// Stops tracking `id`, returning the connection if it was live.
    pub(crate) fn remove(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        let removed = self.live().remove(&id);
        if removed.is_some() {
            debug!(target: LISTENER_TARGET, connection = %id, "connection removed");
        }
        removed
    }

    /// Number of live connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live().len()
    }

    /// Returns `true` when no connection is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live().is_empty()
    }

    /// Closes and forgets every live connection.
    pub fn close_all(&self) {
        let drained: Vec<_> = self.live().drain().map(|(_, connection)| connection).collect();
        for connection in drained {
            connection.close();
        }
    }

    pub(super) fn live(&self) -> MutexGuard<'_, HashMap<ConnectionId, Arc<Connection>>> {
        self.inner
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
