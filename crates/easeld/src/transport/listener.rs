//! TCP listener with a background accept loop.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use super::{ConnectionHandler, ConnectionSet, LISTENER_TARGET, ListenerError};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Listener bound to a TCP address but not yet accepting.
#[derive(Debug)]
pub(crate) struct SocketListener {
    addr: SocketAddr,
    listener: TcpListener,
}

impl SocketListener {
    /// Binds `host:port`. Port `0` selects an ephemeral port.
    pub(crate) fn bind(host: &str, port: u16) -> Result<Self, ListenerError> {
        let listener = bind_tcp(host, port)?;
        let addr = listener
            .local_addr()
            .map_err(|source| ListenerError::LocalAddr { source })?;
        Ok(Self { addr, listener })
    }

    /// Address the socket is bound to.
    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Spawns the accept loop.
    ///
    /// Accepted streams are registered in `connections` and served by
    /// `handler` on a dedicated thread each.
    pub(crate) fn start(
        self,
        connections: ConnectionSet,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        self.listener
            .set_nonblocking(true)
            .map_err(|source| ListenerError::NonBlocking { source })?;
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name("easel-accept".to_owned())
            .spawn(move || run_accept_loop(&self, &shutdown_flag, &connections, &handler))
            .map_err(|source| ListenerError::Spawn { source })?;
        Ok(ListenerHandle {
            shutdown,
            handle: Some(handle),
        })
    }
}

/// Handle to the background accept thread.
#[derive(Debug)]
pub(crate) struct ListenerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    /// Asks the accept loop to stop after its current iteration.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Waits for the accept thread to exit. The listening socket is closed
    /// once this returns.
    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(()) => Ok(()),
                Err(_) => Err(ListenerError::ThreadPanic),
            }
        } else {
            Ok(())
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn run_accept_loop(
    listener: &SocketListener,
    shutdown: &AtomicBool,
    connections: &ConnectionSet,
    handler: &Arc<dyn ConnectionHandler>,
) {
    info!(
        target: LISTENER_TARGET,
        addr = %listener.addr,
        "socket listener active"
    );
    let mut last_error = None::<io::ErrorKind>;
    while !shutdown.load(Ordering::SeqCst) {
        match accept_connection(listener) {
            Ok(Some((stream, peer))) => {
                last_error = None;
                serve(stream, peer, connections, handler);
            }
            Ok(None) => {
                thread::sleep(ACCEPT_BACKOFF);
            }
            Err(error) => {
                let kind = error.kind();
                if last_error != Some(kind) {
                    warn!(
                        target: LISTENER_TARGET,
                        error = %error,
                        "socket accept error"
                    );
                }
                last_error = Some(kind);
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }
    info!(
        target: LISTENER_TARGET,
        addr = %listener.addr,
        "socket listener stopped"
    );
}

fn serve(
    stream: TcpStream,
    peer: SocketAddr,
    connections: &ConnectionSet,
    handler: &Arc<dyn ConnectionHandler>,
) {
    let (connection, reader) = match connections.register(stream, peer) {
        Ok(registered) => registered,
        Err(error) => {
            warn!(
                target: LISTENER_TARGET,
                peer = %peer,
                error = %error,
                "failed to register connection"
            );
            return;
        }
    };
    let handler = Arc::clone(handler);
    let spawned = thread::Builder::new()
        .name(format!("easel-{}", connection.id()))
        .spawn({
            let connections = connections.clone();
            let connection = Arc::clone(&connection);
            move || {
                let served =
                    panic::catch_unwind(AssertUnwindSafe(|| handler.handle(reader, &connection)));
                if served.is_err() {
                    warn!(
                        target: LISTENER_TARGET,
                        connection = %connection.id(),
                        "connection handler panicked; closing connection"
                    );
                }
                connections.remove(connection.id());
                connection.close();
            }
        });
    if let Err(error) = spawned {
        warn!(
            target: LISTENER_TARGET,
            connection = %connection.id(),
            error = %error,
            "failed to spawn connection thread"
        );
        connections.remove(connection.id());
        connection.close();
    }
}

fn accept_connection(
    listener: &SocketListener,
) -> Result<Option<(TcpStream, SocketAddr)>, io::Error> {
    match listener.listener.accept() {
        Ok((stream, peer)) => {
            stream.set_nonblocking(false)?;
            Ok(Some((stream, peer)))
        }
        Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
        Err(error) => Err(error),
    }
}

fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_string(),
            port,
            source,
        })?;
    let addr = addrs
        .find(|addr| matches!(addr, SocketAddr::V4(_) | SocketAddr::V6(_)))
        .ok_or_else(|| ListenerError::ResolveEmpty {
            host: host.to_string(),
            port,
        })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })
}
