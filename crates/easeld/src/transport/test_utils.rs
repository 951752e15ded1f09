//! Test helpers for the transport module.

use std::io::Read;
use std::net::{TcpListener, TcpStream};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::thread;
use std::time::{Duration, Instant};

use super::{Connection, ConnectionHandler, ConnectionSet};

/// Counts handled connections and returns immediately.
pub(crate) struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    pub(crate) fn new() -> (Arc<AtomicUsize>, Arc<Self>) {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Self {
            count: Arc::clone(&count),
        });
        (count, handler)
    }
}

impl ConnectionHandler for CountingHandler {
    fn handle(&self, _reader: TcpStream, _connection: &Connection) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Keeps the connection open until the client hangs up.
pub(crate) struct DrainingHandler;

impl ConnectionHandler for DrainingHandler {
    fn handle(&self, mut reader: TcpStream, _connection: &Connection) {
        let mut sink = Vec::new();
        let _ = reader.read_to_end(&mut sink);
    }
}

/// Panics as soon as a client connects.
pub(crate) struct PanickingHandler;

impl ConnectionHandler for PanickingHandler {
    fn handle(&self, _reader: TcpStream, _connection: &Connection) {
        panic!("connection handler failed");
    }
}

/// Accepts one loopback client and registers the server side in `set`.
pub(crate) fn register_loopback(set: &ConnectionSet) -> (TcpStream, Arc<Connection>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("loopback addr");
    let client = TcpStream::connect(addr).expect("connect loopback");
    let (server, peer) = listener.accept().expect("accept loopback");
    let (connection, _reader) = set.register(server, peer).expect("register");
    client
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("read timeout");
    (client, connection)
}

/// Polls `condition` for up to two seconds.
pub(crate) fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}
