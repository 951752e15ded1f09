//! Blocking protocol client for end-to-end tests.

use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use easel_protocol::{MessageType, RequestFrame, ResponseFrame, ServerFrame};

pub(crate) struct TestClient {
    stream: TcpStream,
}

impl TestClient {
    pub(crate) fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).expect("connect to backend");
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .expect("set read timeout");
        Self { stream }
    }

    pub(crate) fn send(&mut self, request: &RequestFrame) {
        let bytes = request.encode().expect("encode request");
        self.stream.write_all(&bytes).expect("write request");
    }

    /// Reads the next frame; `None` once the backend closed the socket.
    pub(crate) fn next_frame(&mut self) -> Option<ServerFrame> {
        ServerFrame::read_from(&mut self.stream).expect("read server frame")
    }

    /// Sends `request` and returns the response to it.
    pub(crate) fn request(&mut self, request: &RequestFrame) -> ResponseFrame {
        self.send(request);
        match self.next_frame() {
            Some(ServerFrame::Response(response)) => response,
            other => panic!("expected a response, got {other:?}"),
        }
    }

    pub(crate) fn get_config(&mut self, correlation_id: &str) -> ResponseFrame {
        self.request(&RequestFrame::new(
            correlation_id,
            MessageType::GET_CONFIG,
            "",
            Vec::new(),
        ))
    }
}
