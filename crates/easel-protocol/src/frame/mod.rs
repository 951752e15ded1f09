//! Request, response, and broadcast frames.

use std::io::Read;

use crate::wire::{
    read_frame_start, read_i32, read_payload, read_string, read_string_from, write_i32,
    write_payload, write_string,
};
use crate::{BroadcastType, FrameError, MessageType, ResultCode};

/// Literal that opens every broadcast frame in place of a correlation id.
pub const BROADCAST_TAG: &str = "broadcast";

/// Longest encoding of a string length prefix.
const MAX_VARINT_BYTES: usize = 5;
/// Bytes a request or response spends on its two string length prefixes,
/// its code, and its payload length.
const FIXED_FIELD_BYTES: usize = 2 * MAX_VARINT_BYTES + 4 + 4;

/// Buffer size that fits a request or response without reallocating.
fn capacity_hint(correlation_id: &str, session_token: &str, payload: &[u8]) -> usize {
    correlation_id.len() + session_token.len() + payload.len() + FIXED_FIELD_BYTES
}

/// One client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    /// Caller-chosen token echoed in the response.
    pub correlation_id: String,
    /// Requested operation.
    pub message_type: MessageType,
    /// Session token; empty when the caller has none.
    pub session_token: String,
    /// Operation-specific body.
    pub payload: Vec<u8>,
}

impl RequestFrame {
    /// Builds a request frame.
    #[must_use]
    pub fn new(
        correlation_id: impl Into<String>,
        message_type: MessageType,
        session_token: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            message_type,
            session_token: session_token.into(),
            payload,
        }
    }

    /// Serialises the frame.
    ///
    /// # Errors
    ///
    /// Fails when a field exceeds the protocol size limit.
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        let mut buffer = Vec::with_capacity(capacity_hint(
            &self.correlation_id,
            &self.session_token,
            &self.payload,
        ));
        write_string(&mut buffer, &self.correlation_id, "correlation id")?;
        write_i32(&mut buffer, self.message_type.code());
        write_string(&mut buffer, &self.session_token, "session token")?;
        write_payload(&mut buffer, &self.payload, "payload")?;
        Ok(buffer)
    }

    /// Reads the next request from `reader`.
    ///
    /// Returns `Ok(None)` when the stream closed cleanly between frames.
    ///
    /// # Errors
    ///
    /// Fails on malformed or truncated frames and on I/O errors.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Option<Self>, FrameError> {
        let Some(first) = read_frame_start(reader)? else {
            return Ok(None);
        };
        let correlation_id = read_string_from(reader, first, "correlation id")?;
        let message_type = MessageType(read_i32(reader, "message type")?);
        let session_token = read_string(reader, "session token")?;
        let payload = read_payload(reader, "payload")?;
        Ok(Some(Self {
            correlation_id,
            message_type,
            session_token,
            payload,
        }))
    }
}

/// The backend's answer to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    /// Correlation id copied from the request.
    pub correlation_id: String,
    /// Outcome of the request.
    pub result_code: ResultCode,
    /// Session token copied from the request.
    pub session_token: String,
    /// Operation-specific body.
    pub payload: Vec<u8>,
}

impl ResponseFrame {
    /// Builds a response that echoes the request's correlation id and
    /// session token.
    #[must_use]
    pub fn reply_to(request: &RequestFrame, result_code: ResultCode, payload: Vec<u8>) -> Self {
        Self {
            correlation_id: request.correlation_id.clone(),
            result_code,
            session_token: request.session_token.clone(),
            payload,
        }
    }

    /// Serialises the frame.
    ///
    /// # Errors
    ///
    /// Fails when a field exceeds the protocol size limit.
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        let mut buffer = Vec::with_capacity(capacity_hint(
            &self.correlation_id,
            &self.session_token,
            &self.payload,
        ));
        write_string(&mut buffer, &self.correlation_id, "correlation id")?;
        write_i32(&mut buffer, self.result_code.code());
        write_string(&mut buffer, &self.session_token, "session token")?;
        write_payload(&mut buffer, &self.payload, "payload")?;
        Ok(buffer)
    }
}

/// An unsolicited notice pushed to every connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastFrame {
    /// Kind of notice.
    pub broadcast_type: BroadcastType,
    /// Notice body.
    pub payload: Vec<u8>,
}

impl BroadcastFrame {
    /// Builds a broadcast frame.
    #[must_use]
    pub const fn new(broadcast_type: BroadcastType, payload: Vec<u8>) -> Self {
        Self {
            broadcast_type,
            payload,
        }
    }

    /// Serialises the frame. The result code is always
    /// [`ResultCode::SUCCESS`].
    ///
    /// # Errors
    ///
    /// Fails when the payload exceeds the protocol size limit.
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        let mut buffer = Vec::with_capacity(self.payload.len() + BROADCAST_TAG.len() + 13);
        write_string(&mut buffer, BROADCAST_TAG, "broadcast tag")?;
        write_i32(&mut buffer, ResultCode::SUCCESS.code());
        write_i32(&mut buffer, self.broadcast_type.code());
        write_payload(&mut buffer, &self.payload, "payload")?;
        Ok(buffer)
    }
}

/// Any frame a client can receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    /// Answer to an earlier request.
    Response(ResponseFrame),
    /// Unsolicited broadcast.
    Broadcast(BroadcastFrame),
}

impl ServerFrame {
    /// Reads the next server frame from `reader`.
    ///
    /// Frames whose leading string equals [`BROADCAST_TAG`] are decoded as
    /// broadcasts, so clients must not use that literal as a correlation id.
    ///
    /// # Errors
    ///
    /// Fails on malformed or truncated frames and on I/O errors.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Option<Self>, FrameError> {
        let Some(first) = read_frame_start(reader)? else {
            return Ok(None);
        };
        let tag = read_string_from(reader, first, "correlation id")?;
        let result_code = ResultCode(read_i32(reader, "result code")?);
        if tag == BROADCAST_TAG {
            let broadcast_type = BroadcastType(read_i32(reader, "broadcast type")?);
            let payload = read_payload(reader, "payload")?;
            return Ok(Some(Self::Broadcast(BroadcastFrame {
                broadcast_type,
                payload,
            })));
        }
        let session_token = read_string(reader, "session token")?;
        let payload = read_payload(reader, "payload")?;
        Ok(Some(Self::Response(ResponseFrame {
            correlation_id: tag,
            result_code,
            session_token,
            payload,
        })))
    }
}
