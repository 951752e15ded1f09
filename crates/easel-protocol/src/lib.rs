//! Binary wire protocol spoken between Easel clients and the backend.
//!
//! Every frame is a sequence of primitive fields:
//!
//! - strings are a LEB128 unsigned length prefix followed by UTF-8 bytes;
//! - integers are little-endian 32-bit signed values;
//! - payloads are an `i32` length followed by that many raw bytes.
//!
//! Clients send [`RequestFrame`]s. The backend answers each with exactly one
//! [`ResponseFrame`] echoing the correlation id, and may push unsolicited
//! [`BroadcastFrame`]s at any point between responses. [`ServerFrame`]
//! decodes either kind on the client side.
//!
//! ```
//! use easel_protocol::{MessageType, RequestFrame};
//!
//! let request = RequestFrame::new("1", MessageType::GET_CONFIG, "", Vec::new());
//! let bytes = request.encode().expect("encode");
//! let decoded = RequestFrame::read_from(&mut bytes.as_slice())
//!     .expect("decode")
//!     .expect("frame present");
//! assert_eq!(decoded, request);
//! ```

mod codes;
mod error;
mod frame;
pub mod wire;

pub use self::codes::{BroadcastType, MessageFamily, MessageType, ResultCode};
pub use self::error::FrameError;
pub use self::frame::{BROADCAST_TAG, BroadcastFrame, RequestFrame, ResponseFrame, ServerFrame};
