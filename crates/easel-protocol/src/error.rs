//! Errors raised while encoding or decoding frames.

use std::io;

use thiserror::Error;

/// Failures encountered while reading or writing protocol frames.
///
/// Any of these on a live connection means the stream can no longer be
/// trusted to be frame-aligned, so the connection is closed.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream ended part-way through a frame.
    #[error("stream ended while reading {field}")]
    UnexpectedEof {
        /// Field being read when the stream ended.
        field: &'static str,
    },

    /// A varint length prefix used more than five 7-bit groups.
    #[error("varint length prefix for {field} overflows 32 bits")]
    VarintOverflow {
        /// Field whose prefix overflowed.
        field: &'static str,
    },

    /// A payload length was negative.
    #[error("negative length {length} for {field}")]
    NegativeLength {
        /// Field carrying the length.
        field: &'static str,
        /// Decoded length.
        length: i32,
    },

    /// A string or payload exceeded the size limit.
    #[error("{field} is {size} bytes, exceeding the {max_size} byte limit")]
    TooLarge {
        /// Oversized field.
        field: &'static str,
        /// Declared or actual size.
        size: usize,
        /// Configured limit.
        max_size: usize,
    },

    /// String bytes were not valid UTF-8.
    #[error("{field} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        /// Offending field.
        field: &'static str,
        /// Decoder error.
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl FrameError {
    /// Returns `true` when the error means the peer went away mid-frame or
    /// reset the connection, as opposed to sending malformed data.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::UnexpectedEof { .. } => true,
            Self::Io(error) => matches!(
                error.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}
