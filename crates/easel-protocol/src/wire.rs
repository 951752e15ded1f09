//! Primitive field codecs shared by every frame type.
//!
//! Encoders append to an in-memory buffer so a complete frame can be written
//! to a socket with a single `write_all`. Decoders read straight from any
//! [`Read`] implementation and tag failures with the field being decoded.

use std::io::{self, Read};

use crate::FrameError;

/// Upper bound for any single string or payload field.
pub const MAX_FIELD_BYTES: usize = 16 * 1024 * 1024;

const CONTINUATION_BIT: u8 = 0x80;
const VALUE_BITS: u8 = 0x7F;
const LAST_SHIFT: u32 = 28;

/// Appends `value` as a LEB128 unsigned varint.
pub fn write_varint(buffer: &mut Vec<u8>, value: u32) {
    let mut remaining = value;
    while remaining >= u32::from(CONTINUATION_BIT) {
        buffer.push((remaining & u32::from(VALUE_BITS)) as u8 | CONTINUATION_BIT);
        remaining >>= 7;
    }
    buffer.push(remaining as u8);
}

/// Reads a LEB128 unsigned varint.
///
/// # Errors
///
/// Fails when the stream ends early or the value needs more than 32 bits.
pub fn read_varint<R: Read>(reader: &mut R, field: &'static str) -> Result<u32, FrameError> {
    let first = read_byte(reader, field)?;
    read_varint_from(reader, first, field)
}

pub(crate) fn read_varint_from<R: Read>(
    reader: &mut R,
    first: u8,
    field: &'static str,
) -> Result<u32, FrameError> {
    let mut value = 0_u32;
    let mut shift = 0_u32;
    let mut byte = first;
    loop {
        let group = u32::from(byte & VALUE_BITS);
        if shift == LAST_SHIFT && group > 0x0F {
            return Err(FrameError::VarintOverflow { field });
        }
        value |= group << shift;
        if byte & CONTINUATION_BIT == 0 {
            return Ok(value);
        }
        shift += 7;
        if shift > LAST_SHIFT {
            return Err(FrameError::VarintOverflow { field });
        }
        byte = read_byte(reader, field)?;
    }
}

/// Appends a length-prefixed UTF-8 string.
///
/// # Errors
///
/// Returns [`FrameError::TooLarge`] for strings above [`MAX_FIELD_BYTES`].
pub fn write_string(
    buffer: &mut Vec<u8>,
    value: &str,
    field: &'static str,
) -> Result<(), FrameError> {
    let length = checked_length(value.len(), field)?;
    write_varint(buffer, length);
    buffer.extend_from_slice(value.as_bytes());
    Ok(())
}

/// Reads a length-prefixed UTF-8 string.
///
/// # Errors
///
/// Fails on truncation, oversized prefixes, or invalid UTF-8.
pub fn read_string<R: Read>(reader: &mut R, field: &'static str) -> Result<String, FrameError> {
    let first = read_byte(reader, field)?;
    read_string_from(reader, first, field)
}

pub(crate) fn read_string_from<R: Read>(
    reader: &mut R,
    first: u8,
    field: &'static str,
) -> Result<String, FrameError> {
    let declared = read_varint_from(reader, first, field)?;
    let length = usize::try_from(declared).unwrap_or(usize::MAX);
    let bytes = read_bytes(reader, length, field)?;
    String::from_utf8(bytes).map_err(|source| FrameError::InvalidUtf8 { field, source })
}

/// Appends a little-endian `i32`.
pub fn write_i32(buffer: &mut Vec<u8>, value: i32) {
    buffer.extend_from_slice(&value.to_le_bytes());
}

/// Reads a little-endian `i32`.
///
/// # Errors
///
/// Fails when fewer than four bytes remain.
pub fn read_i32<R: Read>(reader: &mut R, field: &'static str) -> Result<i32, FrameError> {
    let mut bytes = [0_u8; 4];
    read_exact(reader, &mut bytes, field)?;
    Ok(i32::from_le_bytes(bytes))
}

/// Appends an `i32` length followed by the payload bytes.
///
/// # Errors
///
/// Returns [`FrameError::TooLarge`] for payloads above [`MAX_FIELD_BYTES`].
pub fn write_payload(
    buffer: &mut Vec<u8>,
    payload: &[u8],
    field: &'static str,
) -> Result<(), FrameError> {
    let declared = checked_length(payload.len(), field)?;
    let length = i32::try_from(declared).map_err(|_| FrameError::TooLarge {
        field,
        size: payload.len(),
        max_size: MAX_FIELD_BYTES,
    })?;
    write_i32(buffer, length);
    buffer.extend_from_slice(payload);
    Ok(())
}

/// Reads an `i32` length followed by that many payload bytes.
///
/// # Errors
///
/// Fails on negative or oversized lengths and on truncation.
pub fn read_payload<R: Read>(reader: &mut R, field: &'static str) -> Result<Vec<u8>, FrameError> {
    let declared = read_i32(reader, field)?;
    let length = usize::try_from(declared).map_err(|_| FrameError::NegativeLength {
        field,
        length: declared,
    })?;
    read_bytes(reader, length, field)
}

/// Reads the first byte of a frame, distinguishing a clean close.
///
/// Returns `Ok(None)` when the stream is at end-of-file before any byte of
/// the next frame arrived.
pub(crate) fn read_frame_start<R: Read>(reader: &mut R) -> Result<Option<u8>, FrameError> {
    let mut byte = [0_u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => {
                let [first] = byte;
                return Ok(Some(first));
            }
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(FrameError::Io(error)),
        }
    }
}

fn checked_length(length: usize, field: &'static str) -> Result<u32, FrameError> {
    let too_large = || FrameError::TooLarge {
        field,
        size: length,
        max_size: MAX_FIELD_BYTES,
    };
    if length > MAX_FIELD_BYTES {
        return Err(too_large());
    }
    u32::try_from(length).map_err(|_| too_large())
}

fn read_bytes<R: Read>(
    reader: &mut R,
    length: usize,
    field: &'static str,
) -> Result<Vec<u8>, FrameError> {
    if length > MAX_FIELD_BYTES {
        return Err(FrameError::TooLarge {
            field,
            size: length,
            max_size: MAX_FIELD_BYTES,
        });
    }
    let mut bytes = vec![0_u8; length];
    read_exact(reader, &mut bytes, field)?;
    Ok(bytes)
}

fn read_byte<R: Read>(reader: &mut R, field: &'static str) -> Result<u8, FrameError> {
    let mut byte = [0_u8; 1];
    read_exact(reader, &mut byte, field)?;
    let [value] = byte;
    Ok(value)
}

fn read_exact<R: Read>(
    reader: &mut R,
    buffer: &mut [u8],
    field: &'static str,
) -> Result<(), FrameError> {
    reader.read_exact(buffer).map_err(|error| {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            FrameError::UnexpectedEof { field }
        } else {
            FrameError::Io(error)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, &[0x00])]
    #[case(1, &[0x01])]
    #[case(127, &[0x7F])]
    #[case(128, &[0x80, 0x01])]
    #[case(300, &[0xAC, 0x02])]
    #[case(u32::MAX, &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F])]
    fn varints_use_minimal_leb128(#[case] value: u32, #[case] expected: &[u8]) {
        let mut buffer = Vec::new();
        write_varint(&mut buffer, value);
        assert_eq!(buffer, expected);
        let decoded = read_varint(&mut buffer.as_slice(), "test").expect("decode");
        assert_eq!(decoded, value);
    }

    #[rstest]
    #[case(&[0xFF, 0xFF, 0xFF, 0xFF, 0x1F])]
    #[case(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01])]
    fn rejects_overlong_varints(#[case] bytes: &[u8]) {
        let error = read_varint(&mut &bytes[..], "length").expect_err("should overflow");
        assert!(matches!(error, FrameError::VarintOverflow { field: "length" }));
    }

    #[test]
    fn integers_are_little_endian() {
        let mut buffer = Vec::new();
        write_i32(&mut buffer, 0x0102_0304);
        assert_eq!(buffer, [0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn strings_carry_utf8_byte_length() {
        let mut buffer = Vec::new();
        write_string(&mut buffer, "héllo", "greeting").expect("encode");
        assert_eq!(buffer.first(), Some(&6));
        let decoded = read_string(&mut buffer.as_slice(), "greeting").expect("decode");
        assert_eq!(decoded, "héllo");
    }

    #[test]
    fn rejects_invalid_utf8() {
        let bytes = [0x02, 0xC3, 0x28];
        let error = read_string(&mut &bytes[..], "name").expect_err("invalid utf8");
        assert!(matches!(error, FrameError::InvalidUtf8 { field: "name", .. }));
    }

    #[test]
    fn rejects_negative_payload_lengths() {
        let mut buffer = Vec::new();
        write_i32(&mut buffer, -4);
        let error = read_payload(&mut buffer.as_slice(), "payload").expect_err("negative");
        assert!(matches!(
            error,
            FrameError::NegativeLength {
                field: "payload",
                length: -4
            }
        ));
    }

    #[test]
    fn rejects_oversized_payload_lengths_before_allocating() {
        let mut buffer = Vec::new();
        write_i32(&mut buffer, i32::MAX);
        let error = read_payload(&mut buffer.as_slice(), "payload").expect_err("too large");
        assert!(matches!(error, FrameError::TooLarge { .. }));
    }

    #[test]
    fn truncated_payload_reports_field() {
        let mut buffer = Vec::new();
        write_i32(&mut buffer, 8);
        buffer.extend_from_slice(&[1, 2, 3]);
        let error = read_payload(&mut buffer.as_slice(), "payload").expect_err("truncated");
        assert!(matches!(error, FrameError::UnexpectedEof { field: "payload" }));
        assert!(error.is_disconnect());
    }

    #[test]
    fn frame_start_detects_clean_close() {
        let empty: &[u8] = &[];
        assert!(read_frame_start(&mut &empty[..]).expect("read").is_none());
    }
}
