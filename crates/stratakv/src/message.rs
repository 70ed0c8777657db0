//! Tags a raw value payload with a message kind (Insert/Delete/Update).

use crate::error::Error;

pub const MESSAGE_HEADER_SIZE: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    Insert = 1,
    Delete = 2,
    Update = 3,
}

impl MessageKind {
    fn from_byte(byte: u8) -> Self {
        match byte {
            1 => MessageKind::Insert,
            2 => MessageKind::Delete,
            3 => MessageKind::Update,
            other => unreachable!("unknown message kind byte {other}"),
        }
    }
}

/// Writes `kind` and `value` into `dst`, returning the number of bytes
/// written. Fails without writing anything when `dst` is too small.
pub fn encode(kind: MessageKind, value: &[u8], dst: &mut [u8]) -> Result<usize, Error> {
    let total = MESSAGE_HEADER_SIZE + value.len();
    if total > dst.len() {
        return Err(Error::InvalidArg);
    }
    dst[0] = kind as u8;
    dst[MESSAGE_HEADER_SIZE..total].copy_from_slice(value);
    Ok(total)
}

/// Returns the value payload view (no copy) of an encoded message buffer.
pub fn decode(buf: &[u8]) -> Result<&[u8], Error> {
    if buf.is_empty() {
        return Err(Error::InvalidArg);
    }
    Ok(&buf[MESSAGE_HEADER_SIZE..])
}

/// Reads the message kind out of an encoded buffer's header byte.
///
/// An unrecognized header byte means the engine (or a caller bypassing this
/// module) produced a corrupt message; that is a programming error, not a
/// recoverable condition.
pub fn class(buf: &[u8]) -> MessageKind {
    assert!(!buf.is_empty(), "message buffer must contain a header");
    MessageKind::from_byte(buf[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_kind() {
        for kind in [MessageKind::Insert, MessageKind::Delete, MessageKind::Update] {
            let mut buf = vec![0u8; 64];
            let written = encode(kind, b"payload", &mut buf).unwrap();
            let encoded = &buf[..written];
            assert_eq!(class(encoded), kind);
            assert_eq!(decode(encoded).unwrap(), b"payload");
        }
    }

    #[test]
    fn rejects_oversized_values() {
        let mut dst = vec![0u8; 4];
        assert_eq!(
            encode(MessageKind::Insert, b"too long", &mut dst).unwrap_err(),
            Error::InvalidArg
        );
    }

    #[test]
    fn rejects_empty_buffers_on_decode() {
        assert_eq!(decode(&[]).unwrap_err(), Error::InvalidArg);
    }
}
