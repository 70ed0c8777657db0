//! Length-prefixed variable-length key encoding over a fixed-width slot.
//!
//! `encode` never partially writes `out` on failure: either the whole
//! physical-key buffer is produced, or nothing is.

use crate::error::Error;

/// A single length byte, matching the C ABI's `struct { uint8_t length; ... }`.
pub const KEY_HEADER_SIZE: usize = 1;

/// Upper bound on a logical key's length. The header is a single byte, so
/// this can never exceed 255; the engine also reserves a handful of values
/// as internal sentinels, hence the floor of 8 enforced in `AppDataConfig`.
pub const MAX_LOGICAL_KEY: usize = 255;

/// `physical_key_size` a given `key_size` requires.
pub const fn physical_key_size(key_size: u8) -> usize {
    key_size as usize + KEY_HEADER_SIZE
}

/// Writes `logical_key` into `out` as a zero-padded, length-prefixed
/// physical key. `out.len()` must equal the configured `physical_key_size`.
pub fn encode(out: &mut [u8], logical_key: &[u8]) -> Result<(), Error> {
    if logical_key.len() > MAX_LOGICAL_KEY || logical_key.len() + KEY_HEADER_SIZE > out.len() {
        return Err(Error::InvalidArg);
    }
    out.fill(0);
    out[0] = logical_key.len() as u8;
    out[KEY_HEADER_SIZE..KEY_HEADER_SIZE + logical_key.len()].copy_from_slice(logical_key);
    Ok(())
}

/// Recovers the logical key from a physical key's encoded bytes.
///
/// `encoded` must have been produced by [`encode`] (or by the engine
/// echoing one back); the length byte is asserted rather than validated,
/// since a forged value here would indicate on-disk corruption or a caller
/// bypassing this module entirely.
pub fn decode(encoded: &[u8]) -> &[u8] {
    let length = encoded[0] as usize;
    assert!(length <= MAX_LOGICAL_KEY, "corrupt physical key header");
    &encoded[KEY_HEADER_SIZE..KEY_HEADER_SIZE + length]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_lengths() {
        let physical_size = physical_key_size(64);
        for len in [0usize, 1, 7, 32, 63, 64] {
            let logical: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let mut buf = vec![0u8; physical_size];
            encode(&mut buf, &logical).unwrap();
            assert_eq!(decode(&buf), logical.as_slice());
        }
    }

    #[test]
    fn zero_fills_padding() {
        let mut buf = vec![0xAAu8; physical_key_size(16)];
        encode(&mut buf, b"hi").unwrap();
        assert_eq!(buf[0], 2);
        assert_eq!(&buf[1..3], b"hi");
        assert!(buf[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn rejects_keys_longer_than_the_slot() {
        let mut buf = vec![0u8; physical_key_size(4)];
        let before = buf.clone();
        let err = encode(&mut buf, b"abcde").unwrap_err();
        assert_eq!(err, Error::InvalidArg);
        assert_eq!(buf, before, "encode must not write on failure");
    }

    #[test]
    fn rejects_keys_over_max_logical_key() {
        let mut buf = vec![0u8; 512];
        let long_key = vec![0u8; MAX_LOGICAL_KEY + 1];
        assert_eq!(encode(&mut buf, &long_key).unwrap_err(), Error::InvalidArg);
    }
}
