//! The caller-owned, reusable lookup result buffer, and the merge
//! accumulator handed to [`crate::data_config::AppDataConfig`]'s merge
//! callbacks.

use crate::message::MessageKind;

/// A view over an in-flight merge, handed to a merge callback so it can
/// decide the message that should ultimately be stored. Starts out seeded
/// with the new delta being applied; [`MergeAccumulatorView::set`] is the
/// only way a callback can change that outcome.
pub struct MergeAccumulatorView {
    kind: MessageKind,
    value: Vec<u8>,
}

impl MergeAccumulatorView {
    pub(crate) fn new(kind: MessageKind, value: Vec<u8>) -> Self {
        Self { kind, value }
    }

    /// The message kind and value currently held by the accumulator.
    pub fn current(&self) -> (MessageKind, &[u8]) {
        (self.kind, &self.value)
    }

    /// Replaces the accumulator's message in place.
    pub fn set(&mut self, kind: MessageKind, value: &[u8]) {
        self.kind = kind;
        self.value = value.to_vec();
    }

    pub(crate) fn into_message(self) -> (MessageKind, Vec<u8>) {
        (self.kind, self.value)
    }
}

/// The caller-owned buffer a [`crate::store::Store::lookup`] call fills in.
///
/// Must be constructed once with [`LookupResult::new`] and may be reused
/// across many lookups; each call to `lookup` overwrites the previous
/// contents, growing the buffer in place when a value doesn't fit.
pub struct LookupResult {
    buffer: Vec<u8>,
    found: bool,
}

impl LookupResult {
    /// Binds a caller-owned scratch buffer (`buffer.len()` may be zero).
    pub fn new(buffer: Vec<u8>) -> Self {
        Self { buffer, found: false }
    }

    pub(crate) fn set_miss(&mut self) {
        self.found = false;
    }

    pub(crate) fn set_hit(&mut self, value: &[u8]) {
        self.found = true;
        self.buffer.clear();
        self.buffer.extend_from_slice(value);
    }

    /// Whether the most recent lookup found a matching key.
    pub fn found(&self) -> bool {
        self.found
    }

    /// The value from the most recent lookup, if it found one.
    ///
    /// Valid until the next call to `lookup` with this result.
    pub fn value(&self) -> crate::error::Result<&[u8]> {
        if !self.found {
            return Err(crate::error::Error::InvalidArg);
        }
        Ok(&self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_result_is_not_found() {
        let result = LookupResult::new(vec![0u8; 32]);
        assert!(!result.found());
        assert!(result.value().is_err());
    }

    #[test]
    fn buffer_grows_in_place_to_fit_a_larger_value() {
        let mut result = LookupResult::new(Vec::new());
        result.set_hit(b"a longer value than the empty starting buffer");
        assert!(result.found());
        assert_eq!(result.value().unwrap(), b"a longer value than the empty starting buffer");
    }
}
