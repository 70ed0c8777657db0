//! Range iteration from an optional start key.

use crate::error::Error;
use crate::key_codec;
use crate::store::Store;

/// A snapshot-based range iterator: `Iterator::new` takes the current set
/// of live entries at or after `start_key` in one shot and walks it in
/// memory. It never observes writes made after it was constructed.
pub struct Iterator<'store, 'cfg> {
    #[allow(dead_code)] // held only to tie this iterator's lifetime to its store
    store: &'store Store<'cfg>,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    position: usize,
    last_status: Option<Error>,
}

impl<'store, 'cfg> Iterator<'store, 'cfg> {
    /// Positions just before `start_key`, or at `-infinity` when
    /// `start_key` is `None`.
    pub fn new(store: &'store Store<'cfg>, start_key: Option<&[u8]>) -> crate::error::Result<Self> {
        let encoded_start;
        let start = match start_key {
            Some(key) => {
                let mut buf = vec![0u8; store.physical_key_size()];
                key_codec::encode(&mut buf, key)?;
                encoded_start = buf;
                Some(encoded_start.as_slice())
            }
            None => None,
        };

        let entries = store.engine().range_from(start).map_err(Error::from_engine)?;

        Ok(Self {
            store,
            entries,
            position: 0,
            last_status: None,
        })
    }

    /// Whether there is a current key/value to read.
    pub fn valid(&mut self) -> bool {
        self.last_status.is_none() && self.position < self.entries.len()
    }

    /// Advances to the next key in comparator order.
    ///
    /// Calling this when `!valid()` is a programming error.
    pub fn advance(&mut self) -> crate::error::Result<()> {
        debug_assert!(self.valid(), "advance called on an exhausted iterator");
        self.position += 1;
        Ok(())
    }

    /// The current key/value pair. `key` is the logical (decoded) key;
    /// `value` is the message's raw payload.
    pub fn current(&self) -> crate::error::Result<(&[u8], &[u8])> {
        if self.last_status.is_some() {
            return Err(Error::InvalidState);
        }
        let (physical_key, raw_message) = self
            .entries
            .get(self.position)
            .ok_or(Error::InvalidState)?;
        assert!(
            (physical_key[0] as usize) <= key_codec::MAX_LOGICAL_KEY,
            "corrupt physical key from engine"
        );
        let logical_key = key_codec::decode(physical_key);
        let value = crate::message::decode(raw_message)?;
        Ok((logical_key, value))
    }

    /// The last cached error, if any operation on this iterator has failed.
    pub fn status(&self) -> Option<Error> {
        self.last_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::data_config::default_data_config;

    #[test]
    fn walks_entries_in_comparator_order() {
        let dir = tempfile::tempdir().unwrap();
        let app = default_data_config(16);
        let cfg = StoreConfig::new(
            dir.path().join("db").to_string_lossy().into_owned(),
            1024 * 1024,
            4 * 1024 * 1024,
            &app,
        );
        let store = Store::create(cfg).unwrap();
        store.insert(b"b", b"2").unwrap();
        store.insert(b"a", b"1").unwrap();
        store.insert(b"c", b"3").unwrap();

        let mut it = Iterator::new(&store, None).unwrap();
        let mut seen = Vec::new();
        while it.valid() {
            let (key, value) = it.current().unwrap();
            seen.push((key.to_vec(), value.to_vec()));
            it.advance().unwrap();
        }
        assert_eq!(seen, vec![(b"a".to_vec(), b"1".to_vec()), (b"b".to_vec(), b"2".to_vec()), (b"c".to_vec(), b"3".to_vec())]);
    }

    #[test]
    fn start_key_skips_earlier_entries() {
        let dir = tempfile::tempdir().unwrap();
        let app = default_data_config(16);
        let cfg = StoreConfig::new(
            dir.path().join("db").to_string_lossy().into_owned(),
            1024 * 1024,
            4 * 1024 * 1024,
            &app,
        );
        let store = Store::create(cfg).unwrap();
        store.insert(b"a", b"1").unwrap();
        store.insert(b"b", b"2").unwrap();

        let mut it = Iterator::new(&store, Some(b"b")).unwrap();
        assert!(it.valid());
        assert_eq!(it.current().unwrap().0, b"b");
        it.advance().unwrap();
        assert!(!it.valid());
    }
}
