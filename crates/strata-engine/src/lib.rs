//! A small, ordered, file-backed key-value core: an append-only log
//! (replayed on open) backing an in-memory sorted index, with an optional
//! Bloom filter in front of lookups. `stratakv` is the only consumer;
//! this crate knows nothing about its physical/logical key split or its
//! message tagging, it only stores and orders opaque byte strings against
//! a caller-supplied comparator.
//!
//! Deliberately not a real LSM/B-tree: no multi-level compaction, no
//! on-disk B-tree, no clock cache, no background task scheduler — those
//! stay out of scope the way they always were. What's here is a genuine,
//! working, single-writer-lock persistence layer in the same spirit as
//! a write-ahead log plus an in-memory index.

mod error;
mod filter;
mod log;

use std::cmp::Ordering;
use std::path::Path;
use std::sync::{Arc, RwLock};

pub use error::{Error, Result};

use filter::BloomFilter;
use log::Log;

pub type CompareFn<'a> = Arc<dyn Fn(&[u8], &[u8]) -> Ordering + Send + Sync + 'a>;
pub type HashFn<'a> = Arc<dyn Fn(&[u8], u32) -> u32 + Send + Sync + 'a>;

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub disk_size: u64,
    pub memtable_capacity: u64,
    pub fanout: u32,
    pub filter_bits: u32,
    pub filter_hashes: u32,
    pub sync_on_write: bool,
    pub io_perms: u32,
    pub io_flags: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EngineStats {
    pub entries: usize,
    pub log_bytes: u64,
}

struct Inner {
    log: Log,
    index: Vec<(Vec<u8>, Vec<u8>)>,
    filter: BloomFilter,
    bytes_since_compaction: u64,
}

pub struct Engine<'a> {
    inner: RwLock<Inner>,
    compare: CompareFn<'a>,
    hash: HashFn<'a>,
    config: EngineConfig,
}

impl<'a> Engine<'a> {
    /// Mounts a new store, failing if `path` already exists.
    pub fn create(path: &Path, config: EngineConfig, compare: CompareFn<'a>, hash: HashFn<'a>) -> Result<Self> {
        if path.exists() {
            return Err(Error::Corrupted(format!("{} already exists", path.display())));
        }
        Self::open_or_create(path, config, compare, hash)
    }

    /// Mounts an existing store, failing if `path` does not exist.
    pub fn open(path: &Path, config: EngineConfig, compare: CompareFn<'a>, hash: HashFn<'a>) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Corrupted(format!("{} does not exist", path.display())));
        }
        Self::open_or_create(path, config, compare, hash)
    }

    fn open_or_create(path: &Path, config: EngineConfig, compare: CompareFn<'a>, hash: HashFn<'a>) -> Result<Self> {
        let mut log = Log::open(path, config.io_perms, config.io_flags)?;
        let records = log.replay()?;

        let mut deduped: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
        for (key, value) in records {
            deduped.retain(|(k, _)| k != &key);
            if let Some(value) = value {
                deduped.push((key, value));
            }
        }
        deduped.sort_by(|a, b| compare(&a.0, &b.0));

        let mut filter = BloomFilter::new(config.filter_bits, config.filter_hashes);
        for (key, _) in &deduped {
            filter.insert(key, hash.as_ref());
        }

        let bytes_since_compaction = log.len_bytes()?;
        log::debug!("mounted store at {} ({} live keys)", path.display(), deduped.len());

        Ok(Self {
            inner: RwLock::new(Inner {
                log,
                index: deduped,
                filter,
                bytes_since_compaction,
            }),
            compare,
            hash,
            config,
        })
    }

    fn locate(index: &[(Vec<u8>, Vec<u8>)], key: &[u8], compare: &CompareFn<'a>) -> std::result::Result<usize, usize> {
        index.binary_search_by(|(k, _)| compare(k, key))
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let inner = self.inner.read().expect("engine lock poisoned");
        if !inner.filter.may_contain(key, self.hash.as_ref()) {
            return Ok(None);
        }
        Ok(Self::locate(&inner.index, key, &self.compare)
            .ok()
            .map(|i| inner.index[i].1.clone()))
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut inner = self.inner.write().expect("engine lock poisoned");
        let entry_size = 8 + key.len() as u64 + value.len() as u64;
        if inner.log.len_bytes()? + entry_size > self.config.disk_size {
            return Err(Error::CapacityExceeded {
                attempted: entry_size,
                limit: self.config.disk_size,
            });
        }

        inner.log.append(key, Some(value), self.config.sync_on_write)?;
        match Self::locate(&inner.index, key, &self.compare) {
            Ok(i) => inner.index[i].1 = value.to_vec(),
            Err(i) => inner.index.insert(i, (key.to_vec(), value.to_vec())),
        }
        inner.filter.insert(key, self.hash.as_ref());
        inner.bytes_since_compaction += entry_size;

        if inner.bytes_since_compaction > self.config.memtable_capacity * self.config.fanout as u64 {
            Self::compact_locked(&mut inner, &self.compare, self.hash.as_ref(), self.config)?;
        }
        Ok(())
    }

    pub fn remove(&self, key: &[u8]) -> Result<()> {
        let mut inner = self.inner.write().expect("engine lock poisoned");
        inner.log.append(key, None, self.config.sync_on_write)?;
        if let Ok(i) = Self::locate(&inner.index, key, &self.compare) {
            inner.index.remove(i);
        }
        Ok(())
    }

    /// A snapshot of every live entry with a key `>= start` (or every
    /// entry, when `start` is `None`), in comparator order.
    pub fn range_from(&self, start: Option<&[u8]>) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let inner = self.inner.read().expect("engine lock poisoned");
        let from = match start {
            None => 0,
            Some(start) => match Self::locate(&inner.index, start, &self.compare) {
                Ok(i) => i,
                Err(i) => i,
            },
        };
        Ok(inner.index[from..].to_vec())
    }

    pub fn stats(&self) -> Result<EngineStats> {
        let inner = self.inner.read().expect("engine lock poisoned");
        Ok(EngineStats {
            entries: inner.index.len(),
            log_bytes: inner.log.len_bytes()?,
        })
    }

    /// Rewrites the log with only live entries, reclaiming tombstone and
    /// overwritten-entry space. Triggered automatically once the log has
    /// grown past `memtable_capacity * fanout` bytes since the last
    /// compaction; also callable directly.
    pub fn compact(&self) -> Result<()> {
        let mut inner = self.inner.write().expect("engine lock poisoned");
        Self::compact_locked(&mut inner, &self.compare, self.hash.as_ref(), self.config)
    }

    fn compact_locked(
        inner: &mut Inner,
        compare: &CompareFn<'a>,
        hash: &dyn Fn(&[u8], u32) -> u32,
        config: EngineConfig,
    ) -> Result<()> {
        inner.log.truncate()?;
        for (key, value) in &inner.index {
            inner.log.append(key, Some(value), false)?;
        }
        inner.log.sync()?;
        inner.filter.clear();
        for (key, _) in &inner.index {
            inner.filter.insert(key, hash);
        }
        inner.bytes_since_compaction = inner.log.len_bytes()?;
        let _ = compare; // index is already sorted; nothing to resort here
        let _ = config;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicographic() -> CompareFn<'static> {
        Arc::new(|a, b| a.cmp(b))
    }

    fn identity_hash() -> HashFn<'static> {
        Arc::new(|key, seed| {
            let mut h = seed;
            for &b in key {
                h = h.wrapping_mul(31).wrapping_add(b as u32);
            }
            h
        })
    }

    fn config() -> EngineConfig {
        EngineConfig {
            disk_size: 16 * 1024 * 1024,
            memtable_capacity: 4096,
            fanout: 4,
            filter_bits: 256,
            filter_hashes: 3,
            sync_on_write: true,
            io_perms: 0o644,
            io_flags: 0,
        }
    }

    #[test]
    fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::create(&dir.path().join("db"), config(), lexicographic(), identity_hash()).unwrap();
        engine.put(b"apple", b"red").unwrap();
        assert_eq!(engine.get(b"apple").unwrap(), Some(b"red".to_vec()));
        assert_eq!(engine.get(b"pear").unwrap(), None);
    }

    #[test]
    fn remove_clears_the_key() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::create(&dir.path().join("db"), config(), lexicographic(), identity_hash()).unwrap();
        engine.put(b"k", b"v").unwrap();
        engine.remove(b"k").unwrap();
        assert_eq!(engine.get(b"k").unwrap(), None);
    }

    #[test]
    fn range_from_respects_comparator_order() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::create(&dir.path().join("db"), config(), lexicographic(), identity_hash()).unwrap();
        engine.put(b"b", b"1").unwrap();
        engine.put(b"a", b"2").unwrap();
        engine.put(b"c", b"3").unwrap();

        let all = engine.range_from(None).unwrap();
        assert_eq!(
            all,
            vec![
                (b"a".to_vec(), b"2".to_vec()),
                (b"b".to_vec(), b"1".to_vec()),
                (b"c".to_vec(), b"3".to_vec()),
            ]
        );

        let from_b = engine.range_from(Some(b"b")).unwrap();
        assert_eq!(
            from_b,
            vec![(b"b".to_vec(), b"1".to_vec()), (b"c".to_vec(), b"3".to_vec())]
        );
    }

    #[test]
    fn create_fails_when_store_already_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        Engine::create(&path, config(), lexicographic(), identity_hash()).unwrap();
        drop(Engine::open(&path, config(), lexicographic(), identity_hash()).unwrap());
        assert!(Engine::create(&path, config(), lexicographic(), identity_hash()).is_err());
    }

    #[test]
    fn reopening_replays_prior_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        {
            let engine = Engine::create(&path, config(), lexicographic(), identity_hash()).unwrap();
            engine.put(b"x", b"y").unwrap();
        }
        let engine = Engine::open(&path, config(), lexicographic(), identity_hash()).unwrap();
        assert_eq!(engine.get(b"x").unwrap(), Some(b"y".to_vec()));
    }

    #[test]
    fn capacity_limit_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config();
        cfg.disk_size = 4;
        let engine = Engine::create(&dir.path().join("db"), cfg, lexicographic(), identity_hash()).unwrap();
        assert!(engine.put(b"k", b"v").is_err());
    }
}
