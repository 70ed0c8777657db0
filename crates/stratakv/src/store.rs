//! Store lifecycle (create/open/close) and point operations.

use std::path::Path;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use strata_engine::{CompareFn, Engine, EngineConfig, HashFn};

use crate::config::StoreConfig;
use crate::data_config::AppDataConfig;
use crate::error::{Error, Result};
use crate::key_codec;
use crate::message::{self, MessageKind};
use crate::result::{LookupResult, MergeAccumulatorView};
use crate::thread::ThreadGuard;

/// Returns the facade's build identifier.
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// An open, mounted store. Exclusively owns the underlying engine handle.
/// `Send`+`Sync` fall out automatically: every field is built from plain
/// safe Rust types (`Engine` locks itself internally), there is no raw
/// pointer here to justify with an `unsafe impl`.
pub struct Store<'cfg> {
    engine: Engine<'cfg>,
    app_config: &'cfg AppDataConfig,
    physical_key_size: usize,
    registered_threads: AtomicUsize,
}

impl<'cfg> Store<'cfg> {
    /// Creates a new store, failing if one already exists at `filename`.
    pub fn create(config: StoreConfig<'cfg>) -> Result<Self> {
        Self::open_protocol(config, true)
    }

    /// Mounts an existing store, or fails if none exists.
    pub fn open(config: StoreConfig<'cfg>) -> Result<Self> {
        Self::open_protocol(config, false)
    }

    fn open_protocol(mut config: StoreConfig<'cfg>, create: bool) -> Result<Self> {
        config.app_config.validate()?;
        config.validate_required()?;
        config.apply_defaults();
        config.validate_io_shape()?;

        let physical_key_size = key_codec::physical_key_size(config.app_config.key_size());
        let app_config = config.app_config;

        let compare: CompareFn<'cfg> = Arc::new(move |a: &[u8], b: &[u8]| {
            app_config.compare(key_codec::decode(a), key_codec::decode(b))
        });
        let hash: HashFn<'cfg> =
            Arc::new(move |key: &[u8], seed: u32| app_config.hash(key_codec::decode(key), seed));

        let engine_config = EngineConfig {
            disk_size: config.disk_size,
            memtable_capacity: config.memtable_capacity,
            fanout: config.fanout,
            filter_bits: config.filter_index_size,
            filter_hashes: config.filter_remainder_size.clamp(1, 8),
            sync_on_write: config.use_log,
            io_perms: config.io_perms,
            io_flags: config.io_flags,
        };

        let path = Path::new(&config.filename);
        let engine = if create {
            Engine::create(path, engine_config, compare, hash)
        } else {
            Engine::open(path, engine_config, compare, hash)
        }
        .map_err(|err| {
            log::error!(
                "failed to {} store {}: {err}",
                if create { "create" } else { "open" },
                config.filename
            );
            Error::from_engine(err)
        })?;

        log::info!(
            "{} store {} (cache={}B disk={}B)",
            if create { "created new" } else { "mounted existing" },
            config.filename,
            config.cache_size,
            config.disk_size,
        );

        Ok(Self {
            engine,
            app_config: config.app_config,
            physical_key_size,
            registered_threads: AtomicUsize::new(0),
        })
    }

    pub(crate) fn registered_threads(&self) -> &AtomicUsize {
        &self.registered_threads
    }

    /// Registers the calling thread. Any thread other than the one that
    /// opened the store must hold a `ThreadGuard` for the duration of its
    /// calls into this store.
    pub fn register_thread<'store>(&'store self) -> Result<ThreadGuard<'store, 'cfg>> {
        ThreadGuard::register(self)
    }

    fn validate_key_length(&self, key: &[u8]) -> Result<()> {
        if key.len() > self.app_config.key_size() as usize {
            return Err(Error::InvalidArg);
        }
        debug_assert!(
            key.is_empty()
                || self.app_config.min_key().is_empty()
                || self.app_config.compare(key, self.app_config.min_key()) != std::cmp::Ordering::Less,
            "key below configured min_key"
        );
        debug_assert!(
            self.app_config.compare(key, self.app_config.max_key()) != std::cmp::Ordering::Greater,
            "key above configured max_key"
        );
        Ok(())
    }

    fn encode_physical_key(&self, key: &[u8]) -> Result<Vec<u8>> {
        let mut physical = vec![0u8; self.physical_key_size];
        key_codec::encode(&mut physical, key)?;
        Ok(physical)
    }

    pub(crate) fn physical_key_size(&self) -> usize {
        self.physical_key_size
    }

    pub(crate) fn engine(&self) -> &Engine<'cfg> {
        &self.engine
    }

    /// Stores `value` for `key`, overwriting any previous value.
    pub fn insert(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.validate_key_length(key)?;
        let physical_key = self.encode_physical_key(key)?;
        let message = encode_message(MessageKind::Insert, value)?;
        self.engine.put(&physical_key, &message).map_err(Error::from_engine)
    }

    /// Removes `key`, a no-op if it isn't present.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.validate_key_length(key)?;
        let physical_key = self.encode_physical_key(key)?;
        self.engine.remove(&physical_key).map_err(Error::from_engine)
    }

    /// Applies `delta` to whatever is currently stored at `key` through
    /// the app's merge callbacks, or rejects the call outright when the
    /// configured data-config has no use for blind mutation (see
    /// `AppDataConfig::allows_update`).
    pub fn update(&self, key: &[u8], delta: &[u8]) -> Result<()> {
        if !self.app_config.allows_update() {
            return Err(Error::InvalidArg);
        }
        self.validate_key_length(key)?;
        let physical_key = self.encode_physical_key(key)?;

        let existing = self.engine.get(&physical_key).map_err(Error::from_engine)?;
        let mut accumulator = MergeAccumulatorView::new(MessageKind::Update, delta.to_vec());
        match existing {
            Some(old_raw_message) => (self.app_config.merge_partial)(key, &old_raw_message, &mut accumulator),
            None => (self.app_config.merge_final)(key, &mut accumulator),
        }
        let (final_kind, final_value) = accumulator.into_message();
        let message = encode_message(final_kind, &final_value)?;
        self.engine.put(&physical_key, &message).map_err(Error::from_engine)
    }

    pub fn lookup(&self, key: &[u8], result: &mut LookupResult) -> Result<()> {
        self.validate_key_length(key)?;
        let physical_key = self.encode_physical_key(key)?;

        match self.engine.get(&physical_key).map_err(Error::from_engine)? {
            Some(raw_message) => {
                let value = message::decode(&raw_message)?;
                result.set_hit(value);
            }
            None => result.set_miss(),
        }
        Ok(())
    }

    pub fn print_insertion_stats(&self) {
        if let Ok(stats) = self.engine.stats() {
            log::info!("insertion stats: {} live entries, {} log bytes", stats.entries, stats.log_bytes);
        }
    }

    pub fn print_lookup_stats(&self) {
        if let Ok(stats) = self.engine.stats() {
            log::info!("lookup stats: {} live entries available for lookup", stats.entries);
        }
    }

    pub fn reset_stats(&self) {
        log::debug!("stats reset requested (this facade tracks no cumulative counters to clear)");
    }

    /// Consumes the store, running the close protocol deterministically
    /// rather than waiting for `Drop`. Equivalent to dropping `self`.
    pub fn close(self) {
        drop(self)
    }
}

impl<'cfg> Drop for Store<'cfg> {
    fn drop(&mut self) {
        log::info!("store closed");
    }
}

fn encode_message(kind: MessageKind, value: &[u8]) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; 1 + value.len()];
    let written = message::encode(kind, value, &mut buf)?;
    buf.truncate(written);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_config::default_data_config;

    #[test]
    fn update_is_rejected_without_engine_when_default_config_forbids_it() {
        let app = default_data_config(16);
        assert!(!app.allows_update());
    }
}
