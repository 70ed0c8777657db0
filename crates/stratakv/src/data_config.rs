//! The application-supplied capability set: comparator, hasher, merge
//! semantics, and message codec, all operating on logical (length-aware)
//! keys. [`crate::store::Store`] wraps the comparator and hasher into
//! physical-key closures handed to [`strata_engine::Engine`]; everything
//! else here is called directly, with no decorator layer in between.

use std::cmp::Ordering;

use crate::key_codec::MAX_LOGICAL_KEY;
use crate::result::MergeAccumulatorView;

/// Floor enforced so the engine always has room for its internal sentinel
/// keys, regardless of what an application declares.
pub const MIN_LOGICAL_KEY_SIZE: u8 = 8;

type CompareFn = Box<dyn Fn(&[u8], &[u8]) -> Ordering + Send + Sync>;
type HashFn = Box<dyn Fn(&[u8], u32) -> u32 + Send + Sync>;
type MergePartialFn = Box<dyn Fn(&[u8], &[u8], &mut MergeAccumulatorView) + Send + Sync>;
type MergeFinalFn = Box<dyn Fn(&[u8], &mut MergeAccumulatorView) + Send + Sync>;
type KeyToStringFn = Box<dyn Fn(&[u8]) -> String + Send + Sync>;
type MessageToStringFn = Box<dyn Fn(&[u8]) -> String + Send + Sync>;

pub struct AppDataConfig {
    pub(crate) key_size: u8,
    pub(crate) min_key: Vec<u8>,
    pub(crate) max_key: Vec<u8>,
    pub(crate) key_compare: CompareFn,
    pub(crate) key_hash: HashFn,
    pub(crate) merge_partial: MergePartialFn,
    pub(crate) merge_final: MergeFinalFn,
    pub(crate) key_to_string: KeyToStringFn,
    pub(crate) message_to_string: MessageToStringFn,
    /// When false, encoding an `Update` message through this config is
    /// rejected at encode time (see `default_data_config` and SPEC_FULL.md
    /// section 9 for why this crate resolves that open question this way).
    pub(crate) allow_update: bool,
}

impl AppDataConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        key_size: u8,
        min_key: Vec<u8>,
        max_key: Vec<u8>,
        key_compare: CompareFn,
        key_hash: HashFn,
        merge_partial: MergePartialFn,
        merge_final: MergeFinalFn,
        key_to_string: KeyToStringFn,
        message_to_string: MessageToStringFn,
    ) -> Self {
        Self {
            key_size,
            min_key,
            max_key,
            key_compare,
            key_hash,
            merge_partial,
            merge_final,
            key_to_string,
            message_to_string,
            allow_update: true,
        }
    }

    pub fn key_size(&self) -> u8 {
        self.key_size
    }

    pub fn min_key(&self) -> &[u8] {
        &self.min_key
    }

    pub fn max_key(&self) -> &[u8] {
        &self.max_key
    }

    pub fn allows_update(&self) -> bool {
        self.allow_update
    }

    pub fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        (self.key_compare)(a, b)
    }

    pub fn hash(&self, key: &[u8], seed: u32) -> u32 {
        (self.key_hash)(key, seed)
    }

    /// Validates the §3 invariants. Called once, at store open.
    pub(crate) fn validate(&self) -> crate::error::Result<()> {
        use crate::error::Error;
        if self.key_size == 0
            || self.key_size as usize > MAX_LOGICAL_KEY
            || self.key_size < MIN_LOGICAL_KEY_SIZE
        {
            return Err(Error::BadParam);
        }
        // An empty `min_key` is the documented sentinel for "-infinity"
        // (see `default_data_config`); every other key, including `max_key`,
        // must be non-empty and within the declared `key_size`.
        if self.min_key.len() > self.key_size as usize
            || self.max_key.is_empty()
            || self.max_key.len() > self.key_size as usize
        {
            return Err(Error::BadParam);
        }
        if self.compare(&self.min_key, &self.max_key) != Ordering::Less {
            return Err(Error::BadParam);
        }
        Ok(())
    }
}

impl std::fmt::Debug for AppDataConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppDataConfig")
            .field("key_size", &self.key_size)
            .field("allow_update", &self.allow_update)
            .finish_non_exhaustive()
    }
}

fn fnv1a_hash(key: &[u8], seed: u32) -> u32 {
    const FNV_PRIME: u32 = 0x0100_0193;
    let mut hash = seed ^ 0x811c_9dc5;
    for &byte in key {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// The convenience constructor from section 6.4: lexicographic byte
/// comparison, a dependency-free 32-bit hash, an Insert/Delete-only
/// message taxonomy, and merge callbacks that keep the old value.
pub fn default_data_config(key_size: u8) -> AppDataConfig {
    let max_key = vec![0xFFu8; key_size as usize];
    let mut cfg = AppDataConfig::new(
        key_size,
        Vec::new(),
        max_key,
        Box::new(|a, b| a.cmp(b)),
        Box::new(fnv1a_hash),
        Box::new(|_key, _old, _acc| {}),
        Box::new(|_key, _acc| {}),
        Box::new(|key| format!("{key:02x?}")),
        Box::new(|msg| format!("{msg:02x?}")),
    );
    cfg.allow_update = false;
    cfg
}
