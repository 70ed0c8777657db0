//! `stratakv` is the public façade and variable-length key shim over an
//! embedded, ordered key-value storage engine (`strata-engine`): an
//! append-only log replayed into an in-memory sorted index, with a Bloom
//! filter gating lookups. `stratakv` owns the physical/logical key split,
//! the message taxonomy, and merge semantics; `strata-engine` only knows
//! how to persist and order opaque byte strings.
//!
//! Start with [`data_config::default_data_config`] and [`config::StoreConfig`]
//! to open a [`store::Store`], then use [`store::Store::insert`]/`lookup`/
//! `delete` for point operations and [`iterator::Iterator`] for range scans.

pub mod config;
pub mod data_config;
pub mod error;
pub mod iterator;
pub mod key_codec;
pub mod message;
pub mod result;
pub mod store;
pub mod thread;

pub use config::StoreConfig;
pub use data_config::{default_data_config, AppDataConfig};
pub use error::{Error, Result};
pub use iterator::Iterator;
pub use message::MessageKind;
pub use result::LookupResult;
pub use store::{version, Store};
pub use thread::ThreadGuard;

/// Process-global tracing toggles for the optional shared-memory heap
/// subsystem (see SPEC_FULL.md section 6.3). None of these affect the
/// correctness core; they only gate extra `log::trace!` output.
pub mod trace {
    use std::sync::atomic::{AtomicBool, Ordering};

    static TRACE_SHMEM: AtomicBool = AtomicBool::new(false);
    static TRACE_SHMEM_ALLOCS: AtomicBool = AtomicBool::new(false);
    static TRACE_SHMEM_FREES: AtomicBool = AtomicBool::new(false);

    pub fn set_trace_shmem(enabled: bool) {
        TRACE_SHMEM.store(enabled, Ordering::Relaxed);
    }

    pub fn set_trace_shmem_allocs(enabled: bool) {
        TRACE_SHMEM_ALLOCS.store(enabled, Ordering::Relaxed);
    }

    pub fn set_trace_shmem_frees(enabled: bool) {
        TRACE_SHMEM_FREES.store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn shmem_enabled() -> bool {
        TRACE_SHMEM.load(Ordering::Relaxed)
    }

    pub(crate) fn shmem_allocs_enabled() -> bool {
        TRACE_SHMEM_ALLOCS.load(Ordering::Relaxed)
    }

    pub(crate) fn shmem_frees_enabled() -> bool {
        TRACE_SHMEM_FREES.load(Ordering::Relaxed)
    }
}
