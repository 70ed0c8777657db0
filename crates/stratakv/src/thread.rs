//! Per-thread registration discipline.
//!
//! The pure-Rust store underneath does its own locking and needs no
//! per-thread scratch memory, but the facade still enforces the same
//! register-before-use discipline the distilled contract describes: it
//! keeps the API shape stable for callers and the `MAX_THREADS` ceiling
//! meaningful as a sizing knob, without pretending a native task system
//! is involved.

use crate::error::Result;
use crate::store::Store;

/// Compile-time ceiling on simultaneously-registered threads. Exceeding
/// it is a programming error, not a recoverable one.
pub const MAX_THREADS: usize = 64;

/// RAII handle for a registered thread. Dropping it deregisters the
/// thread. Forgetting it (`mem::forget`) leaks a registration slot —
/// documented, not fatal.
pub struct ThreadGuard<'store, 'cfg> {
    store: &'store Store<'cfg>,
}

impl<'store, 'cfg> ThreadGuard<'store, 'cfg> {
    pub(crate) fn register(store: &'store Store<'cfg>) -> Result<Self> {
        let registered = store.registered_threads().fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
        if registered > MAX_THREADS {
            store
                .registered_threads()
                .fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
            panic!("exceeded MAX_THREADS ({MAX_THREADS}) registered threads");
        }
        log::debug!("thread registered ({registered} active)");
        Ok(Self { store })
    }
}

impl<'store, 'cfg> Drop for ThreadGuard<'store, 'cfg> {
    fn drop(&mut self) {
        self.store
            .registered_threads()
            .fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
        log::debug!("thread deregistered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_config::default_data_config;
    use crate::config::StoreConfig;

    #[test]
    fn registering_past_the_ceiling_panics() {
        let dir = tempfile::tempdir().unwrap();
        let app = default_data_config(16);
        let cfg = StoreConfig::new(
            dir.path().join("db").to_string_lossy().into_owned(),
            1024 * 1024,
            4 * 1024 * 1024,
            &app,
        );
        let store = Store::create(cfg).unwrap();

        let mut guards = Vec::with_capacity(MAX_THREADS);
        for _ in 0..MAX_THREADS {
            guards.push(store.register_thread().unwrap());
        }
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| store.register_thread()));
        assert!(result.is_err());
    }
}
