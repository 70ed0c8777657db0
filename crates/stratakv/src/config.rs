//! `StoreConfig`: the typed builder that collects everything
//! [`crate::store::Store::create`]/[`crate::store::Store::open`] need, plus
//! the defaults applied to fields the caller leaves at zero.

use crate::data_config::AppDataConfig;

pub(crate) const DEFAULT_PAGE_SIZE: u32 = 4096;
pub(crate) const DEFAULT_EXTENT_SIZE: u32 = DEFAULT_PAGE_SIZE * 128;
pub(crate) const DEFAULT_IO_FLAGS: i32 = libc::O_RDWR | libc::O_CREAT;
pub(crate) const DEFAULT_IO_PERMS: u32 = 0o755;
pub(crate) const DEFAULT_ASYNC_QUEUE_DEPTH: u32 = 256;
pub(crate) const DEFAULT_BTREE_ROUGH_COUNT_HEIGHT: u32 = 1;
pub(crate) const DEFAULT_FILTER_INDEX_SIZE: u32 = 256;
pub(crate) const DEFAULT_FILTER_REMAINDER_SIZE: u32 = 6;
pub(crate) const DEFAULT_MEMTABLE_CAPACITY: u64 = 24 * 1024 * 1024;
pub(crate) const DEFAULT_FANOUT: u32 = 8;
pub(crate) const DEFAULT_MAX_BRANCHES_PER_NODE: u32 = 24;
pub(crate) const DEFAULT_RECLAIM_THRESHOLD: u64 = u64::MAX;

/// Collects every subsystem tuning knob plus the application's data
/// config. Fields left at their zero value pick up the defaults in
/// SPEC_FULL.md section 4.4.1 when the store is opened.
pub struct StoreConfig<'cfg> {
    pub filename: String,
    pub cache_size: u64,
    pub disk_size: u64,
    pub page_size: u32,
    pub extent_size: u32,
    pub io_flags: i32,
    pub io_perms: u32,
    pub async_queue_depth: u32,
    pub memtable_capacity: u64,
    pub fanout: u32,
    pub max_branches_per_node: u32,
    pub btree_rough_count_height: u32,
    pub filter_index_size: u32,
    pub filter_remainder_size: u32,
    pub reclaim_threshold: u64,
    pub use_log: bool,
    pub use_stats: bool,
    pub use_shmem: bool,
    pub app_config: &'cfg AppDataConfig,
}

impl<'cfg> StoreConfig<'cfg> {
    pub fn new(filename: impl Into<String>, cache_size: u64, disk_size: u64, app_config: &'cfg AppDataConfig) -> Self {
        Self {
            filename: filename.into(),
            cache_size,
            disk_size,
            page_size: 0,
            extent_size: 0,
            io_flags: 0,
            io_perms: 0,
            async_queue_depth: 0,
            memtable_capacity: 0,
            fanout: 0,
            max_branches_per_node: 0,
            btree_rough_count_height: 0,
            filter_index_size: 0,
            filter_remainder_size: 0,
            reclaim_threshold: 0,
            use_log: false,
            use_stats: false,
            use_shmem: false,
            app_config,
        }
    }

    pub fn with_use_log(mut self, use_log: bool) -> Self {
        self.use_log = use_log;
        self
    }

    pub fn with_use_stats(mut self, use_stats: bool) -> Self {
        self.use_stats = use_stats;
        self
    }

    pub fn with_use_shmem(mut self, use_shmem: bool) -> Self {
        self.use_shmem = use_shmem;
        self
    }

    pub fn with_fanout(mut self, fanout: u32) -> Self {
        self.fanout = fanout;
        self
    }

    /// Applies every section-4.4.1 default to fields still at zero,
    /// in place, without allocating a new struct.
    pub(crate) fn apply_defaults(&mut self) {
        if self.page_size == 0 {
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        if self.extent_size == 0 {
            self.extent_size = DEFAULT_EXTENT_SIZE;
        }
        if self.io_flags == 0 {
            self.io_flags = DEFAULT_IO_FLAGS;
        }
        if self.io_perms == 0 {
            self.io_perms = DEFAULT_IO_PERMS;
        }
        if self.async_queue_depth == 0 {
            self.async_queue_depth = DEFAULT_ASYNC_QUEUE_DEPTH;
        }
        if self.btree_rough_count_height == 0 {
            self.btree_rough_count_height = DEFAULT_BTREE_ROUGH_COUNT_HEIGHT;
        }
        if self.filter_index_size == 0 {
            self.filter_index_size = DEFAULT_FILTER_INDEX_SIZE;
        }
        if self.filter_remainder_size == 0 {
            self.filter_remainder_size = DEFAULT_FILTER_REMAINDER_SIZE;
        }
        if self.memtable_capacity == 0 {
            self.memtable_capacity = DEFAULT_MEMTABLE_CAPACITY;
        }
        if self.fanout == 0 {
            self.fanout = DEFAULT_FANOUT;
        }
        if self.max_branches_per_node == 0 {
            self.max_branches_per_node = DEFAULT_MAX_BRANCHES_PER_NODE;
        }
        if self.reclaim_threshold == 0 {
            self.reclaim_threshold = DEFAULT_RECLAIM_THRESHOLD;
        }
    }

    /// `page_size` must divide `extent_size` and be a power of two; checked
    /// after defaults are applied, before any subsystem is touched.
    pub(crate) fn validate_io_shape(&self) -> crate::error::Result<()> {
        use crate::error::Error;
        if !self.page_size.is_power_of_two() {
            return Err(Error::BadParam);
        }
        if self.page_size > self.extent_size || self.extent_size % self.page_size != 0 {
            return Err(Error::BadParam);
        }
        Ok(())
    }

    pub(crate) fn validate_required(&self) -> crate::error::Result<()> {
        use crate::error::Error;
        if self.filename.is_empty() || self.cache_size == 0 || self.disk_size == 0 {
            return Err(Error::BadParam);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_config::default_data_config;

    #[test]
    fn defaults_fill_in_zero_fields() {
        let app = default_data_config(16);
        let mut cfg = StoreConfig::new("db", 1024 * 1024, 16 * 1024 * 1024, &app);
        cfg.apply_defaults();
        assert_eq!(cfg.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(cfg.extent_size, DEFAULT_EXTENT_SIZE);
        assert_eq!(cfg.fanout, DEFAULT_FANOUT);
        cfg.validate_io_shape().unwrap();
    }

    #[test]
    fn explicit_fields_survive_defaulting() {
        let app = default_data_config(16);
        let mut cfg = StoreConfig::new("db", 1, 1, &app).with_fanout(4);
        cfg.apply_defaults();
        assert_eq!(cfg.fanout, 4);
    }

    #[test]
    fn rejects_missing_required_fields() {
        let app = default_data_config(16);
        let cfg = StoreConfig::new("", 0, 0, &app);
        assert!(cfg.validate_required().is_err());
    }
}
