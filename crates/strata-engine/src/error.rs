use std::io;

/// Errors surfaced by the on-disk log and ordered index. `stratakv` maps
/// these onto its own errno-style `Error` at the single seam in
/// `store.rs`, the same way it used to collapse engine status codes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("store file is locked by another process")]
    FileLocked,
    #[error("log entry corrupted: {0}")]
    Corrupted(String),
    #[error("write of {attempted} bytes would exceed the configured disk_size ({limit} bytes)")]
    CapacityExceeded { attempted: u64, limit: u64 },
    #[error("key or value exceeds the configured size limit")]
    EntryTooLarge,
}

pub type Result<T> = std::result::Result<T, Error>;
