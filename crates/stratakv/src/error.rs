/// Errno-style status shared by every fallible operation in the facade.
///
/// `NotFound` is deliberately absent from call sites that perform a lookup:
/// the distilled contract surfaces a miss through [`crate::result::LookupResult::found`],
/// never as an `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("bad parameter")]
    BadParam,
    #[error("invalid argument")]
    InvalidArg,
    #[error("out of memory")]
    NoMemory,
    #[error("storage failure")]
    StorageFailure,
    #[error("invalid state")]
    InvalidState,
}

impl Error {
    /// Converts an error from the underlying store into the facade's own
    /// status, the one seam where `strata_engine::Error` is allowed to
    /// appear.
    pub(crate) fn from_engine(err: strata_engine::Error) -> Error {
        use strata_engine::Error as E;
        match err {
            E::Io(_) | E::FileLocked | E::Corrupted(_) => Error::StorageFailure,
            E::CapacityExceeded { .. } => Error::NoMemory,
            E::EntryTooLarge => Error::InvalidArg,
        }
    }

    /// The errno-style code a C caller embedding this facade would see.
    pub fn to_errno(self) -> i32 {
        match self {
            Error::BadParam => libc::EINVAL,
            Error::InvalidArg => libc::EINVAL,
            Error::NoMemory => libc::ENOMEM,
            Error::StorageFailure => libc::EIO,
            Error::InvalidState => libc::EINVAL,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
