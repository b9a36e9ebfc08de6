//! Error types for FireWire sound unit operations.
//!
//! Syscall failures carry the operation that failed and the OS error code.
//! Errors raised by transaction and bus-unit collaborators use the same enum
//! and are handed back to the caller unchanged.

use crate::types::FirewireType;
use nix::errno::Errno;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// open/ioctl/read/write on a device node failed.
    #[error("{operation} failed: {errno}")]
    Io {
        operation: &'static str,
        errno: Errno,
    },

    /// Allocation of a listening resource failed.
    #[error("Out of memory allocating {resource}")]
    OutOfMemory { resource: &'static str },

    /// A transaction did not complete in time.
    #[error("Transaction timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    #[error("Unit is not opened")]
    NotOpened,

    #[error("Unit is already opened")]
    AlreadyOpened,

    /// The device reported a type tag that belongs to another vendor family.
    #[error("Device type mismatch: expected {expected}, found {actual}")]
    FamilyMismatch {
        expected: FirewireType,
        actual: FirewireType,
    },

    #[error("Malformed notification record: {reason}")]
    MalformedRecord { reason: String },

    /// Failure reported by a bus or transaction collaborator.
    #[error("{0}")]
    Collaborator(String),
}

impl Error {
    /// Create an I/O error for the given operation.
    pub fn io(operation: &'static str, errno: Errno) -> Self {
        Self::Io { operation, errno }
    }

    /// Create an I/O error from a `std::io::Error` raised by `operation`.
    pub fn from_io(operation: &'static str, err: std::io::Error) -> Self {
        let errno = err.raw_os_error().map(Errno::from_raw).unwrap_or(Errno::EIO);
        Self::Io { operation, errno }
    }

    /// Create an out-of-memory error.
    pub fn out_of_memory(resource: &'static str) -> Self {
        Self::OutOfMemory { resource }
    }

    /// Create a timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a malformed record error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            reason: reason.into(),
        }
    }

    /// Create a collaborator error with a custom message.
    pub fn collaborator(message: impl Into<String>) -> Self {
        Self::Collaborator(message.into())
    }

    /// OS error code carried by this error, if any.
    pub fn errno(&self) -> Option<Errno> {
        match self {
            Self::Io { errno, .. } => Some(*errno),
            Self::OutOfMemory { .. } => Some(Errno::ENOMEM),
            _ => None,
        }
    }

    /// Whether the kernel answered "resource busy".
    pub fn is_busy(&self) -> bool {
        self.errno() == Some(Errno::EBUSY)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::from_io("io", err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let error = Error::io("lock", Errno::EBUSY);
        assert!(error.is_busy());
        assert!(error.to_string().starts_with("lock failed:"));
    }

    #[test]
    fn test_errno_accessor() {
        assert_eq!(Error::io("open", Errno::ENOENT).errno(), Some(Errno::ENOENT));
        assert_eq!(Error::out_of_memory("buffer").errno(), Some(Errno::ENOMEM));
        assert_eq!(Error::timeout(200).errno(), None);
        assert!(!Error::NotOpened.is_busy());
    }

    #[test]
    fn test_from_std_io_error() {
        let err: Error = std::io::Error::from_raw_os_error(Errno::EACCES as i32).into();
        assert!(matches!(
            err,
            Error::Io {
                errno: Errno::EACCES,
                ..
            }
        ));

        let err: Error = std::io::Error::other("custom").into();
        assert_eq!(err.errno(), Some(Errno::EIO));
    }

    #[test]
    fn test_family_mismatch_display() {
        let err = Error::FamilyMismatch {
            expected: FirewireType::Dice,
            actual: FirewireType::Bebob,
        };
        assert_eq!(
            err.to_string(),
            "Device type mismatch: expected DICE, found BeBoB"
        );
    }
}
