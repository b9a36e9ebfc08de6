//! Mock collaborators for testing and development.
//!
//! This module provides simulated control devices, bus units, transaction
//! clients and a manually driven reactor, so units can be exercised without
//! FireWire hardware.

pub mod backend;
pub mod bus;
pub mod device;
pub mod reactor;

pub use backend::MockBackend;
pub use bus::{EchoControlProtocol, LoopbackTransactions, MockBusUnit};
pub use device::{MockControlDevice, MockControlHandle};
pub use reactor::ManualReactor;

use fwsnd_core::Error;
use nix::errno::Errno;

/// Failure a mock collaborator is told to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// `Error::Io` with this errno.
    Errno(Errno),
    /// `Error::Timeout` after this many milliseconds.
    Timeout(u64),
    /// `Error::Collaborator` with this message, e.g. an FCP `REJECTED` answer.
    Rejected(&'static str),
}

impl MockFailure {
    pub(crate) fn to_error(self, operation: &'static str) -> Error {
        match self {
            Self::Errno(errno) => Error::io(operation, errno),
            Self::Timeout(duration_ms) => Error::timeout(duration_ms),
            Self::Rejected(message) => Error::collaborator(message),
        }
    }
}
