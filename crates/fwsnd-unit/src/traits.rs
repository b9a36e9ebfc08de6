//! Collaborator trait definitions.
//!
//! A [`SndUnit`](crate::SndUnit) talks to four kinds of collaborators:
//!
//! - a [`ControlDevice`]: the kernel hwdep node (ioctl, read, write),
//! - a [`BusUnit`]: the FireWire node backing the sound device,
//! - two transaction clients bound to that node: a [`TransactionClient`]
//!   for addressed read/write/lock and a [`ControlProtocolClient`] for the
//!   vendor control protocol (FCP),
//! - optionally a [`NotificationDecoder`] for the attached vendor family.
//!
//! A [`FirewireBackend`] creates the first three at open time. All calls are
//! blocking and run on the invoking thread.

use crate::hwdep::HwdepDevice;
use fwsnd_core::{DeviceIdentity, Result};
use std::os::fd::RawFd;
use std::path::Path;
use std::sync::Arc;

/// Kernel-facing control device of one FireWire sound unit.
///
/// The implementation owns its file descriptor and closes it on drop.
pub trait ControlDevice: Send + Sync {
    /// Descriptor to watch for readiness. Valid until the device is dropped.
    fn raw_fd(&self) -> RawFd;

    /// Issue GET_INFO.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` with the ioctl errno.
    fn get_info(&self) -> Result<DeviceIdentity>;

    /// Issue LOCK to disallow kernel streaming.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` carrying `EBUSY` when another consumer holds the lock.
    fn lock(&self) -> Result<()>;

    /// Issue UNLOCK to allow kernel streaming again.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` when this consumer does not hold the lock.
    fn unlock(&self) -> Result<()>;

    /// Read one notification record. `Ok(0)` means nothing was read.
    fn read(&self, buf: &mut [u8]) -> Result<usize>;

    /// Write a frame to the device. Returns the number of bytes written.
    fn write(&self, buf: &[u8]) -> Result<usize>;
}

/// FireWire node abstraction used for addressed transactions.
///
/// `listen`/`unlisten` start and stop the node's own event processing.
/// `unlisten` must tolerate being called when not listening.
pub trait BusUnit: Send + Sync {
    /// Special file this unit was opened on.
    fn path(&self) -> &Path;

    fn listen(&self) -> Result<()>;

    fn unlisten(&self);
}

/// Client for addressed asynchronous transactions on the bus.
///
/// Errors are returned as produced; retry policy, if any, lives here.
pub trait TransactionClient: Send + Sync {
    /// Read `length` bytes at `addr`.
    fn read(&self, addr: u64, length: usize) -> Result<Vec<u8>>;

    /// Write `frame` at `addr`.
    fn write(&self, addr: u64, frame: &[u8]) -> Result<()>;

    /// Lock transaction at `addr`. Returns the response frame.
    fn lock(&self, addr: u64, frame: &[u8]) -> Result<Vec<u8>>;
}

/// Client for the vendor control protocol (FCP request/response).
///
/// `unlisten` must tolerate being called when not listening.
pub trait ControlProtocolClient: Send + Sync {
    fn listen(&self) -> Result<()>;

    fn unlisten(&self);

    /// Send `request` and wait for the matching response frame.
    fn transact(&self, request: &[u8]) -> Result<Vec<u8>>;
}

/// Decoder for one vendor family's notification records.
///
/// Receives the full record, header included. Runs on the reactor thread.
pub trait NotificationDecoder: Send + Sync {
    fn handle_notification(&self, record: &[u8]);
}

impl<F> NotificationDecoder for F
where
    F: Fn(&[u8]) + Send + Sync,
{
    fn handle_notification(&self, record: &[u8]) {
        self(record)
    }
}

/// Factory for the collaborators bound to a unit at open time.
///
/// Only the bus side has to be provided; the control device defaults to the
/// kernel hwdep node at the given path.
pub trait FirewireBackend: Send + Sync {
    /// Open the control device at `path` for read/write.
    fn open_control_device(&self, path: &Path) -> Result<Box<dyn ControlDevice>> {
        Ok(Box::new(HwdepDevice::open(path)?))
    }

    /// Open and bind the bus unit on its special file.
    fn open_bus_unit(&self, path: &Path) -> Result<Arc<dyn BusUnit>>;

    /// Create the addressed transaction client bound to `unit`.
    fn transaction_client(&self, unit: &Arc<dyn BusUnit>) -> Result<Arc<dyn TransactionClient>>;

    /// Create the control protocol client bound to `unit`.
    fn control_protocol_client(
        &self,
        unit: &Arc<dyn BusUnit>,
    ) -> Result<Arc<dyn ControlProtocolClient>>;
}
