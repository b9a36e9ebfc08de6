//! Transactions through the collaborators bound at open time.
//!
//! Each call clones the client or device out of the unit state and runs
//! without the state locked, so a blocking transaction never stalls event
//! dispatch. The clones are dropped before the call returns; the unit stays
//! the only long-lived owner.

use crate::traits::{ControlProtocolClient, TransactionClient};
use crate::unit::SndUnit;
use fwsnd_core::{Error, Result};
use nix::errno::Errno;
use std::sync::Arc;
use tracing::trace;

impl SndUnit {
    /// Read `length` bytes at `addr` on the bound bus unit.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotOpened` if the unit is not opened, otherwise the
    /// transaction client's error unchanged.
    pub fn read_transaction(&self, addr: u64, length: usize) -> Result<Vec<u8>> {
        trace!("read transaction at {:#014x}, {} bytes", addr, length);
        self.transaction_client()?.read(addr, length)
    }

    /// Write `frame` at `addr` on the bound bus unit.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotOpened` if the unit is not opened, otherwise the
    /// transaction client's error unchanged.
    pub fn write_transaction(&self, addr: u64, frame: &[u8]) -> Result<()> {
        trace!("write transaction at {:#014x}, {} bytes", addr, frame.len());
        self.transaction_client()?.write(addr, frame)
    }

    /// Lock transaction at `addr`. Returns the response frame.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotOpened` if the unit is not opened, otherwise the
    /// transaction client's error unchanged.
    pub fn lock_transaction(&self, addr: u64, frame: &[u8]) -> Result<Vec<u8>> {
        trace!("lock transaction at {:#014x}, {} bytes", addr, frame.len());
        self.transaction_client()?.lock(addr, frame)
    }

    /// Send an FCP request and wait for its response.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotOpened` if the unit is not opened, otherwise the
    /// control protocol client's error unchanged.
    pub fn control_protocol_transact(&self, request: &[u8]) -> Result<Vec<u8>> {
        self.control_protocol_client()?.transact(request)
    }

    /// Write a raw frame to the control device.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the write fails or is short.
    pub fn write_raw(&self, frame: &[u8]) -> Result<()> {
        let device = {
            let state = self.inner.state.lock();
            let binding = state.binding.as_ref().ok_or(Error::NotOpened)?;
            Arc::clone(&binding.device)
        };

        let written = device.write(frame)?;
        if written != frame.len() {
            return Err(Error::io("write", Errno::EIO));
        }
        Ok(())
    }

    fn transaction_client(&self) -> Result<Arc<dyn TransactionClient>> {
        let state = self.inner.state.lock();
        state
            .binding
            .as_ref()
            .map(|binding| Arc::clone(&binding.req))
            .ok_or(Error::NotOpened)
    }

    fn control_protocol_client(&self) -> Result<Arc<dyn ControlProtocolClient>> {
        let state = self.inner.state.lock();
        state
            .binding
            .as_ref()
            .map(|binding| Arc::clone(&binding.fcp))
            .ok_or(Error::NotOpened)
    }
}
