//! Mock control device.
//!
//! Simulates the hwdep node of a FireWire sound unit: GET_INFO, the
//! streaming lock shared with a simulated kernel driver, queued notification
//! records and captured writes. A [`MockControlHandle`] shares the state with
//! every device opened from it, so tests can drive and inspect the device
//! after the unit took ownership of it.

use super::MockFailure;
use crate::traits::ControlDevice;
use bytes::Bytes;
use fwsnd_core::{DeviceIdentity, Error, Result};
use nix::errno::Errno;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::os::fd::RawFd;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

static NEXT_FAKE_FD: AtomicI32 = AtomicI32::new(1000);

#[derive(Debug)]
struct ControlState {
    identity: DeviceIdentity,
    info_failure: Option<MockFailure>,
    held_by_us: bool,
    held_by_driver: bool,
    records: VecDeque<Bytes>,
    read_failure: Option<MockFailure>,
    written: Vec<Vec<u8>>,
    short_write: bool,
    lock_calls: usize,
    unlock_calls: usize,
    open_count: usize,
    close_count: usize,
}

/// Simulated control device.
///
/// # Examples
///
/// ```
/// use fwsnd_unit::mock::MockControlDevice;
/// use fwsnd_unit::traits::ControlDevice;
/// use fwsnd_core::DeviceIdentity;
///
/// let identity = DeviceIdentity::from_raw_parts(1, 0, [0; 8], b"fw1");
/// let (device, handle) = MockControlDevice::new(identity);
///
/// handle.set_held_by_driver(true);
/// assert!(device.lock().unwrap_err().is_busy());
/// ```
#[derive(Debug)]
pub struct MockControlDevice {
    fd: RawFd,
    state: Arc<Mutex<ControlState>>,
}

impl MockControlDevice {
    /// Create an open device reporting `identity`.
    pub fn new(identity: DeviceIdentity) -> (Self, MockControlHandle) {
        let handle = MockControlHandle::new(identity);
        (handle.open_device(), handle)
    }
}

impl ControlDevice for MockControlDevice {
    fn raw_fd(&self) -> RawFd {
        self.fd
    }

    fn get_info(&self) -> Result<DeviceIdentity> {
        let state = self.state.lock();
        match &state.info_failure {
            Some(failure) => Err(failure.to_error("GET_INFO")),
            None => Ok(state.identity.clone()),
        }
    }

    fn lock(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.lock_calls += 1;
        if state.held_by_us || state.held_by_driver {
            return Err(Error::io("LOCK", Errno::EBUSY));
        }
        state.held_by_us = true;
        Ok(())
    }

    fn unlock(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.unlock_calls += 1;
        if !state.held_by_us {
            return Err(Error::io("UNLOCK", Errno::EBADFD));
        }
        state.held_by_us = false;
        Ok(())
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.state.lock();
        if let Some(failure) = &state.read_failure {
            return Err(failure.to_error("read"));
        }

        let Some(record) = state.records.pop_front() else {
            return Ok(0);
        };
        let n = record.len().min(buf.len());
        buf[..n].copy_from_slice(&record[..n]);
        Ok(n)
    }

    fn write(&self, buf: &[u8]) -> Result<usize> {
        let mut state = self.state.lock();
        state.written.push(buf.to_vec());
        if state.short_write && !buf.is_empty() {
            return Ok(buf.len() - 1);
        }
        Ok(buf.len())
    }
}

impl Drop for MockControlDevice {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        // The kernel drops a lock held through a descriptor when it closes.
        state.held_by_us = false;
        state.close_count += 1;
    }
}

/// Handle for driving and inspecting mock control devices.
#[derive(Debug, Clone)]
pub struct MockControlHandle {
    state: Arc<Mutex<ControlState>>,
}

impl MockControlHandle {
    pub fn new(identity: DeviceIdentity) -> Self {
        Self {
            state: Arc::new(Mutex::new(ControlState {
                identity,
                info_failure: None,
                held_by_us: false,
                held_by_driver: false,
                records: VecDeque::new(),
                read_failure: None,
                written: Vec::new(),
                short_write: false,
                lock_calls: 0,
                unlock_calls: 0,
                open_count: 0,
                close_count: 0,
            })),
        }
    }

    /// Open a new device over the shared state.
    pub fn open_device(&self) -> MockControlDevice {
        self.state.lock().open_count += 1;
        MockControlDevice {
            fd: NEXT_FAKE_FD.fetch_add(1, Ordering::Relaxed),
            state: Arc::clone(&self.state),
        }
    }

    /// Queue a record for the next read.
    pub fn push_record(&self, record: impl Into<Bytes>) {
        self.state.lock().records.push_back(record.into());
    }

    pub fn pending_records(&self) -> usize {
        self.state.lock().records.len()
    }

    /// Simulate the kernel driver (or another process) holding the lock.
    pub fn set_held_by_driver(&self, held: bool) {
        self.state.lock().held_by_driver = held;
    }

    /// Whether a device opened from this handle holds the lock.
    pub fn is_locked_by_unit(&self) -> bool {
        self.state.lock().held_by_us
    }

    pub fn fail_get_info(&self, failure: Option<MockFailure>) {
        self.state.lock().info_failure = failure;
    }

    pub fn fail_reads(&self, failure: Option<MockFailure>) {
        self.state.lock().read_failure = failure;
    }

    /// Make every non-empty write come up one byte short.
    pub fn set_short_write(&self, short: bool) {
        self.state.lock().short_write = short;
    }

    pub fn written(&self) -> Vec<Vec<u8>> {
        self.state.lock().written.clone()
    }

    pub fn lock_calls(&self) -> usize {
        self.state.lock().lock_calls
    }

    pub fn unlock_calls(&self) -> usize {
        self.state.lock().unlock_calls
    }

    pub fn open_count(&self) -> usize {
        self.state.lock().open_count
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().close_count
    }

    /// Whether any device opened from this handle is still open.
    pub fn is_open(&self) -> bool {
        let state = self.state.lock();
        state.open_count > state.close_count
    }
}
