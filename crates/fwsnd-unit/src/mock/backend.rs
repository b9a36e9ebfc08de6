//! Mock backend wiring mock devices and bus-side collaborators together.

use super::{
    EchoControlProtocol, LoopbackTransactions, MockBusUnit, MockControlHandle, MockFailure,
};
use crate::traits::{BusUnit, ControlDevice, ControlProtocolClient, FirewireBackend, TransactionClient};
use fwsnd_core::{DeviceIdentity, Error, Result};
use nix::errno::Errno;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct BackendState {
    devices: HashMap<PathBuf, MockControlHandle>,
    bus_open_failure: Option<MockFailure>,
    bus_listen_failure: Option<MockFailure>,
    fcp_listen_failure: Option<MockFailure>,
    opened_bus_paths: Vec<PathBuf>,
    last_bus: Option<Arc<MockBusUnit>>,
    last_transactions: Option<Arc<LoopbackTransactions>>,
    last_control_protocol: Option<Arc<EchoControlProtocol>>,
}

/// Backend serving [`MockControlDevice`](super::MockControlDevice)s by path.
///
/// Every bus unit and client it creates is remembered so tests can inspect
/// them and check that the unit released them.
///
/// # Examples
///
/// ```
/// use fwsnd_unit::mock::{ManualReactor, MockBackend};
/// use fwsnd_unit::SndUnit;
/// use fwsnd_core::DeviceIdentity;
/// use std::sync::Arc;
///
/// let backend = Arc::new(MockBackend::new());
/// let handle = backend.add_device(
///     "/dev/snd/hwC0D0",
///     DeviceIdentity::from_raw_parts(3, 0, [0, 0, 0, 0, 0, 0, 0, 1], b"fw1"),
/// );
///
/// let unit = SndUnit::new(backend.clone(), Arc::new(ManualReactor::new()));
/// unit.open("/dev/snd/hwC0D0").unwrap();
///
/// assert!(handle.is_open());
/// assert_eq!(unit.guid(), Some(1));
/// ```
#[derive(Debug, Default)]
pub struct MockBackend {
    state: Mutex<BackendState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a device reporting `identity` at `path`.
    pub fn add_device(&self, path: impl Into<PathBuf>, identity: DeviceIdentity) -> MockControlHandle {
        let handle = MockControlHandle::new(identity);
        self.state
            .lock()
            .devices
            .insert(path.into(), handle.clone());
        handle
    }

    pub fn fail_bus_open(&self, failure: Option<MockFailure>) {
        self.state.lock().bus_open_failure = failure;
    }

    /// Bus units created from now on fail to listen.
    pub fn fail_bus_listen(&self, failure: Option<MockFailure>) {
        self.state.lock().bus_listen_failure = failure;
    }

    /// Control protocol clients created from now on fail to listen.
    pub fn fail_control_protocol_listen(&self, failure: Option<MockFailure>) {
        self.state.lock().fcp_listen_failure = failure;
    }

    /// Paths of every bus unit opened so far.
    pub fn opened_bus_paths(&self) -> Vec<PathBuf> {
        self.state.lock().opened_bus_paths.clone()
    }

    pub fn last_bus(&self) -> Option<Arc<MockBusUnit>> {
        self.state.lock().last_bus.clone()
    }

    pub fn last_transactions(&self) -> Option<Arc<LoopbackTransactions>> {
        self.state.lock().last_transactions.clone()
    }

    pub fn last_control_protocol(&self) -> Option<Arc<EchoControlProtocol>> {
        self.state.lock().last_control_protocol.clone()
    }
}

impl FirewireBackend for MockBackend {
    fn open_control_device(&self, path: &Path) -> Result<Box<dyn ControlDevice>> {
        let state = self.state.lock();
        let handle = state
            .devices
            .get(path)
            .ok_or(Error::io("open", Errno::ENOENT))?;
        debug!("Opened mock control device {}", path.display());
        Ok(Box::new(handle.open_device()))
    }

    fn open_bus_unit(&self, path: &Path) -> Result<Arc<dyn BusUnit>> {
        let mut state = self.state.lock();
        if let Some(failure) = &state.bus_open_failure {
            return Err(failure.to_error("bus open"));
        }

        let mut bus = MockBusUnit::new(path);
        if let Some(failure) = state.bus_listen_failure.clone() {
            bus = bus.with_listen_failure(failure);
        }
        let bus = Arc::new(bus);

        state.opened_bus_paths.push(path.to_path_buf());
        state.last_bus = Some(Arc::clone(&bus));
        Ok(bus)
    }

    fn transaction_client(&self, _unit: &Arc<dyn BusUnit>) -> Result<Arc<dyn TransactionClient>> {
        let req = Arc::new(LoopbackTransactions::new());
        self.state.lock().last_transactions = Some(Arc::clone(&req));
        Ok(req)
    }

    fn control_protocol_client(
        &self,
        _unit: &Arc<dyn BusUnit>,
    ) -> Result<Arc<dyn ControlProtocolClient>> {
        let mut state = self.state.lock();
        let mut fcp = EchoControlProtocol::new();
        if let Some(failure) = state.fcp_listen_failure.clone() {
            fcp = fcp.with_listen_failure(failure);
        }
        let fcp = Arc::new(fcp);

        state.last_control_protocol = Some(Arc::clone(&fcp));
        Ok(fcp)
    }
}
