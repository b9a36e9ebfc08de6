//! Mock bus unit and transaction clients.

use super::MockFailure;
use crate::traits::{BusUnit, ControlProtocolClient, TransactionClient};
use fwsnd_core::Result;
use nix::errno::Errno;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
struct ListenState {
    listening: bool,
    listen_calls: usize,
    unlisten_calls: usize,
    listen_failure: Option<MockFailure>,
}

impl ListenState {
    fn listen(&mut self, operation: &'static str) -> Result<()> {
        self.listen_calls += 1;
        if let Some(failure) = &self.listen_failure {
            return Err(failure.to_error(operation));
        }
        self.listening = true;
        Ok(())
    }

    fn unlisten(&mut self) {
        self.unlisten_calls += 1;
        self.listening = false;
    }
}

/// Simulated FireWire node.
#[derive(Debug)]
pub struct MockBusUnit {
    path: PathBuf,
    state: Mutex<ListenState>,
}

impl MockBusUnit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(ListenState::default()),
        }
    }

    pub fn with_listen_failure(self, failure: MockFailure) -> Self {
        self.state.lock().listen_failure = Some(failure);
        self
    }

    pub fn is_listening(&self) -> bool {
        self.state.lock().listening
    }

    pub fn listen_calls(&self) -> usize {
        self.state.lock().listen_calls
    }

    pub fn unlisten_calls(&self) -> usize {
        self.state.lock().unlisten_calls
    }
}

impl BusUnit for MockBusUnit {
    fn path(&self) -> &Path {
        &self.path
    }

    fn listen(&self) -> Result<()> {
        self.state.lock().listen("bus listen")
    }

    fn unlisten(&self) {
        self.state.lock().unlisten();
    }
}

/// Transaction client over a sparse byte-addressed memory.
///
/// Lock frames carry the compare value in their first half and the swap
/// value in their second half; the response is the previous content.
#[derive(Debug, Default)]
pub struct LoopbackTransactions {
    memory: Mutex<HashMap<u64, u8>>,
    failure: Mutex<Option<MockFailure>>,
}

impl LoopbackTransactions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following transaction fail, or succeed again with `None`.
    pub fn set_failure(&self, failure: Option<MockFailure>) {
        *self.failure.lock() = failure;
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        match &*self.failure.lock() {
            Some(failure) => Err(failure.to_error(operation)),
            None => Ok(()),
        }
    }
}

fn load(memory: &HashMap<u64, u8>, addr: u64, length: usize) -> Vec<u8> {
    (0..length as u64)
        .map(|offset| memory.get(&(addr + offset)).copied().unwrap_or(0))
        .collect()
}

fn store(memory: &mut HashMap<u64, u8>, addr: u64, frame: &[u8]) {
    for (offset, byte) in frame.iter().enumerate() {
        memory.insert(addr + offset as u64, *byte);
    }
}

impl TransactionClient for LoopbackTransactions {
    fn read(&self, addr: u64, length: usize) -> Result<Vec<u8>> {
        self.check("read transaction")?;
        Ok(load(&self.memory.lock(), addr, length))
    }

    fn write(&self, addr: u64, frame: &[u8]) -> Result<()> {
        self.check("write transaction")?;
        store(&mut self.memory.lock(), addr, frame);
        Ok(())
    }

    fn lock(&self, addr: u64, frame: &[u8]) -> Result<Vec<u8>> {
        self.check("lock transaction")?;
        if frame.is_empty() || frame.len() % 2 != 0 {
            return Err(MockFailure::Errno(Errno::EINVAL).to_error("lock transaction"));
        }

        let (compare, swap) = frame.split_at(frame.len() / 2);
        let mut memory = self.memory.lock();
        let old = load(&memory, addr, compare.len());
        if old == compare {
            store(&mut memory, addr, swap);
        }
        Ok(old)
    }
}

/// FCP client answering with scripted responses, or echoing the request.
#[derive(Debug, Default)]
pub struct EchoControlProtocol {
    state: Mutex<ListenState>,
    requests: Mutex<Vec<Vec<u8>>>,
    responses: Mutex<VecDeque<Vec<u8>>>,
    failure: Mutex<Option<MockFailure>>,
}

impl EchoControlProtocol {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listen_failure(self, failure: MockFailure) -> Self {
        self.state.lock().listen_failure = Some(failure);
        self
    }

    /// Answer the next request with `response`.
    pub fn push_response(&self, response: impl Into<Vec<u8>>) {
        self.responses.lock().push_back(response.into());
    }

    pub fn set_failure(&self, failure: Option<MockFailure>) {
        *self.failure.lock() = failure;
    }

    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.requests.lock().clone()
    }

    pub fn is_listening(&self) -> bool {
        self.state.lock().listening
    }

    pub fn listen_calls(&self) -> usize {
        self.state.lock().listen_calls
    }

    pub fn unlisten_calls(&self) -> usize {
        self.state.lock().unlisten_calls
    }
}

impl ControlProtocolClient for EchoControlProtocol {
    fn listen(&self) -> Result<()> {
        self.state.lock().listen("fcp listen")
    }

    fn unlisten(&self) {
        self.state.lock().unlisten();
    }

    fn transact(&self, request: &[u8]) -> Result<Vec<u8>> {
        if let Some(failure) = &*self.failure.lock() {
            return Err(failure.to_error("fcp transaction"));
        }

        self.requests.lock().push(request.to_vec());
        Ok(self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| request.to_vec()))
    }
}
