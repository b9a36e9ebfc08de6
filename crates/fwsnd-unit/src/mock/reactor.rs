//! Reactor that only dispatches when told to.

use crate::reactor::{Dispatch, IoCondition, Reactor, ReadinessHandler, SourceToken};
use fwsnd_core::{Error, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::os::fd::RawFd;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Reactor driven by the test: readiness is injected with [`fire`](Self::fire).
///
/// # Examples
///
/// ```
/// use fwsnd_unit::mock::ManualReactor;
/// use fwsnd_unit::reactor::IoCondition;
///
/// let reactor = ManualReactor::new();
/// assert!(reactor.tokens().is_empty());
/// assert_eq!(reactor.fire_all(IoCondition::READABLE), 0);
/// ```
#[derive(Default)]
pub struct ManualReactor {
    sources: Mutex<BTreeMap<SourceToken, (RawFd, Arc<dyn ReadinessHandler>)>>,
    next_token: AtomicU64,
    registrations: AtomicUsize,
    fail_registrations: AtomicBool,
}

impl ManualReactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make registrations fail with `Error::OutOfMemory`.
    pub fn set_fail_registrations(&self, fail: bool) {
        self.fail_registrations.store(fail, Ordering::SeqCst);
    }

    /// Invoke the handler of `token`. Returns `None` for an unknown token.
    pub fn fire(&self, token: SourceToken, condition: IoCondition) -> Option<Dispatch> {
        let handler = self
            .sources
            .lock()
            .get(&token)
            .map(|(_, handler)| Arc::clone(handler))?;

        let dispatch = handler.on_ready(condition);
        if dispatch == Dispatch::Remove {
            self.unregister(token);
        }
        Some(dispatch)
    }

    /// Fire every active source once. Returns the number of callbacks.
    pub fn fire_all(&self, condition: IoCondition) -> usize {
        self.tokens()
            .into_iter()
            .filter_map(|token| self.fire(token, condition))
            .count()
    }

    pub fn tokens(&self) -> Vec<SourceToken> {
        self.sources.lock().keys().copied().collect()
    }

    pub fn fd_of(&self, token: SourceToken) -> Option<RawFd> {
        self.sources.lock().get(&token).map(|(fd, _)| *fd)
    }

    /// Total number of successful registrations so far.
    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }
}

impl Reactor for ManualReactor {
    fn register_readable(
        &self,
        fd: RawFd,
        handler: Arc<dyn ReadinessHandler>,
    ) -> Result<SourceToken> {
        if self.fail_registrations.load(Ordering::SeqCst) {
            return Err(Error::out_of_memory("reactor source"));
        }

        let token = SourceToken::new(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.sources.lock().insert(token, (fd, handler));
        self.registrations.fetch_add(1, Ordering::SeqCst);
        Ok(token)
    }

    fn unregister(&self, token: SourceToken) -> bool {
        self.sources.lock().remove(&token).is_some()
    }
}

impl std::fmt::Debug for ManualReactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualReactor")
            .field("sources", &self.tokens())
            .finish()
    }
}
