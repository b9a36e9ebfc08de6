//! Readiness reactor abstraction.
//!
//! A unit does not own an event loop. It registers its control device with
//! an injected [`Reactor`] for readable interest and gets called back on the
//! reactor's thread when the descriptor becomes ready or reports an error.
//!
//! [`PollReactor`] is a concrete single-threaded reactor over `poll(2)`:
//!
//! ```no_run
//! use fwsnd_unit::reactor::PollReactor;
//! use std::sync::Arc;
//!
//! # fn main() -> fwsnd_core::Result<()> {
//! let reactor = Arc::new(PollReactor::new()?);
//!
//! let worker = Arc::clone(&reactor);
//! let thread = std::thread::spawn(move || worker.run());
//!
//! // register units against `reactor` ...
//!
//! reactor.quit();
//! thread.join().unwrap()?;
//! # Ok(())
//! # }
//! ```

use fwsnd_core::{Error, Result};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::{AsFd, BorrowedFd, RawFd};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

/// Opaque identifier of a reactor registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceToken(u64);

impl SourceToken {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Condition observed on a registered descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IoCondition {
    /// Data can be read without blocking.
    pub readable: bool,

    /// Error or hang-up reported for the descriptor.
    pub error: bool,
}

impl IoCondition {
    pub const READABLE: Self = Self {
        readable: true,
        error: false,
    };

    pub const ERROR: Self = Self {
        readable: false,
        error: true,
    };

    fn from_poll_flags(flags: PollFlags) -> Self {
        Self {
            readable: flags.contains(PollFlags::POLLIN),
            error: flags.intersects(PollFlags::POLLERR | PollFlags::POLLHUP | PollFlags::POLLNVAL),
        }
    }
}

/// What the reactor does with a source after a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Keep monitoring the descriptor.
    Continue,
    /// Drop the registration.
    Remove,
}

/// Callback invoked by a reactor when a registered descriptor is ready.
pub trait ReadinessHandler: Send + Sync {
    fn on_ready(&self, condition: IoCondition) -> Dispatch;
}

/// Registration interface of a readiness reactor.
///
/// Handlers run to completion on the reactor's thread. A handler may
/// unregister any source, itself included, while it runs.
pub trait Reactor: Send + Sync {
    /// Watch `fd` for readable interest.
    ///
    /// The caller keeps `fd` open until it unregisters the returned token.
    ///
    /// # Errors
    ///
    /// Returns an error if the registration cannot be created.
    fn register_readable(
        &self,
        fd: RawFd,
        handler: Arc<dyn ReadinessHandler>,
    ) -> Result<SourceToken>;

    /// Revoke a registration. Returns `false` when the token is unknown.
    fn unregister(&self, token: SourceToken) -> bool;
}

struct Source {
    fd: RawFd,
    handler: Arc<dyn ReadinessHandler>,
}

/// Single-threaded reactor over `poll(2)`.
///
/// Waits indefinitely while idle. A self-pipe wakes the wait when sources
/// change or [`quit`](Self::quit) is called from another thread.
pub struct PollReactor {
    sources: Mutex<BTreeMap<SourceToken, Source>>,
    next_token: AtomicU64,
    waker_rx: File,
    waker_tx: File,
    quit: AtomicBool,
}

impl PollReactor {
    /// Create a reactor with no sources.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the wake-up pipe cannot be created.
    pub fn new() -> Result<Self> {
        let (rx, tx) = nix::unistd::pipe2(OFlag::O_NONBLOCK | OFlag::O_CLOEXEC)
            .map_err(|errno| Error::io("pipe2", errno))?;

        Ok(Self {
            sources: Mutex::new(BTreeMap::new()),
            next_token: AtomicU64::new(1),
            waker_rx: File::from(rx),
            waker_tx: File::from(tx),
            quit: AtomicBool::new(false),
        })
    }

    /// Number of active registrations.
    pub fn source_count(&self) -> usize {
        self.sources.lock().len()
    }

    /// Wait for readiness once and dispatch every ready source.
    ///
    /// `None` waits indefinitely. Returns the number of callbacks invoked.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if `poll(2)` fails with anything but `EINTR`.
    pub fn iterate(&self, timeout: Option<Duration>) -> Result<usize> {
        let snapshot: Vec<(SourceToken, RawFd, Arc<dyn ReadinessHandler>)> = self
            .sources
            .lock()
            .iter()
            .map(|(token, source)| (*token, source.fd, Arc::clone(&source.handler)))
            .collect();

        let mut fds = Vec::with_capacity(snapshot.len() + 1);
        fds.push(PollFd::new(self.waker_rx.as_fd(), PollFlags::POLLIN));
        for (_, fd, _) in &snapshot {
            // SAFETY: registrants keep the descriptor open until they unregister.
            let borrowed = unsafe { BorrowedFd::borrow_raw(*fd) };
            fds.push(PollFd::new(borrowed, PollFlags::POLLIN));
        }

        let timeout = match timeout {
            None => PollTimeout::NONE,
            Some(duration) => i32::try_from(duration.as_millis())
                .ok()
                .and_then(|ms| PollTimeout::try_from(ms).ok())
                .unwrap_or(PollTimeout::MAX),
        };

        match poll(&mut fds, timeout) {
            Ok(0) => return Ok(0),
            Ok(_) => {}
            Err(Errno::EINTR) => return Ok(0),
            Err(errno) => return Err(Error::io("poll", errno)),
        }

        let revents: Vec<PollFlags> = fds
            .iter()
            .map(|fd| fd.revents().unwrap_or(PollFlags::empty()))
            .collect();
        drop(fds);

        if revents[0].contains(PollFlags::POLLIN) {
            self.drain_waker();
        }

        let mut dispatched = 0;
        for ((token, _, handler), flags) in snapshot.into_iter().zip(revents.into_iter().skip(1)) {
            if flags.is_empty() {
                continue;
            }

            // An earlier callback in this round may have revoked it.
            if !self.sources.lock().contains_key(&token) {
                continue;
            }

            let condition = IoCondition::from_poll_flags(flags);
            trace!("Dispatching source {} with {:?}", token.as_u64(), condition);
            dispatched += 1;

            if handler.on_ready(condition) == Dispatch::Remove {
                self.unregister(token);
            }
        }

        Ok(dispatched)
    }

    /// Iterate until [`quit`](Self::quit) is called.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`iterate`](Self::iterate).
    pub fn run(&self) -> Result<()> {
        debug!("Reactor loop started");
        while !self.quit.swap(false, Ordering::AcqRel) {
            self.iterate(None)?;
        }
        debug!("Reactor loop stopped");
        Ok(())
    }

    /// Make a running [`run`](Self::run) loop return.
    pub fn quit(&self) {
        self.quit.store(true, Ordering::Release);
        self.wake();
    }

    fn wake(&self) {
        // A full pipe already guarantees a pending wake-up.
        let _ = (&self.waker_tx).write(&[1]);
    }

    fn drain_waker(&self) {
        let mut scratch = [0u8; 64];
        while let Ok(n) = (&self.waker_rx).read(&mut scratch) {
            if n == 0 {
                break;
            }
        }
    }
}

impl Reactor for PollReactor {
    fn register_readable(
        &self,
        fd: RawFd,
        handler: Arc<dyn ReadinessHandler>,
    ) -> Result<SourceToken> {
        let token = SourceToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.sources.lock().insert(token, Source { fd, handler });
        debug!("Registered fd {} as source {}", fd, token.as_u64());
        self.wake();
        Ok(token)
    }

    fn unregister(&self, token: SourceToken) -> bool {
        let removed = self.sources.lock().remove(&token).is_some();
        if removed {
            debug!("Unregistered source {}", token.as_u64());
            self.wake();
        }
        removed
    }
}

impl std::fmt::Debug for PollReactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollReactor")
            .field("sources", &self.source_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::fd::AsRawFd;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Recorder {
        conditions: Mutex<Vec<IoCondition>>,
        remove_after: Option<usize>,
        calls: AtomicUsize,
    }

    impl ReadinessHandler for Recorder {
        fn on_ready(&self, condition: IoCondition) -> Dispatch {
            self.conditions.lock().push(condition);
            let calls = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            match self.remove_after {
                Some(limit) if calls >= limit => Dispatch::Remove,
                _ => Dispatch::Continue,
            }
        }
    }

    fn pipe() -> (File, File) {
        let (rx, tx) = nix::unistd::pipe2(OFlag::O_CLOEXEC).unwrap();
        (File::from(rx), File::from(tx))
    }

    #[test]
    fn test_iterate_times_out_without_sources() {
        let reactor = PollReactor::new().unwrap();
        let dispatched = reactor.iterate(Some(Duration::from_millis(10))).unwrap();
        assert_eq!(dispatched, 0);
    }

    #[test]
    fn test_readable_source_is_dispatched() {
        let reactor = PollReactor::new().unwrap();
        let (rx, mut tx) = pipe();
        let recorder = Arc::new(Recorder::default());

        let token = reactor
            .register_readable(rx.as_raw_fd(), recorder.clone())
            .unwrap();
        assert_eq!(reactor.source_count(), 1);

        tx.write_all(&[0xaa]).unwrap();
        let dispatched = reactor.iterate(Some(Duration::from_secs(1))).unwrap();

        assert_eq!(dispatched, 1);
        assert_eq!(recorder.conditions.lock()[0], IoCondition::READABLE);
        assert!(reactor.unregister(token));
        assert!(!reactor.unregister(token));
    }

    #[test]
    fn test_hangup_is_reported_as_error() {
        let reactor = PollReactor::new().unwrap();
        let (rx, tx) = pipe();
        let recorder = Arc::new(Recorder::default());

        reactor
            .register_readable(rx.as_raw_fd(), recorder.clone())
            .unwrap();
        drop(tx);

        reactor.iterate(Some(Duration::from_secs(1))).unwrap();
        assert!(recorder.conditions.lock()[0].error);
    }

    #[test]
    fn test_remove_drops_registration() {
        let reactor = PollReactor::new().unwrap();
        let (rx, mut tx) = pipe();
        let recorder = Arc::new(Recorder {
            remove_after: Some(1),
            ..Default::default()
        });

        reactor
            .register_readable(rx.as_raw_fd(), recorder.clone())
            .unwrap();
        tx.write_all(&[1]).unwrap();

        reactor.iterate(Some(Duration::from_secs(1))).unwrap();
        assert_eq!(reactor.source_count(), 0);

        // Still readable, but nobody is watching any more.
        let dispatched = reactor.iterate(Some(Duration::from_millis(10))).unwrap();
        assert_eq!(dispatched, 0);
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_quit_interrupts_indefinite_wait() {
        let reactor = Arc::new(PollReactor::new().unwrap());
        let worker = Arc::clone(&reactor);
        let thread = std::thread::spawn(move || worker.run());

        std::thread::sleep(Duration::from_millis(20));
        reactor.quit();

        thread.join().unwrap().unwrap();
    }
}
