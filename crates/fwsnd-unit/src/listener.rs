//! Event listening on the control device.
//!
//! While listening, the unit holds a page-sized receive buffer and a reactor
//! registration for its control device, and both transaction clients process
//! their own events. Each readiness callback performs one read and routes the
//! record; an error condition tears listening down and reports `disconnected`.

use crate::reactor::{Dispatch, IoCondition, ReadinessHandler, SourceToken};
use crate::router;
use crate::signals::UnitEvent;
use crate::unit::{SndUnit, UnitInner, UnitState};
use bytes::Bytes;
use fwsnd_core::{Error, Result};
use nix::unistd::{SysconfVar, sysconf};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

const FALLBACK_PAGE_SIZE: usize = 4096;

pub(crate) struct Listener {
    token: SourceToken,
    buffer: Box<[u8]>,
}

fn page_size() -> usize {
    match sysconf(SysconfVar::PAGE_SIZE) {
        Ok(Some(size)) if size > 0 => size as usize,
        _ => FALLBACK_PAGE_SIZE,
    }
}

fn allocate_receive_buffer(len: usize) -> Result<Box<[u8]>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| Error::out_of_memory("receive buffer"))?;
    buffer.resize(len, 0);
    Ok(buffer.into_boxed_slice())
}

impl SndUnit {
    /// Start listening for events on the control device.
    ///
    /// Allocates the receive buffer, registers the control device with the
    /// reactor and starts both transaction clients. Then probes the streaming
    /// lock: if another consumer holds it the unit is marked streaming,
    /// otherwise the probe lock is released again. Listening on a unit that
    /// already listens is a no-op.
    ///
    /// # Errors
    ///
    /// - `Error::NotOpened` if the unit is not opened
    /// - `Error::OutOfMemory` if the buffer or reactor source cannot be allocated
    /// - any error of the bus unit or control protocol client; listening is
    ///   fully undone in that case
    pub fn listen(&self) -> Result<()> {
        self.inner.listen()
    }

    /// Stop listening. A no-op when not listening.
    ///
    /// Releases a streaming lock still held by this consumer, removes the
    /// reactor registration, frees the receive buffer and stops both
    /// transaction clients.
    pub fn unlisten(&self) {
        self.inner.unlisten();
    }

    /// Size of the receive buffer while listening.
    pub fn receive_buffer_len(&self) -> Option<usize> {
        let state = self.inner.state.lock();
        state.listener.as_ref().map(|listener| listener.buffer.len())
    }
}

impl UnitInner {
    fn listen(self: &Arc<Self>) -> Result<()> {
        let mut state = self.state.lock();
        let Some(binding) = state.binding.as_ref() else {
            return Err(Error::NotOpened);
        };
        if state.listener.is_some() {
            return Ok(());
        }

        let buffer = allocate_receive_buffer(page_size())?;
        let fd = binding.device.raw_fd();
        let bus = Arc::clone(&binding.bus);
        let fcp = Arc::clone(&binding.fcp);

        let source = Arc::new(UnitSource {
            unit: Arc::downgrade(self),
        });
        let token = self.reactor.register_readable(fd, source)?;
        state.listener = Some(Listener { token, buffer });

        if let Err(err) = bus.listen() {
            self.unlisten_locked(&mut state);
            return Err(err);
        }
        if let Err(err) = fcp.listen() {
            self.unlisten_locked(&mut state);
            return Err(err);
        }

        if let Some(binding) = state.binding.as_ref() {
            match binding.device.lock() {
                Ok(()) => {
                    if let Err(err) = binding.device.unlock() {
                        warn!("Failed to release probe lock: {}", err);
                    }
                }
                Err(err) if err.is_busy() => state.streaming = true,
                Err(err) => debug!("Lock probe failed: {}", err),
            }
        }

        debug!(
            "Listening on fd {} as source {} (streaming: {})",
            fd,
            token.as_u64(),
            state.streaming
        );
        Ok(())
    }

    pub(crate) fn unlisten(&self) {
        let mut state = self.state.lock();
        self.unlisten_locked(&mut state);
    }

    pub(crate) fn unlisten_locked(&self, state: &mut UnitState) {
        let Some(listener) = state.listener.take() else {
            return;
        };

        if let Some(binding) = state.binding.as_ref() {
            if state.streaming {
                if let Err(err) = binding.device.unlock() {
                    debug!("Unlock on unlisten failed: {}", err);
                }
            }

            self.reactor.unregister(listener.token);
            drop(listener);

            binding.fcp.unlisten();
            binding.bus.unlisten();
        } else {
            self.reactor.unregister(listener.token);
        }

        state.streaming = false;
        debug!("Stopped listening");
    }

    /// One read into the receive buffer, copied out so routing runs unlocked.
    fn receive(&self) -> Option<Bytes> {
        let mut state = self.state.lock();
        let UnitState {
            binding, listener, ..
        } = &mut *state;
        let (binding, listener) = (binding.as_ref()?, listener.as_mut()?);

        match binding.device.read(&mut listener.buffer) {
            Ok(0) => None,
            Ok(n) => Some(Bytes::copy_from_slice(&listener.buffer[..n])),
            Err(err) => {
                debug!("Read on control device failed: {}", err);
                None
            }
        }
    }
}

/// Reactor callback bound to one unit.
struct UnitSource {
    unit: Weak<UnitInner>,
}

impl ReadinessHandler for UnitSource {
    fn on_ready(&self, condition: IoCondition) -> Dispatch {
        let Some(unit) = self.unit.upgrade() else {
            return Dispatch::Continue;
        };

        if condition.error {
            let was_listening = unit.is_listening();
            unit.unlisten();
            if was_listening {
                unit.signals.emit(UnitEvent::Disconnected);
            }
            return Dispatch::Continue;
        }

        if condition.readable {
            if let Some(record) = unit.receive() {
                router::dispatch(&unit.variant, &unit.signals, &record);
            }
        }

        Dispatch::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_is_sane() {
        let size = page_size();
        assert!(size >= FALLBACK_PAGE_SIZE);
        assert!(size.is_power_of_two());
    }

    #[test]
    fn test_receive_buffer_is_zeroed() {
        let buffer = allocate_receive_buffer(64).unwrap();
        assert_eq!(buffer.len(), 64);
        assert!(buffer.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_oversized_buffer_is_out_of_memory() {
        let err = allocate_receive_buffer(usize::MAX).unwrap_err();
        assert!(matches!(err, Error::OutOfMemory { resource: "receive buffer" }));
    }
}
