//! Observer registration for unit events.
//!
//! Handlers are kept in one list per event and invoked synchronously on the
//! reactor thread, in registration order. Async consumers can
//! [`subscribe`](crate::SndUnit::subscribe) instead and receive the same
//! events through a Tokio channel.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Identifies a connected handler so it can be disconnected later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Event emitted by a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitEvent {
    /// Kernel streaming lock changed. `true` when locked.
    LockStatus(bool),

    /// The control device reported an error while listening.
    Disconnected,
}

impl UnitEvent {
    /// Name of the signal carrying this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LockStatus(_) => "lock-status",
            Self::Disconnected => "disconnected",
        }
    }
}

type LockStatusHandler = Arc<dyn Fn(bool) + Send + Sync>;
type DisconnectedHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub(crate) struct SignalHub {
    next_id: AtomicU64,
    lock_status: Mutex<Vec<(HandlerId, LockStatusHandler)>>,
    disconnected: Mutex<Vec<(HandlerId, DisconnectedHandler)>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<UnitEvent>>>,
}

impl SignalHub {
    fn next_id(&self) -> HandlerId {
        HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn connect_lock_status(&self, handler: LockStatusHandler) -> HandlerId {
        let id = self.next_id();
        self.lock_status.lock().push((id, handler));
        id
    }

    pub(crate) fn connect_disconnected(&self, handler: DisconnectedHandler) -> HandlerId {
        let id = self.next_id();
        self.disconnected.lock().push((id, handler));
        id
    }

    pub(crate) fn disconnect(&self, id: HandlerId) -> bool {
        let mut lock_status = self.lock_status.lock();
        let before = lock_status.len();
        lock_status.retain(|(handler_id, _)| *handler_id != id);
        if lock_status.len() != before {
            return true;
        }
        drop(lock_status);

        let mut disconnected = self.disconnected.lock();
        let before = disconnected.len();
        disconnected.retain(|(handler_id, _)| *handler_id != id);
        disconnected.len() != before
    }

    pub(crate) fn subscribe(&self) -> mpsc::UnboundedReceiver<UnitEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    pub(crate) fn emit(&self, event: UnitEvent) {
        // Handlers run without the list locked so they may (dis)connect.
        match event {
            UnitEvent::LockStatus(locked) => {
                let handlers: Vec<_> = self
                    .lock_status
                    .lock()
                    .iter()
                    .map(|(_, handler)| Arc::clone(handler))
                    .collect();
                for handler in handlers {
                    handler(locked);
                }
            }
            UnitEvent::Disconnected => {
                let handlers: Vec<_> = self
                    .disconnected
                    .lock()
                    .iter()
                    .map(|(_, handler)| Arc::clone(handler))
                    .collect();
                for handler in handlers {
                    handler();
                }
            }
        }

        self.subscribers
            .lock()
            .retain(|tx| tx.send(event).is_ok());
    }
}
