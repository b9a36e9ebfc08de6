//! Event listener and transaction dispatch for FireWire sound units.
//!
//! A [`SndUnit`] opens the ALSA hwdep control device of a FireWire sound
//! unit, identifies the device, binds the FireWire node behind it and keeps
//! two transaction clients on that node. While listening it receives
//! notification records from the kernel driver and turns them into events.
//!
//! # Collaborators
//!
//! Everything the unit talks to is behind a trait in [`traits`]:
//!
//! - [`ControlDevice`](traits::ControlDevice): the hwdep node. [`HwdepDevice`]
//!   is the real one.
//! - [`BusUnit`](traits::BusUnit), [`TransactionClient`](traits::TransactionClient)
//!   and [`ControlProtocolClient`](traits::ControlProtocolClient): the bus side,
//!   created by a [`FirewireBackend`](traits::FirewireBackend).
//! - [`Reactor`](reactor::Reactor): the readiness loop the unit registers with.
//!   [`PollReactor`](reactor::PollReactor) is a ready-made one.
//!
//! # Events
//!
//! Lock status records become `lock-status` events for every unit. Vendor
//! records are forwarded to the decoder of the unit's [`UnitVariant`] when the
//! family matches, and dropped otherwise. An error condition on the control
//! device ends listening and emits `disconnected`.
//!
//! ```
//! use fwsnd_unit::mock::{ManualReactor, MockBackend};
//! use fwsnd_unit::reactor::IoCondition;
//! use fwsnd_unit::SndUnit;
//! use fwsnd_core::DeviceIdentity;
//! use fwsnd_protocol::RecordBuilder;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! let backend = Arc::new(MockBackend::new());
//! let device = backend.add_device(
//!     "/dev/snd/hwC0D0",
//!     DeviceIdentity::from_raw_parts(1, 0, [0; 8], b"fw1"),
//! );
//! let reactor = Arc::new(ManualReactor::new());
//!
//! let unit = SndUnit::new(backend, reactor.clone());
//! unit.open("/dev/snd/hwC0D0").unwrap();
//!
//! let locked = Arc::new(AtomicBool::new(false));
//! let flag = Arc::clone(&locked);
//! unit.connect_lock_status(move |state| flag.store(state, Ordering::SeqCst));
//! unit.listen().unwrap();
//!
//! device.push_record(RecordBuilder::lock_status(true));
//! reactor.fire_all(IoCondition::READABLE);
//! assert!(locked.load(Ordering::SeqCst));
//! ```
//!
//! # Threading
//!
//! Handlers run on the reactor's thread. Transactions may be issued from any
//! thread, including from inside a handler.

pub mod decoders;
pub mod devices;
pub mod hwdep;
mod listener;
pub mod mock;
pub mod reactor;
pub mod router;
pub mod signals;
pub mod traits;
mod transaction;
pub mod unit;

pub use decoders::{DiceNotificationDecoder, EfwResponseDecoder};
pub use devices::UnitVariant;
pub use fwsnd_core::{DeviceIdentity, Error, FirewireType, Result, VendorFamily};
pub use hwdep::HwdepDevice;
pub use signals::{HandlerId, UnitEvent};
pub use unit::{SndUnit, SndUnitBuilder, UnitConfig};
