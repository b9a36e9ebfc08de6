//! Wire format of notification records read from an ALSA FireWire control device.
//!
//! A record is one `read(2)` worth of bytes: a native-endian 32-bit type
//! discriminant followed by a payload whose shape depends on the type. This
//! crate classifies records by their header and offers typed views for the
//! payloads it knows, plus a builder that produces the same layout.

pub mod builder;
pub mod record;

pub use builder::RecordBuilder;
pub use record::{DiceNotification, EfwResponse, LockStatus, NotificationRecord, RecordKind};
