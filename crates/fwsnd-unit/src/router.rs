//! Routing of received notification records.
//!
//! Lock status records are recognized first and unconditionally, so a vendor
//! decoder never sees them. Vendor records are forwarded only when the unit
//! is bound to the family that owns the discriminant. Everything else is
//! dropped without error.

use crate::devices::UnitVariant;
use crate::signals::{SignalHub, UnitEvent};
use fwsnd_core::VendorFamily;
use fwsnd_protocol::{LockStatus, NotificationRecord, RecordKind};
use tracing::trace;

/// Where a record goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Emit `lock-status` with the given state.
    LockStatus(bool),
    /// Forward the whole record to the family decoder.
    Vendor(VendorFamily),
    /// Not for this unit.
    Dropped,
}

/// Decide the route of `data` for a unit bound to `family`.
///
/// # Examples
///
/// ```
/// use fwsnd_unit::router::{Route, classify};
/// use fwsnd_protocol::RecordBuilder;
/// use fwsnd_core::VendorFamily;
///
/// let record = RecordBuilder::dice_notification(0x10);
/// assert_eq!(classify(Some(VendorFamily::Dice), &record), Route::Vendor(VendorFamily::Dice));
/// assert_eq!(classify(None, &record), Route::Dropped);
/// ```
pub fn classify(family: Option<VendorFamily>, data: &[u8]) -> Route {
    let Ok(record) = NotificationRecord::parse(data) else {
        return Route::Dropped;
    };

    if record.kind() == RecordKind::LockStatus {
        return match LockStatus::parse(&record) {
            Ok(status) => Route::LockStatus(status.locked),
            Err(_) => Route::Dropped,
        };
    }

    match family {
        Some(VendorFamily::Dice)
            if record.event_type() == VendorFamily::Dice.notification_type() =>
        {
            Route::Vendor(VendorFamily::Dice)
        }
        Some(VendorFamily::Fireworks)
            if record.event_type() == VendorFamily::Fireworks.notification_type() =>
        {
            Route::Vendor(VendorFamily::Fireworks)
        }
        _ => Route::Dropped,
    }
}

/// Classify `data` and deliver it.
pub(crate) fn dispatch(variant: &UnitVariant, signals: &SignalHub, data: &[u8]) -> Route {
    let route = classify(variant.family(), data);

    match route {
        Route::LockStatus(locked) => signals.emit(UnitEvent::LockStatus(locked)),
        Route::Vendor(_) => {
            if let Some(decoder) = variant.decoder() {
                decoder.handle_notification(data);
            }
        }
        Route::Dropped => trace!("Dropped record of {} bytes", data.len()),
    }

    route
}
