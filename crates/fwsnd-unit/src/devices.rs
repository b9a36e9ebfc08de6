//! Device variants a unit can be bound to.
//!
//! The variant is fixed when the unit is built. It decides which vendor
//! decoder, if any, receives vendor notification records, and which driver
//! type tag `open` accepts.
//!
//! # Examples
//!
//! ```
//! use fwsnd_unit::devices::UnitVariant;
//! use fwsnd_core::VendorFamily;
//!
//! let variant = UnitVariant::dice(|record: &[u8]| {
//!     println!("DICE notification of {} bytes", record.len());
//! });
//! assert_eq!(variant.family(), Some(VendorFamily::Dice));
//! assert_eq!(UnitVariant::Generic.family(), None);
//! ```

use crate::traits::NotificationDecoder;
use fwsnd_core::VendorFamily;
use std::fmt;
use std::sync::Arc;

/// Tagged device variant with its family decoder.
#[derive(Clone, Default)]
#[non_exhaustive]
pub enum UnitVariant {
    /// Any FireWire sound device; vendor notifications are dropped.
    #[default]
    Generic,

    /// TC Applied Technologies DICE device.
    Dice(Arc<dyn NotificationDecoder>),

    /// Echo Audio Fireworks device.
    Fireworks(Arc<dyn NotificationDecoder>),
}

impl UnitVariant {
    /// Bind a DICE decoder.
    pub fn dice(decoder: impl NotificationDecoder + 'static) -> Self {
        Self::Dice(Arc::new(decoder))
    }

    /// Bind a Fireworks decoder.
    pub fn fireworks(decoder: impl NotificationDecoder + 'static) -> Self {
        Self::Fireworks(Arc::new(decoder))
    }

    /// Vendor family of this variant.
    pub fn family(&self) -> Option<VendorFamily> {
        match self {
            Self::Generic => None,
            Self::Dice(_) => Some(VendorFamily::Dice),
            Self::Fireworks(_) => Some(VendorFamily::Fireworks),
        }
    }

    pub(crate) fn decoder(&self) -> Option<&Arc<dyn NotificationDecoder>> {
        match self {
            Self::Generic => None,
            Self::Dice(decoder) | Self::Fireworks(decoder) => Some(decoder),
        }
    }
}

impl fmt::Debug for UnitVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic => write!(f, "Generic"),
            Self::Dice(_) => write!(f, "Dice(..)"),
            Self::Fireworks(_) => write!(f, "Fireworks(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_has_no_decoder() {
        let variant = UnitVariant::default();
        assert!(variant.decoder().is_none());
        assert_eq!(format!("{variant:?}"), "Generic");
    }

    #[test]
    fn test_family_variants_carry_decoder() {
        let dice = UnitVariant::dice(|_: &[u8]| {});
        let efw = UnitVariant::fireworks(|_: &[u8]| {});

        assert!(dice.decoder().is_some());
        assert_eq!(efw.family(), Some(VendorFamily::Fireworks));
        assert_eq!(format!("{efw:?}"), "Fireworks(..)");
    }
}
