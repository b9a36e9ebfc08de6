use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Driver family reported by the kernel in the `type` field of GET_INFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FirewireType {
    Dice,
    Fireworks,
    Bebob,
    Oxfw,
    Digi00x,
    Tascam,
    Motu,
    Fireface,
    /// A tag this crate does not know about yet.
    Unknown(u32),
}

impl FirewireType {
    /// Map a raw type tag to a known driver family.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            TYPE_DICE => Self::Dice,
            TYPE_FIREWORKS => Self::Fireworks,
            TYPE_BEBOB => Self::Bebob,
            TYPE_OXFW => Self::Oxfw,
            TYPE_DIGI00X => Self::Digi00x,
            TYPE_TASCAM => Self::Tascam,
            TYPE_MOTU => Self::Motu,
            TYPE_FIREFACE => Self::Fireface,
            other => Self::Unknown(other),
        }
    }

    /// Raw type tag as used by the kernel.
    pub fn as_raw(&self) -> u32 {
        match self {
            Self::Dice => TYPE_DICE,
            Self::Fireworks => TYPE_FIREWORKS,
            Self::Bebob => TYPE_BEBOB,
            Self::Oxfw => TYPE_OXFW,
            Self::Digi00x => TYPE_DIGI00X,
            Self::Tascam => TYPE_TASCAM,
            Self::Motu => TYPE_MOTU,
            Self::Fireface => TYPE_FIREFACE,
            Self::Unknown(raw) => *raw,
        }
    }
}

impl fmt::Display for FirewireType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Dice => write!(f, "DICE"),
            Self::Fireworks => write!(f, "Fireworks"),
            Self::Bebob => write!(f, "BeBoB"),
            Self::Oxfw => write!(f, "OXFW"),
            Self::Digi00x => write!(f, "Digi00x"),
            Self::Tascam => write!(f, "TASCAM"),
            Self::Motu => write!(f, "MOTU"),
            Self::Fireface => write!(f, "Fireface"),
            Self::Unknown(raw) => write!(f, "unknown({raw})"),
        }
    }
}

/// Vendor family whose notifications share the control device channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VendorFamily {
    /// TC Applied Technologies DICE.
    Dice,
    /// Echo Audio Fireworks.
    Fireworks,
}

impl VendorFamily {
    /// Record discriminant carrying this family's notifications.
    pub fn notification_type(&self) -> u32 {
        match self {
            Self::Dice => EVENT_DICE_NOTIFICATION,
            Self::Fireworks => EVENT_EFW_RESPONSE,
        }
    }

    /// Driver type the kernel reports for devices of this family.
    pub fn firewire_type(&self) -> FirewireType {
        match self {
            Self::Dice => FirewireType::Dice,
            Self::Fireworks => FirewireType::Fireworks,
        }
    }
}

/// Identity of an opened control device, read once with GET_INFO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Raw driver type tag.
    pub fw_type: u32,

    /// ALSA card index.
    pub card: i32,

    /// Name of the FireWire character device backing this unit (`fw1`).
    pub device_name: String,

    /// Globally unique identifier in host order.
    pub guid: u64,
}

impl DeviceIdentity {
    /// Build an identity from the fields of `snd_firewire_get_info`.
    ///
    /// The GUID is stored big-endian by the kernel. The device name is a
    /// NUL-terminated byte array bounded by [`DEVICE_NAME_CAPACITY`].
    ///
    /// # Examples
    ///
    /// ```
    /// use fwsnd_core::DeviceIdentity;
    ///
    /// let guid = [0x00, 0x13, 0x95, 0x00, 0x01, 0x02, 0x03, 0x04];
    /// let identity = DeviceIdentity::from_raw_parts(1, 2, guid, b"fw1\0\0\0");
    /// assert_eq!(identity.guid, 0x0013_9500_0102_0304);
    /// assert_eq!(identity.device_name, "fw1");
    /// ```
    pub fn from_raw_parts(fw_type: u32, card: i32, guid: [u8; GUID_SIZE], name: &[u8]) -> Self {
        let bounded = &name[..name.len().min(DEVICE_NAME_CAPACITY)];
        let end = bounded.iter().position(|&b| b == 0).unwrap_or(bounded.len());

        Self {
            fw_type,
            card,
            device_name: String::from_utf8_lossy(&bounded[..end]).into_owned(),
            guid: u64::from_be_bytes(guid),
        }
    }

    /// Typed view of the driver type tag.
    pub fn firewire_type(&self) -> FirewireType {
        FirewireType::from_raw(self.fw_type)
    }
}
