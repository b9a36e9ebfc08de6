//! Kernel ABI constants for the ALSA FireWire hwdep interface.
//!
//! These values mirror `<sound/firewire.h>`. They define the ioctl numbers
//! used on the control device, the type discriminants that lead every
//! notification record read from it, and the type tags the kernel reports
//! for each driver family.
//!
//! # Record Layout
//!
//! Every record read from the control device starts with a native-endian
//! 32-bit type discriminant, followed by a type-dependent payload:
//!
//! ```text
//! +----------------+-------------------------------+
//! | type (u32, NE) | payload (type dependent)      |
//! +----------------+-------------------------------+
//! ```
//!
//! | Type                  | Payload                                   |
//! |-----------------------|-------------------------------------------|
//! | `EVENT_LOCK_STATUS`   | `status: u32` (non-zero when locked)      |
//! | `EVENT_DICE_NOTIFICATION` | `notification: u32` bit flags         |
//! | `EVENT_EFW_RESPONSE`  | big-endian quadlets of response frames    |
//!
//! # Usage
//!
//! ```
//! use fwsnd_core::constants::*;
//!
//! assert_eq!(EVENT_HEADER_SIZE, 4);
//! assert_ne!(EVENT_LOCK_STATUS, EVENT_DICE_NOTIFICATION);
//! ```

// ============================================================================
// Notification record discriminants
// ============================================================================

/// Streaming lock status changed.
pub const EVENT_LOCK_STATUS: u32 = 0x0000_10cc;

/// DICE notification bits.
pub const EVENT_DICE_NOTIFICATION: u32 = 0xd1ce_004e;

/// Echo Audio Fireworks transaction response.
pub const EVENT_EFW_RESPONSE: u32 = 0x4e61_7475;

/// Digidesign Digi 00x message.
pub const EVENT_DIGI00X_MESSAGE: u32 = 0x746e_736c;

/// MOTU notification.
pub const EVENT_MOTU_NOTIFICATION: u32 = 0x6477_6479;

/// TASCAM control surface change.
pub const EVENT_TASCAM_CONTROL: u32 = 0x7473_636d;

/// Size in bytes of the common record header (the type discriminant).
pub const EVENT_HEADER_SIZE: usize = 4;

/// Size in bytes of a complete lock status record.
pub const LOCK_STATUS_RECORD_SIZE: usize = 8;

/// Size in bytes of a complete DICE notification record.
pub const DICE_NOTIFICATION_RECORD_SIZE: usize = 8;

// ============================================================================
// Driver type tags (snd_firewire_get_info.type)
// ============================================================================

/// snd-dice.
pub const TYPE_DICE: u32 = 1;

/// snd-fireworks.
pub const TYPE_FIREWORKS: u32 = 2;

/// snd-bebob.
pub const TYPE_BEBOB: u32 = 3;

/// snd-oxfw.
pub const TYPE_OXFW: u32 = 4;

/// snd-firewire-digi00x.
pub const TYPE_DIGI00X: u32 = 5;

/// snd-firewire-tascam.
pub const TYPE_TASCAM: u32 = 6;

/// snd-firewire-motu.
pub const TYPE_MOTU: u32 = 7;

/// snd-fireface.
pub const TYPE_FIREFACE: u32 = 8;

// ============================================================================
// ioctl interface
// ============================================================================

/// ioctl magic shared by all hwdep FireWire requests.
pub const IOCTL_MAGIC: u8 = b'H';

/// Sequence number of SNDRV_FIREWIRE_IOCTL_GET_INFO.
pub const IOCTL_GET_INFO: u8 = 0xf8;

/// Sequence number of SNDRV_FIREWIRE_IOCTL_LOCK.
pub const IOCTL_LOCK: u8 = 0xf9;

/// Sequence number of SNDRV_FIREWIRE_IOCTL_UNLOCK.
pub const IOCTL_UNLOCK: u8 = 0xfa;

/// Capacity of `snd_firewire_get_info.device_name`, including the NUL.
pub const DEVICE_NAME_CAPACITY: usize = 16;

/// Size of the GUID field in `snd_firewire_get_info`.
pub const GUID_SIZE: usize = 8;

// ============================================================================
// Paths
// ============================================================================

/// Directory holding the FireWire character devices (`fw0`, `fw1`, ...).
pub const DEFAULT_BUS_DEVICE_DIR: &str = "/dev";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_discriminants_are_distinct() {
        let all = [
            EVENT_LOCK_STATUS,
            EVENT_DICE_NOTIFICATION,
            EVENT_EFW_RESPONSE,
            EVENT_DIGI00X_MESSAGE,
            EVENT_MOTU_NOTIFICATION,
            EVENT_TASCAM_CONTROL,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_record_sizes() {
        assert_eq!(LOCK_STATUS_RECORD_SIZE, EVENT_HEADER_SIZE + 4);
        assert_eq!(DICE_NOTIFICATION_RECORD_SIZE, EVENT_HEADER_SIZE + 4);
    }
}
