//! Shared vocabulary of the fwsnd crates.
//!
//! Holds the kernel ABI constants of the ALSA FireWire drivers (record
//! discriminants, type tags, ioctl numbers), the unit identity read through
//! `GET_INFO`, and the [`Error`] type every fallible operation returns.
//!
//! ```
//! use fwsnd_core::{DeviceIdentity, FirewireType};
//! use fwsnd_core::constants::TYPE_DICE;
//!
//! let identity = DeviceIdentity::from_raw_parts(TYPE_DICE, 2, [0; 8], b"fw2\0");
//! assert_eq!(identity.firewire_type(), FirewireType::Dice);
//! assert_eq!(identity.device_name, "fw2");
//! ```

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{DeviceIdentity, FirewireType, VendorFamily};

/// Crate version, as published.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
