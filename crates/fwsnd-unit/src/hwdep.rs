//! Kernel control device (ALSA hwdep node of a FireWire sound driver).

use crate::traits::ControlDevice;
use fwsnd_core::{DeviceIdentity, Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use tracing::debug;

mod ioctl {
    use fwsnd_core::constants::{
        DEVICE_NAME_CAPACITY, GUID_SIZE, IOCTL_GET_INFO, IOCTL_LOCK, IOCTL_MAGIC, IOCTL_UNLOCK,
    };
    use std::os::raw::c_int;

    /// Layout of `struct snd_firewire_get_info`.
    #[repr(C)]
    #[derive(Debug, Default, Clone, Copy)]
    pub struct SndFirewireGetInfo {
        pub fw_type: c_int,
        pub card: c_int,
        pub guid: [u8; GUID_SIZE],
        pub device_name: [u8; DEVICE_NAME_CAPACITY],
    }

    nix::ioctl_read!(get_info, IOCTL_MAGIC, IOCTL_GET_INFO, SndFirewireGetInfo);
    nix::ioctl_none!(lock, IOCTL_MAGIC, IOCTL_LOCK);
    nix::ioctl_none!(unlock, IOCTL_MAGIC, IOCTL_UNLOCK);
}

/// Control device backed by a hwdep special file such as `/dev/snd/hwC1D0`.
///
/// The descriptor is closed when the value is dropped.
#[derive(Debug)]
pub struct HwdepDevice {
    file: File,
    path: PathBuf,
}

impl HwdepDevice {
    /// Open `path` for read/write.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` with the `open(2)` errno.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|err| Error::from_io("open", err))?;

        debug!("Opened control device {}", path.display());

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ControlDevice for HwdepDevice {
    fn raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }

    fn get_info(&self) -> Result<DeviceIdentity> {
        let mut info = ioctl::SndFirewireGetInfo::default();

        // SAFETY: the descriptor is open for the lifetime of `self` and `info`
        // has the layout the kernel writes into.
        unsafe { ioctl::get_info(self.file.as_raw_fd(), &mut info) }
            .map_err(|errno| Error::io("GET_INFO", errno))?;

        Ok(DeviceIdentity::from_raw_parts(
            info.fw_type as u32,
            info.card,
            info.guid,
            &info.device_name,
        ))
    }

    fn lock(&self) -> Result<()> {
        // SAFETY: LOCK takes no argument.
        unsafe { ioctl::lock(self.file.as_raw_fd()) }
            .map(|_| ())
            .map_err(|errno| Error::io("LOCK", errno))
    }

    fn unlock(&self) -> Result<()> {
        // SAFETY: UNLOCK takes no argument.
        unsafe { ioctl::unlock(self.file.as_raw_fd()) }
            .map(|_| ())
            .map_err(|errno| Error::io("UNLOCK", errno))
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        (&self.file)
            .read(buf)
            .map_err(|err| Error::from_io("read", err))
    }

    fn write(&self, buf: &[u8]) -> Result<usize> {
        (&self.file)
            .write(buf)
            .map_err(|err| Error::from_io("write", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;

    #[test]
    fn test_open_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = HwdepDevice::open(dir.path().join("hwC9D0")).unwrap_err();
        assert!(matches!(
            err,
            Error::Io {
                operation: "open",
                errno: Errno::ENOENT
            }
        ));
    }

    #[test]
    fn test_open_without_permission() {
        use std::os::unix::fs::PermissionsExt;

        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o000)).unwrap();
        // CAP_DAC_OVERRIDE ignores the mode.
        if File::open(file.path()).is_ok() {
            return;
        }

        let err = HwdepDevice::open(file.path()).unwrap_err();
        assert!(matches!(
            err,
            Error::Io {
                operation: "open",
                errno: Errno::EACCES
            }
        ));
    }

    #[test]
    fn test_get_info_on_regular_file_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let device = HwdepDevice::open(file.path()).unwrap();
        assert_eq!(device.path(), file.path());

        let err = device.get_info().unwrap_err();
        assert!(matches!(
            err,
            Error::Io {
                operation: "GET_INFO",
                errno: Errno::ENOTTY
            }
        ));
    }

    #[test]
    fn test_lock_on_regular_file_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let device = HwdepDevice::open(file.path()).unwrap();
        assert_eq!(device.lock().unwrap_err().errno(), Some(Errno::ENOTTY));
        assert_eq!(device.unlock().unwrap_err().errno(), Some(Errno::ENOTTY));
    }

    #[test]
    fn test_read_write_pass_through() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let device = HwdepDevice::open(file.path()).unwrap();
        assert_eq!(device.write(&[1, 2, 3]).unwrap(), 3);

        let reader = HwdepDevice::open(file.path()).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
    }
}
