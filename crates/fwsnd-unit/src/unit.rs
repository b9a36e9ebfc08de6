//! FireWire sound unit handle.
//!
//! [`SndUnit`] owns the control device of one FireWire sound unit together
//! with the bus-side collaborators bound to it, and exposes the unit's
//! identity, lock state and events.
//!
//! # Lifecycle
//!
//! ```text
//!   new ──open──► opened ──listen──► listening
//!                   ▲                   │
//!                   └─────unlisten──────┘
//!   dispose/drop: unlisten → release transaction clients → close control device
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use fwsnd_unit::{SndUnit, reactor::PollReactor};
//! # use fwsnd_unit::traits::FirewireBackend;
//! use std::sync::Arc;
//!
//! # fn example(backend: Arc<dyn FirewireBackend>) -> fwsnd_core::Result<()> {
//! let reactor = Arc::new(PollReactor::new()?);
//! let unit = SndUnit::new(backend, reactor.clone());
//!
//! unit.open("/dev/snd/hwC1D0")?;
//! println!("GUID: {:016x}", unit.guid().unwrap_or_default());
//!
//! unit.connect_lock_status(|locked| println!("streaming locked: {locked}"));
//! unit.listen()?;
//! reactor.run()?;
//! # Ok(())
//! # }
//! ```

use crate::devices::UnitVariant;
use crate::listener::Listener;
use crate::reactor::Reactor;
use crate::signals::{HandlerId, SignalHub, UnitEvent};
use crate::traits::{
    BusUnit, ControlDevice, ControlProtocolClient, FirewireBackend, TransactionClient,
};
use fwsnd_core::constants::DEFAULT_BUS_DEVICE_DIR;
use fwsnd_core::{DeviceIdentity, Error, FirewireType, Result, VendorFamily};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Configuration of a unit.
///
/// # Example
///
/// ```
/// use fwsnd_unit::UnitConfig;
///
/// let config = UnitConfig::default().with_bus_device_dir("/run/fw");
/// assert_eq!(config.bus_device_path("fw1").to_str(), Some("/run/fw/fw1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitConfig {
    /// Directory holding the FireWire character devices.
    pub bus_device_dir: PathBuf,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            bus_device_dir: PathBuf::from(DEFAULT_BUS_DEVICE_DIR),
        }
    }
}

impl UnitConfig {
    pub fn with_bus_device_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bus_device_dir = dir.into();
        self
    }

    /// Special file of the bus unit named `device_name`.
    pub fn bus_device_path(&self, device_name: &str) -> PathBuf {
        self.bus_device_dir.join(device_name)
    }
}

/// Resources bound to the unit between `open` and `dispose`.
pub(crate) struct Binding {
    pub(crate) device: Arc<dyn ControlDevice>,
    pub(crate) identity: DeviceIdentity,
    pub(crate) bus: Arc<dyn BusUnit>,
    pub(crate) req: Arc<dyn TransactionClient>,
    pub(crate) fcp: Arc<dyn ControlProtocolClient>,
}

#[derive(Default)]
pub(crate) struct UnitState {
    pub(crate) binding: Option<Binding>,
    pub(crate) listener: Option<Listener>,
    pub(crate) streaming: bool,
}

pub(crate) struct UnitInner {
    pub(crate) config: UnitConfig,
    pub(crate) backend: Arc<dyn FirewireBackend>,
    pub(crate) reactor: Arc<dyn Reactor>,
    pub(crate) variant: UnitVariant,
    pub(crate) signals: SignalHub,
    pub(crate) state: Mutex<UnitState>,
}

impl UnitInner {
    pub(crate) fn is_listening(&self) -> bool {
        self.state.lock().listener.is_some()
    }

    fn dispose(&self) {
        let mut state = self.state.lock();
        self.unlisten_locked(&mut state);

        let Some(binding) = state.binding.take() else {
            return;
        };

        let Binding {
            device,
            identity,
            bus,
            req,
            fcp,
        } = binding;
        drop(req);
        drop(fcp);
        drop(device);
        drop(bus);

        info!("Closed unit {} (card {})", identity.device_name, identity.card);
    }
}

impl Drop for UnitInner {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Builder for [`SndUnit`].
pub struct SndUnitBuilder {
    backend: Arc<dyn FirewireBackend>,
    reactor: Arc<dyn Reactor>,
    variant: UnitVariant,
    config: UnitConfig,
}

impl SndUnitBuilder {
    /// Bind the unit to a device variant. Defaults to [`UnitVariant::Generic`].
    pub fn variant(mut self, variant: UnitVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn config(mut self, config: UnitConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> SndUnit {
        SndUnit {
            inner: Arc::new(UnitInner {
                config: self.config,
                backend: self.backend,
                reactor: self.reactor,
                variant: self.variant,
                signals: SignalHub::default(),
                state: Mutex::new(UnitState::default()),
            }),
        }
    }
}

/// Handle of one FireWire sound unit.
///
/// Created empty, populated by [`open`](Self::open) and torn down once by
/// [`dispose`](Self::dispose) or on drop.
pub struct SndUnit {
    pub(crate) inner: Arc<UnitInner>,
}

impl SndUnit {
    /// Create a generic unit with the default configuration.
    pub fn new(backend: Arc<dyn FirewireBackend>, reactor: Arc<dyn Reactor>) -> Self {
        Self::builder(backend, reactor).build()
    }

    pub fn builder(
        backend: Arc<dyn FirewireBackend>,
        reactor: Arc<dyn Reactor>,
    ) -> SndUnitBuilder {
        SndUnitBuilder {
            backend,
            reactor,
            variant: UnitVariant::Generic,
            config: UnitConfig::default(),
        }
    }

    /// Open the control device at `path` and bind the bus-side collaborators.
    ///
    /// Reads the device identity, opens the bus unit named by it under
    /// [`UnitConfig::bus_device_dir`] and creates both transaction clients.
    /// On failure nothing stays open.
    ///
    /// # Errors
    ///
    /// - `Error::AlreadyOpened` if the unit is already opened
    /// - `Error::Io` if open, GET_INFO or the bus unit bind fails
    /// - `Error::FamilyMismatch` if the device belongs to another vendor family
    pub fn open(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let inner = &self.inner;
        let mut state = inner.state.lock();
        if state.binding.is_some() {
            return Err(Error::AlreadyOpened);
        }

        let device = inner.backend.open_control_device(path)?;
        let identity = device.get_info()?;

        if let Some(family) = inner.variant.family() {
            let actual = identity.firewire_type();
            if actual != family.firewire_type() {
                return Err(Error::FamilyMismatch {
                    expected: family.firewire_type(),
                    actual,
                });
            }
        }

        let bus_path = inner.config.bus_device_path(&identity.device_name);
        let bus = inner.backend.open_bus_unit(&bus_path)?;
        let req = inner.backend.transaction_client(&bus)?;
        let fcp = inner.backend.control_protocol_client(&bus)?;

        info!(
            "Opened {} unit {} on {} (card {}, guid {:016x})",
            identity.firewire_type(),
            path.display(),
            bus_path.display(),
            identity.card,
            identity.guid
        );

        state.binding = Some(Binding {
            device: Arc::from(device),
            identity,
            bus,
            req,
            fcp,
        });
        Ok(())
    }

    /// Disallow the kernel driver to start streaming.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` carrying `EBUSY` when another consumer holds the lock.
    pub fn lock(&self) -> Result<()> {
        let state = self.inner.state.lock();
        let binding = state.binding.as_ref().ok_or(Error::NotOpened)?;
        binding.device.lock()?;
        debug!("Locked {}", binding.identity.device_name);
        Ok(())
    }

    /// Allow the kernel driver to start streaming again.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the lock is not held by this consumer.
    pub fn unlock(&self) -> Result<()> {
        let state = self.inner.state.lock();
        let binding = state.binding.as_ref().ok_or(Error::NotOpened)?;
        binding.device.unlock()?;
        debug!("Unlocked {}", binding.identity.device_name);
        Ok(())
    }

    /// Stop listening, release the transaction clients and close the device.
    ///
    /// Idempotent; a no-op on a unit that was never opened.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_opened(&self) -> bool {
        self.inner.state.lock().binding.is_some()
    }

    /// Identity read at open time.
    pub fn identity(&self) -> Option<DeviceIdentity> {
        self.with_identity(Clone::clone)
    }

    /// Raw driver type tag.
    pub fn fw_type(&self) -> Option<u32> {
        self.with_identity(|identity| identity.fw_type)
    }

    pub fn firewire_type(&self) -> Option<FirewireType> {
        self.with_identity(DeviceIdentity::firewire_type)
    }

    /// ALSA card index.
    pub fn card(&self) -> Option<i32> {
        self.with_identity(|identity| identity.card)
    }

    /// Name of the FireWire character device backing this unit.
    pub fn device_name(&self) -> Option<String> {
        self.with_identity(|identity| identity.device_name.clone())
    }

    /// Special file of the bound bus unit.
    pub fn bus_device_path(&self) -> Option<PathBuf> {
        let state = self.inner.state.lock();
        state
            .binding
            .as_ref()
            .map(|binding| binding.bus.path().to_path_buf())
    }

    /// Globally unique identifier in host order.
    pub fn guid(&self) -> Option<u64> {
        self.with_identity(|identity| identity.guid)
    }

    /// Whether another consumer held the streaming lock when listening started.
    pub fn is_streaming(&self) -> bool {
        self.inner.state.lock().streaming
    }

    /// Whether a reactor registration is active.
    pub fn is_listening(&self) -> bool {
        self.inner.is_listening()
    }

    pub fn variant(&self) -> &UnitVariant {
        &self.inner.variant
    }

    pub fn family(&self) -> Option<VendorFamily> {
        self.inner.variant.family()
    }

    pub fn config(&self) -> &UnitConfig {
        &self.inner.config
    }

    /// Call `handler` on every `lock-status` event.
    pub fn connect_lock_status<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.inner.signals.connect_lock_status(Arc::new(handler))
    }

    /// Call `handler` on every `disconnected` event.
    pub fn connect_disconnected<F>(&self, handler: F) -> HandlerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.signals.connect_disconnected(Arc::new(handler))
    }

    /// Remove a handler. Returns `false` if it was not connected.
    pub fn disconnect(&self, id: HandlerId) -> bool {
        self.inner.signals.disconnect(id)
    }

    /// Receive unit events through a channel.
    ///
    /// The receiver is dropped from the subscriber list on the first
    /// emission after it is closed.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<UnitEvent> {
        self.inner.signals.subscribe()
    }

    fn with_identity<T>(&self, f: impl FnOnce(&DeviceIdentity) -> T) -> Option<T> {
        let state = self.inner.state.lock();
        state.binding.as_ref().map(|binding| f(&binding.identity))
    }
}

impl std::fmt::Debug for SndUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SndUnit")
            .field("variant", &self.inner.variant)
            .field("identity", &self.identity())
            .field("listening", &self.is_listening())
            .field("streaming", &self.is_streaming())
            .finish()
    }
}
