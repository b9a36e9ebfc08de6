//! Common test utilities for unit integration tests.
//!
//! [`Harness`] wires a [`SndUnit`] to a [`MockBackend`] and a
//! [`ManualReactor`] with one device registered at [`CONTROL_PATH`].

#![allow(dead_code)]

use fwsnd_core::DeviceIdentity;
use fwsnd_core::constants::{TYPE_BEBOB, TYPE_DICE, TYPE_FIREWORKS};
use fwsnd_unit::mock::{ManualReactor, MockBackend, MockControlHandle};
use fwsnd_unit::reactor::{IoCondition, SourceToken};
use fwsnd_unit::{SndUnit, UnitConfig, UnitVariant};
use std::sync::Arc;

pub const CONTROL_PATH: &str = "/dev/snd/hwC1D0";
pub const BUS_DEVICE_NAME: &str = "fw1";
pub const GUID: [u8; 8] = [0x00, 0x14, 0x86, 0x02, 0x1e, 0x4a, 0x2b, 0x5c];
pub const GUID_VALUE: u64 = 0x0014_8602_1e4a_2b5c;

/// Route test logs through the test writer. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn identity(fw_type: u32) -> DeviceIdentity {
    DeviceIdentity::from_raw_parts(fw_type, 1, GUID, BUS_DEVICE_NAME.as_bytes())
}

pub fn dice_identity() -> DeviceIdentity {
    identity(TYPE_DICE)
}

pub fn efw_identity() -> DeviceIdentity {
    identity(TYPE_FIREWORKS)
}

pub fn bebob_identity() -> DeviceIdentity {
    identity(TYPE_BEBOB)
}

pub struct Harness {
    pub backend: Arc<MockBackend>,
    pub reactor: Arc<ManualReactor>,
    pub device: MockControlHandle,
    pub unit: SndUnit,
}

impl Harness {
    pub fn new(identity: DeviceIdentity, variant: UnitVariant) -> Self {
        init_tracing();

        let backend = Arc::new(MockBackend::new());
        let device = backend.add_device(CONTROL_PATH, identity);
        let reactor = Arc::new(ManualReactor::new());
        let unit = SndUnit::builder(backend.clone(), reactor.clone())
            .variant(variant)
            .config(UnitConfig::default())
            .build();

        Self {
            backend,
            reactor,
            device,
            unit,
        }
    }

    pub fn generic() -> Self {
        Self::new(bebob_identity(), UnitVariant::Generic)
    }

    /// Open the unit and start listening.
    pub fn listening(identity: DeviceIdentity, variant: UnitVariant) -> Self {
        let harness = Self::new(identity, variant);
        harness.unit.open(CONTROL_PATH).unwrap();
        harness.unit.listen().unwrap();
        harness
    }

    /// The only active reactor registration.
    pub fn token(&self) -> SourceToken {
        let tokens = self.reactor.tokens();
        assert_eq!(tokens.len(), 1, "expected exactly one registration");
        tokens[0]
    }

    /// Queue `record` and deliver one readable callback.
    pub fn deliver(&self, record: impl Into<bytes::Bytes>) {
        self.device.push_record(record);
        self.reactor.fire(self.token(), IoCondition::READABLE);
    }
}
