use fwsnd_core::{Error, Result, constants::*};
use std::fmt;

/// Classification of a record by its leading type discriminant.
///
/// # Example
/// ```
/// use fwsnd_protocol::RecordKind;
/// use fwsnd_core::constants::EVENT_LOCK_STATUS;
///
/// assert_eq!(RecordKind::from_type(EVENT_LOCK_STATUS), RecordKind::LockStatus);
/// assert_eq!(RecordKind::from_type(0x1234), RecordKind::Other(0x1234));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    LockStatus,
    DiceNotification,
    EfwResponse,
    Digi00xMessage,
    MotuNotification,
    TascamControl,
    Other(u32),
}

impl RecordKind {
    pub fn from_type(event_type: u32) -> Self {
        match event_type {
            EVENT_LOCK_STATUS => Self::LockStatus,
            EVENT_DICE_NOTIFICATION => Self::DiceNotification,
            EVENT_EFW_RESPONSE => Self::EfwResponse,
            EVENT_DIGI00X_MESSAGE => Self::Digi00xMessage,
            EVENT_MOTU_NOTIFICATION => Self::MotuNotification,
            EVENT_TASCAM_CONTROL => Self::TascamControl,
            other => Self::Other(other),
        }
    }

    pub fn as_type(&self) -> u32 {
        match self {
            Self::LockStatus => EVENT_LOCK_STATUS,
            Self::DiceNotification => EVENT_DICE_NOTIFICATION,
            Self::EfwResponse => EVENT_EFW_RESPONSE,
            Self::Digi00xMessage => EVENT_DIGI00X_MESSAGE,
            Self::MotuNotification => EVENT_MOTU_NOTIFICATION,
            Self::TascamControl => EVENT_TASCAM_CONTROL,
            Self::Other(raw) => *raw,
        }
    }
}

/// A notification record as read from the control device.
///
/// The record borrows the receive buffer; it only validates that the common
/// header is present. Payload interpretation belongs to the typed views
/// ([`LockStatus`], [`DiceNotification`], [`EfwResponse`]).
///
/// # Example
/// ```
/// use fwsnd_protocol::{NotificationRecord, RecordBuilder, RecordKind};
///
/// let bytes = RecordBuilder::lock_status(true);
/// let record = NotificationRecord::parse(&bytes).unwrap();
/// assert_eq!(record.kind(), RecordKind::LockStatus);
/// assert_eq!(record.payload().len(), 4);
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NotificationRecord<'a> {
    data: &'a [u8],
    event_type: u32,
}

impl<'a> NotificationRecord<'a> {
    /// Read the common header of a record.
    ///
    /// # Errors
    /// Returns `Error::MalformedRecord` when the span is shorter than the header.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let event_type = read_u32_ne(data, 0).ok_or_else(|| {
            Error::malformed(format!(
                "{} bytes is shorter than the {EVENT_HEADER_SIZE}-byte header",
                data.len()
            ))
        })?;

        Ok(Self { data, event_type })
    }

    /// Raw type discriminant.
    pub fn event_type(&self) -> u32 {
        self.event_type
    }

    pub fn kind(&self) -> RecordKind {
        RecordKind::from_type(self.event_type)
    }

    /// The full record, header included.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Bytes following the common header.
    pub fn payload(&self) -> &'a [u8] {
        &self.data[EVENT_HEADER_SIZE..]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn expect_kind(&self, kind: RecordKind) -> Result<()> {
        if self.kind() != kind {
            return Err(Error::malformed(format!(
                "expected {:?} record, found type {:#010x}",
                kind, self.event_type
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for NotificationRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationRecord")
            .field("kind", &self.kind())
            .field("len", &self.data.len())
            .finish()
    }
}

/// Streaming lock status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockStatus {
    pub locked: bool,
}

impl LockStatus {
    /// # Errors
    /// Returns `Error::MalformedRecord` for another record type or a truncated status field.
    pub fn parse(record: &NotificationRecord<'_>) -> Result<Self> {
        record.expect_kind(RecordKind::LockStatus)?;
        let status = read_u32_ne(record.as_bytes(), EVENT_HEADER_SIZE).ok_or_else(|| {
            Error::malformed(format!(
                "lock status record of {} bytes, expected {LOCK_STATUS_RECORD_SIZE}",
                record.len()
            ))
        })?;

        Ok(Self {
            locked: status != 0,
        })
    }
}

/// DICE notification bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceNotification {
    pub bits: u32,
}

impl DiceNotification {
    /// # Errors
    /// Returns `Error::MalformedRecord` for another record type or a truncated field.
    pub fn parse(record: &NotificationRecord<'_>) -> Result<Self> {
        record.expect_kind(RecordKind::DiceNotification)?;
        let bits = read_u32_ne(record.as_bytes(), EVENT_HEADER_SIZE).ok_or_else(|| {
            Error::malformed(format!(
                "DICE notification record of {} bytes, expected {DICE_NOTIFICATION_RECORD_SIZE}",
                record.len()
            ))
        })?;

        Ok(Self { bits })
    }
}

/// Fireworks response frames, as host-order quadlets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EfwResponse {
    pub quadlets: Vec<u32>,
}

impl EfwResponse {
    /// # Errors
    /// Returns `Error::MalformedRecord` for another record type or a payload
    /// that is not quadlet aligned.
    pub fn parse(record: &NotificationRecord<'_>) -> Result<Self> {
        record.expect_kind(RecordKind::EfwResponse)?;
        let payload = record.payload();
        if payload.len() % 4 != 0 {
            return Err(Error::malformed(format!(
                "Fireworks payload of {} bytes is not quadlet aligned",
                payload.len()
            )));
        }

        let quadlets = payload
            .chunks_exact(4)
            .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        Ok(Self { quadlets })
    }
}

fn read_u32_ne(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordBuilder;
    use rstest::rstest;

    #[rstest]
    #[case(&[])]
    #[case(&[0x01])]
    #[case(&[0x01, 0x02, 0x03])]
    fn test_parse_rejects_short_header(#[case] data: &[u8]) {
        assert!(matches!(
            NotificationRecord::parse(data),
            Err(Error::MalformedRecord { .. })
        ));
    }

    #[rstest]
    #[case(EVENT_LOCK_STATUS, RecordKind::LockStatus)]
    #[case(EVENT_DICE_NOTIFICATION, RecordKind::DiceNotification)]
    #[case(EVENT_EFW_RESPONSE, RecordKind::EfwResponse)]
    #[case(EVENT_DIGI00X_MESSAGE, RecordKind::Digi00xMessage)]
    #[case(EVENT_MOTU_NOTIFICATION, RecordKind::MotuNotification)]
    #[case(EVENT_TASCAM_CONTROL, RecordKind::TascamControl)]
    #[case(0xdead_beef, RecordKind::Other(0xdead_beef))]
    fn test_kind_classification(#[case] event_type: u32, #[case] expected: RecordKind) {
        let bytes = RecordBuilder::new(event_type).build();
        let record = NotificationRecord::parse(&bytes).unwrap();
        assert_eq!(record.kind(), expected);
        assert_eq!(record.kind().as_type(), event_type);
        assert!(record.payload().is_empty());
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_lock_status(#[case] locked: bool) {
        let bytes = RecordBuilder::lock_status(locked);
        let record = NotificationRecord::parse(&bytes).unwrap();
        assert_eq!(LockStatus::parse(&record).unwrap(), LockStatus { locked });
    }

    #[test]
    fn test_lock_status_any_nonzero_is_locked() {
        let bytes = RecordBuilder::new(EVENT_LOCK_STATUS).u32(7).build();
        let record = NotificationRecord::parse(&bytes).unwrap();
        assert!(LockStatus::parse(&record).unwrap().locked);
    }

    #[test]
    fn test_lock_status_truncated() {
        let bytes = RecordBuilder::new(EVENT_LOCK_STATUS).build();
        let record = NotificationRecord::parse(&bytes).unwrap();
        assert!(LockStatus::parse(&record).is_err());
    }

    #[test]
    fn test_lock_status_rejects_other_kind() {
        let bytes = RecordBuilder::dice_notification(1);
        let record = NotificationRecord::parse(&bytes).unwrap();
        assert!(LockStatus::parse(&record).is_err());
    }

    #[test]
    fn test_dice_notification_bits() {
        let bytes = RecordBuilder::dice_notification(0x0000_0030);
        let record = NotificationRecord::parse(&bytes).unwrap();
        assert_eq!(DiceNotification::parse(&record).unwrap().bits, 0x30);
    }

    #[test]
    fn test_efw_response_quadlets_are_big_endian() {
        let bytes = RecordBuilder::new(EVENT_EFW_RESPONSE)
            .bytes(&[0x00, 0x00, 0x00, 0x06, 0x12, 0x34, 0x56, 0x78])
            .build();
        let record = NotificationRecord::parse(&bytes).unwrap();
        let response = EfwResponse::parse(&record).unwrap();
        assert_eq!(response.quadlets, vec![6, 0x1234_5678]);
    }

    #[test]
    fn test_efw_response_unaligned() {
        let bytes = RecordBuilder::new(EVENT_EFW_RESPONSE)
            .bytes(&[0x00, 0x01])
            .build();
        let record = NotificationRecord::parse(&bytes).unwrap();
        assert!(EfwResponse::parse(&record).is_err());
    }

    #[test]
    fn test_debug_does_not_dump_payload() {
        let bytes = RecordBuilder::efw_response(&[1, 2, 3]);
        let record = NotificationRecord::parse(&bytes).unwrap();
        assert_eq!(
            format!("{record:?}"),
            "NotificationRecord { kind: EfwResponse, len: 16 }"
        );
    }
}
