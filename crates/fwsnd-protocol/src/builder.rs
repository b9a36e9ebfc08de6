use bytes::{BufMut, Bytes, BytesMut};
use fwsnd_core::constants::*;

/// Builder for notification records in the kernel wire layout.
///
/// Records built here are byte-identical to what the control device returns
/// from `read(2)`, which makes them usable as fixtures for mock devices.
///
/// # Example
/// ```
/// use fwsnd_protocol::RecordBuilder;
/// use fwsnd_core::constants::EVENT_DICE_NOTIFICATION;
///
/// let record = RecordBuilder::new(EVENT_DICE_NOTIFICATION).u32(0x20).build();
/// assert_eq!(record.len(), 8);
/// ```
pub struct RecordBuilder {
    buf: BytesMut,
}

impl RecordBuilder {
    /// Start a record with the given type discriminant.
    pub fn new(event_type: u32) -> Self {
        let mut buf = BytesMut::with_capacity(LOCK_STATUS_RECORD_SIZE);
        buf.put_u32_ne(event_type);
        RecordBuilder { buf }
    }

    /// Append a native-endian 32-bit field.
    pub fn u32(mut self, value: u32) -> Self {
        self.buf.put_u32_ne(value);
        self
    }

    /// Append a big-endian quadlet.
    pub fn quadlet(mut self, value: u32) -> Self {
        self.buf.put_u32(value);
        self
    }

    /// Append raw payload bytes.
    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.buf.put_slice(data);
        self
    }

    pub fn build(self) -> Bytes {
        self.buf.freeze()
    }

    /// A complete lock status record.
    pub fn lock_status(locked: bool) -> Bytes {
        Self::new(EVENT_LOCK_STATUS).u32(u32::from(locked)).build()
    }

    /// A complete DICE notification record.
    pub fn dice_notification(bits: u32) -> Bytes {
        Self::new(EVENT_DICE_NOTIFICATION).u32(bits).build()
    }

    /// A Fireworks response record carrying the given quadlets.
    pub fn efw_response(quadlets: &[u32]) -> Bytes {
        quadlets
            .iter()
            .fold(Self::new(EVENT_EFW_RESPONSE), |builder, &q| {
                builder.quadlet(q)
            })
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_status_layout() {
        let record = RecordBuilder::lock_status(true);
        assert_eq!(record.len(), LOCK_STATUS_RECORD_SIZE);
        assert_eq!(&record[..4], &EVENT_LOCK_STATUS.to_ne_bytes());
        assert_eq!(&record[4..], &1u32.to_ne_bytes());
    }

    #[test]
    fn test_efw_response_layout() {
        let record = RecordBuilder::efw_response(&[0x0102_0304]);
        assert_eq!(&record[4..], &[0x01, 0x02, 0x03, 0x04]);
    }
}
