//! Typed decoders for the vendor families.
//!
//! Both implement [`NotificationDecoder`] and can be bound through
//! [`UnitVariant::dice`](crate::devices::UnitVariant::dice) and
//! [`UnitVariant::fireworks`](crate::devices::UnitVariant::fireworks).
//! Malformed records are logged and skipped.

use crate::traits::NotificationDecoder;
use fwsnd_protocol::{DiceNotification, EfwResponse, NotificationRecord};
use tracing::warn;

/// Decodes DICE notification records into their notification bits.
///
/// # Example
///
/// ```
/// use fwsnd_unit::decoders::DiceNotificationDecoder;
/// use fwsnd_unit::devices::UnitVariant;
///
/// let variant = UnitVariant::dice(DiceNotificationDecoder::new(|bits| {
///     println!("notification {bits:#010x}");
/// }));
/// ```
pub struct DiceNotificationDecoder<F> {
    on_notification: F,
}

impl<F> DiceNotificationDecoder<F>
where
    F: Fn(u32) + Send + Sync,
{
    pub fn new(on_notification: F) -> Self {
        Self { on_notification }
    }
}

impl<F> NotificationDecoder for DiceNotificationDecoder<F>
where
    F: Fn(u32) + Send + Sync,
{
    fn handle_notification(&self, record: &[u8]) {
        let parsed = NotificationRecord::parse(record).and_then(|r| DiceNotification::parse(&r));
        match parsed {
            Ok(notification) => (self.on_notification)(notification.bits),
            Err(err) => warn!("Skipping DICE record: {}", err),
        }
    }
}

/// Decodes Fireworks response records into host-order quadlets.
pub struct EfwResponseDecoder<F> {
    on_response: F,
}

impl<F> EfwResponseDecoder<F>
where
    F: Fn(&[u32]) + Send + Sync,
{
    pub fn new(on_response: F) -> Self {
        Self { on_response }
    }
}

impl<F> NotificationDecoder for EfwResponseDecoder<F>
where
    F: Fn(&[u32]) + Send + Sync,
{
    fn handle_notification(&self, record: &[u8]) {
        let parsed = NotificationRecord::parse(record).and_then(|r| EfwResponse::parse(&r));
        match parsed {
            Ok(response) => (self.on_response)(&response.quadlets),
            Err(err) => warn!("Skipping Fireworks record: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fwsnd_protocol::RecordBuilder;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_dice_decoder_delivers_bits() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let decoder = DiceNotificationDecoder::new(move |bits| sink.lock().push(bits));

        decoder.handle_notification(&RecordBuilder::dice_notification(0x0000_0020));
        decoder.handle_notification(&RecordBuilder::efw_response(&[1]));

        assert_eq!(*seen.lock(), vec![0x20]);
    }

    #[test]
    fn test_efw_decoder_skips_unaligned_payload() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let decoder = EfwResponseDecoder::new(move |quadlets: &[u32]| {
            sink.lock().push(quadlets.to_vec())
        });

        decoder.handle_notification(&RecordBuilder::efw_response(&[0x0000_0006, 0xdead_beef]));
        let unaligned = RecordBuilder::new(fwsnd_core::constants::EVENT_EFW_RESPONSE)
            .bytes(&[1, 2, 3])
            .build();
        decoder.handle_notification(&unaligned);

        assert_eq!(*seen.lock(), vec![vec![0x0000_0006, 0xdead_beef]]);
    }
}
