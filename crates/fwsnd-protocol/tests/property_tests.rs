//! Property-based tests for notification record classification.
//!
//! These tests use proptest to generate arbitrary record spans and verify
//! that header classification and typed views never panic and agree with
//! the builder.

use fwsnd_core::constants::*;
use fwsnd_protocol::{
    DiceNotification, EfwResponse, LockStatus, NotificationRecord, RecordBuilder, RecordKind,
};
use proptest::prelude::*;

/// Strategy for generating type discriminants, biased toward known ones.
fn event_type() -> impl Strategy<Value = u32> {
    prop_oneof![
        Just(EVENT_LOCK_STATUS),
        Just(EVENT_DICE_NOTIFICATION),
        Just(EVENT_EFW_RESPONSE),
        any::<u32>(),
    ]
}

/// Strategy for generating page-bounded payloads.
fn payload() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..4096)
}

proptest! {
    /// Property: classification never panics on arbitrary input, and only
    /// spans shorter than the header are rejected.
    #[test]
    fn prop_parse_arbitrary_bytes(data in prop::collection::vec(any::<u8>(), 0..64)) {
        match NotificationRecord::parse(&data) {
            Ok(record) => {
                prop_assert!(data.len() >= EVENT_HEADER_SIZE);
                prop_assert_eq!(record.as_bytes().len(), data.len());
                prop_assert_eq!(record.payload().len(), data.len() - EVENT_HEADER_SIZE);
            }
            Err(_) => prop_assert!(data.len() < EVENT_HEADER_SIZE),
        }
    }

    /// Property: the discriminant written by the builder is the one read back.
    #[test]
    fn prop_header_matches_builder(ty in event_type(), body in payload()) {
        let bytes = RecordBuilder::new(ty).bytes(&body).build();
        let record = NotificationRecord::parse(&bytes).unwrap();

        prop_assert_eq!(record.event_type(), ty);
        prop_assert_eq!(record.kind(), RecordKind::from_type(ty));
        prop_assert_eq!(record.payload(), body.as_slice());
    }

    /// Property: typed views only accept their own discriminant.
    #[test]
    fn prop_typed_views_reject_foreign_records(ty in any::<u32>(), value in any::<u32>()) {
        let bytes = RecordBuilder::new(ty).u32(value).build();
        let record = NotificationRecord::parse(&bytes).unwrap();

        prop_assert_eq!(LockStatus::parse(&record).is_ok(), ty == EVENT_LOCK_STATUS);
        prop_assert_eq!(DiceNotification::parse(&record).is_ok(), ty == EVENT_DICE_NOTIFICATION);
        prop_assert_eq!(EfwResponse::parse(&record).is_ok(), ty == EVENT_EFW_RESPONSE);
    }

    /// Property: lock status is true exactly when the status field is non-zero.
    #[test]
    fn prop_lock_status_truthiness(status in any::<u32>()) {
        let bytes = RecordBuilder::new(EVENT_LOCK_STATUS).u32(status).build();
        let record = NotificationRecord::parse(&bytes).unwrap();
        prop_assert_eq!(LockStatus::parse(&record).unwrap().locked, status != 0);
    }

    /// Property: Fireworks quadlets survive the big-endian wire layout.
    #[test]
    fn prop_efw_quadlets(quadlets in prop::collection::vec(any::<u32>(), 0..256)) {
        let bytes = RecordBuilder::efw_response(&quadlets);
        let record = NotificationRecord::parse(&bytes).unwrap();
        prop_assert_eq!(EfwResponse::parse(&record).unwrap().quadlets, quadlets);
    }
}
