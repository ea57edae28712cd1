// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Modification command application tests.

use crate::apply::apply_modification;
use crate::command::ModificationCommand;
use crate::error::CoreError;
use crate::state::{Actor, ModificationRecord, ModificationTransition};
use crate::tests::helpers::{ten_days_out, test_booking, test_modification_record};
use rebook_domain::{DomainError, EngineConfig, ModificationStatus};
use rust_decimal::Decimal;
use time::{Date, Month};

fn approve(record: &ModificationRecord) -> ModificationRecord {
    apply_modification(
        &test_booking(),
        record,
        ModificationCommand::Approve {
            admin_id: 7,
            notes: None,
        },
        &EngineConfig::default(),
        ten_days_out(),
    )
    .expect("transition permitted")
    .record
}

// ============================================================================
// Review
// ============================================================================

#[test]
fn test_approve_from_pending() {
    let record: ModificationRecord = test_modification_record();
    let transition = apply_modification(
        &test_booking(),
        &record,
        ModificationCommand::Approve {
            admin_id: 7,
            notes: Some(String::from("capacity confirmed with the operator")),
        },
        &EngineConfig::default(),
        ten_days_out(),
    )
    .expect("transition permitted");

    assert_eq!(transition.record.status, ModificationStatus::Approved);
    assert_eq!(transition.record.reviewed_by, Some(7));
    assert_eq!(transition.history[0].changed_by, Actor::Admin(7));
    assert!(transition.booking_changes.is_none());
}

#[test]
fn test_reject_requires_notes() {
    let record: ModificationRecord = test_modification_record();
    let result = apply_modification(
        &test_booking(),
        &record,
        ModificationCommand::Reject {
            admin_id: 7,
            notes: String::new(),
        },
        &EngineConfig::default(),
        ten_days_out(),
    );
    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(
            DomainError::AdminNotesRequired { .. }
        ))
    ));
}

#[test]
fn test_cancel_by_customer_from_pending() {
    let record: ModificationRecord = test_modification_record();
    let transition = apply_modification(
        &test_booking(),
        &record,
        ModificationCommand::CancelByCustomer { user_id: 100 },
        &EngineConfig::default(),
        ten_days_out(),
    )
    .expect("transition permitted");

    assert_eq!(transition.record.status, ModificationStatus::Cancelled);
    assert_eq!(transition.history[0].changed_by, Actor::Customer(100));
}

#[test]
fn test_cancel_by_customer_after_approval_fails() {
    let record: ModificationRecord = approve(&test_modification_record());
    let result = apply_modification(
        &test_booking(),
        &record,
        ModificationCommand::CancelByCustomer { user_id: 100 },
        &EngineConfig::default(),
        ten_days_out(),
    );
    assert!(result.is_err());
}

// ============================================================================
// Charges and processing
// ============================================================================

#[test]
fn test_accept_charges_moves_to_processing() {
    let record: ModificationRecord = approve(&test_modification_record());
    assert!(record.quote.requires_additional_payment);

    let transition = apply_modification(
        &test_booking(),
        &record,
        ModificationCommand::AcceptCharges { user_id: 100 },
        &EngineConfig::default(),
        ten_days_out(),
    )
    .expect("transition permitted");

    assert_eq!(transition.record.status, ModificationStatus::Processing);
    assert!(transition.record.charges_accepted_at.is_some());
}

#[test]
fn test_accept_charges_without_charges_fails() {
    // A 4 -> 2 change offers a refund; there is nothing to accept.
    let mut record: ModificationRecord = approve(&test_modification_record());
    record.quote.requires_additional_payment = false;
    record.quote.price_difference = Decimal::from(-800_000);

    let result = apply_modification(
        &test_booking(),
        &record,
        ModificationCommand::AcceptCharges { user_id: 100 },
        &EngineConfig::default(),
        ten_days_out(),
    );
    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(
            DomainError::InvalidStatusTransition { .. }
        ))
    ));
}

#[test]
fn test_accept_charges_from_pending_fails() {
    let record: ModificationRecord = test_modification_record();
    let result = apply_modification(
        &test_booking(),
        &record,
        ModificationCommand::AcceptCharges { user_id: 100 },
        &EngineConfig::default(),
        ten_days_out(),
    );
    assert!(result.is_err());
}

#[test]
fn test_complete_applies_changes_to_booking() {
    let approved: ModificationRecord = approve(&test_modification_record());
    let processing: ModificationRecord = apply_modification(
        &test_booking(),
        &approved,
        ModificationCommand::AcceptCharges { user_id: 100 },
        &EngineConfig::default(),
        ten_days_out(),
    )
    .expect("transition permitted")
    .record;

    let transition: ModificationTransition = apply_modification(
        &test_booking(),
        &processing,
        ModificationCommand::Complete { admin_id: 7 },
        &EngineConfig::default(),
        ten_days_out(),
    )
    .expect("transition permitted");

    assert_eq!(transition.record.status, ModificationStatus::Completed);
    assert!(transition.record.completed_at.is_some());
    let changes = transition.booking_changes.expect("changes present");
    assert_eq!(changes.participants, Some(6));
    assert_eq!(changes.departure_date, None);
    assert_eq!(changes.total_amount, Decimal::from(3_000_000));
}

#[test]
fn test_complete_from_approved_fails() {
    let record: ModificationRecord = approve(&test_modification_record());
    let result = apply_modification(
        &test_booking(),
        &record,
        ModificationCommand::Complete { admin_id: 7 },
        &EngineConfig::default(),
        ten_days_out(),
    );
    assert!(result.is_err());
}

// ============================================================================
// UpdateDetails
// ============================================================================

#[test]
fn test_update_details_reprices_pending_request() {
    let record: ModificationRecord = test_modification_record();
    let transition = apply_modification(
        &test_booking(),
        &record,
        ModificationCommand::UpdateDetails {
            admin_id: 7,
            new_start_date: None,
            new_end_date: None,
            new_participants: Some(8),
        },
        &EngineConfig::default(),
        ten_days_out(),
    )
    .expect("transition permitted");

    assert_eq!(transition.record.status, ModificationStatus::Pending);
    assert_eq!(transition.record.new_participants, Some(8));
    // 4 -> 8 people at 500,000 each.
    assert_eq!(
        transition.record.quote.price_difference,
        Decimal::from(2_000_000)
    );
}

#[test]
fn test_update_details_outside_pending_fails() {
    let record: ModificationRecord = approve(&test_modification_record());
    let result = apply_modification(
        &test_booking(),
        &record,
        ModificationCommand::UpdateDetails {
            admin_id: 7,
            new_start_date: None,
            new_end_date: None,
            new_participants: Some(8),
        },
        &EngineConfig::default(),
        ten_days_out(),
    );
    assert!(result.is_err());
}

#[test]
fn test_update_details_revalidates() {
    let record: ModificationRecord = test_modification_record();
    let result = apply_modification(
        &test_booking(),
        &record,
        ModificationCommand::UpdateDetails {
            admin_id: 7,
            new_start_date: None,
            new_end_date: None,
            new_participants: Some(30),
        },
        &EngineConfig::default(),
        ten_days_out(),
    );
    assert!(matches!(result, Err(CoreError::ValidationFailed(_))));
}

#[test]
fn test_update_details_with_date_change() {
    let mut record: ModificationRecord = test_modification_record();
    record.modification_type = rebook_domain::ModificationType::DateAndParticipantChange;
    record.new_start_date =
        Some(Date::from_calendar_date(2026, Month::July, 1).expect("valid date"));

    let transition = apply_modification(
        &test_booking(),
        &record,
        ModificationCommand::UpdateDetails {
            admin_id: 7,
            new_start_date: Some(
                Date::from_calendar_date(2026, Month::July, 10).expect("valid date"),
            ),
            new_end_date: None,
            new_participants: Some(6),
        },
        &EngineConfig::default(),
        ten_days_out(),
    )
    .expect("transition permitted");

    assert_eq!(
        transition.record.new_start_date,
        Some(Date::from_calendar_date(2026, Month::July, 10).expect("valid date"))
    );
    // Combined-change fee on the middle tier.
    assert_eq!(
        transition.record.quote.processing_fee,
        Decimal::from(120_000)
    );
}
