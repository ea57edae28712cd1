// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for evaluation and record construction.

use crate::error::CoreError;
use crate::evaluate::{evaluate_cancellation, new_cancellation, new_modification};
use crate::tests::helpers::{
    ten_days_out, test_booking, test_cancellation_request, test_modification_request,
};
use rebook_domain::{
    Booking, CancellationRequest, CancellationStatus, ConfirmationStatus, DomainError,
    EngineConfig, ModificationStatus,
};
use rust_decimal::Decimal;

// ============================================================================
// Cancellation evaluation
// ============================================================================

#[test]
fn test_evaluate_ten_days_out() {
    let evaluation = evaluate_cancellation(
        &test_booking(),
        &test_cancellation_request(),
        &EngineConfig::default(),
        ten_days_out(),
    )
    .expect("valid request");

    assert_eq!(evaluation.days_before_departure, 10);
    assert_eq!(evaluation.breakdown.net_refund, Decimal::from(1_550_000));
    assert!(!evaluation.fast_tracked);
}

#[test]
fn test_evaluate_is_deterministic() {
    let booking: Booking = test_booking();
    let request: CancellationRequest = test_cancellation_request();
    let config: EngineConfig = EngineConfig::default();

    let first = evaluate_cancellation(&booking, &request, &config, ten_days_out())
        .expect("valid request");
    let second = evaluate_cancellation(&booking, &request, &config, ten_days_out())
        .expect("valid request");
    assert_eq!(first, second);
}

#[test]
fn test_evaluate_does_not_require_acknowledgments() {
    let mut request: CancellationRequest = test_cancellation_request();
    request.acknowledges_cancellation_policy = false;
    request.acknowledges_refund_terms = false;

    let result = evaluate_cancellation(
        &test_booking(),
        &request,
        &EngineConfig::default(),
        ten_days_out(),
    );
    assert!(result.is_ok());
}

#[test]
fn test_evaluate_rejects_completed_booking() {
    let mut booking: Booking = test_booking();
    booking.confirmation_status = ConfirmationStatus::Completed;

    let result = evaluate_cancellation(
        &booking,
        &test_cancellation_request(),
        &EngineConfig::default(),
        ten_days_out(),
    );
    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(
            DomainError::BookingNotCancellable { .. }
        ))
    ));
}

#[test]
fn test_evaluate_rejects_already_cancelled_booking() {
    let mut booking: Booking = test_booking();
    booking.confirmation_status = ConfirmationStatus::Cancelled;

    let result = evaluate_cancellation(
        &booking,
        &test_cancellation_request(),
        &EngineConfig::default(),
        ten_days_out(),
    );
    assert!(result.is_err());
}

// ============================================================================
// Cancellation record construction
// ============================================================================

#[test]
fn test_new_cancellation_starts_requested() {
    let transition = new_cancellation(
        &test_booking(),
        &test_cancellation_request(),
        &EngineConfig::default(),
        ten_days_out(),
    )
    .expect("valid request");

    assert_eq!(transition.record.status, CancellationStatus::Requested);
    assert_eq!(transition.record.user_id, 100);
    assert_eq!(transition.record.version, 0);
    assert_eq!(transition.history.len(), 1);
    assert_eq!(transition.history[0].from_status, None);
    assert_eq!(transition.history[0].to_status, "requested");
    assert!(transition.booking_update.is_none());
}

#[test]
fn test_new_cancellation_fast_tracks_emergencies() {
    let mut request: CancellationRequest = test_cancellation_request();
    request.emergency_flags.is_medical_emergency = true;

    let transition = new_cancellation(
        &test_booking(),
        &request,
        &EngineConfig::default(),
        ten_days_out(),
    )
    .expect("valid request");

    assert_eq!(transition.record.status, CancellationStatus::UnderReview);
    assert_eq!(transition.history[0].to_status, "under_review");
    assert!(transition.history[0].note.is_some());
}

#[test]
fn test_new_cancellation_requires_acknowledgments() {
    let mut request: CancellationRequest = test_cancellation_request();
    request.acknowledges_refund_terms = false;

    let result = new_cancellation(
        &test_booking(),
        &request,
        &EngineConfig::default(),
        ten_days_out(),
    );
    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(
            DomainError::AcknowledgmentMissing { .. }
        ))
    ));
}

// ============================================================================
// Modification record construction
// ============================================================================

#[test]
fn test_new_modification_starts_pending_with_quote() {
    let transition = new_modification(
        &test_booking(),
        &test_modification_request(),
        &EngineConfig::default(),
        ten_days_out(),
    )
    .expect("valid request");

    assert_eq!(transition.record.status, ModificationStatus::Pending);
    // 4 -> 6 people at 500,000, plus a 50,000 participant-change fee.
    assert_eq!(
        transition.record.quote.price_difference,
        Decimal::from(1_000_000)
    );
    assert_eq!(
        transition.record.quote.total_additional,
        Decimal::from(1_050_000)
    );
    assert_eq!(transition.history.len(), 1);
    assert_eq!(transition.history[0].from_status, None);
    assert!(transition.booking_changes.is_none());
}

#[test]
fn test_new_modification_collects_all_violations() {
    let mut booking: Booking = test_booking();
    booking.confirmation_status = ConfirmationStatus::Pending;
    let mut request = test_modification_request();
    request.new_participants = Some(30);

    let result = new_modification(
        &booking,
        &request,
        &EngineConfig::default(),
        ten_days_out(),
    );
    match result {
        Err(CoreError::ValidationFailed(errors)) => assert!(errors.len() >= 2),
        other => panic!("expected ValidationFailed, got {other:?}"),
    }
}
