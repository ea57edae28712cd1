// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Shared fixtures for the core test suite.

use crate::evaluate::{new_cancellation, new_modification};
use crate::state::{CancellationRecord, ModificationRecord};
use rebook_domain::{
    Booking, CancellationReason, CancellationRequest, ConfirmationStatus, EmergencyFlags,
    EngineConfig, ModificationRequest, ModificationType, PaymentStatus, RefundMethod,
};
use rust_decimal::Decimal;
use time::{Date, Month, OffsetDateTime};

/// Standard test booking: 2,000,000 VND total for 4 people, departing
/// 2026-06-15.
pub fn test_booking() -> Booking {
    Booking {
        booking_id: 1,
        tour_id: 10,
        customer_id: 100,
        departure_date: Date::from_calendar_date(2026, Month::June, 15).expect("valid test date"),
        participants: 4,
        tour_capacity: 20,
        total_amount: Decimal::from(2_000_000),
        per_person_price: Decimal::from(500_000),
        payment_status: PaymentStatus::Paid,
        confirmation_status: ConfirmationStatus::Confirmed,
    }
}

/// A fixed instant ten days before the test booking's departure.
pub fn ten_days_out() -> OffsetDateTime {
    Date::from_calendar_date(2026, Month::June, 5)
        .expect("valid test date")
        .midnight()
        .assume_utc()
}

/// A valid, fully acknowledged cancellation request with no emergency
/// flags.
pub fn test_cancellation_request() -> CancellationRequest {
    CancellationRequest {
        booking_id: 1,
        reason_category: CancellationReason::ScheduleConflict,
        reason: String::from("A work commitment now overlaps the tour dates."),
        additional_notes: None,
        emergency_flags: EmergencyFlags::default(),
        supporting_documents: Vec::new(),
        emergency_contact_name: None,
        emergency_contact_phone: None,
        emergency_contact_relationship: None,
        preferred_refund_method: RefundMethod::OriginalMethod,
        acknowledges_cancellation_policy: true,
        acknowledges_refund_terms: true,
    }
}

/// A cancellation record freshly created from the standard fixtures.
pub fn test_cancellation_record() -> CancellationRecord {
    new_cancellation(
        &test_booking(),
        &test_cancellation_request(),
        &EngineConfig::default(),
        ten_days_out(),
    )
    .expect("valid test request")
    .record
}

/// A cancellation record with force-majeure flags set, created from the
/// standard fixtures (starts in review).
pub fn test_emergency_record() -> CancellationRecord {
    let mut request: CancellationRequest = test_cancellation_request();
    request.emergency_flags.is_force_majeure = true;
    request.reason_category = CancellationReason::ForceMajeure;
    new_cancellation(
        &test_booking(),
        &request,
        &EngineConfig::default(),
        ten_days_out(),
    )
    .expect("valid test request")
    .record
}

/// A valid participant-change modification request (4 -> 6 people).
pub fn test_modification_request() -> ModificationRequest {
    ModificationRequest {
        booking_id: 1,
        modification_type: ModificationType::ParticipantChange,
        new_start_date: None,
        new_end_date: None,
        new_participants: Some(6),
        reason: Some(String::from("two friends are joining")),
        customer_notes: None,
    }
}

/// A modification record freshly created from the standard fixtures.
pub fn test_modification_record() -> ModificationRecord {
    new_modification(
        &test_booking(),
        &test_modification_request(),
        &EngineConfig::default(),
        ten_days_out(),
    )
    .expect("valid test request")
    .record
}
