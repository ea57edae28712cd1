// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod cancellation_tests;

use crate::Persistence;
use rebook::{Actor, CancellationRecord, ModificationRecord, StatusHistoryEntry};
use rebook_domain::{
    Booking, CancellationReason, CancellationStatus, ConfirmationStatus, EmergencyFlags,
    ModificationStatus, ModificationType, PaymentStatus, PriceQuote, RefundBreakdown,
    RefundMethod,
};
use rust_decimal::Decimal;
use time::macros::datetime;
use time::{Date, Month, OffsetDateTime};

pub fn memory_persistence() -> Persistence {
    Persistence::new_in_memory().expect("in-memory database should initialize")
}

pub fn test_now() -> OffsetDateTime {
    datetime!(2026-06-05 09:00 UTC)
}

pub fn test_departure() -> Date {
    Date::from_calendar_date(2026, Month::June, 15).expect("valid date")
}

pub fn test_booking() -> Booking {
    Booking {
        booking_id: 0,
        tour_id: 10,
        customer_id: 100,
        departure_date: test_departure(),
        participants: 4,
        tour_capacity: 20,
        total_amount: Decimal::from(2_000_000),
        per_person_price: Decimal::from(500_000),
        payment_status: PaymentStatus::Paid,
        confirmation_status: ConfirmationStatus::Confirmed,
    }
}

pub fn test_breakdown() -> RefundBreakdown {
    RefundBreakdown {
        refund_percentage: Decimal::from(80),
        gross_refund: Decimal::from(1_600_000),
        processing_fee: Decimal::from(50_000),
        net_refund: Decimal::from(1_550_000),
        fee_waived: false,
        floor_applied: false,
    }
}

pub fn test_cancellation(booking_id: i64, user_id: i64) -> CancellationRecord {
    CancellationRecord {
        id: 0,
        booking_id,
        user_id,
        status: CancellationStatus::Requested,
        reason_category: CancellationReason::ScheduleConflict,
        reason: String::from("A work trip was moved onto the departure date"),
        additional_notes: None,
        emergency_flags: EmergencyFlags::default(),
        supporting_documents: vec![],
        emergency_contact_name: None,
        emergency_contact_phone: None,
        emergency_contact_relationship: None,
        preferred_refund_method: RefundMethod::OriginalMethod,
        days_before_departure: 10,
        refund_breakdown: test_breakdown(),
        requested_at: test_now(),
        reviewed_by: None,
        reviewed_at: None,
        admin_notes: None,
        refund_transaction_reference: None,
        refund_method_used: None,
        refund_processed_at: None,
        version: 0,
    }
}

pub fn opening_history(record: &CancellationRecord) -> Vec<StatusHistoryEntry> {
    vec![StatusHistoryEntry {
        from_status: None,
        to_status: record.status.as_str().to_string(),
        changed_by: Actor::Customer(record.user_id),
        note: None,
        changed_at: record.requested_at,
    }]
}

pub fn test_quote() -> PriceQuote {
    PriceQuote {
        original_amount: Decimal::from(2_000_000),
        new_amount: Decimal::from(3_000_000),
        price_difference: Decimal::from(1_000_000),
        processing_fee: Decimal::from(50_000),
        total_additional: Decimal::from(1_050_000),
        requires_additional_payment: true,
        offers_refund: false,
    }
}

pub fn test_modification(booking_id: i64, user_id: i64) -> ModificationRecord {
    ModificationRecord {
        id: 0,
        booking_id,
        user_id,
        status: ModificationStatus::Pending,
        modification_type: ModificationType::ParticipantChange,
        new_start_date: None,
        new_end_date: None,
        new_participants: Some(6),
        reason: Some(String::from("two more family members joined")),
        customer_notes: None,
        days_before_departure: 10,
        quote: test_quote(),
        requested_at: test_now(),
        reviewed_by: None,
        reviewed_at: None,
        admin_notes: None,
        charges_accepted_at: None,
        completed_at: None,
        version: 0,
    }
}

pub fn modification_opening_history(record: &ModificationRecord) -> Vec<StatusHistoryEntry> {
    vec![StatusHistoryEntry {
        from_status: None,
        to_status: record.status.as_str().to_string(),
        changed_by: Actor::Customer(record.user_id),
        note: None,
        changed_at: record.requested_at,
    }]
}

/// Registers the standard test booking and returns its assigned id.
pub fn seed_booking(persistence: &mut Persistence) -> i64 {
    persistence
        .register_booking(&test_booking(), test_now())
        .expect("booking registration should succeed")
}
