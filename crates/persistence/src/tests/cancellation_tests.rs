// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Cancellation persistence tests.

use super::{memory_persistence, opening_history, seed_booking, test_cancellation, test_now};
use crate::Persistence;
use crate::error::PersistenceError;
use rebook::{
    Actor, BookingStatusUpdate, CancellationRecord, CancellationTransition, StatusHistoryEntry,
};
use rebook_domain::{
    Booking, CancellationStatus, ConfirmationStatus, EmergencyFlags, PaymentStatus, RefundMethod,
};
use rust_decimal::Decimal;
use time::Duration;

/// Builds a transition that moves a stored record to the given status.
fn transition_to(
    record: &CancellationRecord,
    status: CancellationStatus,
    booking_update: Option<BookingStatusUpdate>,
) -> CancellationTransition {
    let mut updated: CancellationRecord = record.clone();
    updated.status = status;
    CancellationTransition {
        record: updated,
        history: vec![StatusHistoryEntry {
            from_status: Some(record.status.as_str().to_string()),
            to_status: status.as_str().to_string(),
            changed_by: Actor::Admin(7),
            note: None,
            changed_at: test_now(),
        }],
        booking_update,
    }
}

// ============================================================================
// Insert and round-trip
// ============================================================================

#[test]
fn insert_assigns_id_and_round_trips() {
    let mut persistence: Persistence = memory_persistence();
    let booking_id: i64 = seed_booking(&mut persistence);

    let record: CancellationRecord = test_cancellation(booking_id, 100);
    let id: i64 = persistence
        .insert_cancellation(&record, &opening_history(&record))
        .expect("insert should succeed");
    assert!(id > 0);

    let stored: CancellationRecord = persistence
        .get_cancellation(id)
        .expect("stored record should load");
    assert_eq!(stored.id, id);
    assert_eq!(stored.booking_id, booking_id);
    assert_eq!(stored.status, CancellationStatus::Requested);
    assert_eq!(stored.reason, record.reason);
    assert_eq!(stored.refund_breakdown, record.refund_breakdown);
    assert_eq!(stored.requested_at, record.requested_at);
    assert_eq!(stored.version, 0);

    let history = persistence
        .get_cancellation_history(id)
        .expect("history should load");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].previous_status, None);
    assert_eq!(history[0].new_status, "requested");
    assert_eq!(history[0].changed_by, "customer:100");
}

#[test]
fn get_missing_cancellation_is_not_found() {
    let mut persistence: Persistence = memory_persistence();
    let result = persistence.get_cancellation(9999);
    assert!(matches!(result, Err(PersistenceError::NotFound(_))));
}

// ============================================================================
// One active cancellation per booking
// ============================================================================

#[test]
fn second_active_cancellation_for_booking_is_rejected() {
    let mut persistence: Persistence = memory_persistence();
    let booking_id: i64 = seed_booking(&mut persistence);

    let record: CancellationRecord = test_cancellation(booking_id, 100);
    persistence
        .insert_cancellation(&record, &opening_history(&record))
        .expect("first insert should succeed");

    let result = persistence.insert_cancellation(&record, &opening_history(&record));
    assert!(matches!(
        result,
        Err(PersistenceError::DuplicateActiveCancellation { booking_id: b }) if b == booking_id
    ));
}

#[test]
fn new_request_is_allowed_after_terminal_state() {
    let mut persistence: Persistence = memory_persistence();
    let booking_id: i64 = seed_booking(&mut persistence);

    let record: CancellationRecord = test_cancellation(booking_id, 100);
    let id: i64 = persistence
        .insert_cancellation(&record, &opening_history(&record))
        .expect("first insert should succeed");

    let stored: CancellationRecord = persistence.get_cancellation(id).expect("record loads");
    let rejection: CancellationTransition =
        transition_to(&stored, CancellationStatus::Rejected, None);
    persistence
        .update_cancellation(&rejection)
        .expect("rejection should apply");

    // The partial unique index only covers non-terminal statuses.
    let second: CancellationRecord = test_cancellation(booking_id, 100);
    persistence
        .insert_cancellation(&second, &opening_history(&second))
        .expect("new request after rejection should succeed");
}

// ============================================================================
// Version-checked updates
// ============================================================================

#[test]
fn update_bumps_version_and_appends_history() {
    let mut persistence: Persistence = memory_persistence();
    let booking_id: i64 = seed_booking(&mut persistence);

    let record: CancellationRecord = test_cancellation(booking_id, 100);
    let id: i64 = persistence
        .insert_cancellation(&record, &opening_history(&record))
        .expect("insert should succeed");

    let stored: CancellationRecord = persistence.get_cancellation(id).expect("record loads");
    let mut approved: CancellationRecord = stored.clone();
    approved.status = CancellationStatus::Approved;
    approved.reviewed_by = Some(7);
    approved.reviewed_at = Some(test_now());
    approved.admin_notes = Some(String::from("verified with the customer by phone"));
    let transition: CancellationTransition = CancellationTransition {
        record: approved,
        history: vec![StatusHistoryEntry {
            from_status: Some(String::from("requested")),
            to_status: String::from("approved"),
            changed_by: Actor::Admin(7),
            note: None,
            changed_at: test_now(),
        }],
        booking_update: None,
    };
    persistence
        .update_cancellation(&transition)
        .expect("approval should apply");

    let reloaded: CancellationRecord = persistence.get_cancellation(id).expect("record loads");
    assert_eq!(reloaded.status, CancellationStatus::Approved);
    assert_eq!(reloaded.reviewed_by, Some(7));
    assert_eq!(reloaded.version, 1);

    let history = persistence
        .get_cancellation_history(id)
        .expect("history should load");
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].previous_status.as_deref(), Some("requested"));
    assert_eq!(history[1].new_status, "approved");
    assert_eq!(history[1].changed_by, "admin:7");
}

#[test]
fn stale_version_surfaces_concurrent_modification() {
    let mut persistence: Persistence = memory_persistence();
    let booking_id: i64 = seed_booking(&mut persistence);

    let record: CancellationRecord = test_cancellation(booking_id, 100);
    let id: i64 = persistence
        .insert_cancellation(&record, &opening_history(&record))
        .expect("insert should succeed");

    let mut stale: CancellationRecord = persistence.get_cancellation(id).expect("record loads");
    stale.version = 5;
    let transition: CancellationTransition =
        transition_to(&stale, CancellationStatus::Approved, None);
    let result = persistence.update_cancellation(&transition);
    assert!(matches!(
        result,
        Err(PersistenceError::ConcurrentModification { id: conflicted, .. }) if conflicted == id
    ));

    // The record is untouched and a refreshed read succeeds.
    let reloaded: CancellationRecord = persistence.get_cancellation(id).expect("record loads");
    assert_eq!(reloaded.status, CancellationStatus::Requested);
    assert_eq!(reloaded.version, 0);
    let retry: CancellationTransition =
        transition_to(&reloaded, CancellationStatus::Approved, None);
    persistence
        .update_cancellation(&retry)
        .expect("retry against refreshed state should succeed");
}

#[test]
fn refund_transition_updates_booking_in_same_transaction() {
    let mut persistence: Persistence = memory_persistence();
    let booking_id: i64 = seed_booking(&mut persistence);

    let record: CancellationRecord = test_cancellation(booking_id, 100);
    let id: i64 = persistence
        .insert_cancellation(&record, &opening_history(&record))
        .expect("insert should succeed");

    let stored: CancellationRecord = persistence.get_cancellation(id).expect("record loads");
    let mut refunded: CancellationRecord = stored.clone();
    refunded.status = CancellationStatus::Refunded;
    refunded.refund_transaction_reference = Some(String::from("TXN-2026-0001"));
    refunded.refund_method_used = Some(RefundMethod::BankTransfer);
    refunded.refund_processed_at = Some(test_now());
    let transition: CancellationTransition = CancellationTransition {
        record: refunded,
        history: vec![
            StatusHistoryEntry {
                from_status: Some(String::from("requested")),
                to_status: String::from("refund_pending"),
                changed_by: Actor::Admin(7),
                note: Some(String::from("refund initiated")),
                changed_at: test_now(),
            },
            StatusHistoryEntry {
                from_status: Some(String::from("refund_pending")),
                to_status: String::from("refunded"),
                changed_by: Actor::Admin(7),
                note: None,
                changed_at: test_now(),
            },
        ],
        booking_update: Some(BookingStatusUpdate {
            payment_status: PaymentStatus::PartiallyRefunded,
            confirmation_status: ConfirmationStatus::Cancelled,
        }),
    };
    persistence
        .update_cancellation(&transition)
        .expect("refund transition should apply");

    let booking: Booking = persistence.get_booking(booking_id).expect("booking loads");
    assert_eq!(booking.payment_status, PaymentStatus::PartiallyRefunded);
    assert_eq!(booking.confirmation_status, ConfirmationStatus::Cancelled);

    let reloaded: CancellationRecord = persistence.get_cancellation(id).expect("record loads");
    assert_eq!(
        reloaded.refund_transaction_reference.as_deref(),
        Some("TXN-2026-0001")
    );
    assert_eq!(reloaded.refund_method_used, Some(RefundMethod::BankTransfer));
    let history = persistence
        .get_cancellation_history(id)
        .expect("history should load");
    assert_eq!(history.len(), 3);
}

// ============================================================================
// Listing queries
// ============================================================================

#[test]
fn listing_queries_filter_and_order() {
    let mut persistence: Persistence = memory_persistence();
    let first_booking: i64 = seed_booking(&mut persistence);
    let second_booking: i64 = seed_booking(&mut persistence);
    let third_booking: i64 = seed_booking(&mut persistence);

    // Oldest: a plain request from user 100.
    let mut plain: CancellationRecord = test_cancellation(first_booking, 100);
    plain.requested_at = test_now() - Duration::hours(2);
    let plain_id: i64 = persistence
        .insert_cancellation(&plain, &opening_history(&plain))
        .expect("insert should succeed");

    // Middle: an emergency request from user 200 already under review.
    let mut emergency: CancellationRecord = test_cancellation(second_booking, 200);
    emergency.status = CancellationStatus::UnderReview;
    emergency.emergency_flags = EmergencyFlags {
        is_medical_emergency: true,
        is_weather_related: false,
        is_force_majeure: false,
    };
    emergency.reason = String::from("Hospitalized after a traffic accident last week");
    emergency.requested_at = test_now() - Duration::hours(1);
    let emergency_id: i64 = persistence
        .insert_cancellation(&emergency, &opening_history(&emergency))
        .expect("insert should succeed");

    // Newest: an approved request from user 100 awaiting its refund.
    let mut approved: CancellationRecord = test_cancellation(third_booking, 100);
    approved.status = CancellationStatus::Approved;
    approved.requested_at = test_now();
    let approved_id: i64 = persistence
        .insert_cancellation(&approved, &opening_history(&approved))
        .expect("insert should succeed");

    let pending = persistence
        .list_pending_cancellations()
        .expect("pending listing should load");
    assert_eq!(
        pending.iter().map(|r| r.id).collect::<Vec<i64>>(),
        vec![plain_id, emergency_id]
    );

    let emergencies = persistence
        .list_emergency_cancellations()
        .expect("emergency listing should load");
    assert_eq!(
        emergencies.iter().map(|r| r.id).collect::<Vec<i64>>(),
        vec![emergency_id]
    );

    let awaiting = persistence
        .list_cancellations_awaiting_refund()
        .expect("awaiting-refund listing should load");
    assert_eq!(
        awaiting.iter().map(|r| r.id).collect::<Vec<i64>>(),
        vec![approved_id]
    );

    let by_status = persistence
        .list_cancellations_by_status(CancellationStatus::UnderReview)
        .expect("status listing should load");
    assert_eq!(
        by_status.iter().map(|r| r.id).collect::<Vec<i64>>(),
        vec![emergency_id]
    );

    // Newest first for the per-user view.
    let mine = persistence
        .list_cancellations_by_user(100)
        .expect("user listing should load");
    assert_eq!(
        mine.iter().map(|r| r.id).collect::<Vec<i64>>(),
        vec![approved_id, plain_id]
    );

    let searched = persistence
        .search_cancellations_by_reason("traffic accident")
        .expect("search should load");
    assert_eq!(
        searched.iter().map(|r| r.id).collect::<Vec<i64>>(),
        vec![emergency_id]
    );

    let windowed = persistence
        .list_cancellations_by_date_range(
            test_now() - Duration::minutes(90),
            test_now() + Duration::minutes(1),
        )
        .expect("date-range listing should load");
    assert_eq!(
        windowed.iter().map(|r| r.id).collect::<Vec<i64>>(),
        vec![emergency_id, approved_id]
    );
}

#[test]
fn booking_lookup_returns_latest_cancellation() {
    let mut persistence: Persistence = memory_persistence();
    let booking_id: i64 = seed_booking(&mut persistence);

    let mut first: CancellationRecord = test_cancellation(booking_id, 100);
    first.requested_at = test_now() - Duration::days(30);
    let first_id: i64 = persistence
        .insert_cancellation(&first, &opening_history(&first))
        .expect("insert should succeed");

    let stored: CancellationRecord = persistence.get_cancellation(first_id).expect("loads");
    let rejection: CancellationTransition =
        transition_to(&stored, CancellationStatus::Rejected, None);
    persistence
        .update_cancellation(&rejection)
        .expect("rejection should apply");

    let second: CancellationRecord = test_cancellation(booking_id, 100);
    let second_id: i64 = persistence
        .insert_cancellation(&second, &opening_history(&second))
        .expect("insert should succeed");

    let latest = persistence
        .get_cancellation_for_booking(booking_id)
        .expect("lookup should succeed")
        .expect("a cancellation exists");
    assert_eq!(latest.id, second_id);

    assert!(
        persistence
            .get_cancellation_for_booking(booking_id + 100)
            .expect("lookup should succeed")
            .is_none()
    );
}

#[test]
fn recent_count_ignores_unreviewed_and_rejected_requests() {
    let mut persistence: Persistence = memory_persistence();
    let first_booking: i64 = seed_booking(&mut persistence);
    let second_booking: i64 = seed_booking(&mut persistence);
    let third_booking: i64 = seed_booking(&mut persistence);

    let requested: CancellationRecord = test_cancellation(first_booking, 100);
    persistence
        .insert_cancellation(&requested, &opening_history(&requested))
        .expect("insert should succeed");

    let mut refunded: CancellationRecord = test_cancellation(second_booking, 100);
    refunded.status = CancellationStatus::Refunded;
    persistence
        .insert_cancellation(&refunded, &opening_history(&refunded))
        .expect("insert should succeed");

    let mut approved: CancellationRecord = test_cancellation(third_booking, 100);
    approved.status = CancellationStatus::Approved;
    approved.requested_at = test_now() - Duration::days(120);
    persistence
        .insert_cancellation(&approved, &opening_history(&approved))
        .expect("insert should succeed");

    // Only the refunded one is both counted and inside the window.
    let count: u64 = persistence
        .count_recent_cancellations_by_user(100, test_now() - Duration::days(90))
        .expect("count should succeed");
    assert_eq!(count, 1);

    let bookings: u64 = persistence
        .count_bookings_by_customer_since(100, test_now() - Duration::days(90))
        .expect("count should succeed");
    assert_eq!(bookings, 3);
}

#[test]
fn net_refund_amount_round_trips_exactly() {
    let mut persistence: Persistence = memory_persistence();
    let booking_id: i64 = seed_booking(&mut persistence);

    let mut record: CancellationRecord = test_cancellation(booking_id, 100);
    record.refund_breakdown.net_refund = Decimal::new(1_549_999_5, 1); // 1549999.5
    let id: i64 = persistence
        .insert_cancellation(&record, &opening_history(&record))
        .expect("insert should succeed");

    let stored: CancellationRecord = persistence.get_cancellation(id).expect("record loads");
    assert_eq!(stored.refund_breakdown.net_refund, Decimal::new(1_549_999_5, 1));
}
