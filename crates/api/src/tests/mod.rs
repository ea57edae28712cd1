// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Shared fixtures for the API handler tests.

#![allow(clippy::expect_used, clippy::unwrap_used)]


use std::cell::RefCell;

use rebook_domain::{
    Booking, CancellationReason, CancellationRequest, ConfirmationStatus, EmergencyFlags,
    EngineConfig, ModificationRequest, ModificationType, PaymentStatus, RefundMethod,
};
use rebook_persistence::Persistence;
use rust_decimal::Decimal;
use time::{Date, Month, OffsetDateTime};

use crate::auth::{AuthenticatedActor, Role};
use crate::notify::{Notification, Notifier, NotifyError};

/// Notifier that records every event it is asked to deliver.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: RefCell<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.borrow_mut().push(notification.clone());
        Ok(())
    }
}

/// Notifier whose deliveries always fail, for fire-and-forget checks.
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError(String::from("smtp relay unreachable")))
    }
}

pub fn admin() -> AuthenticatedActor {
    AuthenticatedActor::new(7, Role::Admin)
}

pub fn customer() -> AuthenticatedActor {
    AuthenticatedActor::new(100, Role::Customer)
}

pub fn other_customer() -> AuthenticatedActor {
    AuthenticatedActor::new(200, Role::Customer)
}

/// A fixed instant ten days before the test booking's departure.
pub fn test_now() -> OffsetDateTime {
    Date::from_calendar_date(2026, Month::June, 5)
        .expect("valid test date")
        .with_hms(9, 0, 0)
        .expect("valid test time")
        .assume_utc()
}

/// Standard test booking: 2,000,000 VND total for 4 people, departing
/// 2026-06-15, owned by customer 100.
pub fn test_booking() -> Booking {
    Booking {
        booking_id: 0,
        tour_id: 10,
        customer_id: 100,
        departure_date: Date::from_calendar_date(2026, Month::June, 15)
            .expect("valid test date"),
        participants: 4,
        tour_capacity: 20,
        total_amount: Decimal::from(2_000_000),
        per_person_price: Decimal::from(500_000),
        payment_status: PaymentStatus::Paid,
        confirmation_status: ConfirmationStatus::Confirmed,
    }
}

/// Inserts the standard booking and returns its assigned id.
pub fn seed_booking(persistence: &mut Persistence) -> i64 {
    persistence
        .register_booking(&test_booking(), test_now())
        .expect("booking insert should succeed")
}

pub fn memory_persistence() -> Persistence {
    Persistence::new_in_memory().expect("in-memory database should initialize")
}

pub fn test_config() -> EngineConfig {
    EngineConfig::default()
}

/// A fully acknowledged cancellation request with no emergency flags.
pub fn cancellation_request(booking_id: i64) -> CancellationRequest {
    CancellationRequest {
        booking_id,
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

/// A participant-change modification request (4 -> 6 people).
pub fn modification_request(booking_id: i64) -> ModificationRequest {
    ModificationRequest {
        booking_id,
        modification_type: ModificationType::ParticipantChange,
        new_start_date: None,
        new_end_date: None,
        new_participants: Some(6),
        reason: Some(String::from("two friends are joining")),
        customer_notes: None,
    }
}
