// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod abuse_tests;
mod refund_tests;

use crate::types::{Booking, ConfirmationStatus, PaymentStatus};
use rust_decimal::Decimal;
use time::{Date, Month, OffsetDateTime};

/// Standard test booking: 2,000,000 VND total for 4 people.
pub fn create_test_booking() -> Booking {
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
