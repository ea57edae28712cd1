// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Booking queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use rebook_domain::Booking;
use time::OffsetDateTime;

use crate::data_models::{BookingRow, booking_from_row, format_datetime};
use crate::diesel_schema::bookings::dsl;
use crate::error::PersistenceError;

/// Looks up a booking by identifier.
///
/// # Errors
///
/// Returns [`PersistenceError::NotFound`] if no such booking exists,
/// or an error if the query or row conversion fails.
pub fn get_booking(conn: &mut SqliteConnection, booking_id: i64) -> Result<Booking, PersistenceError> {
    let row: Option<BookingRow> = dsl::bookings
        .filter(dsl::booking_id.eq(booking_id))
        .first::<BookingRow>(conn)
        .optional()?;
    match row {
        Some(row) => booking_from_row(&row),
        None => Err(PersistenceError::NotFound(format!(
            "booking {booking_id} not found"
        ))),
    }
}

/// Counts bookings a customer created at or after the given instant.
///
/// Feeds the abuse-ratio denominator. Timestamps are stored as
/// RFC 3339 UTC text, which compares chronologically.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_bookings_by_customer_since(
    conn: &mut SqliteConnection,
    customer_id: i64,
    since: OffsetDateTime,
) -> Result<u64, PersistenceError> {
    let since_text: String = format_datetime(since)?;
    let count: i64 = dsl::bookings
        .filter(dsl::customer_id.eq(customer_id))
        .filter(dsl::created_at.ge(since_text))
        .count()
        .get_result(conn)?;
    Ok(count.unsigned_abs())
}
