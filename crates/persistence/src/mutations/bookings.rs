// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Booking persistence mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use rebook::{BookingChanges, BookingStatusUpdate};
use rebook_domain::Booking;
use time::OffsetDateTime;
use tracing::debug;

use crate::backend::get_last_insert_rowid;
use crate::data_models::{booking_to_new_row, format_date};
use crate::diesel_schema;
use crate::error::PersistenceError;

/// Inserts a booking and returns its assigned identifier.
///
/// # Errors
///
/// Returns an error if serialization or the insert fails.
pub fn insert_booking(
    conn: &mut SqliteConnection,
    booking: &Booking,
    now: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    let new_row = booking_to_new_row(booking, now)?;
    diesel::insert_into(diesel_schema::bookings::table)
        .values(&new_row)
        .execute(conn)?;
    let booking_id: i64 = get_last_insert_rowid(conn)?;
    debug!(booking_id, "inserted booking");
    Ok(booking_id)
}

/// Applies a payment/confirmation status update to a booking.
///
/// # Errors
///
/// Returns [`PersistenceError::NotFound`] if the booking does not
/// exist, or an error if the update fails.
pub fn apply_booking_status_update(
    conn: &mut SqliteConnection,
    booking_id: i64,
    update: &BookingStatusUpdate,
) -> Result<(), PersistenceError> {
    use diesel_schema::bookings::dsl;

    let affected: usize = diesel::update(dsl::bookings.filter(dsl::booking_id.eq(booking_id)))
        .set((
            dsl::payment_status.eq(update.payment_status.as_str()),
            dsl::confirmation_status.eq(update.confirmation_status.as_str()),
        ))
        .execute(conn)?;
    if affected == 0 {
        return Err(PersistenceError::NotFound(format!(
            "booking {booking_id} not found"
        )));
    }
    debug!(
        booking_id,
        payment_status = update.payment_status.as_str(),
        confirmation_status = update.confirmation_status.as_str(),
        "updated booking status"
    );
    Ok(())
}

/// Applies completed modification changes to a booking.
///
/// Only the fields the modification touched are written; the new
/// total always is.
///
/// # Errors
///
/// Returns [`PersistenceError::NotFound`] if the booking does not
/// exist, or an error if the update fails.
pub fn apply_booking_changes(
    conn: &mut SqliteConnection,
    booking_id: i64,
    changes: &BookingChanges,
) -> Result<(), PersistenceError> {
    use diesel_schema::bookings::dsl;

    let total_amount: String = changes.total_amount.to_string();
    let affected: usize = match (changes.departure_date, changes.participants) {
        (Some(departure), Some(participants)) => {
            let date_text: String = format_date(departure)?;
            let count: i32 = participant_count(participants)?;
            diesel::update(dsl::bookings.filter(dsl::booking_id.eq(booking_id)))
                .set((
                    dsl::departure_date.eq(date_text),
                    dsl::participants.eq(count),
                    dsl::total_amount.eq(&total_amount),
                ))
                .execute(conn)?
        }
        (Some(departure), None) => {
            let date_text: String = format_date(departure)?;
            diesel::update(dsl::bookings.filter(dsl::booking_id.eq(booking_id)))
                .set((
                    dsl::departure_date.eq(date_text),
                    dsl::total_amount.eq(&total_amount),
                ))
                .execute(conn)?
        }
        (None, Some(participants)) => {
            let count: i32 = participant_count(participants)?;
            diesel::update(dsl::bookings.filter(dsl::booking_id.eq(booking_id)))
                .set((
                    dsl::participants.eq(count),
                    dsl::total_amount.eq(&total_amount),
                ))
                .execute(conn)?
        }
        (None, None) => diesel::update(dsl::bookings.filter(dsl::booking_id.eq(booking_id)))
            .set(dsl::total_amount.eq(&total_amount))
            .execute(conn)?,
    };
    if affected == 0 {
        return Err(PersistenceError::NotFound(format!(
            "booking {booking_id} not found"
        )));
    }
    debug!(booking_id, "applied modification changes to booking");
    Ok(())
}

fn participant_count(value: u32) -> Result<i32, PersistenceError> {
    i32::try_from(value)
        .map_err(|_| PersistenceError::SerializationError(String::from("participants overflow")))
}
