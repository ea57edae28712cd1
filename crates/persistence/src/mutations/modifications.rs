// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Modification persistence mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use rebook::{ModificationRecord, ModificationTransition, StatusHistoryEntry};
use tracing::debug;

use crate::backend::get_last_insert_rowid;
use crate::data_models::{
    format_date, format_datetime, modification_history_to_new_row, modification_to_new_row,
};
use crate::diesel_schema;
use crate::error::PersistenceError;
use crate::mutations::bookings::apply_booking_changes;

/// Inserts a new modification request with its opening history.
///
/// # Errors
///
/// Returns an error if serialization or the insert fails.
pub fn insert_modification(
    conn: &mut SqliteConnection,
    record: &ModificationRecord,
    history: &[StatusHistoryEntry],
) -> Result<i64, PersistenceError> {
    conn.transaction::<i64, PersistenceError, _>(|conn| {
        let new_row = modification_to_new_row(record)?;
        diesel::insert_into(diesel_schema::booking_modifications::table)
            .values(&new_row)
            .execute(conn)?;
        let modification_id: i64 = get_last_insert_rowid(conn)?;
        insert_history_rows(conn, modification_id, history)?;
        debug!(
            modification_id,
            booking_id = record.booking_id,
            modification_type = record.modification_type.as_str(),
            "inserted modification request"
        );
        Ok(modification_id)
    })
}

/// Applies a modification transition produced by the core layer.
///
/// The update is guarded by the version the caller read; losing the
/// race surfaces as [`PersistenceError::ConcurrentModification`].
/// When the transition completes the modification, the booking
/// changes land in the same transaction.
///
/// # Errors
///
/// Returns an error if the version check fails, serialization fails,
/// or any write fails.
#[allow(clippy::too_many_lines)]
pub fn update_modification(
    conn: &mut SqliteConnection,
    transition: &ModificationTransition,
) -> Result<(), PersistenceError> {
    conn.transaction::<(), PersistenceError, _>(|conn| {
        use diesel_schema::booking_modifications::dsl;

        let record: &ModificationRecord = &transition.record;
        let expected_version: i64 = record.version;
        let new_start_date: Option<String> = record.new_start_date.map(format_date).transpose()?;
        let new_end_date: Option<String> = record.new_end_date.map(format_date).transpose()?;
        let new_participants: Option<i32> = record
            .new_participants
            .map(|v| {
                i32::try_from(v).map_err(|_| {
                    PersistenceError::SerializationError(String::from(
                        "new_participants overflow",
                    ))
                })
            })
            .transpose()?;
        let reviewed_at: Option<String> = record.reviewed_at.map(format_datetime).transpose()?;
        let charges_accepted_at: Option<String> =
            record.charges_accepted_at.map(format_datetime).transpose()?;
        let completed_at: Option<String> = record.completed_at.map(format_datetime).transpose()?;
        let days: i32 = i32::try_from(record.days_before_departure).map_err(|_| {
            PersistenceError::SerializationError(String::from("days_before_departure overflow"))
        })?;

        let affected: usize = diesel::update(
            dsl::booking_modifications
                .filter(dsl::modification_id.eq(record.id))
                .filter(dsl::version.eq(expected_version)),
        )
        .set((
            dsl::status.eq(record.status.as_str()),
            dsl::new_start_date.eq(new_start_date),
            dsl::new_end_date.eq(new_end_date),
            dsl::new_participants.eq(new_participants),
            dsl::days_before_departure.eq(days),
            dsl::original_amount.eq(record.quote.original_amount.to_string()),
            dsl::new_amount.eq(record.quote.new_amount.to_string()),
            dsl::price_difference.eq(record.quote.price_difference.to_string()),
            dsl::processing_fee.eq(record.quote.processing_fee.to_string()),
            dsl::total_additional.eq(record.quote.total_additional.to_string()),
            dsl::requires_additional_payment.eq(i32::from(record.quote.requires_additional_payment)),
            dsl::offers_refund.eq(i32::from(record.quote.offers_refund)),
            dsl::reviewed_by.eq(record.reviewed_by),
            dsl::reviewed_at.eq(reviewed_at),
            dsl::admin_notes.eq(record.admin_notes.clone()),
            dsl::charges_accepted_at.eq(charges_accepted_at),
            dsl::completed_at.eq(completed_at),
            dsl::version.eq(expected_version + 1),
        ))
        .execute(conn)?;
        if affected == 0 {
            return Err(PersistenceError::ConcurrentModification {
                record: String::from("modification"),
                id: record.id,
            });
        }

        insert_history_rows(conn, record.id, &transition.history)?;

        if let Some(changes) = &transition.booking_changes {
            apply_booking_changes(conn, record.booking_id, changes)?;
        }

        debug!(
            modification_id = record.id,
            status = record.status.as_str(),
            new_version = expected_version + 1,
            "applied modification transition"
        );
        Ok(())
    })
}

fn insert_history_rows(
    conn: &mut SqliteConnection,
    modification_id: i64,
    history: &[StatusHistoryEntry],
) -> Result<(), PersistenceError> {
    for entry in history {
        let row = modification_history_to_new_row(modification_id, entry)?;
        diesel::insert_into(diesel_schema::modification_status_history::table)
            .values(&row)
            .execute(conn)?;
    }
    Ok(())
}
