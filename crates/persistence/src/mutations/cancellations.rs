// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Cancellation persistence mutations.
//!
//! The `booking_cancellations` table carries a partial unique index
//! on `booking_id` covering non-terminal statuses, so the database
//! itself enforces one active cancellation per booking. Updates are
//! version-checked.

use diesel::SqliteConnection;
use diesel::prelude::*;
use rebook::{CancellationRecord, CancellationTransition, StatusHistoryEntry};
use tracing::debug;

use crate::backend::get_last_insert_rowid;
use crate::data_models::{
    cancellation_history_to_new_row, cancellation_to_new_row, format_datetime,
};
use crate::diesel_schema;
use crate::error::PersistenceError;
use crate::mutations::bookings::apply_booking_status_update;

/// Inserts a new cancellation request with its opening history.
///
/// # Errors
///
/// Returns [`PersistenceError::DuplicateActiveCancellation`] if the
/// booking already has a cancellation in a non-terminal status, or an
/// error if serialization or the insert fails.
pub fn insert_cancellation(
    conn: &mut SqliteConnection,
    record: &CancellationRecord,
    history: &[StatusHistoryEntry],
) -> Result<i64, PersistenceError> {
    conn.transaction::<i64, PersistenceError, _>(|conn| {
        let new_row = cancellation_to_new_row(record)?;
        let inserted = diesel::insert_into(diesel_schema::booking_cancellations::table)
            .values(&new_row)
            .execute(conn);
        match inserted {
            Ok(_) => {}
            Err(e) => {
                let mapped: PersistenceError = e.into();
                if matches!(mapped, PersistenceError::UniqueViolation(_)) {
                    return Err(PersistenceError::DuplicateActiveCancellation {
                        booking_id: record.booking_id,
                    });
                }
                return Err(mapped);
            }
        }
        let cancellation_id: i64 = get_last_insert_rowid(conn)?;
        insert_history_rows(conn, cancellation_id, history)?;
        debug!(
            cancellation_id,
            booking_id = record.booking_id,
            status = record.status.as_str(),
            "inserted cancellation request"
        );
        Ok(cancellation_id)
    })
}

/// Applies a cancellation transition produced by the core layer.
///
/// The update is guarded by the version the caller read; losing the
/// race surfaces as [`PersistenceError::ConcurrentModification`]. Any
/// booking status update in the transition lands in the same
/// transaction.
///
/// # Errors
///
/// Returns an error if the version check fails, serialization fails,
/// or any write fails.
pub fn update_cancellation(
    conn: &mut SqliteConnection,
    transition: &CancellationTransition,
) -> Result<(), PersistenceError> {
    conn.transaction::<(), PersistenceError, _>(|conn| {
        use diesel_schema::booking_cancellations::dsl;

        let record: &CancellationRecord = &transition.record;
        let expected_version: i64 = record.version;
        let reviewed_at: Option<String> = record.reviewed_at.map(format_datetime).transpose()?;
        let refund_processed_at: Option<String> =
            record.refund_processed_at.map(format_datetime).transpose()?;
        let days: i32 = i32::try_from(record.days_before_departure).map_err(|_| {
            PersistenceError::SerializationError(String::from("days_before_departure overflow"))
        })?;

        let affected: usize = diesel::update(
            dsl::booking_cancellations
                .filter(dsl::cancellation_id.eq(record.id))
                .filter(dsl::version.eq(expected_version)),
        )
        .set((
            dsl::status.eq(record.status.as_str()),
            dsl::days_before_departure.eq(days),
            dsl::refund_percentage.eq(record.refund_breakdown.refund_percentage.to_string()),
            dsl::gross_refund.eq(record.refund_breakdown.gross_refund.to_string()),
            dsl::processing_fee.eq(record.refund_breakdown.processing_fee.to_string()),
            dsl::net_refund.eq(record.refund_breakdown.net_refund.to_string()),
            dsl::fee_waived.eq(i32::from(record.refund_breakdown.fee_waived)),
            dsl::floor_applied.eq(i32::from(record.refund_breakdown.floor_applied)),
            dsl::reviewed_by.eq(record.reviewed_by),
            dsl::reviewed_at.eq(reviewed_at),
            dsl::admin_notes.eq(record.admin_notes.clone()),
            dsl::refund_transaction_reference.eq(record.refund_transaction_reference.clone()),
            dsl::refund_method_used
                .eq(record.refund_method_used.map(|m| m.as_str().to_string())),
            dsl::refund_processed_at.eq(refund_processed_at),
            dsl::version.eq(expected_version + 1),
        ))
        .execute(conn)?;
        if affected == 0 {
            return Err(PersistenceError::ConcurrentModification {
                record: String::from("cancellation"),
                id: record.id,
            });
        }

        insert_history_rows(conn, record.id, &transition.history)?;

        if let Some(update) = &transition.booking_update {
            apply_booking_status_update(conn, record.booking_id, update)?;
        }

        debug!(
            cancellation_id = record.id,
            status = record.status.as_str(),
            new_version = expected_version + 1,
            "applied cancellation transition"
        );
        Ok(())
    })
}

fn insert_history_rows(
    conn: &mut SqliteConnection,
    cancellation_id: i64,
    history: &[StatusHistoryEntry],
) -> Result<(), PersistenceError> {
    for entry in history {
        let row = cancellation_history_to_new_row(cancellation_id, entry)?;
        diesel::insert_into(diesel_schema::cancellation_status_history::table)
            .values(&row)
            .execute(conn)?;
    }
    Ok(())
}
