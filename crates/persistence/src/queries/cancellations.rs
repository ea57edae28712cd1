// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Cancellation queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use rebook::CancellationRecord;
use rebook_domain::CancellationStatus;
use time::OffsetDateTime;

use crate::data_models::{
    CancellationRow, StatusHistoryRow, cancellation_from_row, format_datetime,
};
use crate::diesel_schema::booking_cancellations::dsl;
use crate::diesel_schema::cancellation_status_history;
use crate::error::PersistenceError;

/// Statuses where the request still needs admin review.
const PENDING_STATUSES: [&str; 2] = ["requested", "under_review"];

/// Statuses where an approved refund has not been recorded yet.
const AWAITING_REFUND_STATUSES: [&str; 2] = ["approved", "refund_pending"];

/// Statuses counted against a user for abuse detection.
const COUNTED_STATUSES: [&str; 3] = ["approved", "refund_pending", "refunded"];

fn rows_to_records(rows: Vec<CancellationRow>) -> Result<Vec<CancellationRecord>, PersistenceError> {
    rows.iter().map(cancellation_from_row).collect()
}

/// Looks up a cancellation by identifier.
///
/// # Errors
///
/// Returns [`PersistenceError::NotFound`] if no such cancellation
/// exists, or an error if the query or row conversion fails.
pub fn get_cancellation(
    conn: &mut SqliteConnection,
    cancellation_id: i64,
) -> Result<CancellationRecord, PersistenceError> {
    let row: Option<CancellationRow> = dsl::booking_cancellations
        .filter(dsl::cancellation_id.eq(cancellation_id))
        .first::<CancellationRow>(conn)
        .optional()?;
    match row {
        Some(row) => cancellation_from_row(&row),
        None => Err(PersistenceError::NotFound(format!(
            "cancellation {cancellation_id} not found"
        ))),
    }
}

/// Returns the most recent cancellation for a booking, if any.
///
/// # Errors
///
/// Returns an error if the query or row conversion fails.
pub fn get_cancellation_for_booking(
    conn: &mut SqliteConnection,
    booking_id: i64,
) -> Result<Option<CancellationRecord>, PersistenceError> {
    let row: Option<CancellationRow> = dsl::booking_cancellations
        .filter(dsl::booking_id.eq(booking_id))
        .order(dsl::requested_at.desc())
        .first::<CancellationRow>(conn)
        .optional()?;
    row.as_ref().map(cancellation_from_row).transpose()
}

/// Lists a user's cancellations, newest first.
///
/// # Errors
///
/// Returns an error if the query or row conversion fails.
pub fn list_cancellations_by_user(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Vec<CancellationRecord>, PersistenceError> {
    let rows: Vec<CancellationRow> = dsl::booking_cancellations
        .filter(dsl::user_id.eq(user_id))
        .order(dsl::requested_at.desc())
        .load::<CancellationRow>(conn)?;
    rows_to_records(rows)
}

/// Lists cancellations awaiting review, oldest first.
///
/// # Errors
///
/// Returns an error if the query or row conversion fails.
pub fn list_pending_cancellations(
    conn: &mut SqliteConnection,
) -> Result<Vec<CancellationRecord>, PersistenceError> {
    let rows: Vec<CancellationRow> = dsl::booking_cancellations
        .filter(dsl::status.eq_any(PENDING_STATUSES))
        .order(dsl::requested_at.asc())
        .load::<CancellationRow>(conn)?;
    rows_to_records(rows)
}

/// Lists unreviewed cancellations carrying any emergency flag,
/// oldest first.
///
/// # Errors
///
/// Returns an error if the query or row conversion fails.
pub fn list_emergency_cancellations(
    conn: &mut SqliteConnection,
) -> Result<Vec<CancellationRecord>, PersistenceError> {
    let rows: Vec<CancellationRow> = dsl::booking_cancellations
        .filter(dsl::status.eq_any(PENDING_STATUSES))
        .filter(
            dsl::is_medical_emergency
                .eq(1)
                .or(dsl::is_weather_related.eq(1))
                .or(dsl::is_force_majeure.eq(1)),
        )
        .order(dsl::requested_at.asc())
        .load::<CancellationRow>(conn)?;
    rows_to_records(rows)
}

/// Lists approved cancellations whose refund has not been recorded,
/// oldest first.
///
/// # Errors
///
/// Returns an error if the query or row conversion fails.
pub fn list_cancellations_awaiting_refund(
    conn: &mut SqliteConnection,
) -> Result<Vec<CancellationRecord>, PersistenceError> {
    let rows: Vec<CancellationRow> = dsl::booking_cancellations
        .filter(dsl::status.eq_any(AWAITING_REFUND_STATUSES))
        .order(dsl::requested_at.asc())
        .load::<CancellationRow>(conn)?;
    rows_to_records(rows)
}

/// Lists cancellations in a given status, newest first.
///
/// # Errors
///
/// Returns an error if the query or row conversion fails.
pub fn list_cancellations_by_status(
    conn: &mut SqliteConnection,
    status: CancellationStatus,
) -> Result<Vec<CancellationRecord>, PersistenceError> {
    let rows: Vec<CancellationRow> = dsl::booking_cancellations
        .filter(dsl::status.eq(status.as_str()))
        .order(dsl::requested_at.desc())
        .load::<CancellationRow>(conn)?;
    rows_to_records(rows)
}

/// Lists cancellations requested inside an inclusive time range,
/// oldest first.
///
/// # Errors
///
/// Returns an error if the query or row conversion fails.
pub fn list_cancellations_by_date_range(
    conn: &mut SqliteConnection,
    from: OffsetDateTime,
    to: OffsetDateTime,
) -> Result<Vec<CancellationRecord>, PersistenceError> {
    let from_text: String = format_datetime(from)?;
    let to_text: String = format_datetime(to)?;
    let rows: Vec<CancellationRow> = dsl::booking_cancellations
        .filter(dsl::requested_at.ge(from_text))
        .filter(dsl::requested_at.le(to_text))
        .order(dsl::requested_at.asc())
        .load::<CancellationRow>(conn)?;
    rows_to_records(rows)
}

/// Searches cancellation reason text, newest first.
///
/// # Errors
///
/// Returns an error if the query or row conversion fails.
pub fn search_cancellations_by_reason(
    conn: &mut SqliteConnection,
    term: &str,
) -> Result<Vec<CancellationRecord>, PersistenceError> {
    let pattern: String = format!("%{term}%");
    let rows: Vec<CancellationRow> = dsl::booking_cancellations
        .filter(dsl::reason.like(&pattern))
        .order(dsl::requested_at.desc())
        .load::<CancellationRow>(conn)?;
    rows_to_records(rows)
}

/// Counts a user's approved or refunded cancellations requested at or
/// after the given instant.
///
/// Feeds the abuse-count numerator; requests that were rejected or
/// are still under review do not count against the user.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_recent_cancellations_by_user(
    conn: &mut SqliteConnection,
    user_id: i64,
    since: OffsetDateTime,
) -> Result<u64, PersistenceError> {
    let since_text: String = format_datetime(since)?;
    let count: i64 = dsl::booking_cancellations
        .filter(dsl::user_id.eq(user_id))
        .filter(dsl::status.eq_any(COUNTED_STATUSES))
        .filter(dsl::requested_at.ge(since_text))
        .count()
        .get_result(conn)?;
    Ok(count.unsigned_abs())
}

/// Returns the status history of a cancellation in the order it was
/// written.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_cancellation_history(
    conn: &mut SqliteConnection,
    cancellation_id: i64,
) -> Result<Vec<StatusHistoryRow>, PersistenceError> {
    use cancellation_status_history::dsl as history;

    let rows: Vec<StatusHistoryRow> = history::cancellation_status_history
        .filter(history::cancellation_id.eq(cancellation_id))
        .order(history::history_id.asc())
        .load::<StatusHistoryRow>(conn)?;
    Ok(rows)
}
