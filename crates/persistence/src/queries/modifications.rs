// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Modification queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use rebook::ModificationRecord;
use rebook_domain::ModificationStatus;

use crate::data_models::{ModificationRow, StatusHistoryRow, modification_from_row};
use crate::diesel_schema::booking_modifications::dsl;
use crate::diesel_schema::modification_status_history;
use crate::error::PersistenceError;

fn rows_to_records(rows: Vec<ModificationRow>) -> Result<Vec<ModificationRecord>, PersistenceError> {
    rows.iter().map(modification_from_row).collect()
}

/// Looks up a modification by identifier.
///
/// # Errors
///
/// Returns [`PersistenceError::NotFound`] if no such modification
/// exists, or an error if the query or row conversion fails.
pub fn get_modification(
    conn: &mut SqliteConnection,
    modification_id: i64,
) -> Result<ModificationRecord, PersistenceError> {
    let row: Option<ModificationRow> = dsl::booking_modifications
        .filter(dsl::modification_id.eq(modification_id))
        .first::<ModificationRow>(conn)
        .optional()?;
    match row {
        Some(row) => modification_from_row(&row),
        None => Err(PersistenceError::NotFound(format!(
            "modification {modification_id} not found"
        ))),
    }
}

/// Lists a user's modification requests, newest first.
///
/// # Errors
///
/// Returns an error if the query or row conversion fails.
pub fn list_modifications_by_user(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Vec<ModificationRecord>, PersistenceError> {
    let rows: Vec<ModificationRow> = dsl::booking_modifications
        .filter(dsl::user_id.eq(user_id))
        .order(dsl::requested_at.desc())
        .load::<ModificationRow>(conn)?;
    rows_to_records(rows)
}

/// Lists every modification request, newest first.
///
/// # Errors
///
/// Returns an error if the query or row conversion fails.
pub fn list_modifications(
    conn: &mut SqliteConnection,
) -> Result<Vec<ModificationRecord>, PersistenceError> {
    let rows: Vec<ModificationRow> = dsl::booking_modifications
        .order(dsl::requested_at.desc())
        .load::<ModificationRow>(conn)?;
    rows_to_records(rows)
}

/// Lists modifications in a given status, oldest first.
///
/// # Errors
///
/// Returns an error if the query or row conversion fails.
pub fn list_modifications_by_status(
    conn: &mut SqliteConnection,
    status: ModificationStatus,
) -> Result<Vec<ModificationRecord>, PersistenceError> {
    let rows: Vec<ModificationRow> = dsl::booking_modifications
        .filter(dsl::status.eq(status.as_str()))
        .order(dsl::requested_at.asc())
        .load::<ModificationRow>(conn)?;
    rows_to_records(rows)
}

/// Returns the status history of a modification in the order it was
/// written.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_modification_history(
    conn: &mut SqliteConnection,
    modification_id: i64,
) -> Result<Vec<StatusHistoryRow>, PersistenceError> {
    use modification_status_history::dsl as history;

    let rows: Vec<StatusHistoryRow> = history::modification_status_history
        .filter(history::modification_id.eq(modification_id))
        .order(history::history_id.asc())
        .load::<StatusHistoryRow>(conn)?;
    Ok(rows)
}
