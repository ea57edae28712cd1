// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the booking change engine.
//!
//! This crate stores cancellation and modification records, their
//! status history, and the narrow booking mirror the engine needs. It
//! is built on Diesel over `SQLite`.
//!
//! ## Storage conventions
//!
//! - Monetary amounts are decimal text, re-parsed into
//!   [`rust_decimal::Decimal`] on read. SQLite floats never touch
//!   money.
//! - Dates are ISO-8601 text; timestamps are RFC 3339 UTC text. Both
//!   compare chronologically as strings, so range queries work
//!   directly on the columns.
//! - `booking_cancellations` carries a partial unique index over
//!   non-terminal statuses: the database enforces at most one active
//!   cancellation per booking, even under racing inserts.
//! - Records carry a `version` column. Transition updates are
//!   `UPDATE ... WHERE id = ? AND version = ?`; zero affected rows
//!   surfaces as [`PersistenceError::ConcurrentModification`].
//!
//! ## Testing
//!
//! Standard tests run against unique shared in-memory databases, one
//! per adapter, so they are isolated and need no external
//! infrastructure.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use rebook::{
    CancellationRecord, CancellationTransition, ModificationRecord, ModificationTransition,
    StatusHistoryEntry,
};
use rebook_domain::{Booking, CancellationStatus, ModificationStatus};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;

pub mod backend;
pub mod data_models;
pub mod diesel_schema;
pub mod error;
pub mod mutations;
pub mod queries;

#[cfg(test)]
mod tests;

pub use data_models::StatusHistoryRow;
pub use error::PersistenceError;
pub use queries::statistics::{
    CancellationStatistics, ModificationStatistics, ReasonStats, UserCancellationTotals,
};

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID, so
/// concurrently running tests never share a database.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Persistence adapter owning a `SQLite` connection.
///
/// All reads and writes go through this adapter; callers never see
/// Diesel types.
pub struct Persistence {
    pub(crate) conn: SqliteConnection,
}

impl Persistence {
    /// Creates an adapter backed by an in-memory `SQLite` database.
    ///
    /// Each call receives a unique shared in-memory database via an
    /// atomic counter, giving deterministic test isolation without
    /// time-based collisions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String = format!("file:memdb_test_{db_id}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::initialize_database(&shared_memory_url)?;
        backend::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Creates an adapter backed by a file-based `SQLite` database.
    ///
    /// Enables WAL mode for read concurrency.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or
    /// initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::initialize_database(path_str)?;
        backend::enable_wal_mode(&mut conn)?;
        backend::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    // ========================================================================
    // Bookings
    // ========================================================================

    /// Registers a booking mirror row and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn register_booking(
        &mut self,
        booking: &Booking,
        now: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::bookings::insert_booking(&mut self.conn, booking, now)
    }

    /// Looks up a booking by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::NotFound`] if no such booking
    /// exists.
    pub fn get_booking(&mut self, booking_id: i64) -> Result<Booking, PersistenceError> {
        queries::bookings::get_booking(&mut self.conn, booking_id)
    }

    /// Counts bookings a customer created at or after the given
    /// instant.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_bookings_by_customer_since(
        &mut self,
        customer_id: i64,
        since: OffsetDateTime,
    ) -> Result<u64, PersistenceError> {
        queries::bookings::count_bookings_by_customer_since(&mut self.conn, customer_id, since)
    }

    // ========================================================================
    // Cancellations
    // ========================================================================

    /// Persists a new cancellation request with its opening history.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::DuplicateActiveCancellation`] if
    /// the booking already has an active cancellation.
    pub fn insert_cancellation(
        &mut self,
        record: &CancellationRecord,
        history: &[StatusHistoryEntry],
    ) -> Result<i64, PersistenceError> {
        mutations::cancellations::insert_cancellation(&mut self.conn, record, history)
    }

    /// Applies a cancellation transition, version-checked.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::ConcurrentModification`] if the
    /// stored version no longer matches the one the transition was
    /// computed from.
    pub fn update_cancellation(
        &mut self,
        transition: &CancellationTransition,
    ) -> Result<(), PersistenceError> {
        mutations::cancellations::update_cancellation(&mut self.conn, transition)
    }

    /// Looks up a cancellation by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::NotFound`] if no such cancellation
    /// exists.
    pub fn get_cancellation(
        &mut self,
        cancellation_id: i64,
    ) -> Result<CancellationRecord, PersistenceError> {
        queries::cancellations::get_cancellation(&mut self.conn, cancellation_id)
    }

    /// Returns the most recent cancellation for a booking, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_cancellation_for_booking(
        &mut self,
        booking_id: i64,
    ) -> Result<Option<CancellationRecord>, PersistenceError> {
        queries::cancellations::get_cancellation_for_booking(&mut self.conn, booking_id)
    }

    /// Lists a user's cancellations, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_cancellations_by_user(
        &mut self,
        user_id: i64,
    ) -> Result<Vec<CancellationRecord>, PersistenceError> {
        queries::cancellations::list_cancellations_by_user(&mut self.conn, user_id)
    }

    /// Lists cancellations awaiting review, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_pending_cancellations(
        &mut self,
    ) -> Result<Vec<CancellationRecord>, PersistenceError> {
        queries::cancellations::list_pending_cancellations(&mut self.conn)
    }

    /// Lists unreviewed cancellations carrying any emergency flag,
    /// oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_emergency_cancellations(
        &mut self,
    ) -> Result<Vec<CancellationRecord>, PersistenceError> {
        queries::cancellations::list_emergency_cancellations(&mut self.conn)
    }

    /// Lists approved cancellations whose refund has not been
    /// recorded, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_cancellations_awaiting_refund(
        &mut self,
    ) -> Result<Vec<CancellationRecord>, PersistenceError> {
        queries::cancellations::list_cancellations_awaiting_refund(&mut self.conn)
    }

    /// Lists cancellations in a given status, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_cancellations_by_status(
        &mut self,
        status: CancellationStatus,
    ) -> Result<Vec<CancellationRecord>, PersistenceError> {
        queries::cancellations::list_cancellations_by_status(&mut self.conn, status)
    }

    /// Lists cancellations requested inside an inclusive time range,
    /// oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_cancellations_by_date_range(
        &mut self,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Vec<CancellationRecord>, PersistenceError> {
        queries::cancellations::list_cancellations_by_date_range(&mut self.conn, from, to)
    }

    /// Searches cancellation reason text, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn search_cancellations_by_reason(
        &mut self,
        term: &str,
    ) -> Result<Vec<CancellationRecord>, PersistenceError> {
        queries::cancellations::search_cancellations_by_reason(&mut self.conn, term)
    }

    /// Counts a user's approved or refunded cancellations requested
    /// at or after the given instant.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_recent_cancellations_by_user(
        &mut self,
        user_id: i64,
        since: OffsetDateTime,
    ) -> Result<u64, PersistenceError> {
        queries::cancellations::count_recent_cancellations_by_user(&mut self.conn, user_id, since)
    }

    /// Returns the status history of a cancellation in write order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_cancellation_history(
        &mut self,
        cancellation_id: i64,
    ) -> Result<Vec<StatusHistoryRow>, PersistenceError> {
        queries::cancellations::get_cancellation_history(&mut self.conn, cancellation_id)
    }

    /// Computes cancellation statistics over an inclusive time
    /// window.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn cancellation_statistics(
        &mut self,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<CancellationStatistics, PersistenceError> {
        queries::statistics::cancellation_statistics(&mut self.conn, from, to)
    }

    /// Computes per-reason request counts over an inclusive time
    /// window.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn cancellation_reason_stats(
        &mut self,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<Vec<ReasonStats>, PersistenceError> {
        queries::statistics::cancellation_reason_stats(&mut self.conn, from, to)
    }

    /// Computes all-time cancellation totals for one user.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn user_cancellation_totals(
        &mut self,
        user_id: i64,
    ) -> Result<UserCancellationTotals, PersistenceError> {
        queries::statistics::user_cancellation_totals(&mut self.conn, user_id)
    }

    // ========================================================================
    // Modifications
    // ========================================================================

    /// Persists a new modification request with its opening history.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn insert_modification(
        &mut self,
        record: &ModificationRecord,
        history: &[StatusHistoryEntry],
    ) -> Result<i64, PersistenceError> {
        mutations::modifications::insert_modification(&mut self.conn, record, history)
    }

    /// Applies a modification transition, version-checked.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::ConcurrentModification`] if the
    /// stored version no longer matches the one the transition was
    /// computed from.
    pub fn update_modification(
        &mut self,
        transition: &ModificationTransition,
    ) -> Result<(), PersistenceError> {
        mutations::modifications::update_modification(&mut self.conn, transition)
    }

    /// Looks up a modification by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::NotFound`] if no such modification
    /// exists.
    pub fn get_modification(
        &mut self,
        modification_id: i64,
    ) -> Result<ModificationRecord, PersistenceError> {
        queries::modifications::get_modification(&mut self.conn, modification_id)
    }

    /// Lists a user's modification requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_modifications_by_user(
        &mut self,
        user_id: i64,
    ) -> Result<Vec<ModificationRecord>, PersistenceError> {
        queries::modifications::list_modifications_by_user(&mut self.conn, user_id)
    }

    /// Lists every modification request, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_modifications(&mut self) -> Result<Vec<ModificationRecord>, PersistenceError> {
        queries::modifications::list_modifications(&mut self.conn)
    }

    /// Lists modifications in a given status, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_modifications_by_status(
        &mut self,
        status: ModificationStatus,
    ) -> Result<Vec<ModificationRecord>, PersistenceError> {
        queries::modifications::list_modifications_by_status(&mut self.conn, status)
    }

    /// Returns the status history of a modification in write order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_modification_history(
        &mut self,
        modification_id: i64,
    ) -> Result<Vec<StatusHistoryRow>, PersistenceError> {
        queries::modifications::get_modification_history(&mut self.conn, modification_id)
    }

    /// Computes modification statistics over an inclusive time
    /// window.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn modification_statistics(
        &mut self,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> Result<ModificationStatistics, PersistenceError> {
        queries::statistics::modification_statistics(&mut self.conn, from, to)
    }
}
