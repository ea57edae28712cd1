// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Aggregated reporting queries.
//!
//! These load the matching rows and fold in Rust so refund amounts
//! stay in `Decimal` rather than going through SQLite floats.

use diesel::SqliteConnection;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

use crate::data_models::{CancellationRow, ModificationRow, format_datetime, parse_decimal};
use crate::diesel_schema::booking_cancellations;
use crate::diesel_schema::booking_modifications;
use crate::error::PersistenceError;

/// Cancellation counts and refund totals over a time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationStatistics {
    /// Every request in the window.
    pub total_requests: u64,
    /// Requests still in `requested`.
    pub requested: u64,
    /// Requests still in `under_review`.
    pub under_review: u64,
    /// Approved, refund not yet recorded.
    pub approved: u64,
    /// Rejected requests.
    pub rejected: u64,
    /// Refund initiated but not recorded.
    pub refund_pending: u64,
    /// Fully processed refunds.
    pub refunded: u64,
    /// Requests carrying any emergency flag.
    pub emergency_requests: u64,
    /// Sum of net refunds over refunded requests.
    pub total_refunded: Decimal,
    /// Mean net refund across refunded requests, zero when none
    /// reached `refunded`.
    pub average_refund_amount: Decimal,
    /// Mean refund percentage across all requests in the window,
    /// zero when the window is empty.
    pub average_refund_percentage: Decimal,
    /// Mean days-before-departure at request time across all requests
    /// in the window, zero when the window is empty.
    pub average_days_before_departure: Decimal,
}

/// Per-reason request counts over a time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonStats {
    /// The stored reason category.
    pub reason_category: String,
    /// Requests citing this reason.
    pub requests: u64,
    /// Of those, how many reached `refunded`.
    pub refunded: u64,
    /// This reason's share of all requests in the window, in percent.
    pub percentage: Decimal,
}

/// All-time per-user cancellation totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCancellationTotals {
    /// Every cancellation request the user ever made.
    pub total_cancellations: u64,
    /// Sum of net refunds the user has received.
    pub total_refund_received: Decimal,
}

/// Modification counts over a time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationStatistics {
    /// Every request in the window.
    pub total_requests: u64,
    /// Requests still in `pending`.
    pub pending: u64,
    /// Approved, not yet processing.
    pub approved: u64,
    /// Rejected requests.
    pub rejected: u64,
    /// In flight.
    pub processing: u64,
    /// Applied to the booking.
    pub completed: u64,
    /// Withdrawn by the customer.
    pub cancelled: u64,
    /// Requests changing dates.
    pub date_changes: u64,
    /// Requests changing participant counts.
    pub participant_changes: u64,
    /// Requests changing both.
    pub combined_changes: u64,
    /// Sum of additional charges over completed requests.
    pub additional_collected: Decimal,
}

fn load_cancellation_window(
    conn: &mut SqliteConnection,
    from: OffsetDateTime,
    to: OffsetDateTime,
) -> Result<Vec<CancellationRow>, PersistenceError> {
    use booking_cancellations::dsl;

    let from_text: String = format_datetime(from)?;
    let to_text: String = format_datetime(to)?;
    let rows: Vec<CancellationRow> = dsl::booking_cancellations
        .filter(dsl::requested_at.ge(from_text))
        .filter(dsl::requested_at.le(to_text))
        .load::<CancellationRow>(conn)?;
    Ok(rows)
}

/// Computes cancellation statistics over an inclusive time window.
///
/// # Errors
///
/// Returns an error if the query fails or a stored amount fails to
/// parse.
pub fn cancellation_statistics(
    conn: &mut SqliteConnection,
    from: OffsetDateTime,
    to: OffsetDateTime,
) -> Result<CancellationStatistics, PersistenceError> {
    let rows: Vec<CancellationRow> = load_cancellation_window(conn, from, to)?;

    let mut stats: CancellationStatistics = CancellationStatistics {
        total_requests: rows.len() as u64,
        requested: 0,
        under_review: 0,
        approved: 0,
        rejected: 0,
        refund_pending: 0,
        refunded: 0,
        emergency_requests: 0,
        total_refunded: Decimal::ZERO,
        average_refund_amount: Decimal::ZERO,
        average_refund_percentage: Decimal::ZERO,
        average_days_before_departure: Decimal::ZERO,
    };
    let mut percentage_sum: Decimal = Decimal::ZERO;
    let mut days_sum: Decimal = Decimal::ZERO;

    for row in &rows {
        match row.status.as_str() {
            "requested" => stats.requested += 1,
            "under_review" => stats.under_review += 1,
            "approved" => stats.approved += 1,
            "rejected" => stats.rejected += 1,
            "refund_pending" => stats.refund_pending += 1,
            "refunded" => stats.refunded += 1,
            other => {
                return Err(PersistenceError::SerializationError(format!(
                    "unknown cancellation status in statistics window: {other}"
                )));
            }
        }
        if row.is_medical_emergency != 0 || row.is_weather_related != 0 || row.is_force_majeure != 0
        {
            stats.emergency_requests += 1;
        }
        if row.status == "refunded" {
            stats.total_refunded +=
                parse_decimal(&row.net_refund, "booking_cancellations.net_refund")?;
        }
        percentage_sum += parse_decimal(
            &row.refund_percentage,
            "booking_cancellations.refund_percentage",
        )?;
        days_sum += Decimal::from(row.days_before_departure);
    }

    if !rows.is_empty() {
        stats.average_refund_percentage = percentage_sum / Decimal::from(rows.len());
        stats.average_days_before_departure = days_sum / Decimal::from(rows.len());
    }
    if stats.refunded > 0 {
        stats.average_refund_amount = stats.total_refunded / Decimal::from(stats.refunded);
    }
    Ok(stats)
}

/// Computes per-reason request counts and shares over an inclusive
/// time window, ordered by request count, most-cited reason first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn cancellation_reason_stats(
    conn: &mut SqliteConnection,
    from: OffsetDateTime,
    to: OffsetDateTime,
) -> Result<Vec<ReasonStats>, PersistenceError> {
    let rows: Vec<CancellationRow> = load_cancellation_window(conn, from, to)?;
    let total: u64 = rows.len() as u64;

    let mut by_reason: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for row in &rows {
        let entry: &mut (u64, u64) = by_reason.entry(row.reason_category.clone()).or_default();
        entry.0 += 1;
        if row.status == "refunded" {
            entry.1 += 1;
        }
    }

    let mut stats: Vec<ReasonStats> = by_reason
        .into_iter()
        .map(|(reason_category, (requests, refunded))| ReasonStats {
            reason_category,
            requests,
            refunded,
            percentage: if total == 0 {
                Decimal::ZERO
            } else {
                Decimal::from(requests * 100) / Decimal::from(total)
            },
        })
        .collect();
    // Ties fall back to the category name so the order is stable.
    stats.sort_by(|a, b| {
        b.requests
            .cmp(&a.requests)
            .then_with(|| a.reason_category.cmp(&b.reason_category))
    });
    Ok(stats)
}

/// Computes all-time cancellation totals for one user.
///
/// # Errors
///
/// Returns an error if the query fails or a stored amount fails to
/// parse.
pub fn user_cancellation_totals(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<UserCancellationTotals, PersistenceError> {
    use booking_cancellations::dsl;

    let rows: Vec<CancellationRow> = dsl::booking_cancellations
        .filter(dsl::user_id.eq(user_id))
        .load::<CancellationRow>(conn)?;

    let mut total_refund_received: Decimal = Decimal::ZERO;
    for row in &rows {
        if row.status == "refunded" {
            total_refund_received +=
                parse_decimal(&row.net_refund, "booking_cancellations.net_refund")?;
        }
    }

    Ok(UserCancellationTotals {
        total_cancellations: rows.len() as u64,
        total_refund_received,
    })
}

/// Computes modification statistics over an inclusive time window.
///
/// # Errors
///
/// Returns an error if the query fails or a stored amount fails to
/// parse.
pub fn modification_statistics(
    conn: &mut SqliteConnection,
    from: OffsetDateTime,
    to: OffsetDateTime,
) -> Result<ModificationStatistics, PersistenceError> {
    use booking_modifications::dsl;

    let from_text: String = format_datetime(from)?;
    let to_text: String = format_datetime(to)?;
    let rows: Vec<ModificationRow> = dsl::booking_modifications
        .filter(dsl::requested_at.ge(from_text))
        .filter(dsl::requested_at.le(to_text))
        .load::<ModificationRow>(conn)?;

    let mut stats: ModificationStatistics = ModificationStatistics {
        total_requests: rows.len() as u64,
        pending: 0,
        approved: 0,
        rejected: 0,
        processing: 0,
        completed: 0,
        cancelled: 0,
        date_changes: 0,
        participant_changes: 0,
        combined_changes: 0,
        additional_collected: Decimal::ZERO,
    };

    for row in &rows {
        match row.status.as_str() {
            "pending" => stats.pending += 1,
            "approved" => stats.approved += 1,
            "rejected" => stats.rejected += 1,
            "processing" => stats.processing += 1,
            "completed" => stats.completed += 1,
            "cancelled" => stats.cancelled += 1,
            other => {
                return Err(PersistenceError::SerializationError(format!(
                    "unknown modification status in statistics window: {other}"
                )));
            }
        }
        match row.modification_type.as_str() {
            "date_change" => stats.date_changes += 1,
            "participant_change" => stats.participant_changes += 1,
            "date_and_participant_change" => stats.combined_changes += 1,
            other => {
                return Err(PersistenceError::SerializationError(format!(
                    "unknown modification type in statistics window: {other}"
                )));
            }
        }
        if row.status == "completed" && row.requires_additional_payment != 0 {
            stats.additional_collected += parse_decimal(
                &row.total_additional,
                "booking_modifications.total_additional",
            )?;
        }
    }

    Ok(stats)
}
