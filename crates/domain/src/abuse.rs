// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Cancellation abuse detection.
//!
//! Advisory only: the flag is surfaced to admin tooling as a signal and
//! never blocks a cancellation request by itself.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Thresholds for flagging a user as an abusive canceller.
///
/// These are tuning inputs, not correctness inputs; they are carried in
/// configuration rather than hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbuseThresholds {
    /// Length of the trailing window, in days.
    pub window_days: u32,
    /// Flag when approved/refunded cancellations in the window reach
    /// this count.
    pub count_threshold: u32,
    /// Flag when the ratio of cancellations to bookings in the window
    /// exceeds this fraction.
    pub ratio_threshold: Decimal,
}

impl Default for AbuseThresholds {
    fn default() -> Self {
        Self {
            window_days: 90,
            count_threshold: 3,
            ratio_threshold: Decimal::new(5, 1), // 0.5
        }
    }
}

/// Per-user cancellation aggregate, derived at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCancellationSummary {
    /// The user in question.
    pub user_id: i64,
    /// All-time cancellation count.
    pub total_cancellations: u64,
    /// Approved/refunded cancellations inside the trailing window.
    pub recent_cancellations: u64,
    /// Bookings made inside the same window.
    pub recent_bookings: u64,
    /// Total refund amount the user has received.
    pub total_refund_received: Decimal,
    /// Whether the thresholds flag this user.
    pub is_abusive: bool,
}

/// Evaluates the abuse thresholds over windowed counts.
///
/// Returns true if the count threshold is met, or the window holds any
/// bookings and the cancellation-to-booking ratio exceeds the
/// configured fraction. Either condition alone is sufficient.
#[must_use]
pub fn is_abusive_canceller(
    cancellations_in_window: u64,
    bookings_in_window: u64,
    thresholds: &AbuseThresholds,
) -> bool {
    if cancellations_in_window >= u64::from(thresholds.count_threshold) {
        return true;
    }

    if bookings_in_window == 0 {
        return false;
    }

    let ratio: Decimal =
        Decimal::from(cancellations_in_window) / Decimal::from(bookings_in_window);
    ratio > thresholds.ratio_threshold
}
