// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Response DTOs for the API boundary.
//!
//! Record types already serialize cleanly, so they cross the boundary
//! as-is; the DTOs here flatten derived values that have no single
//! owning record.

use rebook::CancellationEvaluation;
use rebook_persistence::StatusHistoryRow;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The refund preview a customer sees before committing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResponse {
    /// Whole days between now and departure.
    pub days_before_departure: u32,
    /// The refund percentage the policy tier grants.
    pub refund_percentage: Decimal,
    /// Refund before the processing fee.
    pub gross_refund: Decimal,
    /// The processing fee, zero when waived.
    pub processing_fee: Decimal,
    /// What would actually be paid out.
    pub net_refund: Decimal,
    /// Whether an emergency waived the fee.
    pub fee_waived: bool,
    /// Whether an emergency floor raised the percentage.
    pub floor_applied: bool,
    /// Whether the request would be fast-tracked into review.
    pub fast_tracked: bool,
}

impl From<CancellationEvaluation> for EvaluationResponse {
    fn from(evaluation: CancellationEvaluation) -> Self {
        Self {
            days_before_departure: evaluation.days_before_departure,
            refund_percentage: evaluation.breakdown.refund_percentage,
            gross_refund: evaluation.breakdown.gross_refund,
            processing_fee: evaluation.breakdown.processing_fee,
            net_refund: evaluation.breakdown.net_refund,
            fee_waived: evaluation.breakdown.fee_waived,
            floor_applied: evaluation.breakdown.floor_applied,
            fast_tracked: evaluation.fast_tracked,
        }
    }
}

/// One status-history entry, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntryView {
    /// The status before the change, absent for the opening entry.
    pub previous_status: Option<String>,
    /// The status after the change.
    pub new_status: String,
    /// Who made the change, e.g. `customer:100` or `admin:7`.
    pub changed_by: String,
    /// Optional note recorded with the change.
    pub note: Option<String>,
    /// When the change happened, RFC 3339.
    pub changed_at: String,
}

impl From<StatusHistoryRow> for HistoryEntryView {
    fn from(row: StatusHistoryRow) -> Self {
        Self {
            previous_status: row.previous_status,
            new_status: row.new_status,
            changed_by: row.changed_by,
            note: row.note,
            changed_at: row.changed_at,
        }
    }
}

/// Abuse-detection verdict for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbuseCheckResponse {
    /// The user in question.
    pub user_id: i64,
    /// Approved/refunded cancellations inside the trailing window.
    pub recent_cancellations: u64,
    /// Bookings made inside the same window.
    pub recent_bookings: u64,
    /// Whether the thresholds flag this user.
    pub is_abusive: bool,
}

/// Whether a booking currently accepts modification requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanModifyResponse {
    /// True when a request would pass structural validation.
    pub can_modify: bool,
    /// The violations that block it, empty when modifiable.
    pub reasons: Vec<String>,
}

/// A resolved modification processing fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingFeeResponse {
    /// The change type the fee was resolved for.
    pub modification_type: String,
    /// Whole days between now and departure.
    pub days_before_departure: u32,
    /// The resolved fee.
    pub processing_fee: Decimal,
}

/// A raw price difference, before fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceDifferenceResponse {
    /// The booking's current total.
    pub original_amount: Decimal,
    /// The total after the requested change.
    pub new_amount: Decimal,
    /// Positive when the customer owes more, negative when a refund
    /// is due.
    pub price_difference: Decimal,
}
