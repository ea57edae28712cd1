// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Cancellation lifecycle states and transition rules.
//!
//! Transitions are admin-initiated only; the system never advances a
//! cancellation based on time alone. `Rejected` and `Refunded` are
//! terminal; a record becomes immutable once it reaches either.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle state of a cancellation request.
///
/// Normal path: `Requested → UnderReview → Approved → RefundPending →
/// Refunded`. Emergency requests may be expedited straight from
/// `Requested`/`UnderReview` to `Approved`, bypassing queueing but never
/// refund recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationStatus {
    /// Submitted by the customer, awaiting staff pickup.
    Requested,
    /// Picked up by staff (or fast-tracked at creation for emergencies).
    UnderReview,
    /// Approved by an admin; refund amount fixed at approval time.
    /// Transient: approval immediately advances to `RefundPending`.
    Approved,
    /// Awaiting the refund bookkeeping write.
    RefundPending,
    /// Rejected by an admin. Terminal.
    Rejected,
    /// Refund recorded and booking synchronized. Terminal.
    Refunded,
}

impl CancellationStatus {
    /// Returns the string representation used for persistence and
    /// API serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::RefundPending => "refund_pending",
            Self::Rejected => "rejected",
            Self::Refunded => "refunded",
        }
    }

    /// Parses a status from its string representation.
    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "requested" => Ok(Self::Requested),
            "under_review" => Ok(Self::UnderReview),
            "approved" => Ok(Self::Approved),
            "refund_pending" => Ok(Self::RefundPending),
            "rejected" => Ok(Self::Rejected),
            "refunded" => Ok(Self::Refunded),
            _ => Err(DomainError::InvalidCancellationStatus {
                status: s.to_string(),
            }),
        }
    }

    /// Returns true if this status is terminal (record is immutable).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Refunded)
    }

    /// Returns true if an admin may still approve or reject from here.
    #[must_use]
    pub const fn is_reviewable(&self) -> bool {
        matches!(self, Self::Requested | Self::UnderReview)
    }

    /// Validates a transition from this status to another.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStatusTransition` naming both the
    /// current and requested states if the transition is not permitted.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        if self.is_terminal() {
            return Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "cannot transition from terminal state".to_string(),
            });
        }

        let valid: bool = match self {
            Self::Requested => matches!(
                new_status,
                Self::UnderReview | Self::Approved | Self::Rejected
            ),
            Self::UnderReview => matches!(new_status, Self::Approved | Self::Rejected),
            Self::Approved => matches!(new_status, Self::RefundPending),
            Self::RefundPending => matches!(new_status, Self::Refunded),
            Self::Rejected | Self::Refunded => false,
        };

        if valid {
            Ok(())
        } else {
            Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "transition not permitted by cancellation lifecycle rules".to_string(),
            })
        }
    }
}

impl FromStr for CancellationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for CancellationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
