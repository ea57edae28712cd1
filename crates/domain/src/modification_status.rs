// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Booking modification lifecycle states and transition rules.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle state of a booking modification request.
///
/// Path: `Pending → {Approved, Rejected}`; `Approved → Processing →
/// Completed`. A customer may withdraw their own request while it is
/// still `Pending`, moving it to `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationStatus {
    /// Submitted, awaiting admin review.
    Pending,
    /// Approved; awaiting payment acceptance or processing.
    Approved,
    /// Rejected by an admin. Terminal.
    Rejected,
    /// Changes being applied (and any charge collected).
    Processing,
    /// Changes applied to the booking. Terminal.
    Completed,
    /// Withdrawn by the customer before review. Terminal.
    Cancelled,
}

impl ModificationStatus {
    /// Returns the string representation used for persistence and
    /// API serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    fn parse_str(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::InvalidModificationStatus {
                status: s.to_string(),
            }),
        }
    }

    /// Returns true if this status is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Completed | Self::Cancelled)
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
            Self::Pending => matches!(
                new_status,
                Self::Approved | Self::Rejected | Self::Cancelled
            ),
            Self::Approved => matches!(new_status, Self::Processing),
            Self::Processing => matches!(new_status, Self::Completed),
            Self::Rejected | Self::Completed | Self::Cancelled => false,
        };

        if valid {
            Ok(())
        } else {
            Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "transition not permitted by modification lifecycle rules".to_string(),
            })
        }
    }
}

impl FromStr for ModificationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for ModificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ModificationStatus; 6] = [
        ModificationStatus::Pending,
        ModificationStatus::Approved,
        ModificationStatus::Rejected,
        ModificationStatus::Processing,
        ModificationStatus::Completed,
        ModificationStatus::Cancelled,
    ];

    #[test]
    fn test_status_string_round_trip() {
        for status in ALL {
            let s = status.as_str();
            match ModificationStatus::parse_str(s) {
                Ok(parsed) => assert_eq!(status, parsed),
                Err(e) => panic!("Failed to parse status string: {s}: {e}"),
            }
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ModificationStatus::Pending.is_terminal());
        assert!(!ModificationStatus::Approved.is_terminal());
        assert!(!ModificationStatus::Processing.is_terminal());
        assert!(ModificationStatus::Rejected.is_terminal());
        assert!(ModificationStatus::Completed.is_terminal());
        assert!(ModificationStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_completed_requires_processing() {
        for status in ALL {
            let result = status.validate_transition(ModificationStatus::Completed);
            if status == ModificationStatus::Processing {
                assert!(result.is_ok());
            } else {
                assert!(result.is_err());
            }
        }
    }

    #[test]
    fn test_customer_withdrawal_only_from_pending() {
        assert!(
            ModificationStatus::Pending
                .validate_transition(ModificationStatus::Cancelled)
                .is_ok()
        );
        assert!(
            ModificationStatus::Approved
                .validate_transition(ModificationStatus::Cancelled)
                .is_err()
        );
        assert!(
            ModificationStatus::Processing
                .validate_transition(ModificationStatus::Cancelled)
                .is_err()
        );
    }
}
