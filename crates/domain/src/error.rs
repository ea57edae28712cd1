// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Free-text cancellation reason fails the length constraint.
    InvalidReason(String),
    /// Additional notes exceed the permitted length.
    InvalidNotes(String),
    /// A required acknowledgment flag was not set.
    AcknowledgmentMissing {
        /// The acknowledgment field that must be set.
        field: String,
    },
    /// Reason category string is not recognized.
    InvalidReasonCategory(String),
    /// Refund method string is not recognized.
    InvalidRefundMethod(String),
    /// Payment status string is not recognized.
    InvalidPaymentStatus(String),
    /// Confirmation status string is not recognized.
    InvalidConfirmationStatus(String),
    /// Cancellation status string is not recognized.
    InvalidCancellationStatus {
        /// The unrecognized status string.
        status: String,
    },
    /// Modification status string is not recognized.
    InvalidModificationStatus {
        /// The unrecognized status string.
        status: String,
    },
    /// Modification type string is not recognized.
    InvalidModificationType(String),
    /// A lifecycle transition is not permitted from the current status.
    InvalidStatusTransition {
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
        /// Why the transition is not permitted.
        reason: String,
    },
    /// The booking cannot be cancelled in its current confirmation status.
    BookingNotCancellable {
        /// The booking identifier.
        booking_id: i64,
        /// The booking's current confirmation status.
        status: String,
    },
    /// Admin notes are mandatory for this action.
    AdminNotesRequired {
        /// The action requiring notes.
        action: String,
    },
    /// The cancellation carries no emergency flag but an emergency-only
    /// action was requested.
    EmergencyFlagRequired {
        /// The cancellation identifier.
        cancellation_id: i64,
    },
    /// A monetary amount is out of range for its field.
    InvalidAmount {
        /// The field holding the invalid amount.
        field: String,
        /// The offending value rendered as text.
        value: String,
    },
    /// The policy table is misconfigured. This is an internal fault and
    /// must never be silently defaulted.
    PolicyConfiguration(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidReason(msg) => write!(f, "Invalid cancellation reason: {msg}"),
            Self::InvalidNotes(msg) => write!(f, "Invalid notes: {msg}"),
            Self::AcknowledgmentMissing { field } => {
                write!(f, "Required acknowledgment '{field}' was not given")
            }
            Self::InvalidReasonCategory(value) => {
                write!(f, "Unknown reason category: {value}")
            }
            Self::InvalidRefundMethod(value) => write!(f, "Unknown refund method: {value}"),
            Self::InvalidPaymentStatus(value) => write!(f, "Unknown payment status: {value}"),
            Self::InvalidConfirmationStatus(value) => {
                write!(f, "Unknown confirmation status: {value}")
            }
            Self::InvalidCancellationStatus { status } => {
                write!(f, "Unknown cancellation status: {status}")
            }
            Self::InvalidModificationStatus { status } => {
                write!(f, "Unknown modification status: {status}")
            }
            Self::InvalidModificationType(value) => {
                write!(f, "Unknown modification type: {value}")
            }
            Self::InvalidStatusTransition { from, to, reason } => {
                write!(f, "Cannot transition from '{from}' to '{to}': {reason}")
            }
            Self::BookingNotCancellable { booking_id, status } => {
                write!(
                    f,
                    "Booking {booking_id} cannot be cancelled in status '{status}'"
                )
            }
            Self::AdminNotesRequired { action } => {
                write!(f, "Admin notes are required to {action}")
            }
            Self::EmergencyFlagRequired { cancellation_id } => {
                write!(
                    f,
                    "Cancellation {cancellation_id} carries no emergency flag and cannot be expedited"
                )
            }
            Self::InvalidAmount { field, value } => {
                write!(f, "Invalid amount for '{field}': {value}")
            }
            Self::PolicyConfiguration(msg) => {
                write!(f, "Cancellation policy misconfigured: {msg}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
