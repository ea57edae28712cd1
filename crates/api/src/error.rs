// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API-level errors and explicit error translation.
//!
//! Domain, core, and persistence errors are translated at this
//! boundary rather than leaked through it, so the server layer can
//! map each variant to a status code without inspecting inner types.

use rebook::CoreError;
use rebook_domain::DomainError;
use rebook_persistence::PersistenceError;

/// API-level errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The actor does not have permission for this action.
    Unauthorized {
        /// The action that was attempted.
        action: String,
    },
    /// The request failed validation. Every violation found is carried.
    Validation {
        /// Human-readable violation descriptions.
        errors: Vec<String>,
    },
    /// The requested resource does not exist.
    NotFound {
        /// What was looked for.
        message: String,
    },
    /// The request conflicts with the current state of the record.
    Conflict {
        /// Why the request cannot proceed.
        message: String,
    },
    /// A version-checked update lost its write race, even after
    /// retries.
    ConcurrentModification {
        /// Which record was contended.
        message: String,
    },
    /// The engine configuration is invalid. Operator error, not
    /// caller error.
    PolicyConfiguration {
        /// What is misconfigured.
        message: String,
    },
    /// An internal failure the caller cannot act on.
    Internal {
        /// The underlying failure.
        message: String,
    },
}

impl ApiError {
    /// Convenience constructor for a single-violation validation
    /// error.
    #[must_use]
    pub fn validation(message: String) -> Self {
        Self::Validation {
            errors: vec![message],
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized { action } => {
                write!(f, "Unauthorized: not permitted to {action}")
            }
            Self::Validation { errors } => {
                write!(f, "Validation failed: {}", errors.join("; "))
            }
            Self::NotFound { message } => write!(f, "Not found: {message}"),
            Self::Conflict { message } => write!(f, "Conflict: {message}"),
            Self::ConcurrentModification { message } => {
                write!(f, "Concurrent modification: {message}")
            }
            Self::PolicyConfiguration { message } => {
                write!(f, "Policy configuration error: {message}")
            }
            Self::Internal { message } => write!(f, "Internal error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Translates a domain error into an API error.
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidReason(_)
        | DomainError::InvalidNotes(_)
        | DomainError::AcknowledgmentMissing { .. }
        | DomainError::InvalidReasonCategory(_)
        | DomainError::InvalidRefundMethod(_)
        | DomainError::InvalidPaymentStatus(_)
        | DomainError::InvalidConfirmationStatus(_)
        | DomainError::InvalidCancellationStatus { .. }
        | DomainError::InvalidModificationStatus { .. }
        | DomainError::InvalidModificationType(_)
        | DomainError::InvalidAmount { .. }
        | DomainError::AdminNotesRequired { .. } => ApiError::validation(err.to_string()),
        DomainError::InvalidStatusTransition { .. }
        | DomainError::BookingNotCancellable { .. }
        | DomainError::EmergencyFlagRequired { .. } => ApiError::Conflict {
            message: err.to_string(),
        },
        DomainError::PolicyConfiguration(message) => ApiError::PolicyConfiguration { message },
    }
}

/// Translates a core error into an API error.
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(inner) => translate_domain_error(inner),
        CoreError::ValidationFailed(errors) => ApiError::Validation { errors },
    }
}

/// Translates a persistence error into an API error.
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::NotFound(message) => ApiError::NotFound { message },
        PersistenceError::DuplicateActiveCancellation { booking_id } => ApiError::Conflict {
            message: format!("booking {booking_id} already has an active cancellation request"),
        },
        PersistenceError::UniqueViolation(message) => ApiError::Conflict { message },
        PersistenceError::ConcurrentModification { record, id } => {
            ApiError::ConcurrentModification {
                message: format!("{record} {id} was modified concurrently"),
            }
        }
        PersistenceError::DatabaseError(_)
        | PersistenceError::DatabaseConnectionFailed(_)
        | PersistenceError::MigrationFailed(_)
        | PersistenceError::QueryFailed(_)
        | PersistenceError::SerializationError(_)
        | PersistenceError::InitializationError(_)
        | PersistenceError::ForeignKeyEnforcementNotEnabled => ApiError::Internal {
            message: err.to_string(),
        },
    }
}
