// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Outbound customer notifications.
//!
//! Notification delivery is an external collaborator. Handlers emit
//! events fire-and-forget: a delivery failure is logged and never
//! affects the outcome of the operation that produced it.

use tracing::{info, warn};

/// Events the engine notifies customers about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A cancellation request was received.
    CancellationRequested {
        /// The cancellation identifier.
        cancellation_id: i64,
        /// The requesting user.
        user_id: i64,
    },
    /// A cancellation was approved.
    CancellationApproved {
        /// The cancellation identifier.
        cancellation_id: i64,
        /// The requesting user.
        user_id: i64,
    },
    /// A cancellation was rejected.
    CancellationRejected {
        /// The cancellation identifier.
        cancellation_id: i64,
        /// The requesting user.
        user_id: i64,
    },
    /// A refund was processed.
    RefundProcessed {
        /// The cancellation identifier.
        cancellation_id: i64,
        /// The requesting user.
        user_id: i64,
    },
    /// A modification request was received.
    ModificationRequested {
        /// The modification identifier.
        modification_id: i64,
        /// The requesting user.
        user_id: i64,
    },
    /// A modification was reviewed (approved or rejected).
    ModificationReviewed {
        /// The modification identifier.
        modification_id: i64,
        /// The requesting user.
        user_id: i64,
        /// The resulting status string.
        status: String,
    },
    /// A modification was completed and applied to the booking.
    ModificationCompleted {
        /// The modification identifier.
        modification_id: i64,
        /// The requesting user.
        user_id: i64,
    },
}

/// Notification delivery failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyError(pub String);

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Notification delivery failed: {}", self.0)
    }
}

impl std::error::Error for NotifyError {}

/// Outbound notification channel.
pub trait Notifier {
    /// Delivers one notification.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails; the caller logs and
    /// continues.
    fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// A notifier that only writes to the log. The default channel until
/// a real delivery integration is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(?notification, "notification emitted");
        Ok(())
    }
}

/// Dispatches a notification fire-and-forget.
pub(crate) fn dispatch(notifier: &dyn Notifier, notification: Notification) {
    if let Err(e) = notifier.send(&notification) {
        warn!(?notification, error = %e, "notification delivery failed");
    }
}
