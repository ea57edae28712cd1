// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use rebook_domain::RefundMethod;
use time::Date;

/// A cancellation command represents admin intent as data only.
///
/// Commands are the only way to advance a cancellation's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancellationCommand {
    /// Approve the cancellation, fixing the refund at the current clock.
    Approve {
        /// The reviewing admin.
        admin_id: i64,
        /// Optional review notes.
        notes: Option<String>,
    },
    /// Reject the cancellation. Notes are mandatory.
    Reject {
        /// The reviewing admin.
        admin_id: i64,
        /// Why the cancellation was rejected.
        notes: String,
    },
    /// Fast-track an emergency cancellation straight into the refund queue.
    Expedite {
        /// The reviewing admin.
        admin_id: i64,
    },
    /// Record the refund payout and synchronize the booking.
    ProcessRefund {
        /// The admin processing the refund.
        admin_id: i64,
        /// External payment-system transaction reference.
        transaction_reference: String,
        /// The payout method the refund actually went through.
        refund_method: RefundMethod,
    },
}

/// A modification command represents customer or admin intent as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModificationCommand {
    /// Approve the modification request.
    Approve {
        /// The reviewing admin.
        admin_id: i64,
        /// Optional review notes.
        notes: Option<String>,
    },
    /// Reject the modification request. Notes are mandatory.
    Reject {
        /// The reviewing admin.
        admin_id: i64,
        /// Why the modification was rejected.
        notes: String,
    },
    /// Move an approved modification into processing (admin path, used
    /// when no additional payment is owed).
    Process {
        /// The admin starting processing.
        admin_id: i64,
    },
    /// Customer accepts the quoted additional charges, moving an
    /// approved modification into processing.
    AcceptCharges {
        /// The accepting customer.
        user_id: i64,
    },
    /// Apply the requested changes to the booking and close out the
    /// modification.
    Complete {
        /// The admin completing the modification.
        admin_id: i64,
    },
    /// Customer withdraws their own request while it is still pending.
    CancelByCustomer {
        /// The withdrawing customer.
        user_id: i64,
    },
    /// Admin amends the requested change while it is still pending;
    /// validation and pricing re-run against the new values.
    UpdateDetails {
        /// The amending admin.
        admin_id: i64,
        /// Replacement start date, when dates change.
        new_start_date: Option<Date>,
        /// Replacement end date, when dates change.
        new_end_date: Option<Date>,
        /// Replacement participant count, when participants change.
        new_participants: Option<u32>,
    },
}
