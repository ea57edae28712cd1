// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use rebook_domain::{
    CancellationReason, CancellationStatus, ConfirmationStatus, EmergencyFlags,
    ModificationStatus, ModificationType, PaymentStatus, PriceQuote, RefundBreakdown,
    RefundMethod,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

/// Who performed a lifecycle action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Actor {
    /// The customer who owns the record.
    Customer(i64),
    /// A staff member acting through the admin surface.
    Admin(i64),
    /// The engine itself (expedite notes, automated bookkeeping).
    System,
}

impl Actor {
    /// Renders the actor as the string stored in history rows.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Customer(id) => format!("customer:{id}"),
            Self::Admin(id) => format!("admin:{id}"),
            Self::System => String::from("system"),
        }
    }
}

/// One row of a record's status-history trail.
///
/// Statuses are carried in their persisted string form so one entry
/// type serves both lifecycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    /// The status before the change, `None` for record creation.
    pub from_status: Option<String>,
    /// The status after the change.
    pub to_status: String,
    /// Who made the change.
    pub changed_by: Actor,
    /// Optional note recorded with the change.
    pub note: Option<String>,
    /// When the change happened.
    pub changed_at: OffsetDateTime,
}

/// A cancellation request's full record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationRecord {
    /// Record identifier; zero until persisted.
    pub id: i64,
    /// The booking being cancelled.
    pub booking_id: i64,
    /// The customer who requested the cancellation.
    pub user_id: i64,
    /// Current lifecycle status.
    pub status: CancellationStatus,
    /// Enumerated reason category.
    pub reason_category: CancellationReason,
    /// Free-text reason.
    pub reason: String,
    /// Optional customer notes.
    pub additional_notes: Option<String>,
    /// Special-circumstance flags.
    pub emergency_flags: EmergencyFlags,
    /// Supporting document references.
    pub supporting_documents: Vec<String>,
    /// Emergency contact name.
    pub emergency_contact_name: Option<String>,
    /// Emergency contact phone.
    pub emergency_contact_phone: Option<String>,
    /// Emergency contact relationship.
    pub emergency_contact_relationship: Option<String>,
    /// Preferred refund payout method.
    pub preferred_refund_method: RefundMethod,
    /// Days before departure at the last refund evaluation.
    pub days_before_departure: u32,
    /// The refund breakdown; recomputed at approval time.
    pub refund_breakdown: RefundBreakdown,
    /// When the customer submitted the request.
    pub requested_at: OffsetDateTime,
    /// The admin who reviewed the request, once reviewed.
    pub reviewed_by: Option<i64>,
    /// When the request was reviewed.
    pub reviewed_at: Option<OffsetDateTime>,
    /// Admin review notes.
    pub admin_notes: Option<String>,
    /// Payment-system reference recorded when the refund is processed.
    pub refund_transaction_reference: Option<String>,
    /// Payout method actually used, recorded when the refund is
    /// processed; may differ from the preferred method.
    pub refund_method_used: Option<RefundMethod>,
    /// When the refund was processed.
    pub refund_processed_at: Option<OffsetDateTime>,
    /// Optimistic-concurrency version, bumped by the persistence layer.
    pub version: i64,
}

/// Booking status side effect of a completed refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingStatusUpdate {
    /// New payment status.
    pub payment_status: PaymentStatus,
    /// New confirmation status.
    pub confirmation_status: ConfirmationStatus,
}

/// The result of a successful cancellation transition.
///
/// Transitions are atomic: the persistence layer writes the record, the
/// history entries, and any booking update in one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationTransition {
    /// The record after the transition.
    pub record: CancellationRecord,
    /// History entries for every status hop taken, in order.
    pub history: Vec<StatusHistoryEntry>,
    /// Booking status side effect, present only when a refund completes.
    pub booking_update: Option<BookingStatusUpdate>,
}

/// A booking modification request's full record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationRecord {
    /// Record identifier; zero until persisted.
    pub id: i64,
    /// The booking being modified.
    pub booking_id: i64,
    /// The customer who requested the modification.
    pub user_id: i64,
    /// Current lifecycle status.
    pub status: ModificationStatus,
    /// What kind of change is requested.
    pub modification_type: ModificationType,
    /// Requested new departure date, when dates change.
    pub new_start_date: Option<Date>,
    /// Requested new end date, when dates change.
    pub new_end_date: Option<Date>,
    /// Requested new participant count, when participants change.
    pub new_participants: Option<u32>,
    /// Free-text reason for the change.
    pub reason: Option<String>,
    /// Customer notes for staff.
    pub customer_notes: Option<String>,
    /// Days before departure at the last pricing evaluation.
    pub days_before_departure: u32,
    /// The price quote; recomputed when details change.
    pub quote: PriceQuote,
    /// When the customer submitted the request.
    pub requested_at: OffsetDateTime,
    /// The admin who reviewed the request, once reviewed.
    pub reviewed_by: Option<i64>,
    /// When the request was reviewed.
    pub reviewed_at: Option<OffsetDateTime>,
    /// Admin review notes.
    pub admin_notes: Option<String>,
    /// When the customer accepted the quoted charges.
    pub charges_accepted_at: Option<OffsetDateTime>,
    /// When the changes were applied to the booking.
    pub completed_at: Option<OffsetDateTime>,
    /// Optimistic-concurrency version, bumped by the persistence layer.
    pub version: i64,
}

/// Booking field changes applied when a modification completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingChanges {
    /// New departure date, when the modification changes dates.
    pub departure_date: Option<Date>,
    /// New participant count, when the modification changes participants.
    pub participants: Option<u32>,
    /// The booking's new total amount.
    pub total_amount: Decimal,
}

/// The result of a successful modification transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModificationTransition {
    /// The record after the transition.
    pub record: ModificationRecord,
    /// History entries for every status hop taken, in order.
    pub history: Vec<StatusHistoryEntry>,
    /// Booking field changes, present only when the modification completes.
    pub booking_changes: Option<BookingChanges>,
}
