// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::{CancellationCommand, ModificationCommand};
use crate::error::CoreError;
use crate::state::{
    Actor, BookingChanges, BookingStatusUpdate, CancellationRecord, CancellationTransition,
    ModificationRecord, ModificationTransition, StatusHistoryEntry,
};
use rebook_domain::{
    Booking, CancellationStatus, ConfirmationStatus, DomainError, EngineConfig,
    ModificationRequest, ModificationStatus, PaymentStatus, PolicyTier, PriceQuote,
    RefundBreakdown, ValidationResult, calculate_refund, days_before_departure,
    quote_modification, validate_modification_request,
};
use time::{Date, OffsetDateTime};

fn entry(
    from: CancellationStatus,
    to: CancellationStatus,
    changed_by: Actor,
    note: Option<String>,
    changed_at: OffsetDateTime,
) -> StatusHistoryEntry {
    StatusHistoryEntry {
        from_status: Some(from.as_str().to_string()),
        to_status: to.as_str().to_string(),
        changed_by,
        note,
        changed_at,
    }
}

fn modification_entry(
    from: ModificationStatus,
    to: ModificationStatus,
    changed_by: Actor,
    note: Option<String>,
    changed_at: OffsetDateTime,
) -> StatusHistoryEntry {
    StatusHistoryEntry {
        from_status: Some(from.as_str().to_string()),
        to_status: to.as_str().to_string(),
        changed_by,
        note,
        changed_at,
    }
}

/// Applies a cancellation command to a record, producing the new record
/// and the status-history trail of the transition.
///
/// The record is never mutated in place; a transition either succeeds
/// completely or fails without side effects. The clock is read by the
/// caller and passed in.
///
/// # Arguments
///
/// * `booking` - The booking the cancellation targets
/// * `record` - The current record (immutable)
/// * `command` - The command to apply
/// * `config` - The engine configuration
/// * `now` - The externally read clock
///
/// # Errors
///
/// Returns an error if:
/// - The lifecycle does not permit the requested transition
/// - The command's own preconditions fail (missing notes, missing
///   emergency flags)
/// - The refund recomputation fails
#[allow(clippy::too_many_lines)]
pub fn apply_cancellation(
    booking: &Booking,
    record: &CancellationRecord,
    command: CancellationCommand,
    config: &EngineConfig,
    now: OffsetDateTime,
) -> Result<CancellationTransition, CoreError> {
    match command {
        CancellationCommand::Approve { admin_id, notes } => {
            record
                .status
                .validate_transition(CancellationStatus::Approved)?;

            // The refund is fixed at approval time, not request time:
            // days shrink while a request sits in the queue.
            let days: u32 = days_before_departure(booking.departure_date, now);
            let tier: &PolicyTier = config.policy.resolve(days)?;
            let breakdown: RefundBreakdown = calculate_refund(
                booking.total_amount,
                tier,
                record.emergency_flags,
                &config.emergency,
                config.currency_scale,
            )?;

            // Approval immediately queues the refund: the record lands
            // in refund_pending, with both hops in the history.
            let mut new_record: CancellationRecord = record.clone();
            new_record.status = CancellationStatus::RefundPending;
            new_record.days_before_departure = days;
            new_record.refund_breakdown = breakdown;
            new_record.reviewed_by = Some(admin_id);
            new_record.reviewed_at = Some(now);
            new_record.admin_notes = notes.clone();

            let history: Vec<StatusHistoryEntry> = vec![
                entry(
                    record.status,
                    CancellationStatus::Approved,
                    Actor::Admin(admin_id),
                    notes,
                    now,
                ),
                entry(
                    CancellationStatus::Approved,
                    CancellationStatus::RefundPending,
                    Actor::System,
                    Some(String::from("refund queued for processing")),
                    now,
                ),
            ];

            Ok(CancellationTransition {
                record: new_record,
                history,
                booking_update: None,
            })
        }
        CancellationCommand::Reject { admin_id, notes } => {
            if notes.trim().is_empty() {
                return Err(CoreError::DomainViolation(DomainError::AdminNotesRequired {
                    action: String::from("reject a cancellation"),
                }));
            }
            record
                .status
                .validate_transition(CancellationStatus::Rejected)?;

            let mut new_record: CancellationRecord = record.clone();
            new_record.status = CancellationStatus::Rejected;
            new_record.reviewed_by = Some(admin_id);
            new_record.reviewed_at = Some(now);
            new_record.admin_notes = Some(notes.clone());

            let history: StatusHistoryEntry = entry(
                record.status,
                CancellationStatus::Rejected,
                Actor::Admin(admin_id),
                Some(notes),
                now,
            );

            Ok(CancellationTransition {
                record: new_record,
                history: vec![history],
                booking_update: None,
            })
        }
        CancellationCommand::Expedite { admin_id } => {
            if !record.emergency_flags.any() {
                return Err(CoreError::DomainViolation(
                    DomainError::EmergencyFlagRequired {
                        cancellation_id: record.id,
                    },
                ));
            }
            record
                .status
                .validate_transition(CancellationStatus::Approved)?;

            let days: u32 = days_before_departure(booking.departure_date, now);
            let tier: &PolicyTier = config.policy.resolve(days)?;
            let breakdown: RefundBreakdown = calculate_refund(
                booking.total_amount,
                tier,
                record.emergency_flags,
                &config.emergency,
                config.currency_scale,
            )?;

            let note: String =
                String::from("expedited approval for verified emergency circumstances");

            let mut new_record: CancellationRecord = record.clone();
            new_record.status = CancellationStatus::RefundPending;
            new_record.days_before_departure = days;
            new_record.refund_breakdown = breakdown;
            new_record.reviewed_by = Some(admin_id);
            new_record.reviewed_at = Some(now);
            new_record.admin_notes = Some(note.clone());

            let history: Vec<StatusHistoryEntry> = vec![
                entry(
                    record.status,
                    CancellationStatus::Approved,
                    Actor::Admin(admin_id),
                    Some(note),
                    now,
                ),
                entry(
                    CancellationStatus::Approved,
                    CancellationStatus::RefundPending,
                    Actor::System,
                    Some(String::from("refund queued for processing")),
                    now,
                ),
            ];

            Ok(CancellationTransition {
                record: new_record,
                history,
                booking_update: None,
            })
        }
        CancellationCommand::ProcessRefund {
            admin_id,
            transaction_reference,
            refund_method,
        } => {
            record
                .status
                .validate_transition(CancellationStatus::Refunded)?;

            let history: Vec<StatusHistoryEntry> = vec![entry(
                record.status,
                CancellationStatus::Refunded,
                Actor::Admin(admin_id),
                Some(format!(
                    "refund processed via {refund_method}, transaction {transaction_reference}"
                )),
                now,
            )];

            let mut new_record: CancellationRecord = record.clone();
            new_record.status = CancellationStatus::Refunded;
            new_record.refund_transaction_reference = Some(transaction_reference);
            new_record.refund_method_used = Some(refund_method);
            new_record.refund_processed_at = Some(now);

            let payment_status: PaymentStatus =
                if record.refund_breakdown.net_refund == booking.total_amount {
                    PaymentStatus::Refunded
                } else {
                    PaymentStatus::PartiallyRefunded
                };

            Ok(CancellationTransition {
                record: new_record,
                history,
                booking_update: Some(BookingStatusUpdate {
                    payment_status,
                    confirmation_status: ConfirmationStatus::Cancelled,
                }),
            })
        }
    }
}

/// Applies a modification command to a record, producing the new record,
/// the status-history trail, and any booking field changes.
///
/// # Errors
///
/// Returns an error if:
/// - The lifecycle does not permit the requested transition
/// - The command's own preconditions fail (missing notes, no charges to
///   accept, details updated outside `Pending`)
/// - Re-validation or re-pricing of updated details fails
#[allow(clippy::too_many_lines)]
pub fn apply_modification(
    booking: &Booking,
    record: &ModificationRecord,
    command: ModificationCommand,
    config: &EngineConfig,
    now: OffsetDateTime,
) -> Result<ModificationTransition, CoreError> {
    match command {
        ModificationCommand::Approve { admin_id, notes } => {
            record
                .status
                .validate_transition(ModificationStatus::Approved)?;

            let mut new_record: ModificationRecord = record.clone();
            new_record.status = ModificationStatus::Approved;
            new_record.reviewed_by = Some(admin_id);
            new_record.reviewed_at = Some(now);
            new_record.admin_notes = notes.clone();

            let history: StatusHistoryEntry = modification_entry(
                record.status,
                ModificationStatus::Approved,
                Actor::Admin(admin_id),
                notes,
                now,
            );

            Ok(ModificationTransition {
                record: new_record,
                history: vec![history],
                booking_changes: None,
            })
        }
        ModificationCommand::Reject { admin_id, notes } => {
            if notes.trim().is_empty() {
                return Err(CoreError::DomainViolation(DomainError::AdminNotesRequired {
                    action: String::from("reject a modification"),
                }));
            }
            record
                .status
                .validate_transition(ModificationStatus::Rejected)?;

            let mut new_record: ModificationRecord = record.clone();
            new_record.status = ModificationStatus::Rejected;
            new_record.reviewed_by = Some(admin_id);
            new_record.reviewed_at = Some(now);
            new_record.admin_notes = Some(notes.clone());

            let history: StatusHistoryEntry = modification_entry(
                record.status,
                ModificationStatus::Rejected,
                Actor::Admin(admin_id),
                Some(notes),
                now,
            );

            Ok(ModificationTransition {
                record: new_record,
                history: vec![history],
                booking_changes: None,
            })
        }
        ModificationCommand::Process { admin_id } => {
            record
                .status
                .validate_transition(ModificationStatus::Processing)?;

            let mut new_record: ModificationRecord = record.clone();
            new_record.status = ModificationStatus::Processing;

            let history: StatusHistoryEntry = modification_entry(
                record.status,
                ModificationStatus::Processing,
                Actor::Admin(admin_id),
                None,
                now,
            );

            Ok(ModificationTransition {
                record: new_record,
                history: vec![history],
                booking_changes: None,
            })
        }
        ModificationCommand::AcceptCharges { user_id } => {
            if !record.quote.requires_additional_payment {
                return Err(CoreError::DomainViolation(
                    DomainError::InvalidStatusTransition {
                        from: record.status.as_str().to_string(),
                        to: ModificationStatus::Processing.as_str().to_string(),
                        reason: String::from("no additional charges to accept"),
                    },
                ));
            }
            record
                .status
                .validate_transition(ModificationStatus::Processing)?;

            let mut new_record: ModificationRecord = record.clone();
            new_record.status = ModificationStatus::Processing;
            new_record.charges_accepted_at = Some(now);

            let history: StatusHistoryEntry = modification_entry(
                record.status,
                ModificationStatus::Processing,
                Actor::Customer(user_id),
                Some(format!(
                    "customer accepted additional charges of {}",
                    record.quote.total_additional
                )),
                now,
            );

            Ok(ModificationTransition {
                record: new_record,
                history: vec![history],
                booking_changes: None,
            })
        }
        ModificationCommand::Complete { admin_id } => {
            record
                .status
                .validate_transition(ModificationStatus::Completed)?;

            let mut new_record: ModificationRecord = record.clone();
            new_record.status = ModificationStatus::Completed;
            new_record.completed_at = Some(now);

            let departure_date: Option<Date> = if record.modification_type.changes_dates() {
                record.new_start_date
            } else {
                None
            };
            let participants: Option<u32> = if record.modification_type.changes_participants() {
                record.new_participants
            } else {
                None
            };

            let history: StatusHistoryEntry = modification_entry(
                record.status,
                ModificationStatus::Completed,
                Actor::Admin(admin_id),
                Some(String::from("changes applied to booking")),
                now,
            );

            Ok(ModificationTransition {
                record: new_record,
                history: vec![history],
                booking_changes: Some(BookingChanges {
                    departure_date,
                    participants,
                    total_amount: record.quote.new_amount,
                }),
            })
        }
        ModificationCommand::CancelByCustomer { user_id } => {
            record
                .status
                .validate_transition(ModificationStatus::Cancelled)?;

            let mut new_record: ModificationRecord = record.clone();
            new_record.status = ModificationStatus::Cancelled;

            let history: StatusHistoryEntry = modification_entry(
                record.status,
                ModificationStatus::Cancelled,
                Actor::Customer(user_id),
                Some(String::from("withdrawn by customer")),
                now,
            );

            Ok(ModificationTransition {
                record: new_record,
                history: vec![history],
                booking_changes: None,
            })
        }
        ModificationCommand::UpdateDetails {
            admin_id,
            new_start_date,
            new_end_date,
            new_participants,
        } => {
            if record.status != ModificationStatus::Pending {
                return Err(CoreError::DomainViolation(
                    DomainError::InvalidStatusTransition {
                        from: record.status.as_str().to_string(),
                        to: ModificationStatus::Pending.as_str().to_string(),
                        reason: String::from("details can only be updated while pending"),
                    },
                ));
            }

            // The amended request re-runs the same validation and pricing
            // as a fresh submission.
            let updated_request: ModificationRequest = ModificationRequest {
                booking_id: record.booking_id,
                modification_type: record.modification_type,
                new_start_date,
                new_end_date,
                new_participants,
                reason: record.reason.clone(),
                customer_notes: record.customer_notes.clone(),
            };
            let validation: ValidationResult = validate_modification_request(
                booking,
                &updated_request,
                &config.modification,
                now,
            );
            if !validation.is_valid {
                return Err(CoreError::ValidationFailed(validation.errors));
            }

            let days: u32 = days_before_departure(booking.departure_date, now);
            let quote: PriceQuote = quote_modification(
                booking,
                &updated_request,
                &config.modification,
                days,
                config.currency_scale,
            )?;

            let mut new_record: ModificationRecord = record.clone();
            new_record.new_start_date = new_start_date;
            new_record.new_end_date = new_end_date;
            new_record.new_participants = new_participants;
            new_record.days_before_departure = days;
            new_record.quote = quote;

            let history: StatusHistoryEntry = modification_entry(
                record.status,
                ModificationStatus::Pending,
                Actor::Admin(admin_id),
                Some(String::from("request details amended; request re-priced")),
                now,
            );

            Ok(ModificationTransition {
                record: new_record,
                history: vec![history],
                booking_changes: None,
            })
        }
    }
}
