// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API operations for the booking change engine.
//!
//! Every handler follows the same shape: authorize, read current
//! state, run the pure core logic, persist, notify. The clock is read
//! once by the caller and threaded through, so a single operation
//! never observes two different instants.
//!
//! Command handlers retry version conflicts: when a version-checked
//! update loses its race, the record is re-read and the command is
//! re-applied against the refreshed state, up to [`MAX_ATTEMPTS`]
//! times in total.

use rebook::{
    CancellationCommand, CancellationEvaluation, CancellationRecord, CancellationTransition,
    ModificationCommand, ModificationRecord, ModificationTransition, evaluate_cancellation,
    new_cancellation, new_modification,
};
use rebook_domain::{
    Booking, CancellationRequest, CancellationStatus, ConfirmationStatus, EmergencyFlags,
    EngineConfig, ModificationRequest, ModificationStatus, ModificationType, PolicyTier,
    PriceQuote, RefundBreakdown, RefundMethod, UserCancellationSummary, ValidationResult,
    calculate_price_difference, calculate_processing_fee, calculate_refund,
    days_before_departure, is_abusive_canceller, quote_modification,
    validate_modification_request,
};
use rebook_persistence::{
    CancellationStatistics, ModificationStatistics, Persistence, PersistenceError, ReasonStats,
    UserCancellationTotals,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use time::{Duration, OffsetDateTime};
use tracing::info;

use crate::auth::AuthenticatedActor;
use crate::error::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
};
use crate::notify::{Notification, Notifier, dispatch};
use crate::request_response::{
    AbuseCheckResponse, CanModifyResponse, EvaluationResponse, HistoryEntryView,
    PriceDifferenceResponse, ProcessingFeeResponse,
};

/// Total attempts for a version-checked update, including the first.
const MAX_ATTEMPTS: u32 = 3;

// ============================================================================
// Bookings
// ============================================================================

/// Registers a booking mirror row from the external booking
/// subsystem.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or persistence
/// fails.
pub fn register_booking(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    booking: &Booking,
    now: OffsetDateTime,
) -> Result<i64, ApiError> {
    actor.require_admin("register a booking")?;
    let booking_id: i64 = persistence
        .register_booking(booking, now)
        .map_err(translate_persistence_error)?;
    info!(booking_id, "registered booking mirror");
    Ok(booking_id)
}

/// Looks up a booking, owner or admin only.
///
/// # Errors
///
/// Returns an error if the booking is missing or the actor may not
/// see it.
pub fn get_booking(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    booking_id: i64,
) -> Result<Booking, ApiError> {
    let booking: Booking = persistence
        .get_booking(booking_id)
        .map_err(translate_persistence_error)?;
    actor.require_owner(booking.customer_id, "view this booking")?;
    Ok(booking)
}

// ============================================================================
// Cancellation: evaluation and request
// ============================================================================

/// Previews the refund a cancellation would produce, without
/// committing anything.
///
/// Acknowledgment flags are not required for a preview.
///
/// # Errors
///
/// Returns an error if the booking is missing, the actor may not see
/// it, or the request fails evaluation.
pub fn evaluate(
    persistence: &mut Persistence,
    config: &EngineConfig,
    actor: &AuthenticatedActor,
    request: &CancellationRequest,
    now: OffsetDateTime,
) -> Result<EvaluationResponse, ApiError> {
    let booking: Booking = persistence
        .get_booking(request.booking_id)
        .map_err(translate_persistence_error)?;
    actor.require_owner(booking.customer_id, "evaluate a cancellation for this booking")?;

    let evaluation: CancellationEvaluation =
        evaluate_cancellation(&booking, request, config, now).map_err(translate_core_error)?;
    Ok(EvaluationResponse::from(evaluation))
}

/// Computes the refund breakdown for a booking under given emergency
/// flags, without a full request payload.
///
/// # Errors
///
/// Returns an error if the booking is missing, the actor may not see
/// it, or the policy table cannot resolve the timing.
pub fn calculate_refund_amount(
    persistence: &mut Persistence,
    config: &EngineConfig,
    actor: &AuthenticatedActor,
    booking_id: i64,
    flags: EmergencyFlags,
    now: OffsetDateTime,
) -> Result<RefundBreakdown, ApiError> {
    let booking: Booking = persistence
        .get_booking(booking_id)
        .map_err(translate_persistence_error)?;
    actor.require_owner(booking.customer_id, "calculate a refund for this booking")?;

    let days: u32 = days_before_departure(booking.departure_date, now);
    let tier: &PolicyTier = config.policy.resolve(days).map_err(translate_domain_error)?;
    calculate_refund(
        booking.total_amount,
        tier,
        flags,
        &config.emergency,
        config.currency_scale,
    )
    .map_err(translate_domain_error)
}

/// Submits a cancellation request.
///
/// Emergency-flagged requests enter review directly; everything else
/// starts as `requested`. The stored record is returned with its
/// assigned identifier.
///
/// # Errors
///
/// Returns an error if validation fails, the actor does not own the
/// booking, or the booking already has an active cancellation.
pub fn request_cancellation(
    persistence: &mut Persistence,
    config: &EngineConfig,
    notifier: &dyn Notifier,
    actor: &AuthenticatedActor,
    request: &CancellationRequest,
    now: OffsetDateTime,
) -> Result<CancellationRecord, ApiError> {
    let booking: Booking = persistence
        .get_booking(request.booking_id)
        .map_err(translate_persistence_error)?;
    actor.require_owner(booking.customer_id, "cancel this booking")?;

    let transition: CancellationTransition =
        new_cancellation(&booking, request, config, now).map_err(translate_core_error)?;
    let id: i64 = persistence
        .insert_cancellation(&transition.record, &transition.history)
        .map_err(translate_persistence_error)?;

    let record: CancellationRecord = persistence
        .get_cancellation(id)
        .map_err(translate_persistence_error)?;
    info!(
        cancellation_id = id,
        booking_id = booking.booking_id,
        status = record.status.as_str(),
        "cancellation requested"
    );
    dispatch(
        notifier,
        Notification::CancellationRequested {
            cancellation_id: id,
            user_id: record.user_id,
        },
    );
    Ok(record)
}

// ============================================================================
// Cancellation: reads
// ============================================================================

/// Looks up a cancellation, owner or admin only.
///
/// # Errors
///
/// Returns an error if the record is missing or the actor may not see
/// it.
pub fn get_cancellation(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    cancellation_id: i64,
) -> Result<CancellationRecord, ApiError> {
    let record: CancellationRecord = persistence
        .get_cancellation(cancellation_id)
        .map_err(translate_persistence_error)?;
    actor.require_owner(record.user_id, "view this cancellation")?;
    Ok(record)
}

/// Returns the status history of a cancellation, owner or admin only.
///
/// # Errors
///
/// Returns an error if the record is missing or the actor may not see
/// it.
pub fn get_cancellation_history(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    cancellation_id: i64,
) -> Result<Vec<HistoryEntryView>, ApiError> {
    let record: CancellationRecord = persistence
        .get_cancellation(cancellation_id)
        .map_err(translate_persistence_error)?;
    actor.require_owner(record.user_id, "view this cancellation")?;

    let history = persistence
        .get_cancellation_history(cancellation_id)
        .map_err(translate_persistence_error)?;
    Ok(history.into_iter().map(HistoryEntryView::from).collect())
}

/// Returns the most recent cancellation for a booking, if any.
///
/// # Errors
///
/// Returns an error if the booking is missing or the actor may not
/// see it.
pub fn get_cancellation_for_booking(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    booking_id: i64,
) -> Result<Option<CancellationRecord>, ApiError> {
    let booking: Booking = persistence
        .get_booking(booking_id)
        .map_err(translate_persistence_error)?;
    actor.require_owner(booking.customer_id, "view cancellations for this booking")?;
    persistence
        .get_cancellation_for_booking(booking_id)
        .map_err(translate_persistence_error)
}

/// Lists the calling customer's cancellations, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_my_cancellations(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
) -> Result<Vec<CancellationRecord>, ApiError> {
    persistence
        .list_cancellations_by_user(actor.id)
        .map_err(translate_persistence_error)
}

// ============================================================================
// Cancellation: admin commands
// ============================================================================

/// Drives a cancellation command through read, apply, and persist,
/// retrying version conflicts against refreshed state.
fn drive_cancellation_command<F>(
    persistence: &mut Persistence,
    config: &EngineConfig,
    cancellation_id: i64,
    make_command: F,
    now: OffsetDateTime,
) -> Result<CancellationRecord, ApiError>
where
    F: Fn() -> CancellationCommand,
{
    for attempt in 1..=MAX_ATTEMPTS {
        let record: CancellationRecord = persistence
            .get_cancellation(cancellation_id)
            .map_err(translate_persistence_error)?;
        let booking: Booking = persistence
            .get_booking(record.booking_id)
            .map_err(translate_persistence_error)?;

        let transition: CancellationTransition =
            rebook::apply_cancellation(&booking, &record, make_command(), config, now)
                .map_err(translate_core_error)?;

        match persistence.update_cancellation(&transition) {
            Ok(()) => {
                return persistence
                    .get_cancellation(cancellation_id)
                    .map_err(translate_persistence_error);
            }
            Err(PersistenceError::ConcurrentModification { .. }) if attempt < MAX_ATTEMPTS => {
                info!(
                    cancellation_id,
                    attempt, "version conflict, retrying against refreshed record"
                );
            }
            Err(e) => return Err(translate_persistence_error(e)),
        }
    }
    Err(ApiError::ConcurrentModification {
        message: format!("cancellation {cancellation_id} was modified concurrently"),
    })
}

/// Approves a cancellation. The refund is recomputed at approval
/// time and the record advances straight to refund pending.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the record is not
/// in a reviewable status.
pub fn approve_cancellation(
    persistence: &mut Persistence,
    config: &EngineConfig,
    notifier: &dyn Notifier,
    actor: &AuthenticatedActor,
    cancellation_id: i64,
    notes: Option<String>,
    now: OffsetDateTime,
) -> Result<CancellationRecord, ApiError> {
    actor.require_admin("approve a cancellation")?;
    let admin_id: i64 = actor.id;
    let record: CancellationRecord = drive_cancellation_command(
        persistence,
        config,
        cancellation_id,
        || CancellationCommand::Approve {
            admin_id,
            notes: notes.clone(),
        },
        now,
    )?;
    dispatch(
        notifier,
        Notification::CancellationApproved {
            cancellation_id,
            user_id: record.user_id,
        },
    );
    Ok(record)
}

/// Rejects a cancellation. Admin notes are mandatory.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the notes are
/// empty, or the record is not in a reviewable status.
pub fn reject_cancellation(
    persistence: &mut Persistence,
    config: &EngineConfig,
    notifier: &dyn Notifier,
    actor: &AuthenticatedActor,
    cancellation_id: i64,
    notes: String,
    now: OffsetDateTime,
) -> Result<CancellationRecord, ApiError> {
    actor.require_admin("reject a cancellation")?;
    let admin_id: i64 = actor.id;
    let record: CancellationRecord = drive_cancellation_command(
        persistence,
        config,
        cancellation_id,
        || CancellationCommand::Reject {
            admin_id,
            notes: notes.clone(),
        },
        now,
    )?;
    dispatch(
        notifier,
        Notification::CancellationRejected {
            cancellation_id,
            user_id: record.user_id,
        },
    );
    Ok(record)
}

/// Expedites an emergency cancellation straight to approval.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the record
/// carries no emergency flag.
pub fn expedite_cancellation(
    persistence: &mut Persistence,
    config: &EngineConfig,
    notifier: &dyn Notifier,
    actor: &AuthenticatedActor,
    cancellation_id: i64,
    now: OffsetDateTime,
) -> Result<CancellationRecord, ApiError> {
    actor.require_admin("expedite a cancellation")?;
    let admin_id: i64 = actor.id;
    let record: CancellationRecord = drive_cancellation_command(
        persistence,
        config,
        cancellation_id,
        || CancellationCommand::Expedite { admin_id },
        now,
    )?;
    dispatch(
        notifier,
        Notification::CancellationApproved {
            cancellation_id,
            user_id: record.user_id,
        },
    );
    Ok(record)
}

/// Records a processed refund and synchronizes the booking. The
/// transaction reference and the payout method actually used are
/// stored on the record.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the refund method
/// is unknown, or the record's refund is not pending.
#[allow(clippy::too_many_arguments)]
pub fn process_refund(
    persistence: &mut Persistence,
    config: &EngineConfig,
    notifier: &dyn Notifier,
    actor: &AuthenticatedActor,
    cancellation_id: i64,
    transaction_reference: String,
    refund_method: &str,
    now: OffsetDateTime,
) -> Result<CancellationRecord, ApiError> {
    actor.require_admin("process a refund")?;
    let admin_id: i64 = actor.id;
    let method: RefundMethod =
        RefundMethod::from_str(refund_method).map_err(translate_domain_error)?;
    let record: CancellationRecord = drive_cancellation_command(
        persistence,
        config,
        cancellation_id,
        || CancellationCommand::ProcessRefund {
            admin_id,
            transaction_reference: transaction_reference.clone(),
            refund_method: method,
        },
        now,
    )?;
    dispatch(
        notifier,
        Notification::RefundProcessed {
            cancellation_id,
            user_id: record.user_id,
        },
    );
    Ok(record)
}

// ============================================================================
// Cancellation: admin listings and reporting
// ============================================================================

/// Lists cancellations awaiting review, oldest first. Admin only.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the query fails.
pub fn list_pending_cancellations(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
) -> Result<Vec<CancellationRecord>, ApiError> {
    actor.require_admin("list pending cancellations")?;
    persistence
        .list_pending_cancellations()
        .map_err(translate_persistence_error)
}

/// Lists unreviewed emergency cancellations, oldest first. Admin
/// only.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the query fails.
pub fn list_emergency_cancellations(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
) -> Result<Vec<CancellationRecord>, ApiError> {
    actor.require_admin("list emergency cancellations")?;
    persistence
        .list_emergency_cancellations()
        .map_err(translate_persistence_error)
}

/// Lists approved cancellations whose refund is outstanding. Admin
/// only.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the query fails.
pub fn list_cancellations_awaiting_refund(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
) -> Result<Vec<CancellationRecord>, ApiError> {
    actor.require_admin("list cancellations awaiting refund")?;
    persistence
        .list_cancellations_awaiting_refund()
        .map_err(translate_persistence_error)
}

/// Searches cancellation reason text. Admin only.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the query fails.
pub fn search_cancellations(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    term: &str,
) -> Result<Vec<CancellationRecord>, ApiError> {
    actor.require_admin("search cancellations")?;
    persistence
        .search_cancellations_by_reason(term)
        .map_err(translate_persistence_error)
}

/// Lists cancellations in a given status. Admin only.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the status string
/// is unknown, or the query fails.
pub fn list_cancellations_by_status(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    status: &str,
) -> Result<Vec<CancellationRecord>, ApiError> {
    actor.require_admin("list cancellations by status")?;
    let status: CancellationStatus =
        CancellationStatus::from_str(status).map_err(translate_domain_error)?;
    persistence
        .list_cancellations_by_status(status)
        .map_err(translate_persistence_error)
}

/// Lists cancellations requested inside an inclusive time range.
/// Admin only.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the range is
/// inverted, or the query fails.
pub fn list_cancellations_by_date_range(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    from: OffsetDateTime,
    to: OffsetDateTime,
) -> Result<Vec<CancellationRecord>, ApiError> {
    actor.require_admin("list cancellations by date range")?;
    if from > to {
        return Err(ApiError::validation(String::from(
            "date range start must not be after its end",
        )));
    }
    persistence
        .list_cancellations_by_date_range(from, to)
        .map_err(translate_persistence_error)
}

/// Computes cancellation statistics over a time window. Admin only.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the query fails.
pub fn cancellation_statistics(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    from: OffsetDateTime,
    to: OffsetDateTime,
) -> Result<CancellationStatistics, ApiError> {
    actor.require_admin("view cancellation statistics")?;
    persistence
        .cancellation_statistics(from, to)
        .map_err(translate_persistence_error)
}

/// Computes per-reason request counts over a time window. Admin only.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the query fails.
pub fn cancellation_reason_stats(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    from: OffsetDateTime,
    to: OffsetDateTime,
) -> Result<Vec<ReasonStats>, ApiError> {
    actor.require_admin("view cancellation reason statistics")?;
    persistence
        .cancellation_reason_stats(from, to)
        .map_err(translate_persistence_error)
}

/// Builds the per-user cancellation summary, including the abuse
/// verdict. Admin only.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or a query fails.
pub fn user_cancellation_summary(
    persistence: &mut Persistence,
    config: &EngineConfig,
    actor: &AuthenticatedActor,
    user_id: i64,
    now: OffsetDateTime,
) -> Result<UserCancellationSummary, ApiError> {
    actor.require_admin("view a user's cancellation summary")?;

    let window_start: OffsetDateTime =
        now - Duration::days(i64::from(config.abuse.window_days));
    let totals: UserCancellationTotals = persistence
        .user_cancellation_totals(user_id)
        .map_err(translate_persistence_error)?;
    let recent_cancellations: u64 = persistence
        .count_recent_cancellations_by_user(user_id, window_start)
        .map_err(translate_persistence_error)?;
    let recent_bookings: u64 = persistence
        .count_bookings_by_customer_since(user_id, window_start)
        .map_err(translate_persistence_error)?;

    Ok(UserCancellationSummary {
        user_id,
        total_cancellations: totals.total_cancellations,
        recent_cancellations,
        recent_bookings,
        total_refund_received: totals.total_refund_received,
        is_abusive: is_abusive_canceller(recent_cancellations, recent_bookings, &config.abuse),
    })
}

/// Checks whether a user trips the abuse thresholds. Admin only.
///
/// The verdict is advisory; it never blocks a request by itself.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or a query fails.
pub fn is_abusive(
    persistence: &mut Persistence,
    config: &EngineConfig,
    actor: &AuthenticatedActor,
    user_id: i64,
    now: OffsetDateTime,
) -> Result<AbuseCheckResponse, ApiError> {
    actor.require_admin("run an abuse check")?;

    let window_start: OffsetDateTime =
        now - Duration::days(i64::from(config.abuse.window_days));
    let recent_cancellations: u64 = persistence
        .count_recent_cancellations_by_user(user_id, window_start)
        .map_err(translate_persistence_error)?;
    let recent_bookings: u64 = persistence
        .count_bookings_by_customer_since(user_id, window_start)
        .map_err(translate_persistence_error)?;

    Ok(AbuseCheckResponse {
        user_id,
        recent_cancellations,
        recent_bookings,
        is_abusive: is_abusive_canceller(recent_cancellations, recent_bookings, &config.abuse),
    })
}

// ============================================================================
// Modification: request and customer operations
// ============================================================================

/// Submits a modification request.
///
/// # Errors
///
/// Returns an error if validation fails or the actor does not own the
/// booking.
pub fn request_modification(
    persistence: &mut Persistence,
    config: &EngineConfig,
    notifier: &dyn Notifier,
    actor: &AuthenticatedActor,
    request: &ModificationRequest,
    now: OffsetDateTime,
) -> Result<ModificationRecord, ApiError> {
    let booking: Booking = persistence
        .get_booking(request.booking_id)
        .map_err(translate_persistence_error)?;
    actor.require_owner(booking.customer_id, "modify this booking")?;

    let transition: ModificationTransition =
        new_modification(&booking, request, config, now).map_err(translate_core_error)?;
    let id: i64 = persistence
        .insert_modification(&transition.record, &transition.history)
        .map_err(translate_persistence_error)?;

    let record: ModificationRecord = persistence
        .get_modification(id)
        .map_err(translate_persistence_error)?;
    info!(
        modification_id = id,
        booking_id = booking.booking_id,
        modification_type = record.modification_type.as_str(),
        "modification requested"
    );
    dispatch(
        notifier,
        Notification::ModificationRequested {
            modification_id: id,
            user_id: record.user_id,
        },
    );
    Ok(record)
}

/// Looks up a modification, owner or admin only.
///
/// # Errors
///
/// Returns an error if the record is missing or the actor may not see
/// it.
pub fn get_modification(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    modification_id: i64,
) -> Result<ModificationRecord, ApiError> {
    let record: ModificationRecord = persistence
        .get_modification(modification_id)
        .map_err(translate_persistence_error)?;
    actor.require_owner(record.user_id, "view this modification")?;
    Ok(record)
}

/// Returns the status history of a modification, owner or admin only.
///
/// # Errors
///
/// Returns an error if the record is missing or the actor may not see
/// it.
pub fn get_modification_history(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    modification_id: i64,
) -> Result<Vec<HistoryEntryView>, ApiError> {
    let record: ModificationRecord = persistence
        .get_modification(modification_id)
        .map_err(translate_persistence_error)?;
    actor.require_owner(record.user_id, "view this modification")?;

    let history = persistence
        .get_modification_history(modification_id)
        .map_err(translate_persistence_error)?;
    Ok(history.into_iter().map(HistoryEntryView::from).collect())
}

/// Lists the calling customer's modification requests, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_my_modifications(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
) -> Result<Vec<ModificationRecord>, ApiError> {
    persistence
        .list_modifications_by_user(actor.id)
        .map_err(translate_persistence_error)
}

/// Drives a modification command through read, apply, and persist,
/// retrying version conflicts against refreshed state.
fn drive_modification_command<F>(
    persistence: &mut Persistence,
    config: &EngineConfig,
    modification_id: i64,
    make_command: F,
    now: OffsetDateTime,
) -> Result<ModificationRecord, ApiError>
where
    F: Fn() -> ModificationCommand,
{
    for attempt in 1..=MAX_ATTEMPTS {
        let record: ModificationRecord = persistence
            .get_modification(modification_id)
            .map_err(translate_persistence_error)?;
        let booking: Booking = persistence
            .get_booking(record.booking_id)
            .map_err(translate_persistence_error)?;

        let transition: ModificationTransition =
            rebook::apply_modification(&booking, &record, make_command(), config, now)
                .map_err(translate_core_error)?;

        match persistence.update_modification(&transition) {
            Ok(()) => {
                return persistence
                    .get_modification(modification_id)
                    .map_err(translate_persistence_error);
            }
            Err(PersistenceError::ConcurrentModification { .. }) if attempt < MAX_ATTEMPTS => {
                info!(
                    modification_id,
                    attempt, "version conflict, retrying against refreshed record"
                );
            }
            Err(e) => return Err(translate_persistence_error(e)),
        }
    }
    Err(ApiError::ConcurrentModification {
        message: format!("modification {modification_id} was modified concurrently"),
    })
}

/// Withdraws the calling customer's pending modification.
///
/// # Errors
///
/// Returns an error if the record is missing, the actor does not own
/// it, or it is no longer pending.
pub fn cancel_my_modification(
    persistence: &mut Persistence,
    config: &EngineConfig,
    actor: &AuthenticatedActor,
    modification_id: i64,
    now: OffsetDateTime,
) -> Result<ModificationRecord, ApiError> {
    let record: ModificationRecord = persistence
        .get_modification(modification_id)
        .map_err(translate_persistence_error)?;
    actor.require_owner(record.user_id, "withdraw this modification")?;

    let user_id: i64 = record.user_id;
    drive_modification_command(
        persistence,
        config,
        modification_id,
        || ModificationCommand::CancelByCustomer { user_id },
        now,
    )
}

/// Accepts the additional charges on an approved modification, moving
/// it to processing.
///
/// # Errors
///
/// Returns an error if the record is missing, the actor does not own
/// it, it is not approved, or it carries no additional charges.
pub fn accept_modification_charges(
    persistence: &mut Persistence,
    config: &EngineConfig,
    actor: &AuthenticatedActor,
    modification_id: i64,
    now: OffsetDateTime,
) -> Result<ModificationRecord, ApiError> {
    let record: ModificationRecord = persistence
        .get_modification(modification_id)
        .map_err(translate_persistence_error)?;
    actor.require_owner(record.user_id, "accept charges on this modification")?;

    let user_id: i64 = record.user_id;
    drive_modification_command(
        persistence,
        config,
        modification_id,
        || ModificationCommand::AcceptCharges { user_id },
        now,
    )
}

// ============================================================================
// Modification: pricing and validation previews
// ============================================================================

/// Builds a full price quote for a modification request without
/// committing anything.
///
/// # Errors
///
/// Returns an error if the booking is missing, the actor may not see
/// it, or the request fails validation.
pub fn modification_price_quote(
    persistence: &mut Persistence,
    config: &EngineConfig,
    actor: &AuthenticatedActor,
    request: &ModificationRequest,
    now: OffsetDateTime,
) -> Result<PriceQuote, ApiError> {
    let booking: Booking = persistence
        .get_booking(request.booking_id)
        .map_err(translate_persistence_error)?;
    actor.require_owner(booking.customer_id, "quote a modification for this booking")?;

    let validation: ValidationResult =
        validate_modification_request(&booking, request, &config.modification, now);
    if !validation.is_valid {
        return Err(ApiError::Validation {
            errors: validation.errors,
        });
    }

    let days: u32 = days_before_departure(booking.departure_date, now);
    quote_modification(
        &booking,
        request,
        &config.modification,
        days,
        config.currency_scale,
    )
    .map_err(translate_domain_error)
}

/// Checks whether a booking currently accepts modification requests
/// at all, independent of any concrete change.
///
/// # Errors
///
/// Returns an error if the booking is missing or the actor may not
/// see it.
pub fn can_modify_booking(
    persistence: &mut Persistence,
    config: &EngineConfig,
    actor: &AuthenticatedActor,
    booking_id: i64,
    now: OffsetDateTime,
) -> Result<CanModifyResponse, ApiError> {
    let booking: Booking = persistence
        .get_booking(booking_id)
        .map_err(translate_persistence_error)?;
    actor.require_owner(booking.customer_id, "check modifiability of this booking")?;

    let mut reasons: Vec<String> = Vec::new();
    if booking.confirmation_status != ConfirmationStatus::Confirmed {
        reasons.push(format!(
            "booking is {} and only confirmed bookings can be modified",
            booking.confirmation_status
        ));
    }
    let days: u32 = days_before_departure(booking.departure_date, now);
    if days < config.modification.minimum_notice_days {
        reasons.push(format!(
            "departure is {days} days away, below the minimum notice of {} days",
            config.modification.minimum_notice_days
        ));
    }
    Ok(CanModifyResponse {
        can_modify: reasons.is_empty(),
        reasons,
    })
}

/// Runs structural validation on a modification request without
/// committing anything.
///
/// # Errors
///
/// Returns an error if the booking is missing or the actor may not
/// see it.
pub fn validate_modification(
    persistence: &mut Persistence,
    config: &EngineConfig,
    actor: &AuthenticatedActor,
    request: &ModificationRequest,
    now: OffsetDateTime,
) -> Result<ValidationResult, ApiError> {
    let booking: Booking = persistence
        .get_booking(request.booking_id)
        .map_err(translate_persistence_error)?;
    actor.require_owner(booking.customer_id, "validate a modification for this booking")?;
    Ok(validate_modification_request(
        &booking,
        request,
        &config.modification,
        now,
    ))
}

/// Computes the raw price difference for a modification request.
///
/// # Errors
///
/// Returns an error if the booking is missing or the actor may not
/// see it.
pub fn price_difference(
    persistence: &mut Persistence,
    config: &EngineConfig,
    actor: &AuthenticatedActor,
    request: &ModificationRequest,
) -> Result<PriceDifferenceResponse, ApiError> {
    let booking: Booking = persistence
        .get_booking(request.booking_id)
        .map_err(translate_persistence_error)?;
    actor.require_owner(booking.customer_id, "price a modification for this booking")?;

    let difference: Decimal = calculate_price_difference(
        &booking,
        request,
        &config.modification,
        config.currency_scale,
    );
    Ok(PriceDifferenceResponse {
        original_amount: booking.total_amount,
        new_amount: booking.total_amount + difference,
        price_difference: difference,
    })
}

/// Resolves the processing fee a modification of the given type would
/// carry for a booking.
///
/// # Errors
///
/// Returns an error if the booking is missing, the actor may not see
/// it, or the change type string is unknown.
pub fn processing_fee(
    persistence: &mut Persistence,
    config: &EngineConfig,
    actor: &AuthenticatedActor,
    booking_id: i64,
    modification_type: &str,
    now: OffsetDateTime,
) -> Result<ProcessingFeeResponse, ApiError> {
    let booking: Booking = persistence
        .get_booking(booking_id)
        .map_err(translate_persistence_error)?;
    actor.require_owner(booking.customer_id, "price a modification for this booking")?;

    let change: ModificationType =
        ModificationType::from_str(modification_type).map_err(translate_domain_error)?;
    let days: u32 = days_before_departure(booking.departure_date, now);
    let fee: Decimal = calculate_processing_fee(change, days, &config.modification, config.currency_scale)
        .map_err(translate_domain_error)?;
    Ok(ProcessingFeeResponse {
        modification_type: change.as_str().to_string(),
        days_before_departure: days,
        processing_fee: fee,
    })
}

// ============================================================================
// Modification: admin commands and listings
// ============================================================================

/// Approves a modification. Admin only.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the record is not
/// pending.
pub fn approve_modification(
    persistence: &mut Persistence,
    config: &EngineConfig,
    notifier: &dyn Notifier,
    actor: &AuthenticatedActor,
    modification_id: i64,
    notes: Option<String>,
    now: OffsetDateTime,
) -> Result<ModificationRecord, ApiError> {
    actor.require_admin("approve a modification")?;
    let admin_id: i64 = actor.id;
    let record: ModificationRecord = drive_modification_command(
        persistence,
        config,
        modification_id,
        || ModificationCommand::Approve {
            admin_id,
            notes: notes.clone(),
        },
        now,
    )?;
    dispatch(
        notifier,
        Notification::ModificationReviewed {
            modification_id,
            user_id: record.user_id,
            status: record.status.as_str().to_string(),
        },
    );
    Ok(record)
}

/// Rejects a modification. Admin notes are mandatory.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the notes are
/// empty, or the record is not pending.
pub fn reject_modification(
    persistence: &mut Persistence,
    config: &EngineConfig,
    notifier: &dyn Notifier,
    actor: &AuthenticatedActor,
    modification_id: i64,
    notes: String,
    now: OffsetDateTime,
) -> Result<ModificationRecord, ApiError> {
    actor.require_admin("reject a modification")?;
    let admin_id: i64 = actor.id;
    let record: ModificationRecord = drive_modification_command(
        persistence,
        config,
        modification_id,
        || ModificationCommand::Reject {
            admin_id,
            notes: notes.clone(),
        },
        now,
    )?;
    dispatch(
        notifier,
        Notification::ModificationReviewed {
            modification_id,
            user_id: record.user_id,
            status: record.status.as_str().to_string(),
        },
    );
    Ok(record)
}

/// Moves an approved modification into processing. Admin only.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the record is not
/// approved.
pub fn process_modification(
    persistence: &mut Persistence,
    config: &EngineConfig,
    actor: &AuthenticatedActor,
    modification_id: i64,
    now: OffsetDateTime,
) -> Result<ModificationRecord, ApiError> {
    actor.require_admin("process a modification")?;
    let admin_id: i64 = actor.id;
    drive_modification_command(
        persistence,
        config,
        modification_id,
        || ModificationCommand::Process { admin_id },
        now,
    )
}

/// Completes a processing modification, applying the changes to the
/// booking. Admin only.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the record is not
/// processing.
pub fn complete_modification(
    persistence: &mut Persistence,
    config: &EngineConfig,
    notifier: &dyn Notifier,
    actor: &AuthenticatedActor,
    modification_id: i64,
    now: OffsetDateTime,
) -> Result<ModificationRecord, ApiError> {
    actor.require_admin("complete a modification")?;
    let admin_id: i64 = actor.id;
    let record: ModificationRecord = drive_modification_command(
        persistence,
        config,
        modification_id,
        || ModificationCommand::Complete { admin_id },
        now,
    )?;
    dispatch(
        notifier,
        Notification::ModificationCompleted {
            modification_id,
            user_id: record.user_id,
        },
    );
    Ok(record)
}

/// Amends the details of a pending modification and re-prices it.
/// Admin only.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the record is not
/// pending, or the amended request fails validation.
#[allow(clippy::too_many_arguments)]
pub fn update_modification_details(
    persistence: &mut Persistence,
    config: &EngineConfig,
    actor: &AuthenticatedActor,
    modification_id: i64,
    new_start_date: Option<time::Date>,
    new_end_date: Option<time::Date>,
    new_participants: Option<u32>,
    now: OffsetDateTime,
) -> Result<ModificationRecord, ApiError> {
    actor.require_admin("update modification details")?;
    let admin_id: i64 = actor.id;
    drive_modification_command(
        persistence,
        config,
        modification_id,
        || ModificationCommand::UpdateDetails {
            admin_id,
            new_start_date,
            new_end_date,
            new_participants,
        },
        now,
    )
}

/// Lists every modification request, newest first. Admin only.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the query fails.
pub fn list_modifications(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
) -> Result<Vec<ModificationRecord>, ApiError> {
    actor.require_admin("list modifications")?;
    persistence
        .list_modifications()
        .map_err(translate_persistence_error)
}

/// Lists modifications in a given status. Admin only.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the status string
/// is unknown, or the query fails.
pub fn list_modifications_by_status(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    status: &str,
) -> Result<Vec<ModificationRecord>, ApiError> {
    actor.require_admin("list modifications by status")?;
    let status: ModificationStatus =
        ModificationStatus::from_str(status).map_err(translate_domain_error)?;
    persistence
        .list_modifications_by_status(status)
        .map_err(translate_persistence_error)
}

/// Computes modification statistics over a time window. Admin only.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the query fails.
pub fn modification_statistics(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    from: OffsetDateTime,
    to: OffsetDateTime,
) -> Result<ModificationStatistics, ApiError> {
    actor.require_admin("view modification statistics")?;
    persistence
        .modification_statistics(from, to)
        .map_err(translate_persistence_error)
}
