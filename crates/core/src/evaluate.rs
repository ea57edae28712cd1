// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::CoreError;
use crate::state::{
    Actor, CancellationRecord, CancellationTransition, ModificationRecord, ModificationTransition,
    StatusHistoryEntry,
};
use rebook_domain::{
    Booking, CancellationRequest, CancellationStatus, DomainError, EngineConfig,
    ModificationRequest, ModificationStatus, PolicyTier, PriceQuote, RefundBreakdown,
    ValidationResult, calculate_refund, days_before_departure, quote_modification,
    validate_cancellation_request, validate_modification_request,
};
use time::OffsetDateTime;

/// The outcome of a pure cancellation evaluation.
///
/// This is the preview a customer sees before committing: what tier
/// applies, what would be refunded, and whether the request would be
/// fast-tracked into review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationEvaluation {
    /// Whole days between now and departure.
    pub days_before_departure: u32,
    /// The policy tier resolved for that timing.
    pub tier: PolicyTier,
    /// The refund the cancellation would produce.
    pub breakdown: RefundBreakdown,
    /// Whether emergency flags would fast-track the request into review.
    pub fast_tracked: bool,
}

/// Evaluates a cancellation request without committing anything.
///
/// The clock is read by the caller and passed in; repeated calls with
/// identical inputs produce identical results.
///
/// # Arguments
///
/// * `booking` - The booking the request targets
/// * `request` - The cancellation request payload
/// * `config` - The engine configuration
/// * `now` - The externally read clock
///
/// # Errors
///
/// Returns an error if:
/// - The booking is not in a cancellable status
/// - The request fails structural validation (acknowledgment flags are
///   not required for a preview)
/// - The policy table does not cover the timing
pub fn evaluate_cancellation(
    booking: &Booking,
    request: &CancellationRequest,
    config: &EngineConfig,
    now: OffsetDateTime,
) -> Result<CancellationEvaluation, CoreError> {
    if !booking.confirmation_status.is_cancellable() {
        return Err(CoreError::DomainViolation(
            DomainError::BookingNotCancellable {
                booking_id: booking.booking_id,
                status: booking.confirmation_status.to_string(),
            },
        ));
    }

    validate_cancellation_request(request, false)?;

    let days: u32 = days_before_departure(booking.departure_date, now);
    let tier: &PolicyTier = config.policy.resolve(days)?;
    let breakdown: RefundBreakdown = calculate_refund(
        booking.total_amount,
        tier,
        request.emergency_flags,
        &config.emergency,
        config.currency_scale,
    )?;

    Ok(CancellationEvaluation {
        days_before_departure: days,
        tier: *tier,
        breakdown,
        fast_tracked: request.emergency_flags.any(),
    })
}

/// Builds the initial cancellation record from a committed request.
///
/// Emergency-flagged requests start in `UnderReview` (fast-tracked);
/// everything else starts in `Requested`. The creation itself is
/// recorded as a history entry.
///
/// # Errors
///
/// Returns an error under the same conditions as `evaluate_cancellation`,
/// and additionally if either acknowledgment flag is missing.
pub fn new_cancellation(
    booking: &Booking,
    request: &CancellationRequest,
    config: &EngineConfig,
    now: OffsetDateTime,
) -> Result<CancellationTransition, CoreError> {
    validate_cancellation_request(request, true)?;
    let evaluation: CancellationEvaluation =
        evaluate_cancellation(booking, request, config, now)?;

    let status: CancellationStatus = if evaluation.fast_tracked {
        CancellationStatus::UnderReview
    } else {
        CancellationStatus::Requested
    };

    let record: CancellationRecord = CancellationRecord {
        id: 0,
        booking_id: booking.booking_id,
        user_id: booking.customer_id,
        status,
        reason_category: request.reason_category,
        reason: request.reason.trim().to_string(),
        additional_notes: request.additional_notes.clone(),
        emergency_flags: request.emergency_flags,
        supporting_documents: request.supporting_documents.clone(),
        emergency_contact_name: request.emergency_contact_name.clone(),
        emergency_contact_phone: request.emergency_contact_phone.clone(),
        emergency_contact_relationship: request.emergency_contact_relationship.clone(),
        preferred_refund_method: request.preferred_refund_method,
        days_before_departure: evaluation.days_before_departure,
        refund_breakdown: evaluation.breakdown,
        requested_at: now,
        reviewed_by: None,
        reviewed_at: None,
        admin_notes: None,
        refund_transaction_reference: None,
        refund_method_used: None,
        refund_processed_at: None,
        version: 0,
    };

    let note: Option<String> = if evaluation.fast_tracked {
        Some(String::from(
            "emergency flags set; fast-tracked into review",
        ))
    } else {
        None
    };

    let history: StatusHistoryEntry = StatusHistoryEntry {
        from_status: None,
        to_status: status.as_str().to_string(),
        changed_by: Actor::Customer(booking.customer_id),
        note,
        changed_at: now,
    };

    Ok(CancellationTransition {
        record,
        history: vec![history],
        booking_update: None,
    })
}

/// Builds the initial modification record from a committed request.
///
/// The request is structurally validated first; all violations found
/// are returned together.
///
/// # Errors
///
/// Returns `CoreError::ValidationFailed` carrying every violation when
/// the request is structurally invalid, or a domain error if the fee
/// table cannot be resolved.
pub fn new_modification(
    booking: &Booking,
    request: &ModificationRequest,
    config: &EngineConfig,
    now: OffsetDateTime,
) -> Result<ModificationTransition, CoreError> {
    let validation: ValidationResult =
        validate_modification_request(booking, request, &config.modification, now);
    if !validation.is_valid {
        return Err(CoreError::ValidationFailed(validation.errors));
    }

    let days: u32 = days_before_departure(booking.departure_date, now);
    let quote: PriceQuote = quote_modification(
        booking,
        request,
        &config.modification,
        days,
        config.currency_scale,
    )?;

    let record: ModificationRecord = ModificationRecord {
        id: 0,
        booking_id: booking.booking_id,
        user_id: booking.customer_id,
        status: ModificationStatus::Pending,
        modification_type: request.modification_type,
        new_start_date: request.new_start_date,
        new_end_date: request.new_end_date,
        new_participants: request.new_participants,
        reason: request.reason.clone(),
        customer_notes: request.customer_notes.clone(),
        days_before_departure: days,
        quote,
        requested_at: now,
        reviewed_by: None,
        reviewed_at: None,
        admin_notes: None,
        charges_accepted_at: None,
        completed_at: None,
        version: 0,
    };

    let history: StatusHistoryEntry = StatusHistoryEntry {
        from_status: None,
        to_status: ModificationStatus::Pending.as_str().to_string(),
        changed_by: Actor::Customer(booking.customer_id),
        note: None,
        changed_at: now,
    };

    Ok(ModificationTransition {
        record,
        history: vec![history],
        booking_changes: None,
    })
}
