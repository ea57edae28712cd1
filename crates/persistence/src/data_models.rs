// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row models and conversions between storage and domain types.
//!
//! Amounts are stored as decimal text and re-parsed on read so no
//! precision is lost in the database. Dates are ISO-8601 text, and
//! timestamps RFC 3339 text.

use crate::diesel_schema::{
    booking_cancellations, booking_modifications, bookings, cancellation_status_history,
    modification_status_history,
};
use crate::error::PersistenceError;
use diesel::prelude::*;
use rebook::{CancellationRecord, ModificationRecord, StatusHistoryEntry};
use rebook_domain::{
    Booking, CancellationReason, CancellationStatus, ConfirmationStatus, EmergencyFlags,
    ModificationStatus, ModificationType, PaymentStatus, PriceQuote, RefundBreakdown,
    RefundMethod,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

// ============================================================================
// Text conversions
// ============================================================================

/// Parses a stored decimal text value.
pub(crate) fn parse_decimal(value: &str, field: &str) -> Result<Decimal, PersistenceError> {
    Decimal::from_str(value).map_err(|e| {
        PersistenceError::SerializationError(format!("invalid decimal in {field}: {e}"))
    })
}

/// Renders a date as ISO-8601 text for storage.
pub(crate) fn format_date(date: Date) -> Result<String, PersistenceError> {
    date.format(&DATE_FORMAT)
        .map_err(|e| PersistenceError::SerializationError(format!("date format failed: {e}")))
}

/// Parses a stored ISO-8601 date.
pub(crate) fn parse_date(value: &str, field: &str) -> Result<Date, PersistenceError> {
    Date::parse(value, &DATE_FORMAT).map_err(|e| {
        PersistenceError::SerializationError(format!("invalid date in {field}: {e}"))
    })
}

/// Renders a timestamp as RFC 3339 text for storage.
pub(crate) fn format_datetime(ts: OffsetDateTime) -> Result<String, PersistenceError> {
    ts.format(&Rfc3339)
        .map_err(|e| PersistenceError::SerializationError(format!("timestamp format failed: {e}")))
}

/// Parses a stored RFC 3339 timestamp.
pub(crate) fn parse_datetime(value: &str, field: &str) -> Result<OffsetDateTime, PersistenceError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|e| {
        PersistenceError::SerializationError(format!("invalid timestamp in {field}: {e}"))
    })
}

fn parse_optional_datetime(
    value: Option<&String>,
    field: &str,
) -> Result<Option<OffsetDateTime>, PersistenceError> {
    value.map(|v| parse_datetime(v, field)).transpose()
}

fn format_optional_datetime(
    value: Option<OffsetDateTime>,
) -> Result<Option<String>, PersistenceError> {
    value.map(format_datetime).transpose()
}

fn u32_from_row(value: i32, field: &str) -> Result<u32, PersistenceError> {
    u32::try_from(value).map_err(|_| {
        PersistenceError::SerializationError(format!("negative value in {field}: {value}"))
    })
}

// ============================================================================
// Bookings
// ============================================================================

/// Full booking row as stored.
#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = bookings)]
pub struct BookingRow {
    pub booking_id: i64,
    pub tour_id: i64,
    pub customer_id: i64,
    pub departure_date: String,
    pub participants: i32,
    pub tour_capacity: i32,
    pub total_amount: String,
    pub per_person_price: String,
    pub payment_status: String,
    pub confirmation_status: String,
    pub created_at: String,
}

/// Insertable booking row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub struct NewBookingRow {
    pub tour_id: i64,
    pub customer_id: i64,
    pub departure_date: String,
    pub participants: i32,
    pub tour_capacity: i32,
    pub total_amount: String,
    pub per_person_price: String,
    pub payment_status: String,
    pub confirmation_status: String,
    pub created_at: String,
}

/// Converts a stored booking row to the domain type.
///
/// # Errors
///
/// Returns a serialization error if any stored text fails to parse.
pub fn booking_from_row(row: &BookingRow) -> Result<Booking, PersistenceError> {
    Ok(Booking {
        booking_id: row.booking_id,
        tour_id: row.tour_id,
        customer_id: row.customer_id,
        departure_date: parse_date(&row.departure_date, "bookings.departure_date")?,
        participants: u32_from_row(row.participants, "bookings.participants")?,
        tour_capacity: u32_from_row(row.tour_capacity, "bookings.tour_capacity")?,
        total_amount: parse_decimal(&row.total_amount, "bookings.total_amount")?,
        per_person_price: parse_decimal(&row.per_person_price, "bookings.per_person_price")?,
        payment_status: PaymentStatus::from_str(&row.payment_status)
            .map_err(|e| PersistenceError::SerializationError(e.to_string()))?,
        confirmation_status: ConfirmationStatus::from_str(&row.confirmation_status)
            .map_err(|e| PersistenceError::SerializationError(e.to_string()))?,
    })
}

/// Builds an insertable row from a domain booking.
///
/// # Errors
///
/// Returns a serialization error if the departure date or timestamps
/// cannot be rendered.
pub fn booking_to_new_row(
    booking: &Booking,
    created_at: OffsetDateTime,
) -> Result<NewBookingRow, PersistenceError> {
    Ok(NewBookingRow {
        tour_id: booking.tour_id,
        customer_id: booking.customer_id,
        departure_date: format_date(booking.departure_date)?,
        participants: i32::try_from(booking.participants)
            .map_err(|_| PersistenceError::SerializationError(String::from("participants overflow")))?,
        tour_capacity: i32::try_from(booking.tour_capacity)
            .map_err(|_| PersistenceError::SerializationError(String::from("capacity overflow")))?,
        total_amount: booking.total_amount.to_string(),
        per_person_price: booking.per_person_price.to_string(),
        payment_status: booking.payment_status.as_str().to_string(),
        confirmation_status: booking.confirmation_status.as_str().to_string(),
        created_at: format_datetime(created_at)?,
    })
}

// ============================================================================
// Cancellations
// ============================================================================

/// Full cancellation row as stored.
#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = booking_cancellations)]
pub struct CancellationRow {
    pub cancellation_id: i64,
    pub booking_id: i64,
    pub user_id: i64,
    pub status: String,
    pub reason_category: String,
    pub reason: String,
    pub additional_notes: Option<String>,
    pub is_medical_emergency: i32,
    pub is_weather_related: i32,
    pub is_force_majeure: i32,
    pub supporting_documents: String,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub emergency_contact_relationship: Option<String>,
    pub preferred_refund_method: String,
    pub days_before_departure: i32,
    pub refund_percentage: String,
    pub gross_refund: String,
    pub processing_fee: String,
    pub net_refund: String,
    pub fee_waived: i32,
    pub floor_applied: i32,
    pub requested_at: String,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<String>,
    pub admin_notes: Option<String>,
    pub refund_transaction_reference: Option<String>,
    pub refund_method_used: Option<String>,
    pub refund_processed_at: Option<String>,
    pub version: i64,
}

/// Insertable cancellation row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = booking_cancellations)]
pub struct NewCancellationRow {
    pub booking_id: i64,
    pub user_id: i64,
    pub status: String,
    pub reason_category: String,
    pub reason: String,
    pub additional_notes: Option<String>,
    pub is_medical_emergency: i32,
    pub is_weather_related: i32,
    pub is_force_majeure: i32,
    pub supporting_documents: String,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub emergency_contact_relationship: Option<String>,
    pub preferred_refund_method: String,
    pub days_before_departure: i32,
    pub refund_percentage: String,
    pub gross_refund: String,
    pub processing_fee: String,
    pub net_refund: String,
    pub fee_waived: i32,
    pub floor_applied: i32,
    pub requested_at: String,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<String>,
    pub admin_notes: Option<String>,
    pub refund_transaction_reference: Option<String>,
    pub refund_method_used: Option<String>,
    pub refund_processed_at: Option<String>,
    pub version: i64,
}

/// Converts a stored cancellation row to the core record type.
///
/// # Errors
///
/// Returns a serialization error if any stored text fails to parse.
#[allow(clippy::too_many_lines)]
pub fn cancellation_from_row(
    row: &CancellationRow,
) -> Result<CancellationRecord, PersistenceError> {
    let documents: Vec<String> = serde_json::from_str(&row.supporting_documents)?;
    Ok(CancellationRecord {
        id: row.cancellation_id,
        booking_id: row.booking_id,
        user_id: row.user_id,
        status: CancellationStatus::from_str(&row.status)
            .map_err(|e| PersistenceError::SerializationError(e.to_string()))?,
        reason_category: CancellationReason::from_str(&row.reason_category)
            .map_err(|e| PersistenceError::SerializationError(e.to_string()))?,
        reason: row.reason.clone(),
        additional_notes: row.additional_notes.clone(),
        emergency_flags: EmergencyFlags {
            is_medical_emergency: row.is_medical_emergency != 0,
            is_weather_related: row.is_weather_related != 0,
            is_force_majeure: row.is_force_majeure != 0,
        },
        supporting_documents: documents,
        emergency_contact_name: row.emergency_contact_name.clone(),
        emergency_contact_phone: row.emergency_contact_phone.clone(),
        emergency_contact_relationship: row.emergency_contact_relationship.clone(),
        preferred_refund_method: RefundMethod::from_str(&row.preferred_refund_method)
            .map_err(|e| PersistenceError::SerializationError(e.to_string()))?,
        days_before_departure: u32_from_row(
            row.days_before_departure,
            "booking_cancellations.days_before_departure",
        )?,
        refund_breakdown: RefundBreakdown {
            refund_percentage: parse_decimal(
                &row.refund_percentage,
                "booking_cancellations.refund_percentage",
            )?,
            gross_refund: parse_decimal(&row.gross_refund, "booking_cancellations.gross_refund")?,
            processing_fee: parse_decimal(
                &row.processing_fee,
                "booking_cancellations.processing_fee",
            )?,
            net_refund: parse_decimal(&row.net_refund, "booking_cancellations.net_refund")?,
            fee_waived: row.fee_waived != 0,
            floor_applied: row.floor_applied != 0,
        },
        requested_at: parse_datetime(&row.requested_at, "booking_cancellations.requested_at")?,
        reviewed_by: row.reviewed_by,
        reviewed_at: parse_optional_datetime(
            row.reviewed_at.as_ref(),
            "booking_cancellations.reviewed_at",
        )?,
        admin_notes: row.admin_notes.clone(),
        refund_transaction_reference: row.refund_transaction_reference.clone(),
        refund_method_used: row
            .refund_method_used
            .as_deref()
            .map(RefundMethod::from_str)
            .transpose()
            .map_err(|e| PersistenceError::SerializationError(e.to_string()))?,
        refund_processed_at: parse_optional_datetime(
            row.refund_processed_at.as_ref(),
            "booking_cancellations.refund_processed_at",
        )?,
        version: row.version,
    })
}

/// Builds an insertable row from a core cancellation record.
///
/// # Errors
///
/// Returns a serialization error if any field cannot be rendered.
pub fn cancellation_to_new_row(
    record: &CancellationRecord,
) -> Result<NewCancellationRow, PersistenceError> {
    Ok(NewCancellationRow {
        booking_id: record.booking_id,
        user_id: record.user_id,
        status: record.status.as_str().to_string(),
        reason_category: record.reason_category.as_str().to_string(),
        reason: record.reason.clone(),
        additional_notes: record.additional_notes.clone(),
        is_medical_emergency: i32::from(record.emergency_flags.is_medical_emergency),
        is_weather_related: i32::from(record.emergency_flags.is_weather_related),
        is_force_majeure: i32::from(record.emergency_flags.is_force_majeure),
        supporting_documents: serde_json::to_string(&record.supporting_documents)?,
        emergency_contact_name: record.emergency_contact_name.clone(),
        emergency_contact_phone: record.emergency_contact_phone.clone(),
        emergency_contact_relationship: record.emergency_contact_relationship.clone(),
        preferred_refund_method: record.preferred_refund_method.as_str().to_string(),
        days_before_departure: i32::try_from(record.days_before_departure).map_err(|_| {
            PersistenceError::SerializationError(String::from("days_before_departure overflow"))
        })?,
        refund_percentage: record.refund_breakdown.refund_percentage.to_string(),
        gross_refund: record.refund_breakdown.gross_refund.to_string(),
        processing_fee: record.refund_breakdown.processing_fee.to_string(),
        net_refund: record.refund_breakdown.net_refund.to_string(),
        fee_waived: i32::from(record.refund_breakdown.fee_waived),
        floor_applied: i32::from(record.refund_breakdown.floor_applied),
        requested_at: format_datetime(record.requested_at)?,
        reviewed_by: record.reviewed_by,
        reviewed_at: format_optional_datetime(record.reviewed_at)?,
        admin_notes: record.admin_notes.clone(),
        refund_transaction_reference: record.refund_transaction_reference.clone(),
        refund_method_used: record
            .refund_method_used
            .map(|m| m.as_str().to_string()),
        refund_processed_at: format_optional_datetime(record.refund_processed_at)?,
        version: record.version,
    })
}

// ============================================================================
// Modifications
// ============================================================================

/// Full modification row as stored.
#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = booking_modifications)]
pub struct ModificationRow {
    pub modification_id: i64,
    pub booking_id: i64,
    pub user_id: i64,
    pub status: String,
    pub modification_type: String,
    pub new_start_date: Option<String>,
    pub new_end_date: Option<String>,
    pub new_participants: Option<i32>,
    pub reason: Option<String>,
    pub customer_notes: Option<String>,
    pub days_before_departure: i32,
    pub original_amount: String,
    pub new_amount: String,
    pub price_difference: String,
    pub processing_fee: String,
    pub total_additional: String,
    pub requires_additional_payment: i32,
    pub offers_refund: i32,
    pub requested_at: String,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<String>,
    pub admin_notes: Option<String>,
    pub charges_accepted_at: Option<String>,
    pub completed_at: Option<String>,
    pub version: i64,
}

/// Insertable modification row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = booking_modifications)]
pub struct NewModificationRow {
    pub booking_id: i64,
    pub user_id: i64,
    pub status: String,
    pub modification_type: String,
    pub new_start_date: Option<String>,
    pub new_end_date: Option<String>,
    pub new_participants: Option<i32>,
    pub reason: Option<String>,
    pub customer_notes: Option<String>,
    pub days_before_departure: i32,
    pub original_amount: String,
    pub new_amount: String,
    pub price_difference: String,
    pub processing_fee: String,
    pub total_additional: String,
    pub requires_additional_payment: i32,
    pub offers_refund: i32,
    pub requested_at: String,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<String>,
    pub admin_notes: Option<String>,
    pub charges_accepted_at: Option<String>,
    pub completed_at: Option<String>,
    pub version: i64,
}

/// Converts a stored modification row to the core record type.
///
/// # Errors
///
/// Returns a serialization error if any stored text fails to parse.
#[allow(clippy::too_many_lines)]
pub fn modification_from_row(
    row: &ModificationRow,
) -> Result<ModificationRecord, PersistenceError> {
    Ok(ModificationRecord {
        id: row.modification_id,
        booking_id: row.booking_id,
        user_id: row.user_id,
        status: ModificationStatus::from_str(&row.status)
            .map_err(|e| PersistenceError::SerializationError(e.to_string()))?,
        modification_type: ModificationType::from_str(&row.modification_type)
            .map_err(|e| PersistenceError::SerializationError(e.to_string()))?,
        new_start_date: row
            .new_start_date
            .as_ref()
            .map(|v| parse_date(v, "booking_modifications.new_start_date"))
            .transpose()?,
        new_end_date: row
            .new_end_date
            .as_ref()
            .map(|v| parse_date(v, "booking_modifications.new_end_date"))
            .transpose()?,
        new_participants: row
            .new_participants
            .map(|v| u32_from_row(v, "booking_modifications.new_participants"))
            .transpose()?,
        reason: row.reason.clone(),
        customer_notes: row.customer_notes.clone(),
        days_before_departure: u32_from_row(
            row.days_before_departure,
            "booking_modifications.days_before_departure",
        )?,
        quote: PriceQuote {
            original_amount: parse_decimal(
                &row.original_amount,
                "booking_modifications.original_amount",
            )?,
            new_amount: parse_decimal(&row.new_amount, "booking_modifications.new_amount")?,
            price_difference: parse_decimal(
                &row.price_difference,
                "booking_modifications.price_difference",
            )?,
            processing_fee: parse_decimal(
                &row.processing_fee,
                "booking_modifications.processing_fee",
            )?,
            total_additional: parse_decimal(
                &row.total_additional,
                "booking_modifications.total_additional",
            )?,
            requires_additional_payment: row.requires_additional_payment != 0,
            offers_refund: row.offers_refund != 0,
        },
        requested_at: parse_datetime(&row.requested_at, "booking_modifications.requested_at")?,
        reviewed_by: row.reviewed_by,
        reviewed_at: parse_optional_datetime(
            row.reviewed_at.as_ref(),
            "booking_modifications.reviewed_at",
        )?,
        admin_notes: row.admin_notes.clone(),
        charges_accepted_at: parse_optional_datetime(
            row.charges_accepted_at.as_ref(),
            "booking_modifications.charges_accepted_at",
        )?,
        completed_at: parse_optional_datetime(
            row.completed_at.as_ref(),
            "booking_modifications.completed_at",
        )?,
        version: row.version,
    })
}

/// Builds an insertable row from a core modification record.
///
/// # Errors
///
/// Returns a serialization error if any field cannot be rendered.
pub fn modification_to_new_row(
    record: &ModificationRecord,
) -> Result<NewModificationRow, PersistenceError> {
    Ok(NewModificationRow {
        booking_id: record.booking_id,
        user_id: record.user_id,
        status: record.status.as_str().to_string(),
        modification_type: record.modification_type.as_str().to_string(),
        new_start_date: record.new_start_date.map(format_date).transpose()?,
        new_end_date: record.new_end_date.map(format_date).transpose()?,
        new_participants: record
            .new_participants
            .map(|v| {
                i32::try_from(v).map_err(|_| {
                    PersistenceError::SerializationError(String::from(
                        "new_participants overflow",
                    ))
                })
            })
            .transpose()?,
        reason: record.reason.clone(),
        customer_notes: record.customer_notes.clone(),
        days_before_departure: i32::try_from(record.days_before_departure).map_err(|_| {
            PersistenceError::SerializationError(String::from("days_before_departure overflow"))
        })?,
        original_amount: record.quote.original_amount.to_string(),
        new_amount: record.quote.new_amount.to_string(),
        price_difference: record.quote.price_difference.to_string(),
        processing_fee: record.quote.processing_fee.to_string(),
        total_additional: record.quote.total_additional.to_string(),
        requires_additional_payment: i32::from(record.quote.requires_additional_payment),
        offers_refund: i32::from(record.quote.offers_refund),
        requested_at: format_datetime(record.requested_at)?,
        reviewed_by: record.reviewed_by,
        reviewed_at: format_optional_datetime(record.reviewed_at)?,
        admin_notes: record.admin_notes.clone(),
        charges_accepted_at: format_optional_datetime(record.charges_accepted_at)?,
        completed_at: format_optional_datetime(record.completed_at)?,
        version: record.version,
    })
}

// ============================================================================
// Status history
// ============================================================================

/// Stored status-history row, shared by both lifecycles.
#[derive(Debug, Clone, Queryable)]
pub struct StatusHistoryRow {
    pub history_id: i64,
    pub record_id: i64,
    pub previous_status: Option<String>,
    pub new_status: String,
    pub changed_by: String,
    pub note: Option<String>,
    pub changed_at: String,
}

/// Insertable cancellation history row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = cancellation_status_history)]
pub struct NewCancellationHistoryRow {
    pub cancellation_id: i64,
    pub previous_status: Option<String>,
    pub new_status: String,
    pub changed_by: String,
    pub note: Option<String>,
    pub changed_at: String,
}

/// Insertable modification history row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = modification_status_history)]
pub struct NewModificationHistoryRow {
    pub modification_id: i64,
    pub previous_status: Option<String>,
    pub new_status: String,
    pub changed_by: String,
    pub note: Option<String>,
    pub changed_at: String,
}

/// Builds an insertable cancellation history row from a core entry.
///
/// # Errors
///
/// Returns a serialization error if the timestamp cannot be rendered.
pub fn cancellation_history_to_new_row(
    cancellation_id: i64,
    entry: &StatusHistoryEntry,
) -> Result<NewCancellationHistoryRow, PersistenceError> {
    Ok(NewCancellationHistoryRow {
        cancellation_id,
        previous_status: entry.from_status.clone(),
        new_status: entry.to_status.clone(),
        changed_by: entry.changed_by.describe(),
        note: entry.note.clone(),
        changed_at: format_datetime(entry.changed_at)?,
    })
}

/// Builds an insertable modification history row from a core entry.
///
/// # Errors
///
/// Returns a serialization error if the timestamp cannot be rendered.
pub fn modification_history_to_new_row(
    modification_id: i64,
    entry: &StatusHistoryEntry,
) -> Result<NewModificationHistoryRow, PersistenceError> {
    Ok(NewModificationHistoryRow {
        modification_id,
        previous_status: entry.from_status.clone(),
        new_status: entry.to_status.clone(),
        changed_by: entry.changed_by.describe(),
        note: entry.note.clone(),
        changed_at: format_datetime(entry.changed_at)?,
    })
}
