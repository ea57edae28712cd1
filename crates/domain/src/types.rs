// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Date, OffsetDateTime};

/// Minimum length of the free-text cancellation reason.
pub const REASON_MIN_LEN: usize = 10;
/// Maximum length of the free-text cancellation reason.
pub const REASON_MAX_LEN: usize = 500;
/// Maximum length of additional notes.
pub const NOTES_MAX_LEN: usize = 1000;

/// Payment status of a booking, owned by the booking subsystem.
///
/// This engine mutates payment status only as a side effect of a
/// completed refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
    PartiallyRefunded,
}

impl PaymentStatus {
    /// Returns the string representation used for persistence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
            Self::PartiallyRefunded => "partially_refunded",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            "refunded" => Ok(Self::Refunded),
            "partially_refunded" => Ok(Self::PartiallyRefunded),
            _ => Err(DomainError::InvalidPaymentStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Confirmation status of a booking, owned by the booking subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl ConfirmationStatus {
    /// Returns the string representation used for persistence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether a booking in this status may receive a cancellation request.
    ///
    /// Completed and already-cancelled bookings are not cancellable.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl FromStr for ConfirmationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(DomainError::InvalidConfirmationStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for ConfirmationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Enumerated reason categories for a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationReason {
    PersonalEmergency,
    MedicalEmergency,
    WeatherRelated,
    ForceMajeure,
    ScheduleConflict,
    FoundBetterDeal,
    Other,
}

impl CancellationReason {
    /// All reason categories, in display order.
    pub const ALL: [Self; 7] = [
        Self::PersonalEmergency,
        Self::MedicalEmergency,
        Self::WeatherRelated,
        Self::ForceMajeure,
        Self::ScheduleConflict,
        Self::FoundBetterDeal,
        Self::Other,
    ];

    /// Returns the string representation used for persistence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PersonalEmergency => "personal_emergency",
            Self::MedicalEmergency => "medical_emergency",
            Self::WeatherRelated => "weather_related",
            Self::ForceMajeure => "force_majeure",
            Self::ScheduleConflict => "schedule_conflict",
            Self::FoundBetterDeal => "found_better_deal",
            Self::Other => "other",
        }
    }
}

impl FromStr for CancellationReason {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal_emergency" => Ok(Self::PersonalEmergency),
            "medical_emergency" => Ok(Self::MedicalEmergency),
            "weather_related" => Ok(Self::WeatherRelated),
            "force_majeure" => Ok(Self::ForceMajeure),
            "schedule_conflict" => Ok(Self::ScheduleConflict),
            "found_better_deal" => Ok(Self::FoundBetterDeal),
            "other" => Ok(Self::Other),
            _ => Err(DomainError::InvalidReasonCategory(s.to_string())),
        }
    }
}

impl std::fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a refund should be (or was) paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundMethod {
    /// Refund to the original payment instrument.
    OriginalMethod,
    /// Refund via bank transfer.
    BankTransfer,
    /// Refund as a platform voucher.
    Voucher,
}

impl RefundMethod {
    /// Returns the string representation used for persistence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OriginalMethod => "original_method",
            Self::BankTransfer => "bank_transfer",
            Self::Voucher => "voucher",
        }
    }
}

impl FromStr for RefundMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original_method" => Ok(Self::OriginalMethod),
            "bank_transfer" => Ok(Self::BankTransfer),
            "voucher" => Ok(Self::Voucher),
            _ => Err(DomainError::InvalidRefundMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for RefundMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Special-circumstance flags attached to a cancellation request.
///
/// These drive the emergency floor and fee waiver in the refund
/// calculator and the fast-track review path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyFlags {
    pub is_medical_emergency: bool,
    pub is_weather_related: bool,
    pub is_force_majeure: bool,
}

impl EmergencyFlags {
    /// Returns true if any emergency flag is set.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.is_medical_emergency || self.is_weather_related || self.is_force_majeure
    }

    /// Returns true if a flag with the medical/force-majeure severity is set.
    ///
    /// These flags waive the processing fee; weather alone does not.
    #[must_use]
    pub const fn waives_fee(&self) -> bool {
        self.is_medical_emergency || self.is_force_majeure
    }
}

/// A booking snapshot, read through the narrow booking collaborator seam.
///
/// The booking subsystem owns these records; this engine reads them to
/// evaluate refunds and writes back payment/confirmation status only when
/// a refund completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// The booking identifier.
    pub booking_id: i64,
    /// The tour this booking is for.
    pub tour_id: i64,
    /// The customer who owns this booking.
    pub customer_id: i64,
    /// Scheduled departure date.
    pub departure_date: Date,
    /// Number of participants booked.
    pub participants: u32,
    /// Maximum participants the tour schedule can hold.
    pub tour_capacity: u32,
    /// Total amount paid for the booking.
    pub total_amount: Decimal,
    /// Per-person price, used by modification delta pricing.
    pub per_person_price: Decimal,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Confirmation status.
    pub confirmation_status: ConfirmationStatus,
}

/// A customer's cancellation request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationRequest {
    /// The booking to cancel.
    pub booking_id: i64,
    /// Enumerated reason category.
    pub reason_category: CancellationReason,
    /// Free-text reason (10-500 chars).
    pub reason: String,
    /// Optional additional notes (up to 1000 chars).
    pub additional_notes: Option<String>,
    /// Special-circumstance flags.
    pub emergency_flags: EmergencyFlags,
    /// Supporting document references (URLs or upload ids).
    pub supporting_documents: Vec<String>,
    /// Emergency contact name.
    pub emergency_contact_name: Option<String>,
    /// Emergency contact phone.
    pub emergency_contact_phone: Option<String>,
    /// Emergency contact relationship to the traveller.
    pub emergency_contact_relationship: Option<String>,
    /// Preferred refund payout method.
    pub preferred_refund_method: RefundMethod,
    /// Customer confirms they read the cancellation policy.
    pub acknowledges_cancellation_policy: bool,
    /// Customer confirms they accept the refund terms.
    pub acknowledges_refund_terms: bool,
}

/// Validates a cancellation request's structural constraints.
///
/// The acknowledgment flags are only enforced when `committing` is true:
/// the pure evaluate preview may be called before the customer has
/// ticked them.
///
/// # Errors
///
/// Returns an error if the reason length, notes length, or (when
/// committing) the acknowledgment flags fail their constraints.
pub fn validate_cancellation_request(
    request: &CancellationRequest,
    committing: bool,
) -> Result<(), DomainError> {
    let reason_len: usize = request.reason.trim().chars().count();
    if reason_len < REASON_MIN_LEN || reason_len > REASON_MAX_LEN {
        return Err(DomainError::InvalidReason(format!(
            "reason must be between {REASON_MIN_LEN} and {REASON_MAX_LEN} characters, got {reason_len}"
        )));
    }

    if let Some(notes) = &request.additional_notes
        && notes.chars().count() > NOTES_MAX_LEN
    {
        return Err(DomainError::InvalidNotes(format!(
            "additional notes cannot exceed {NOTES_MAX_LEN} characters"
        )));
    }

    if committing {
        if !request.acknowledges_cancellation_policy {
            return Err(DomainError::AcknowledgmentMissing {
                field: String::from("acknowledges_cancellation_policy"),
            });
        }
        if !request.acknowledges_refund_terms {
            return Err(DomainError::AcknowledgmentMissing {
                field: String::from("acknowledges_refund_terms"),
            });
        }
    }

    Ok(())
}

/// A customer's booking modification request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationRequest {
    /// The booking to modify.
    pub booking_id: i64,
    /// What kind of change is requested.
    pub modification_type: crate::modification_pricing::ModificationType,
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
}

/// Computes whole days between now and the departure date.
///
/// The departure is anchored at midnight (start of the departure day);
/// partial days round up. Negative values clamp to zero, meaning
/// "day-of or past departure" — the last-minute policy tier applies.
#[must_use]
pub fn days_before_departure(departure: Date, now: OffsetDateTime) -> u32 {
    let departure_midnight: OffsetDateTime = departure.midnight().assume_utc();
    let seconds: i64 = (departure_midnight - now).whole_seconds();
    if seconds <= 0 {
        return 0;
    }
    let whole_days: i64 = seconds / 86_400;
    let days: i64 = if seconds % 86_400 > 0 {
        whole_days + 1
    } else {
        whole_days
    };
    u32::try_from(days).unwrap_or(u32::MAX)
}
