// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Pricing and structural validation for booking modifications.
//!
//! Shares the tiered-policy approach of the cancellation engine, over a
//! modification-specific fee table keyed by how close to departure the
//! change is requested and what kind of change it is.

use crate::error::DomainError;
use crate::refund::round_amount;
use crate::types::{Booking, ConfirmationStatus, ModificationRequest, days_before_departure};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// What kind of change a modification request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationType {
    /// Departure/end date change only.
    DateChange,
    /// Participant-count change only.
    ParticipantChange,
    /// Both a date and a participant-count change.
    DateAndParticipantChange,
}

impl ModificationType {
    /// Returns the string representation used for persistence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DateChange => "date_change",
            Self::ParticipantChange => "participant_change",
            Self::DateAndParticipantChange => "date_and_participant_change",
        }
    }

    /// Whether this change type touches dates.
    #[must_use]
    pub const fn changes_dates(&self) -> bool {
        matches!(self, Self::DateChange | Self::DateAndParticipantChange)
    }

    /// Whether this change type touches the participant count.
    #[must_use]
    pub const fn changes_participants(&self) -> bool {
        matches!(
            self,
            Self::ParticipantChange | Self::DateAndParticipantChange
        )
    }
}

impl FromStr for ModificationType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date_change" => Ok(Self::DateChange),
            "participant_change" => Ok(Self::ParticipantChange),
            "date_and_participant_change" => Ok(Self::DateAndParticipantChange),
            _ => Err(DomainError::InvalidModificationType(s.to_string())),
        }
    }
}

impl std::fmt::Display for ModificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the modification fee table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationFeeTier {
    /// The inclusive lower bound of days before departure.
    pub min_days_before_departure: u32,
    /// Fee for a date-only change.
    pub date_change_fee: Decimal,
    /// Fee for a participant-only change.
    pub participant_change_fee: Decimal,
    /// Fee for a combined change.
    pub combined_change_fee: Decimal,
}

/// Modification pricing configuration: fee tiers plus delta-pricing
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationPricing {
    /// Fee tiers in descending threshold order, ending at day 0.
    tiers: Vec<ModificationFeeTier>,
    /// Fraction of the per-person price retained when participants are
    /// removed (the remainder is refunded).
    pub participant_refund_retention: Decimal,
    /// Minimum whole days of notice required before departure.
    pub minimum_notice_days: u32,
}

impl ModificationPricing {
    /// Builds a pricing table, validating the tier invariants.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PolicyConfiguration` under the same table
    /// rules as the cancellation policy: non-empty, strictly descending
    /// thresholds, catch-all 0-day tier, non-negative fees, and a
    /// retention fraction in [0, 1].
    pub fn new(
        tiers: Vec<ModificationFeeTier>,
        participant_refund_retention: Decimal,
        minimum_notice_days: u32,
    ) -> Result<Self, DomainError> {
        if tiers.is_empty() {
            return Err(DomainError::PolicyConfiguration(String::from(
                "modification fee table must contain at least one tier",
            )));
        }
        for window in tiers.windows(2) {
            if window[0].min_days_before_departure <= window[1].min_days_before_departure {
                return Err(DomainError::PolicyConfiguration(format!(
                    "modification tier thresholds must be strictly descending, found {} then {}",
                    window[0].min_days_before_departure, window[1].min_days_before_departure
                )));
            }
        }
        if tiers[tiers.len() - 1].min_days_before_departure != 0 {
            return Err(DomainError::PolicyConfiguration(String::from(
                "modification fee table must end with a 0-day catch-all tier",
            )));
        }
        for tier in &tiers {
            if tier.date_change_fee < Decimal::ZERO
                || tier.participant_change_fee < Decimal::ZERO
                || tier.combined_change_fee < Decimal::ZERO
            {
                return Err(DomainError::PolicyConfiguration(format!(
                    "modification fee for tier >= {} days is negative",
                    tier.min_days_before_departure
                )));
            }
        }
        if participant_refund_retention < Decimal::ZERO
            || participant_refund_retention > Decimal::ONE
        {
            return Err(DomainError::PolicyConfiguration(format!(
                "participant refund retention {participant_refund_retention} is outside [0, 1]"
            )));
        }

        Ok(Self {
            tiers,
            participant_refund_retention,
            minimum_notice_days,
        })
    }

    /// Returns the fee tiers in descending threshold order.
    #[must_use]
    pub fn tiers(&self) -> &[ModificationFeeTier] {
        &self.tiers
    }

    /// Resolves the fee tier applicable to the given timing.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PolicyConfiguration` if no tier matches,
    /// which a table validated by `new` cannot produce.
    pub fn resolve(&self, days: u32) -> Result<&ModificationFeeTier, DomainError> {
        self.tiers
            .iter()
            .find(|tier| days >= tier.min_days_before_departure)
            .ok_or_else(|| {
                DomainError::PolicyConfiguration(format!(
                    "no modification fee tier covers {days} days before departure"
                ))
            })
    }
}

impl Default for ModificationPricing {
    fn default() -> Self {
        Self {
            tiers: vec![
                ModificationFeeTier {
                    min_days_before_departure: 30,
                    date_change_fee: Decimal::from(50_000),
                    participant_change_fee: Decimal::from(25_000),
                    combined_change_fee: Decimal::from(60_000),
                },
                ModificationFeeTier {
                    min_days_before_departure: 7,
                    date_change_fee: Decimal::from(100_000),
                    participant_change_fee: Decimal::from(50_000),
                    combined_change_fee: Decimal::from(120_000),
                },
                ModificationFeeTier {
                    min_days_before_departure: 0,
                    date_change_fee: Decimal::from(200_000),
                    participant_change_fee: Decimal::from(100_000),
                    combined_change_fee: Decimal::from(250_000),
                },
            ],
            participant_refund_retention: Decimal::new(2, 1), // 0.2
            minimum_notice_days: 2,
        }
    }
}

/// Result of the structural validation of a modification request.
///
/// All violations are collected rather than failing fast, so the caller
/// can render every problem at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the request passed every check.
    pub is_valid: bool,
    /// Human-readable violation descriptions, empty when valid.
    pub errors: Vec<String>,
}

impl ValidationResult {
    /// A passing result.
    #[must_use]
    pub const fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }
}

/// Price quote for a modification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// The booking's current total amount.
    pub original_amount: Decimal,
    /// The total amount after the change (excluding the fee).
    pub new_amount: Decimal,
    /// Signed price delta; positive means the customer owes more.
    pub price_difference: Decimal,
    /// Processing fee from the resolved fee tier.
    pub processing_fee: Decimal,
    /// `price_difference + processing_fee` when a payment is due.
    pub total_additional: Decimal,
    /// Whether the customer must pay more.
    pub requires_additional_payment: bool,
    /// Whether the change produces a partial refund.
    pub offers_refund: bool,
}

/// Computes the signed price delta of a modification request.
///
/// Added participants pay the full per-person price; removed
/// participants are refunded the per-person price minus the configured
/// retention fraction. Date-only changes carry no delta (fee only).
/// The result is rounded half-up at the given scale.
#[must_use]
pub fn calculate_price_difference(
    booking: &Booking,
    request: &ModificationRequest,
    pricing: &ModificationPricing,
    scale: u32,
) -> Decimal {
    let Some(new_participants) = request.new_participants else {
        return Decimal::ZERO;
    };

    let current: i64 = i64::from(booking.participants);
    let requested: i64 = i64::from(new_participants);
    let delta: i64 = requested - current;

    let raw: Decimal = if delta > 0 {
        booking.per_person_price * Decimal::from(delta)
    } else {
        let refund_rate: Decimal = Decimal::ONE - pricing.participant_refund_retention;
        booking.per_person_price * Decimal::from(delta) * refund_rate
    };

    round_amount(raw, scale)
}

/// Resolves the processing fee for a modification request.
///
/// # Errors
///
/// Returns `DomainError::PolicyConfiguration` if the fee table does not
/// cover the timing, which a validated table cannot produce.
pub fn calculate_processing_fee(
    modification_type: ModificationType,
    days: u32,
    pricing: &ModificationPricing,
    scale: u32,
) -> Result<Decimal, DomainError> {
    let tier: &ModificationFeeTier = pricing.resolve(days)?;
    let fee: Decimal = match modification_type {
        ModificationType::DateChange => tier.date_change_fee,
        ModificationType::ParticipantChange => tier.participant_change_fee,
        ModificationType::DateAndParticipantChange => tier.combined_change_fee,
    };
    Ok(round_amount(fee, scale))
}

/// Builds a full price quote for a modification request.
///
/// # Errors
///
/// Returns an error if the fee table cannot be resolved.
pub fn quote_modification(
    booking: &Booking,
    request: &ModificationRequest,
    pricing: &ModificationPricing,
    days: u32,
    scale: u32,
) -> Result<PriceQuote, DomainError> {
    let price_difference: Decimal = calculate_price_difference(booking, request, pricing, scale);
    let processing_fee: Decimal =
        calculate_processing_fee(request.modification_type, days, pricing, scale)?;
    let new_amount: Decimal = booking.total_amount + price_difference;
    let requires_additional_payment: bool = price_difference > Decimal::ZERO;
    let total_additional: Decimal = if requires_additional_payment {
        price_difference + processing_fee
    } else {
        processing_fee
    };

    Ok(PriceQuote {
        original_amount: booking.total_amount,
        new_amount,
        price_difference,
        processing_fee,
        total_additional,
        requires_additional_payment,
        offers_refund: price_difference < Decimal::ZERO,
    })
}

/// Validates the structural constraints of a modification request.
///
/// Returns a `ValidationResult` collecting every violation instead of
/// failing on the first, so callers can render all of them at once.
#[must_use]
pub fn validate_modification_request(
    booking: &Booking,
    request: &ModificationRequest,
    pricing: &ModificationPricing,
    now: OffsetDateTime,
) -> ValidationResult {
    let mut errors: Vec<String> = Vec::new();

    if booking.confirmation_status != ConfirmationStatus::Confirmed {
        errors.push(format!(
            "only confirmed bookings can be modified, booking is '{}'",
            booking.confirmation_status
        ));
    }

    let days: u32 = days_before_departure(booking.departure_date, now);
    if days < pricing.minimum_notice_days {
        errors.push(format!(
            "modifications require at least {} days of notice before departure, got {days}",
            pricing.minimum_notice_days
        ));
    }

    if request.modification_type.changes_dates() {
        match request.new_start_date {
            None => errors.push(String::from(
                "a date change requires a new start date",
            )),
            Some(start) => {
                if days_before_departure(start, now) == 0 {
                    errors.push(String::from("new start date must be in the future"));
                }
                if let Some(end) = request.new_end_date
                    && end < start
                {
                    errors.push(String::from(
                        "invalid date range: end date cannot be before start date",
                    ));
                }
            }
        }
    }

    if request.modification_type.changes_participants() {
        match request.new_participants {
            None => errors.push(String::from(
                "a participant change requires a new participant count",
            )),
            Some(0) => errors.push(String::from("participant count must be at least 1")),
            Some(count) => {
                if count > booking.tour_capacity {
                    errors.push(format!(
                        "participant count {count} exceeds tour capacity {}",
                        booking.tour_capacity
                    ));
                }
                if count == booking.participants && !request.modification_type.changes_dates() {
                    errors.push(String::from(
                        "participant count is unchanged; nothing to modify",
                    ));
                }
            }
        }
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}
