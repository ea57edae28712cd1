// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Refund calculation over a resolved policy tier.
//!
//! The calculator is deterministic: the clock is read once, outside, to
//! produce days-before-departure, and every input arrives as a
//! parameter. All arithmetic uses `Decimal`; rounding happens once, at
//! the end, half-up at the configured minor-unit scale.

use crate::error::DomainError;
use crate::policy::PolicyTier;
use crate::types::EmergencyFlags;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Emergency override configuration.
///
/// Medical and force-majeure cancellations are guaranteed at least
/// `medical_floor_percentage` and pay no processing fee. Weather-related
/// cancellations are guaranteed at least `weather_floor_percentage` but
/// still pay the fee. The medical/force-majeure floor takes precedence
/// when both classes of flag apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyPolicy {
    /// Minimum refund percentage for medical/force-majeure cancellations.
    pub medical_floor_percentage: Decimal,
    /// Minimum refund percentage for weather-related cancellations.
    pub weather_floor_percentage: Decimal,
}

impl Default for EmergencyPolicy {
    fn default() -> Self {
        Self {
            medical_floor_percentage: Decimal::from(80),
            weather_floor_percentage: Decimal::from(90),
        }
    }
}

/// The refund breakdown produced for one cancellation evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundBreakdown {
    /// The refund percentage actually applied, after any emergency floor.
    pub refund_percentage: Decimal,
    /// `total_paid * refund_percentage / 100`, rounded.
    pub gross_refund: Decimal,
    /// The processing fee charged (zero when waived).
    pub processing_fee: Decimal,
    /// `max(0, gross_refund - processing_fee)`, never above total paid.
    pub net_refund: Decimal,
    /// Whether an emergency flag waived the fee.
    pub fee_waived: bool,
    /// Whether an emergency floor raised the tier percentage.
    pub floor_applied: bool,
}

/// Rounds an amount half-up at the given minor-unit scale.
#[must_use]
pub fn round_amount(amount: Decimal, scale: u32) -> Decimal {
    amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Calculates the refund for a cancellation under a resolved tier.
///
/// # Arguments
///
/// * `total_paid` - The booking's total paid amount
/// * `tier` - The policy tier resolved for the cancellation timing
/// * `flags` - The request's emergency flags
/// * `emergency` - The configured emergency floors
/// * `scale` - The currency's minor-unit scale (0 for VND)
///
/// # Errors
///
/// Returns `DomainError::InvalidAmount` if the total paid amount is
/// negative.
pub fn calculate_refund(
    total_paid: Decimal,
    tier: &PolicyTier,
    flags: EmergencyFlags,
    emergency: &EmergencyPolicy,
    scale: u32,
) -> Result<RefundBreakdown, DomainError> {
    if total_paid < Decimal::ZERO {
        return Err(DomainError::InvalidAmount {
            field: String::from("total_paid"),
            value: total_paid.to_string(),
        });
    }

    let mut percentage: Decimal = tier.refund_percentage;
    let mut floor_applied: bool = false;

    // Medical/force-majeure floor takes precedence over the weather floor.
    if flags.waives_fee() {
        if percentage < emergency.medical_floor_percentage {
            percentage = emergency.medical_floor_percentage;
            floor_applied = true;
        }
    } else if flags.is_weather_related && percentage < emergency.weather_floor_percentage {
        percentage = emergency.weather_floor_percentage;
        floor_applied = true;
    }

    let fee_waived: bool = flags.waives_fee();
    let raw_fee: Decimal = if fee_waived {
        Decimal::ZERO
    } else {
        tier.fee.resolve(total_paid)
    };

    let raw_gross: Decimal = total_paid * percentage / Decimal::ONE_HUNDRED;

    // Round once, at the end, never at intermediate steps.
    let gross_refund: Decimal = round_amount(raw_gross, scale);
    let processing_fee: Decimal = round_amount(raw_fee, scale);
    let net_refund: Decimal = round_amount(raw_gross - raw_fee, scale)
        .max(Decimal::ZERO)
        .min(total_paid);

    Ok(RefundBreakdown {
        refund_percentage: percentage,
        gross_refund,
        processing_fee,
        net_refund,
        fee_waived,
        floor_applied,
    })
}
