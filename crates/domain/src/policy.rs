// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tiered cancellation policy: data, not code.
//!
//! The policy table is loaded from configuration at startup into an
//! immutable ordered structure and validated once; the resolver is a
//! pure function over that structure. An invalid table is a fatal
//! configuration error, never silently defaulted — silent defaults would
//! corrupt monetary calculations.

use crate::error::DomainError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a tier's processing fee is specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeSpec {
    /// A fixed amount in currency units.
    Fixed(Decimal),
    /// A percentage of the total paid amount.
    PercentOfTotal(Decimal),
}

impl FeeSpec {
    /// Resolves the fee against the total paid amount.
    #[must_use]
    pub fn resolve(&self, total_paid: Decimal) -> Decimal {
        match self {
            Self::Fixed(amount) => *amount,
            Self::PercentOfTotal(percent) => total_paid * *percent / Decimal::ONE_HUNDRED,
        }
    }
}

/// A single cancellation policy tier.
///
/// A tier applies when the actual days-before-departure is at least
/// `min_days_before_departure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTier {
    /// The inclusive lower bound of days before departure.
    pub min_days_before_departure: u32,
    /// Percentage of the total paid amount refunded, in [0, 100].
    pub refund_percentage: Decimal,
    /// The processing fee charged under this tier.
    pub fee: FeeSpec,
}

/// An ordered, validated cancellation policy table.
///
/// Tiers are held in descending threshold order; the first tier whose
/// threshold is satisfied by the actual days-before-departure applies.
/// The smallest threshold must be zero so coverage is contiguous from
/// day 0 to infinity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationPolicy {
    tiers: Vec<PolicyTier>,
}

impl CancellationPolicy {
    /// Builds a policy from tiers, validating the table invariants.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PolicyConfiguration` if the table is empty,
    /// thresholds are not strictly descending, the catch-all 0-day tier
    /// is missing, any percentage falls outside [0, 100], or any fee is
    /// negative.
    pub fn new(tiers: Vec<PolicyTier>) -> Result<Self, DomainError> {
        if tiers.is_empty() {
            return Err(DomainError::PolicyConfiguration(String::from(
                "policy table must contain at least one tier",
            )));
        }

        for window in tiers.windows(2) {
            if window[0].min_days_before_departure <= window[1].min_days_before_departure {
                return Err(DomainError::PolicyConfiguration(format!(
                    "tier thresholds must be strictly descending, found {} then {}",
                    window[0].min_days_before_departure, window[1].min_days_before_departure
                )));
            }
        }

        // The windows check guarantees the minimum threshold is last.
        if tiers[tiers.len() - 1].min_days_before_departure != 0 {
            return Err(DomainError::PolicyConfiguration(String::from(
                "policy table must end with a 0-day catch-all tier",
            )));
        }

        for tier in &tiers {
            if tier.refund_percentage < Decimal::ZERO
                || tier.refund_percentage > Decimal::ONE_HUNDRED
            {
                return Err(DomainError::PolicyConfiguration(format!(
                    "refund percentage {} for tier >= {} days is outside [0, 100]",
                    tier.refund_percentage, tier.min_days_before_departure
                )));
            }
            let negative: bool = match tier.fee {
                FeeSpec::Fixed(amount) => amount < Decimal::ZERO,
                FeeSpec::PercentOfTotal(percent) => percent < Decimal::ZERO,
            };
            if negative {
                return Err(DomainError::PolicyConfiguration(format!(
                    "fee for tier >= {} days is negative",
                    tier.min_days_before_departure
                )));
            }
        }

        Ok(Self { tiers })
    }

    /// Returns the tiers in descending threshold order.
    #[must_use]
    pub fn tiers(&self) -> &[PolicyTier] {
        &self.tiers
    }

    /// Resolves the tier applicable to the given days-before-departure.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PolicyConfiguration` if no tier matches.
    /// Given the contiguous-coverage invariant enforced by `new`, this
    /// cannot happen for a validated table; it is never defaulted away.
    pub fn resolve(&self, days_before_departure: u32) -> Result<&PolicyTier, DomainError> {
        self.tiers
            .iter()
            .find(|tier| days_before_departure >= tier.min_days_before_departure)
            .ok_or_else(|| {
                DomainError::PolicyConfiguration(format!(
                    "no policy tier covers {days_before_departure} days before departure"
                ))
            })
    }
}

impl Default for CancellationPolicy {
    /// The standard policy table: full refund a month or more out, 80%
    /// less a fixed fee within a week, half refund for last-minute
    /// cancellations.
    fn default() -> Self {
        Self {
            tiers: vec![
                PolicyTier {
                    min_days_before_departure: 30,
                    refund_percentage: Decimal::ONE_HUNDRED,
                    fee: FeeSpec::Fixed(Decimal::ZERO),
                },
                PolicyTier {
                    min_days_before_departure: 7,
                    refund_percentage: Decimal::from(80),
                    fee: FeeSpec::Fixed(Decimal::from(50_000)),
                },
                PolicyTier {
                    min_days_before_departure: 0,
                    refund_percentage: Decimal::from(50),
                    fee: FeeSpec::Fixed(Decimal::from(100_000)),
                },
            ],
        }
    }
}
