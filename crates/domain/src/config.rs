// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Engine configuration.
//!
//! All tuning inputs live here: the cancellation policy table, emergency
//! floors, abuse thresholds, modification pricing, and the currency's
//! minor-unit scale. The structure deserializes from a JSON file at
//! server startup and is validated before any request is served.

use crate::abuse::AbuseThresholds;
use crate::error::DomainError;
use crate::modification_pricing::ModificationPricing;
use crate::policy::CancellationPolicy;
use crate::refund::EmergencyPolicy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The tiered cancellation policy table.
    pub policy: CancellationPolicy,
    /// Emergency floor percentages.
    pub emergency: EmergencyPolicy,
    /// Abuse-detection thresholds.
    pub abuse: AbuseThresholds,
    /// Modification fee table and delta-pricing parameters.
    pub modification: ModificationPricing,
    /// Currency minor-unit scale (0 for VND).
    pub currency_scale: u32,
}

impl EngineConfig {
    /// Validates every configured table and threshold.
    ///
    /// Called once at startup; a failure here is fatal and must abort
    /// startup rather than fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PolicyConfiguration` describing the first
    /// invalid entry found.
    pub fn validate(&self) -> Result<(), DomainError> {
        // Re-run the table constructors: deserialized tables must satisfy
        // the same invariants as programmatically built ones.
        CancellationPolicy::new(self.policy.tiers().to_vec())?;
        ModificationPricing::new(
            self.modification.tiers().to_vec(),
            self.modification.participant_refund_retention,
            self.modification.minimum_notice_days,
        )?;

        if self.emergency.medical_floor_percentage < Decimal::ZERO
            || self.emergency.medical_floor_percentage > Decimal::ONE_HUNDRED
            || self.emergency.weather_floor_percentage < Decimal::ZERO
            || self.emergency.weather_floor_percentage > Decimal::ONE_HUNDRED
        {
            return Err(DomainError::PolicyConfiguration(String::from(
                "emergency floor percentages must be within [0, 100]",
            )));
        }

        if self.abuse.ratio_threshold < Decimal::ZERO || self.abuse.ratio_threshold > Decimal::ONE
        {
            return Err(DomainError::PolicyConfiguration(String::from(
                "abuse ratio threshold must be within [0, 1]",
            )));
        }

        Ok(())
    }
}
