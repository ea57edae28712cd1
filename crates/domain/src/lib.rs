// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod abuse;
mod cancellation_status;
mod config;
mod error;
mod modification_pricing;
mod modification_status;
mod policy;
mod refund;
mod types;

#[cfg(test)]
mod tests;

pub use abuse::{AbuseThresholds, UserCancellationSummary, is_abusive_canceller};
pub use cancellation_status::CancellationStatus;
pub use config::EngineConfig;
pub use error::DomainError;
pub use modification_pricing::{
    ModificationFeeTier, ModificationPricing, ModificationType, PriceQuote, ValidationResult,
    calculate_price_difference, calculate_processing_fee, quote_modification,
    validate_modification_request,
};
pub use modification_status::ModificationStatus;
pub use policy::{CancellationPolicy, FeeSpec, PolicyTier};
pub use refund::{EmergencyPolicy, RefundBreakdown, calculate_refund, round_amount};
pub use types::{
    Booking, CancellationReason, CancellationRequest, ConfirmationStatus, EmergencyFlags,
    ModificationRequest, PaymentStatus, RefundMethod, days_before_departure,
    validate_cancellation_request,
};
