// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Refund calculator tests, including the worked policy scenarios.

use crate::policy::{CancellationPolicy, FeeSpec, PolicyTier};
use crate::refund::{EmergencyPolicy, calculate_refund, round_amount};
use crate::types::{EmergencyFlags, days_before_departure};
use rust_decimal::Decimal;
use time::{Date, Month};

fn resolve_default_tier(days: u32) -> PolicyTier {
    let policy = CancellationPolicy::default();
    *policy.resolve(days).expect("default policy covers all days")
}

// ============================================================================
// Worked scenarios
// ============================================================================

#[test]
fn test_ten_days_out_standard_tier() {
    // 2,000,000 paid, departure in 10 days: 80% refund, fixed fee 50,000.
    let tier = resolve_default_tier(10);
    let breakdown = calculate_refund(
        Decimal::from(2_000_000),
        &tier,
        EmergencyFlags::default(),
        &EmergencyPolicy::default(),
        0,
    )
    .expect("valid inputs");

    assert_eq!(breakdown.gross_refund, Decimal::from(1_600_000));
    assert_eq!(breakdown.processing_fee, Decimal::from(50_000));
    assert_eq!(breakdown.net_refund, Decimal::from(1_550_000));
    assert!(!breakdown.fee_waived);
    assert!(!breakdown.floor_applied);
}

#[test]
fn test_two_days_out_last_minute_tier() {
    // Same booking, departure in 2 days: 50% refund, fixed fee 100,000.
    let tier = resolve_default_tier(2);
    let breakdown = calculate_refund(
        Decimal::from(2_000_000),
        &tier,
        EmergencyFlags::default(),
        &EmergencyPolicy::default(),
        0,
    )
    .expect("valid inputs");

    assert_eq!(breakdown.gross_refund, Decimal::from(1_000_000));
    assert_eq!(breakdown.processing_fee, Decimal::from(100_000));
    assert_eq!(breakdown.net_refund, Decimal::from(900_000));
}

#[test]
fn test_force_majeure_raises_floor_and_waives_fee() {
    // Last-minute tier with force majeure: floor 80%, fee waived.
    let tier = resolve_default_tier(2);
    let flags = EmergencyFlags {
        is_force_majeure: true,
        ..EmergencyFlags::default()
    };
    let breakdown = calculate_refund(
        Decimal::from(2_000_000),
        &tier,
        flags,
        &EmergencyPolicy::default(),
        0,
    )
    .expect("valid inputs");

    assert_eq!(breakdown.refund_percentage, Decimal::from(80));
    assert_eq!(breakdown.processing_fee, Decimal::ZERO);
    assert_eq!(breakdown.net_refund, Decimal::from(1_600_000));
    assert!(breakdown.fee_waived);
    assert!(breakdown.floor_applied);
}

// ============================================================================
// Emergency floor interactions
// ============================================================================

#[test]
fn test_weather_floor_keeps_fee() {
    let tier = resolve_default_tier(2);
    let flags = EmergencyFlags {
        is_weather_related: true,
        ..EmergencyFlags::default()
    };
    let breakdown = calculate_refund(
        Decimal::from(2_000_000),
        &tier,
        flags,
        &EmergencyPolicy::default(),
        0,
    )
    .expect("valid inputs");

    assert_eq!(breakdown.refund_percentage, Decimal::from(90));
    assert_eq!(breakdown.processing_fee, Decimal::from(100_000));
    assert_eq!(breakdown.net_refund, Decimal::from(1_700_000));
    assert!(!breakdown.fee_waived);
}

#[test]
fn test_medical_floor_takes_precedence_over_weather() {
    // Both flag classes set: the medical floor (80) wins over the
    // weather floor (90), and the fee is waived.
    let tier = resolve_default_tier(2);
    let flags = EmergencyFlags {
        is_medical_emergency: true,
        is_weather_related: true,
        is_force_majeure: false,
    };
    let breakdown = calculate_refund(
        Decimal::from(2_000_000),
        &tier,
        flags,
        &EmergencyPolicy::default(),
        0,
    )
    .expect("valid inputs");

    assert_eq!(breakdown.refund_percentage, Decimal::from(80));
    assert!(breakdown.fee_waived);
    assert_eq!(breakdown.net_refund, Decimal::from(1_600_000));
}

#[test]
fn test_floor_never_lowers_a_better_tier() {
    // 100% tier with medical emergency: percentage stays 100.
    let tier = resolve_default_tier(45);
    let flags = EmergencyFlags {
        is_medical_emergency: true,
        ..EmergencyFlags::default()
    };
    let breakdown = calculate_refund(
        Decimal::from(2_000_000),
        &tier,
        flags,
        &EmergencyPolicy::default(),
        0,
    )
    .expect("valid inputs");

    assert_eq!(breakdown.refund_percentage, Decimal::ONE_HUNDRED);
    assert!(!breakdown.floor_applied);
    assert_eq!(breakdown.net_refund, Decimal::from(2_000_000));
}

// ============================================================================
// Bounds
// ============================================================================

#[test]
fn test_net_refund_never_negative() {
    // Fee exceeds the gross refund on a tiny booking.
    let tier = PolicyTier {
        min_days_before_departure: 0,
        refund_percentage: Decimal::from(10),
        fee: FeeSpec::Fixed(Decimal::from(100_000)),
    };
    let breakdown = calculate_refund(
        Decimal::from(50_000),
        &tier,
        EmergencyFlags::default(),
        &EmergencyPolicy::default(),
        0,
    )
    .expect("valid inputs");

    assert_eq!(breakdown.net_refund, Decimal::ZERO);
}

#[test]
fn test_net_refund_never_exceeds_total_paid() {
    let tier = resolve_default_tier(60);
    let breakdown = calculate_refund(
        Decimal::from(1_000_000),
        &tier,
        EmergencyFlags::default(),
        &EmergencyPolicy::default(),
        0,
    )
    .expect("valid inputs");

    assert!(breakdown.net_refund <= Decimal::from(1_000_000));
}

#[test]
fn test_percentage_fee_resolution() {
    let tier = PolicyTier {
        min_days_before_departure: 0,
        refund_percentage: Decimal::from(50),
        fee: FeeSpec::PercentOfTotal(Decimal::from(5)),
    };
    let breakdown = calculate_refund(
        Decimal::from(2_000_000),
        &tier,
        EmergencyFlags::default(),
        &EmergencyPolicy::default(),
        0,
    )
    .expect("valid inputs");

    assert_eq!(breakdown.processing_fee, Decimal::from(100_000));
    assert_eq!(breakdown.net_refund, Decimal::from(900_000));
}

#[test]
fn test_negative_total_rejected() {
    let tier = resolve_default_tier(10);
    let result = calculate_refund(
        Decimal::from(-1),
        &tier,
        EmergencyFlags::default(),
        &EmergencyPolicy::default(),
        0,
    );
    assert!(result.is_err());
}

#[test]
fn test_determinism_for_identical_inputs() {
    let tier = resolve_default_tier(10);
    let flags = EmergencyFlags::default();
    let emergency = EmergencyPolicy::default();
    let first = calculate_refund(Decimal::from(2_000_000), &tier, flags, &emergency, 0)
        .expect("valid inputs");
    let second = calculate_refund(Decimal::from(2_000_000), &tier, flags, &emergency, 0)
        .expect("valid inputs");
    assert_eq!(first, second);
}

// ============================================================================
// Rounding and timing helpers
// ============================================================================

#[test]
fn test_round_half_up_at_scale() {
    assert_eq!(
        round_amount(Decimal::new(12_345, 1), 0), // 1234.5
        Decimal::from(1235)
    );
    assert_eq!(
        round_amount(Decimal::new(12_344, 1), 0), // 1234.4
        Decimal::from(1234)
    );
    assert_eq!(
        round_amount(Decimal::new(10_125, 3), 2), // 10.125
        Decimal::new(1013, 2)                     // 10.13
    );
}

#[test]
fn test_days_before_departure_exact_midnight() {
    let departure = Date::from_calendar_date(2026, Month::June, 15).expect("valid date");
    let now = Date::from_calendar_date(2026, Month::June, 5)
        .expect("valid date")
        .midnight()
        .assume_utc();
    assert_eq!(days_before_departure(departure, now), 10);
}

#[test]
fn test_days_before_departure_partial_day_rounds_up() {
    let departure = Date::from_calendar_date(2026, Month::June, 15).expect("valid date");
    let now = Date::from_calendar_date(2026, Month::June, 5)
        .expect("valid date")
        .with_hms(18, 0, 0)
        .expect("valid time")
        .assume_utc();
    assert_eq!(days_before_departure(departure, now), 10);
}

#[test]
fn test_days_before_departure_past_clamps_to_zero() {
    let departure = Date::from_calendar_date(2026, Month::June, 15).expect("valid date");
    let now = Date::from_calendar_date(2026, Month::June, 20)
        .expect("valid date")
        .midnight()
        .assume_utc();
    assert_eq!(days_before_departure(departure, now), 0);
}
