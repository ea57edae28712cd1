// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Abuse threshold evaluation tests.

use crate::abuse::{AbuseThresholds, is_abusive_canceller};
use rust_decimal::Decimal;

#[test]
fn test_count_threshold_flags() {
    let thresholds = AbuseThresholds::default();
    assert!(is_abusive_canceller(3, 100, &thresholds));
    assert!(is_abusive_canceller(4, 100, &thresholds));
}

#[test]
fn test_below_both_thresholds_not_flagged() {
    let thresholds = AbuseThresholds::default();
    // 2 of 10 is under the count threshold and a 0.2 ratio.
    assert!(!is_abusive_canceller(2, 10, &thresholds));
}

#[test]
fn test_ratio_threshold_flags() {
    let thresholds = AbuseThresholds::default();
    // 4 cancellations over 5 bookings in the window: 0.8 > 0.5.
    assert!(is_abusive_canceller(4, 5, &thresholds));
    // 2 of 3 is under the count threshold but over the ratio.
    assert!(is_abusive_canceller(2, 3, &thresholds));
}

#[test]
fn test_ratio_exactly_at_threshold_not_flagged() {
    let thresholds = AbuseThresholds::default();
    // The ratio must strictly exceed the threshold.
    assert!(!is_abusive_canceller(1, 2, &thresholds));
}

#[test]
fn test_zero_bookings_skips_ratio() {
    let thresholds = AbuseThresholds::default();
    // No bookings in the window: ratio is undefined, only count applies.
    assert!(!is_abusive_canceller(2, 0, &thresholds));
    assert!(is_abusive_canceller(3, 0, &thresholds));
}

#[test]
fn test_custom_thresholds() {
    let thresholds = AbuseThresholds {
        window_days: 30,
        count_threshold: 5,
        ratio_threshold: Decimal::new(9, 1), // 0.9
    };
    assert!(!is_abusive_canceller(4, 5, &thresholds));
    assert!(is_abusive_canceller(5, 5, &thresholds));
    assert!(is_abusive_canceller(1, 1, &thresholds));
}
