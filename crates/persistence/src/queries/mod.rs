// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-side persistence operations.
//!
//! Listing queries order by request time so callers see a stable,
//! chronological view. Aggregations load the matching rows and fold
//! in Rust; decimal arithmetic never happens in SQL.

pub mod bookings;
pub mod cancellations;
pub mod modifications;
pub mod statistics;
