// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Write-side persistence operations.
//!
//! All multi-row writes run inside a transaction. Updates to
//! cancellation and modification records are version-checked: the
//! `UPDATE` carries the version the caller read, and zero affected
//! rows means another writer got there first.

pub mod bookings;
pub mod cancellations;
pub mod modifications;
