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

mod apply;
mod command;
mod error;
mod evaluate;
mod state;

#[cfg(test)]
mod tests;

// Re-export public types and functions
pub use apply::{apply_cancellation, apply_modification};
pub use command::{CancellationCommand, ModificationCommand};
pub use error::CoreError;
pub use evaluate::{
    CancellationEvaluation, evaluate_cancellation, new_cancellation, new_modification,
};
pub use state::{
    Actor, BookingChanges, BookingStatusUpdate, CancellationRecord, CancellationTransition,
    ModificationRecord, ModificationTransition, StatusHistoryEntry,
};
