// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The API boundary of the booking change engine.
//!
//! This crate sits between transport (HTTP, CLI, tests) and the pure
//! core: it authorizes actors, translates errors into a single
//! boundary error type, drives optimistic-concurrency retries, and
//! dispatches notifications. Handlers are synchronous and take the
//! current instant as a parameter, so transports own both the runtime
//! and the clock.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

pub mod auth;
pub mod error;
pub mod handlers;
pub mod notify;
pub mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedActor, Role};
pub use error::ApiError;
pub use notify::{LogNotifier, Notification, Notifier, NotifyError};
pub use request_response::{
    AbuseCheckResponse, CanModifyResponse, EvaluationResponse, HistoryEntryView,
    PriceDifferenceResponse, ProcessingFeeResponse,
};
