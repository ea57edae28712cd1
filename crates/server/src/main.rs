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
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use rebook::{CancellationRecord, ModificationRecord};
use rebook_api::{
    AbuseCheckResponse, ApiError, AuthenticatedActor, CanModifyResponse, EvaluationResponse,
    HistoryEntryView, LogNotifier, PriceDifferenceResponse, ProcessingFeeResponse, Role, handlers,
};
use rebook_domain::{
    Booking, CancellationRequest, EmergencyFlags, EngineConfig, ModificationRequest, PriceQuote,
    RefundBreakdown, UserCancellationSummary, ValidationResult,
};
use rebook_persistence::{
    CancellationStatistics, ModificationStatistics, Persistence, ReasonStats,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{error, info};

/// Rebook Server - HTTP server for the booking change engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Path to a JSON engine configuration file. If not provided, uses the
    /// built-in policy tables.
    #[arg(short, long)]
    config: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    /// The persistence layer, wrapped in a Mutex for safe concurrent access.
    persistence: Arc<Mutex<Persistence>>,
    /// The validated engine configuration, fixed for the process lifetime.
    config: Arc<EngineConfig>,
    /// Outbound notification sink.
    notifier: Arc<LogNotifier>,
}

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

// ============================================================================
// Wire types
// ============================================================================

/// Actor identity carried on read endpoints as query parameters.
#[derive(Debug, Clone, Deserialize)]
struct ActorQuery {
    /// The actor ID performing this action.
    actor_id: i64,
    /// The role of the actor.
    actor_role: String,
}

/// API request for registering a booking mirror row.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct RegisterBookingApiRequest {
    /// The actor ID performing this action.
    actor_id: i64,
    /// The role of the actor.
    actor_role: String,
    /// The booking to register.
    booking: Booking,
}

/// API request wrapping a cancellation request payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct CancellationApiRequest {
    /// The actor ID performing this action.
    actor_id: i64,
    /// The role of the actor.
    actor_role: String,
    /// The cancellation request payload.
    request: CancellationRequest,
}

/// API request wrapping a modification request payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ModificationApiRequest {
    /// The actor ID performing this action.
    actor_id: i64,
    /// The role of the actor.
    actor_role: String,
    /// The modification request payload.
    request: ModificationRequest,
}

/// API request for review actions where notes are optional.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ReviewApiRequest {
    /// The actor ID performing this action.
    actor_id: i64,
    /// The role of the actor.
    actor_role: String,
    /// Optional reviewer notes.
    notes: Option<String>,
}

/// API request for rejections, where notes are mandatory.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct RejectApiRequest {
    /// The actor ID performing this action.
    actor_id: i64,
    /// The role of the actor.
    actor_role: String,
    /// Why the request was rejected.
    notes: String,
}

/// API request carrying only the acting identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ActorApiRequest {
    /// The actor ID performing this action.
    actor_id: i64,
    /// The role of the actor.
    actor_role: String,
}

/// API request for recording a processed refund.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ProcessRefundApiRequest {
    /// The actor ID performing this action.
    actor_id: i64,
    /// The role of the actor.
    actor_role: String,
    /// External payment transaction reference.
    transaction_reference: String,
    /// Payout method the refund went through
    /// (original_method/bank_transfer/voucher).
    refund_method: String,
}

/// API request for amending a pending modification.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct UpdateDetailsApiRequest {
    /// The actor ID performing this action.
    actor_id: i64,
    /// The role of the actor.
    actor_role: String,
    /// Replacement start date (ISO 8601), when dates change.
    new_start_date: Option<String>,
    /// Replacement end date (ISO 8601), when dates change.
    new_end_date: Option<String>,
    /// Replacement participant count, when participants change.
    new_participants: Option<u32>,
}

/// Query parameters for the refund-amount preview.
#[derive(Debug, Clone, Deserialize)]
struct RefundAmountQuery {
    /// The actor ID performing this action.
    actor_id: i64,
    /// The role of the actor.
    actor_role: String,
    /// Medical emergency flag.
    #[serde(default)]
    medical: bool,
    /// Weather-related flag.
    #[serde(default)]
    weather: bool,
    /// Force-majeure flag.
    #[serde(default)]
    force_majeure: bool,
}

/// Query parameters for reason-text search.
#[derive(Debug, Clone, Deserialize)]
struct SearchQuery {
    /// The actor ID performing this action.
    actor_id: i64,
    /// The role of the actor.
    actor_role: String,
    /// Substring to search reason text for.
    term: String,
}

/// Query parameters for time-windowed listings and statistics.
#[derive(Debug, Clone, Deserialize)]
struct RangeQuery {
    /// The actor ID performing this action.
    actor_id: i64,
    /// The role of the actor.
    actor_role: String,
    /// Window start, RFC 3339.
    from: String,
    /// Window end, RFC 3339.
    to: String,
}

/// Query parameters for the modification fee preview.
#[derive(Debug, Clone, Deserialize)]
struct FeeQuery {
    /// The actor ID performing this action.
    actor_id: i64,
    /// The role of the actor.
    actor_role: String,
    /// The change type to price.
    modification_type: String,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match &err {
            ApiError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } | ApiError::ConcurrentModification { .. } => {
                StatusCode::CONFLICT
            }
            ApiError::PolicyConfiguration { .. } | ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Parsing helpers
// ============================================================================

/// Parses a role string into a Role enum.
fn parse_role(role_str: &str) -> Result<Role, HttpError> {
    match role_str.to_lowercase().as_str() {
        "admin" => Ok(Role::Admin),
        "customer" => Ok(Role::Customer),
        _ => Err(HttpError {
            status: StatusCode::BAD_REQUEST,
            message: format!("Invalid role: '{role_str}'. Must be 'admin' or 'customer'"),
        }),
    }
}

/// Builds the authenticated actor from wire identity fields.
///
/// Identity is taken on trust from the fronting gateway; this server
/// performs authorization, not authentication.
fn authenticated_actor(actor_id: i64, role_str: &str) -> Result<AuthenticatedActor, HttpError> {
    let role: Role = parse_role(role_str)?;
    Ok(AuthenticatedActor::new(actor_id, role))
}

fn parse_timestamp(value: &str, field: &str) -> Result<OffsetDateTime, HttpError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|_| HttpError {
        status: StatusCode::BAD_REQUEST,
        message: format!("Invalid {field}: '{value}'. Expected an RFC 3339 timestamp"),
    })
}

fn parse_date(value: &str, field: &str) -> Result<Date, HttpError> {
    Date::parse(value, DATE_FORMAT).map_err(|_| HttpError {
        status: StatusCode::BAD_REQUEST,
        message: format!("Invalid {field}: '{value}'. Expected a YYYY-MM-DD date"),
    })
}

fn parse_optional_date(
    value: Option<&String>,
    field: &str,
) -> Result<Option<Date>, HttpError> {
    value.map(|raw| parse_date(raw, field)).transpose()
}

// ============================================================================
// Booking handlers
// ============================================================================

/// Handler for POST `/bookings` endpoint.
///
/// Registers a booking mirror row from the external booking subsystem.
async fn handle_register_booking(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<RegisterBookingApiRequest>,
) -> Result<Json<Booking>, HttpError> {
    info!(
        actor_id = req.actor_id,
        customer_id = req.booking.customer_id,
        "Handling register_booking request"
    );
    let actor: AuthenticatedActor = authenticated_actor(req.actor_id, &req.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let booking_id: i64 =
        handlers::register_booking(&mut persistence, &actor, &req.booking, now)?;
    let booking: Booking = handlers::get_booking(&mut persistence, &actor, booking_id)?;
    drop(persistence);

    Ok(Json(booking))
}

/// Handler for GET `/bookings/{id}` endpoint.
async fn handle_get_booking(
    AxumState(state): AxumState<AppState>,
    Path(booking_id): Path<i64>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<Booking>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;

    let mut persistence = state.persistence.lock().await;
    let booking: Booking = handlers::get_booking(&mut persistence, &actor, booking_id)?;
    drop(persistence);

    Ok(Json(booking))
}

/// Handler for GET `/bookings/{id}/refund_amount` endpoint.
///
/// Previews the refund breakdown under the given emergency flags.
async fn handle_refund_amount(
    AxumState(state): AxumState<AppState>,
    Path(booking_id): Path<i64>,
    Query(query): Query<RefundAmountQuery>,
) -> Result<Json<RefundBreakdown>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;
    let flags: EmergencyFlags = EmergencyFlags {
        is_medical_emergency: query.medical,
        is_weather_related: query.weather,
        is_force_majeure: query.force_majeure,
    };
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let breakdown: RefundBreakdown = handlers::calculate_refund_amount(
        &mut persistence,
        &state.config,
        &actor,
        booking_id,
        flags,
        now,
    )?;
    drop(persistence);

    Ok(Json(breakdown))
}

/// Handler for GET `/bookings/{id}/cancellation` endpoint.
///
/// Returns the booking's most recent cancellation, if any.
async fn handle_cancellation_for_booking(
    AxumState(state): AxumState<AppState>,
    Path(booking_id): Path<i64>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<Option<CancellationRecord>>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;

    let mut persistence = state.persistence.lock().await;
    let record: Option<CancellationRecord> =
        handlers::get_cancellation_for_booking(&mut persistence, &actor, booking_id)?;
    drop(persistence);

    Ok(Json(record))
}

/// Handler for GET `/bookings/{id}/can_modify` endpoint.
async fn handle_can_modify(
    AxumState(state): AxumState<AppState>,
    Path(booking_id): Path<i64>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<CanModifyResponse>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let response: CanModifyResponse =
        handlers::can_modify_booking(&mut persistence, &state.config, &actor, booking_id, now)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/bookings/{id}/modification_fee` endpoint.
async fn handle_modification_fee(
    AxumState(state): AxumState<AppState>,
    Path(booking_id): Path<i64>,
    Query(query): Query<FeeQuery>,
) -> Result<Json<ProcessingFeeResponse>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let response: ProcessingFeeResponse = handlers::processing_fee(
        &mut persistence,
        &state.config,
        &actor,
        booking_id,
        &query.modification_type,
        now,
    )?;
    drop(persistence);

    Ok(Json(response))
}

// ============================================================================
// Cancellation handlers
// ============================================================================

/// Handler for POST `/cancellations/evaluate` endpoint.
///
/// Previews a cancellation without committing anything.
async fn handle_evaluate(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<CancellationApiRequest>,
) -> Result<Json<EvaluationResponse>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(req.actor_id, &req.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let response: EvaluationResponse =
        handlers::evaluate(&mut persistence, &state.config, &actor, &req.request, now)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/cancellations` endpoint.
///
/// Submits a cancellation request.
async fn handle_request_cancellation(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<CancellationApiRequest>,
) -> Result<Json<CancellationRecord>, HttpError> {
    info!(
        actor_id = req.actor_id,
        booking_id = req.request.booking_id,
        "Handling request_cancellation request"
    );
    let actor: AuthenticatedActor = authenticated_actor(req.actor_id, &req.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let record: CancellationRecord = handlers::request_cancellation(
        &mut persistence,
        &state.config,
        state.notifier.as_ref(),
        &actor,
        &req.request,
        now,
    )?;
    drop(persistence);

    Ok(Json(record))
}

/// Handler for GET `/cancellations` endpoint.
///
/// Lists the calling customer's cancellations.
async fn handle_list_my_cancellations(
    AxumState(state): AxumState<AppState>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<Vec<CancellationRecord>>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;

    let mut persistence = state.persistence.lock().await;
    let records: Vec<CancellationRecord> =
        handlers::list_my_cancellations(&mut persistence, &actor)?;
    drop(persistence);

    Ok(Json(records))
}

/// Handler for GET `/cancellations/{id}` endpoint.
async fn handle_get_cancellation(
    AxumState(state): AxumState<AppState>,
    Path(cancellation_id): Path<i64>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<CancellationRecord>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;

    let mut persistence = state.persistence.lock().await;
    let record: CancellationRecord =
        handlers::get_cancellation(&mut persistence, &actor, cancellation_id)?;
    drop(persistence);

    Ok(Json(record))
}

/// Handler for GET `/cancellations/{id}/history` endpoint.
async fn handle_cancellation_history(
    AxumState(state): AxumState<AppState>,
    Path(cancellation_id): Path<i64>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<Vec<HistoryEntryView>>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;

    let mut persistence = state.persistence.lock().await;
    let history: Vec<HistoryEntryView> =
        handlers::get_cancellation_history(&mut persistence, &actor, cancellation_id)?;
    drop(persistence);

    Ok(Json(history))
}

/// Handler for POST `/cancellations/{id}/approve` endpoint.
async fn handle_approve_cancellation(
    AxumState(state): AxumState<AppState>,
    Path(cancellation_id): Path<i64>,
    Json(req): Json<ReviewApiRequest>,
) -> Result<Json<CancellationRecord>, HttpError> {
    info!(
        actor_id = req.actor_id,
        cancellation_id, "Handling approve_cancellation request"
    );
    let actor: AuthenticatedActor = authenticated_actor(req.actor_id, &req.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let record: CancellationRecord = handlers::approve_cancellation(
        &mut persistence,
        &state.config,
        state.notifier.as_ref(),
        &actor,
        cancellation_id,
        req.notes,
        now,
    )?;
    drop(persistence);

    Ok(Json(record))
}

/// Handler for POST `/cancellations/{id}/reject` endpoint.
async fn handle_reject_cancellation(
    AxumState(state): AxumState<AppState>,
    Path(cancellation_id): Path<i64>,
    Json(req): Json<RejectApiRequest>,
) -> Result<Json<CancellationRecord>, HttpError> {
    info!(
        actor_id = req.actor_id,
        cancellation_id, "Handling reject_cancellation request"
    );
    let actor: AuthenticatedActor = authenticated_actor(req.actor_id, &req.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let record: CancellationRecord = handlers::reject_cancellation(
        &mut persistence,
        &state.config,
        state.notifier.as_ref(),
        &actor,
        cancellation_id,
        req.notes,
        now,
    )?;
    drop(persistence);

    Ok(Json(record))
}

/// Handler for POST `/cancellations/{id}/expedite` endpoint.
async fn handle_expedite_cancellation(
    AxumState(state): AxumState<AppState>,
    Path(cancellation_id): Path<i64>,
    Json(req): Json<ActorApiRequest>,
) -> Result<Json<CancellationRecord>, HttpError> {
    info!(
        actor_id = req.actor_id,
        cancellation_id, "Handling expedite_cancellation request"
    );
    let actor: AuthenticatedActor = authenticated_actor(req.actor_id, &req.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let record: CancellationRecord = handlers::expedite_cancellation(
        &mut persistence,
        &state.config,
        state.notifier.as_ref(),
        &actor,
        cancellation_id,
        now,
    )?;
    drop(persistence);

    Ok(Json(record))
}

/// Handler for POST `/cancellations/{id}/refund` endpoint.
///
/// Records a processed refund and synchronizes the booking.
async fn handle_process_refund(
    AxumState(state): AxumState<AppState>,
    Path(cancellation_id): Path<i64>,
    Json(req): Json<ProcessRefundApiRequest>,
) -> Result<Json<CancellationRecord>, HttpError> {
    info!(
        actor_id = req.actor_id,
        cancellation_id, "Handling process_refund request"
    );
    let actor: AuthenticatedActor = authenticated_actor(req.actor_id, &req.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let record: CancellationRecord = handlers::process_refund(
        &mut persistence,
        &state.config,
        state.notifier.as_ref(),
        &actor,
        cancellation_id,
        req.transaction_reference,
        &req.refund_method,
        now,
    )?;
    drop(persistence);

    Ok(Json(record))
}

/// Handler for GET `/admin/cancellations/pending` endpoint.
async fn handle_list_pending(
    AxumState(state): AxumState<AppState>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<Vec<CancellationRecord>>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;

    let mut persistence = state.persistence.lock().await;
    let records: Vec<CancellationRecord> =
        handlers::list_pending_cancellations(&mut persistence, &actor)?;
    drop(persistence);

    Ok(Json(records))
}

/// Handler for GET `/admin/cancellations/emergency` endpoint.
async fn handle_list_emergency(
    AxumState(state): AxumState<AppState>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<Vec<CancellationRecord>>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;

    let mut persistence = state.persistence.lock().await;
    let records: Vec<CancellationRecord> =
        handlers::list_emergency_cancellations(&mut persistence, &actor)?;
    drop(persistence);

    Ok(Json(records))
}

/// Handler for GET `/admin/cancellations/awaiting_refund` endpoint.
async fn handle_list_awaiting_refund(
    AxumState(state): AxumState<AppState>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<Vec<CancellationRecord>>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;

    let mut persistence = state.persistence.lock().await;
    let records: Vec<CancellationRecord> =
        handlers::list_cancellations_awaiting_refund(&mut persistence, &actor)?;
    drop(persistence);

    Ok(Json(records))
}

/// Handler for GET `/admin/cancellations/search` endpoint.
async fn handle_search_cancellations(
    AxumState(state): AxumState<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<CancellationRecord>>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;

    let mut persistence = state.persistence.lock().await;
    let records: Vec<CancellationRecord> =
        handlers::search_cancellations(&mut persistence, &actor, &query.term)?;
    drop(persistence);

    Ok(Json(records))
}

/// Handler for GET `/admin/cancellations/status/{status}` endpoint.
async fn handle_cancellations_by_status(
    AxumState(state): AxumState<AppState>,
    Path(status): Path<String>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<Vec<CancellationRecord>>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;

    let mut persistence = state.persistence.lock().await;
    let records: Vec<CancellationRecord> =
        handlers::list_cancellations_by_status(&mut persistence, &actor, &status)?;
    drop(persistence);

    Ok(Json(records))
}

/// Handler for GET `/admin/cancellations/range` endpoint.
async fn handle_cancellations_by_range(
    AxumState(state): AxumState<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<CancellationRecord>>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;
    let from: OffsetDateTime = parse_timestamp(&query.from, "from")?;
    let to: OffsetDateTime = parse_timestamp(&query.to, "to")?;

    let mut persistence = state.persistence.lock().await;
    let records: Vec<CancellationRecord> =
        handlers::list_cancellations_by_date_range(&mut persistence, &actor, from, to)?;
    drop(persistence);

    Ok(Json(records))
}

/// Handler for GET `/admin/statistics/cancellations` endpoint.
async fn handle_cancellation_statistics(
    AxumState(state): AxumState<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<CancellationStatistics>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;
    let from: OffsetDateTime = parse_timestamp(&query.from, "from")?;
    let to: OffsetDateTime = parse_timestamp(&query.to, "to")?;

    let mut persistence = state.persistence.lock().await;
    let statistics: CancellationStatistics =
        handlers::cancellation_statistics(&mut persistence, &actor, from, to)?;
    drop(persistence);

    Ok(Json(statistics))
}

/// Handler for GET `/admin/statistics/cancellation_reasons` endpoint.
async fn handle_reason_statistics(
    AxumState(state): AxumState<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<ReasonStats>>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;
    let from: OffsetDateTime = parse_timestamp(&query.from, "from")?;
    let to: OffsetDateTime = parse_timestamp(&query.to, "to")?;

    let mut persistence = state.persistence.lock().await;
    let statistics: Vec<ReasonStats> =
        handlers::cancellation_reason_stats(&mut persistence, &actor, from, to)?;
    drop(persistence);

    Ok(Json(statistics))
}

/// Handler for GET `/admin/users/{user_id}/cancellation_summary` endpoint.
async fn handle_user_summary(
    AxumState(state): AxumState<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<UserCancellationSummary>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let summary: UserCancellationSummary = handlers::user_cancellation_summary(
        &mut persistence,
        &state.config,
        &actor,
        user_id,
        now,
    )?;
    drop(persistence);

    Ok(Json(summary))
}

/// Handler for GET `/admin/users/{user_id}/abuse_check` endpoint.
async fn handle_abuse_check(
    AxumState(state): AxumState<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<AbuseCheckResponse>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let response: AbuseCheckResponse =
        handlers::is_abusive(&mut persistence, &state.config, &actor, user_id, now)?;
    drop(persistence);

    Ok(Json(response))
}

// ============================================================================
// Modification handlers
// ============================================================================

/// Handler for POST `/modifications` endpoint.
///
/// Submits a modification request.
async fn handle_request_modification(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<ModificationApiRequest>,
) -> Result<Json<ModificationRecord>, HttpError> {
    info!(
        actor_id = req.actor_id,
        booking_id = req.request.booking_id,
        "Handling request_modification request"
    );
    let actor: AuthenticatedActor = authenticated_actor(req.actor_id, &req.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let record: ModificationRecord = handlers::request_modification(
        &mut persistence,
        &state.config,
        state.notifier.as_ref(),
        &actor,
        &req.request,
        now,
    )?;
    drop(persistence);

    Ok(Json(record))
}

/// Handler for POST `/modifications/quote` endpoint.
///
/// Builds a full price quote without committing anything.
async fn handle_modification_quote(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<ModificationApiRequest>,
) -> Result<Json<PriceQuote>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(req.actor_id, &req.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let quote: PriceQuote = handlers::modification_price_quote(
        &mut persistence,
        &state.config,
        &actor,
        &req.request,
        now,
    )?;
    drop(persistence);

    Ok(Json(quote))
}

/// Handler for POST `/modifications/validate` endpoint.
async fn handle_validate_modification(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<ModificationApiRequest>,
) -> Result<Json<ValidationResult>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(req.actor_id, &req.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let result: ValidationResult = handlers::validate_modification(
        &mut persistence,
        &state.config,
        &actor,
        &req.request,
        now,
    )?;
    drop(persistence);

    Ok(Json(result))
}

/// Handler for POST `/modifications/price_difference` endpoint.
async fn handle_price_difference(
    AxumState(state): AxumState<AppState>,
    Json(req): Json<ModificationApiRequest>,
) -> Result<Json<PriceDifferenceResponse>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(req.actor_id, &req.actor_role)?;

    let mut persistence = state.persistence.lock().await;
    let response: PriceDifferenceResponse =
        handlers::price_difference(&mut persistence, &state.config, &actor, &req.request)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/modifications` endpoint.
///
/// Lists the calling customer's modification requests.
async fn handle_list_my_modifications(
    AxumState(state): AxumState<AppState>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<Vec<ModificationRecord>>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;

    let mut persistence = state.persistence.lock().await;
    let records: Vec<ModificationRecord> =
        handlers::list_my_modifications(&mut persistence, &actor)?;
    drop(persistence);

    Ok(Json(records))
}

/// Handler for GET `/modifications/{id}` endpoint.
async fn handle_get_modification(
    AxumState(state): AxumState<AppState>,
    Path(modification_id): Path<i64>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<ModificationRecord>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;

    let mut persistence = state.persistence.lock().await;
    let record: ModificationRecord =
        handlers::get_modification(&mut persistence, &actor, modification_id)?;
    drop(persistence);

    Ok(Json(record))
}

/// Handler for GET `/modifications/{id}/history` endpoint.
async fn handle_modification_history(
    AxumState(state): AxumState<AppState>,
    Path(modification_id): Path<i64>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<Vec<HistoryEntryView>>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;

    let mut persistence = state.persistence.lock().await;
    let history: Vec<HistoryEntryView> =
        handlers::get_modification_history(&mut persistence, &actor, modification_id)?;
    drop(persistence);

    Ok(Json(history))
}

/// Handler for POST `/modifications/{id}/withdraw` endpoint.
///
/// Customer withdraws their own pending request.
async fn handle_withdraw_modification(
    AxumState(state): AxumState<AppState>,
    Path(modification_id): Path<i64>,
    Json(req): Json<ActorApiRequest>,
) -> Result<Json<ModificationRecord>, HttpError> {
    info!(
        actor_id = req.actor_id,
        modification_id, "Handling withdraw_modification request"
    );
    let actor: AuthenticatedActor = authenticated_actor(req.actor_id, &req.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let record: ModificationRecord = handlers::cancel_my_modification(
        &mut persistence,
        &state.config,
        &actor,
        modification_id,
        now,
    )?;
    drop(persistence);

    Ok(Json(record))
}

/// Handler for POST `/modifications/{id}/accept_charges` endpoint.
async fn handle_accept_charges(
    AxumState(state): AxumState<AppState>,
    Path(modification_id): Path<i64>,
    Json(req): Json<ActorApiRequest>,
) -> Result<Json<ModificationRecord>, HttpError> {
    info!(
        actor_id = req.actor_id,
        modification_id, "Handling accept_charges request"
    );
    let actor: AuthenticatedActor = authenticated_actor(req.actor_id, &req.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let record: ModificationRecord = handlers::accept_modification_charges(
        &mut persistence,
        &state.config,
        &actor,
        modification_id,
        now,
    )?;
    drop(persistence);

    Ok(Json(record))
}

/// Handler for POST `/modifications/{id}/approve` endpoint.
async fn handle_approve_modification(
    AxumState(state): AxumState<AppState>,
    Path(modification_id): Path<i64>,
    Json(req): Json<ReviewApiRequest>,
) -> Result<Json<ModificationRecord>, HttpError> {
    info!(
        actor_id = req.actor_id,
        modification_id, "Handling approve_modification request"
    );
    let actor: AuthenticatedActor = authenticated_actor(req.actor_id, &req.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let record: ModificationRecord = handlers::approve_modification(
        &mut persistence,
        &state.config,
        state.notifier.as_ref(),
        &actor,
        modification_id,
        req.notes,
        now,
    )?;
    drop(persistence);

    Ok(Json(record))
}

/// Handler for POST `/modifications/{id}/reject` endpoint.
async fn handle_reject_modification(
    AxumState(state): AxumState<AppState>,
    Path(modification_id): Path<i64>,
    Json(req): Json<RejectApiRequest>,
) -> Result<Json<ModificationRecord>, HttpError> {
    info!(
        actor_id = req.actor_id,
        modification_id, "Handling reject_modification request"
    );
    let actor: AuthenticatedActor = authenticated_actor(req.actor_id, &req.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let record: ModificationRecord = handlers::reject_modification(
        &mut persistence,
        &state.config,
        state.notifier.as_ref(),
        &actor,
        modification_id,
        req.notes,
        now,
    )?;
    drop(persistence);

    Ok(Json(record))
}

/// Handler for POST `/modifications/{id}/process` endpoint.
async fn handle_process_modification(
    AxumState(state): AxumState<AppState>,
    Path(modification_id): Path<i64>,
    Json(req): Json<ActorApiRequest>,
) -> Result<Json<ModificationRecord>, HttpError> {
    info!(
        actor_id = req.actor_id,
        modification_id, "Handling process_modification request"
    );
    let actor: AuthenticatedActor = authenticated_actor(req.actor_id, &req.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let record: ModificationRecord = handlers::process_modification(
        &mut persistence,
        &state.config,
        &actor,
        modification_id,
        now,
    )?;
    drop(persistence);

    Ok(Json(record))
}

/// Handler for POST `/modifications/{id}/complete` endpoint.
async fn handle_complete_modification(
    AxumState(state): AxumState<AppState>,
    Path(modification_id): Path<i64>,
    Json(req): Json<ActorApiRequest>,
) -> Result<Json<ModificationRecord>, HttpError> {
    info!(
        actor_id = req.actor_id,
        modification_id, "Handling complete_modification request"
    );
    let actor: AuthenticatedActor = authenticated_actor(req.actor_id, &req.actor_role)?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let record: ModificationRecord = handlers::complete_modification(
        &mut persistence,
        &state.config,
        state.notifier.as_ref(),
        &actor,
        modification_id,
        now,
    )?;
    drop(persistence);

    Ok(Json(record))
}

/// Handler for POST `/modifications/{id}/details` endpoint.
///
/// Admin amends a pending request; validation and pricing re-run.
async fn handle_update_details(
    AxumState(state): AxumState<AppState>,
    Path(modification_id): Path<i64>,
    Json(req): Json<UpdateDetailsApiRequest>,
) -> Result<Json<ModificationRecord>, HttpError> {
    info!(
        actor_id = req.actor_id,
        modification_id, "Handling update_details request"
    );
    let actor: AuthenticatedActor = authenticated_actor(req.actor_id, &req.actor_role)?;
    let new_start_date: Option<Date> =
        parse_optional_date(req.new_start_date.as_ref(), "new_start_date")?;
    let new_end_date: Option<Date> =
        parse_optional_date(req.new_end_date.as_ref(), "new_end_date")?;
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = state.persistence.lock().await;
    let record: ModificationRecord = handlers::update_modification_details(
        &mut persistence,
        &state.config,
        &actor,
        modification_id,
        new_start_date,
        new_end_date,
        req.new_participants,
        now,
    )?;
    drop(persistence);

    Ok(Json(record))
}

/// Handler for GET `/admin/modifications` endpoint.
async fn handle_list_modifications(
    AxumState(state): AxumState<AppState>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<Vec<ModificationRecord>>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;

    let mut persistence = state.persistence.lock().await;
    let records: Vec<ModificationRecord> =
        handlers::list_modifications(&mut persistence, &actor)?;
    drop(persistence);

    Ok(Json(records))
}

/// Handler for GET `/admin/modifications/status/{status}` endpoint.
async fn handle_modifications_by_status(
    AxumState(state): AxumState<AppState>,
    Path(status): Path<String>,
    Query(query): Query<ActorQuery>,
) -> Result<Json<Vec<ModificationRecord>>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;

    let mut persistence = state.persistence.lock().await;
    let records: Vec<ModificationRecord> =
        handlers::list_modifications_by_status(&mut persistence, &actor, &status)?;
    drop(persistence);

    Ok(Json(records))
}

/// Handler for GET `/admin/statistics/modifications` endpoint.
async fn handle_modification_statistics(
    AxumState(state): AxumState<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<ModificationStatistics>, HttpError> {
    let actor: AuthenticatedActor = authenticated_actor(query.actor_id, &query.actor_role)?;
    let from: OffsetDateTime = parse_timestamp(&query.from, "from")?;
    let to: OffsetDateTime = parse_timestamp(&query.to, "to")?;

    let mut persistence = state.persistence.lock().await;
    let statistics: ModificationStatistics =
        handlers::modification_statistics(&mut persistence, &actor, from, to)?;
    drop(persistence);

    Ok(Json(statistics))
}

/// Builds the application router with all endpoints.
#[allow(clippy::too_many_lines)]
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/bookings", post(handle_register_booking))
        .route("/bookings/{id}", get(handle_get_booking))
        .route("/bookings/{id}/refund_amount", get(handle_refund_amount))
        .route(
            "/bookings/{id}/cancellation",
            get(handle_cancellation_for_booking),
        )
        .route("/bookings/{id}/can_modify", get(handle_can_modify))
        .route(
            "/bookings/{id}/modification_fee",
            get(handle_modification_fee),
        )
        .route("/cancellations", post(handle_request_cancellation))
        .route("/cancellations", get(handle_list_my_cancellations))
        .route("/cancellations/evaluate", post(handle_evaluate))
        .route("/cancellations/{id}", get(handle_get_cancellation))
        .route(
            "/cancellations/{id}/history",
            get(handle_cancellation_history),
        )
        .route(
            "/cancellations/{id}/approve",
            post(handle_approve_cancellation),
        )
        .route(
            "/cancellations/{id}/reject",
            post(handle_reject_cancellation),
        )
        .route(
            "/cancellations/{id}/expedite",
            post(handle_expedite_cancellation),
        )
        .route("/cancellations/{id}/refund", post(handle_process_refund))
        .route("/admin/cancellations/pending", get(handle_list_pending))
        .route("/admin/cancellations/emergency", get(handle_list_emergency))
        .route(
            "/admin/cancellations/awaiting_refund",
            get(handle_list_awaiting_refund),
        )
        .route(
            "/admin/cancellations/search",
            get(handle_search_cancellations),
        )
        .route(
            "/admin/cancellations/status/{status}",
            get(handle_cancellations_by_status),
        )
        .route(
            "/admin/cancellations/range",
            get(handle_cancellations_by_range),
        )
        .route(
            "/admin/statistics/cancellations",
            get(handle_cancellation_statistics),
        )
        .route(
            "/admin/statistics/cancellation_reasons",
            get(handle_reason_statistics),
        )
        .route(
            "/admin/statistics/modifications",
            get(handle_modification_statistics),
        )
        .route(
            "/admin/users/{user_id}/cancellation_summary",
            get(handle_user_summary),
        )
        .route(
            "/admin/users/{user_id}/abuse_check",
            get(handle_abuse_check),
        )
        .route("/modifications", post(handle_request_modification))
        .route("/modifications", get(handle_list_my_modifications))
        .route("/modifications/quote", post(handle_modification_quote))
        .route(
            "/modifications/validate",
            post(handle_validate_modification),
        )
        .route(
            "/modifications/price_difference",
            post(handle_price_difference),
        )
        .route("/modifications/{id}", get(handle_get_modification))
        .route(
            "/modifications/{id}/history",
            get(handle_modification_history),
        )
        .route(
            "/modifications/{id}/withdraw",
            post(handle_withdraw_modification),
        )
        .route(
            "/modifications/{id}/accept_charges",
            post(handle_accept_charges),
        )
        .route(
            "/modifications/{id}/approve",
            post(handle_approve_modification),
        )
        .route(
            "/modifications/{id}/reject",
            post(handle_reject_modification),
        )
        .route(
            "/modifications/{id}/process",
            post(handle_process_modification),
        )
        .route(
            "/modifications/{id}/complete",
            post(handle_complete_modification),
        )
        .route("/modifications/{id}/details", post(handle_update_details))
        .route("/admin/modifications", get(handle_list_modifications))
        .route(
            "/admin/modifications/status/{status}",
            get(handle_modifications_by_status),
        )
        .with_state(app_state)
}

/// Loads and validates the engine configuration.
fn load_config(path: Option<&str>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let config: EngineConfig = match path {
        Some(path) => {
            info!("Loading engine configuration from {}", path);
            let raw: String = std::fs::read_to_string(path)?;
            serde_json::from_str(&raw)?
        }
        None => {
            info!("Using the built-in engine configuration");
            EngineConfig::default()
        }
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Rebook Server");

    // Policy tables are validated once, before anything binds.
    let config: EngineConfig = load_config(args.config.as_deref())?;

    // Initialize persistence (in-memory or file-based based on CLI argument)
    let persistence: Persistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        config: Arc::new(config),
        notifier: Arc::new(LogNotifier),
    };

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode as HttpStatusCode},
    };
    use rebook_domain::{ConfirmationStatus, PaymentStatus};
    use rust_decimal::Decimal;
    use serde_json::Value;
    use time::Duration;
    use tower::ServiceExt;

    /// Helper to create test app state with in-memory persistence.
    fn create_test_app_state() -> AppState {
        let persistence: Persistence =
            Persistence::new_in_memory().expect("Failed to create in-memory persistence");
        AppState {
            persistence: Arc::new(Mutex::new(persistence)),
            config: Arc::new(EngineConfig::default()),
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Helper to create a test booking departing well in the future.
    fn create_test_booking() -> Booking {
        let departure: Date = (OffsetDateTime::now_utc() + Duration::days(10)).date();
        Booking {
            booking_id: 0,
            tour_id: 10,
            customer_id: 100,
            departure_date: departure,
            participants: 4,
            tour_capacity: 20,
            total_amount: Decimal::from(2_000_000),
            per_person_price: Decimal::from(500_000),
            payment_status: PaymentStatus::Paid,
            confirmation_status: ConfirmationStatus::Confirmed,
        }
    }

    fn create_test_cancellation_request(booking_id: i64) -> CancellationRequest {
        CancellationRequest {
            booking_id,
            reason_category: rebook_domain::CancellationReason::ScheduleConflict,
            reason: String::from("A work commitment now overlaps the tour dates."),
            additional_notes: None,
            emergency_flags: EmergencyFlags::default(),
            supporting_documents: Vec::new(),
            emergency_contact_name: None,
            emergency_contact_phone: None,
            emergency_contact_relationship: None,
            preferred_refund_method: rebook_domain::RefundMethod::OriginalMethod,
            acknowledges_cancellation_policy: true,
            acknowledges_refund_terms: true,
        }
    }

    async fn post_json(app: Router, uri: &str, body: &impl Serialize) -> Response {
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn get_uri(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Registers the test booking and returns its assigned id.
    async fn seed_booking(app: Router) -> i64 {
        let request: RegisterBookingApiRequest = RegisterBookingApiRequest {
            actor_id: 7,
            actor_role: String::from("admin"),
            booking: create_test_booking(),
        };
        let response = post_json(app, "/bookings", &request).await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        body_json(response).await["booking_id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_cancellation_lifecycle_over_http() {
        let app: Router = build_router(create_test_app_state());
        let booking_id: i64 = seed_booking(app.clone()).await;

        let request: CancellationApiRequest = CancellationApiRequest {
            actor_id: 100,
            actor_role: String::from("customer"),
            request: create_test_cancellation_request(booking_id),
        };
        let response = post_json(app.clone(), "/cancellations", &request).await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let record: Value = body_json(response).await;
        assert_eq!(record["status"], "requested");
        let cancellation_id: i64 = record["id"].as_i64().unwrap();

        let approve: ReviewApiRequest = ReviewApiRequest {
            actor_id: 7,
            actor_role: String::from("admin"),
            notes: Some(String::from("verified with the customer by phone")),
        };
        let response = post_json(
            app.clone(),
            &format!("/cancellations/{cancellation_id}/approve"),
            &approve,
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let approved: Value = body_json(response).await;
        assert_eq!(approved["status"], "refund_pending");
        assert_eq!(approved["reviewed_by"], 7);

        let refund: ProcessRefundApiRequest = ProcessRefundApiRequest {
            actor_id: 7,
            actor_role: String::from("admin"),
            transaction_reference: String::from("TXN-2026-0815"),
            refund_method: String::from("bank_transfer"),
        };
        let response = post_json(
            app,
            &format!("/cancellations/{cancellation_id}/refund"),
            &refund,
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let refunded: Value = body_json(response).await;
        assert_eq!(refunded["status"], "refunded");
        assert_eq!(refunded["refund_transaction_reference"], "TXN-2026-0815");
        assert_eq!(refunded["refund_method_used"], "bank_transfer");
    }

    #[tokio::test]
    async fn test_customer_cannot_approve() {
        let app: Router = build_router(create_test_app_state());
        let booking_id: i64 = seed_booking(app.clone()).await;

        let request: CancellationApiRequest = CancellationApiRequest {
            actor_id: 100,
            actor_role: String::from("customer"),
            request: create_test_cancellation_request(booking_id),
        };
        let response = post_json(app.clone(), "/cancellations", &request).await;
        let cancellation_id: i64 = body_json(response).await["id"].as_i64().unwrap();

        let approve: ReviewApiRequest = ReviewApiRequest {
            actor_id: 100,
            actor_role: String::from("customer"),
            notes: None,
        };
        let response = post_json(
            app,
            &format!("/cancellations/{cancellation_id}/approve"),
            &approve,
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unknown_role_is_bad_request() {
        let app: Router = build_router(create_test_app_state());

        let request: CancellationApiRequest = CancellationApiRequest {
            actor_id: 100,
            actor_role: String::from("superuser"),
            request: create_test_cancellation_request(1),
        };
        let response = post_json(app, "/cancellations", &request).await;
        assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_booking_is_not_found() {
        let app: Router = build_router(create_test_app_state());

        let request: CancellationApiRequest = CancellationApiRequest {
            actor_id: 100,
            actor_role: String::from("customer"),
            request: create_test_cancellation_request(999),
        };
        let response = post_json(app, "/cancellations", &request).await;
        assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_evaluate_returns_breakdown() {
        let app: Router = build_router(create_test_app_state());
        let booking_id: i64 = seed_booking(app.clone()).await;

        let request: CancellationApiRequest = CancellationApiRequest {
            actor_id: 100,
            actor_role: String::from("customer"),
            request: create_test_cancellation_request(booking_id),
        };
        let response = post_json(app, "/cancellations/evaluate", &request).await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let evaluation: Value = body_json(response).await;
        // Ten days out lands in the 7..30 tier: 80% less a 50,000 fee.
        assert_eq!(evaluation["refund_percentage"], "80");
        assert_eq!(evaluation["net_refund"], "1550000");
    }

    #[tokio::test]
    async fn test_duplicate_cancellation_is_conflict() {
        let app: Router = build_router(create_test_app_state());
        let booking_id: i64 = seed_booking(app.clone()).await;

        let request: CancellationApiRequest = CancellationApiRequest {
            actor_id: 100,
            actor_role: String::from("customer"),
            request: create_test_cancellation_request(booking_id),
        };
        let first = post_json(app.clone(), "/cancellations", &request).await;
        assert_eq!(first.status(), HttpStatusCode::OK);
        let second = post_json(app, "/cancellations", &request).await;
        assert_eq!(second.status(), HttpStatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_modification_quote_over_http() {
        let app: Router = build_router(create_test_app_state());
        let booking_id: i64 = seed_booking(app.clone()).await;

        let request: ModificationApiRequest = ModificationApiRequest {
            actor_id: 100,
            actor_role: String::from("customer"),
            request: ModificationRequest {
                booking_id,
                modification_type: rebook_domain::ModificationType::ParticipantChange,
                new_start_date: None,
                new_end_date: None,
                new_participants: Some(6),
                reason: None,
                customer_notes: None,
            },
        };
        let response = post_json(app, "/modifications/quote", &request).await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let quote: Value = body_json(response).await;
        assert_eq!(quote["price_difference"], "1000000");
        assert_eq!(quote["requires_additional_payment"], true);
    }

    #[tokio::test]
    async fn test_statistics_require_admin_role() {
        let app: Router = build_router(create_test_app_state());

        let response = get_uri(
            app,
            "/admin/statistics/cancellations?actor_id=100&actor_role=customer\
             &from=2026-01-01T00:00:00Z&to=2026-12-31T00:00:00Z",
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_invalid_timestamp_is_bad_request() {
        let app: Router = build_router(create_test_app_state());

        let response = get_uri(
            app,
            "/admin/statistics/cancellations?actor_id=7&actor_role=admin\
             &from=yesterday&to=2026-12-31T00:00:00Z",
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_pending_queue_lists_new_requests() {
        let app: Router = build_router(create_test_app_state());
        let booking_id: i64 = seed_booking(app.clone()).await;

        let request: CancellationApiRequest = CancellationApiRequest {
            actor_id: 100,
            actor_role: String::from("customer"),
            request: create_test_cancellation_request(booking_id),
        };
        post_json(app.clone(), "/cancellations", &request).await;

        let response = get_uri(
            app,
            "/admin/cancellations/pending?actor_id=7&actor_role=admin",
        )
        .await;
        assert_eq!(response.status(), HttpStatusCode::OK);
        let records: Value = body_json(response).await;
        assert_eq!(records.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_config_file_round_trip() {
        let config: EngineConfig = EngineConfig::default();
        let raw: String = serde_json::to_string(&config).unwrap();
        let parsed: EngineConfig = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, config);
        parsed.validate().unwrap();
    }

    #[test]
    fn test_date_parsing_rejects_garbage() {
        assert!(parse_date("2026-06-15", "new_start_date").is_ok());
        assert!(parse_date("June 15th", "new_start_date").is_err());
    }
}
