//! Reservation (slot hold) handlers

use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use coachdesk_booking_core::ReserveSlot;
use coachdesk_types::{format_time, ProductId, Reservation, ReservationId};

use super::shared::{
    parse_date_field, parse_time_field, parse_uuid, record_op_duration, validate_string_length,
};
use crate::error::ApiResult;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ReserveSlotRequest {
    pub product_id: String,
    pub booking_date: String,
    pub booking_time: String,
    pub duration_minutes: Option<u32>,
    pub timezone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    pub success: bool,
    pub id: String,
    pub product_id: String,
    pub booking_date: String,
    pub booking_time: String,
    pub duration_minutes: u32,
    pub timezone: Option<String>,
    pub status: String,
    pub booking_token: String,
    pub expires_at: String,
}

impl From<Reservation> for ReservationResponse {
    fn from(r: Reservation) -> Self {
        Self {
            success: true,
            id: r.id.to_string(),
            product_id: r.product_id.to_string(),
            booking_date: r.booking_date.format("%Y-%m-%d").to_string(),
            booking_time: format_time(r.booking_time),
            duration_minutes: r.duration_minutes,
            timezone: r.timezone,
            status: r.status.as_str().to_string(),
            booking_token: r.booking_token.to_string(),
            expires_at: r.expires_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/reservations
#[instrument(skip(state, req), fields(booking_date = %req.booking_date, booking_time = %req.booking_time))]
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(req): Json<ReserveSlotRequest>,
) -> ApiResult<(StatusCode, Json<ReservationResponse>)> {
    let start = Instant::now();

    let timezone = req
        .timezone
        .map(|tz| tz.trim().to_string())
        .filter(|tz| !tz.is_empty());
    if let Some(tz) = &timezone {
        validate_string_length(tz, "timezone")?;
    }

    let request = ReserveSlot {
        product_id: ProductId(parse_uuid(&req.product_id, "product_id")?),
        booking_date: parse_date_field(&req.booking_date, "booking_date")?,
        booking_time: parse_time_field(&req.booking_time, "booking_time")?,
        duration_minutes: req.duration_minutes,
        timezone,
    };

    let result = state.booking.reserve_slot(request).await;
    record_op_duration("reserve_slot", start, result.is_ok());
    let reservation = result?;

    tracing::info!(reservation_id = %reservation.id, "Slot reserved");

    Ok((StatusCode::CREATED, Json(reservation.into())))
}

/// GET /api/v1/reservations/{id}
#[instrument(skip(state))]
pub async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ReservationResponse>> {
    let start = Instant::now();

    let result = state.booking.get_reservation(ReservationId(id)).await;
    record_op_duration("get_reservation", start, result.is_ok());

    Ok(Json(result?.into()))
}

/// POST /api/v1/reservations/{id}/release
#[instrument(skip(state))]
pub async fn release_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ReservationResponse>> {
    let start = Instant::now();

    let result = state.booking.release_reservation(ReservationId(id)).await;
    record_op_duration("release_reservation", start, result.is_ok());

    Ok(Json(result?.into()))
}
