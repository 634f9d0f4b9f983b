//! Availability handler

use std::time::Instant;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use coachdesk_types::{format_time, ProductId};

use super::shared::{parse_date_field, parse_uuid, record_op_duration};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: String,
    pub product_id: String,
    pub duration: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub success: bool,
    pub product_id: String,
    pub date: String,
    pub duration_minutes: u32,
    /// Start times as `HH:MM`
    pub slots: Vec<String>,
}

/// GET /api/v1/availability
#[instrument(skip(state, query), fields(date = %query.date))]
pub async fn get_availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> ApiResult<Json<AvailabilityResponse>> {
    let start = Instant::now();

    let product_id = ProductId(parse_uuid(&query.product_id, "product_id")?);
    let date = parse_date_field(&query.date, "date")?;

    let result = state
        .booking
        .availability(product_id, date, query.duration)
        .await;
    record_op_duration("availability", start, result.is_ok());
    let availability = result?;

    Ok(Json(AvailabilityResponse {
        success: true,
        product_id: availability.product_id.to_string(),
        date: availability.date.format("%Y-%m-%d").to_string(),
        duration_minutes: availability.duration_minutes,
        slots: availability.slots.into_iter().map(format_time).collect(),
    }))
}
