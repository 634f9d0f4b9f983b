//! Customer booking handlers

use std::time::Instant;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use coachdesk_types::{format_time, Booking, Transaction, UserId};

use super::shared::{parse_uuid, record_op_duration, validate_string_length};
use crate::error::ApiResult;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    pub user_id: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListBookingsResponse {
    pub success: bool,
    pub bookings: Vec<BookingResponse>,
}

#[derive(Debug, Deserialize)]
pub struct LinkPurchasesRequest {
    pub booking_token: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct LinkPurchasesResponse {
    pub success: bool,
    pub transactions_linked: u64,
    pub bookings_linked: u64,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub product_id: String,
    pub customer_email: String,
    pub booking_date: String,
    pub booking_time: String,
    pub duration_minutes: u32,
    pub timezone: Option<String>,
    pub status: String,
    pub reservation_id: String,
    pub transaction_id: String,
    pub created_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id.to_string(),
            product_id: b.product_id.to_string(),
            customer_email: b.customer_email,
            booking_date: b.booking_date.format("%Y-%m-%d").to_string(),
            booking_time: format_time(b.booking_time),
            duration_minutes: b.duration_minutes,
            timezone: b.timezone,
            status: b.status.as_str().to_string(),
            reservation_id: b.reservation_id.to_string(),
            transaction_id: b.transaction_id.to_string(),
            created_at: b.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: String,
    pub product_id: String,
    pub customer_email: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: String,
    pub booking_token: Option<String>,
    pub created_at: String,
}

impl From<Transaction> for TransactionResponse {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id.to_string(),
            product_id: t.product_id.to_string(),
            customer_email: t.customer_email,
            amount_cents: t.amount_cents,
            currency: t.currency,
            status: t.status.as_str().to_string(),
            booking_token: t.booking_token.map(|token| token.to_string()),
            created_at: t.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/bookings
#[instrument(skip(state, query), fields(user_id = %query.user_id))]
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<ListBookingsQuery>,
) -> ApiResult<Json<ListBookingsResponse>> {
    let start = Instant::now();

    let user_id = UserId(parse_uuid(&query.user_id, "user_id")?);

    let result = state.booking.list_bookings(user_id, query.limit).await;
    record_op_duration("list_bookings", start, result.is_ok());

    Ok(Json(ListBookingsResponse {
        success: true,
        bookings: result?.into_iter().map(BookingResponse::from).collect(),
    }))
}

/// POST /api/v1/bookings/link
#[instrument(skip(state, req), fields(user_id = %req.user_id))]
pub async fn link_purchases(
    State(state): State<AppState>,
    Json(req): Json<LinkPurchasesRequest>,
) -> ApiResult<Json<LinkPurchasesResponse>> {
    let start = Instant::now();

    let user_id = UserId(parse_uuid(&req.user_id, "user_id")?);
    validate_string_length(&req.booking_token, "booking_token")?;

    let result = state
        .booking
        .link_purchases(&req.booking_token, user_id)
        .await;
    record_op_duration("link_purchases", start, result.is_ok());
    let linked = result?;

    Ok(Json(LinkPurchasesResponse {
        success: true,
        transactions_linked: linked.transactions,
        bookings_linked: linked.bookings,
    }))
}
