//! Checkout handlers: session creation, status lookup and the success-page
//! callback

use std::time::Instant;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use coachdesk_booking_core::{CreateCheckout, NotificationResult};
use coachdesk_types::{ProductId, ReservationId, UserId};

use super::bookings::{BookingResponse, TransactionResponse};
use super::shared::{
    parse_date_field, parse_optional_uuid, parse_time_field, record_op_duration,
    validate_string_length,
};
use crate::error::ApiResult;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    pub product_id: Option<String>,
    pub reservation_id: Option<String>,
    pub booking_date: Option<String>,
    pub booking_time: Option<String>,
    pub duration_minutes: Option<u32>,
    pub user_id: Option<String>,
    pub customer_email: Option<String>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub success: bool,
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentCallbackRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub success: bool,
    pub session_id: String,
    pub payment_status: String,
    pub paid: bool,
    pub customer_email: Option<String>,
    pub transaction: Option<TransactionResponse>,
    pub booking: Option<BookingResponse>,
}

#[derive(Debug, Serialize)]
pub struct PaymentCallbackResponse {
    pub success: bool,
    pub session_id: String,
    pub already_confirmed: bool,
    pub transaction: TransactionResponse,
    pub booking: Option<BookingResponse>,
    pub notification: Option<NotificationResult>,
}

impl CreateCheckoutRequest {
    fn into_command(self) -> ApiResult<CreateCheckout> {
        for url in [&self.success_url, &self.cancel_url].into_iter().flatten() {
            validate_string_length(url, "redirect url")?;
        }

        Ok(CreateCheckout {
            product_id: parse_optional_uuid(self.product_id.as_deref(), "product_id")?
                .map(ProductId),
            reservation_id: parse_optional_uuid(self.reservation_id.as_deref(), "reservation_id")?
                .map(ReservationId),
            booking_date: self
                .booking_date
                .as_deref()
                .map(|d| parse_date_field(d, "booking_date"))
                .transpose()?,
            booking_time: self
                .booking_time
                .as_deref()
                .map(|t| parse_time_field(t, "booking_time"))
                .transpose()?,
            duration_minutes: self.duration_minutes,
            user_id: parse_optional_uuid(self.user_id.as_deref(), "user_id")?.map(UserId),
            customer_email: self.customer_email.filter(|e| !e.trim().is_empty()),
            success_url: self.success_url,
            cancel_url: self.cancel_url,
        })
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/checkout/session
#[instrument(skip(state, req))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Json(req): Json<CreateCheckoutRequest>,
) -> ApiResult<Json<CheckoutResponse>> {
    let start = Instant::now();

    let command = req.into_command()?;
    let result = state.booking.create_checkout(command).await;
    record_op_duration("create_checkout", start, result.is_ok());
    let session = result?;

    tracing::info!(session_id = %session.session_id, "Checkout session created");

    Ok(Json(CheckoutResponse {
        success: true,
        session_id: session.session_id,
        url: session.url,
    }))
}

/// GET /api/v1/checkout/verify-session
#[instrument(skip(state, query))]
pub async fn verify_session(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<SessionStatusResponse>> {
    let start = Instant::now();

    let result = state.booking.verify_session(&query.session_id).await;
    record_op_duration("verify_session", start, result.is_ok());
    let status = result?;

    Ok(Json(SessionStatusResponse {
        success: true,
        session_id: status.session_id,
        payment_status: status.payment_status,
        paid: status.paid,
        customer_email: status.customer_email,
        transaction: status.transaction.map(Into::into),
        booking: status.booking.map(Into::into),
    }))
}

/// POST /api/v1/checkout/payment-callback
///
/// Called by the success page. Confirms the session if the webhook has not
/// already; an unpaid session answers 200 with `success: false`.
#[instrument(skip(state, req))]
pub async fn payment_callback(
    State(state): State<AppState>,
    Json(req): Json<PaymentCallbackRequest>,
) -> ApiResult<Json<PaymentCallbackResponse>> {
    let start = Instant::now();

    let result = state.booking.payment_callback(&req.session_id).await;
    record_op_duration("payment_callback", start, result.is_ok());
    let confirmation = result?;

    Ok(Json(PaymentCallbackResponse {
        success: true,
        session_id: confirmation.session_id,
        already_confirmed: confirmation.already_confirmed,
        transaction: confirmation.transaction.into(),
        booking: confirmation.booking.map(Into::into),
        notification: confirmation.notification,
    }))
}
