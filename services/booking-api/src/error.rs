//! Error types for the Booking API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use coachdesk_booking_core::BookingError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Webhook error: {0}")]
    WebhookError(String),

    #[error(transparent)]
    Booking(#[from] BookingError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::WebhookError(_) => StatusCode::BAD_REQUEST,
            Self::Booking(e) => booking_status(e),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::WebhookError(_) => "WEBHOOK_ERROR",
            Self::Booking(e) => booking_code(e),
        }
    }

    fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }
}

fn booking_status(e: &BookingError) -> StatusCode {
    match e {
        BookingError::Validation(_) | BookingError::WebhookError(_) => StatusCode::BAD_REQUEST,
        // The customer's browser is told payment is pending, not that it failed
        BookingError::PaymentNotCompleted(_) => StatusCode::OK,
        e if e.is_not_found() => StatusCode::NOT_FOUND,
        e if e.is_conflict() => StatusCode::CONFLICT,
        BookingError::MissingMetadata(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn booking_code(e: &BookingError) -> &'static str {
    match e {
        BookingError::ProductNotFound => "PRODUCT_NOT_FOUND",
        BookingError::ReservationNotFound => "RESERVATION_NOT_FOUND",
        BookingError::TransactionNotFound => "TRANSACTION_NOT_FOUND",
        BookingError::BookingTokenNotFound => "BOOKING_TOKEN_NOT_FOUND",
        BookingError::Validation(_) => "VALIDATION_ERROR",
        BookingError::SlotUnavailable => "SLOT_UNAVAILABLE",
        BookingError::ReservationExpired => "RESERVATION_EXPIRED",
        BookingError::ReservationNotPending(_) => "RESERVATION_NOT_PENDING",
        BookingError::ReservationConflict(_) => "RESERVATION_CONFLICT",
        BookingError::MissingMetadata(_) => "MISSING_METADATA",
        BookingError::PaymentNotCompleted(_) => "PAYMENT_NOT_COMPLETED",
        BookingError::WebhookError(_) => "WEBHOOK_ERROR",
        BookingError::ProviderError(_) => "PAYMENT_PROVIDER_ERROR",
        BookingError::Database(_) | BookingError::Internal(_) => "INTERNAL_ERROR",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Internal details stay in the logs
        let message = if self.is_internal() {
            tracing::error!(error = ?self, "Internal API error");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
