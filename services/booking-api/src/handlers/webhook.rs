//! Stripe webhook handler

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use coachdesk_booking_core::{BookingError, WebhookOutcome};

use super::shared::record_op_duration;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub outcome: &'static str,
}

/// POST /webhooks/stripe
///
/// Verifies the signature, then confirms paid checkout sessions. Permanent
/// failures are acknowledged so Stripe stops redelivering them; transient
/// ones return 500 so it retries.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    let start = Instant::now();

    let Some(sig_header) = headers.get("stripe-signature") else {
        tracing::warn!("Missing Stripe-Signature header");
        return Err(ApiError::WebhookError("missing Stripe-Signature header".into()));
    };

    let Ok(signature) = sig_header.to_str() else {
        tracing::warn!("Invalid Stripe-Signature header encoding");
        return Err(ApiError::WebhookError("invalid Stripe-Signature header".into()));
    };

    let result = state.booking.process_webhook(&body, signature).await;
    record_op_duration("process_webhook", start, result.is_ok());

    let outcome = match result {
        Ok(WebhookOutcome::Confirmed(_)) => "confirmed",
        Ok(WebhookOutcome::AwaitingPayment { .. }) => "awaiting_payment",
        Ok(WebhookOutcome::Ignored { .. }) => "ignored",
        Err(e @ BookingError::WebhookError(_)) => {
            tracing::warn!(error = %e, "Rejected webhook delivery");
            record_webhook("invalid");
            return Err(e.into());
        }
        Err(e) if e.is_permanent() => {
            tracing::warn!(error = %e, "Webhook cannot be processed, acknowledging");
            "rejected"
        }
        Err(e) => {
            let status = failure_status(&e);
            tracing::error!(error = ?e, status, "Webhook processing failed");
            record_webhook(status);
            return Err(e.into());
        }
    };

    record_webhook(outcome);
    Ok(Json(WebhookAck {
        received: true,
        outcome,
    }))
}

/// Metric label for a delivery Stripe will retry
fn failure_status(e: &BookingError) -> &'static str {
    if e.is_provider_error() {
        "provider_error"
    } else {
        "error"
    }
}

fn record_webhook(status: &'static str) {
    metrics::counter!("booking_webhooks_processed_total", "status" => status).increment(1);
}
