//! Liveness and readiness probes

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

const SERVICE_NAME: &str = "booking-api";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Readiness report, returned with 503 when a dependency is down
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub database: &'static str,
    pub calendar_events: bool,
    pub hold_minutes: i64,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness probe: the booking flow needs Postgres for every write
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let database_up = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => true,
        Err(e) => {
            tracing::error!(error = ?e, "Database readiness check failed");
            false
        }
    };

    let (status, label, database) = if database_up {
        (StatusCode::OK, "ready", "connected")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable", "unreachable")
    };

    let booking = &state.config.booking;
    (
        status,
        Json(ReadyResponse {
            status: label,
            service: SERVICE_NAME,
            database,
            calendar_events: booking.calendar_events,
            hold_minutes: booking.hold_minutes,
        }),
    )
}
