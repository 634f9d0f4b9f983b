//! CoachDesk Booking API
//!
//! REST service in front of the booking core.
//!
//! ## REST Endpoints
//!
//! - `GET /api/v1/availability` - Open start times for a product and date
//! - `POST /api/v1/reservations` - Hold a slot
//! - `GET /api/v1/reservations/{id}` - Reservation with its effective status
//! - `POST /api/v1/reservations/{id}/release` - Give a hold back
//! - `POST /api/v1/checkout/session` - Create a Stripe Checkout Session
//! - `GET /api/v1/checkout/verify-session` - Read-only payment status
//! - `POST /api/v1/checkout/payment-callback` - Success-page confirmation
//! - `GET /api/v1/bookings` - A user's bookings
//! - `POST /api/v1/bookings/link` - Attach guest purchases to an account
//! - `POST /webhooks/stripe` - Stripe webhook handler
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub use crate::config::{Config, ConfigError};
pub use crate::state::AppState;

/// Build the HTTP router with its middleware stack
pub fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    let api_v1 = Router::new()
        .route("/availability", get(handlers::get_availability))
        // Slot holds
        .route("/reservations", post(handlers::create_reservation))
        .route("/reservations/{id}", get(handlers::get_reservation))
        .route(
            "/reservations/{id}/release",
            post(handlers::release_reservation),
        )
        // Checkout
        .route("/checkout/session", post(handlers::create_checkout_session))
        .route("/checkout/verify-session", get(handlers::verify_session))
        .route("/checkout/payment-callback", post(handlers::payment_callback))
        // Customer bookings
        .route("/bookings", get(handlers::list_bookings))
        .route("/bookings/link", post(handlers::link_purchases));

    // Webhook route (separate - uses raw body, no JSON parsing)
    let webhook_routes = Router::new().route("/webhooks/stripe", post(handlers::stripe_webhook));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready));

    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Outermost first
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(webhook_routes)
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
        .with_state(state)
}
