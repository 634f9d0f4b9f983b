//! CoachDesk Booking API server

use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use booking_api::{build_router, AppState, Config};
use coachdesk_booking_core::{BookingService, SmtpMailer, Stores, StripeProvider};
use coachdesk_db::{PoolOptions, Repositories};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("booking_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CoachDesk Booking API");

    let config = Config::from_env()?;
    tracing::info!(
        http_port = config.http_port,
        site_url = %config.booking.site_url,
        hold_minutes = config.booking.hold_minutes,
        "Configuration loaded"
    );

    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    let pool = coachdesk_db::create_pool_with_options(
        &config.database_url,
        &PoolOptions {
            max_connections: config.database_max_connections,
            ..PoolOptions::default()
        },
    )
    .await?;
    coachdesk_db::run_migrations(&pool).await?;
    tracing::info!("Database pool created and migrations applied");

    let repos = Repositories::new(pool.clone());
    let provider = Arc::new(StripeProvider::new(config.booking.stripe.clone()));
    let mailer = Arc::new(SmtpMailer::new(&config.mailer)?);
    let booking = BookingService::new(
        Stores::from(repos),
        provider,
        mailer,
        config.booking.clone(),
    );

    let http_addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let state = AppState::new(booking, pool, config);
    let app = build_router(state, metrics_handle);

    tracing::info!("HTTP server listening on {}", http_addr);
    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Every counter the booking core and handlers emit
const COUNTERS: &[(&str, &str)] = &[
    ("booking_reservations_created_total", "Total slot holds created"),
    (
        "booking_reservations_released_total",
        "Total slot holds released before payment",
    ),
    (
        "booking_checkout_sessions_total",
        "Total checkout sessions created by product type",
    ),
    (
        "booking_confirmations_total",
        "Total confirmations by source and result",
    ),
    (
        "booking_double_bookings_total",
        "Confirmed bookings that overlap another confirmed booking",
    ),
    (
        "booking_notifications_total",
        "Confirmation emails by template and outcome",
    ),
    (
        "booking_webhooks_processed_total",
        "Total webhooks processed by status",
    ),
];

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Stripe round trips dominate; most requests finish well under a second
    let latency_buckets = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("booking_operation_duration_seconds".to_string()),
            latency_buckets,
        )?
        .install_recorder()?;

    for (name, help) in COUNTERS {
        metrics::describe_counter!(*name, *help);
    }
    metrics::describe_histogram!(
        "booking_operation_duration_seconds",
        "Booking API operation latency in seconds by operation type"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = ?e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = ?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
