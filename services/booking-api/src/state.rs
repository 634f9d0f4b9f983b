//! Application state for the Booking API service.

use std::sync::Arc;

use coachdesk_booking_core::BookingService;
use coachdesk_db::DbPool;

use crate::config::Config;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Booking service (availability, holds, checkout, confirmation)
    pub booking: Arc<BookingService>,
    /// Database pool, used by the readiness probe
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(booking: BookingService, pool: DbPool, config: Config) -> Self {
        Self {
            booking: Arc::new(booking),
            pool,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
