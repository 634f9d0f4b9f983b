//! Configuration for the Booking API service.

use std::str::FromStr;
use std::time::Duration;

use chrono::FixedOffset;
use coachdesk_booking_core::{BookingConfig, MailerConfig, StripeConfig};

/// Booking API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Maximum pooled database connections
    pub database_max_connections: u32,
    /// Booking core configuration
    pub booking: BookingConfig,
    /// SMTP settings for confirmation emails
    pub mailer: MailerConfig,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        // Database
        let database_url = env.required("DATABASE_URL")?;
        let database_max_connections = env.parsed("DATABASE_MAX_CONNECTIONS", 10)?;

        let http_port = env.parsed("HTTP_PORT", 8080)?;

        // Stripe configuration
        let mut stripe = StripeConfig::new(
            env.required("STRIPE_SECRET_KEY")?,
            env.required("STRIPE_WEBHOOK_SECRET")?,
        );
        if let Some(api_base) = env.optional("STRIPE_API_BASE") {
            stripe = stripe.with_api_base(api_base);
        }
        stripe.webhook_tolerance_secs = env.parsed("STRIPE_WEBHOOK_TOLERANCE_SECS", 300)?;

        // Site and redirect URLs
        let site_url = env.required("SITE_URL")?;
        let site = site_url.trim_end_matches('/');
        let success_url = env
            .optional("CHECKOUT_SUCCESS_URL")
            .unwrap_or_else(|| format!("{site}/payment/success"));
        let cancel_url = env
            .optional("CHECKOUT_CANCEL_URL")
            .unwrap_or_else(|| format!("{site}/payment/cancel"));

        // Calendar
        let offset_minutes: i32 = env.parsed("BUSINESS_UTC_OFFSET_MINUTES", 0)?;
        let offset = FixedOffset::east_opt(offset_minutes * 60)
            .ok_or(ConfigError::Invalid("BUSINESS_UTC_OFFSET_MINUTES"))?;
        let hold_minutes: i64 = env.parsed("RESERVATION_HOLD_MINUTES", 15)?;
        let slot_interval: u32 = env.parsed("SLOT_INTERVAL_MINUTES", 30)?;
        if hold_minutes <= 0 {
            return Err(ConfigError::Invalid("RESERVATION_HOLD_MINUTES"));
        }
        if slot_interval == 0 {
            return Err(ConfigError::Invalid("SLOT_INTERVAL_MINUTES"));
        }

        let booking = BookingConfig::new(stripe)
            .with_site_url(&site_url)
            .with_urls(success_url, cancel_url)
            .with_currency(env.optional("CHECKOUT_CURRENCY").unwrap_or_else(|| "eur".into()))
            .with_slots(hold_minutes, slot_interval)
            .with_utc_offset(offset)
            .with_calendar_events(env.parsed("CALENDAR_EVENTS_ENABLED", true)?);

        // Email
        let mailer = MailerConfig {
            host: env.required("SMTP_HOST")?,
            port: env.parsed("SMTP_PORT", 587)?,
            username: env.optional("SMTP_USERNAME"),
            password: env.optional("SMTP_PASSWORD"),
            from: env.required("EMAIL_FROM")?,
            tls: env.parsed("SMTP_TLS", true)?,
        };

        let request_timeout_secs: u64 = env.parsed("REQUEST_TIMEOUT_SECS", 30)?;

        // Metrics
        let metrics_enabled = env.parsed("METRICS_ENABLED", true)?;

        Ok(Self {
            http_port,
            database_url,
            database_max_connections,
            booking,
            mailer,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
        })
    }
}

struct Env<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    fn parsed<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.optional(key) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
            None => Ok(default),
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
