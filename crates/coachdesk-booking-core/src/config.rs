//! Booking configuration

use chrono::{FixedOffset, Offset, Utc};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Stripe credentials and endpoints
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Stripe secret key
    pub secret_key: String,
    /// Stripe webhook signing secret
    pub webhook_secret: String,
    /// REST API base URL (overridable for tests)
    pub api_base: String,
    /// Maximum accepted age of a webhook signature, in seconds
    pub webhook_tolerance_secs: i64,
}

impl StripeConfig {
    /// Create a new Stripe config
    pub fn new(secret_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            webhook_secret: webhook_secret.into(),
            api_base: STRIPE_API_BASE.to_string(),
            webhook_tolerance_secs: 300,
        }
    }

    /// Point the client at a different API base
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

/// Booking service configuration
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Stripe configuration
    pub stripe: StripeConfig,
    /// ISO currency for checkout line items
    pub currency: String,
    /// Public site origin; redirect URLs must live under it
    pub site_url: String,
    /// Default success URL for checkout
    pub default_success_url: String,
    /// Default cancel URL for checkout
    pub default_cancel_url: String,
    /// How long a reservation holds its slot
    pub hold_minutes: i64,
    /// Grid on which slot start times are offered
    pub slot_interval_minutes: u32,
    /// Longest bookable session
    pub max_duration_minutes: u32,
    /// Offset of the business's local time from UTC
    pub business_utc_offset: FixedOffset,
    /// Create a calendar entry for each confirmed booking
    pub calendar_events: bool,
}

impl BookingConfig {
    /// Create a new booking config with defaults
    pub fn new(stripe: StripeConfig) -> Self {
        Self {
            stripe,
            currency: "eur".to_string(),
            site_url: "http://localhost:3000".to_string(),
            default_success_url: "http://localhost:3000/payment/success".to_string(),
            default_cancel_url: "http://localhost:3000/payment/cancel".to_string(),
            hold_minutes: 15,
            slot_interval_minutes: 30,
            max_duration_minutes: 480,
            business_utc_offset: Utc.fix(),
            calendar_events: true,
        }
    }

    /// Set the site origin
    pub fn with_site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = site_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set default URLs
    pub fn with_urls(
        mut self,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> Self {
        self.default_success_url = success_url.into();
        self.default_cancel_url = cancel_url.into();
        self
    }

    /// Set checkout currency
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into().to_lowercase();
        self
    }

    /// Set hold length and slot grid
    pub fn with_slots(mut self, hold_minutes: i64, slot_interval_minutes: u32) -> Self {
        self.hold_minutes = hold_minutes;
        self.slot_interval_minutes = slot_interval_minutes.max(1);
        self
    }

    /// Set the business's UTC offset
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.business_utc_offset = offset;
        self
    }

    /// Enable or disable calendar entries
    pub fn with_calendar_events(mut self, enabled: bool) -> Self {
        self.calendar_events = enabled;
        self
    }
}
