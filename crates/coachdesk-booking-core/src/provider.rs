//! Payment provider abstraction

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

use coachdesk_types::{
    format_time, parse_date, parse_time, BookingToken, ProductId, ReservationId, UserId,
};

use crate::BookingError;

/// Payment provider trait
///
/// Abstracts payment processing to allow different providers (Stripe, etc.)
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a hosted checkout session
    async fn create_checkout_session(
        &self,
        params: &CheckoutParams,
    ) -> Result<CheckoutSession, BookingError>;

    /// Fetch a checkout session's current state
    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CompletedCheckout, BookingError>;
}

/// Parameters for a one-off payment checkout
#[derive(Debug, Clone)]
pub struct CheckoutParams {
    pub product_name: String,
    pub amount_cents: i64,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: Option<String>,
    pub client_reference_id: Option<String>,
    pub metadata: CheckoutMetadata,
}

/// Checkout session response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider checkout session ID
    pub session_id: String,
    /// Hosted payment page to redirect the user to
    pub url: String,
}

/// Payment state of a checkout session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
    Other(String),
}

impl PaymentStatus {
    /// Whether funds are secured and the purchase can be fulfilled
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Paid | Self::NoPaymentRequired)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Paid => "paid",
            Self::Unpaid => "unpaid",
            Self::NoPaymentRequired => "no_payment_required",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for PaymentStatus {
    fn from(s: &str) -> Self {
        match s {
            "paid" => Self::Paid,
            "unpaid" => Self::Unpaid,
            "no_payment_required" => Self::NoPaymentRequired,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Checkout session as reported by the provider once the customer is done
#[derive(Debug, Clone)]
pub struct CompletedCheckout {
    pub session_id: String,
    pub payment_status: PaymentStatus,
    /// Email the customer entered on the payment page
    pub customer_email: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub client_reference_id: Option<String>,
    pub metadata: CheckoutMetadata,
}

impl CompletedCheckout {
    /// Exact reservation this payment is for: metadata first, then the
    /// client reference set at checkout
    pub fn reservation_id(&self) -> Option<ReservationId> {
        self.metadata.reservation_id.or_else(|| {
            self.client_reference_id
                .as_deref()
                .and_then(|s| ReservationId::parse(s).ok())
        })
    }
}

/// Booking details carried through the provider as opaque metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutMetadata {
    pub product_id: Option<ProductId>,
    pub reservation_id: Option<ReservationId>,
    pub booking_date: Option<NaiveDate>,
    pub booking_time: Option<NaiveTime>,
    pub duration_minutes: Option<u32>,
    pub user_id: Option<UserId>,
    pub booking_token: Option<BookingToken>,
}

impl CheckoutMetadata {
    /// Key/value pairs in the provider's metadata namespace
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(id) = self.product_id {
            pairs.push(("product_id", id.to_string()));
        }
        if let Some(id) = self.reservation_id {
            pairs.push(("reservation_id", id.to_string()));
        }
        if let Some(date) = self.booking_date {
            pairs.push(("booking_date", date.format("%Y-%m-%d").to_string()));
        }
        if let Some(time) = self.booking_time {
            pairs.push(("booking_time", format_time(time)));
        }
        if let Some(minutes) = self.duration_minutes {
            pairs.push(("duration_minutes", minutes.to_string()));
        }
        if let Some(id) = self.user_id {
            pairs.push(("user_id", id.to_string()));
        }
        if let Some(token) = &self.booking_token {
            pairs.push(("booking_token", token.to_string()));
        }
        pairs
    }

    /// Parse provider metadata. Unparseable values are dropped with a warning
    /// so that callers see them as missing.
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        fn field<T, E: std::fmt::Display>(
            map: &HashMap<String, String>,
            key: &str,
            parse: impl Fn(&str) -> Result<T, E>,
        ) -> Option<T> {
            let raw = map.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())?;
            match parse(raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(key, value = raw, error = %e, "Ignoring malformed checkout metadata");
                    None
                }
            }
        }

        Self {
            product_id: field(map, "product_id", ProductId::parse),
            reservation_id: field(map, "reservation_id", ReservationId::parse),
            booking_date: field(map, "booking_date", parse_date),
            booking_time: field(map, "booking_time", parse_time),
            duration_minutes: field(map, "duration_minutes", str::parse::<u32>),
            user_id: field(map, "user_id", UserId::parse),
            booking_token: map
                .get("booking_token")
                .filter(|v| !v.is_empty())
                .map(|v| BookingToken::new(v.clone())),
        }
    }
}
