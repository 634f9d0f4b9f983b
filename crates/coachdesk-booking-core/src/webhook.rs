//! Stripe webhook handling

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, info, instrument, warn};

use crate::error::BookingError;
use crate::provider::CompletedCheckout;
use crate::stripe::StripeCheckoutSession;

/// Webhook event types we handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventType {
    /// Checkout session completed (may still be unpaid for delayed methods)
    CheckoutSessionCompleted,
    /// Delayed payment for a completed session succeeded
    CheckoutSessionAsyncPaymentSucceeded,
    /// Delayed payment for a completed session failed
    CheckoutSessionAsyncPaymentFailed,
    /// Session expired without payment
    CheckoutSessionExpired,
    /// Unknown event type
    Unknown(String),
}

impl From<&str> for WebhookEventType {
    fn from(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "checkout.session.async_payment_succeeded" => {
                Self::CheckoutSessionAsyncPaymentSucceeded
            }
            "checkout.session.async_payment_failed" => Self::CheckoutSessionAsyncPaymentFailed,
            "checkout.session.expired" => Self::CheckoutSessionExpired,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl WebhookEventType {
    fn carries_checkout_session(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

/// Parsed webhook event
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Event ID
    pub id: String,
    /// Event type
    pub event_type: WebhookEventType,
    /// Event data
    pub data: WebhookEventData,
    /// When the event was created (Unix timestamp)
    pub created: i64,
}

/// Webhook event data
#[derive(Debug, Clone)]
pub enum WebhookEventData {
    /// Checkout session object
    CheckoutSession(CompletedCheckout),
    /// Raw JSON for unknown events
    Raw(serde_json::Value),
}

/// Webhook handler for verifying and parsing Stripe events
#[derive(Clone)]
pub struct WebhookHandler {
    webhook_secret: String,
    tolerance_secs: i64,
}

impl WebhookHandler {
    /// Create a new webhook handler
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
            tolerance_secs: 300,
        }
    }

    /// Set the accepted signature age
    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Verify and parse a webhook payload
    #[instrument(skip(self, payload, signature))]
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, BookingError> {
        self.verify_and_parse_at(payload, signature, Utc::now().timestamp())
    }

    /// Verify and parse against an explicit current Unix time
    pub fn verify_and_parse_at(
        &self,
        payload: &[u8],
        signature: &str,
        now: i64,
    ) -> Result<WebhookEvent, BookingError> {
        self.verify_signature(payload, signature, now)?;

        let raw_event: RawStripeEvent = serde_json::from_slice(payload)
            .map_err(|e| BookingError::WebhookError(e.to_string()))?;

        debug!(event_id = %raw_event.id, event_type = %raw_event.event_type, "Parsed webhook event");

        let event_type = WebhookEventType::from(raw_event.event_type.as_str());
        let data = Self::parse_event_data(&event_type, raw_event.data.object)?;

        Ok(WebhookEvent {
            id: raw_event.id,
            event_type,
            data,
            created: raw_event.created,
        })
    }

    /// Compute the `Stripe-Signature` header for a payload, as Stripe would
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> Result<String, BookingError> {
        let mut mac = self.mac(timestamp)?;
        mac.update(payload);
        Ok(format!(
            "t={timestamp},v1={}",
            hex::encode(mac.finalize().into_bytes())
        ))
    }

    /// MAC primed with the `{timestamp}.` prefix of the signed payload
    fn mac(&self, timestamp: i64) -> Result<Hmac<Sha256>, BookingError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| BookingError::Internal("HMAC error".to_string()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        Ok(mac)
    }

    /// Verify Stripe webhook signature
    fn verify_signature(
        &self,
        payload: &[u8],
        signature: &str,
        now: i64,
    ) -> Result<(), BookingError> {
        // Header format: t=timestamp,v1=signature[,v1=signature...]
        let mut timestamp: Option<&str> = None;
        let mut candidates: Vec<&str> = Vec::new();

        for part in signature.split(',') {
            if let Some((key, value)) = part.trim().split_once('=') {
                match key {
                    "t" => timestamp = Some(value),
                    "v1" => candidates.push(value),
                    _ => {}
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            warn!("Missing timestamp in webhook signature");
            BookingError::WebhookError("Missing timestamp".to_string())
        })?;

        if candidates.is_empty() {
            warn!("Missing v1 signature in webhook signature");
            return Err(BookingError::WebhookError("Missing signature".to_string()));
        }

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| BookingError::WebhookError("Invalid timestamp format".to_string()))?;

        let mut mac = self.mac(ts)?;
        mac.update(payload);

        // verify_slice compares in constant time
        let matched = candidates.iter().any(|candidate| {
            hex::decode(candidate)
                .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
                .unwrap_or(false)
        });
        if !matched {
            warn!("Webhook signature verification failed");
            return Err(BookingError::WebhookError(
                "Signature verification failed".to_string(),
            ));
        }

        if (now - ts).abs() > self.tolerance_secs {
            warn!(timestamp = ts, now = now, "Webhook timestamp outside tolerance");
            return Err(BookingError::WebhookError("Timestamp too old".to_string()));
        }

        Ok(())
    }

    /// Parse event data based on type
    fn parse_event_data(
        event_type: &WebhookEventType,
        object: serde_json::Value,
    ) -> Result<WebhookEventData, BookingError> {
        if event_type.carries_checkout_session() {
            let session: StripeCheckoutSession = serde_json::from_value(object)
                .map_err(|e| BookingError::WebhookError(e.to_string()))?;
            return Ok(WebhookEventData::CheckoutSession(session.into()));
        }

        info!("Received unknown webhook event type");
        Ok(WebhookEventData::Raw(object))
    }
}

// Raw Stripe event for parsing
#[derive(Debug, Deserialize)]
struct RawStripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
    created: i64,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}
