//! Common test utilities for coachdesk-booking-core integration tests

#![allow(dead_code)]

pub mod mock_provider;
pub mod mock_repos;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use coachdesk_booking_core::{
    BookingConfig, BookingService, CompletedCheckout, FixedClock, Stores, StripeConfig,
    WebhookHandler,
};

#[allow(unused_imports)]
pub use mock_provider::{MockProvider, RecordingMailer};
#[allow(unused_imports)]
pub use mock_repos::MockStore;

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const SITE_URL: &str = "https://coach.example.org";

/// Tuesday morning before the scenario date
pub fn default_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 9, 8, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Booking service wired to in-memory fakes
pub struct TestEnv {
    pub store: Arc<MockStore>,
    pub provider: Arc<MockProvider>,
    pub mailer: Arc<RecordingMailer>,
    pub service: BookingService,
    pub now: DateTime<Utc>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::at(default_now())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        let store = Arc::new(MockStore::new());
        store.open_weekdays_nine_to_five();
        let provider = Arc::new(MockProvider::new());
        let mailer = Arc::new(RecordingMailer::new());

        Self {
            service: build_service(&store, &provider, &mailer, now, true),
            store,
            provider,
            mailer,
            now,
        }
    }

    /// Another service over the same fakes, with its clock at `now`
    pub fn service_at(&self, now: DateTime<Utc>) -> BookingService {
        build_service(&self.store, &self.provider, &self.mailer, now, true)
    }

    /// Same fakes, with calendar entries switched off
    pub fn without_calendar_events(mut self) -> Self {
        self.service = build_service(&self.store, &self.provider, &self.mailer, self.now, false);
        self
    }

    /// Signed webhook delivery for a checkout session event
    pub fn webhook(&self, event_type: &str, session: &CompletedCheckout) -> (Vec<u8>, String) {
        let session = session_json(session);
        let body = serde_json::json!({
            "id": format!("evt_{}", uuid::Uuid::new_v4().simple()),
            "type": event_type,
            "created": self.now.timestamp(),
            "data": { "object": session }
        })
        .to_string()
        .into_bytes();
        let signature = WebhookHandler::new(WEBHOOK_SECRET)
            .sign(&body, self.now.timestamp())
            .unwrap();
        (body, signature)
    }
}

fn build_service(
    store: &Arc<MockStore>,
    provider: &Arc<MockProvider>,
    mailer: &Arc<RecordingMailer>,
    now: DateTime<Utc>,
    calendar_events: bool,
) -> BookingService {
    let config = BookingConfig::new(StripeConfig::new("sk_test_123", WEBHOOK_SECRET))
        .with_site_url(SITE_URL)
        .with_urls(
            format!("{SITE_URL}/payment/success"),
            format!("{SITE_URL}/payment/cancel"),
        )
        .with_calendar_events(calendar_events);

    BookingService::new(
        Stores::shared(store.clone()),
        provider.clone(),
        mailer.clone(),
        config,
    )
    .with_clock(Arc::new(FixedClock(now)))
}

/// A session in the shape Stripe sends it
pub fn session_json(session: &CompletedCheckout) -> serde_json::Value {
    let metadata: serde_json::Map<String, serde_json::Value> = session
        .metadata
        .to_pairs()
        .into_iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v)))
        .collect();
    serde_json::json!({
        "id": session.session_id,
        "object": "checkout.session",
        "url": null,
        "payment_status": session.payment_status.as_str(),
        "customer_details": { "email": session.customer_email },
        "amount_total": session.amount_total,
        "currency": session.currency,
        "client_reference_id": session.client_reference_id,
        "metadata": metadata,
    })
}
