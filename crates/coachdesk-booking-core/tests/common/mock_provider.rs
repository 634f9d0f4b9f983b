//! Fake payment provider and mailer

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;

use coachdesk_booking_core::{
    BookingError, CheckoutParams, CheckoutSession, CompletedCheckout, Mailer, NotifyError,
    OutgoingEmail, PaymentProvider, PaymentStatus,
};

/// Payment provider that keeps sessions in memory
#[derive(Default)]
pub struct MockProvider {
    sessions: DashMap<String, CompletedCheckout>,
    created: Mutex<Vec<CheckoutParams>>,
    counter: AtomicUsize,
    fail: AtomicBool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail like a Stripe outage
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Simulate the customer paying on the hosted page
    pub fn pay(&self, session_id: &str, email: Option<&str>) -> CompletedCheckout {
        let mut session = self.sessions.get_mut(session_id).expect("unknown session");
        session.payment_status = PaymentStatus::Paid;
        if let Some(email) = email {
            session.customer_email = Some(email.to_string());
        }
        session.value().clone()
    }

    pub fn session(&self, session_id: &str) -> Option<CompletedCheckout> {
        self.sessions.get(session_id).map(|s| s.value().clone())
    }

    /// Register a session that did not go through create_checkout_session
    pub fn insert(&self, session: CompletedCheckout) {
        self.sessions.insert(session.session_id.clone(), session);
    }

    pub fn last_params(&self) -> Option<CheckoutParams> {
        self.created.lock().unwrap().last().cloned()
    }

    fn check_failing(&self) -> Result<(), BookingError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BookingError::ProviderError("Stripe API error: 503".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentProvider for MockProvider {
    async fn create_checkout_session(
        &self,
        params: &CheckoutParams,
    ) -> Result<CheckoutSession, BookingError> {
        self.check_failing()?;
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let session_id = format!("cs_test_{n}");

        self.sessions.insert(
            session_id.clone(),
            CompletedCheckout {
                session_id: session_id.clone(),
                payment_status: PaymentStatus::Unpaid,
                customer_email: params.customer_email.clone(),
                amount_total: Some(params.amount_cents),
                currency: Some(params.currency.clone()),
                client_reference_id: params.client_reference_id.clone(),
                metadata: params.metadata.clone(),
            },
        );
        self.created.lock().unwrap().push(params.clone());

        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.test/c/pay/{session_id}"),
            session_id,
        })
    }

    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CompletedCheckout, BookingError> {
        self.check_failing()?;
        self.session(session_id)
            .ok_or_else(|| BookingError::ProviderError("No such checkout.session".to_string()))
    }
}

/// Mailer that records what it would have sent
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Transport("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}
