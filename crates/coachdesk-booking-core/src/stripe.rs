//! Stripe payment provider implementation

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::config::StripeConfig;
use crate::error::BookingError;
use crate::provider::{
    CheckoutMetadata, CheckoutParams, CheckoutSession, CompletedCheckout, PaymentProvider,
    PaymentStatus,
};

/// Stripe payment provider
#[derive(Clone)]
pub struct StripeProvider {
    client: Client,
    config: StripeConfig,
}

impl StripeProvider {
    /// Create a new Stripe provider
    pub fn new(config: StripeConfig) -> Self {
        let client = Client::new();
        Self { client, config }
    }

    /// Make authenticated request to Stripe
    async fn stripe_request<T: for<'de> Deserialize<'de>>(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        form: Option<&[(String, String)]>,
    ) -> Result<T, BookingError> {
        let url = format!("{}{endpoint}", self.config.api_base);

        let mut request = self
            .client
            .request(method, &url)
            .basic_auth(&self.config.secret_key, Option::<&str>::None);

        if let Some(form_data) = form {
            request = request.form(form_data);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Stripe API request failed");
            BookingError::ProviderError(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Stripe API error");
            return Err(BookingError::ProviderError(format!(
                "Stripe API error: {status}"
            )));
        }

        response.json::<T>().await.map_err(|e| {
            error!(error = %e, "Failed to parse Stripe response");
            BookingError::ProviderError(format!("unexpected Stripe response: {e}"))
        })
    }
}

/// Form fields for a single-item payment-mode checkout
fn checkout_form(params: &CheckoutParams) -> Vec<(String, String)> {
    let mut form: Vec<(String, String)> = vec![
        ("mode".into(), "payment".into()),
        ("success_url".into(), params.success_url.clone()),
        ("cancel_url".into(), params.cancel_url.clone()),
        ("line_items[0][quantity]".into(), "1".into()),
        (
            "line_items[0][price_data][currency]".into(),
            params.currency.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]".into(),
            params.amount_cents.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".into(),
            params.product_name.clone(),
        ),
    ];

    if let Some(email) = &params.customer_email {
        form.push(("customer_email".into(), email.clone()));
    }
    if let Some(reference) = &params.client_reference_id {
        form.push(("client_reference_id".into(), reference.clone()));
    }
    for (key, value) in params.metadata.to_pairs() {
        form.push((format!("metadata[{key}]"), value));
    }

    form
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    #[instrument(skip(self, params), fields(product = %params.product_name))]
    async fn create_checkout_session(
        &self,
        params: &CheckoutParams,
    ) -> Result<CheckoutSession, BookingError> {
        debug!(amount = params.amount_cents, currency = %params.currency, "Creating checkout session");

        let form = checkout_form(params);
        let session: StripeCheckoutSession = self
            .stripe_request(reqwest::Method::POST, "/checkout/sessions", Some(&form))
            .await?;

        let url = session.url.ok_or_else(|| {
            BookingError::ProviderError("checkout session has no url".to_string())
        })?;

        Ok(CheckoutSession {
            session_id: session.id,
            url,
        })
    }

    #[instrument(skip(self))]
    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CompletedCheckout, BookingError> {
        debug!(session_id = %session_id, "Retrieving checkout session");

        let session: StripeCheckoutSession = self
            .stripe_request(
                reqwest::Method::GET,
                &format!("/checkout/sessions/{session_id}"),
                None,
            )
            .await?;

        Ok(session.into())
    }
}

// Stripe API response types

/// Stripe checkout session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeCheckoutSession {
    /// Session ID
    pub id: String,
    /// Checkout URL
    pub url: Option<String>,
    /// paid, unpaid or no_payment_required
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Email passed in at creation
    #[serde(default)]
    pub customer_email: Option<String>,
    /// Details the customer entered on the payment page
    #[serde(default)]
    pub customer_details: Option<StripeCustomerDetails>,
    /// Total in the smallest currency unit
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

/// Customer details on a checkout session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeCustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<StripeCheckoutSession> for CompletedCheckout {
    fn from(session: StripeCheckoutSession) -> Self {
        let metadata = session
            .metadata
            .as_ref()
            .map(CheckoutMetadata::from_map)
            .unwrap_or_default();

        // Stripe records what the customer typed in customer_details
        let customer_email = session
            .customer_details
            .and_then(|d| d.email)
            .or(session.customer_email);

        Self {
            session_id: session.id,
            payment_status: session
                .payment_status
                .as_deref()
                .map(PaymentStatus::from)
                .unwrap_or(PaymentStatus::Unpaid),
            customer_email,
            amount_total: session.amount_total,
            currency: session.currency,
            client_reference_id: session.client_reference_id,
            metadata,
        }
    }
}
