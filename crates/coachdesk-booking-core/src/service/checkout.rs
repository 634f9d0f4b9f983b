//! Checkout session creation

use chrono::{NaiveDate, NaiveTime};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use coachdesk_db::CreateTransaction;
use coachdesk_types::{BookingToken, ProductId, ReservationId, ReservationStatus, UserId};

use super::BookingService;
use crate::error::BookingError;
use crate::notify::{validate_email, NotifyError};
use crate::provider::{CheckoutMetadata, CheckoutParams, CheckoutSession};

/// Stripe replaces this with the real session ID on redirect
const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Create checkout request
#[derive(Debug, Clone, Default)]
pub struct CreateCheckout {
    pub product_id: Option<ProductId>,
    /// Required for coaching products
    pub reservation_id: Option<ReservationId>,
    /// When given, must match the reservation
    pub booking_date: Option<NaiveDate>,
    pub booking_time: Option<NaiveTime>,
    pub duration_minutes: Option<u32>,
    pub user_id: Option<UserId>,
    pub customer_email: Option<String>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

impl BookingService {
    /// Create a Stripe Checkout Session and record a pending transaction
    #[instrument(skip(self, request), fields(product_id = ?request.product_id))]
    pub async fn create_checkout(
        &self,
        request: CreateCheckout,
    ) -> Result<CheckoutSession, BookingError> {
        let product_id = request
            .product_id
            .ok_or_else(|| BookingError::Validation("product_id is required".to_string()))?;
        let product = self.product(product_id).await?;
        if !product.active {
            return Err(BookingError::Validation(
                "product is not available for purchase".to_string(),
            ));
        }

        let customer_email = self.prefill_email(request.customer_email.as_deref())?;
        let success_url = self.redirect_url(request.success_url, &self.config.default_success_url)?;
        let success_url = with_session_id(&success_url);
        let cancel_url = self.redirect_url(request.cancel_url, &self.config.default_cancel_url)?;

        let mut metadata = CheckoutMetadata {
            product_id: Some(product.id),
            user_id: request.user_id,
            ..Default::default()
        };
        let mut client_reference_id = None;
        let mut booking_timestamp = None;

        if product.product_type.requires_slot() {
            let reservation_id = request.reservation_id.ok_or_else(|| {
                BookingError::Validation(
                    "reservation_id is required for coaching products".to_string(),
                )
            })?;
            let reservation = self.find_reservation(reservation_id).await?;

            if reservation.product_id != product.id {
                return Err(BookingError::ReservationConflict(
                    "reservation belongs to another product".to_string(),
                ));
            }
            match reservation.effective_status(self.now()) {
                ReservationStatus::Pending => {}
                ReservationStatus::Expired => return Err(BookingError::ReservationExpired),
                other => return Err(BookingError::ReservationNotPending(other)),
            }

            let mismatch = request.booking_date.is_some_and(|d| d != reservation.booking_date)
                || request.booking_time.is_some_and(|t| t != reservation.booking_time)
                || request
                    .duration_minutes
                    .is_some_and(|m| m != reservation.duration_minutes);
            if mismatch {
                return Err(BookingError::ReservationConflict(
                    "slot details do not match the reservation".to_string(),
                ));
            }

            metadata.reservation_id = Some(reservation.id);
            metadata.booking_date = Some(reservation.booking_date);
            metadata.booking_time = Some(reservation.booking_time);
            metadata.duration_minutes = Some(reservation.duration_minutes);
            metadata.booking_token = Some(reservation.booking_token.clone());
            client_reference_id = Some(reservation.id.to_string());
            booking_timestamp = self.to_utc(reservation.window().start);
        } else {
            metadata.booking_token = Some(BookingToken::generate());
        }

        let params = CheckoutParams {
            product_name: product.name.clone(),
            amount_cents: product.price_cents,
            currency: self.config.currency.clone(),
            success_url,
            cancel_url,
            customer_email: customer_email.clone(),
            client_reference_id,
            metadata: metadata.clone(),
        };

        let session = self
            .provider
            .create_checkout_session(&params)
            .await
            .inspect_err(|e| error!(error = %e, "Checkout session creation failed"))?;

        let recorded = self
            .stores
            .transactions
            .insert_if_absent(CreateTransaction {
                id: Uuid::new_v4(),
                stripe_session_id: session.session_id.clone(),
                customer_email: customer_email.unwrap_or_default(),
                product_id: product.id.0,
                amount_cents: product.price_cents,
                currency: self.config.currency.clone(),
                user_id: request.user_id.map(|u| u.0),
                booking_token: metadata.booking_token.map(|t| t.0),
                booking_timestamp,
            })
            .await;
        if let Err(e) = recorded {
            // The confirmer rebuilds the row from the session
            warn!(session_id = %session.session_id, error = %e, "Failed to record pending transaction");
        }

        metrics::counter!(
            "booking_checkout_sessions_total",
            "product_type" => product.product_type.as_str()
        )
        .increment(1);
        info!(session_id = %session.session_id, "Checkout session created");

        Ok(session)
    }

    /// Address to prefill on the payment page. Placeholder addresses are
    /// dropped; malformed ones are rejected.
    fn prefill_email(&self, raw: Option<&str>) -> Result<Option<String>, BookingError> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        match validate_email(raw) {
            Ok(email) => Ok(Some(email)),
            Err(NotifyError::DenyListed(_)) => Ok(None),
            Err(e) => Err(BookingError::Validation(e.to_string())),
        }
    }

    /// Client-supplied redirect, which must stay on the site
    fn redirect_url(&self, requested: Option<String>, default: &str) -> Result<String, BookingError> {
        match requested.filter(|u| !u.trim().is_empty()) {
            None => Ok(default.to_string()),
            Some(url) => {
                let site = self.config.site_url.as_str();
                let on_site = url == site
                    || url
                        .strip_prefix(site)
                        .is_some_and(|rest| rest.starts_with(['/', '?', '#']));
                if on_site {
                    Ok(url)
                } else {
                    Err(BookingError::Validation(
                        "redirect url must point to the site".to_string(),
                    ))
                }
            }
        }
    }
}

fn with_session_id(url: &str) -> String {
    if url.contains(SESSION_ID_PLACEHOLDER) {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}session_id={SESSION_ID_PLACEHOLDER}")
}
