//! Payment confirmation
//!
//! [`BookingService::confirm_checkout`] is the single place a paid Checkout
//! Session becomes a completed transaction (and, for coaching products, a
//! booking). It is keyed by the session ID and safe to call any number of
//! times from either trigger: unique constraints on the session ID and the
//! booking's transaction ID, together with the reservation row lock, make
//! every call after the first observe the existing result.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use coachdesk_db::{ConfirmOutcome, ConfirmReservation, CreateTransaction, DbError, TransactionRow};
use coachdesk_types::{format_time, Booking, Product, Reservation, Transaction};

use super::BookingService;
use crate::error::BookingError;
use crate::notify::{NotificationResult, RecipientCandidates};
use crate::provider::CompletedCheckout;
use crate::template::{BOOKING_CONFIRMATION, PURCHASE_CONFIRMATION};
use crate::webhook::{WebhookEventData, WebhookEventType};

/// What triggered a confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmSource {
    Webhook,
    Callback,
}

impl ConfirmSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Webhook => "webhook",
            Self::Callback => "callback",
        }
    }
}

/// Result of confirming a paid session
#[derive(Debug, Clone, Serialize)]
pub struct Confirmation {
    pub session_id: String,
    pub transaction: Transaction,
    /// Present for coaching products
    pub booking: Option<Booking>,
    /// An earlier call already confirmed this session
    pub already_confirmed: bool,
    /// Set only by the call that confirmed the session
    pub notification: Option<NotificationResult>,
}

/// Outcome of a verified webhook delivery
#[derive(Debug, Clone)]
pub enum WebhookOutcome {
    /// The session was (or already had been) confirmed
    Confirmed(Box<Confirmation>),
    /// Session completed with a delayed payment method that has not settled
    AwaitingPayment { session_id: String },
    /// Event type we do not act on
    Ignored { event_type: String },
}

/// Read-only view of a checkout session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session_id: String,
    pub payment_status: String,
    pub paid: bool,
    pub customer_email: Option<String>,
    pub transaction: Option<Transaction>,
    pub booking: Option<Booking>,
}

impl BookingService {
    /// Confirm a paid checkout session. Idempotent per session ID.
    #[instrument(skip(self, checkout), fields(session_id = %checkout.session_id, source = source.as_str()))]
    pub async fn confirm_checkout(
        &self,
        checkout: &CompletedCheckout,
        source: ConfirmSource,
    ) -> Result<Confirmation, BookingError> {
        if !checkout.payment_status.is_settled() {
            return Err(BookingError::PaymentNotCompleted(
                checkout.payment_status.as_str().to_string(),
            ));
        }

        let product_id = checkout
            .metadata
            .product_id
            .ok_or(BookingError::MissingMetadata("product_id"))?;
        let product = self.product(product_id).await?;
        let transaction = self.transaction_for(checkout, &product).await?;

        let result = if product.product_type.requires_slot() {
            self.confirm_booking(checkout, &product, transaction).await
        } else {
            self.confirm_purchase(checkout, &product, transaction).await
        };

        let label = match &result {
            Ok(c) if c.already_confirmed => "already_confirmed",
            Ok(_) => "confirmed",
            Err(_) => "error",
        };
        metrics::counter!(
            "booking_confirmations_total",
            "source" => source.as_str(),
            "result" => label
        )
        .increment(1);

        result
    }

    /// Transaction recorded at checkout, or one rebuilt from the session
    async fn transaction_for(
        &self,
        checkout: &CompletedCheckout,
        product: &Product,
    ) -> Result<TransactionRow, BookingError> {
        if let Some(row) = self
            .stores
            .transactions
            .find_by_session_id(&checkout.session_id)
            .await?
        {
            return Ok(row);
        }

        warn!("No transaction recorded for session, creating it");
        let metadata = &checkout.metadata;
        let booking_timestamp = metadata
            .booking_date
            .zip(metadata.booking_time)
            .and_then(|(date, time)| self.to_utc(date.and_time(time)));

        let row = self
            .stores
            .transactions
            .insert_if_absent(CreateTransaction {
                id: Uuid::new_v4(),
                stripe_session_id: checkout.session_id.clone(),
                customer_email: checkout.customer_email.clone().unwrap_or_default(),
                product_id: product.id.0,
                amount_cents: checkout.amount_total.unwrap_or(product.price_cents),
                currency: checkout
                    .currency
                    .clone()
                    .unwrap_or_else(|| self.config.currency.clone()),
                user_id: metadata.user_id.map(|u| u.0),
                booking_token: metadata.booking_token.as_ref().map(|t| t.0.clone()),
                booking_timestamp,
            })
            .await?;
        Ok(row)
    }

    async fn reload_transaction(&self, id: Uuid) -> Result<Transaction, BookingError> {
        let row = self
            .stores
            .transactions
            .find_by_id(id)
            .await?
            .ok_or(BookingError::TransactionNotFound)?;
        Ok(Transaction::try_from(row)?)
    }

    async fn confirm_purchase(
        &self,
        checkout: &CompletedCheckout,
        product: &Product,
        transaction: TransactionRow,
    ) -> Result<Confirmation, BookingError> {
        let flipped = self.stores.transactions.mark_completed(transaction.id).await?;
        let transaction = self.reload_transaction(transaction.id).await?;

        let notification = if flipped {
            info!(transaction_id = %transaction.id, "Purchase completed");
            let vars = self.purchase_vars(product, &transaction);
            Some(
                self.notify(PURCHASE_CONFIRMATION, checkout, &transaction, vars)
                    .await,
            )
        } else {
            info!(transaction_id = %transaction.id, "Purchase already completed");
            None
        };

        Ok(Confirmation {
            session_id: checkout.session_id.clone(),
            transaction,
            booking: None,
            already_confirmed: !flipped,
            notification,
        })
    }

    async fn confirm_booking(
        &self,
        checkout: &CompletedCheckout,
        product: &Product,
        transaction: TransactionRow,
    ) -> Result<Confirmation, BookingError> {
        let reservation_id = checkout.reservation_id().ok_or_else(|| {
            error!("Paid coaching session carries no reservation_id");
            BookingError::MissingMetadata("reservation_id")
        })?;

        let customer_email = checkout
            .customer_email
            .clone()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| transaction.customer_email.clone());
        let calendar_title = self
            .config
            .calendar_events
            .then(|| format!("{}: {}", product.name, customer_email));

        let outcome = self
            .stores
            .bookings
            .confirm_reservation(ConfirmReservation {
                transaction_id: transaction.id,
                reservation_id: reservation_id.0,
                product_id: product.id.0,
                customer_email,
                user_id: transaction
                    .user_id
                    .or(checkout.metadata.user_id.map(|u| u.0)),
                calendar_title,
            })
            .await
            .map_err(|e| match e {
                DbError::NotFound => BookingError::ReservationNotFound,
                DbError::Conflict(msg) => BookingError::ReservationConflict(msg),
                other => BookingError::Database(other),
            })?;

        let (booking, already_confirmed, reservation) = match outcome {
            ConfirmOutcome::Created {
                booking,
                reservation,
                ..
            } => (Booking::try_from(booking)?, false, Some(Reservation::try_from(reservation)?)),
            ConfirmOutcome::AlreadyConfirmed { booking } => {
                (Booking::try_from(booking)?, true, None)
            }
        };
        let transaction = self.reload_transaction(transaction.id).await?;

        if already_confirmed {
            info!(booking_id = %booking.id, "Session already confirmed");
            return Ok(Confirmation {
                session_id: checkout.session_id.clone(),
                transaction,
                booking: Some(booking),
                already_confirmed: true,
                notification: None,
            });
        }

        info!(
            booking_id = %booking.id,
            reservation_id = %booking.reservation_id,
            date = %booking.booking_date,
            time = %booking.booking_time,
            "Booking confirmed"
        );
        if let Some(reservation) = &reservation {
            if reservation.expires_at <= self.now() {
                warn!(reservation_id = %reservation.id, "Confirmed a reservation after its hold expired");
            }
        }
        self.warn_on_overlap(&booking).await;

        let vars = self.booking_vars(product, &transaction, &booking);
        let notification = self
            .notify(BOOKING_CONFIRMATION, checkout, &transaction, vars)
            .await;

        Ok(Confirmation {
            session_id: checkout.session_id.clone(),
            transaction,
            booking: Some(booking),
            already_confirmed: false,
            notification: Some(notification),
        })
    }

    /// Holds are not exclusive, so two paid holds can land on the same slot
    async fn warn_on_overlap(&self, booking: &Booking) {
        let others = match self.stores.bookings.find_confirmed_on(booking.booking_date).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Could not check for overlapping bookings");
                return;
            }
        };
        let window = booking.window();
        let clashes: Vec<Uuid> = others
            .into_iter()
            .filter_map(|row| Booking::try_from(row).ok())
            .filter(|other| other.id != booking.id && other.window().overlaps(&window))
            .map(|other| other.id.0)
            .collect();
        if !clashes.is_empty() {
            metrics::counter!("booking_double_bookings_total").increment(1);
            warn!(booking_id = %booking.id, overlapping = ?clashes, "Booking overlaps another confirmed booking");
        }
    }

    async fn notify(
        &self,
        template_key: &str,
        checkout: &CompletedCheckout,
        transaction: &Transaction,
        vars: HashMap<&'static str, String>,
    ) -> NotificationResult {
        let profile_email = match transaction.user_id {
            Some(user_id) => match self.stores.profiles.find_by_id(user_id.0).await {
                Ok(profile) => profile.and_then(|p| p.email),
                Err(e) => {
                    warn!(error = %e, "Profile lookup failed");
                    None
                }
            },
            None => None,
        };
        let candidates = RecipientCandidates {
            profile_email,
            session_email: checkout.customer_email.clone(),
            transaction_email: Some(transaction.customer_email.clone()),
        };
        self.notifier
            .send_confirmation(template_key, &candidates, vars)
            .await
    }

    fn common_vars(
        &self,
        product: &Product,
        transaction: &Transaction,
    ) -> HashMap<&'static str, String> {
        let token = transaction
            .booking_token
            .as_ref()
            .map(|t| t.to_string())
            .unwrap_or_default();
        HashMap::from([
            ("product_name", product.name.clone()),
            (
                "amount",
                format_amount(transaction.amount_cents, &transaction.currency),
            ),
            (
                "link_url",
                format!("{}/register?booking_token={token}", self.config.site_url),
            ),
            ("booking_token", token),
        ])
    }

    fn purchase_vars(
        &self,
        product: &Product,
        transaction: &Transaction,
    ) -> HashMap<&'static str, String> {
        self.common_vars(product, transaction)
    }

    fn booking_vars(
        &self,
        product: &Product,
        transaction: &Transaction,
        booking: &Booking,
    ) -> HashMap<&'static str, String> {
        let mut vars = self.common_vars(product, transaction);
        vars.insert(
            "booking_date",
            booking.booking_date.format("%Y-%m-%d").to_string(),
        );
        vars.insert("booking_time", format_time(booking.booking_time));
        vars.insert("duration_minutes", booking.duration_minutes.to_string());
        vars.insert(
            "timezone",
            booking
                .timezone
                .clone()
                .unwrap_or_else(|| self.config.business_utc_offset.to_string()),
        );
        vars
    }

    /// Verify a webhook delivery and act on it
    #[instrument(skip(self, payload, signature))]
    pub async fn process_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookOutcome, BookingError> {
        let event = self
            .webhooks
            .verify_and_parse_at(payload, signature, self.now().timestamp())?;

        info!(event_id = %event.id, event_type = ?event.event_type, "Processing webhook event");

        match (event.event_type, event.data) {
            (
                WebhookEventType::CheckoutSessionCompleted
                | WebhookEventType::CheckoutSessionAsyncPaymentSucceeded,
                WebhookEventData::CheckoutSession(session),
            ) => {
                if !session.payment_status.is_settled() {
                    info!(session_id = %session.session_id, "Checkout completed, payment pending");
                    return Ok(WebhookOutcome::AwaitingPayment {
                        session_id: session.session_id,
                    });
                }
                let confirmation = self.confirm_checkout(&session, ConfirmSource::Webhook).await?;
                Ok(WebhookOutcome::Confirmed(Box::new(confirmation)))
            }
            (WebhookEventType::CheckoutSessionAsyncPaymentFailed, WebhookEventData::CheckoutSession(session)) => {
                warn!(session_id = %session.session_id, "Delayed payment failed");
                Ok(WebhookOutcome::Ignored {
                    event_type: "checkout.session.async_payment_failed".to_string(),
                })
            }
            (WebhookEventType::CheckoutSessionExpired, WebhookEventData::CheckoutSession(session)) => {
                info!(session_id = %session.session_id, "Checkout session expired");
                Ok(WebhookOutcome::Ignored {
                    event_type: "checkout.session.expired".to_string(),
                })
            }
            (WebhookEventType::Unknown(event_type), _) => Ok(WebhookOutcome::Ignored { event_type }),
            (event_type, _) => Err(BookingError::WebhookError(format!(
                "unexpected payload for {event_type:?}"
            ))),
        }
    }

    /// Confirm after the browser returns from Stripe. The session is
    /// re-fetched so nothing from the client is trusted but its ID.
    #[instrument(skip(self))]
    pub async fn payment_callback(&self, session_id: &str) -> Result<Confirmation, BookingError> {
        let session_id = validate_session_id(session_id)?;
        let checkout = self.provider.retrieve_checkout_session(session_id).await?;
        self.confirm_checkout(&checkout, ConfirmSource::Callback).await
    }

    /// Report a session's payment state and booking without changing anything
    #[instrument(skip(self))]
    pub async fn verify_session(&self, session_id: &str) -> Result<SessionStatus, BookingError> {
        let session_id = validate_session_id(session_id)?;
        let checkout = self.provider.retrieve_checkout_session(session_id).await?;

        let transaction = self
            .stores
            .transactions
            .find_by_session_id(session_id)
            .await?
            .map(Transaction::try_from)
            .transpose()?;

        let booking = match &transaction {
            Some(tx) => self
                .stores
                .bookings
                .find_by_transaction_id(tx.id.0)
                .await?
                .map(Booking::try_from)
                .transpose()?,
            None => None,
        };

        Ok(SessionStatus {
            session_id: checkout.session_id,
            paid: checkout.payment_status.is_settled(),
            payment_status: checkout.payment_status.as_str().to_string(),
            customer_email: checkout.customer_email,
            transaction,
            booking,
        })
    }
}

fn validate_session_id(session_id: &str) -> Result<&str, BookingError> {
    let session_id = session_id.trim();
    if session_id.is_empty() {
        return Err(BookingError::Validation("session_id is required".to_string()));
    }
    if session_id.len() > 255 || !session_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(BookingError::Validation("session_id is malformed".to_string()));
    }
    Ok(session_id)
}

/// `9900, "eur"` as `99.00 EUR`
fn format_amount(cents: i64, currency: &str) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!(
        "{sign}{}.{:02} {}",
        cents / 100,
        cents % 100,
        currency.to_uppercase()
    )
}
