//! CoachDesk Booking Core - Reservation and payment-confirmation logic
//!
//! Availability computation, short-lived slot holds, Stripe Checkout
//! integration, webhook verification, idempotent booking confirmation and
//! confirmation emails.
//!
//! # Example
//!
//! ```rust,ignore
//! use coachdesk_booking_core::{BookingConfig, BookingService, Stores, StripeProvider};
//!
//! let config = BookingConfig::new(StripeConfig::new("sk_test_...", "whsec_..."))
//!     .with_site_url("https://coach.example.org");
//! let provider = Arc::new(StripeProvider::new(config.stripe.clone()));
//! let service = BookingService::new(Stores::from(repos), provider, mailer, config);
//!
//! // Hold a slot, then send the customer to Stripe
//! let reservation = service.reserve_slot(request).await?;
//! let session = service.create_checkout(checkout).await?;
//! ```

pub mod availability;
pub mod clock;
pub mod config;
pub mod error;
pub mod notify;
pub mod provider;
pub mod service;
pub mod store;
pub mod stripe;
pub mod template;
pub mod webhook;

pub use availability::{open_slots, SlotQuery};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{BookingConfig, StripeConfig};
pub use error::BookingError;
pub use notify::{
    resolve_recipient, validate_email, Mailer, MailerConfig, NotificationResult, Notifier,
    NotifyError, OutgoingEmail, RecipientCandidates, SmtpMailer,
};
pub use provider::{
    CheckoutMetadata, CheckoutParams, CheckoutSession, CompletedCheckout, PaymentProvider,
    PaymentStatus,
};
pub use service::{
    Availability, BookingService, ConfirmSource, Confirmation, CreateCheckout, LinkResult,
    ReserveSlot, SessionStatus, WebhookOutcome,
};
pub use store::Stores;
pub use stripe::StripeProvider;
pub use template::{default_template, render, render_html, EmailTemplate};
pub use webhook::{WebhookEvent, WebhookEventData, WebhookEventType, WebhookHandler};
