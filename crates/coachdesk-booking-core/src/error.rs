//! Booking errors

use thiserror::Error;

use coachdesk_types::ReservationStatus;

/// Booking errors
#[derive(Error, Debug)]
pub enum BookingError {
    /// Product not found
    #[error("product not found")]
    ProductNotFound,

    /// Reservation not found
    #[error("reservation not found")]
    ReservationNotFound,

    /// Transaction not found
    #[error("transaction not found")]
    TransactionNotFound,

    /// No purchase carries the booking token
    #[error("no purchases found for booking token")]
    BookingTokenNotFound,

    /// Invalid request input
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested start time is not an open slot
    #[error("requested slot is not available")]
    SlotUnavailable,

    /// Hold lapsed before checkout
    #[error("reservation has expired")]
    ReservationExpired,

    /// Reservation is not in a state that allows the operation
    #[error("reservation is {0}")]
    ReservationNotPending(ReservationStatus),

    /// Reservation does not match the purchase it is attached to
    #[error("reservation conflict: {0}")]
    ReservationConflict(String),

    /// Checkout session lacks a required metadata key
    #[error("checkout session is missing metadata: {0}")]
    MissingMetadata(&'static str),

    /// Checkout session has not been paid
    #[error("payment not completed (status: {0})")]
    PaymentNotCompleted(String),

    /// Payment provider error
    #[error("provider error: {0}")]
    ProviderError(String),

    /// Webhook verification or parsing error
    #[error("webhook error: {0}")]
    WebhookError(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] coachdesk_db::DbError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl BookingError {
    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProductNotFound
                | Self::ReservationNotFound
                | Self::TransactionNotFound
                | Self::BookingTokenNotFound
        )
    }

    /// Check if this is a state conflict
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::SlotUnavailable
                | Self::ReservationExpired
                | Self::ReservationNotPending(_)
                | Self::ReservationConflict(_)
        )
    }

    /// Whether retrying the same request can never succeed.
    ///
    /// Stripe keeps redelivering webhooks that fail; permanent failures are
    /// acknowledged instead so they are not retried forever.
    pub fn is_permanent(&self) -> bool {
        self.is_not_found()
            || self.is_conflict()
            || matches!(
                self,
                Self::Validation(_) | Self::MissingMetadata(_) | Self::PaymentNotCompleted(_)
            )
    }

    /// Check if this is a provider error
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Self::ProviderError(_))
    }
}
