//! Account linking and the customer's booking list

use serde::Serialize;
use tracing::{info, instrument};

use coachdesk_types::{Booking, UserId};

use super::BookingService;
use crate::error::BookingError;

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 200;

/// Rows attached to the account by [`BookingService::link_purchases`]
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LinkResult {
    pub transactions: u64,
    pub bookings: u64,
}

impl BookingService {
    /// Attach purchases made before signing up to the new account.
    /// Rows already owned by a user are left alone.
    #[instrument(skip(self, booking_token))]
    pub async fn link_purchases(
        &self,
        booking_token: &str,
        user_id: UserId,
    ) -> Result<LinkResult, BookingError> {
        let token = booking_token.trim();
        if token.is_empty() {
            return Err(BookingError::Validation("booking_token is required".to_string()));
        }

        let transactions = self.stores.transactions.link_user(token, user_id.0).await?;
        let bookings = self.stores.bookings.link_user(token, user_id.0).await?;

        if transactions == 0 && bookings == 0 {
            return Err(BookingError::BookingTokenNotFound);
        }

        info!(transactions, bookings, "Linked purchases to account");
        Ok(LinkResult {
            transactions,
            bookings,
        })
    }

    /// The customer's bookings, newest first
    #[instrument(skip(self))]
    pub async fn list_bookings(
        &self,
        user_id: UserId,
        limit: Option<i64>,
    ) -> Result<Vec<Booking>, BookingError> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        let rows = self.stores.bookings.find_by_user_id(user_id.0, limit).await?;
        Ok(rows
            .into_iter()
            .map(Booking::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}
