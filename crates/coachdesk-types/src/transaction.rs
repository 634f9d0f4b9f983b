//! Payment transaction types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BookingToken, ParseError, ProductId, TransactionId, UserId};

/// Transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Checkout session created, not yet paid
    Pending,
    /// Payment succeeded
    Completed,
    /// Payment failed
    Failed,
}

impl TransactionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(ParseError::Status {
                kind: "transaction",
                value: other.to_string(),
            }),
        }
    }
}

/// Payment record correlated with a Stripe Checkout Session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Stripe Checkout Session ID (unique)
    pub stripe_session_id: String,
    pub customer_email: String,
    pub product_id: ProductId,
    pub amount_cents: i64,
    pub currency: String,
    pub status: TransactionStatus,
    pub user_id: Option<UserId>,
    pub booking_token: Option<BookingToken>,
    /// Start of the booked slot, for coaching purchases
    pub booking_timestamp: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
