//! Slot reservation (hold) types

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BookingToken, ParseError, ProductId, ReservationId, TimeWindow, TransactionId};

/// Reservation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Held, awaiting payment
    Pending,
    /// Paid and turned into a booking
    Confirmed,
    /// Hold lapsed without payment (only ever computed on read)
    Expired,
    /// Released by the customer or an admin
    Cancelled,
}

impl ReservationStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "expired" => Ok(Self::Expired),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(ParseError::Status {
                kind: "reservation",
                value: other.to_string(),
            }),
        }
    }
}

/// Short-lived claim on a calendar slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub product_id: ProductId,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub duration_minutes: u32,
    /// Customer's IANA timezone name, kept for display in emails
    pub timezone: Option<String>,
    /// Stored status; see [`Reservation::effective_status`]
    pub status: ReservationStatus,
    pub booking_token: BookingToken,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub transaction_id: Option<TransactionId>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Whether the hold has lapsed. Only meaningful for pending reservations.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Status after applying read-time expiry: a pending hold past its
    /// `expires_at` reads as expired. Nothing is written back.
    pub fn effective_status(&self, now: DateTime<Utc>) -> ReservationStatus {
        match self.status {
            ReservationStatus::Pending if self.is_expired(now) => ReservationStatus::Expired,
            status => status,
        }
    }

    /// The calendar window this reservation claims
    pub fn window(&self) -> TimeWindow {
        TimeWindow::starting_at(self.booking_date, self.booking_time, self.duration_minutes)
    }
}
