//! Booking types

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    BookingId, BookingToken, ParseError, ProductId, ReservationId, TimeWindow, TransactionId,
    UserId,
};

/// Booking status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Scheduled session
    Confirmed,
    /// Cancelled by an admin
    Cancelled,
    /// Session took place
    Completed,
}

impl BookingStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(ParseError::Status {
                kind: "booking",
                value: other.to_string(),
            }),
        }
    }
}

/// Durable record of a scheduled session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub product_id: ProductId,
    pub user_id: Option<UserId>,
    pub customer_email: String,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub duration_minutes: u32,
    pub timezone: Option<String>,
    pub status: BookingStatus,
    /// Unique: one booking per payment
    pub transaction_id: TransactionId,
    pub reservation_id: ReservationId,
    /// Equal to the token of the reservation this booking came from
    pub booking_token: BookingToken,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::starting_at(self.booking_date, self.booking_time, self.duration_minutes)
    }
}

/// Entry on the coach's calendar created for a booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub booking_id: BookingId,
    pub title: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub created_at: DateTime<Utc>,
}
