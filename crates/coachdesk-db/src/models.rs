//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.
//! `TryFrom` conversions turn them into `coachdesk-types` domain values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use coachdesk_types::{
    weekday_from_index, Booking, BookingStatus, BookingToken, BusinessHours, BusySlot,
    CalendarEvent, Product, Reservation, ReservationStatus, Transaction, TransactionStatus,
};

use crate::DbError;

/// Product row from the database
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub product_type: String,
    pub duration_minutes: Option<i32>,
    pub active: bool,
}

/// Reservation row (`booking_reservations`)
#[derive(Debug, Clone, FromRow)]
pub struct ReservationRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub duration_minutes: i32,
    pub timezone: Option<String>,
    pub status: String,
    pub booking_token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub transaction_id: Option<Uuid>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Transaction row from the database
#[derive(Debug, Clone, FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub stripe_session_id: String,
    pub customer_email: String,
    pub product_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    pub status: String,
    pub user_id: Option<Uuid>,
    pub booking_token: Option<String>,
    pub booking_timestamp: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking row from the database
#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Option<Uuid>,
    pub customer_email: String,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub duration_minutes: i32,
    pub timezone: Option<String>,
    pub status: String,
    pub transaction_id: Uuid,
    pub reservation_id: Uuid,
    pub booking_token: String,
    pub created_at: DateTime<Utc>,
}

/// Calendar event row
#[derive(Debug, Clone, FromRow)]
pub struct CalendarEventRow {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub title: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub created_at: DateTime<Utc>,
}

/// Business hours row (weekday 0 = Monday)
#[derive(Debug, Clone, FromRow)]
pub struct BusinessHoursRow {
    pub weekday: i16,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub is_closed: bool,
}

/// Busy slot row
#[derive(Debug, Clone, FromRow)]
pub struct BusySlotRow {
    pub id: Uuid,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub title: String,
    pub description: Option<String>,
    pub away_status: bool,
}

/// Profile row (auth-provider user)
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

/// Persisted email template
#[derive(Debug, Clone, FromRow)]
pub struct EmailTemplateRow {
    pub key: String,
    pub subject: String,
    pub html_body: String,
    pub updated_at: DateTime<Utc>,
}

fn minutes(value: i32) -> Result<u32, DbError> {
    u32::try_from(value).map_err(|_| DbError::InvalidData(format!("negative duration: {value}")))
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            name: row.name,
            price_cents: row.price_cents,
            product_type: row.product_type.parse()?,
            duration_minutes: row.duration_minutes.map(minutes).transpose()?,
            active: row.active,
        })
    }
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = DbError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            product_id: row.product_id.into(),
            booking_date: row.booking_date,
            booking_time: row.booking_time,
            duration_minutes: minutes(row.duration_minutes)?,
            timezone: row.timezone,
            status: row.status.parse::<ReservationStatus>()?,
            booking_token: BookingToken::new(row.booking_token),
            expires_at: row.expires_at,
            created_at: row.created_at,
            transaction_id: row.transaction_id.map(Into::into),
            confirmed_at: row.confirmed_at,
        })
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = DbError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            stripe_session_id: row.stripe_session_id,
            customer_email: row.customer_email,
            product_id: row.product_id.into(),
            amount_cents: row.amount_cents,
            currency: row.currency,
            status: row.status.parse::<TransactionStatus>()?,
            user_id: row.user_id.map(Into::into),
            booking_token: row.booking_token.map(BookingToken::new),
            booking_timestamp: row.booking_timestamp,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<BookingRow> for Booking {
    type Error = DbError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.into(),
            product_id: row.product_id.into(),
            user_id: row.user_id.map(Into::into),
            customer_email: row.customer_email,
            booking_date: row.booking_date,
            booking_time: row.booking_time,
            duration_minutes: minutes(row.duration_minutes)?,
            timezone: row.timezone,
            status: row.status.parse::<BookingStatus>()?,
            transaction_id: row.transaction_id.into(),
            reservation_id: row.reservation_id.into(),
            booking_token: BookingToken::new(row.booking_token),
            created_at: row.created_at,
        })
    }
}

impl From<CalendarEventRow> for CalendarEvent {
    fn from(row: CalendarEventRow) -> Self {
        Self {
            id: row.id,
            booking_id: row.booking_id.into(),
            title: row.title,
            start_time: row.start_time,
            end_time: row.end_time,
            created_at: row.created_at,
        }
    }
}

impl TryFrom<BusinessHoursRow> for BusinessHours {
    type Error = DbError;

    fn try_from(row: BusinessHoursRow) -> Result<Self, Self::Error> {
        let weekday = weekday_from_index(row.weekday)
            .ok_or_else(|| DbError::InvalidData(format!("weekday out of range: {}", row.weekday)))?;
        Ok(Self {
            weekday,
            open_time: row.open_time,
            close_time: row.close_time,
            is_closed: row.is_closed,
        })
    }
}

impl From<BusySlotRow> for BusySlot {
    fn from(row: BusySlotRow) -> Self {
        Self {
            id: row.id,
            start_time: row.start_time,
            end_time: row.end_time,
            title: row.title,
            description: row.description,
            away_status: row.away_status,
        }
    }
}
