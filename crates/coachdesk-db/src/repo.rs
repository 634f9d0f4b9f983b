//! Repository traits
//!
//! Define async repository interfaces for database operations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// Product repository trait
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Find a product by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ProductRow>>;
}

/// Reservation repository trait
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Find a reservation by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ReservationRow>>;

    /// Create a new pending reservation
    async fn create(&self, reservation: CreateReservation) -> DbResult<ReservationRow>;

    /// Move a pending reservation to cancelled. Returns false if it was not pending.
    async fn cancel_pending(&self, id: Uuid) -> DbResult<bool>;
}

/// Create reservation input
#[derive(Debug, Clone)]
pub struct CreateReservation {
    pub id: Uuid,
    pub product_id: Uuid,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub duration_minutes: i32,
    pub timezone: Option<String>,
    pub booking_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Transaction repository trait
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Find a transaction by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<TransactionRow>>;

    /// Find a transaction by Stripe Checkout Session ID
    async fn find_by_session_id(&self, session_id: &str) -> DbResult<Option<TransactionRow>>;

    /// Insert a transaction unless one already exists for the session,
    /// returning whichever row is stored
    async fn insert_if_absent(&self, transaction: CreateTransaction) -> DbResult<TransactionRow>;

    /// Mark a transaction completed. Returns true only for the call that
    /// changed the status.
    async fn mark_completed(&self, id: Uuid) -> DbResult<bool>;

    /// Attach a user to unowned transactions carrying the booking token
    async fn link_user(&self, booking_token: &str, user_id: Uuid) -> DbResult<u64>;
}

/// Create transaction input
#[derive(Debug, Clone)]
pub struct CreateTransaction {
    pub id: Uuid,
    pub stripe_session_id: String,
    pub customer_email: String,
    pub product_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    pub user_id: Option<Uuid>,
    pub booking_token: Option<String>,
    pub booking_timestamp: Option<DateTime<Utc>>,
}

/// Booking repository trait
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Find the booking created for a transaction
    async fn find_by_transaction_id(&self, transaction_id: Uuid) -> DbResult<Option<BookingRow>>;

    /// Confirmed bookings on a date, ordered by start time
    async fn find_confirmed_on(&self, date: NaiveDate) -> DbResult<Vec<BookingRow>>;

    /// Bookings owned by a user, newest first
    async fn find_by_user_id(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<BookingRow>>;

    /// Attach a user to unowned bookings carrying the booking token
    async fn link_user(&self, booking_token: &str, user_id: Uuid) -> DbResult<u64>;

    /// Complete the transaction, confirm the reservation, insert the booking
    /// and (optionally) the calendar event as one atomic unit.
    ///
    /// Returns [`ConfirmOutcome::AlreadyConfirmed`] when the transaction
    /// already has a booking. Fails with [`crate::DbError::NotFound`] when the
    /// reservation does not exist and [`crate::DbError::Conflict`] when it
    /// cannot be confirmed by this transaction.
    async fn confirm_reservation(&self, input: ConfirmReservation) -> DbResult<ConfirmOutcome>;
}

/// Confirm reservation input
#[derive(Debug, Clone)]
pub struct ConfirmReservation {
    pub transaction_id: Uuid,
    pub reservation_id: Uuid,
    pub product_id: Uuid,
    pub customer_email: String,
    pub user_id: Option<Uuid>,
    /// Title of the calendar entry to create, if any
    pub calendar_title: Option<String>,
}

/// Result of [`BookingRepository::confirm_reservation`]
#[derive(Debug, Clone)]
pub enum ConfirmOutcome {
    /// This call confirmed the reservation and created the booking
    Created {
        booking: BookingRow,
        reservation: ReservationRow,
        calendar_event: Option<CalendarEventRow>,
    },
    /// A booking already existed for the transaction
    AlreadyConfirmed { booking: BookingRow },
}

/// Business hours and busy slots
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Opening hours for a weekday (0 = Monday)
    async fn business_hours_for(&self, weekday: i16) -> DbResult<Vec<BusinessHoursRow>>;

    /// Busy slots intersecting `[start, end)`
    async fn busy_slots_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> DbResult<Vec<BusySlotRow>>;
}

/// Profile repository trait
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Find a profile by auth user ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ProfileRow>>;
}

/// Email template repository trait
#[async_trait]
pub trait EmailTemplateRepository: Send + Sync {
    /// Find a persisted template by key
    async fn find_by_key(&self, key: &str) -> DbResult<Option<EmailTemplateRow>>;
}
