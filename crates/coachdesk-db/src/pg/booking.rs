//! PostgreSQL booking repository implementation

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{BookingRow, CalendarEventRow, ReservationRow};
use crate::repo::{BookingRepository, ConfirmOutcome, ConfirmReservation};

/// PostgreSQL booking repository
#[derive(Clone)]
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    /// Create a new booking repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn find_by_transaction_id(&self, transaction_id: Uuid) -> DbResult<Option<BookingRow>> {
        let booking = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, product_id, user_id, customer_email, booking_date, booking_time,
                   duration_minutes, timezone, status, transaction_id, reservation_id,
                   booking_token, created_at
            FROM bookings
            WHERE transaction_id = $1
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn find_confirmed_on(&self, date: NaiveDate) -> DbResult<Vec<BookingRow>> {
        let bookings = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, product_id, user_id, customer_email, booking_date, booking_time,
                   duration_minutes, timezone, status, transaction_id, reservation_id,
                   booking_token, created_at
            FROM bookings
            WHERE booking_date = $1 AND status = 'confirmed'
            ORDER BY booking_time
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn find_by_user_id(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<BookingRow>> {
        let bookings = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, product_id, user_id, customer_email, booking_date, booking_time,
                   duration_minutes, timezone, status, transaction_id, reservation_id,
                   booking_token, created_at
            FROM bookings
            WHERE user_id = $1
            ORDER BY booking_date DESC, booking_time DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn link_user(&self, booking_token: &str, user_id: Uuid) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE bookings SET user_id = $1 WHERE booking_token = $2 AND user_id IS NULL",
        )
        .bind(user_id)
        .bind(booking_token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn confirm_reservation(&self, input: ConfirmReservation) -> DbResult<ConfirmOutcome> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the transaction serializes racing confirmations of one payment
        let updated = sqlx::query(
            "UPDATE transactions SET status = 'completed', updated_at = NOW() WHERE id = $1",
        )
        .bind(input.transaction_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        let existing = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, product_id, user_id, customer_email, booking_date, booking_time,
                   duration_minutes, timezone, status, transaction_id, reservation_id,
                   booking_token, created_at
            FROM bookings
            WHERE transaction_id = $1
            "#,
        )
        .bind(input.transaction_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(booking) = existing {
            tx.commit().await?;
            debug!(transaction_id = %input.transaction_id, "Booking already exists");
            return Ok(ConfirmOutcome::AlreadyConfirmed { booking });
        }

        let reservation = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT id, product_id, booking_date, booking_time, duration_minutes, timezone,
                   status, booking_token, expires_at, created_at, transaction_id, confirmed_at
            FROM booking_reservations
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(input.reservation_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound)?;

        if reservation.product_id != input.product_id {
            return Err(DbError::Conflict(format!(
                "reservation {} belongs to another product",
                reservation.id
            )));
        }
        if reservation.status != "pending" {
            warn!(
                reservation_id = %reservation.id,
                status = %reservation.status,
                "Reservation cannot be confirmed"
            );
            return Err(DbError::Conflict(format!(
                "reservation {} is {}",
                reservation.id, reservation.status
            )));
        }

        let reservation = sqlx::query_as::<_, ReservationRow>(
            r#"
            UPDATE booking_reservations
            SET status = 'confirmed', transaction_id = $2, confirmed_at = NOW()
            WHERE id = $1
            RETURNING id, product_id, booking_date, booking_time, duration_minutes, timezone,
                      status, booking_token, expires_at, created_at, transaction_id, confirmed_at
            "#,
        )
        .bind(reservation.id)
        .bind(input.transaction_id)
        .fetch_one(&mut *tx)
        .await?;

        let booking = sqlx::query_as::<_, BookingRow>(
            r#"
            INSERT INTO bookings (id, product_id, user_id, customer_email, booking_date,
                                  booking_time, duration_minutes, timezone, status,
                                  transaction_id, reservation_id, booking_token)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'confirmed', $9, $10, $11)
            RETURNING id, product_id, user_id, customer_email, booking_date, booking_time,
                      duration_minutes, timezone, status, transaction_id, reservation_id,
                      booking_token, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(reservation.product_id)
        .bind(input.user_id)
        .bind(&input.customer_email)
        .bind(reservation.booking_date)
        .bind(reservation.booking_time)
        .bind(reservation.duration_minutes)
        .bind(&reservation.timezone)
        .bind(input.transaction_id)
        .bind(reservation.id)
        .bind(&reservation.booking_token)
        .fetch_one(&mut *tx)
        .await?;

        let calendar_event = match input.calendar_title {
            Some(title) => {
                let start = booking.booking_date.and_time(booking.booking_time);
                let end = start + Duration::minutes(i64::from(booking.duration_minutes));
                let event = sqlx::query_as::<_, CalendarEventRow>(
                    r#"
                    INSERT INTO calendar_events (id, booking_id, title, start_time, end_time)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id, booking_id, title, start_time, end_time, created_at
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(booking.id)
                .bind(&title)
                .bind(start)
                .bind(end)
                .fetch_one(&mut *tx)
                .await?;
                Some(event)
            }
            None => None,
        };

        tx.commit().await?;

        Ok(ConfirmOutcome::Created {
            booking,
            reservation,
            calendar_event,
        })
    }
}
