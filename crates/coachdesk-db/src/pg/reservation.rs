//! PostgreSQL reservation repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::ReservationRow;
use crate::repo::{CreateReservation, ReservationRepository};

/// PostgreSQL reservation repository (`booking_reservations`)
#[derive(Clone)]
pub struct PgReservationRepository {
    pool: PgPool,
}

impl PgReservationRepository {
    /// Create a new reservation repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationRepository for PgReservationRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ReservationRow>> {
        let reservation = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT id, product_id, booking_date, booking_time, duration_minutes, timezone,
                   status, booking_token, expires_at, created_at, transaction_id, confirmed_at
            FROM booking_reservations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reservation)
    }

    async fn create(&self, reservation: CreateReservation) -> DbResult<ReservationRow> {
        let row = sqlx::query_as::<_, ReservationRow>(
            r#"
            INSERT INTO booking_reservations (id, product_id, booking_date, booking_time,
                                              duration_minutes, timezone, status,
                                              booking_token, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $8)
            RETURNING id, product_id, booking_date, booking_time, duration_minutes, timezone,
                      status, booking_token, expires_at, created_at, transaction_id, confirmed_at
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.product_id)
        .bind(reservation.booking_date)
        .bind(reservation.booking_time)
        .bind(reservation.duration_minutes)
        .bind(&reservation.timezone)
        .bind(&reservation.booking_token)
        .bind(reservation.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn cancel_pending(&self, id: Uuid) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE booking_reservations SET status = 'cancelled' WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
