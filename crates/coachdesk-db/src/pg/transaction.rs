//! PostgreSQL transaction repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::TransactionRow;
use crate::repo::{CreateTransaction, TransactionRepository};

/// PostgreSQL transaction repository
#[derive(Clone)]
pub struct PgTransactionRepository {
    pool: PgPool,
}

impl PgTransactionRepository {
    /// Create a new transaction repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<TransactionRow>> {
        let transaction = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, stripe_session_id, customer_email, product_id, amount_cents, currency,
                   status, user_id, booking_token, booking_timestamp, created_at, updated_at
            FROM transactions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    async fn find_by_session_id(&self, session_id: &str) -> DbResult<Option<TransactionRow>> {
        let transaction = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, stripe_session_id, customer_email, product_id, amount_cents, currency,
                   status, user_id, booking_token, booking_timestamp, created_at, updated_at
            FROM transactions
            WHERE stripe_session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    async fn insert_if_absent(&self, transaction: CreateTransaction) -> DbResult<TransactionRow> {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, stripe_session_id, customer_email, product_id,
                                      amount_cents, currency, status, user_id, booking_token,
                                      booking_timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $8, $9)
            ON CONFLICT (stripe_session_id) DO NOTHING
            "#,
        )
        .bind(transaction.id)
        .bind(&transaction.stripe_session_id)
        .bind(&transaction.customer_email)
        .bind(transaction.product_id)
        .bind(transaction.amount_cents)
        .bind(&transaction.currency)
        .bind(transaction.user_id)
        .bind(&transaction.booking_token)
        .bind(transaction.booking_timestamp)
        .execute(&self.pool)
        .await?;

        // Either our row or the one a concurrent caller stored first
        self.find_by_session_id(&transaction.stripe_session_id)
            .await?
            .ok_or(DbError::NotFound)
    }

    async fn mark_completed(&self, id: Uuid) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = 'completed', updated_at = NOW()
            WHERE id = $1 AND status <> 'completed'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn link_user(&self, booking_token: &str, user_id: Uuid) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET user_id = $1, updated_at = NOW()
            WHERE booking_token = $2 AND user_id IS NULL
            "#,
        )
        .bind(user_id)
        .bind(booking_token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
