//! PostgreSQL schedule repository implementation

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::PgPool;

use crate::error::DbResult;
use crate::models::{BusinessHoursRow, BusySlotRow};
use crate::repo::ScheduleRepository;

/// PostgreSQL repository over `business_hours` and `busy_slots`
#[derive(Clone)]
pub struct PgScheduleRepository {
    pool: PgPool,
}

impl PgScheduleRepository {
    /// Create a new schedule repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleRepository for PgScheduleRepository {
    async fn business_hours_for(&self, weekday: i16) -> DbResult<Vec<BusinessHoursRow>> {
        let hours = sqlx::query_as::<_, BusinessHoursRow>(
            r#"
            SELECT weekday, open_time, close_time, is_closed
            FROM business_hours
            WHERE weekday = $1
            ORDER BY open_time
            "#,
        )
        .bind(weekday)
        .fetch_all(&self.pool)
        .await?;

        Ok(hours)
    }

    async fn busy_slots_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> DbResult<Vec<BusySlotRow>> {
        let slots = sqlx::query_as::<_, BusySlotRow>(
            r#"
            SELECT id, start_time, end_time, title, description, away_status
            FROM busy_slots
            WHERE start_time < $2 AND end_time > $1
            ORDER BY start_time
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(slots)
    }
}
