//! PostgreSQL email template repository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::DbResult;
use crate::models::EmailTemplateRow;
use crate::repo::EmailTemplateRepository;

/// PostgreSQL email template repository
#[derive(Clone)]
pub struct PgEmailTemplateRepository {
    pool: PgPool,
}

impl PgEmailTemplateRepository {
    /// Create a new email template repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailTemplateRepository for PgEmailTemplateRepository {
    async fn find_by_key(&self, key: &str) -> DbResult<Option<EmailTemplateRow>> {
        let template = sqlx::query_as::<_, EmailTemplateRow>(
            "SELECT key, subject, html_body, updated_at FROM email_templates WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(template)
    }
}
