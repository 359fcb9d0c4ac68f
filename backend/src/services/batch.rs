//! Batch lookup and creation

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};

use crate::error::{AppError, AppResult, Entity};
use shared::models::{system_batch_expiry, Batch, SYSTEM_BATCH_CODE};
use shared::validation::validate_batch_code;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BatchRow {
    pub id: i64,
    pub article_id: i64,
    pub batch_code: String,
    pub received_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub note: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<BatchRow> for Batch {
    fn from(r: BatchRow) -> Self {
        Batch {
            id: r.id,
            article_id: r.article_id,
            batch_code: r.batch_code,
            received_date: r.received_date,
            expiry_date: r.expiry_date,
            note: r.note,
            is_active: r.is_active,
            created_at: r.created_at,
        }
    }
}

/// Get or create the system "NA" batch for a consumable article
///
/// Consumables carry no manufacturer batch, so all their inventory keys
/// point at this one far-future batch.
pub async fn get_or_create_system_batch(
    conn: &mut PgConnection,
    article_id: i64,
) -> AppResult<i64> {
    let batch_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO batches (article_id, batch_code, expiry_date, note, is_active)
        VALUES ($1, $2, $3, 'System Batch (Consumable)', TRUE)
        ON CONFLICT (article_id, batch_code)
        DO UPDATE SET is_active = batches.is_active
        RETURNING id
        "#,
    )
    .bind(article_id)
    .bind(SYSTEM_BATCH_CODE)
    .bind(system_batch_expiry())
    .fetch_one(conn)
    .await?;

    Ok(batch_id)
}

/// Input for manually registering a batch
#[derive(Debug, serde::Deserialize)]
pub struct CreateBatchInput {
    pub article_id: i64,
    pub batch_code: String,
    pub received_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub note: Option<String>,
}

/// Batch service
#[derive(Clone)]
pub struct BatchService {
    db: PgPool,
}

impl BatchService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a manufacturer batch for an article
    pub async fn create(&self, input: CreateBatchInput) -> AppResult<Batch> {
        validate_batch_code(&input.batch_code)?;

        let article = sqlx::query_scalar::<_, i64>("SELECT id FROM articles WHERE id = $1")
            .bind(input.article_id)
            .fetch_optional(&self.db)
            .await?;
        if article.is_none() {
            return Err(AppError::NotFound {
                entity: Entity::Article,
                id: input.article_id,
            });
        }

        let row = sqlx::query_as::<_, BatchRow>(
            r#"
            INSERT INTO batches (article_id, batch_code, received_date, expiry_date, note)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, article_id, batch_code, received_date, expiry_date,
                      note, is_active, created_at
            "#,
        )
        .bind(input.article_id)
        .bind(&input.batch_code)
        .bind(input.received_date)
        .bind(input.expiry_date)
        .bind(&input.note)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// List batches for one article, newest first
    pub async fn list_for_article(&self, article_no: &str) -> AppResult<Vec<Batch>> {
        let rows = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT b.id, b.article_id, b.batch_code, b.received_date, b.expiry_date,
                   b.note, b.is_active, b.created_at
            FROM batches b
            JOIN articles a ON a.id = b.article_id
            WHERE a.article_no = $1 AND b.is_active
            ORDER BY b.created_at DESC
            "#,
        )
        .bind(article_no)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Batch::from).collect())
    }
}
