//! Stock receiving - batch create/backfill plus stock increase

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgConnection, PgPool};

use crate::config::Config;
use crate::error::{AppError, AppResult, Entity};
use crate::services::{batch, inventory, ledger};
use shared::types::TxType;
use shared::validation::{
    validate_batch_code, validate_client_event_id, validate_order_number,
    validate_receipt_quantity,
};

/// Input for receiving stock
#[derive(Debug, Deserialize)]
pub struct ReceiveInput {
    pub article_id: i64,
    pub batch_code: Option<String>,
    pub quantity_kg: Decimal,
    pub expiry_date: Option<NaiveDate>,
    pub order_number: String,
    pub location_id: Option<i64>,
    pub received_date: Option<NaiveDate>,
    pub note: Option<String>,
    pub client_event_id: Option<String>,
}

/// Result of a stock receipt
#[derive(Debug, Serialize)]
pub struct ReceiveOutcome {
    pub batch_id: i64,
    pub batch_created: bool,
    pub previous_stock: Decimal,
    pub new_stock: Decimal,
    pub quantity_received: Decimal,
    pub transaction_id: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    is_paint: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct BatchLockRow {
    id: i64,
    expiry_date: Option<NaiveDate>,
}

/// Receiving service
#[derive(Clone)]
pub struct ReceivingService {
    db: PgPool,
    allowed_location_id: i64,
}

impl ReceivingService {
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            allowed_location_id: config.inventory.default_location_id,
        }
    }

    /// Receive stock into inventory
    ///
    /// Creates or validates the batch, increases stock, and appends one
    /// STOCK_RECEIPT ledger entry.
    pub async fn receive(
        &self,
        actor_user_id: i64,
        input: ReceiveInput,
    ) -> AppResult<ReceiveOutcome> {
        let now = chrono::Utc::now();
        let today = now.date_naive();

        let order_number = validate_order_number(&input.order_number)?;
        let qty = validate_receipt_quantity(input.quantity_kg)?;
        let client_event_id = match input.client_event_id.as_deref() {
            Some(id) => Some(validate_client_event_id(Some(id))?),
            None => None,
        };
        let received_date = input.received_date.unwrap_or(today);

        let location_id = input.location_id.unwrap_or(self.allowed_location_id);
        if location_id != self.allowed_location_id {
            return Err(AppError::LocationNotAllowed(location_id));
        }

        let mut tx = self.db.begin().await?;

        inventory::ensure_exists(&mut tx, Entity::User, "users", actor_user_id).await?;
        inventory::ensure_exists(&mut tx, Entity::Location, "locations", location_id).await?;

        let article = sqlx::query_as::<_, ArticleRow>(
            "SELECT id, is_paint FROM articles WHERE id = $1",
        )
        .bind(input.article_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound {
            entity: Entity::Article,
            id: input.article_id,
        })?;

        // Consumables receive into their system batch; paints need a valid
        // manufacturer batch code and an expiry
        let (batch_id, batch_created) = if article.is_paint {
            let batch_code = input.batch_code.as_deref().unwrap_or("");
            validate_batch_code(batch_code)?;
            let expiry_date = input.expiry_date.ok_or_else(|| AppError::Validation {
                message: "expiry_date is required for paint articles".to_string(),
                details: json!({ "field": "expiry_date" }),
            })?;

            resolve_batch(
                &mut tx,
                article.id,
                batch_code,
                expiry_date,
                received_date,
                input.note.as_deref(),
            )
            .await?
        } else {
            let batch_id = batch::get_or_create_system_batch(&mut tx, article.id).await?;
            (batch_id, false)
        };

        let stock =
            inventory::lock_or_create_stock(&mut tx, location_id, article.id, batch_id).await?;
        let previous_stock = stock.quantity_kg;
        let new_stock = previous_stock + qty;
        inventory::update_stock_quantity(&mut tx, stock.id, new_stock).await?;

        let transaction_id = ledger::append(
            &mut tx,
            ledger::NewTransaction {
                tx_type: TxType::StockReceipt,
                occurred_at: now,
                location_id,
                article_id: article.id,
                batch_id,
                quantity_kg: qty,
                user_id: Some(actor_user_id),
                source: "receiving",
                client_event_id: client_event_id.as_deref(),
                meta: Some(json!({
                    "order_number": order_number,
                    "received_date": received_date,
                    "batch_created": batch_created,
                    "note": input.note,
                })),
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            article_id = article.id,
            batch_id,
            %qty,
            batch_created,
            "stock received"
        );

        Ok(ReceiveOutcome {
            batch_id,
            batch_created,
            previous_stock,
            new_stock,
            quantity_received: qty,
            transaction_id,
        })
    }
}

/// Lock-or-create the batch for a receipt
///
/// A NULL expiry on an existing batch is backfilled once; a different
/// non-null expiry is a conflict.
async fn resolve_batch(
    conn: &mut PgConnection,
    article_id: i64,
    batch_code: &str,
    expiry_date: NaiveDate,
    received_date: NaiveDate,
    note: Option<&str>,
) -> AppResult<(i64, bool)> {
    let existing = lock_batch(conn, article_id, batch_code).await?;

    let existing = match existing {
        Some(row) => Some(row),
        None => {
            let inserted = sqlx::query_as::<_, BatchLockRow>(
                r#"
                INSERT INTO batches (article_id, batch_code, received_date, expiry_date, note)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (article_id, batch_code) DO NOTHING
                RETURNING id, expiry_date
                "#,
            )
            .bind(article_id)
            .bind(batch_code)
            .bind(received_date)
            .bind(expiry_date)
            .bind(note)
            .fetch_optional(&mut *conn)
            .await?;

            match inserted {
                Some(row) => return Ok((row.id, true)),
                // Lost the creation race; lock the winner's row instead
                None => lock_batch(conn, article_id, batch_code).await?,
            }
        }
    };

    let row = existing.ok_or_else(|| anyhow::anyhow!("batch vanished during receipt"))?;
    match row.expiry_date {
        None => {
            sqlx::query("UPDATE batches SET expiry_date = $1 WHERE id = $2")
                .bind(expiry_date)
                .bind(row.id)
                .execute(conn)
                .await?;
            Ok((row.id, false))
        }
        Some(existing_expiry) if existing_expiry == expiry_date => Ok((row.id, false)),
        Some(existing_expiry) => Err(AppError::BatchExpiryMismatch {
            batch_code: batch_code.to_string(),
            existing_expiry,
            provided_expiry: expiry_date,
        }),
    }
}

async fn lock_batch(
    conn: &mut PgConnection,
    article_id: i64,
    batch_code: &str,
) -> AppResult<Option<BatchLockRow>> {
    let row = sqlx::query_as::<_, BatchLockRow>(
        r#"
        SELECT id, expiry_date FROM batches
        WHERE article_id = $1 AND batch_code = $2
        FOR UPDATE
        "#,
    )
    .bind(article_id)
    .bind(batch_code)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}
