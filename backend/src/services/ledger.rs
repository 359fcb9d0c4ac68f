//! Append-only transaction ledger

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::error::AppResult;
use shared::types::TxType;

/// One ledger entry to append
///
/// Quantities are signed: positive for additions, negative for consumption.
#[derive(Debug)]
pub struct NewTransaction<'a> {
    pub tx_type: TxType,
    pub occurred_at: DateTime<Utc>,
    pub location_id: i64,
    pub article_id: i64,
    pub batch_id: i64,
    pub quantity_kg: Decimal,
    pub user_id: Option<i64>,
    pub source: &'a str,
    pub client_event_id: Option<&'a str>,
    pub meta: Option<serde_json::Value>,
}

/// Append one entry to the ledger, returning its id
pub async fn append(conn: &mut PgConnection, tx: NewTransaction<'_>) -> AppResult<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO transactions
            (tx_type, occurred_at, location_id, article_id, batch_id,
             quantity_kg, user_id, source, client_event_id, meta)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id
        "#,
    )
    .bind(tx.tx_type.as_str())
    .bind(tx.occurred_at)
    .bind(tx.location_id)
    .bind(tx.article_id)
    .bind(tx.batch_id)
    .bind(tx.quantity_kg)
    .bind(tx.user_id)
    .bind(tx.source)
    .bind(tx.client_event_id)
    .bind(&tx.meta)
    .fetch_one(conn)
    .await?;

    Ok(id)
}
