//! Inventory rows and read views
//!
//! Holds the locked row access shared by every engine operation, the
//! per-batch summary view and the ledger listing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::error::{AppError, AppResult, Entity};
use shared::models::{InventorySummaryItem, LedgerTransaction};
use shared::types::{Pagination, PaginatedResponse, TxType};

/// A stock or surplus row held under `FOR UPDATE` for the rest of the
/// enclosing transaction
#[derive(Debug, sqlx::FromRow)]
pub struct LockedRow {
    pub id: i64,
    pub quantity_kg: Decimal,
}

/// Lock the stock row for a key, creating it at 0 if absent
///
/// The upsert takes the same row lock as `SELECT ... FOR UPDATE`, so
/// concurrent creators converge on one locked row.
pub async fn lock_or_create_stock(
    conn: &mut PgConnection,
    location_id: i64,
    article_id: i64,
    batch_id: i64,
) -> AppResult<LockedRow> {
    let row = sqlx::query_as::<_, LockedRow>(
        r#"
        INSERT INTO stock (location_id, article_id, batch_id, quantity_kg)
        VALUES ($1, $2, $3, 0)
        ON CONFLICT (location_id, article_id, batch_id)
        DO UPDATE SET quantity_kg = stock.quantity_kg
        RETURNING id, quantity_kg
        "#,
    )
    .bind(location_id)
    .bind(article_id)
    .bind(batch_id)
    .fetch_one(conn)
    .await?;

    Ok(row)
}

/// Lock the surplus row for a key, creating it at 0 if absent
pub async fn lock_or_create_surplus(
    conn: &mut PgConnection,
    location_id: i64,
    article_id: i64,
    batch_id: i64,
) -> AppResult<LockedRow> {
    let row = sqlx::query_as::<_, LockedRow>(
        r#"
        INSERT INTO surplus (location_id, article_id, batch_id, quantity_kg)
        VALUES ($1, $2, $3, 0)
        ON CONFLICT (location_id, article_id, batch_id)
        DO UPDATE SET quantity_kg = surplus.quantity_kg
        RETURNING id, quantity_kg
        "#,
    )
    .bind(location_id)
    .bind(article_id)
    .bind(batch_id)
    .fetch_one(conn)
    .await?;

    Ok(row)
}

/// Lock an existing stock row without creating one
pub async fn lock_stock(
    conn: &mut PgConnection,
    location_id: i64,
    article_id: i64,
    batch_id: i64,
) -> AppResult<Option<LockedRow>> {
    let row = sqlx::query_as::<_, LockedRow>(
        r#"
        SELECT id, quantity_kg FROM stock
        WHERE location_id = $1 AND article_id = $2 AND batch_id = $3
        FOR UPDATE
        "#,
    )
    .bind(location_id)
    .bind(article_id)
    .bind(batch_id)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

/// Lock an existing surplus row without creating one
pub async fn lock_surplus(
    conn: &mut PgConnection,
    location_id: i64,
    article_id: i64,
    batch_id: i64,
) -> AppResult<Option<LockedRow>> {
    let row = sqlx::query_as::<_, LockedRow>(
        r#"
        SELECT id, quantity_kg FROM surplus
        WHERE location_id = $1 AND article_id = $2 AND batch_id = $3
        FOR UPDATE
        "#,
    )
    .bind(location_id)
    .bind(article_id)
    .bind(batch_id)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

/// Set a locked stock row to a new quantity
pub async fn update_stock_quantity(
    conn: &mut PgConnection,
    stock_id: i64,
    quantity_kg: Decimal,
) -> AppResult<()> {
    sqlx::query("UPDATE stock SET quantity_kg = $1, last_updated = now() WHERE id = $2")
        .bind(quantity_kg)
        .bind(stock_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Set a locked surplus row to a new quantity
pub async fn update_surplus_quantity(
    conn: &mut PgConnection,
    surplus_id: i64,
    quantity_kg: Decimal,
) -> AppResult<()> {
    sqlx::query("UPDATE surplus SET quantity_kg = $1, updated_at = now() WHERE id = $2")
        .bind(quantity_kg)
        .bind(surplus_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Ensure a referenced entity row exists (no lock taken)
pub async fn ensure_exists(
    conn: &mut PgConnection,
    entity: Entity,
    table: &str,
    id: i64,
) -> AppResult<()> {
    let found = sqlx::query_scalar::<_, i64>(&format!("SELECT id FROM {} WHERE id = $1", table))
        .bind(id)
        .fetch_optional(conn)
        .await?;

    match found {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound { entity, id }),
    }
}

/// Filters for the ledger listing
#[derive(Debug, Default, serde::Deserialize)]
pub struct TransactionFilter {
    pub article_id: Option<i64>,
    pub batch_id: Option<i64>,
    pub tx_type: Option<TxType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct TxRow {
    id: i64,
    tx_type: String,
    occurred_at: DateTime<Utc>,
    location_id: i64,
    article_id: i64,
    batch_id: i64,
    quantity_kg: Decimal,
    user_id: Option<i64>,
    source: String,
    client_event_id: Option<String>,
    meta: Option<serde_json::Value>,
}

impl TxRow {
    fn into_model(self) -> AppResult<LedgerTransaction> {
        let tx_type = TxType::from_str(&self.tx_type)
            .ok_or_else(|| anyhow::anyhow!("unknown tx_type in ledger: {}", self.tx_type))?;
        Ok(LedgerTransaction {
            id: self.id,
            tx_type,
            occurred_at: self.occurred_at,
            location_id: self.location_id,
            article_id: self.article_id,
            batch_id: self.batch_id,
            quantity_kg: self.quantity_kg,
            user_id: self.user_id,
            source: self.source,
            client_event_id: self.client_event_id,
            meta: self.meta,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    article_id: i64,
    article_no: String,
    description: Option<String>,
    batch_id: i64,
    batch_code: String,
    expiry_date: Option<chrono::NaiveDate>,
    stock_qty: Decimal,
    surplus_qty: Decimal,
    updated_at: Option<DateTime<Utc>>,
}

/// Inventory read service
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

impl InventoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Per-batch stock + surplus + total for one location
    ///
    /// Batches with no quantity in either bucket are omitted.
    pub async fn summary(&self, location_id: i64) -> AppResult<Vec<InventorySummaryItem>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                b.article_id,
                a.article_no,
                a.description,
                b.id AS batch_id,
                b.batch_code,
                b.expiry_date,
                COALESCE(st.quantity_kg, 0) AS stock_qty,
                COALESCE(su.quantity_kg, 0) AS surplus_qty,
                GREATEST(st.last_updated, su.updated_at) AS updated_at
            FROM batches b
            JOIN articles a ON a.id = b.article_id
            LEFT JOIN stock st
                ON st.batch_id = b.id AND st.article_id = b.article_id
               AND st.location_id = $1
            LEFT JOIN surplus su
                ON su.batch_id = b.id AND su.article_id = b.article_id
               AND su.location_id = $1
            WHERE COALESCE(st.quantity_kg, 0) <> 0
               OR COALESCE(su.quantity_kg, 0) <> 0
            ORDER BY a.article_no, b.batch_code
            "#,
        )
        .bind(location_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| InventorySummaryItem {
                location_id,
                article_id: r.article_id,
                article_no: r.article_no,
                description: r.description,
                batch_id: r.batch_id,
                batch_code: r.batch_code,
                expiry_date: r.expiry_date,
                stock_qty: r.stock_qty,
                surplus_qty: r.surplus_qty,
                total_qty: r.stock_qty + r.surplus_qty,
                updated_at: r.updated_at,
            })
            .collect())
    }

    /// List ledger transactions, newest first, with optional filters
    pub async fn list_transactions(
        &self,
        filter: TransactionFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<LedgerTransaction>> {
        let page = pagination.page.max(1);
        let per_page = pagination.per_page.clamp(1, 500);
        let offset = (page as i64 - 1) * per_page as i64;

        let tx_type = filter.tx_type.map(|t| t.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM transactions
            WHERE ($1::BIGINT IS NULL OR article_id = $1)
              AND ($2::BIGINT IS NULL OR batch_id = $2)
              AND ($3::TEXT IS NULL OR tx_type = $3)
              AND ($4::TIMESTAMPTZ IS NULL OR occurred_at >= $4)
              AND ($5::TIMESTAMPTZ IS NULL OR occurred_at <= $5)
            "#,
        )
        .bind(filter.article_id)
        .bind(filter.batch_id)
        .bind(tx_type)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, TxRow>(
            r#"
            SELECT id, tx_type, occurred_at, location_id, article_id, batch_id,
                   quantity_kg, user_id, source, client_event_id, meta
            FROM transactions
            WHERE ($1::BIGINT IS NULL OR article_id = $1)
              AND ($2::BIGINT IS NULL OR batch_id = $2)
              AND ($3::TEXT IS NULL OR tx_type = $3)
              AND ($4::TIMESTAMPTZ IS NULL OR occurred_at >= $4)
              AND ($5::TIMESTAMPTZ IS NULL OR occurred_at <= $5)
            ORDER BY occurred_at DESC, id DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(filter.article_id)
        .bind(filter.batch_id)
        .bind(tx_type)
        .bind(filter.from)
        .bind(filter.to)
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        let items = rows
            .into_iter()
            .map(TxRow::into_model)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(PaginatedResponse {
            items,
            total: total as u64,
            page,
            per_page,
        })
    }
}
