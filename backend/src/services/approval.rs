//! Draft approval - atomic surplus-first consumption
//!
//! The in-transaction functions never commit; `ApprovalService` wraps them
//! in a transaction of their own, and group approval reuses them inside its
//! larger transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use sqlx::{PgConnection, PgPool};

use crate::error::{AppError, AppResult, Entity};
use crate::services::{inventory, ledger};
use shared::models::Draft;
use shared::types::{DraftStatus, DraftType, TxType};

/// How an approved quantity splits across the two buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumptionPlan {
    pub use_surplus: Decimal,
    pub use_stock: Decimal,
}

/// Plan surplus-first consumption for a weigh-in quantity
///
/// Surplus absorbs as much as it can; the rest must be covered by stock.
pub fn plan_weigh_in(
    quantity: Decimal,
    surplus_available: Decimal,
    stock_available: Decimal,
) -> AppResult<ConsumptionPlan> {
    let use_surplus = surplus_available.min(quantity);
    let use_stock = quantity - use_surplus;

    if stock_available < use_stock {
        return Err(AppError::InsufficientStock {
            required: quantity,
            available_stock: stock_available,
            available_surplus: surplus_available,
            context: None,
        });
    }

    Ok(ConsumptionPlan {
        use_surplus,
        use_stock,
    })
}

/// Plan stock-only consumption for a shortage quantity
///
/// Shortage approval never touches surplus.
pub fn plan_shortage(quantity: Decimal, stock_available: Decimal) -> AppResult<ConsumptionPlan> {
    if stock_available < quantity {
        return Err(AppError::InsufficientStock {
            required: quantity,
            available_stock: stock_available,
            available_surplus: Decimal::ZERO,
            context: None,
        });
    }

    Ok(ConsumptionPlan {
        use_surplus: Decimal::ZERO,
        use_stock: quantity,
    })
}

/// Result of approving one draft
#[derive(Debug, Serialize)]
pub struct ApprovalOutcome {
    pub draft_id: i64,
    pub new_status: DraftStatus,
    pub consumed_surplus_kg: Decimal,
    pub consumed_stock_kg: Decimal,
    pub remaining_surplus_kg: Decimal,
    pub remaining_stock_kg: Decimal,
}

/// Result of rejecting one draft
#[derive(Debug, Serialize)]
pub struct RejectOutcome {
    pub draft_id: i64,
    pub new_status: DraftStatus,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DraftRow {
    pub id: i64,
    pub draft_group_id: i64,
    pub location_id: i64,
    pub article_id: i64,
    pub batch_id: i64,
    pub quantity_kg: Decimal,
    pub status: String,
    pub draft_type: String,
    pub created_by_user_id: Option<i64>,
    pub source: String,
    pub client_event_id: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DraftRow {
    pub(crate) fn into_model(self) -> AppResult<Draft> {
        let status = DraftStatus::from_str(&self.status)
            .ok_or_else(|| anyhow::anyhow!("unknown draft status: {}", self.status))?;
        let draft_type = DraftType::from_str(&self.draft_type)
            .ok_or_else(|| anyhow::anyhow!("unknown draft type: {}", self.draft_type))?;
        Ok(Draft {
            id: self.id,
            draft_group_id: self.draft_group_id,
            location_id: self.location_id,
            article_id: self.article_id,
            batch_id: self.batch_id,
            quantity_kg: self.quantity_kg,
            status,
            draft_type,
            created_by_user_id: self.created_by_user_id,
            source: self.source,
            client_event_id: self.client_event_id,
            note: self.note,
            created_at: self.created_at,
        })
    }
}

const DRAFT_COLUMNS: &str = "id, draft_group_id, location_id, article_id, batch_id, \
     quantity_kg, status, draft_type, created_by_user_id, source, client_event_id, \
     note, created_at";

/// Lock a draft row for the rest of the transaction
async fn lock_draft(conn: &mut PgConnection, draft_id: i64) -> AppResult<DraftRow> {
    sqlx::query_as::<_, DraftRow>(&format!(
        "SELECT {} FROM weigh_in_drafts WHERE id = $1 FOR UPDATE",
        DRAFT_COLUMNS
    ))
    .bind(draft_id)
    .fetch_optional(conn)
    .await?
    .ok_or(AppError::NotFound {
        entity: Entity::Draft,
        id: draft_id,
    })
}

fn ensure_draft_status(row: &DraftRow) -> AppResult<()> {
    if row.status != DraftStatus::Draft.as_str() {
        return Err(AppError::DraftNotDraft {
            current_status: row.status.clone(),
        });
    }
    Ok(())
}

async fn set_draft_status(
    conn: &mut PgConnection,
    draft_id: i64,
    status: DraftStatus,
) -> AppResult<()> {
    sqlx::query("UPDATE weigh_in_drafts SET status = $1 WHERE id = $2")
        .bind(status.as_str())
        .bind(draft_id)
        .execute(conn)
        .await?;
    Ok(())
}

async fn insert_approval_action(
    conn: &mut PgConnection,
    draft_id: i64,
    action: &str,
    actor_user_id: i64,
    old_value: serde_json::Value,
    new_value: serde_json::Value,
    note: Option<&str>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO approval_actions (draft_id, action, actor_user_id, old_value, new_value, note)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(draft_id)
    .bind(action)
    .bind(actor_user_id)
    .bind(old_value)
    .bind(new_value)
    .bind(note)
    .execute(conn)
    .await?;
    Ok(())
}

/// Approve a draft inside the caller's transaction
///
/// Lock order: draft, then surplus, then stock. Does not commit.
pub async fn approve_draft_tx(
    conn: &mut PgConnection,
    draft_id: i64,
    actor_user_id: i64,
    note: Option<&str>,
) -> AppResult<ApprovalOutcome> {
    let draft = lock_draft(conn, draft_id).await?;
    ensure_draft_status(&draft)?;
    inventory::ensure_exists(conn, Entity::User, "users", actor_user_id).await?;

    match draft.draft_type.as_str() {
        "INVENTORY_SHORTAGE" => approve_shortage(conn, draft, actor_user_id, note).await,
        _ => approve_weigh_in(conn, draft, actor_user_id, note).await,
    }
}

/// Surplus-first consumption for WEIGH_IN drafts
async fn approve_weigh_in(
    conn: &mut PgConnection,
    draft: DraftRow,
    actor_user_id: i64,
    note: Option<&str>,
) -> AppResult<ApprovalOutcome> {
    let now = Utc::now();

    let surplus =
        inventory::lock_or_create_surplus(conn, draft.location_id, draft.article_id, draft.batch_id)
            .await?;
    let stock =
        inventory::lock_or_create_stock(conn, draft.location_id, draft.article_id, draft.batch_id)
            .await?;

    let plan = plan_weigh_in(draft.quantity_kg, surplus.quantity_kg, stock.quantity_kg)?;

    let remaining_surplus = surplus.quantity_kg - plan.use_surplus;
    let remaining_stock = stock.quantity_kg - plan.use_stock;

    inventory::update_surplus_quantity(conn, surplus.id, remaining_surplus).await?;
    inventory::update_stock_quantity(conn, stock.id, remaining_stock).await?;

    ledger::append(
        conn,
        ledger::NewTransaction {
            tx_type: TxType::WeighIn,
            occurred_at: now,
            location_id: draft.location_id,
            article_id: draft.article_id,
            batch_id: draft.batch_id,
            quantity_kg: draft.quantity_kg,
            user_id: Some(actor_user_id),
            source: &draft.source,
            client_event_id: Some(&draft.client_event_id),
            meta: Some(json!({ "draft_id": draft.id })),
        },
    )
    .await?;

    if plan.use_surplus > Decimal::ZERO {
        ledger::append(
            conn,
            ledger::NewTransaction {
                tx_type: TxType::SurplusConsumed,
                occurred_at: now,
                location_id: draft.location_id,
                article_id: draft.article_id,
                batch_id: draft.batch_id,
                quantity_kg: -plan.use_surplus,
                user_id: Some(actor_user_id),
                source: "approval",
                client_event_id: Some(&draft.client_event_id),
                meta: Some(json!({ "draft_id": draft.id })),
            },
        )
        .await?;
    }

    if plan.use_stock > Decimal::ZERO {
        ledger::append(
            conn,
            ledger::NewTransaction {
                tx_type: TxType::StockConsumed,
                occurred_at: now,
                location_id: draft.location_id,
                article_id: draft.article_id,
                batch_id: draft.batch_id,
                quantity_kg: -plan.use_stock,
                user_id: Some(actor_user_id),
                source: "approval",
                client_event_id: Some(&draft.client_event_id),
                meta: Some(json!({ "draft_id": draft.id })),
            },
        )
        .await?;
    }

    set_draft_status(conn, draft.id, DraftStatus::Approved).await?;
    insert_approval_action(
        conn,
        draft.id,
        "APPROVE",
        actor_user_id,
        json!({ "status": draft.status }),
        json!({
            "status": DraftStatus::Approved.as_str(),
            "consumed_surplus_kg": plan.use_surplus,
            "consumed_stock_kg": plan.use_stock,
        }),
        note,
    )
    .await?;

    Ok(ApprovalOutcome {
        draft_id: draft.id,
        new_status: DraftStatus::Approved,
        consumed_surplus_kg: plan.use_surplus,
        consumed_stock_kg: plan.use_stock,
        remaining_surplus_kg: remaining_surplus,
        remaining_stock_kg: remaining_stock,
    })
}

/// Stock-only consumption for INVENTORY_SHORTAGE drafts
async fn approve_shortage(
    conn: &mut PgConnection,
    draft: DraftRow,
    actor_user_id: i64,
    note: Option<&str>,
) -> AppResult<ApprovalOutcome> {
    let now = Utc::now();

    let stock =
        inventory::lock_stock(conn, draft.location_id, draft.article_id, draft.batch_id).await?;
    let stock_qty = stock.as_ref().map(|s| s.quantity_kg).unwrap_or(Decimal::ZERO);

    let plan = plan_shortage(draft.quantity_kg, stock_qty)?;

    // plan_shortage only succeeds when stock covers the draft, so the row
    // exists whenever quantity > 0 (and drafts are always > 0)
    let stock = stock.ok_or_else(|| anyhow::anyhow!("shortage approval without stock row"))?;
    let remaining_stock = stock.quantity_kg - plan.use_stock;
    inventory::update_stock_quantity(conn, stock.id, remaining_stock).await?;

    ledger::append(
        conn,
        ledger::NewTransaction {
            tx_type: TxType::InventoryAdjustment,
            occurred_at: now,
            location_id: draft.location_id,
            article_id: draft.article_id,
            batch_id: draft.batch_id,
            quantity_kg: -draft.quantity_kg,
            user_id: Some(actor_user_id),
            source: "shortage_approval",
            client_event_id: Some(&draft.client_event_id),
            meta: Some(json!({
                "draft_id": draft.id,
                "reason": "inventory_shortage_approved",
            })),
        },
    )
    .await?;

    set_draft_status(conn, draft.id, DraftStatus::Approved).await?;
    insert_approval_action(
        conn,
        draft.id,
        "APPROVE",
        actor_user_id,
        json!({ "status": draft.status }),
        json!({
            "status": DraftStatus::Approved.as_str(),
            "consumed_surplus_kg": Decimal::ZERO,
            "consumed_stock_kg": plan.use_stock,
        }),
        note,
    )
    .await?;

    Ok(ApprovalOutcome {
        draft_id: draft.id,
        new_status: DraftStatus::Approved,
        consumed_surplus_kg: Decimal::ZERO,
        consumed_stock_kg: plan.use_stock,
        remaining_surplus_kg: Decimal::ZERO,
        remaining_stock_kg: remaining_stock,
    })
}

/// Reject a draft inside the caller's transaction
///
/// No inventory changes occur on rejection. Does not commit.
pub async fn reject_draft_tx(
    conn: &mut PgConnection,
    draft_id: i64,
    actor_user_id: i64,
    note: Option<&str>,
) -> AppResult<RejectOutcome> {
    let draft = lock_draft(conn, draft_id).await?;
    ensure_draft_status(&draft)?;
    inventory::ensure_exists(conn, Entity::User, "users", actor_user_id).await?;

    set_draft_status(conn, draft.id, DraftStatus::Rejected).await?;
    insert_approval_action(
        conn,
        draft.id,
        "REJECT",
        actor_user_id,
        json!({ "status": draft.status }),
        json!({ "status": DraftStatus::Rejected.as_str() }),
        note,
    )
    .await?;

    Ok(RejectOutcome {
        draft_id: draft.id,
        new_status: DraftStatus::Rejected,
    })
}

/// Approval service - transaction-owning entry points
#[derive(Clone)]
pub struct ApprovalService {
    db: PgPool,
}

impl ApprovalService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Approve a single draft atomically
    pub async fn approve(
        &self,
        draft_id: i64,
        actor_user_id: i64,
        note: Option<&str>,
    ) -> AppResult<ApprovalOutcome> {
        let mut tx = self.db.begin().await?;
        let outcome = approve_draft_tx(&mut *tx, draft_id, actor_user_id, note).await?;
        tx.commit().await?;

        tracing::info!(
            draft_id,
            consumed_surplus = %outcome.consumed_surplus_kg,
            consumed_stock = %outcome.consumed_stock_kg,
            "draft approved"
        );
        Ok(outcome)
    }

    /// Reject a single draft atomically
    pub async fn reject(
        &self,
        draft_id: i64,
        actor_user_id: i64,
        note: Option<&str>,
    ) -> AppResult<RejectOutcome> {
        let mut tx = self.db.begin().await?;
        let outcome = reject_draft_tx(&mut *tx, draft_id, actor_user_id, note).await?;
        tx.commit().await?;

        tracing::info!(draft_id, "draft rejected");
        Ok(outcome)
    }

    /// List drafts with optional status/type filters, newest first
    pub async fn list(
        &self,
        status: Option<DraftStatus>,
        draft_type: Option<DraftType>,
    ) -> AppResult<Vec<Draft>> {
        let rows = sqlx::query_as::<_, DraftRow>(&format!(
            r#"
            SELECT {} FROM weigh_in_drafts
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::TEXT IS NULL OR draft_type = $2)
            ORDER BY created_at DESC, id DESC
            "#,
            DRAFT_COLUMNS
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(draft_type.map(|t| t.as_str()))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(DraftRow::into_model).collect()
    }

    /// Fetch one draft by id
    pub async fn get(&self, draft_id: i64) -> AppResult<Draft> {
        let row = sqlx::query_as::<_, DraftRow>(&format!(
            "SELECT {} FROM weigh_in_drafts WHERE id = $1",
            DRAFT_COLUMNS
        ))
        .bind(draft_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound {
            entity: Entity::Draft,
            id: draft_id,
        })?;

        row.into_model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn weigh_in_uses_surplus_before_stock() {
        let plan = plan_weigh_in(d("10"), d("4"), d("20")).unwrap();
        assert_eq!(plan.use_surplus, d("4"));
        assert_eq!(plan.use_stock, d("6"));
    }

    #[test]
    fn weigh_in_covered_entirely_by_surplus() {
        let plan = plan_weigh_in(d("3"), d("5"), d("0")).unwrap();
        assert_eq!(plan.use_surplus, d("3"));
        assert_eq!(plan.use_stock, d("0"));
    }

    #[test]
    fn weigh_in_fails_when_stock_cannot_cover_remainder() {
        let err = plan_weigh_in(d("10"), d("2"), d("7")).unwrap_err();
        match err {
            AppError::InsufficientStock {
                required,
                available_stock,
                available_surplus,
                ..
            } => {
                assert_eq!(required, d("10"));
                assert_eq!(available_stock, d("7"));
                assert_eq!(available_surplus, d("2"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn weigh_in_exact_boundary_succeeds() {
        let plan = plan_weigh_in(d("10"), d("2"), d("8")).unwrap();
        assert_eq!(plan.use_surplus, d("2"));
        assert_eq!(plan.use_stock, d("8"));
    }

    #[test]
    fn shortage_never_touches_surplus() {
        let plan = plan_shortage(d("5"), d("5")).unwrap();
        assert_eq!(plan.use_surplus, Decimal::ZERO);
        assert_eq!(plan.use_stock, d("5"));
    }

    #[test]
    fn shortage_fails_on_insufficient_stock() {
        let err = plan_shortage(d("5"), d("4.99")).unwrap_err();
        match err {
            AppError::InsufficientStock {
                available_surplus, ..
            } => assert_eq!(available_surplus, Decimal::ZERO),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
