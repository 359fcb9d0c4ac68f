//! HTTP handlers for inventory adjustment, count, summary and the ledger

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::adjustment::{AdjustInput, AdjustOutcome, AdjustmentService};
use crate::services::inventory::{InventoryService, TransactionFilter};
use crate::services::inventory_count::{CountInput, CountOutcome, InventoryCountService};
use crate::AppState;
use shared::models::{InventorySummaryItem, LedgerTransaction};
use shared::types::{PaginatedResponse, Pagination, TxType};

/// Manually adjust one stock/surplus row
pub async fn adjust_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<AdjustInput>,
) -> AppResult<Json<AdjustOutcome>> {
    require_admin(&current_user.0)?;
    let service = AdjustmentService::new(state.db);
    let outcome = service.adjust(current_user.0.user_id, input).await?;
    Ok(Json(outcome))
}

/// Reconcile a counted total against the books
pub async fn perform_inventory_count(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CountInput>,
) -> AppResult<Json<CountOutcome>> {
    require_admin(&current_user.0)?;
    let service = InventoryCountService::new(state.db);
    let outcome = service.perform(current_user.0.user_id, input).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub location_id: Option<i64>,
}

/// Per-batch inventory summary for one location
pub async fn get_inventory_summary(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<SummaryQuery>,
) -> AppResult<Json<Vec<InventorySummaryItem>>> {
    let location_id = query
        .location_id
        .unwrap_or(state.config.inventory.default_location_id);
    let service = InventoryService::new(state.db);
    let summary = service.summary(location_id).await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct TransactionListQuery {
    pub article_id: Option<i64>,
    pub batch_id: Option<i64>,
    pub tx_type: Option<TxType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List ledger transactions, newest first
pub async fn list_transactions(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<TransactionListQuery>,
) -> AppResult<Json<PaginatedResponse<LedgerTransaction>>> {
    let defaults = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };
    let filter = TransactionFilter {
        article_id: query.article_id,
        batch_id: query.batch_id,
        tx_type: query.tx_type,
        from: query.from,
        to: query.to,
    };

    let service = InventoryService::new(state.db);
    let transactions = service.list_transactions(filter, pagination).await?;
    Ok(Json(transactions))
}
