//! Manual inventory adjustment - set or delta on stock/surplus

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;

use crate::error::{AppError, AppResult, Entity};
use crate::services::{inventory, ledger};
use shared::types::{AdjustMode, AdjustTarget, TxType};
use shared::validation::round_quantity;

/// Compute the value a row would be set to
pub fn compute_new_value(mode: AdjustMode, previous: Decimal, qty: Decimal) -> Decimal {
    match mode {
        AdjustMode::Set => qty,
        AdjustMode::Delta => previous + qty,
    }
}

/// Input for an inventory adjustment
#[derive(Debug, Deserialize)]
pub struct AdjustInput {
    pub location_id: i64,
    pub article_id: i64,
    pub batch_id: i64,
    pub target: AdjustTarget,
    pub mode: AdjustMode,
    pub quantity_kg: Decimal,
    pub note: Option<String>,
}

/// Result of an inventory adjustment
#[derive(Debug, Serialize)]
pub struct AdjustOutcome {
    pub target: AdjustTarget,
    pub mode: AdjustMode,
    pub previous_value: Decimal,
    pub new_value: Decimal,
    pub delta: Decimal,
    pub location_id: i64,
    pub article_id: i64,
    pub batch_id: i64,
    pub transaction_id: i64,
}

/// Adjustment service
#[derive(Clone)]
pub struct AdjustmentService {
    db: PgPool,
}

impl AdjustmentService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Set or delta-adjust one stock/surplus row under lock
    pub async fn adjust(&self, actor_user_id: i64, input: AdjustInput) -> AppResult<AdjustOutcome> {
        let qty = round_quantity(input.quantity_kg);

        if input.mode == AdjustMode::Set && qty < Decimal::ZERO {
            return Err(AppError::Validation {
                message: "quantity_kg must be non-negative for set mode".to_string(),
                details: json!({ "value": qty }),
            });
        }

        let mut tx = self.db.begin().await?;

        inventory::ensure_exists(&mut tx, Entity::User, "users", actor_user_id).await?;
        inventory::ensure_exists(&mut tx, Entity::Location, "locations", input.location_id)
            .await?;
        inventory::ensure_exists(&mut tx, Entity::Article, "articles", input.article_id).await?;
        inventory::ensure_exists(&mut tx, Entity::Batch, "batches", input.batch_id).await?;

        let row = match input.target {
            AdjustTarget::Stock => {
                inventory::lock_or_create_stock(
                    &mut tx,
                    input.location_id,
                    input.article_id,
                    input.batch_id,
                )
                .await?
            }
            AdjustTarget::Surplus => {
                inventory::lock_or_create_surplus(
                    &mut tx,
                    input.location_id,
                    input.article_id,
                    input.batch_id,
                )
                .await?
            }
        };

        let previous_value = row.quantity_kg;
        let new_value = compute_new_value(input.mode, previous_value, qty);

        if new_value < Decimal::ZERO {
            return Err(AppError::NegativeInventory {
                target: input.target.as_str().to_string(),
                previous_value,
                delta: qty,
                would_be: new_value,
            });
        }

        match input.target {
            AdjustTarget::Stock => {
                inventory::update_stock_quantity(&mut tx, row.id, new_value).await?
            }
            AdjustTarget::Surplus => {
                inventory::update_surplus_quantity(&mut tx, row.id, new_value).await?
            }
        }

        // The ledger entry carries the realized change, not the request value
        let delta_for_tx = new_value - previous_value;

        let transaction_id = ledger::append(
            &mut tx,
            ledger::NewTransaction {
                tx_type: TxType::InventoryAdjustment,
                occurred_at: chrono::Utc::now(),
                location_id: input.location_id,
                article_id: input.article_id,
                batch_id: input.batch_id,
                quantity_kg: delta_for_tx,
                user_id: Some(actor_user_id),
                source: "adjustment",
                client_event_id: None,
                meta: Some(json!({
                    "target": input.target.as_str(),
                    "mode": input.mode.as_str(),
                    "previous_value": previous_value,
                    "new_value": new_value,
                    "note": input.note,
                })),
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            target = input.target.as_str(),
            mode = input.mode.as_str(),
            %previous_value,
            %new_value,
            "inventory adjusted"
        );

        Ok(AdjustOutcome {
            target: input.target,
            mode: input.mode,
            previous_value,
            new_value,
            delta: delta_for_tx,
            location_id: input.location_id,
            article_id: input.article_id,
            batch_id: input.batch_id,
            transaction_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn set_mode_replaces_the_value() {
        assert_eq!(compute_new_value(AdjustMode::Set, d("7.5"), d("3")), d("3"));
    }

    #[test]
    fn delta_mode_is_relative() {
        assert_eq!(
            compute_new_value(AdjustMode::Delta, d("7.5"), d("-3")),
            d("4.5")
        );
        assert_eq!(
            compute_new_value(AdjustMode::Delta, d("7.5"), d("2.25")),
            d("9.75")
        );
    }
}
