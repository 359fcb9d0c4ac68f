//! Inventory count reconciliation
//!
//! Compares a counted total against stock + surplus for one key. Overages
//! land in surplus immediately; deficits reset surplus and stage a shortage
//! draft that only touches stock once approved.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult, Entity};
use crate::services::{draft_group, inventory, ledger};
use shared::types::{CountResult, DraftType, TxType};
use shared::validation::round_quantity;

/// Round a counted total and reject negatives before any lock is taken
pub fn validate_counted_total(counted: Decimal) -> AppResult<Decimal> {
    let counted = round_quantity(counted);
    if counted < Decimal::ZERO {
        return Err(AppError::Validation {
            message: "counted_total_qty must be non-negative".to_string(),
            details: json!({ "value": counted }),
        });
    }
    Ok(counted)
}

/// What a count implies for the counted key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountPlan {
    /// Counted more than the books say; the overage becomes surplus
    Over { delta: Decimal },
    /// Books match the count
    NoChange,
    /// Counted less; surplus resets (if any) and the rest is staged as a
    /// shortage draft
    Under {
        surplus_reset: Option<Decimal>,
        shortage: Decimal,
    },
}

/// Classify a counted total against the current buckets
pub fn classify_count(counted: Decimal, stock: Decimal, surplus: Decimal) -> CountPlan {
    let total = stock + surplus;
    if counted > total {
        CountPlan::Over {
            delta: counted - total,
        }
    } else if counted == total {
        CountPlan::NoChange
    } else {
        CountPlan::Under {
            surplus_reset: (surplus > Decimal::ZERO).then_some(surplus),
            shortage: total - counted,
        }
    }
}

/// Input for an inventory count
#[derive(Debug, Deserialize)]
pub struct CountInput {
    pub location_id: i64,
    pub article_id: i64,
    pub batch_id: i64,
    pub counted_total_qty: Decimal,
    pub note: Option<String>,
    pub client_event_id: Option<String>,
}

/// Result of an inventory count
#[derive(Debug, Serialize)]
pub struct CountOutcome {
    pub result: CountResult,
    pub previous_stock: Decimal,
    pub previous_surplus: Decimal,
    pub previous_total: Decimal,
    pub counted_total: Decimal,
    pub delta: Decimal,
    pub surplus_added: Option<Decimal>,
    pub surplus_reset: Option<Decimal>,
    pub shortage_draft_id: Option<i64>,
    pub shortage_group_id: Option<i64>,
    pub transaction_ids: Vec<i64>,
}

/// Inventory count service
#[derive(Clone)]
pub struct InventoryCountService {
    db: PgPool,
}

impl InventoryCountService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Reconcile one (location, article, batch) key against a counted total
    pub async fn perform(&self, actor_user_id: i64, input: CountInput) -> AppResult<CountOutcome> {
        let now = chrono::Utc::now();
        let counted = validate_counted_total(input.counted_total_qty)?;

        let mut tx = self.db.begin().await?;

        inventory::ensure_exists(&mut tx, Entity::User, "users", actor_user_id).await?;
        inventory::ensure_exists(&mut tx, Entity::Location, "locations", input.location_id)
            .await?;
        inventory::ensure_exists(&mut tx, Entity::Article, "articles", input.article_id).await?;
        inventory::ensure_exists(&mut tx, Entity::Batch, "batches", input.batch_id).await?;

        let stock = inventory::lock_or_create_stock(
            &mut tx,
            input.location_id,
            input.article_id,
            input.batch_id,
        )
        .await?;
        let surplus = inventory::lock_or_create_surplus(
            &mut tx,
            input.location_id,
            input.article_id,
            input.batch_id,
        )
        .await?;

        let previous_total = stock.quantity_kg + surplus.quantity_kg;
        let plan = classify_count(counted, stock.quantity_kg, surplus.quantity_kg);

        let client_event_id = input
            .client_event_id
            .unwrap_or_else(|| format!("inventory-count-{}", Uuid::new_v4()));

        let mut outcome = CountOutcome {
            result: CountResult::NoChange,
            previous_stock: stock.quantity_kg,
            previous_surplus: surplus.quantity_kg,
            previous_total,
            counted_total: counted,
            delta: counted - previous_total,
            surplus_added: None,
            surplus_reset: None,
            shortage_draft_id: None,
            shortage_group_id: None,
            transaction_ids: Vec::new(),
        };

        match plan {
            CountPlan::Over { delta } => {
                inventory::update_surplus_quantity(
                    &mut tx,
                    surplus.id,
                    surplus.quantity_kg + delta,
                )
                .await?;

                let tx_id = ledger::append(
                    &mut tx,
                    ledger::NewTransaction {
                        tx_type: TxType::InventoryAdjustment,
                        occurred_at: now,
                        location_id: input.location_id,
                        article_id: input.article_id,
                        batch_id: input.batch_id,
                        quantity_kg: delta,
                        user_id: Some(actor_user_id),
                        source: "inventory_count",
                        client_event_id: Some(&client_event_id),
                        meta: Some(json!({
                            "reason": "inventory_count_over",
                            "counted_total": counted,
                            "previous_total": previous_total,
                            "surplus_added": delta,
                            "note": input.note,
                        })),
                    },
                )
                .await?;

                outcome.result = CountResult::Over;
                outcome.surplus_added = Some(delta);
                outcome.transaction_ids.push(tx_id);
            }

            CountPlan::NoChange => {}

            CountPlan::Under {
                surplus_reset,
                shortage,
            } => {
                if let Some(surplus_before) = surplus_reset {
                    let reset_event_id = format!("{}-surplus-reset", client_event_id);
                    let tx_id = ledger::append(
                        &mut tx,
                        ledger::NewTransaction {
                            tx_type: TxType::InventoryAdjustment,
                            occurred_at: now,
                            location_id: input.location_id,
                            article_id: input.article_id,
                            batch_id: input.batch_id,
                            quantity_kg: -surplus_before,
                            user_id: Some(actor_user_id),
                            source: "inventory_count",
                            client_event_id: Some(&reset_event_id),
                            meta: Some(json!({
                                "reason": "inventory_count_surplus_reset",
                                "surplus_before": surplus_before,
                                "note": input.note,
                            })),
                        },
                    )
                    .await?;

                    inventory::update_surplus_quantity(&mut tx, surplus.id, Decimal::ZERO)
                        .await?;

                    outcome.surplus_reset = Some(surplus_before);
                    outcome.transaction_ids.push(tx_id);
                }

                // The deficit is staged, not applied; stock only moves when
                // the shortage draft is approved
                let group_name = draft_group::next_group_name(&mut tx, "inventory_count").await?;
                let group = draft_group::insert_group_tx(
                    &mut tx,
                    &group_name,
                    "inventory_count",
                    input.location_id,
                    actor_user_id,
                )
                .await?;

                let shortage_note = format!(
                    "Inventory count shortage: counted {}, expected {}. {}",
                    counted,
                    previous_total,
                    input.note.as_deref().unwrap_or("")
                );
                let shortage_event_id = format!("{}-shortage", client_event_id);
                let draft = draft_group::insert_draft_tx(
                    &mut tx,
                    group.id,
                    input.location_id,
                    input.article_id,
                    input.batch_id,
                    shortage,
                    DraftType::InventoryShortage,
                    actor_user_id,
                    "inventory_count",
                    &shortage_event_id,
                    Some(shortage_note.trim()),
                )
                .await?;

                outcome.result = CountResult::Under;
                outcome.shortage_draft_id = Some(draft.id);
                outcome.shortage_group_id = Some(group.id);
            }
        }

        tx.commit().await?;

        tracing::info!(
            article_id = input.article_id,
            batch_id = input.batch_id,
            result = outcome.result.as_str(),
            %counted,
            "inventory count performed"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn counted_over_adds_the_difference_to_surplus() {
        let plan = classify_count(d("12"), d("8"), d("2"));
        assert_eq!(plan, CountPlan::Over { delta: d("2") });
    }

    #[test]
    fn counted_equal_changes_nothing() {
        assert_eq!(classify_count(d("10"), d("8"), d("2")), CountPlan::NoChange);
    }

    #[test]
    fn counted_under_resets_surplus_and_stages_the_deficit() {
        let plan = classify_count(d("6"), d("8"), d("2"));
        assert_eq!(
            plan,
            CountPlan::Under {
                surplus_reset: Some(d("2")),
                shortage: d("4"),
            }
        );
    }

    #[test]
    fn counted_under_with_zero_surplus_skips_the_reset() {
        let plan = classify_count(d("6"), d("8"), Decimal::ZERO);
        assert_eq!(
            plan,
            CountPlan::Under {
                surplus_reset: None,
                shortage: d("2"),
            }
        );
    }

    #[test]
    fn negative_counted_totals_are_rejected() {
        assert!(validate_counted_total(d("-5")).is_err());
        assert!(validate_counted_total(d("-0.01")).is_err());
        // rounds up to zero, which is a legitimate empty-shelf count
        assert_eq!(validate_counted_total(d("-0.004")).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn shortage_equals_total_minus_counted() {
        match classify_count(d("0"), d("5.25"), d("1.75")) {
            CountPlan::Under { shortage, .. } => assert_eq!(shortage, d("7")),
            other => panic!("unexpected plan: {:?}", other),
        }
    }
}
