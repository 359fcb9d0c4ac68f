//! Draft groups - creation and atomic group approval
//!
//! Group approval is two-pass: lock everything, validate every line against
//! the locked snapshot, and only then execute. Inventory rows are locked in
//! ascending (article_id, batch_id) order, surplus before stock within each
//! key, so concurrent approvals of any kind cannot deadlock.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::error::{AppError, AppResult, Entity};
use crate::services::approval::{self, ApprovalOutcome, DraftRow, RejectOutcome};
use crate::services::{batch, inventory};
use shared::models::{Draft, DraftGroup};
use shared::types::{DraftStatus, DraftType};
use shared::validation::{validate_client_event_id, validate_quantity};

/// Demand per (article, batch) key, split by consumption rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyNeeds {
    pub weigh_in: Decimal,
    pub shortage: Decimal,
}

/// Aggregate line demand per inventory key
///
/// The `BTreeMap` iterates keys in ascending order, which is the lock order.
pub fn aggregate_needs(
    lines: &[(i64, i64, DraftType, Decimal)],
) -> BTreeMap<(i64, i64), KeyNeeds> {
    let mut needs: BTreeMap<(i64, i64), KeyNeeds> = BTreeMap::new();
    for &(article_id, batch_id, draft_type, qty) in lines {
        let entry = needs.entry((article_id, batch_id)).or_default();
        match draft_type {
            DraftType::WeighIn => entry.weigh_in += qty,
            DraftType::InventoryShortage => entry.shortage += qty,
        }
    }
    needs
}

/// Validate one key's demand against its locked quantities
///
/// Shortage demand must be covered by stock alone; weigh-in demand then
/// consumes surplus first and the remainder from what stock is left.
pub fn check_key_availability(
    article_id: i64,
    batch_id: i64,
    needs: KeyNeeds,
    stock_available: Decimal,
    surplus_available: Decimal,
) -> AppResult<()> {
    if stock_available < needs.shortage {
        return Err(AppError::InsufficientStock {
            required: needs.shortage,
            available_stock: stock_available,
            available_surplus: Decimal::ZERO,
            context: Some(format!(
                "Insufficient stock for shortage line (Article {}, Batch {})",
                article_id, batch_id
            )),
        });
    }

    let remaining_stock = stock_available - needs.shortage;
    let use_surplus = surplus_available.min(needs.weigh_in);
    let still_needed = needs.weigh_in - use_surplus;

    if remaining_stock < still_needed {
        return Err(AppError::InsufficientStock {
            required: needs.weigh_in,
            available_stock: remaining_stock,
            available_surplus: surplus_available,
            context: Some(format!(
                "Insufficient inventory for weigh-in line (Article {}, Batch {})",
                article_id, batch_id
            )),
        });
    }

    Ok(())
}

/// One line of a group creation request
#[derive(Debug, Deserialize)]
pub struct GroupLineInput {
    pub article_id: i64,
    pub batch_id: Option<i64>,
    pub quantity_kg: Decimal,
    pub draft_type: Option<DraftType>,
    pub client_event_id: String,
    pub note: Option<String>,
}

/// Input for creating a draft group
#[derive(Debug, Deserialize)]
pub struct CreateGroupInput {
    pub location_id: i64,
    pub name: Option<String>,
    pub source: Option<String>,
    pub lines: Vec<GroupLineInput>,
}

/// A group together with its lines
#[derive(Debug, Serialize)]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: DraftGroup,
    pub lines: Vec<Draft>,
}

/// Result of approving a group
#[derive(Debug, Serialize)]
pub struct GroupApprovalOutcome {
    pub group_id: i64,
    pub new_status: DraftStatus,
    pub results: Vec<ApprovalOutcome>,
}

/// Result of rejecting a group
#[derive(Debug, Serialize)]
pub struct GroupRejectOutcome {
    pub group_id: i64,
    pub new_status: DraftStatus,
    pub results: Vec<RejectOutcome>,
}

#[derive(Debug, sqlx::FromRow)]
struct GroupRow {
    id: i64,
    name: Option<String>,
    status: String,
    source: String,
    location_id: i64,
    created_by_user_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl GroupRow {
    fn into_model(self) -> AppResult<DraftGroup> {
        let status = DraftStatus::from_str(&self.status)
            .ok_or_else(|| anyhow::anyhow!("unknown group status: {}", self.status))?;
        Ok(DraftGroup {
            id: self.id,
            name: self.name,
            status,
            source: self.source,
            location_id: self.location_id,
            created_by_user_id: self.created_by_user_id,
            created_at: self.created_at,
        })
    }
}

const GROUP_COLUMNS: &str =
    "id, name, status, source, location_id, created_by_user_id, created_at";

/// Generate the next auto-name for a group from this source
///
/// Format: `{Source}Draft_{NNN}-{YYYY-MM-DD}`, e.g. `AdminDraft_001-2026-02-07`.
/// The per-(source, day) counter is an upsert-increment, so concurrent
/// creators never get the same number.
pub(crate) async fn next_group_name(conn: &mut PgConnection, source: &str) -> AppResult<String> {
    let today = Utc::now().date_naive();

    let counter = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO draft_group_counters (source, day, counter)
        VALUES ($1, $2, 1)
        ON CONFLICT (source, day)
        DO UPDATE SET counter = draft_group_counters.counter + 1
        RETURNING counter
        "#,
    )
    .bind(source)
    .bind(today)
    .fetch_one(conn)
    .await?;

    Ok(format!(
        "{}_{:03}-{}",
        source_prefix(source),
        counter,
        today.format("%Y-%m-%d")
    ))
}

fn source_prefix(source: &str) -> String {
    let stripped = source.strip_prefix("ui_").unwrap_or(source).replace('_', "");
    let mut chars = stripped.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    format!("{}Draft", capitalized)
}

/// Insert a group header, returning its row
pub(crate) async fn insert_group_tx(
    conn: &mut PgConnection,
    name: &str,
    source: &str,
    location_id: i64,
    created_by_user_id: i64,
) -> AppResult<DraftGroup> {
    let row = sqlx::query_as::<_, GroupRow>(&format!(
        r#"
        INSERT INTO draft_groups (name, source, location_id, created_by_user_id)
        VALUES ($1, $2, $3, $4)
        RETURNING {}
        "#,
        GROUP_COLUMNS
    ))
    .bind(name)
    .bind(source)
    .bind(location_id)
    .bind(created_by_user_id)
    .fetch_one(conn)
    .await?;

    row.into_model()
}

/// Reject creation when the idempotency key was already used
pub(crate) async fn ensure_event_id_unused(
    conn: &mut PgConnection,
    client_event_id: &str,
) -> AppResult<()> {
    let existing =
        sqlx::query_scalar::<_, i64>("SELECT id FROM weigh_in_drafts WHERE client_event_id = $1")
            .bind(client_event_id)
            .fetch_optional(conn)
            .await?;

    if existing.is_some() {
        return Err(AppError::DuplicateEventId {
            client_event_id: client_event_id.to_string(),
        });
    }
    Ok(())
}

/// Insert one draft line, returning the created draft
#[allow(clippy::too_many_arguments)]
pub(crate) async fn insert_draft_tx(
    conn: &mut PgConnection,
    draft_group_id: i64,
    location_id: i64,
    article_id: i64,
    batch_id: i64,
    quantity_kg: Decimal,
    draft_type: DraftType,
    created_by_user_id: i64,
    source: &str,
    client_event_id: &str,
    note: Option<&str>,
) -> AppResult<Draft> {
    let row = sqlx::query_as::<_, DraftRow>(
        r#"
        INSERT INTO weigh_in_drafts
            (draft_group_id, location_id, article_id, batch_id, quantity_kg,
             draft_type, created_by_user_id, source, client_event_id, note)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, draft_group_id, location_id, article_id, batch_id,
                  quantity_kg, status, draft_type, created_by_user_id, source,
                  client_event_id, note, created_at
        "#,
    )
    .bind(draft_group_id)
    .bind(location_id)
    .bind(article_id)
    .bind(batch_id)
    .bind(quantity_kg)
    .bind(draft_type.as_str())
    .bind(created_by_user_id)
    .bind(source)
    .bind(client_event_id)
    .bind(note)
    .fetch_one(conn)
    .await?;

    row.into_model()
}

#[derive(Debug, sqlx::FromRow)]
struct ArticleFlags {
    article_no: String,
    is_paint: bool,
}

/// Draft group service
#[derive(Clone)]
pub struct DraftGroupService {
    db: PgPool,
}

impl DraftGroupService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a group with its lines atomically
    pub async fn create(
        &self,
        actor_user_id: i64,
        input: CreateGroupInput,
    ) -> AppResult<GroupDetail> {
        let source = input.source.unwrap_or_else(|| "ui_admin".to_string());

        let mut tx = self.db.begin().await?;

        inventory::ensure_exists(&mut tx, Entity::Location, "locations", input.location_id)
            .await?;

        let name = match input.name {
            Some(name) => name,
            None => next_group_name(&mut tx, &source).await?,
        };

        let group = insert_group_tx(&mut tx, &name, &source, input.location_id, actor_user_id)
            .await?;

        let mut lines = Vec::with_capacity(input.lines.len());
        for line in input.lines {
            let article = sqlx::query_as::<_, ArticleFlags>(
                "SELECT article_no, is_paint FROM articles WHERE id = $1",
            )
            .bind(line.article_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound {
                entity: Entity::Article,
                id: line.article_id,
            })?;

            let batch_id = match line.batch_id {
                Some(batch_id) => {
                    inventory::ensure_exists(&mut tx, Entity::Batch, "batches", batch_id).await?;
                    batch_id
                }
                None => {
                    if article.is_paint {
                        return Err(AppError::BatchRequired(article.article_no));
                    }
                    batch::get_or_create_system_batch(&mut tx, line.article_id).await?
                }
            };

            let client_event_id = validate_client_event_id(Some(&line.client_event_id))?;
            ensure_event_id_unused(&mut tx, &client_event_id).await?;

            let qty = validate_quantity(line.quantity_kg, "quantity_kg")?;
            let draft_type = line.draft_type.unwrap_or(DraftType::WeighIn);

            let draft = insert_draft_tx(
                &mut tx,
                group.id,
                input.location_id,
                line.article_id,
                batch_id,
                qty,
                draft_type,
                actor_user_id,
                &source,
                &client_event_id,
                line.note.as_deref(),
            )
            .await?;
            lines.push(draft);
        }

        tx.commit().await?;

        tracing::info!(group_id = group.id, line_count = lines.len(), "draft group created");
        Ok(GroupDetail { group, lines })
    }

    /// Rename a group; only allowed while it is still a draft
    pub async fn rename(&self, group_id: i64, name: &str) -> AppResult<DraftGroup> {
        let mut tx = self.db.begin().await?;

        let row = lock_group(&mut tx, group_id).await?;
        if row.status != DraftStatus::Draft.as_str() {
            return Err(AppError::GroupNotDraft {
                current_status: row.status,
            });
        }

        let row = sqlx::query_as::<_, GroupRow>(&format!(
            "UPDATE draft_groups SET name = $1 WHERE id = $2 RETURNING {}",
            GROUP_COLUMNS
        ))
        .bind(name)
        .bind(group_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.into_model()
    }

    /// Approve every line of a group atomically
    ///
    /// Either all lines apply or none do; the first failing pre-check aborts
    /// the whole transaction.
    pub async fn approve(
        &self,
        group_id: i64,
        actor_user_id: i64,
        note: Option<&str>,
    ) -> AppResult<GroupApprovalOutcome> {
        let mut tx = self.db.begin().await?;

        let group = lock_group(&mut tx, group_id).await?;
        if group.status != DraftStatus::Draft.as_str() {
            return Err(AppError::GroupNotDraft {
                current_status: group.status,
            });
        }

        let drafts = lock_group_lines(&mut tx, group_id).await?;
        if drafts.is_empty() {
            return Err(AppError::GroupEmpty(group_id));
        }

        let line_demands: Vec<(i64, i64, DraftType, Decimal)> = drafts
            .iter()
            .map(|d| {
                let draft_type = DraftType::from_str(&d.draft_type)
                    .ok_or_else(|| anyhow::anyhow!("unknown draft type: {}", d.draft_type))?;
                Ok((d.article_id, d.batch_id, draft_type, d.quantity_kg))
            })
            .collect::<AppResult<Vec<_>>>()?;

        let needs = aggregate_needs(&line_demands);

        // Pre-check against the locked snapshot; ascending key order is the
        // documented lock order, surplus before stock within each key as in
        // single-draft approval
        for (&(article_id, batch_id), &key_needs) in &needs {
            let surplus =
                inventory::lock_surplus(&mut tx, group.location_id, article_id, batch_id).await?;
            let stock =
                inventory::lock_stock(&mut tx, group.location_id, article_id, batch_id).await?;

            let stock_qty = stock.map(|r| r.quantity_kg).unwrap_or(Decimal::ZERO);
            let surplus_qty = surplus.map(|r| r.quantity_kg).unwrap_or(Decimal::ZERO);

            check_key_availability(article_id, batch_id, key_needs, stock_qty, surplus_qty)?;
        }

        // Execution cannot fail availability checks after the pre-check
        let mut results = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            let outcome =
                approval::approve_draft_tx(&mut tx, draft.id, actor_user_id, note).await?;
            results.push(outcome);
        }

        set_group_status(&mut tx, group_id, DraftStatus::Approved).await?;
        tx.commit().await?;

        tracing::info!(group_id, line_count = results.len(), "draft group approved");
        Ok(GroupApprovalOutcome {
            group_id,
            new_status: DraftStatus::Approved,
            results,
        })
    }

    /// Reject every line of a group atomically
    pub async fn reject(
        &self,
        group_id: i64,
        actor_user_id: i64,
        note: Option<&str>,
    ) -> AppResult<GroupRejectOutcome> {
        let mut tx = self.db.begin().await?;

        let group = lock_group(&mut tx, group_id).await?;
        if group.status != DraftStatus::Draft.as_str() {
            return Err(AppError::GroupNotDraft {
                current_status: group.status,
            });
        }

        let drafts = lock_group_lines(&mut tx, group_id).await?;

        let mut results = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            let outcome = approval::reject_draft_tx(&mut tx, draft.id, actor_user_id, note).await?;
            results.push(outcome);
        }

        set_group_status(&mut tx, group_id, DraftStatus::Rejected).await?;
        tx.commit().await?;

        tracing::info!(group_id, "draft group rejected");
        Ok(GroupRejectOutcome {
            group_id,
            new_status: DraftStatus::Rejected,
            results,
        })
    }

    /// List groups, newest first, optionally filtered by status
    pub async fn list(&self, status: Option<DraftStatus>) -> AppResult<Vec<DraftGroup>> {
        let rows = sqlx::query_as::<_, GroupRow>(&format!(
            r#"
            SELECT {} FROM draft_groups
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            "#,
            GROUP_COLUMNS
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(GroupRow::into_model).collect()
    }

    /// Fetch one group with its lines
    pub async fn get(&self, group_id: i64) -> AppResult<GroupDetail> {
        let row = sqlx::query_as::<_, GroupRow>(&format!(
            "SELECT {} FROM draft_groups WHERE id = $1",
            GROUP_COLUMNS
        ))
        .bind(group_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound {
            entity: Entity::DraftGroup,
            id: group_id,
        })?;

        let group = row.into_model()?;

        let lines = sqlx::query_as::<_, DraftRow>(
            r#"
            SELECT id, draft_group_id, location_id, article_id, batch_id,
                   quantity_kg, status, draft_type, created_by_user_id, source,
                   client_event_id, note, created_at
            FROM weigh_in_drafts
            WHERE draft_group_id = $1
            ORDER BY id
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(DraftRow::into_model)
        .collect::<AppResult<Vec<_>>>()?;

        Ok(GroupDetail { group, lines })
    }
}

async fn lock_group(conn: &mut PgConnection, group_id: i64) -> AppResult<GroupRow> {
    sqlx::query_as::<_, GroupRow>(&format!(
        "SELECT {} FROM draft_groups WHERE id = $1 FOR UPDATE",
        GROUP_COLUMNS
    ))
    .bind(group_id)
    .fetch_optional(conn)
    .await?
    .ok_or(AppError::NotFound {
        entity: Entity::DraftGroup,
        id: group_id,
    })
}

async fn lock_group_lines(conn: &mut PgConnection, group_id: i64) -> AppResult<Vec<DraftRow>> {
    let rows = sqlx::query_as::<_, DraftRow>(
        r#"
        SELECT id, draft_group_id, location_id, article_id, batch_id,
               quantity_kg, status, draft_type, created_by_user_id, source,
               client_event_id, note, created_at
        FROM weigh_in_drafts
        WHERE draft_group_id = $1
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(group_id)
    .fetch_all(conn)
    .await?;

    Ok(rows)
}

async fn set_group_status(
    conn: &mut PgConnection,
    group_id: i64,
    status: DraftStatus,
) -> AppResult<()> {
    sqlx::query("UPDATE draft_groups SET status = $1 WHERE id = $2")
        .bind(status.as_str())
        .bind(group_id)
        .execute(conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn needs_sum_per_key_and_split_by_type() {
        let lines = vec![
            (1, 10, DraftType::WeighIn, d("2.5")),
            (1, 10, DraftType::WeighIn, d("1.5")),
            (1, 10, DraftType::InventoryShortage, d("3")),
            (2, 20, DraftType::WeighIn, d("7")),
        ];
        let needs = aggregate_needs(&lines);

        assert_eq!(needs.len(), 2);
        assert_eq!(needs[&(1, 10)].weigh_in, d("4"));
        assert_eq!(needs[&(1, 10)].shortage, d("3"));
        assert_eq!(needs[&(2, 20)].weigh_in, d("7"));
        assert_eq!(needs[&(2, 20)].shortage, Decimal::ZERO);
    }

    #[test]
    fn needs_iterate_in_ascending_key_order() {
        let lines = vec![
            (5, 1, DraftType::WeighIn, d("1")),
            (1, 9, DraftType::WeighIn, d("1")),
            (1, 2, DraftType::WeighIn, d("1")),
        ];
        let keys: Vec<_> = aggregate_needs(&lines).into_keys().collect();
        assert_eq!(keys, vec![(1, 2), (1, 9), (5, 1)]);
    }

    #[test]
    fn shortage_demand_is_charged_to_stock_before_weigh_in() {
        let needs = KeyNeeds {
            weigh_in: d("5"),
            shortage: d("4"),
        };
        // stock 8: shortage takes 4, leaving 4; surplus 1 + stock 4 = 5 covers weigh-in
        check_key_availability(1, 1, needs, d("8"), d("1")).unwrap();

        // stock 7: shortage takes 4, leaving 3; surplus 1 + stock 3 < 5
        let err = check_key_availability(1, 1, needs, d("7"), d("1")).unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { .. }));
    }

    #[test]
    fn shortage_alone_exceeding_stock_fails() {
        let needs = KeyNeeds {
            weigh_in: Decimal::ZERO,
            shortage: d("4"),
        };
        let err = check_key_availability(1, 1, needs, d("3.99"), d("100")).unwrap_err();
        match err {
            AppError::InsufficientStock {
                available_surplus, ..
            } => assert_eq!(available_surplus, Decimal::ZERO),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn auto_name_prefix_drops_ui_and_underscores() {
        assert_eq!(source_prefix("ui_admin"), "AdminDraft");
        assert_eq!(source_prefix("ui_operator"), "OperatorDraft");
        assert_eq!(source_prefix("inventory_count"), "InventorycountDraft");
    }
}
