//! Transaction ledger and approval audit models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::TxType;

/// One immutable ledger entry
///
/// Negative quantities are consumption; the ledger is the sole audit trail
/// and rows are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: i64,
    pub tx_type: TxType,
    pub occurred_at: DateTime<Utc>,
    pub location_id: i64,
    pub article_id: i64,
    pub batch_id: i64,
    pub quantity_kg: Decimal,
    pub user_id: Option<i64>,
    pub source: String,
    pub client_event_id: Option<String>,
    pub meta: Option<serde_json::Value>,
}

/// Audit record of one approve/reject decision on a draft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalAction {
    pub id: i64,
    pub draft_id: i64,
    pub action: String,
    pub actor_user_id: i64,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}
