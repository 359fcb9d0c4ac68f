//! Weigh-in draft and draft group models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{DraftStatus, DraftType};

/// A staged quantity movement awaiting approval
///
/// Drafts are never deleted; approval or rejection is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub id: i64,
    pub draft_group_id: i64,
    pub location_id: i64,
    pub article_id: i64,
    pub batch_id: i64,
    pub quantity_kg: Decimal,
    pub status: DraftStatus,
    pub draft_type: DraftType,
    pub created_by_user_id: Option<i64>,
    pub source: String,
    /// Globally-unique idempotency key supplied by the client
    pub client_event_id: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Header over one or more drafts approved/rejected as a unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftGroup {
    pub id: i64,
    pub name: Option<String>,
    pub status: DraftStatus,
    pub source: String,
    pub location_id: i64,
    pub created_by_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}
