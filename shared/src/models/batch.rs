//! Batch models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Batch code assigned to consumables that carry no manufacturer batch
pub const SYSTEM_BATCH_CODE: &str = "NA";

/// Far-future expiry used for the system batch
pub fn system_batch_expiry() -> NaiveDate {
    NaiveDate::from_ymd_opt(2099, 12, 31).expect("valid date")
}

/// A manufacturer batch of an article, unique per (article, batch_code)
///
/// The expiry date is immutable once set; a NULL expiry may be backfilled
/// exactly once by a later receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: i64,
    pub article_id: i64,
    pub batch_code: String,
    pub received_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub note: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
