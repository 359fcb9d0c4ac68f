//! Stock and surplus models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Regular committed inventory for one (location, article, batch) key
///
/// Created lazily at 0 on first write; quantity never goes negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    pub id: i64,
    pub location_id: i64,
    pub article_id: i64,
    pub batch_id: i64,
    pub quantity_kg: Decimal,
    pub last_updated: DateTime<Utc>,
}

/// Reclaimed/excess inventory, consumed preferentially over stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surplus {
    pub id: i64,
    pub location_id: i64,
    pub article_id: i64,
    pub batch_id: i64,
    pub quantity_kg: Decimal,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One row of the per-batch inventory summary view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySummaryItem {
    pub location_id: i64,
    pub article_id: i64,
    pub article_no: String,
    pub description: Option<String>,
    pub batch_id: i64,
    pub batch_code: String,
    pub expiry_date: Option<chrono::NaiveDate>,
    pub stock_qty: Decimal,
    pub surplus_qty: Decimal,
    pub total_qty: Decimal,
    pub updated_at: Option<DateTime<Utc>>,
}
