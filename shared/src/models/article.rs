//! Article (product) models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A paint or consumable article carried by the warehouse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub article_no: String,
    pub description: Option<String>,
    /// Unit of measure, e.g. KG or L
    pub uom: Option<String>,
    pub manufacturer: Option<String>,
    /// Vendor article number, e.g. 34665.91B6.7.171
    pub manufacturer_art_number: Option<String>,
    /// Low-stock alarm threshold (not yet enforced)
    pub reorder_threshold: Option<Decimal>,
    /// Paints require manufacturer batches; consumables use the system batch
    pub is_paint: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A single warehouse location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub code: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}
