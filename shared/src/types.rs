//! Common enums and types used across the platform

use serde::{Deserialize, Serialize};

/// User roles
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Operator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Operator => "OPERATOR",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ADMIN" => Some(Role::Admin),
            "OPERATOR" => Some(Role::Operator),
            _ => None,
        }
    }
}

/// Lifecycle status of a draft or draft group
///
/// DRAFT is the only non-terminal state; APPROVED and REJECTED are final.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum DraftStatus {
    Draft,
    Approved,
    Rejected,
}

impl DraftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::Draft => "DRAFT",
            DraftStatus::Approved => "APPROVED",
            DraftStatus::Rejected => "REJECTED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(DraftStatus::Draft),
            "APPROVED" => Some(DraftStatus::Approved),
            "REJECTED" => Some(DraftStatus::Rejected),
            _ => None,
        }
    }

    /// Whether the status can still change
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DraftStatus::Draft)
    }
}

/// Consumption rule applied when a draft is approved
///
/// WEIGH_IN drafts consume surplus first, then stock. INVENTORY_SHORTAGE
/// drafts consume stock only and never touch surplus.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftType {
    WeighIn,
    InventoryShortage,
}

impl DraftType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftType::WeighIn => "WEIGH_IN",
            DraftType::InventoryShortage => "INVENTORY_SHORTAGE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "WEIGH_IN" => Some(DraftType::WeighIn),
            "INVENTORY_SHORTAGE" => Some(DraftType::InventoryShortage),
            _ => None,
        }
    }
}

/// Ledger transaction types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxType {
    WeighIn,
    SurplusConsumed,
    StockConsumed,
    InventoryAdjustment,
    StockReceipt,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::WeighIn => "WEIGH_IN",
            TxType::SurplusConsumed => "SURPLUS_CONSUMED",
            TxType::StockConsumed => "STOCK_CONSUMED",
            TxType::InventoryAdjustment => "INVENTORY_ADJUSTMENT",
            TxType::StockReceipt => "STOCK_RECEIPT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "WEIGH_IN" => Some(TxType::WeighIn),
            "SURPLUS_CONSUMED" => Some(TxType::SurplusConsumed),
            "STOCK_CONSUMED" => Some(TxType::StockConsumed),
            "INVENTORY_ADJUSTMENT" => Some(TxType::InventoryAdjustment),
            "STOCK_RECEIPT" => Some(TxType::StockReceipt),
            _ => None,
        }
    }
}

/// Which inventory bucket an adjustment targets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdjustTarget {
    Stock,
    Surplus,
}

impl AdjustTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustTarget::Stock => "stock",
            AdjustTarget::Surplus => "surplus",
        }
    }
}

/// How an adjustment quantity is interpreted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdjustMode {
    /// Absolute value (must be >= 0)
    Set,
    /// Relative change (may be negative)
    Delta,
}

impl AdjustMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustMode::Set => "set",
            AdjustMode::Delta => "delta",
        }
    }
}

/// Outcome of an inventory count reconciliation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CountResult {
    Over,
    NoChange,
    Under,
}

impl CountResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountResult::Over => "over",
            CountResult::NoChange => "no_change",
            CountResult::Under => "under",
        }
    }
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 50,
        }
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}
