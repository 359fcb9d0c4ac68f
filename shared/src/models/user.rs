//! User models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Role;

/// A warehouse user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
