//! Error handling for the Paintrack warehouse platform
//!
//! Every failure carries a stable code, a human-readable message and a
//! structured details map, so the caller can render a precise message
//! without re-deriving anything.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use shared::validation::ValidationError;

/// Entities that can be missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Draft,
    DraftGroup,
    User,
    Article,
    Batch,
    Location,
}

impl Entity {
    fn code(&self) -> &'static str {
        match self {
            Entity::Draft => "DRAFT_NOT_FOUND",
            Entity::DraftGroup => "GROUP_NOT_FOUND",
            Entity::User => "USER_NOT_FOUND",
            Entity::Article => "ARTICLE_NOT_FOUND",
            Entity::Batch => "BATCH_NOT_FOUND",
            Entity::Location => "LOCATION_NOT_FOUND",
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Entity::Draft => "Draft",
            Entity::DraftGroup => "Draft group",
            Entity::User => "User",
            Entity::Article => "Article",
            Entity::Batch => "Batch",
            Entity::Location => "Location",
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication / authorization
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Validation errors (raised before any lock is taken)
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: serde_json::Value,
    },

    #[error("Invalid batch code format: {value}")]
    InvalidBatchFormat { value: String },

    #[error("Batch is required for paint article {0}")]
    BatchRequired(String),

    // Missing entities
    #[error("{} {id} not found", entity.name())]
    NotFound { entity: Entity, id: i64 },

    #[error("Article {0} not found")]
    ArticleNoNotFound(String),

    // State conflicts
    #[error("Cannot modify draft with status {current_status}")]
    DraftNotDraft { current_status: String },

    #[error("Cannot modify group with status {current_status}")]
    GroupNotDraft { current_status: String },

    #[error("Group {0} has no lines")]
    GroupEmpty(i64),

    #[error("A draft with client_event_id '{client_event_id}' already exists")]
    DuplicateEventId { client_event_id: String },

    // Inventory conflicts (trigger full rollback of the operation)
    #[error("Insufficient stock: required {required}, available {available_stock} stock / {available_surplus} surplus")]
    InsufficientStock {
        required: Decimal,
        available_stock: Decimal,
        available_surplus: Decimal,
        context: Option<String>,
    },

    #[error("Adjustment would result in negative {target}: {would_be}kg")]
    NegativeInventory {
        target: String,
        previous_value: Decimal,
        delta: Decimal,
        would_be: Decimal,
    },

    #[error("Batch {batch_code} already has expiry date {existing_expiry}, but received {provided_expiry}")]
    BatchExpiryMismatch {
        batch_code: String,
        existing_expiry: NaiveDate,
        provided_expiry: NaiveDate,
    },

    #[error("Location {0} is not enabled for receiving")]
    LocationNotAllowed(i64),

    // Infrastructure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidBatchFormat { value } => {
                AppError::InvalidBatchFormat { value }
            }
            other => AppError::Validation {
                message: other.to_string(),
                details: json!({}),
            },
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
}

impl ErrorDetail {
    pub fn new(code: &str, message: String, details: serde_json::Value) -> Self {
        Self {
            code: code.to_string(),
            message,
            details,
        }
    }
}

/// True when the database rejected a duplicate draft idempotency key
fn is_duplicate_event_id(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.constraint())
        .map(|c| c.contains("client_event_id"))
        .unwrap_or(false)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new(
                    "INVALID_CREDENTIALS",
                    "Invalid username or password".to_string(),
                    json!({}),
                ),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_TOKEN", "Invalid token".to_string(), json!({})),
            ),
            AppError::Forbidden(message) => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new("FORBIDDEN", message.clone(), json!({})),
            ),
            AppError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", message.clone(), details.clone()),
            ),
            AppError::InvalidBatchFormat { value } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "INVALID_BATCH_FORMAT",
                    format!(
                        "Invalid batch code format: {}. Must be 4-5 digits (Mankiewicz) or 9-12 digits (Akzo).",
                        value
                    ),
                    json!({ "value": value }),
                ),
            ),
            AppError::BatchRequired(article_no) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "BATCH_REQUIRED",
                    format!("Batch ID is required for paint article {}", article_no),
                    json!({ "article_no": article_no }),
                ),
            ),
            AppError::NotFound { entity, id } => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new(
                    entity.code(),
                    format!("{} {} not found", entity.name(), id),
                    json!({ "id": id }),
                ),
            ),
            AppError::ArticleNoNotFound(article_no) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new(
                    "ARTICLE_NOT_FOUND",
                    self.to_string(),
                    json!({ "article_no": article_no }),
                ),
            ),
            AppError::DraftNotDraft { current_status } => (
                StatusCode::CONFLICT,
                ErrorDetail::new(
                    "DRAFT_NOT_DRAFT",
                    self.to_string(),
                    json!({ "current_status": current_status }),
                ),
            ),
            AppError::GroupNotDraft { current_status } => (
                StatusCode::CONFLICT,
                ErrorDetail::new(
                    "GROUP_NOT_DRAFT",
                    self.to_string(),
                    json!({ "current_status": current_status }),
                ),
            ),
            AppError::GroupEmpty(group_id) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "GROUP_EMPTY",
                    self.to_string(),
                    json!({ "group_id": group_id }),
                ),
            ),
            AppError::DuplicateEventId { client_event_id } => (
                StatusCode::CONFLICT,
                ErrorDetail::new(
                    "DUPLICATE_EVENT_ID",
                    self.to_string(),
                    json!({ "client_event_id": client_event_id }),
                ),
            ),
            AppError::InsufficientStock {
                required,
                available_stock,
                available_surplus,
                context,
            } => {
                let shortage = required - available_stock - available_surplus;
                (
                    StatusCode::CONFLICT,
                    ErrorDetail::new(
                        "INSUFFICIENT_STOCK",
                        context.clone().unwrap_or_else(|| {
                            format!(
                                "Insufficient stock: required {}, available {} stock / {} surplus",
                                required, available_stock, available_surplus
                            )
                        }),
                        json!({
                            "required": required,
                            "available_stock": available_stock,
                            "available_surplus": available_surplus,
                            "shortage": shortage.max(Decimal::ZERO),
                        }),
                    ),
                )
            }
            AppError::NegativeInventory {
                target,
                previous_value,
                delta,
                would_be,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new(
                    "NEGATIVE_INVENTORY_NOT_ALLOWED",
                    self.to_string(),
                    json!({
                        "target": target,
                        "previous_value": previous_value,
                        "delta": delta,
                        "would_be": would_be,
                    }),
                ),
            ),
            AppError::BatchExpiryMismatch {
                batch_code,
                existing_expiry,
                provided_expiry,
            } => (
                StatusCode::CONFLICT,
                ErrorDetail::new(
                    "BATCH_EXPIRY_MISMATCH",
                    self.to_string(),
                    json!({
                        "batch_code": batch_code,
                        "existing_expiry": existing_expiry,
                        "provided_expiry": provided_expiry,
                    }),
                ),
            ),
            AppError::LocationNotAllowed(location_id) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "LOCATION_NOT_ALLOWED",
                    self.to_string(),
                    json!({ "location_id": location_id }),
                ),
            ),
            AppError::Database(err) if is_duplicate_event_id(err) => (
                StatusCode::CONFLICT,
                ErrorDetail::new(
                    "DUPLICATE_EVENT_ID",
                    "A draft with this client_event_id already exists".to_string(),
                    json!({}),
                ),
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    json!({}),
                ),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    json!({}),
                ),
            ),
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request failed: {:?}", self);
        }

        (status, Json(ErrorResponse { error: detail })).into_response()
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;
