//! HTTP handlers for single-draft approval workflow

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::approval::{ApprovalOutcome, ApprovalService, RejectOutcome};
use crate::AppState;
use shared::models::Draft;
use shared::types::{DraftStatus, DraftType};

/// Filters for the draft listing
#[derive(Debug, Deserialize)]
pub struct DraftListQuery {
    pub status: Option<DraftStatus>,
    pub draft_type: Option<DraftType>,
}

/// Optional note attached to an approve/reject decision
#[derive(Debug, Default, Deserialize)]
pub struct DecisionInput {
    pub note: Option<String>,
}

/// List drafts
pub async fn list_drafts(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<DraftListQuery>,
) -> AppResult<Json<Vec<Draft>>> {
    let service = ApprovalService::new(state.db);
    let drafts = service.list(query.status, query.draft_type).await?;
    Ok(Json(drafts))
}

/// Fetch one draft
pub async fn get_draft(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(draft_id): Path<i64>,
) -> AppResult<Json<Draft>> {
    let service = ApprovalService::new(state.db);
    let draft = service.get(draft_id).await?;
    Ok(Json(draft))
}

/// Approve a draft
pub async fn approve_draft(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(draft_id): Path<i64>,
    Json(input): Json<DecisionInput>,
) -> AppResult<Json<ApprovalOutcome>> {
    require_admin(&current_user.0)?;
    let service = ApprovalService::new(state.db);
    let outcome = service
        .approve(draft_id, current_user.0.user_id, input.note.as_deref())
        .await?;
    Ok(Json(outcome))
}

/// Reject a draft
pub async fn reject_draft(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(draft_id): Path<i64>,
    Json(input): Json<DecisionInput>,
) -> AppResult<Json<RejectOutcome>> {
    require_admin(&current_user.0)?;
    let service = ApprovalService::new(state.db);
    let outcome = service
        .reject(draft_id, current_user.0.user_id, input.note.as_deref())
        .await?;
    Ok(Json(outcome))
}
