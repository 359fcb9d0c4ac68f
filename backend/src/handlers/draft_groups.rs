//! HTTP handlers for draft group workflow

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::handlers::drafts::DecisionInput;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::draft_group::{
    CreateGroupInput, DraftGroupService, GroupApprovalOutcome, GroupDetail, GroupRejectOutcome,
};
use crate::AppState;
use shared::models::DraftGroup;
use shared::types::DraftStatus;

#[derive(Debug, Deserialize)]
pub struct GroupListQuery {
    pub status: Option<DraftStatus>,
}

#[derive(Debug, Deserialize)]
pub struct RenameGroupInput {
    pub name: String,
}

/// List draft groups
pub async fn list_draft_groups(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<GroupListQuery>,
) -> AppResult<Json<Vec<DraftGroup>>> {
    let service = DraftGroupService::new(state.db);
    let groups = service.list(query.status).await?;
    Ok(Json(groups))
}

/// Fetch one group with its lines
pub async fn get_draft_group(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(group_id): Path<i64>,
) -> AppResult<Json<GroupDetail>> {
    let service = DraftGroupService::new(state.db);
    let detail = service.get(group_id).await?;
    Ok(Json(detail))
}

/// Create a draft group with its lines
pub async fn create_draft_group(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateGroupInput>,
) -> AppResult<Json<GroupDetail>> {
    let service = DraftGroupService::new(state.db);
    let detail = service.create(current_user.0.user_id, input).await?;
    Ok(Json(detail))
}

/// Rename a draft group
pub async fn rename_draft_group(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(group_id): Path<i64>,
    Json(input): Json<RenameGroupInput>,
) -> AppResult<Json<DraftGroup>> {
    require_admin(&current_user.0)?;
    let service = DraftGroupService::new(state.db);
    let group = service.rename(group_id, &input.name).await?;
    Ok(Json(group))
}

/// Approve every line of a group atomically
pub async fn approve_draft_group(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(group_id): Path<i64>,
    Json(input): Json<DecisionInput>,
) -> AppResult<Json<GroupApprovalOutcome>> {
    require_admin(&current_user.0)?;
    let service = DraftGroupService::new(state.db);
    let outcome = service
        .approve(group_id, current_user.0.user_id, input.note.as_deref())
        .await?;
    Ok(Json(outcome))
}

/// Reject every line of a group atomically
pub async fn reject_draft_group(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(group_id): Path<i64>,
    Json(input): Json<DecisionInput>,
) -> AppResult<Json<GroupRejectOutcome>> {
    require_admin(&current_user.0)?;
    let service = DraftGroupService::new(state.db);
    let outcome = service
        .reject(group_id, current_user.0.user_id, input.note.as_deref())
        .await?;
    Ok(Json(outcome))
}
