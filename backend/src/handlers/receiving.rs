//! HTTP handlers for stock receiving

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::receiving::{ReceiveInput, ReceiveOutcome, ReceivingService};
use crate::AppState;

/// Receive stock into inventory
pub async fn receive_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ReceiveInput>,
) -> AppResult<Json<ReceiveOutcome>> {
    require_admin(&current_user.0)?;
    let service = ReceivingService::new(state.db, &state.config);
    let outcome = service.receive(current_user.0.user_id, input).await?;
    Ok(Json(outcome))
}
