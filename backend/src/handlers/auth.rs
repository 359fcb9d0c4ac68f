//! HTTP handlers for authentication endpoints

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::auth::{AuthService, LoginInput, LoginResponse};
use crate::AppState;
use shared::models::User;

/// Log in with username and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<LoginResponse>> {
    let service = AuthService::new(state.db, &state.config);
    let response = service.login(input).await?;
    Ok(Json(response))
}

/// Return the authenticated user
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<User>> {
    let service = AuthService::new(state.db, &state.config);
    let user = service.me(current_user.0.user_id).await?;
    Ok(Json(user))
}
