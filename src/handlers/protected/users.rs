// handlers/protected/users.rs - /api/users/current, /api/users/logout

use axum::extract::{Extension, State};

use crate::database::models::UserResource;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::validation::Payload;

pub async fn current(Extension(auth): Extension<AuthUser>) -> ApiResult<UserResource> {
    Ok(ApiResponse::success(UserResource::from(&auth.0)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    payload: Payload,
) -> ApiResult<UserResource> {
    let user = state.users().update(&auth.0, &payload).await?;
    Ok(ApiResponse::success(user))
}

/// DELETE /api/users/logout - Clears the token; later requests with it get 401
pub async fn logout(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<bool> {
    let done = state.users().logout(&auth.0).await?;
    Ok(ApiResponse::success(done))
}
