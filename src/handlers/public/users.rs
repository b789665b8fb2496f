// handlers/public/users.rs - POST /api/users, POST /api/users/login

use axum::extract::State;

use crate::database::models::UserResource;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validation::Payload;

/// POST /api/users - Register a new account (201, no token)
pub async fn register(State(state): State<AppState>, payload: Payload) -> ApiResult<UserResource> {
    let user = state.users().register(&payload).await?;
    Ok(ApiResponse::created(user))
}

/// POST /api/users/login - Exchange username and password for a token
pub async fn login(State(state): State<AppState>, payload: Payload) -> ApiResult<UserResource> {
    let user = state.users().login(&payload).await?;
    Ok(ApiResponse::success(user))
}
