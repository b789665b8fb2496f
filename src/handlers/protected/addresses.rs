// handlers/protected/addresses.rs - /api/contacts/:id/addresses[/:address_id]

use axum::extract::{Extension, Path, State};

use crate::database::models::AddressResource;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::validation::Payload;

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(contact_id): Path<String>,
    payload: Payload,
) -> ApiResult<AddressResource> {
    let address = state
        .addresses()
        .create(auth.owner(), parse_id(&contact_id), &payload)
        .await?;
    Ok(ApiResponse::created(address))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(contact_id): Path<String>,
) -> ApiResult<Vec<AddressResource>> {
    let addresses = state.addresses().list(auth.owner(), parse_id(&contact_id)).await?;
    Ok(ApiResponse::success(addresses))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((contact_id, id)): Path<(String, String)>,
) -> ApiResult<AddressResource> {
    let address = state
        .addresses()
        .get(auth.owner(), parse_id(&contact_id), parse_id(&id))
        .await?;
    Ok(ApiResponse::success(address))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((contact_id, id)): Path<(String, String)>,
    payload: Payload,
) -> ApiResult<AddressResource> {
    let address = state
        .addresses()
        .update(auth.owner(), parse_id(&contact_id), parse_id(&id), &payload)
        .await?;
    Ok(ApiResponse::success(address))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((contact_id, id)): Path<(String, String)>,
) -> ApiResult<bool> {
    let done = state
        .addresses()
        .delete(auth.owner(), parse_id(&contact_id), parse_id(&id))
        .await?;
    Ok(ApiResponse::success(done))
}
