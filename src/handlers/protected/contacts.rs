// handlers/protected/contacts.rs - /api/contacts and /api/contacts/:id

use axum::extract::{Extension, Path, Query, State};

use crate::database::models::ContactResource;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Paginated};
use crate::search::{ContactSearch, SearchQuery};
use crate::state::AppState;
use crate::validation::Payload;

const CONTACTS_PATH: &str = "/api/contacts";

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    payload: Payload,
) -> ApiResult<ContactResource> {
    let contact = state.contacts().create(auth.owner(), &payload).await?;
    Ok(ApiResponse::created(contact))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<ContactResource> {
    let contact = state.contacts().get(auth.owner(), parse_id(&id)).await?;
    Ok(ApiResponse::success(contact))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Payload,
) -> ApiResult<ContactResource> {
    let contact = state.contacts().update(auth.owner(), parse_id(&id), &payload).await?;
    Ok(ApiResponse::success(contact))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<bool> {
    let done = state.contacts().delete(auth.owner(), parse_id(&id)).await?;
    Ok(ApiResponse::success(done))
}

/// GET /api/contacts?name=&email=&phone=&page=&size=
pub async fn search(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<SearchQuery>,
) -> Result<Paginated<ContactResource>, ApiError> {
    let search = ContactSearch::from_query(&query, &state.config.pagination);
    let page = state.contacts().search(auth.owner(), &search).await?;
    Ok(Paginated::new(CONTACTS_PATH, &search, page))
}
