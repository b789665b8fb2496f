use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::database::models::User;
use crate::database::OwnerRef;
use crate::error::ApiError;
use crate::state::AppState;

/// Account resolved from the request's bearer token
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn owner(&self) -> OwnerRef {
        OwnerRef::from(&self.0)
    }
}

/// Token authentication middleware that resolves the account and injects it
/// into the request extensions.
pub async fn token_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token_from_headers(&headers).ok_or_else(|| {
        tracing::debug!("Rejected request without a usable Authorization header");
        ApiError::unauthorized()
    })?;

    let user = state.users().authenticate(token).await?;
    request.extensions_mut().insert(AuthUser(user));

    Ok(next.run(request).await)
}

/// The header carries the raw token, no scheme prefix.
fn extract_token_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()
        .filter(|token| !token.is_empty())
}
