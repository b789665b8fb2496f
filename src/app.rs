use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{protected, public};
use crate::middleware::token_auth_middleware;
use crate::state::AppState;

/// Build the full router: `/api/*` plus `/health`.
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        .route("/health", get(health))
        .nest("/api", public_routes().merge(protected_routes(state.clone())))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .with_state(state);

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn public_routes() -> Router<AppState> {
    use public::users;

    Router::new()
        .route("/users", post(users::register))
        .route("/users/login", post(users::login))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use axum::routing::delete;
    use protected::{addresses, contacts, users};

    Router::new()
        .route("/users/current", get(users::current).patch(users::update))
        .route("/users/logout", delete(users::logout))
        .route("/contacts", post(contacts::create).get(contacts::search))
        .route(
            "/contacts/:id",
            get(contacts::get).put(contacts::update).delete(contacts::delete),
        )
        .route("/contacts/:id/addresses", post(addresses::create).get(addresses::list))
        .route(
            "/contacts/:id/addresses/:address_id",
            get(addresses::get).put(addresses::update).delete(addresses::delete),
        )
        .route_layer(middleware::from_fn_with_state(state, token_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter(|origin| origin.as_str() != "*")
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    if origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "storage": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "errors": "Storage unavailable" })),
            )
        }
    }
}
