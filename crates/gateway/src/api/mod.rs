pub mod auth;
pub mod health;
pub mod rpc;
pub mod sessions;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use ng_domain::error::{Error, ErrorKind};
use ng_protocol::RpcResponse;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the API routes.
///
/// Routes are split into **public** (no auth required) and **protected**
/// (gated behind the bearer-token middleware).
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/v1/health", get(health::health));

    let protected = Router::new()
        .route("/v1/rpc", post(rpc::rpc))
        .route("/v1/sessions", get(sessions::list_sessions))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_api_token,
        ));

    public.merge(protected)
}

/// The complete service: routes, request tracing and the concurrency bound.
pub fn app(state: AppState) -> Router {
    let max_concurrent = state.config.server.max_concurrent_requests;
    router(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_concurrent))
        .with_state(state)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error envelope
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Auth | ErrorKind::InvalidSession => StatusCode::UNAUTHORIZED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Schema | ErrorKind::Repository => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `{ "type": "error", "kind": ..., "message": ... }` with the matching
/// HTTP status.
pub fn error_response(err: &Error) -> Response {
    (status_for(err.kind()), Json(RpcResponse::from(err))).into_response()
}
