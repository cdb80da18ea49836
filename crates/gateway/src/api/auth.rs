//! Bearer-token guard for the protected routes.
//!
//! `AppState` carries the SHA-256 digest of the token named by
//! `server.api_token_env`, computed once at startup. Without a digest the
//! guard lets every request through.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use ng_domain::error::Error;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::api::error_response;
use crate::state::AppState;

/// Middleware for `route_layer(from_fn_with_state(..))`.
pub async fn require_api_token(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.api_token_hash.as_deref() else {
        return next.run(req).await;
    };

    if !token_matches(expected, bearer_token(req.headers())) {
        tracing::debug!(path = %req.uri().path(), "rejected request without valid API token");
        return error_response(&Error::Auth("invalid or missing API token".into()));
    }
    next.run(req).await
}

fn bearer_token(headers: &HeaderMap) -> &str {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("")
}

/// Digests are compared in constant time, so neither the token's content
/// nor its length shows in the timing.
fn token_matches(expected_digest: &[u8], provided: &str) -> bool {
    Sha256::digest(provided.as_bytes()).ct_eq(expected_digest).into()
}
