//! `POST /v1/rpc`: the session protocol.
//!
//! `open` logs in and bootstraps on the blocking pool, then registers the
//! gateway in the session table. Every other method looks the token up,
//! waits for the session's lock and runs on the blocking pool while holding
//! it.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use ng_bridge::SessionGateway;
use ng_domain::error::{Error, Result};
use ng_domain::trace::TraceEvent;
use ng_protocol::{RpcRequest, RpcResponse};

use crate::api::error_response;
use crate::state::AppState;

pub async fn rpc(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RpcRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return error_response(&Error::BadRequest(rejection.body_text()));
        }
    };

    let method = request.method();
    let session = request.session().map(str::to_string);
    match dispatch(&state, request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            tracing::warn!(
                method,
                session = session.as_deref().unwrap_or("-"),
                kind = %e.kind(),
                error = %e,
                "rpc call failed"
            );
            error_response(&e)
        }
    }
}

async fn dispatch(state: &AppState, request: RpcRequest) -> Result<RpcResponse> {
    match request {
        RpcRequest::Open { workspace } => open(state, workspace).await,
        RpcRequest::SchemaText { session } => {
            with_gateway(state, &session, |gw| {
                gw.schema_text().map(|text| RpcResponse::SchemaText { text })
            })
            .await
        }
        RpcRequest::TypeOf { session, id } => {
            with_gateway(state, &session, move |gw| {
                gw.type_of(&id)
                    .map(|primary_type| RpcResponse::TypeOf { primary_type })
            })
            .await
        }
        RpcRequest::Snapshot { session, ids } => {
            with_gateway(state, &session, move |gw| {
                gw.snapshot(&ids).map(|states| RpcResponse::Snapshot { states })
            })
            .await
        }
        RpcRequest::Close { session } => close(state, &session).await,
    }
}

async fn open(state: &AppState, workspace: Option<String>) -> Result<RpcResponse> {
    let workspace =
        workspace.unwrap_or_else(|| state.config.repository.default_workspace.clone());
    let repo = state.repo.clone();
    let settings = state.settings.clone();
    let schema = state.schema.clone();

    let gateway = tokio::task::spawn_blocking(move || {
        SessionGateway::open(repo.as_ref(), &settings, &schema, &workspace)
    })
    .await
    .map_err(|e| Error::Repository(format!("open task failed: {e}")))??;

    let entry = state.sessions.insert(gateway)?;
    TraceEvent::SessionOpened {
        session: entry.token().to_string(),
        workspace: entry.workspace().to_string(),
        root_id: entry.root_id().to_string(),
    }
    .emit();

    Ok(RpcResponse::Opened {
        session: entry.token().to_string(),
        root_id: entry.root_id().to_string(),
    })
}

async fn close(state: &AppState, token: &str) -> Result<RpcResponse> {
    let entry = state.sessions.remove(token).ok_or_else(|| unknown_session(token))?;
    // Let an in-flight call finish before the session drops.
    let gateway = entry.lock().await;
    drop(gateway);

    TraceEvent::SessionClosed {
        session: entry.token().to_string(),
        workspace: entry.workspace().to_string(),
    }
    .emit();
    Ok(RpcResponse::Closed)
}

/// Run `call` against the session's gateway, one call per session at a time.
async fn with_gateway<F>(state: &AppState, token: &str, call: F) -> Result<RpcResponse>
where
    F: FnOnce(&mut SessionGateway) -> Result<RpcResponse> + Send + 'static,
{
    let entry = state.sessions.get(token).ok_or_else(|| unknown_session(token))?;
    let mut gateway = entry.lock().await;
    let result = tokio::task::spawn_blocking(move || call(&mut *gateway))
        .await
        .map_err(|e| Error::Repository(format!("session task failed: {e}")))?;
    entry.touch();
    result
}

fn unknown_session(token: &str) -> Error {
    Error::InvalidSession(format!("no open session {token}"))
}
