use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use ng_bridge::SchemaSource;
use ng_domain::config::Config;
use ng_gateway::api;
use ng_gateway::state::AppState;
use ng_repository::{Credentials, MemoryRepository};
use serde_json::{json, Value};
use tower::ServiceExt;

const SCHEMA: &str = r#"
<ecmnt = 'http://nuxeo.org/ecm/jcr/names'>
[ecmnt:document] > nt:base, mix:referenceable
  orderable
  - * (undefined)
  + * (nt:base)
"#;

fn state(token: Option<&str>) -> AppState {
    state_with(token, |_| {})
}

fn state_with(token: Option<&str>, adjust: impl FnOnce(&mut Config)) -> AppState {
    let mut config = Config::default();
    config.repository.workspaces = vec!["default".into(), "archive".into()];
    config.repository.username = "svc".into();
    config.repository.password_env = "NG_TEST_ROUTER_PASSWORD_UNSET".into();
    let repo = MemoryRepository::new(config.repository.workspaces.clone())
        .unwrap()
        .with_user(Credentials::new("svc", ""));
    adjust(&mut config);
    AppState::new(
        Arc::new(config),
        Arc::new(repo),
        SchemaSource::new("test.cnd", SCHEMA),
        token,
    )
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn rpc_request(body: Value) -> Request<Body> {
    Request::post("/v1/rpc")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn rpc(app: &Router, body: Value) -> (StatusCode, Value) {
    send(app, rpc_request(body)).await
}

async fn open(app: &Router) -> (String, String) {
    let (status, body) = rpc(app, json!({ "method": "open" })).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["type"], "opened");
    (
        body["session"].as_str().unwrap().to_string(),
        body["root_id"].as_str().unwrap().to_string(),
    )
}

// ── Open / close ────────────────────────────────────────────────────

#[tokio::test]
async fn open_snapshot_close() {
    let app = api::app(state(None));
    let (session, root_id) = open(&app).await;

    let (status, body) = rpc(
        &app,
        json!({ "method": "snapshot", "session": session, "ids": [root_id] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "snapshot");
    let root = &body["states"][&root_id];
    assert_eq!(root["name"], "");
    assert!(root["parentId"].is_null());
    let toto = root["children"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "toto")
        .unwrap()
        .clone();
    let toto_id = toto["id"].as_str().unwrap().to_string();

    let (_, body) = rpc(
        &app,
        json!({ "method": "snapshot", "session": session, "ids": [toto_id] }),
    )
    .await;
    let props = body["states"][&toto_id]["properties"].as_array().unwrap();
    let foo = props.iter().find(|p| p["name"] == "foo").unwrap();
    assert_eq!(foo["values"], json!(["hello bob"]));
    assert_eq!(foo["kind"], "string");
    assert_eq!(foo["multiValued"], false);

    let (status, body) = rpc(&app, json!({ "method": "close", "session": session })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "closed");

    let (status, body) = rpc(
        &app,
        json!({ "method": "type_of", "session": session, "id": root_id }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "invalid_session");
}

#[tokio::test]
async fn open_named_workspace() {
    let app = api::app(state(None));
    let (status, body) = rpc(&app, json!({ "method": "open", "workspace": "archive" })).await;
    assert_eq!(status, StatusCode::OK);

    let (_, listing) = send(
        &app,
        Request::get("/v1/sessions").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["sessions"][0]["workspace"], "archive");
    assert_eq!(listing["sessions"][0]["token"], body["session"]);
}

#[tokio::test]
async fn unknown_workspace_is_auth_error() {
    let app = api::app(state(None));
    let (status, body) = rpc(&app, json!({ "method": "open", "workspace": "nowhere" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["type"], "error");
    assert_eq!(body["kind"], "auth");
    assert!(body["message"].as_str().unwrap().contains("nowhere"));
}

// ── Calls ───────────────────────────────────────────────────────────

#[tokio::test]
async fn type_of_and_schema_text() {
    let app = api::app(state(None));
    let (session, root_id) = open(&app).await;

    let (status, body) = rpc(
        &app,
        json!({ "method": "type_of", "session": session, "id": root_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "type": "type_of", "primary_type": "rep:root" }));

    let (status, body) = rpc(&app, json!({ "method": "schema_text", "session": session })).await;
    assert_eq!(status, StatusCode::OK);
    let text = body["text"].as_str().unwrap();
    let doc = ng_cnd::parse_cnd(text).unwrap();
    assert!(doc.node_type("ecmnt:document").is_some());
    assert!(doc.node_type("nt:base").is_some());
}

#[tokio::test]
async fn unresolvable_id_is_not_found() {
    let app = api::app(state(None));
    let (session, root_id) = open(&app).await;
    let (status, body) = rpc(
        &app,
        json!({ "method": "snapshot", "session": session, "ids": [root_id, "missing"] }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
    assert!(body.get("states").is_none());
}

#[tokio::test]
async fn malformed_call_is_bad_request() {
    let app = api::app(state(None));
    let (status, body) = rpc(&app, json!({ "method": "drop_everything" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "bad_request");
}

#[tokio::test]
async fn unknown_session_token() {
    let app = api::app(state(None));
    let (status, body) = rpc(&app, json!({ "method": "schema_text", "session": "nope" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "invalid_session");

    let (status, _) = rpc(&app, json!({ "method": "close", "session": "nope" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ── Auth ────────────────────────────────────────────────────────────

#[tokio::test]
async fn token_guards_rpc_but_not_health() {
    let app = api::app(state(Some("s3cret")));

    let (status, body) = rpc(&app, json!({ "method": "open" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "auth");

    let req = Request::post("/v1/rpc")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Bearer s3cret")
        .body(Body::from(json!({ "method": "open" }).to_string()))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "opened");

    let (status, body) = send(
        &app,
        Request::get("/v1/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sessions"], 1);
    assert_eq!(body["workspaces"], json!(["archive", "default"]));
}

#[tokio::test]
async fn wrong_token_is_rejected() {
    let app = api::app(state(Some("s3cret")));
    let req = Request::get("/v1/sessions")
        .header(header::AUTHORIZATION, "Bearer guess")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ── Sessions share one repository ───────────────────────────────────

#[tokio::test]
async fn reopening_reuses_bootstrap() {
    let state = state(None);
    let app = api::app(state.clone());
    let (first, root_a) = open(&app).await;
    let (second, root_b) = open(&app).await;
    assert_ne!(first, second);
    assert_eq!(root_a, root_b);
    assert_eq!(state.sessions.len(), 2);

    let (_, body) = rpc(
        &app,
        json!({ "method": "snapshot", "session": second, "ids": [root_b] }),
    )
    .await;
    let toto_count = body["states"][&root_b]["children"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["name"] == "toto")
        .count();
    assert_eq!(toto_count, 1);
}

#[tokio::test]
async fn open_fails_once_session_limit_is_reached() {
    let app = api::app(state_with(None, |c| c.server.max_sessions = 1));
    let (session, _) = open(&app).await;

    let (status, body) = rpc(&app, json!({ "method": "open" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], "repository");
    assert!(body["message"].as_str().unwrap().contains("session limit"));

    rpc(&app, json!({ "method": "close", "session": session })).await;
    open(&app).await;
}
