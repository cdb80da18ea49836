//! HTTP client for the `/v1/rpc` endpoint, used by `nodegate query`.

use std::collections::BTreeMap;
use std::time::Duration;

use ng_domain::error::ErrorKind;
use ng_protocol::{NodeId, NodeSnapshot, RpcRequest, RpcResponse};
use reqwest::Client;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error envelope.
    #[error("{kind}: {message}")]
    Remote { kind: ErrorKind, message: String },

    #[error("unexpected reply to {method}: {reply:?}")]
    Unexpected { method: &'static str, reply: Box<RpcResponse> },
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Clone)]
pub struct RpcClient {
    http: Client,
    endpoint: String,
    token: Option<String>,
}

impl RpcClient {
    pub fn new(base_url: &str, token: Option<String>) -> ClientResult<Self> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/v1/rpc", base_url.trim_end_matches('/')),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Send one call. Error envelopes come back as [`ClientError::Remote`]
    /// whatever the HTTP status.
    pub async fn call(&self, request: &RpcRequest) -> ClientResult<RpcResponse> {
        let mut rb = self.http.post(&self.endpoint).json(request);
        if let Some(token) = &self.token {
            rb = rb.bearer_auth(token);
        }
        let reply: RpcResponse = rb.send().await?.json().await?;
        tracing::debug!(method = request.method(), "rpc reply received");
        match reply {
            RpcResponse::Error { kind, message } => Err(ClientError::Remote { kind, message }),
            other => Ok(other),
        }
    }

    /// Returns `(session, root_id)`.
    pub async fn open(&self, workspace: Option<String>) -> ClientResult<(String, NodeId)> {
        match self.call(&RpcRequest::Open { workspace }).await? {
            RpcResponse::Opened { session, root_id } => Ok((session, root_id)),
            other => Err(unexpected("open", other)),
        }
    }

    pub async fn snapshot(
        &self,
        session: &str,
        ids: Vec<NodeId>,
    ) -> ClientResult<BTreeMap<NodeId, NodeSnapshot>> {
        let request = RpcRequest::Snapshot {
            session: session.to_string(),
            ids,
        };
        match self.call(&request).await? {
            RpcResponse::Snapshot { states } => Ok(states),
            other => Err(unexpected("snapshot", other)),
        }
    }

    pub async fn close(&self, session: &str) -> ClientResult<()> {
        let request = RpcRequest::Close {
            session: session.to_string(),
        };
        match self.call(&request).await? {
            RpcResponse::Closed => Ok(()),
            other => Err(unexpected("close", other)),
        }
    }
}

fn unexpected(method: &'static str, reply: RpcResponse) -> ClientError {
    ClientError::Unexpected {
        method,
        reply: Box::new(reply),
    }
}
