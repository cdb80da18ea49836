use std::sync::Arc;

use ng_bridge::{GatewaySettings, SchemaSource};
use ng_domain::config::Config;
use ng_repository::Repository;
use sha2::{Digest, Sha256};

use crate::runtime::session_table::SessionTable;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    // ── Core services ─────────────────────────────────────────────────
    pub config: Arc<Config>,
    pub repo: Arc<dyn Repository>,
    /// Compact type definitions read at startup; every `open` bootstraps
    /// from this text.
    pub schema: Arc<SchemaSource>,
    pub settings: Arc<GatewaySettings>,

    // ── Session management ────────────────────────────────────────────
    pub sessions: Arc<SessionTable>,

    // ── Security (startup-computed) ───────────────────────────────────
    /// SHA-256 hash of the API bearer token (read once at startup).
    /// `None` = dev mode (no auth enforced).
    pub api_token_hash: Option<Vec<u8>>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        repo: Arc<dyn Repository>,
        schema: SchemaSource,
        api_token: Option<&str>,
    ) -> Self {
        let settings = GatewaySettings::from_config(&config);
        let sessions = SessionTable::new(config.server.max_sessions);
        Self {
            config,
            repo,
            schema: Arc::new(schema),
            settings: Arc::new(settings),
            sessions: Arc::new(sessions),
            api_token_hash: api_token
                .filter(|t| !t.is_empty())
                .map(|t| Sha256::digest(t.as_bytes()).to_vec()),
        }
    }
}
