//! Open sessions, keyed by the token handed to the client.
//!
//! Each entry owns one [`SessionGateway`] behind an async mutex, so a
//! session serves exactly one call at a time while independent sessions run
//! concurrently. The table holds at most a fixed number of sessions, and
//! [`SessionTable::prune_idle`] closes the ones clients stopped using.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use ng_bridge::SessionGateway;
use ng_domain::error::{Error, Result};
use ng_domain::trace::TraceEvent;
use parking_lot::{Mutex as SyncMutex, RwLock};
use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One open session.
pub struct SessionEntry {
    token: String,
    workspace: String,
    root_id: String,
    opened_at: DateTime<Utc>,
    last_used: SyncMutex<Instant>,
    gateway: Arc<Mutex<SessionGateway>>,
}

impl SessionEntry {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Wait until no other call holds the gateway, then take it.
    ///
    /// The guard is owned so it can move onto the blocking pool.
    pub async fn lock(&self) -> OwnedMutexGuard<SessionGateway> {
        let guard = self.gateway.clone().lock_owned().await;
        self.touch();
        guard
    }

    /// Mark the session as used now.
    pub fn touch(&self) {
        *self.last_used.lock() = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_used.lock().elapsed()
    }

    /// A call holds the gateway right now.
    fn is_busy(&self) -> bool {
        self.gateway.try_lock().is_err()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            token: self.token.clone(),
            workspace: self.workspace.clone(),
            root_id: self.root_id.clone(),
            opened_at: self.opened_at,
        }
    }
}

/// Listing row for `GET /v1/sessions`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub token: String,
    pub workspace: String,
    pub root_id: String,
    pub opened_at: DateTime<Utc>,
}

pub struct SessionTable {
    entries: RwLock<HashMap<String, Arc<SessionEntry>>>,
    capacity: usize,
}

impl SessionTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Register a freshly opened gateway under a new random token.
    ///
    /// Fails without registering when the table is full.
    pub fn insert(&self, gateway: SessionGateway) -> Result<Arc<SessionEntry>> {
        let entry = Arc::new(SessionEntry {
            token: uuid::Uuid::new_v4().to_string(),
            workspace: gateway.workspace().to_string(),
            root_id: gateway.root_id().to_string(),
            opened_at: Utc::now(),
            last_used: SyncMutex::new(Instant::now()),
            gateway: Arc::new(Mutex::new(gateway)),
        });
        let mut entries = self.entries.write();
        if entries.len() >= self.capacity {
            return Err(Error::Repository(format!(
                "session limit of {} reached",
                self.capacity
            )));
        }
        entries.insert(entry.token.clone(), entry.clone());
        Ok(entry)
    }

    pub fn get(&self, token: &str) -> Option<Arc<SessionEntry>> {
        self.entries.read().get(token).cloned()
    }

    /// Forget a session. Calls already holding its gateway finish first;
    /// new calls with the token fail.
    pub fn remove(&self, token: &str) -> Option<Arc<SessionEntry>> {
        self.entries.write().remove(token)
    }

    /// Every open session, oldest first.
    pub fn list(&self) -> Vec<SessionSummary> {
        let mut rows: Vec<SessionSummary> =
            self.entries.read().values().map(|e| e.summary()).collect();
        rows.sort_by(|a, b| a.opened_at.cmp(&b.opened_at).then(a.token.cmp(&b.token)));
        rows
    }

    /// Close every session idle for longer than `max_idle`. Sessions with a
    /// call in progress are kept. Returns how many were closed.
    pub fn prune_idle(&self, max_idle: Duration) -> usize {
        let mut expired = Vec::new();
        self.entries.write().retain(|_, entry| {
            let idle = entry.idle_for();
            if idle <= max_idle || entry.is_busy() {
                return true;
            }
            expired.push((entry.clone(), idle));
            false
        });

        for (entry, idle) in &expired {
            TraceEvent::SessionExpired {
                session: entry.token().to_string(),
                workspace: entry.workspace().to_string(),
                idle_secs: idle.as_secs(),
            }
            .emit();
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
