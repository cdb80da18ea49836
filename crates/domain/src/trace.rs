use serde::Serialize;

/// Structured trace events emitted across all NodeGate crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionOpened {
        session: String,
        workspace: String,
        root_id: String,
    },
    SessionClosed {
        session: String,
        workspace: String,
    },
    SessionExpired {
        session: String,
        workspace: String,
        idle_secs: u64,
    },
    SchemaBootstrapped {
        workspace: String,
        source: String,
        namespaces: usize,
        node_types: usize,
    },
    NamespaceSkipped {
        prefix: String,
        uri: String,
        reason: String,
    },
    SentinelInitialized {
        workspace: String,
        node_name: String,
        created: bool,
        versions: usize,
    },
    SnapshotServed {
        workspace: String,
        requested: usize,
        returned: usize,
        children_skipped: usize,
        duration_ms: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "ng_event");
    }
}
