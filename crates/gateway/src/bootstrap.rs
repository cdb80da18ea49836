//! AppState construction shared by `serve` and the one-shot schema commands.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use ng_bridge::SchemaSource;
use ng_domain::config::{Config, ConfigSeverity};
use ng_repository::{Credentials, MemoryRepository};

use crate::state::AppState;

/// Validate config, read the schema file, create the repository and return
/// a fully-wired [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let error_count = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if error_count > 0 {
        anyhow::bail!("config validation failed with {error_count} error(s)");
    }

    // ── Schema source ────────────────────────────────────────────────
    let schema = load_schema(&config)?;

    // ── Repository ───────────────────────────────────────────────────
    let repo = build_repository(&config)?;
    tracing::info!(
        workspaces = ?config.repository.workspaces,
        default_workspace = %config.repository.default_workspace,
        "memory repository ready"
    );

    // ── API token (read once, hash for constant-time comparison) ────
    let env_var = &config.server.api_token_env;
    let token = std::env::var(env_var).ok().filter(|t| !t.is_empty());
    match &token {
        Some(_) => tracing::info!(env_var = %env_var, "API bearer-token auth enabled"),
        None => tracing::warn!("API bearer-token auth DISABLED, set the {env_var} env var"),
    }

    Ok(AppState::new(
        config.clone(),
        Arc::new(repo),
        schema,
        token.as_deref(),
    ))
}

/// Close idle sessions in the background. Needs a running Tokio runtime.
pub fn spawn_session_sweeper(state: &AppState) {
    let idle_secs = state.config.server.session_idle_secs;
    if idle_secs == 0 {
        tracing::info!("idle session sweep disabled");
        return;
    }
    let sessions = state.sessions.clone();
    let max_idle = Duration::from_secs(idle_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(idle_secs.clamp(1, 60)));
        loop {
            interval.tick().await;
            let closed = sessions.prune_idle(max_idle);
            if closed > 0 {
                tracing::info!(closed, open = sessions.len(), "idle sessions closed");
            }
        }
    });
}

/// Read `schema.cnd_path` and make sure it parses and defines the root
/// document type.
pub fn load_schema(config: &Config) -> anyhow::Result<SchemaSource> {
    let path = &config.schema.cnd_path;
    let source = SchemaSource::load(path)
        .with_context(|| format!("loading schema from {}", path.display()))?;
    let doc = ng_cnd::parse_cnd(&source.text)
        .with_context(|| format!("parsing {}", path.display()))?;
    if doc.node_type(&config.schema.root_document_type).is_none() {
        anyhow::bail!(
            "{} does not define the root document type {}",
            path.display(),
            config.schema.root_document_type
        );
    }
    tracing::info!(
        path = %path.display(),
        namespaces = doc.namespaces.len(),
        node_types = doc.node_types.len(),
        "schema source loaded"
    );
    Ok(source)
}

/// In-memory repository with the configured workspaces, accepting only the
/// configured service credential.
pub fn build_repository(config: &Config) -> anyhow::Result<MemoryRepository> {
    let repo = MemoryRepository::new(config.repository.workspaces.iter().cloned())
        .context("creating memory repository")?
        .with_user(Credentials::new(
            config.repository.username.clone(),
            config.repository.password(),
        ));
    Ok(repo)
}
