mod observability;
mod repository;
mod schema;
mod sentinel;
mod server;

pub use observability::*;
pub use repository::*;
pub use schema::*;
pub use sentinel::*;
pub use server::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub sentinel: SentinelConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut error = |field: &str, message: String| {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: field.into(),
                message,
            })
        };

        if self.server.port == 0 {
            error("server.port", "port must be greater than 0".into());
        }
        if self.server.host.is_empty() {
            error("server.host", "host must not be empty".into());
        }
        if self.server.max_concurrent_requests == 0 {
            error(
                "server.max_concurrent_requests",
                "must be greater than 0".into(),
            );
        }
        if self.server.max_sessions == 0 {
            error("server.max_sessions", "must be greater than 0".into());
        }

        if self.repository.workspaces.is_empty() {
            error(
                "repository.workspaces",
                "at least one workspace must be configured".into(),
            );
        } else if !self
            .repository
            .workspaces
            .contains(&self.repository.default_workspace)
        {
            error(
                "repository.default_workspace",
                format!(
                    "'{}' is not listed in repository.workspaces",
                    self.repository.default_workspace
                ),
            );
        }
        if self.repository.username.is_empty() {
            error("repository.username", "username must not be empty".into());
        }

        if self.schema.root_document_type.is_empty() {
            error(
                "schema.root_document_type",
                "root document type must not be empty".into(),
            );
        }

        for (field, value) in [
            ("sentinel.node_name", &self.sentinel.node_name),
            ("sentinel.string_property", &self.sentinel.string_property),
            ("sentinel.boolean_property", &self.sentinel.boolean_property),
        ] {
            if value.is_empty() || value.contains('/') {
                error(field, format!("'{value}' is not a valid item name"));
            }
        }
        if self.sentinel.string_property == self.sentinel.boolean_property {
            error(
                "sentinel.boolean_property",
                "must differ from sentinel.string_property".into(),
            );
        }

        if !self.schema.cnd_path.exists() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "schema.cnd_path".into(),
                message: format!(
                    "{} does not exist (serve will refuse to start)",
                    self.schema.cnd_path.display()
                ),
            });
        }

        errors
    }
}
