use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Repository connection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How the gateway logs into the content repository.
///
/// The credential is a fixed service identity; clients never supply one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Workspaces the repository exposes.
    #[serde(default = "d_workspaces")]
    pub workspaces: Vec<String>,
    /// Workspace used when a client opens a session without naming one.
    #[serde(default = "d_workspace")]
    pub default_workspace: String,
    #[serde(default = "d_username")]
    pub username: String,
    /// Environment variable holding the service password. An unset variable
    /// means an empty password.
    #[serde(default = "d_password_env")]
    pub password_env: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            workspaces: d_workspaces(),
            default_workspace: d_workspace(),
            username: d_username(),
            password_env: d_password_env(),
        }
    }
}

impl RepositoryConfig {
    /// Read the service password from the configured environment variable.
    pub fn password(&self) -> String {
        std::env::var(&self.password_env).unwrap_or_default()
    }
}

fn d_workspaces() -> Vec<String> {
    vec!["default".into()]
}
fn d_workspace() -> String {
    "default".into()
}
fn d_username() -> String {
    "nodegate".into()
}
fn d_password_env() -> String {
    "NG_REPOSITORY_PASSWORD".into()
}
