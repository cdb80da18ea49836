use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Server
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_4710")]
    pub port: u16,
    #[serde(default = "d_host")]
    pub host: String,
    /// Environment variable holding the bearer token for the RPC endpoint.
    /// If the env var is set and non-empty, `/v1/rpc` and `/v1/sessions`
    /// require `Authorization: Bearer <token>`.
    /// If unset, the server logs a warning and allows unauthenticated access.
    #[serde(default = "d_api_token_env")]
    pub api_token_env: String,
    /// Upper bound on requests handled at once.
    #[serde(default = "d_max_concurrent")]
    pub max_concurrent_requests: usize,
    /// Sessions unused for this many seconds are closed by the periodic
    /// sweep. 0 keeps sessions until the client closes them.
    #[serde(default = "d_session_idle")]
    pub session_idle_secs: u64,
    /// Upper bound on open sessions; `open` fails once it is reached.
    #[serde(default = "d_max_sessions")]
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4710,
            host: "127.0.0.1".into(),
            api_token_env: d_api_token_env(),
            max_concurrent_requests: d_max_concurrent(),
            session_idle_secs: d_session_idle(),
            max_sessions: d_max_sessions(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_4710() -> u16 {
    4710
}
fn d_host() -> String {
    "127.0.0.1".into()
}
fn d_api_token_env() -> String {
    "NG_API_TOKEN".into()
}
fn d_max_concurrent() -> usize {
    256
}
fn d_session_idle() -> u64 {
    1800
}
fn d_max_sessions() -> usize {
    1024
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_parses_partial_table() {
        let toml_str = r#"
            port = 8080
            host = "0.0.0.0"
        "#;
        let cfg: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.api_token_env, "NG_API_TOKEN");
        assert_eq!(cfg.max_concurrent_requests, 256);
        assert_eq!(cfg.session_idle_secs, 1800);
        assert_eq!(cfg.max_sessions, 1024);
    }

    #[test]
    fn session_limits_parse() {
        let cfg: ServerConfig =
            toml::from_str("session_idle_secs = 0\nmax_sessions = 4").unwrap();
        assert_eq!(cfg.session_idle_secs, 0);
        assert_eq!(cfg.max_sessions, 4);
    }
}
