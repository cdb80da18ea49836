pub mod config;
pub mod query;
pub mod schema;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// NodeGate: typed node-state snapshots over a session RPC.
#[derive(Debug, Parser)]
#[command(name = "nodegate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Node type definition utilities.
    #[command(subcommand)]
    Schema(SchemaCommand),
    /// Open a session on a running server and print node snapshots.
    Query {
        /// Base URL of the server.
        #[arg(long, default_value = "http://127.0.0.1:4710")]
        url: String,
        /// Workspace to open (server default when omitted).
        #[arg(long)]
        workspace: Option<String>,
        /// Bearer token (falls back to the configured token env var).
        #[arg(long)]
        token: Option<String>,
        /// Node identifiers to snapshot; the root when none are given.
        ids: Vec<String>,
    },
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

#[derive(Debug, Subcommand)]
pub enum SchemaCommand {
    /// Parse a compact definition file and summarize it.
    Check {
        /// File to check (defaults to `schema.cnd_path`).
        path: Option<PathBuf>,
    },
    /// Bootstrap an in-memory repository with the configured schema and
    /// print every registered type.
    Export,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `NG_CONFIG` (or
/// `config.toml` by default). Returns the parsed [`Config`] and the
/// path that was used.
///
/// [`Config`]: ng_domain::config::Config
pub fn load_config() -> anyhow::Result<(ng_domain::config::Config, String)> {
    let config_path = std::env::var("NG_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = load_config_from(&config_path)?;
    Ok((config, config_path))
}

/// Parse `path`, or return defaults when it does not exist.
pub fn load_config_from(path: &str) -> anyhow::Result<ng_domain::config::Config> {
    if !std::path::Path::new(path).exists() {
        return Ok(ng_domain::config::Config::default());
    }
    let raw =
        std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("reading {path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {path}: {e}"))
}
