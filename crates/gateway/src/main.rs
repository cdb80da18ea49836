use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use ng_domain::config::{Config, ObservabilityConfig};
use ng_gateway::cli::{Cli, Command, ConfigCommand, SchemaCommand};
use ng_gateway::{api, bootstrap};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Default to serve when no subcommand is given.
        None | Some(Command::Serve) => {
            let (config, config_path) = ng_gateway::cli::load_config()?;
            init_tracing(&config.observability);
            run_server(Arc::new(config), config_path).await
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let (config, config_path) = ng_gateway::cli::load_config()?;
            if !ng_gateway::cli::config::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _config_path) = ng_gateway::cli::load_config()?;
            ng_gateway::cli::config::show(&config)
        }
        Some(Command::Schema(SchemaCommand::Check { path })) => {
            init_cli_tracing();
            let (config, _) = ng_gateway::cli::load_config()?;
            let path = path.unwrap_or_else(|| config.schema.cnd_path.clone());
            if !ng_gateway::cli::schema::check(&path)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Schema(SchemaCommand::Export)) => {
            init_cli_tracing();
            let (config, _) = ng_gateway::cli::load_config()?;
            ng_gateway::cli::schema::export(&config)
        }
        Some(Command::Query {
            url,
            workspace,
            token,
            ids,
        }) => {
            init_cli_tracing();
            let (config, _) = ng_gateway::cli::load_config()?;
            ng_gateway::cli::query::run(&config, &url, workspace, token, ids).await
        }
        Some(Command::Version) => {
            println!("nodegate {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Initialize structured tracing (only for the `serve` command).
///
/// `RUST_LOG` wins over `observability.log_filter`.
fn init_tracing(obs: &ObservabilityConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&obs.log_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if obs.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Initialize compact stderr-only tracing for CLI one-shot commands.
///
/// Defaults to `warn` level so diagnostic output does not pollute stdout.
fn init_cli_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Start the gateway server with the given configuration.
async fn run_server(config: Arc<Config>, config_path: String) -> anyhow::Result<()> {
    tracing::info!(config = %config_path, "NodeGate starting");

    let state = bootstrap::build_app_state(config.clone())?;
    bootstrap::spawn_session_sweeper(&state);
    tracing::info!(
        max_concurrent = config.server.max_concurrent_requests,
        "concurrency limit set"
    );
    let app = api::app(state.clone());

    // ── Bind ─────────────────────────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;

    tracing::info!(addr = %addr, "NodeGate listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("axum server error")?;

    tracing::info!(open_sessions = state.sessions.len(), "shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to register SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
            _ = terminate => tracing::info!("received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
        tracing::info!("received SIGINT, shutting down");
    }
}
