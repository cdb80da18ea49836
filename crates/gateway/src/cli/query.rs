use ng_domain::config::Config;

use crate::client::RpcClient;

/// Open a session, print the snapshot of `ids` (the root when empty) as
/// pretty JSON, then close the session.
pub async fn run(
    config: &Config,
    url: &str,
    workspace: Option<String>,
    token: Option<String>,
    ids: Vec<String>,
) -> anyhow::Result<()> {
    let token = token.or_else(|| std::env::var(&config.server.api_token_env).ok());
    let client = RpcClient::new(url, token)?;

    let (session, root_id) = client.open(workspace).await?;
    let ids = if ids.is_empty() { vec![root_id] } else { ids };

    // Close even when the snapshot fails.
    let result = client.snapshot(&session, ids).await;
    if let Err(e) = client.close(&session).await {
        tracing::warn!(error = %e, "closing session failed");
    }

    println!("{}", serde_json::to_string_pretty(&result?)?);
    Ok(())
}
