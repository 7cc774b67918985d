//! AgentTrust resolver API binary.

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("agenttrust_api=info,tower_http=info")),
        )
        .init();

    agenttrust_api::server::run_from_env().await
}
