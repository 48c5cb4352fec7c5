use anyhow::Context;

use outlay_server::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load().context("Failed to load configuration")?;
    outlay_server::logging::init(config.log_format);

    tracing::info!(
        origins = ?config.allowed_origins,
        access_ttl_secs = config.auth.access_ttl_secs,
        "Configuration loaded"
    );

    outlay_server::serve(config).await
}
