use anyhow::Context;
use tracing_subscriber::EnvFilter;

use giftcard_api::{app, AppConfig, AppContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, TOKEN_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("giftcard_api=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let port = config.server.port;

    let ctx = AppContext::connect(config)
        .await
        .context("failed to open the database")?;

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Gift card API listening on http://{}", bind_addr);

    axum::serve(listener, app(ctx)).await.context("server error")?;
    Ok(())
}
