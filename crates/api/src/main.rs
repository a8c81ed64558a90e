use anyhow::{Context, Result};
use estate_api::{build_app, AppConfig};
use estate_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("estate_api");

    let config = AppConfig::from_env();
    let bind = config.bind.clone();

    let app = build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    tracing::info!(bind = %bind, "estate assistant api started");

    axum::serve(listener, app).await?;
    Ok(())
}
