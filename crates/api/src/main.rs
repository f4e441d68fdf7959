use anyhow::Context;

use unitdesk_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    unitdesk_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        seed_demo = config.seed_demo,
        policy = ?config.availability_policy,
        "starting unitdesk-api"
    );

    let app = unitdesk_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
