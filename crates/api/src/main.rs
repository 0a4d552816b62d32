use anyhow::Context;

use alumni_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    alumni_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        registration_capacity = config.registration_capacity,
        session_ttl_secs = config.session_ttl.num_seconds(),
        cookie_secure = config.cookie_secure,
        admin_bootstrap = config.admin.is_some(),
        "starting alumni portal"
    );

    let app = alumni_api::app::build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
