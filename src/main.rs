//! Tech news bot: binary entrypoint.
//! Loads configuration, installs tracing and metrics, and serves the webhook.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tech_news_bot::config::AppConfig;
use tech_news_bot::metrics::Metrics;

/// Compact logs by default, JSON lines when LOG_FORMAT=json.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tech_news_bot=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load().context("loading configuration")?;
    let metrics = Metrics::init(cfg.cache.ttl_secs)?;
    let router = tech_news_bot::app(&cfg)?.merge(metrics.router());

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, trigger = %cfg.server.trigger, "webhook listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}
