use std::sync::Arc;

use anyhow::{Context, Result};
use flight_price_proxy::{server, ProxyConfig, ReqwestTransport, SearchHandler};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flight_price_proxy=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ProxyConfig::from_env();
    if config.amadeus.client_id.is_none() || config.amadeus.client_secret.is_none() {
        warn!("Amadeus credentials are not set; every search will return the fallback price");
    }

    info!("Starting flight price proxy");
    info!("  Listen: {}", config.listen_addr);
    info!("  Flight cache TTL: {}s", config.cache.flight_ttl_seconds);
    info!("  Rate cache TTL: {}s", config.cache.rate_ttl_seconds);

    let handler = SearchHandler::from_config(&config, Arc::new(ReqwestTransport::new()));
    let app = server::router(Arc::new(handler));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
