//! Allervie Analytics API Server
//!
//! Usage:
//!   cargo run --bin allervie_api
//!
//! Environment (a `.env` file is loaded when present):
//!   ENVIRONMENT          - development | production (default: development)
//!   USE_REAL_ADS_CLIENT  - call Google Ads / Google identity (default: true)
//!   ALLOW_MOCK_DATA      - fall back to mock Ads data (default: true)
//!   ALLOW_MOCK_AUTH      - fall back to the test session (default: true)
//!   HOST / PORT          - bind address (default: 0.0.0.0:5002)
//!   RUST_LOG             - log filter (default: debug in development, info in production)

use allervie_api::api::{create_router, AppState};
use allervie_api::models::Config;
use allervie_api::providers::{GoogleAdsClient, GoogleOAuthClient, OAuthClientCredentials};
use eyre::WrapErr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let config = Config::from_env().wrap_err("invalid configuration")?;

    // Initialize logging
    let default_level = if config.is_production() { "info" } else { "debug" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    print_banner();

    if dotenv_loaded {
        info!("Loaded environment from .env");
    }
    config.log_summary();

    let config = Arc::new(config);
    let oauth_credentials = OAuthClientCredentials::resolve(&config);

    let ads = GoogleAdsClient::new(&config, oauth_credentials.clone())
        .wrap_err("failed to build Google Ads client")?;
    if config.use_real_ads_client && !ads.is_configured() {
        warn!("Live Google Ads client enabled but credentials are incomplete");
    }
    let identity = GoogleOAuthClient::new(&config, oauth_credentials)
        .wrap_err("failed to build Google OAuth client")?;

    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::new(ads),
        Arc::new(identity),
    ));
    let telemetry = state.telemetry.clone();

    let app = create_router(state);
    let addr = config.bind_addr();

    info!("Allervie Analytics API starting on http://{}", addr);
    info!("Endpoint list: http://{}/api/endpoints", addr);
    info!("");
    info!("Endpoints:");
    info!("  GET /api/auth/login              - Start Google OAuth login");
    info!("  GET /api/google-ads/performance  - Account performance");
    info!("  GET /api/google-ads/campaigns    - Campaign metrics");
    info!("  GET /api/dashboard/summary       - Dashboard widgets");
    info!("  GET /api/health                  - Health check");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");

    let listener = TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown signal received");
    let stats = telemetry.get_stats();
    info!(
        ads_live = stats.ad_performance.live,
        ads_mock = stats.ad_performance.mock,
        ads_fallbacks = stats.ad_performance.fallbacks,
        auth_live = stats.auth_session.live,
        auth_mock = stats.auth_session.mock,
        "Data source totals"
    );
    info!("Allervie Analytics API shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}

fn print_banner() {
    println!(
        r#"
    +--------------------------------------------------------------+
    |                                                              |
    |              A L L E R V I E   A N A L Y T I C S             |
    |                                                              |
    |          Google Ads proxy  /  OAuth  /  mock fallback        |
    |                          API v{:<8}                       |
    |                                                              |
    +--------------------------------------------------------------+
    "#,
        env!("CARGO_PKG_VERSION")
    );
}
