//! API Route Configuration

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use super::handlers::{self, AppState};
use super::middleware::logging_middleware;
use super::types::EndpointInfo;
use crate::utils::constants::DATA_SOURCE_HEADER;

const fn endpoint(
    method: &'static str,
    path: &'static str,
    auth_required: bool,
    description: &'static str,
) -> EndpointInfo {
    EndpointInfo {
        method,
        path,
        auth_required,
        description,
    }
}

/// Catalogue served by `/api/endpoints`
pub const ENDPOINTS: &[EndpointInfo] = &[
    endpoint("GET", "/", false, "Service banner"),
    endpoint("GET", "/api/health", false, "Health, configuration flags and data-source counters"),
    endpoint("GET", "/api/endpoints", false, "This list"),
    endpoint("GET", "/api/auth/login", false, "Start Google OAuth login"),
    endpoint("GET", "/api/auth/callback", false, "Google OAuth redirect target"),
    endpoint("GET", "/api/auth/verify", true, "Validate the bearer token"),
    endpoint("GET", "/api/auth/mock-token", false, "Test-account token (development only)"),
    endpoint("GET", "/api/auth/logout", false, "Clear the session cookie"),
    endpoint("GET", "/api/google-ads/performance", true, "Account performance with period comparison"),
    endpoint("GET", "/api/google-ads/campaigns", true, "Campaign metrics"),
    endpoint("GET", "/api/google-ads/ad_groups", true, "Ad group metrics, optionally for one campaign"),
    endpoint("GET", "/api/google-ads/search_terms", true, "Top search terms, optionally for one campaign"),
    endpoint("GET", "/api/google-ads/test-connection", true, "Probe Google Ads API access"),
    endpoint("GET", "/api/dashboard/summary", true, "Visitor summary widget"),
    endpoint("GET", "/api/dashboard/form-performance", true, "Form submission widget"),
    endpoint("GET", "/api/dashboard/site-metrics", true, "Site metrics widget"),
    endpoint("GET", "/api/dashboard/performance-over-time", true, "Hourly conversions and sessions"),
    endpoint("GET", "/api/diagnostics/system-info", false, "Host information"),
    endpoint("GET", "/api/diagnostics/check-port", false, "Whether a local port is free"),
];

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::HeaderName::from_static(DATA_SOURCE_HEADER)])
        .allow_credentials(true)
}

/// Create the API router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let auth = Router::new()
        .route("/login", get(handlers::auth_login))
        .route("/callback", get(handlers::auth_callback))
        .route("/verify", get(handlers::auth_verify))
        .route("/mock-token", get(handlers::auth_mock_token))
        .route("/logout", get(handlers::auth_logout));

    let google_ads = Router::new()
        .route("/performance", get(handlers::ads_performance))
        .route("/campaigns", get(handlers::ads_campaigns))
        .route("/ad_groups", get(handlers::ads_ad_groups))
        .route("/search_terms", get(handlers::ads_search_terms))
        .route("/test-connection", get(handlers::ads_test_connection));

    let dashboard = Router::new()
        .route("/summary", get(handlers::dashboard_summary))
        .route("/form-performance", get(handlers::dashboard_form_performance))
        .route("/site-metrics", get(handlers::dashboard_site_metrics))
        .route(
            "/performance-over-time",
            get(handlers::dashboard_performance_over_time),
        );

    let diagnostics = Router::new()
        .route("/system-info", get(handlers::system_info))
        .route("/check-port", get(handlers::check_port));

    let api = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/endpoints", get(handlers::list_endpoints))
        .nest("/auth", auth)
        .nest("/google-ads", google_ads)
        .nest("/dashboard", dashboard)
        .nest("/diagnostics", diagnostics);

    Router::new()
        .route("/", get(handlers::root))
        .nest("/api", api)
        .with_state(state)
        // Middleware (order matters - bottom runs first)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
}
