//! HTTP API tests against the router with fake Google providers

use allervie_api::api::{create_router, AppState};
use allervie_api::core::metrics::DateRange;
use allervie_api::core::MockData;
use allervie_api::models::{
    AdGroup, AdsPerformance, AppError, AppResult, Campaign, Config, Environment, SearchTerm, User,
};
use allervie_api::providers::{AdsProvider, ConnectionInfo, IdentityProvider, OAuthTokens};
use allervie_api::utils::session::create_access_token;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

// ============================================
// Fakes
// ============================================

#[derive(Default)]
struct FakeAds {
    fail: bool,
    calls: AtomicUsize,
}

impl FakeAds {
    fn result<T>(&self, value: T) -> AppResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(AppError::ads_api("Google Ads unavailable"))
        } else {
            Ok(value)
        }
    }
}

fn live_campaign() -> Campaign {
    Campaign {
        id: "1234567".to_string(),
        name: "Live Campaign".to_string(),
        status: "ENABLED".to_string(),
        impressions: 10.0,
        clicks: 1.0,
        conversions: 0.0,
        cost: 1.5,
        ctr: 10.0,
        conversion_rate: 0.0,
        cost_per_conversion: 0.0,
    }
}

#[async_trait]
impl AdsProvider for FakeAds {
    async fn performance(
        &self,
        _range: &DateRange,
        _previous: Option<&DateRange>,
    ) -> AppResult<AdsPerformance> {
        let mut perf = MockData::performance();
        perf.impressions.value = 42.0;
        self.result(perf)
    }

    async fn campaigns(&self) -> AppResult<Vec<Campaign>> {
        self.result(vec![live_campaign()])
    }

    async fn ad_groups(&self, _campaign_id: Option<&str>) -> AppResult<Vec<AdGroup>> {
        self.result(Vec::new())
    }

    async fn search_terms(&self, _campaign_id: Option<&str>) -> AppResult<Vec<SearchTerm>> {
        self.result(Vec::new())
    }

    async fn test_connection(&self) -> AppResult<ConnectionInfo> {
        self.result(ConnectionInfo {
            customer_id: "8127539892".to_string(),
            descriptive_name: Some("Allervie".to_string()),
        })
    }
}

struct FakeIdentity;

const GOOGLE_TOKEN: &str = "ya29.valid-google-token";

fn google_user() -> User {
    User {
        id: "google-oauth2|555".to_string(),
        name: "Dana".to_string(),
        email: "dana@example.com".to_string(),
        picture: None,
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn authorization_url(&self, state: &str) -> AppResult<String> {
        Ok(format!("https://accounts.example.com/auth?state={}", state))
    }

    async fn exchange_code(&self, code: &str) -> AppResult<OAuthTokens> {
        if code == "good-code" {
            Ok(OAuthTokens {
                access_token: GOOGLE_TOKEN.to_string(),
                expires_in: Some(3600),
                refresh_token: None,
                scope: None,
            })
        } else {
            Err(AppError::oauth_credentials("bad code"))
        }
    }

    async fn user_info(&self, access_token: &str) -> AppResult<User> {
        if access_token == GOOGLE_TOKEN {
            Ok(google_user())
        } else {
            Err(AppError::oauth_credentials("invalid token"))
        }
    }
}

// ============================================
// Helpers
// ============================================

fn app_with(config: Config, ads: Arc<FakeAds>) -> Router {
    let state = AppState::new(Arc::new(config), ads, Arc::new(FakeIdentity));
    create_router(Arc::new(state))
}

fn app(config: Config) -> Router {
    app_with(config, Arc::new(FakeAds::default()))
}

fn flags(use_real: bool, mock_data: bool, mock_auth: bool) -> Config {
    Config {
        use_real_ads_client: use_real,
        allow_mock_data: mock_data,
        allow_mock_auth: mock_auth,
        ..Config::default()
    }
}

async fn get(app: &Router, uri: &str, bearer: Option<&str>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

async fn mock_token(app: &Router) -> String {
    let (status, _, body) = get(app, "/api/auth/mock-token", None).await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["token"].as_str().unwrap().to_string()
}

// ============================================
// Service endpoints
// ============================================

#[tokio::test]
async fn test_health() {
    let app = app(Config::default());
    let (status, _, body) = get(&app, "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["environment"], "development");
    assert!(body["data"]["data_sources"]["ad_performance"].is_object());
}

#[tokio::test]
async fn test_endpoint_catalogue() {
    let app = app(Config::default());
    let (status, _, body) = get(&app, "/api/endpoints", None).await;

    assert_eq!(status, StatusCode::OK);
    let paths: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["path"].as_str())
        .collect();
    assert!(paths.contains(&"/api/google-ads/performance"));
    assert!(paths.contains(&"/api/diagnostics/check-port"));
}

#[tokio::test]
async fn test_check_port_requires_port() {
    let app = app(Config::default());
    let (status, _, body) = get(&app, "/api/diagnostics/check-port", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "API_BAD_REQUEST");
}

// ============================================
// Auth
// ============================================

#[tokio::test]
async fn test_missing_bearer_is_unauthorized() {
    let app = app(Config::default());
    let (status, headers, body) = get(&app, "/api/google-ads/performance", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers.get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "API_UNAUTHORIZED");
}

#[tokio::test]
async fn test_mock_token_forbidden_in_production() {
    let config = Config {
        environment: Environment::Production,
        ..Config::default()
    };
    let (status, _, body) = get(&app(config), "/api/auth/mock-token", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "API_FORBIDDEN");

    let (status, _, _) = get(&app(flags(true, true, false)), "/api/auth/mock-token", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_mock_token_verifies_as_test_user() {
    let app = app(Config::default());
    let token = mock_token(&app).await;

    let (status, _, body) = get(&app, "/api/auth/verify", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isAuthenticated"], true);
    assert_eq!(body["data"]["user"]["id"], "google-oauth2|123456789");
    assert_eq!(body["source"], "mock");
}

#[tokio::test]
async fn test_google_token_resolves_live() {
    let app = app(flags(true, true, false));
    let (status, _, body) = get(&app, "/api/auth/verify", Some(GOOGLE_TOKEN)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["email"], "dana@example.com");
    assert_eq!(body["source"], "live");
}

#[tokio::test]
async fn test_unknown_token_without_mock_auth_is_not_authenticated() {
    let app = app(flags(true, true, false));
    let (status, _, body) = get(&app, "/api/auth/verify", Some("garbage")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isAuthenticated"], false);
    assert_eq!(body["data"]["error"], "Invalid token");
    assert!(body["data"].get("user").is_none());

    // protected routes still reject it
    let (status, _, _) = get(&app, "/api/google-ads/campaigns", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify_without_token() {
    let app = app(Config::default());
    let (status, _, body) = get(&app, "/api/auth/verify", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isAuthenticated"], false);
    assert_eq!(body["data"]["error"], "Not authenticated");
}

#[tokio::test]
async fn test_test_account_token_rejected_when_mock_auth_disabled() {
    let config = flags(true, true, false);
    let token = create_access_token(&config, "google-oauth2|123456789").unwrap();
    let app = app(config);

    let (status, _, body) = get(&app, "/api/auth/verify", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isAuthenticated"], false);
    assert!(body.get("source").map_or(true, Value::is_null));

    let (status, _, _) = get(&app, "/api/google-ads/campaigns", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

async fn signed_in_token(app: &Router) -> String {
    let request = Request::builder()
        .uri("/api/auth/callback?code=good-code&state=abc")
        .header(header::COOKIE, "oauth_state=abc")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(app, request).await;
    let location = headers.get(header::LOCATION).unwrap().to_str().unwrap();
    location
        .strip_prefix("http://localhost:3000/dashboard?token=")
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_session_tokens_are_counted() {
    let app = app(flags(true, true, false));
    let token = signed_in_token(&app).await;

    let (_, _, body) = get(&app, "/api/auth/verify", Some(&token)).await;
    assert_eq!(body["source"], "live");
    let (status, _, _) = get(&app, "/api/google-ads/campaigns", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, health) = get(&app, "/api/health", None).await;
    let auth = &health["data"]["data_sources"]["auth_session"];
    assert_eq!(auth["live"], 2);
    assert_eq!(auth["mock"], 0);
}

#[tokio::test]
async fn test_logout_drops_session() {
    let app = app(flags(true, true, false));
    let token = signed_in_token(&app).await;

    let (status, headers, _) = get(&app, "/api/auth/logout", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .contains("Max-Age=0"));

    let (_, _, body) = get(&app, "/api/auth/verify", Some(&token)).await;
    assert_eq!(body["data"]["isAuthenticated"], false);
}

#[tokio::test]
async fn test_unknown_token_with_mock_auth_gets_test_session() {
    let app = app(flags(false, true, true));
    let (status, _, body) = get(&app, "/api/auth/verify", Some("anything")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["name"], "Test User");
    assert_eq!(body["source"], "mock");
}

#[tokio::test]
async fn test_login_sets_state_cookie() {
    let app = app(Config::default());
    let (status, headers, body) = get(&app, "/api/auth/login", None).await;

    assert_eq!(status, StatusCode::OK);
    let auth_url = body["data"]["auth_url"].as_str().unwrap();
    let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    let state = cookie
        .split(';')
        .next()
        .and_then(|kv| kv.strip_prefix("oauth_state="))
        .unwrap();

    assert!(auth_url.ends_with(&format!("state={}", state)));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=600"));
}

#[tokio::test]
async fn test_callback_rejects_state_mismatch() {
    let app = app(Config::default());
    let request = Request::builder()
        .uri("/api/auth/callback?code=good-code&state=abc")
        .header(header::COOKIE, "oauth_state=xyz")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        "http://localhost:3000/login?error=invalid_state"
    );
}

#[tokio::test]
async fn test_callback_issues_session_token() {
    let app = app(Config::default());
    let request = Request::builder()
        .uri("/api/auth/callback?code=good-code&state=abc")
        .header(header::COOKIE, "oauth_state=abc")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    let location = headers.get(header::LOCATION).unwrap().to_str().unwrap();
    let token = location
        .strip_prefix("http://localhost:3000/dashboard?token=")
        .unwrap();

    // the issued JWT resolves locally to the signed-in user
    let (status, _, body) = get(&app, "/api/auth/verify", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["id"], "google-oauth2|555");
    assert_eq!(body["source"], "live");
}

#[tokio::test]
async fn test_callback_bad_code() {
    let app = app(Config::default());
    let request = Request::builder()
        .uri("/api/auth/callback?code=bad&state=abc")
        .header(header::COOKIE, "oauth_state=abc")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&app, request).await;
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        "http://localhost:3000/login?error=token_exchange_failed"
    );

    let (_, headers, _) = get(&app, "/api/auth/callback?state=abc", None).await;
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        "http://localhost:3000/login?error=missing_code"
    );
}

// ============================================
// Google Ads
// ============================================

#[tokio::test]
async fn test_performance_live() {
    let ads = Arc::new(FakeAds::default());
    let app = app_with(flags(true, true, true), ads.clone());
    let token = mock_token(&app).await;

    let (status, headers, body) = get(
        &app,
        "/api/google-ads/performance?start_date=2024-01-01&end_date=2024-01-31&previous_period=true",
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "live");
    assert_eq!(headers.get("x-data-source").unwrap(), "live");
    assert_eq!(body["data"]["impressions"]["value"], 42.0);
    assert_eq!(ads.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_performance_live_failure_falls_back() {
    let ads = Arc::new(FakeAds {
        fail: true,
        ..FakeAds::default()
    });
    let app = app_with(flags(true, true, true), ads.clone());
    let token = mock_token(&app).await;

    let (status, headers, body) = get(&app, "/api/google-ads/performance", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("x-data-source").unwrap(), "mock");
    assert_eq!(body["data"]["impressions"]["value"], 203626.0);
    assert_eq!(ads.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_performance_live_failure_without_mock() {
    let ads = Arc::new(FakeAds {
        fail: true,
        ..FakeAds::default()
    });
    let app = app_with(flags(true, false, true), ads);
    let token = mock_token(&app).await;

    let (status, headers, body) = get(&app, "/api/google-ads/campaigns", Some(&token)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(headers.get("x-data-source").is_none());
    assert_eq!(body["error"]["code"], "ADS_API_ERROR");
}

#[tokio::test]
async fn test_forced_mock_skips_live() {
    let ads = Arc::new(FakeAds::default());
    let app = app_with(flags(true, true, true), ads.clone());
    let token = mock_token(&app).await;

    let (status, _, body) = get(&app, "/api/google-ads/campaigns?use_mock=true", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "mock");
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
    assert_eq!(ads.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_forced_mock_disallowed() {
    let app = app(flags(true, false, true));
    let token = mock_token(&app).await;

    let (status, _, body) = get(&app, "/api/google-ads/campaigns?use_mock=true", Some(&token)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SRC_MOCK_DISALLOWED");
}

#[tokio::test]
async fn test_bad_date_range() {
    let app = app(Config::default());
    let token = mock_token(&app).await;

    let (status, _, body) = get(
        &app,
        "/api/google-ads/performance?start_date=2024-02-01&end_date=2024-01-01",
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "API_BAD_REQUEST");
}

#[tokio::test]
async fn test_non_numeric_campaign_id_rejected() {
    let ads = Arc::new(FakeAds::default());
    let app = app_with(flags(true, true, true), ads.clone());
    let token = mock_token(&app).await;

    let (status, _, _) = get(
        &app,
        "/api/google-ads/ad_groups?campaign_id=1%20OR%201%3D1",
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(ads.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_connection_probe() {
    let app = app(flags(true, true, true));
    let token = mock_token(&app).await;
    let (status, _, body) = get(&app, "/api/google-ads/test-connection", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "success");
    assert_eq!(body["data"]["customer_id"], "8127539892");

    let app = app_with(
        flags(true, true, true),
        Arc::new(FakeAds {
            fail: true,
            ..FakeAds::default()
        }),
    );
    let token = mock_token(&app).await;
    let (_, _, body) = get(&app, "/api/google-ads/test-connection", Some(&token)).await;
    assert_eq!(body["data"]["status"], "error");
    assert_eq!(body["data"]["error_code"], "ADS_API_ERROR");
}

// ============================================
// Dashboard widgets
// ============================================

#[tokio::test]
async fn test_dashboard_widgets_are_mock() {
    let app = app(Config::default());
    let token = mock_token(&app).await;

    let (status, headers, body) = get(&app, "/api/dashboard/summary", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("x-data-source").unwrap(), "mock");
    assert_eq!(body["data"]["visitors"]["total"], 12856.0);
    assert_eq!(body["data"]["avgSession"]["value"], "3m 42s");

    let (_, _, body) = get(&app, "/api/dashboard/performance-over-time", Some(&token)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 11);
}

#[tokio::test]
async fn test_dashboard_widgets_respect_mock_flag() {
    let app = app(flags(true, false, true));
    let token = mock_token(&app).await;
    let (status, _, _) = get(&app, "/api/dashboard/site-metrics", Some(&token)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
