//! API Request Handlers

use axum::{
    extract::{Json, Query, State},
    http::{
        header::{COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use super::middleware::{bearer_token, resolve_session, CurrentUser};
use super::types::*;
use crate::core::metrics::DateRange;
use crate::core::mock_data::{MockData, MOCK_USER_ID};
use crate::core::selector::{DataSourceSelector, RequestKind};
use crate::models::{AppError, Config};
use crate::providers::{AdsProvider, IdentityProvider};
use crate::utils::constants::{
    ACCESS_TOKEN_COOKIE, OAUTH_STATE_COOKIE, OAUTH_STATE_MAX_AGE_SECS, SERVICE_NAME,
};
use crate::utils::session::{create_access_token, SessionStore};
use crate::utils::telemetry::SourceTelemetry;

type HandlerResult = Result<Response, ApiFailure>;

/// Shared application state
pub struct AppState {
    pub config: Arc<Config>,
    pub selector: DataSourceSelector,
    pub sessions: Arc<SessionStore>,
    pub ads: Arc<dyn AdsProvider>,
    pub identity: Arc<dyn IdentityProvider>,
    pub telemetry: Arc<SourceTelemetry>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        ads: Arc<dyn AdsProvider>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let telemetry = Arc::new(SourceTelemetry::new());
        Self {
            selector: DataSourceSelector::new(config.clone(), telemetry.clone()),
            sessions: Arc::new(SessionStore::new()),
            config,
            ads,
            identity,
            telemetry,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

fn elapsed_ms(start: &Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn fail(start: &Instant) -> impl FnOnce(AppError) -> ApiFailure + '_ {
    move |err| ApiFailure::new(err, elapsed_ms(start))
}

// ============================================
// Service info
// ============================================

pub async fn root(State(state): State<Arc<AppState>>) -> Json<ApiResponse<ServiceInfo>> {
    let start = Instant::now();
    let data = ServiceInfo {
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.to_string(),
        login_url: "/api/auth/login".to_string(),
        endpoints_url: "/api/endpoints".to_string(),
    };
    Json(ApiResponse::success(data, elapsed_ms(&start)))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        environment: state.config.environment.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        use_real_ads_client: state.config.use_real_ads_client,
        allow_mock_data: state.config.allow_mock_data,
        allow_mock_auth: state.config.allow_mock_auth,
        data_sources: state.telemetry.get_stats(),
    };

    Json(ApiResponse::success(data, elapsed_ms(&start)))
}

pub async fn list_endpoints() -> Json<ApiResponse<Vec<EndpointInfo>>> {
    let start = Instant::now();
    Json(ApiResponse::success(
        super::routes::ENDPOINTS.to_vec(),
        elapsed_ms(&start),
    ))
}

// ============================================
// Auth
// ============================================

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

fn state_cookie(config: &Config, value: &str, max_age: i64) -> String {
    let mut cookie = format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
        OAUTH_STATE_COOKIE, value, max_age
    );
    if config.is_production() {
        cookie.push_str("; Secure");
    }
    cookie
}

fn redirect(location: &str, cookies: &[String]) -> Response {
    let mut response = StatusCode::SEE_OTHER.into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(location) {
        headers.insert(LOCATION, value);
    }
    for cookie in cookies {
        if let Ok(value) = HeaderValue::from_str(cookie) {
            headers.append(SET_COOKIE, value);
        }
    }
    response
}

pub async fn auth_login(State(state): State<Arc<AppState>>) -> HandlerResult {
    let start = Instant::now();

    let oauth_state = uuid::Uuid::new_v4().simple().to_string();
    let auth_url = state
        .identity
        .authorization_url(&oauth_state)
        .map_err(fail(&start))?;

    info!("OAuth login started");
    let mut response =
        Json(ApiResponse::success(LoginData { auth_url }, elapsed_ms(&start))).into_response();
    let cookie = state_cookie(&state.config, &oauth_state, OAUTH_STATE_MAX_AGE_SECS);
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    Ok(response)
}

pub async fn auth_callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let frontend = state.config.frontend_base();
    let clear_state = state_cookie(&state.config, "", 0);
    let login_error =
        |reason: &str| redirect(&format!("{}/login?error={}", frontend, reason), &[clear_state.clone()]);

    if let Some(reason) = query.error.as_deref() {
        warn!(reason = %reason, "OAuth consent denied");
        return login_error("access_denied");
    }
    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        return login_error("missing_code");
    };

    let expected = cookie_value(&headers, OAUTH_STATE_COOKIE);
    match (expected, query.state.as_deref()) {
        (Some(expected), Some(got)) if !expected.is_empty() && expected == got => {}
        _ => {
            warn!("OAuth state mismatch");
            return login_error("invalid_state");
        }
    }

    let tokens = match state.identity.exchange_code(code).await {
        Ok(tokens) => tokens,
        Err(e) => {
            error!(code = e.code_str(), error = %e.message, "Token exchange failed");
            return login_error("token_exchange_failed");
        }
    };

    let user = match state.identity.user_info(&tokens.access_token).await {
        Ok(user) => user,
        Err(e) => {
            error!(code = e.code_str(), error = %e.message, "Userinfo lookup failed");
            return login_error("user_info_failed");
        }
    };

    let jwt = match create_access_token(&state.config, &user.id) {
        Ok(jwt) => jwt,
        Err(e) => {
            error!(error = %e, "Could not sign session token");
            return login_error("token_exchange_failed");
        }
    };

    info!(user_id = %user.id, "User signed in");
    state.sessions.upsert(user, Some(tokens.access_token));
    redirect(&format!("{}/dashboard?token={}", frontend, jwt), &[clear_state])
}

/// Token check for the frontend. A rejected token is reported in the body
/// rather than as a 401, so the client can tell "logged out" from "broken".
pub async fn auth_verify(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<ApiResponse<VerifyData>> {
    let start = Instant::now();

    let Some(token) = bearer_token(&headers) else {
        return Json(ApiResponse::success(
            VerifyData {
                is_authenticated: false,
                user: None,
                error: Some("Not authenticated".to_string()),
            },
            elapsed_ms(&start),
        ));
    };

    match resolve_session(&state, token).await {
        Ok(resolved) => {
            let (source, session) = resolved.into_parts();
            Json(ApiResponse::sourced(
                VerifyData {
                    is_authenticated: true,
                    user: Some(session.user),
                    error: None,
                },
                source,
                elapsed_ms(&start),
            ))
        }
        Err(err) => {
            info!(code = err.code_str(), "Token verification failed");
            Json(ApiResponse::success(
                VerifyData {
                    is_authenticated: false,
                    user: None,
                    error: Some("Invalid token".to_string()),
                },
                elapsed_ms(&start),
            ))
        }
    }
}

pub async fn auth_mock_token(State(state): State<Arc<AppState>>) -> HandlerResult {
    let start = Instant::now();

    if state.config.is_production() || !state.config.allow_mock_auth {
        warn!("Mock token requested while mock auth is disabled");
        return Err(fail(&start)(AppError::forbidden(
            "Mock authentication is disabled. Please use Google OAuth authentication.",
        )));
    }

    let token = create_access_token(&state.config, MOCK_USER_ID).map_err(fail(&start))?;
    let data = MockTokenData {
        status: "success".to_string(),
        message: "Mock token issued for the test account".to_string(),
        token,
        user_id: MOCK_USER_ID.to_string(),
    };
    Ok(Json(ApiResponse::success(data, elapsed_ms(&start))).into_response())
}

pub async fn auth_logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let start = Instant::now();

    if let Some(token) = bearer_token(&headers) {
        if let Ok(user) = state.sessions.user_for_token(&state.config, token) {
            if state.sessions.remove(&user.id) {
                info!(user_id = %user.id, "Session dropped");
            }
        }
    }

    let mut response = Json(ApiResponse::success(
        MessageData {
            status: "success".to_string(),
            message: "Logged out successfully".to_string(),
        },
        elapsed_ms(&start),
    ))
    .into_response();

    let mut cookie = format!("{}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax", ACCESS_TOKEN_COOKIE);
    if state.config.is_production() {
        cookie.push_str("; Secure");
    }
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    response
}

// ============================================
// Google Ads
// ============================================

pub async fn ads_performance(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<PerformanceQuery>,
) -> HandlerResult {
    let start = Instant::now();
    let today = chrono::Utc::now().date_naive();

    let range = DateRange::resolve(query.start_date.as_deref(), query.end_date.as_deref(), today)
        .map_err(fail(&start))?;
    let previous = query.previous_period.then(|| range.previous_period());

    info!(
        user_id = %user.session.user.id,
        start = %range.start,
        end = %range.end,
        previous_period = query.previous_period,
        "Performance requested"
    );

    let result = if query.use_mock {
        state
            .selector
            .force_mock(RequestKind::AdPerformance, MockData::performance)
    } else {
        let ads = state.ads.clone();
        state
            .selector
            .select(
                RequestKind::AdPerformance,
                || async move { ads.performance(&range, previous.as_ref()).await },
                MockData::performance,
            )
            .await
    };
    let result = result.map_err(fail(&start))?;

    Ok(sourced_response(result, elapsed_ms(&start)))
}

pub async fn ads_campaigns(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(query): Query<MockQuery>,
) -> HandlerResult {
    let start = Instant::now();

    let result = if query.use_mock {
        state
            .selector
            .force_mock(RequestKind::AdPerformance, MockData::campaigns)
    } else {
        let ads = state.ads.clone();
        state
            .selector
            .select(
                RequestKind::AdPerformance,
                || async move { ads.campaigns().await },
                MockData::campaigns,
            )
            .await
    };
    let result = result.map_err(fail(&start))?;

    Ok(sourced_response(result, elapsed_ms(&start)))
}

pub async fn ads_ad_groups(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(query): Query<CampaignFilterQuery>,
) -> HandlerResult {
    let start = Instant::now();
    let campaign_id = query.campaign_id.filter(|c| !c.is_empty());

    let result = if query.use_mock {
        state.selector.force_mock(RequestKind::AdPerformance, || {
            MockData::ad_groups(campaign_id.as_deref())
        })
    } else {
        if let Some(id) = campaign_id.as_deref() {
            crate::core::metrics::validate_campaign_id(id).map_err(fail(&start))?;
        }
        let ads = state.ads.clone();
        let live_id = campaign_id.clone();
        state
            .selector
            .select(
                RequestKind::AdPerformance,
                || async move { ads.ad_groups(live_id.as_deref()).await },
                || MockData::ad_groups(campaign_id.as_deref()),
            )
            .await
    };
    let result = result.map_err(fail(&start))?;

    Ok(sourced_response(result, elapsed_ms(&start)))
}

pub async fn ads_search_terms(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Query(query): Query<CampaignFilterQuery>,
) -> HandlerResult {
    let start = Instant::now();
    let campaign_id = query.campaign_id.filter(|c| !c.is_empty());

    let result = if query.use_mock {
        state.selector.force_mock(RequestKind::AdPerformance, || {
            MockData::search_terms(campaign_id.as_deref())
        })
    } else {
        if let Some(id) = campaign_id.as_deref() {
            crate::core::metrics::validate_campaign_id(id).map_err(fail(&start))?;
        }
        let ads = state.ads.clone();
        let live_id = campaign_id.clone();
        state
            .selector
            .select(
                RequestKind::AdPerformance,
                || async move { ads.search_terms(live_id.as_deref()).await },
                || MockData::search_terms(campaign_id.as_deref()),
            )
            .await
    };
    let result = result.map_err(fail(&start))?;

    Ok(sourced_response(result, elapsed_ms(&start)))
}

/// Probe the Ads API directly. Never falls back to mock data.
pub async fn ads_test_connection(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> Json<ApiResponse<ConnectionTestData>> {
    let start = Instant::now();

    let data = if !state.config.use_real_ads_client {
        ConnectionTestData {
            status: "disabled".to_string(),
            message: "Live Google Ads client is disabled (USE_REAL_ADS_CLIENT=false)".to_string(),
            customer_id: Some(state.config.client_customer_id.clone()),
            account_name: None,
            error_code: None,
        }
    } else {
        match state.ads.test_connection().await {
            Ok(info) => ConnectionTestData {
                status: "success".to_string(),
                message: "Connected to Google Ads API".to_string(),
                customer_id: Some(info.customer_id),
                account_name: info.descriptive_name,
                error_code: None,
            },
            Err(e) => {
                warn!(code = e.code_str(), error = %e.message, "Google Ads connection test failed");
                ConnectionTestData {
                    status: "error".to_string(),
                    message: e.message.clone(),
                    customer_id: Some(state.config.client_customer_id.clone()),
                    account_name: None,
                    error_code: Some(e.code_str().to_string()),
                }
            }
        }
    };

    Json(ApiResponse::success(data, elapsed_ms(&start)))
}

// ============================================
// Dashboard widgets (synthetic only)
// ============================================

pub async fn dashboard_summary(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> HandlerResult {
    let start = Instant::now();
    let result = state
        .selector
        .force_mock(RequestKind::AdPerformance, MockData::dashboard_summary)
        .map_err(fail(&start))?;
    Ok(sourced_response(result, elapsed_ms(&start)))
}

pub async fn dashboard_form_performance(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> HandlerResult {
    let start = Instant::now();
    let result = state
        .selector
        .force_mock(RequestKind::AdPerformance, MockData::form_performance)
        .map_err(fail(&start))?;
    Ok(sourced_response(result, elapsed_ms(&start)))
}

pub async fn dashboard_site_metrics(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> HandlerResult {
    let start = Instant::now();
    let result = state
        .selector
        .force_mock(RequestKind::AdPerformance, MockData::site_metrics)
        .map_err(fail(&start))?;
    Ok(sourced_response(result, elapsed_ms(&start)))
}

pub async fn dashboard_performance_over_time(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> HandlerResult {
    let start = Instant::now();
    let result = state
        .selector
        .force_mock(RequestKind::AdPerformance, MockData::performance_over_time)
        .map_err(fail(&start))?;
    Ok(sourced_response(result, elapsed_ms(&start)))
}

// ============================================
// Diagnostics
// ============================================

pub async fn system_info() -> Json<ApiResponse<SystemInfo>> {
    let start = Instant::now();

    let hostname = std::env::var("HOSTNAME")
        .ok()
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|h| h.trim().to_string())
        })
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let data = SystemInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        family: std::env::consts::FAMILY.to_string(),
        hostname,
        cpus: std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    Json(ApiResponse::success(data, elapsed_ms(&start)))
}

/// A port is available when nothing on localhost accepts a connection on it
pub async fn check_port(Query(query): Query<PortQuery>) -> HandlerResult {
    let start = Instant::now();
    let port = query
        .port
        .filter(|p| *p != 0)
        .ok_or_else(|| fail(&start)(AppError::bad_request("Missing required parameter: port")))?;

    let connect = tokio::net::TcpStream::connect(("127.0.0.1", port));
    let in_use = matches!(
        tokio::time::timeout(Duration::from_secs(1), connect).await,
        Ok(Ok(_))
    );

    let data = PortStatus {
        port,
        available: !in_use,
        message: if in_use {
            format!("Port {} is already in use", port)
        } else {
            format!("Port {} is available", port)
        },
    };
    Ok(Json(ApiResponse::success(data, elapsed_ms(&start))).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; oauth_state=abc123; other=1"),
        );
        assert_eq!(cookie_value(&headers, "oauth_state"), Some("abc123"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_state_cookie_secure_in_production() {
        let dev = Config::default();
        assert!(!state_cookie(&dev, "x", 600).contains("Secure"));

        let prod = Config {
            environment: crate::models::Environment::Production,
            ..Config::default()
        };
        let cookie = state_cookie(&prod, "x", 600);
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=600"));
    }
}
