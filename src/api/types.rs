//! API Request/Response Types

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::core::selector::{DataResponse, DataSource};
use crate::models::{AppError, User};
use crate::utils::constants::DATA_SOURCE_HEADER;
use crate::utils::telemetry::TelemetryStats;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    /// "live" or "mock" for selector-backed endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<DataSource>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            source: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn sourced(data: T, source: DataSource, latency_ms: f64) -> Self {
        Self {
            source: Some(source),
            ..Self::success(data, latency_ms)
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            source: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
            details: None,
        }
    }
}

/// Handler failure rendered as the error envelope
#[derive(Debug)]
pub struct ApiFailure {
    pub error: AppError,
    pub latency_ms: f64,
}

impl ApiFailure {
    pub fn new(error: AppError, latency_ms: f64) -> Self {
        Self { error, latency_ms }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.code.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ApiResponse::error(ApiError::from(&self.error), self.latency_ms);
        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert("WWW-Authenticate", HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Render a selector result with its source tag in body and header
pub fn sourced_response<T: Serialize>(result: DataResponse<T>, latency_ms: f64) -> Response {
    let (source, data) = result.into_parts();
    let mut response = Json(ApiResponse::sourced(data, source, latency_ms)).into_response();
    response
        .headers_mut()
        .insert(DATA_SOURCE_HEADER, HeaderValue::from_static(source.as_str()));
    response
}

// ============================================
// Query parameters
// ============================================

#[derive(Debug, Default, Deserialize)]
pub struct PerformanceQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub previous_period: bool,
    #[serde(default)]
    pub use_mock: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct MockQuery {
    #[serde(default)]
    pub use_mock: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct CampaignFilterQuery {
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub use_mock: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PortQuery {
    pub port: Option<u16>,
}

// ============================================
// Auth
// ============================================

#[derive(Debug, Serialize)]
pub struct LoginData {
    pub auth_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyData {
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MockTokenData {
    pub status: String,
    pub message: String,
    pub token: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct MessageData {
    pub status: String,
    pub message: String,
}

// ============================================
// Google Ads
// ============================================

#[derive(Debug, Serialize)]
pub struct ConnectionTestData {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

// ============================================
// Service info
// ============================================

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub environment: String,
    pub login_url: String,
    pub endpoints_url: String,
}

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub environment: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub use_real_ads_client: bool,
    pub allow_mock_data: bool,
    pub allow_mock_auth: bool,
    pub data_sources: TelemetryStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub auth_required: bool,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub family: String,
    pub hostname: String,
    pub cpus: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct PortStatus {
    pub port: u16,
    pub available: bool,
    pub message: String,
}
