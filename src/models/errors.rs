//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so it can be grepped in logs
//! and mapped to an HTTP status in one place.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - EXTERNAL_xxx: network failures talking to Google
//! - ADS_xxx: Google Ads API errors
//! - OAUTH_xxx: Google OAuth errors
//! - SRC_xxx: data source selection errors
//! - API_xxx: API errors
//! - CFG_xxx: Configuration errors

use axum::response::{IntoResponse, Response};
use std::fmt;

use crate::api::types::ApiFailure;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    /// True when the error came from a live call to Google
    pub fn is_live_fetch(&self) -> bool {
        self.code.is_live_fetch()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Network Errors (1xx)
    // ============================================
    /// Request to Google timed out
    ExternalTimeout,
    /// Could not connect to Google
    ExternalConnectionFailed,

    // ============================================
    // Google Ads Errors (2xx)
    // ============================================
    /// Ads API returned an error response
    AdsApiError,
    /// Ads API quota exhausted (HTTP 429 / RESOURCE_EXHAUSTED)
    AdsQuotaExceeded,
    /// Missing or rejected Ads credentials
    AdsCredentials,
    /// Ads API response could not be decoded
    AdsInvalidResponse,

    // ============================================
    // Google OAuth Errors (3xx)
    // ============================================
    /// Missing or rejected OAuth client credentials / token
    OAuthCredentials,
    /// Authorization code exchange failed
    OAuthExchangeFailed,
    /// Userinfo lookup failed
    OAuthUserInfoFailed,

    // ============================================
    // Data Source Errors (4xx)
    // ============================================
    /// Live data unavailable and mock fallback is not allowed
    MockDisallowed,

    // ============================================
    // API Errors (5xx)
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Missing or invalid bearer token
    ApiUnauthorized,
    /// Operation not permitted in this environment
    ApiForbidden,
    /// Resource not found
    ApiNotFound,
    /// Internal server error
    ApiInternalError,

    // ============================================
    // Configuration Errors (6xx)
    // ============================================
    /// Missing environment variable
    ConfigMissingEnv,
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // Generic Errors (9xx)
    // ============================================
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExternalTimeout => "EXTERNAL_TIMEOUT",
            Self::ExternalConnectionFailed => "EXTERNAL_CONNECTION_FAILED",

            Self::AdsApiError => "ADS_API_ERROR",
            Self::AdsQuotaExceeded => "ADS_QUOTA_EXCEEDED",
            Self::AdsCredentials => "ADS_CREDENTIALS",
            Self::AdsInvalidResponse => "ADS_INVALID_RESPONSE",

            Self::OAuthCredentials => "OAUTH_CREDENTIALS",
            Self::OAuthExchangeFailed => "OAUTH_EXCHANGE_FAILED",
            Self::OAuthUserInfoFailed => "OAUTH_USERINFO_FAILED",

            Self::MockDisallowed => "SRC_MOCK_DISALLOWED",

            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiUnauthorized => "API_UNAUTHORIZED",
            Self::ApiForbidden => "API_FORBIDDEN",
            Self::ApiNotFound => "API_NOT_FOUND",
            Self::ApiInternalError => "API_INTERNAL_ERROR",

            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest => 400,
            Self::ApiUnauthorized | Self::OAuthCredentials => 401,
            Self::ApiForbidden => 403,
            Self::ApiNotFound => 404,
            Self::AdsQuotaExceeded => 429,
            Self::ExternalConnectionFailed
            | Self::AdsApiError
            | Self::AdsInvalidResponse
            | Self::OAuthExchangeFailed
            | Self::OAuthUserInfoFailed => 502,
            Self::AdsCredentials | Self::MockDisallowed => 503,
            Self::ExternalTimeout => 504,
            _ => 500,
        }
    }

    /// Failures of a live call to Google (network, credential, quota)
    pub fn is_live_fetch(&self) -> bool {
        matches!(
            self,
            Self::ExternalTimeout
                | Self::ExternalConnectionFailed
                | Self::AdsApiError
                | Self::AdsQuotaExceeded
                | Self::AdsCredentials
                | Self::AdsInvalidResponse
                | Self::OAuthCredentials
                | Self::OAuthExchangeFailed
                | Self::OAuthUserInfoFailed
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Request to Google timed out
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExternalTimeout, msg)
    }

    /// Ads API error response
    pub fn ads_api(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AdsApiError, msg)
    }

    /// Ads API quota exhausted
    pub fn quota_exceeded(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AdsQuotaExceeded, msg)
    }

    /// Missing Ads credential
    pub fn ads_credentials(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AdsCredentials, msg)
    }

    /// Missing OAuth credential
    pub fn oauth_credentials(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::OAuthCredentials, msg)
    }

    /// Live data unavailable, mock fallback disallowed
    pub fn mock_disallowed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::MockDisallowed, msg)
    }

    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    /// Missing or invalid credentials on the request
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiUnauthorized, msg)
    }

    /// Not allowed here
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiForbidden, msg)
    }

    /// API internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }

    /// Missing environment variable
    pub fn missing_env(name: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissingEnv,
            format!("{} is required", name),
        )
    }

    /// Invalid configuration value
    pub fn invalid_config(name: &str, msg: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            format!("{}: {}", name, msg.into()),
        )
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// HTTP mapping
// ============================================

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ApiFailure::new(self, 0.0).into_response()
    }
}

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::ExternalTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::ExternalConnectionFailed, "Connection failed")
        } else if err.is_decode() {
            Self::new(ErrorCode::AdsInvalidResponse, err.to_string())
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::AdsInvalidResponse, "JSON parse error", err)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::with_source(ErrorCode::ApiUnauthorized, "Could not validate credentials", err)
    }
}
