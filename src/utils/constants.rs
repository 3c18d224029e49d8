//! Shared constants: defaults, Google endpoints, OAuth scopes
//!
//! Nothing outside this module hardcodes a URL or a default value.

// ============================================
// Service identity
// ============================================

pub const SERVICE_NAME: &str = "Allervie Analytics API";

// ============================================
// Configuration defaults
// ============================================

pub const DEFAULT_PORT: u16 = 5002;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:5002/api/auth/callback";
pub const DEFAULT_CLIENT_CUSTOMER_ID: &str = "8127539892";
pub const DEFAULT_ADS_API_VERSION: &str = "v17";
/// One day
pub const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 60 * 24;
/// Only accepted outside production
pub const DEV_SECRET_KEY: &str = "allervie-dashboard-secret-key";
pub const MIN_SECRET_KEY_LEN: usize = 16;

/// Origins always allowed in addition to FRONTEND_URL
pub const EXTRA_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "https://allervie.bluehighlightedtext.com",
];

// ============================================
// Google OAuth
// ============================================

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

pub const OAUTH_SCOPES: [&str; 7] = [
    "https://www.googleapis.com/auth/analytics.readonly",
    "https://www.googleapis.com/auth/adwords",
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/analytics",
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/analytics.edit",
    "openid",
];

/// Prefix for user ids derived from Google account ids
pub const USER_ID_PREFIX: &str = "google-oauth2|";

// ============================================
// Google Ads
// ============================================

pub const GOOGLE_ADS_BASE_URL: &str = "https://googleads.googleapis.com";
/// Micros per currency unit
pub const MICROS_PER_UNIT: f64 = 1_000_000.0;
/// Search terms returned per request
pub const SEARCH_TERM_LIMIT: u32 = 100;

// ============================================
// HTTP / session
// ============================================

/// Timeout for every outbound Google request
pub const HTTP_TIMEOUT_SECS: u64 = 30;
/// Refresh the cached Ads access token this long before expiry
pub const TOKEN_REFRESH_SKEW_SECS: u64 = 60;
/// Lifetime of the oauth_state cookie
pub const OAUTH_STATE_MAX_AGE_SECS: i64 = 600;
/// Provider token lifetime assumed when Google omits expires_in
pub const DEFAULT_PROVIDER_TOKEN_TTL_SECS: u64 = 3600;

pub const OAUTH_STATE_COOKIE: &str = "oauth_state";
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const DATA_SOURCE_HEADER: &str = "x-data-source";

// ============================================
// Default date window
// ============================================

/// Default start: this many days before today
pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;
