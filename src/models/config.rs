//! Configuration module for the Allervie Analytics API
//!
//! Read once at startup, immutable afterwards. Every value is parsed into a
//! typed field up front; malformed values abort startup instead of silently
//! falling back to a default.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use reqwest::Url;
use tracing::{info, warn};

use super::errors::{AppError, AppResult};
use crate::utils::constants::{
    DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES, DEFAULT_ADS_API_VERSION, DEFAULT_CLIENT_CUSTOMER_ID,
    DEFAULT_FRONTEND_URL, DEFAULT_PORT, DEFAULT_REDIRECT_URI, DEV_SECRET_KEY, EXTRA_CORS_ORIGINS,
    MIN_SECRET_KEY_LEN,
};

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(AppError::invalid_config(
                "ENVIRONMENT",
                format!("expected development or production, got '{}'", other),
            )),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque secret. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***)")
    }
}

/// Google OAuth client + Google Ads API credentials
#[derive(Debug, Clone, Default)]
pub struct GoogleCredentials {
    /// OAuth client id (falls back to client_secret.json)
    pub client_id: Option<String>,
    /// OAuth client secret (falls back to client_secret.json)
    pub client_secret: Option<SecretKey>,
    /// Ads API developer token
    pub developer_token: Option<SecretKey>,
    /// Long-lived refresh token used for Ads API calls
    pub refresh_token: Option<SecretKey>,
    /// Manager account id sent as `login-customer-id`
    pub login_customer_id: Option<String>,
    /// Ads REST API version, e.g. "v17"
    pub api_version: String,
}

/// Process-wide configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    /// Attempt live Google Ads / Google identity calls
    pub use_real_ads_client: bool,
    /// Serve synthetic Ads data when live data is unavailable
    pub allow_mock_data: bool,
    /// Serve a synthetic session when live auth is unavailable
    pub allow_mock_auth: bool,
    /// Ads account queried (digits only)
    pub client_customer_id: String,
    pub redirect_uri: Url,
    pub frontend_url: Url,
    pub secret_key: SecretKey,
    pub host: IpAddr,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub credentials_dir: PathBuf,
    pub access_token_expire_minutes: i64,
    pub google: GoogleCredentials,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            use_real_ads_client: true,
            allow_mock_data: true,
            allow_mock_auth: true,
            client_customer_id: DEFAULT_CLIENT_CUSTOMER_ID.to_string(),
            redirect_uri: Url::parse(DEFAULT_REDIRECT_URI).expect("default redirect uri is valid"),
            frontend_url: Url::parse(DEFAULT_FRONTEND_URL).expect("default frontend url is valid"),
            secret_key: SecretKey::new(DEV_SECRET_KEY),
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            cors_origins: build_cors_origins(DEFAULT_FRONTEND_URL),
            credentials_dir: PathBuf::from("credentials"),
            access_token_expire_minutes: DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES,
            google: GoogleCredentials {
                api_version: DEFAULT_ADS_API_VERSION.to_string(),
                ..GoogleCredentials::default()
            },
        }
    }
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Unset or blank keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let environment = match get("ENVIRONMENT") {
            Some(v) => v.parse()?,
            None => defaults.environment,
        };

        let use_real_ads_client =
            parse_flag("USE_REAL_ADS_CLIENT", get("USE_REAL_ADS_CLIENT"), defaults.use_real_ads_client)?;
        let allow_mock_data =
            parse_flag("ALLOW_MOCK_DATA", get("ALLOW_MOCK_DATA"), defaults.allow_mock_data)?;
        let allow_mock_auth =
            parse_flag("ALLOW_MOCK_AUTH", get("ALLOW_MOCK_AUTH"), defaults.allow_mock_auth)?;

        let client_customer_id = match get("CLIENT_CUSTOMER_ID") {
            Some(v) => parse_customer_id("CLIENT_CUSTOMER_ID", &v)?,
            None => defaults.client_customer_id,
        };

        let redirect_uri = match get("REDIRECT_URI") {
            Some(v) => parse_http_url("REDIRECT_URI", &v)?,
            None => defaults.redirect_uri,
        };
        let frontend_raw = get("FRONTEND_URL");
        let frontend_url = match &frontend_raw {
            Some(v) => parse_http_url("FRONTEND_URL", v)?,
            None => defaults.frontend_url,
        };

        let secret_key = match get("SECRET_KEY") {
            Some(v) => SecretKey::new(v),
            None if environment == Environment::Production => {
                return Err(AppError::missing_env("SECRET_KEY"));
            }
            None => defaults.secret_key,
        };
        if environment == Environment::Production {
            if secret_key.expose() == DEV_SECRET_KEY {
                return Err(AppError::invalid_config(
                    "SECRET_KEY",
                    "the development default cannot be used in production",
                ));
            }
            if secret_key.as_bytes().len() < MIN_SECRET_KEY_LEN {
                return Err(AppError::invalid_config(
                    "SECRET_KEY",
                    format!("must be at least {} bytes in production", MIN_SECRET_KEY_LEN),
                ));
            }
        }

        let host = match get("HOST") {
            Some(v) => v
                .parse::<IpAddr>()
                .map_err(|e| AppError::invalid_config("HOST", e.to_string()))?,
            None => defaults.host,
        };
        let port = match get("PORT") {
            Some(v) => v
                .parse::<u16>()
                .map_err(|e| AppError::invalid_config("PORT", format!("'{}': {}", v, e)))?,
            None => defaults.port,
        };

        let access_token_expire_minutes = match get("ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(v) => match v.parse::<i64>() {
                Ok(m) if m > 0 => m,
                _ => {
                    return Err(AppError::invalid_config(
                        "ACCESS_TOKEN_EXPIRE_MINUTES",
                        format!("expected a positive integer, got '{}'", v),
                    ))
                }
            },
            None => defaults.access_token_expire_minutes,
        };

        let credentials_dir = get("CREDENTIALS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.credentials_dir);

        let login_customer_id = match get("GOOGLE_ADS_LOGIN_CUSTOMER_ID") {
            Some(v) => Some(parse_customer_id("GOOGLE_ADS_LOGIN_CUSTOMER_ID", &v)?),
            None => None,
        };

        let google = GoogleCredentials {
            client_id: get("GOOGLE_CLIENT_ID"),
            client_secret: get("GOOGLE_CLIENT_SECRET").map(SecretKey::new),
            developer_token: get("GOOGLE_ADS_DEVELOPER_TOKEN").map(SecretKey::new),
            refresh_token: get("GOOGLE_ADS_REFRESH_TOKEN").map(SecretKey::new),
            login_customer_id,
            api_version: get("GOOGLE_ADS_API_VERSION")
                .unwrap_or_else(|| DEFAULT_ADS_API_VERSION.to_string()),
        };

        let cors_origins = build_cors_origins(
            frontend_raw
                .as_deref()
                .unwrap_or(DEFAULT_FRONTEND_URL),
        );

        Ok(Self {
            environment,
            use_real_ads_client,
            allow_mock_data,
            allow_mock_auth,
            client_customer_id,
            redirect_uri,
            frontend_url,
            secret_key,
            host,
            port,
            cors_origins,
            credentials_dir,
            access_token_expire_minutes,
            google,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Live identity checks are tied to the live client switch
    pub fn live_auth_enabled(&self) -> bool {
        self.use_real_ads_client
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Frontend URL without trailing slash, for building redirects
    pub fn frontend_base(&self) -> String {
        self.frontend_url.as_str().trim_end_matches('/').to_string()
    }

    /// Log the effective configuration. Secrets are never logged.
    pub fn log_summary(&self) {
        info!(
            environment = %self.environment,
            use_real_ads_client = self.use_real_ads_client,
            allow_mock_data = self.allow_mock_data,
            allow_mock_auth = self.allow_mock_auth,
            customer_id = %self.client_customer_id,
            ads_api_version = %self.google.api_version,
            "Configuration loaded"
        );
        if self.google.developer_token.is_some() {
            info!("GOOGLE_ADS_DEVELOPER_TOKEN configured (value hidden)");
        }
        if self.is_production() && (self.allow_mock_data || self.allow_mock_auth) {
            warn!("Mock fallback is enabled in production");
        }
    }
}

/// Strict boolean parsing; unknown spellings are rejected
fn parse_flag(name: &str, raw: Option<String>, default: bool) -> AppResult<bool> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(AppError::invalid_config(
            name,
            format!("expected a boolean, got '{}'", raw),
        )),
    }
}

/// Ads customer ids may be written as 123-456-7890
fn parse_customer_id(name: &str, raw: &str) -> AppResult<String> {
    let digits: String = raw.chars().filter(|c| *c != '-').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::invalid_config(
            name,
            format!("expected a numeric customer id, got '{}'", raw),
        ));
    }
    Ok(digits)
}

fn parse_http_url(name: &str, raw: &str) -> AppResult<Url> {
    let url = Url::parse(raw).map_err(|e| AppError::invalid_config(name, format!("'{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(AppError::invalid_config(
            name,
            format!("unsupported scheme '{}'", scheme),
        )),
    }
}

fn build_cors_origins(frontend: &str) -> Vec<String> {
    let mut origins: Vec<String> = EXTRA_CORS_ORIGINS.iter().map(|s| s.to_string()).collect();
    let frontend = frontend.trim_end_matches('/').to_string();
    if !origins.contains(&frontend) {
        origins.push(frontend);
    }
    origins
}
