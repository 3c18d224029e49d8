//! Google OAuth 2.0 identity provider
//!
//! Authorization-code flow for dashboard login and userinfo lookups for
//! bearer tokens that were issued by Google rather than by this service.
//!
//! Client credentials come from `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET`
//! or, when those are unset, from `{CREDENTIALS_DIR}/client_secret.json`
//! (the file downloaded from the Google Cloud console).

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::{AppError, AppResult, Config, ErrorCode, SecretKey, User};
use crate::utils::constants::{
    GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GOOGLE_USERINFO_URL, HTTP_TIMEOUT_SECS, OAUTH_SCOPES,
    USER_ID_PREFIX,
};

// ============================================
// Trait
// ============================================

/// Tokens returned by the authorization-code exchange
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Consent-screen URL carrying `state`
    fn authorization_url(&self, state: &str) -> AppResult<String>;

    async fn exchange_code(&self, code: &str) -> AppResult<OAuthTokens>;

    /// Resolve a Google access token to a user
    async fn user_info(&self, access_token: &str) -> AppResult<User>;
}

// ============================================
// Client credentials
// ============================================

#[derive(Debug, Clone)]
pub struct OAuthClientCredentials {
    pub client_id: String,
    pub client_secret: SecretKey,
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    web: Option<ClientSecretSection>,
    installed: Option<ClientSecretSection>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretSection {
    client_id: String,
    client_secret: String,
}

impl OAuthClientCredentials {
    /// Env values first, then `client_secret.json`
    pub fn resolve(config: &Config) -> Option<Self> {
        if let (Some(id), Some(secret)) = (
            config.google.client_id.as_ref(),
            config.google.client_secret.as_ref(),
        ) {
            return Some(Self {
                client_id: id.clone(),
                client_secret: secret.clone(),
            });
        }

        let path = config.credentials_dir.join("client_secret.json");
        match Self::from_file(&path) {
            Ok(creds) => {
                info!(path = %path.display(), "Loaded OAuth client credentials");
                Some(creds)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "No OAuth client credentials available");
                None
            }
        }
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> AppResult<Self> {
        let file: ClientSecretFile = serde_json::from_str(raw)
            .map_err(|e| AppError::invalid_config("client_secret.json", e.to_string()))?;
        let section = file.web.or(file.installed).ok_or_else(|| {
            AppError::invalid_config(
                "client_secret.json",
                "expected a 'web' or 'installed' section",
            )
        })?;
        Ok(Self {
            client_id: section.client_id,
            client_secret: SecretKey::new(section.client_secret),
        })
    }
}

// ============================================
// Google implementation
// ============================================

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl From<GoogleUserInfo> for User {
    fn from(info: GoogleUserInfo) -> Self {
        User {
            id: format!("{}{}", USER_ID_PREFIX, info.id),
            name: info.name.unwrap_or_else(|| "Google User".to_string()),
            email: info.email.unwrap_or_else(|| "unknown@example.com".to_string()),
            picture: info.picture.filter(|p| !p.is_empty()),
        }
    }
}

pub struct GoogleOAuthClient {
    http: reqwest::Client,
    credentials: Option<OAuthClientCredentials>,
    redirect_uri: Url,
}

impl GoogleOAuthClient {
    pub fn new(config: &Config, credentials: Option<OAuthClientCredentials>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            credentials,
            redirect_uri: config.redirect_uri.clone(),
        })
    }

    fn credentials(&self) -> AppResult<&OAuthClientCredentials> {
        self.credentials
            .as_ref()
            .ok_or_else(|| AppError::oauth_credentials("Google OAuth client is not configured"))
    }
}

#[async_trait]
impl IdentityProvider for GoogleOAuthClient {
    fn authorization_url(&self, state: &str) -> AppResult<String> {
        let creds = self.credentials()?;
        let scope = OAUTH_SCOPES.join(" ");
        let url = Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", creds.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("include_granted_scopes", "true"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::internal(format!("Invalid authorization URL: {}", e)))?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> AppResult<OAuthTokens> {
        let creds = self.credentials()?;
        debug!("Exchanging authorization code");

        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", creds.client_id.as_str()),
                ("client_secret", creds.client_secret.expose()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Token exchange rejected");
            return Err(AppError::new(
                ErrorCode::OAuthExchangeFailed,
                format!("Token exchange failed with HTTP {}", status.as_u16()),
            ));
        }

        let tokens: OAuthTokens = response.json().await.map_err(|e| {
            AppError::new(
                ErrorCode::OAuthExchangeFailed,
                format!("Malformed token response: {}", e),
            )
        })?;
        Ok(tokens)
    }

    async fn user_info(&self, access_token: &str) -> AppResult<User> {
        let response = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => {
                let info: GoogleUserInfo = response.json().await.map_err(|e| {
                    AppError::new(
                        ErrorCode::OAuthUserInfoFailed,
                        format!("Malformed userinfo response: {}", e),
                    )
                })?;
                Ok(info.into())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(AppError::oauth_credentials("Google rejected the access token"))
            }
            s => Err(AppError::new(
                ErrorCode::OAuthUserInfoFailed,
                format!("Userinfo request failed with HTTP {}", s.as_u16()),
            )),
        }
    }
}
