//! API Middleware (Auth, Logging)

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::handlers::AppState;
use super::types::ApiFailure;
use crate::core::mock_data::{MockData, MOCK_USER_ID};
use crate::core::selector::{DataResponse, DataSource, RequestKind};
use crate::models::{AppError, AppResult, AuthSession};
use crate::utils::constants::DEFAULT_PROVIDER_TOKEN_TTL_SECS;

/// Bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve a bearer token to a session.
///
/// Our own JWTs resolve locally. Anything else is treated as a Google access
/// token and goes through the data source selector.
pub async fn resolve_session(
    state: &AppState,
    token: &str,
) -> AppResult<DataResponse<AuthSession>> {
    let config = state.selector.config();

    if let Ok(user) = state.sessions.user_for_token(config, token) {
        debug!(user_id = %user.id, "Session token accepted");
        let session = AuthSession {
            provider_token: state.sessions.provider_token(&user.id),
            expires_in: (config.access_token_expire_minutes.max(0) as u64) * 60,
            user,
        };
        if session.user.id != MOCK_USER_ID {
            state.telemetry.record(RequestKind::AuthSession, DataSource::Live);
            return Ok(DataResponse::Live(session));
        }
        // A signed test-account token is still synthetic auth
        return state
            .selector
            .force_mock(RequestKind::AuthSession, || session)
            .map_err(|err| {
                warn!(code = err.code_str(), "Test-account token rejected");
                AppError::unauthorized("Could not validate credentials")
            });
    }

    let identity = state.identity.clone();
    let sessions = state.sessions.clone();
    let provider_token = token.to_string();

    let result = state
        .selector
        .select(
            RequestKind::AuthSession,
            || async move {
                let user = identity.user_info(&provider_token).await?;
                sessions.upsert(user.clone(), Some(provider_token.clone()));
                Ok(AuthSession {
                    user,
                    provider_token: Some(provider_token),
                    expires_in: DEFAULT_PROVIDER_TOKEN_TTL_SECS,
                })
            },
            MockData::session,
        )
        .await;

    result.map_err(|err| {
        warn!(code = err.code_str(), "Bearer token rejected");
        AppError::unauthorized("Could not validate credentials")
    })
}

/// Authenticated caller, extracted from the bearer token
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub session: AuthSession,
    pub source: DataSource,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiFailure;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let start = Instant::now();
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            ApiFailure::new(
                AppError::unauthorized("Not authenticated"),
                start.elapsed().as_secs_f64() * 1000.0,
            )
        })?;

        let (source, session) = resolve_session(state, token)
            .await
            .map_err(|e| ApiFailure::new(e, start.elapsed().as_secs_f64() * 1000.0))?
            .into_parts();

        Ok(CurrentUser { session, source })
    }
}

/// Request logging middleware
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = %latency.as_millis(),
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
