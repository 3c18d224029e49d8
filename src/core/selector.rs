//! Data source selection: live Google data vs synthetic fallback
//!
//! The selector is the only place that decides which source answers a
//! request. It reads the immutable [`Config`] and never mutates shared state
//! beyond the telemetry counters.
//!
//! Decision per request:
//! 1. live path disabled -> mock (if allowed) or `SRC_MOCK_DISALLOWED`
//! 2. live fetch succeeds -> `Live(payload)`
//! 3. live fetch fails -> mock (if allowed) or the live error, unchanged

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::models::{AppError, AppResult, Config};
use crate::utils::telemetry::SourceTelemetry;

/// What kind of data the caller wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Identity of the caller
    AuthSession,
    /// Google Ads reporting data
    AdPerformance,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthSession => "auth_session",
            Self::AdPerformance => "ad_performance",
        }
    }
}

/// Where a payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Mock,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Mock => "mock",
        }
    }
}

/// Tagged result of a data-fetch attempt
#[derive(Debug, Clone, PartialEq)]
pub enum DataResponse<T> {
    Live(T),
    Mock(T),
}

impl<T> DataResponse<T> {
    pub fn source(&self) -> DataSource {
        match self {
            Self::Live(_) => DataSource::Live,
            Self::Mock(_) => DataSource::Mock,
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, Self::Mock(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Live(p) | Self::Mock(p) => p,
        }
    }

    /// Split into source tag and payload
    pub fn into_parts(self) -> (DataSource, T) {
        match self {
            Self::Live(p) => (DataSource::Live, p),
            Self::Mock(p) => (DataSource::Mock, p),
        }
    }
}

/// Picks between live and mock data using process configuration
#[derive(Clone)]
pub struct DataSourceSelector {
    config: Arc<Config>,
    telemetry: Arc<SourceTelemetry>,
}

impl DataSourceSelector {
    pub fn new(config: Arc<Config>, telemetry: Arc<SourceTelemetry>) -> Self {
        Self { config, telemetry }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether a live fetch is attempted for this kind
    pub fn live_enabled(&self, kind: RequestKind) -> bool {
        match kind {
            RequestKind::AdPerformance => self.config.use_real_ads_client,
            RequestKind::AuthSession => self.config.live_auth_enabled(),
        }
    }

    /// Whether synthetic data may stand in for this kind
    pub fn mock_allowed(&self, kind: RequestKind) -> bool {
        match kind {
            RequestKind::AdPerformance => self.config.allow_mock_data,
            RequestKind::AuthSession => self.config.allow_mock_auth,
        }
    }

    /// Run the selection policy.
    ///
    /// `live` is only invoked when the live path is enabled. `mock` is only
    /// invoked when the result is going to be `Mock`. Errors that did not come
    /// from the live call to Google are returned unchanged, never masked.
    pub async fn select<T, L, Fut, M>(
        &self,
        kind: RequestKind,
        live: L,
        mock: M,
    ) -> AppResult<DataResponse<T>>
    where
        L: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
        M: FnOnce() -> T,
    {
        if !self.live_enabled(kind) {
            debug!(kind = kind.as_str(), "Live source disabled, using fallback");
            return self.fallback(kind, mock, None);
        }

        match live().await {
            Ok(payload) => {
                self.telemetry.record(kind, DataSource::Live);
                Ok(DataResponse::Live(payload))
            }
            Err(err) if err.is_live_fetch() => {
                warn!(
                    kind = kind.as_str(),
                    code = err.code_str(),
                    error = %err.message,
                    "Live fetch failed"
                );
                self.fallback(kind, mock, Some(err))
            }
            Err(err) => {
                error!(
                    kind = kind.as_str(),
                    code = err.code_str(),
                    error = %err.message,
                    "Live fetch failed outside the provider call"
                );
                self.telemetry.record_failure(kind);
                Err(err)
            }
        }
    }

    /// Serve synthetic data without touching the live provider
    pub fn force_mock<T, M>(&self, kind: RequestKind, mock: M) -> AppResult<DataResponse<T>>
    where
        M: FnOnce() -> T,
    {
        if self.mock_allowed(kind) {
            info!(kind = kind.as_str(), "Mock data requested explicitly");
            self.telemetry.record(kind, DataSource::Mock);
            Ok(DataResponse::Mock(mock()))
        } else {
            self.telemetry.record_failure(kind);
            Err(AppError::mock_disallowed(format!(
                "Mock data is disabled for {}",
                kind.as_str()
            )))
        }
    }

    fn fallback<T, M>(
        &self,
        kind: RequestKind,
        mock: M,
        live_error: Option<AppError>,
    ) -> AppResult<DataResponse<T>>
    where
        M: FnOnce() -> T,
    {
        if self.mock_allowed(kind) {
            if live_error.is_some() {
                self.telemetry.record_fallback(kind);
                info!(kind = kind.as_str(), "Falling back to mock data");
            }
            self.telemetry.record(kind, DataSource::Mock);
            return Ok(DataResponse::Mock(mock()));
        }

        self.telemetry.record_failure(kind);
        match live_error {
            // Live failure is surfaced unchanged
            Some(err) => Err(err),
            None => Err(AppError::mock_disallowed(format!(
                "Live {} is disabled and mock fallback is not allowed",
                kind.as_str()
            ))),
        }
    }
}
