//! Data source telemetry
//!
//! Counts how requests were answered (live, mock, fallback after a live
//! failure, or failed outright) so operators can see from `/api/health`
//! whether the dashboard is showing real numbers.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::selector::{DataSource, RequestKind};

#[derive(Debug, Default)]
struct KindCounters {
    live: AtomicU64,
    mock: AtomicU64,
    fallbacks: AtomicU64,
    failures: AtomicU64,
}

impl KindCounters {
    fn snapshot(&self) -> KindStats {
        KindStats {
            live: self.live.load(Ordering::Relaxed),
            mock: self.mock.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Counters for one request kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindStats {
    pub live: u64,
    pub mock: u64,
    /// Mock responses served because the live call failed
    pub fallbacks: u64,
    pub failures: u64,
}

/// Snapshot of all counters
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryStats {
    pub auth_session: KindStats,
    pub ad_performance: KindStats,
    pub since: u64,
}

/// Lock-free counters shared by every request
#[derive(Debug)]
pub struct SourceTelemetry {
    auth: KindCounters,
    ads: KindCounters,
    session_start: u64,
}

impl Default for SourceTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceTelemetry {
    pub fn new() -> Self {
        Self {
            auth: KindCounters::default(),
            ads: KindCounters::default(),
            session_start: current_timestamp(),
        }
    }

    fn counters(&self, kind: RequestKind) -> &KindCounters {
        match kind {
            RequestKind::AuthSession => &self.auth,
            RequestKind::AdPerformance => &self.ads,
        }
    }

    pub fn record(&self, kind: RequestKind, source: DataSource) {
        let c = self.counters(kind);
        match source {
            DataSource::Live => c.live.fetch_add(1, Ordering::Relaxed),
            DataSource::Mock => c.mock.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub fn record_fallback(&self, kind: RequestKind) {
        self.counters(kind).fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, kind: RequestKind) {
        self.counters(kind).failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> TelemetryStats {
        TelemetryStats {
            auth_session: self.auth.snapshot(),
            ad_performance: self.ads.snapshot(),
            since: self.session_start,
        }
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
