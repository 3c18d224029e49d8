//! Data source selection tests

use allervie_api::core::{DataResponse, DataSource, DataSourceSelector, MockData, RequestKind};
use allervie_api::models::{AdsPerformance, AppError, AppResult, Config, ErrorCode};
use allervie_api::utils::SourceTelemetry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn selector_for(config: Config) -> (DataSourceSelector, Arc<SourceTelemetry>) {
    let telemetry = Arc::new(SourceTelemetry::new());
    (
        DataSourceSelector::new(Arc::new(config), telemetry.clone()),
        telemetry,
    )
}

fn config(use_real: bool, mock_data: bool, mock_auth: bool) -> Config {
    Config {
        use_real_ads_client: use_real,
        allow_mock_data: mock_data,
        allow_mock_auth: mock_auth,
        ..Config::default()
    }
}

fn all_flag_combinations() -> Vec<(bool, bool, bool)> {
    let mut out = Vec::new();
    for use_real in [false, true] {
        for mock_data in [false, true] {
            for mock_auth in [false, true] {
                out.push((use_real, mock_data, mock_auth));
            }
        }
    }
    out
}

fn live_payload() -> AdsPerformance {
    let mut perf = MockData::performance();
    perf.impressions.value = 1.0;
    perf
}

#[tokio::test]
async fn test_live_disabled_never_calls_live() {
    for (_, mock_data, mock_auth) in all_flag_combinations() {
        let (selector, _) = selector_for(config(false, mock_data, mock_auth));
        let calls = AtomicUsize::new(0);

        let result = selector
            .select(
                RequestKind::AdPerformance,
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(live_payload())
                },
                MockData::performance,
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        if mock_data {
            assert_eq!(result.unwrap(), DataResponse::Mock(MockData::performance()));
        } else {
            assert_eq!(result.unwrap_err().code, ErrorCode::MockDisallowed);
        }
    }
}

#[tokio::test]
async fn test_live_success_returns_fetched_payload() {
    for (_, mock_data, mock_auth) in all_flag_combinations() {
        let (selector, telemetry) = selector_for(config(true, mock_data, mock_auth));
        let result = selector
            .select(
                RequestKind::AdPerformance,
                || async { Ok(live_payload()) },
                MockData::performance,
            )
            .await
            .unwrap();

        assert_eq!(result, DataResponse::Live(live_payload()));
        assert_eq!(telemetry.get_stats().ad_performance.live, 1);
    }
}

#[tokio::test]
async fn test_live_failure_falls_back_when_allowed() {
    let (selector, telemetry) = selector_for(config(true, true, false));
    let result = selector
        .select(
            RequestKind::AdPerformance,
            || async { Err::<AdsPerformance, _>(AppError::ads_api("backend error")) },
            MockData::performance,
        )
        .await
        .unwrap();

    assert!(result.is_mock());
    let stats = telemetry.get_stats().ad_performance;
    assert_eq!(stats.fallbacks, 1);
    assert_eq!(stats.mock, 1);
}

#[tokio::test]
async fn test_live_failure_propagates_when_mock_disallowed() {
    for (failure, code) in [
        (AppError::quota_exceeded("quota"), ErrorCode::AdsQuotaExceeded),
        (AppError::ads_credentials("bad token"), ErrorCode::AdsCredentials),
        (AppError::timeout("slow"), ErrorCode::ExternalTimeout),
    ] {
        let (selector, telemetry) = selector_for(config(true, false, true));
        let err = selector
            .select(
                RequestKind::AdPerformance,
                || async move { Err::<AdsPerformance, _>(failure) },
                MockData::performance,
            )
            .await
            .unwrap_err();

        assert_eq!(err.code, code);
        assert_eq!(telemetry.get_stats().ad_performance.failures, 1);
    }
}

#[tokio::test]
async fn test_timeout_scenario_serves_default_payload() {
    let (selector, _) = selector_for(config(true, true, true));
    let result = selector
        .select(
            RequestKind::AdPerformance,
            || async {
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
                Err::<AdsPerformance, _>(AppError::timeout("Google Ads request timed out"))
            },
            MockData::performance,
        )
        .await
        .unwrap();

    assert_eq!(result, DataResponse::Mock(MockData::performance()));
}

#[tokio::test]
async fn test_auth_session_with_live_disabled_is_mock() {
    let (selector, telemetry) = selector_for(config(false, false, true));
    let calls = AtomicUsize::new(0);

    let result = selector
        .select(
            RequestKind::AuthSession,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                AppResult::Ok(MockData::session())
            },
            MockData::session,
        )
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(result.source(), DataSource::Mock);
    assert_eq!(result.into_inner(), MockData::session());
    assert_eq!(telemetry.get_stats().auth_session.mock, 1);
}

#[tokio::test]
async fn test_mock_generator_only_runs_when_used() {
    let (selector, _) = selector_for(config(true, true, true));
    let mock_calls = AtomicUsize::new(0);

    let result = selector
        .select(
            RequestKind::AdPerformance,
            || async { Ok(live_payload()) },
            || {
                mock_calls.fetch_add(1, Ordering::SeqCst);
                MockData::performance()
            },
        )
        .await
        .unwrap();

    assert!(!result.is_mock());
    assert_eq!(mock_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_non_provider_error_propagates_even_with_mock_allowed() {
    let (selector, telemetry) = selector_for(config(true, true, true));
    let err = selector
        .select(
            RequestKind::AdPerformance,
            || async { Err::<AdsPerformance, _>(AppError::new(ErrorCode::Unknown, "builder error")) },
            MockData::performance,
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::Unknown);
    let stats = telemetry.get_stats().ad_performance;
    assert_eq!(stats.mock, 0);
    assert_eq!(stats.fallbacks, 0);
    assert_eq!(stats.failures, 1);
}
