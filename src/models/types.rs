//! Payload types served to the dashboard
//!
//! Field names follow the frontend contract, which mixes camelCase and
//! snake_case; serde renames keep the Rust side consistent.

use serde::{Deserialize, Serialize};

// ============================================
// Google Ads
// ============================================

/// A metric value with its percentage change vs the previous period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricWithChange {
    pub value: f64,
    pub change: f64,
}

impl MetricWithChange {
    pub fn new(value: f64, change: f64) -> Self {
        Self { value, change }
    }

    /// Value with no comparison period
    pub fn flat(value: f64) -> Self {
        Self { value, change: 0.0 }
    }
}

/// Account-level performance over a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdsPerformance {
    pub impressions: MetricWithChange,
    pub clicks: MetricWithChange,
    pub conversions: MetricWithChange,
    pub cost: MetricWithChange,
    pub click_through_rate: MetricWithChange,
    pub conversion_rate: MetricWithChange,
    pub cost_per_conversion: MetricWithChange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub status: String,
    pub impressions: f64,
    pub clicks: f64,
    pub conversions: f64,
    pub cost: f64,
    pub ctr: f64,
    pub conversion_rate: f64,
    #[serde(rename = "costPerConversion")]
    pub cost_per_conversion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdGroup {
    pub id: String,
    pub name: String,
    pub campaign_id: String,
    pub campaign_name: String,
    pub status: String,
    pub impressions: f64,
    pub clicks: f64,
    pub conversions: f64,
    pub cost: f64,
    pub ctr: f64,
    pub conversion_rate: f64,
    #[serde(rename = "costPerConversion")]
    pub cost_per_conversion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchTerm {
    pub search_term: String,
    pub campaign_id: String,
    pub campaign_name: String,
    pub match_type: String,
    pub impressions: f64,
    pub clicks: f64,
    pub conversions: f64,
    pub cost: f64,
    pub ctr: f64,
    pub conversion_rate: f64,
    #[serde(rename = "costPerConversion")]
    pub cost_per_conversion: f64,
}

// ============================================
// Auth
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Who is calling, and the Google token backing the session if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSession {
    pub user: User,
    #[serde(skip_serializing)]
    pub provider_token: Option<String>,
    pub expires_in: u64,
}

// ============================================
// Dashboard widgets
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

/// Widget values are numbers or preformatted strings ("3m 42s")
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricWithTrend {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<MetricValue>,
    pub change: f64,
    pub trend: TrendDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficSource {
    pub source: String,
    pub value: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub visitors: MetricWithTrend,
    pub page_views: MetricWithTrend,
    pub bounce_rate: MetricWithTrend,
    pub avg_session: MetricWithTrend,
    pub traffic_sources: Vec<TrafficSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormPerformanceItem {
    pub total_submissions: u32,
    pub completion_rate: f64,
    pub avg_time_to_complete: String,
    pub change_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormPerformance {
    pub patient_forms: FormPerformanceItem,
    pub sponsor_forms: FormPerformanceItem,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteMetrics {
    pub conversion_rate: MetricWithChange,
    pub revenue: MetricWithChange,
    pub sessions: MetricWithChange,
    pub engagement: MetricWithChange,
    pub bounce_rate: MetricWithChange,
    pub avg_order: MetricWithChange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub time: String,
    pub conversions: u32,
    pub sessions: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_performance_field_names() {
        let perf = AdsPerformance {
            impressions: MetricWithChange::flat(1.0),
            clicks: MetricWithChange::flat(1.0),
            conversions: MetricWithChange::flat(1.0),
            cost: MetricWithChange::flat(1.0),
            click_through_rate: MetricWithChange::flat(1.0),
            conversion_rate: MetricWithChange::flat(1.0),
            cost_per_conversion: MetricWithChange::flat(1.0),
        };
        let json = serde_json::to_value(&perf).unwrap();
        assert!(json.get("clickThroughRate").is_some());
        assert!(json.get("costPerConversion").is_some());
        assert_eq!(json["impressions"]["change"], 0.0);
    }

    #[test]
    fn test_session_hides_provider_token() {
        let session = AuthSession {
            user: User {
                id: "u".into(),
                name: "n".into(),
                email: "e@example.com".into(),
                picture: None,
            },
            provider_token: Some("ya29.secret".into()),
            expires_in: 3600,
        };
        let json = serde_json::to_string(&session).unwrap();
        assert!(!json.contains("ya29.secret"));
        assert!(!json.contains("picture"));
    }
}
