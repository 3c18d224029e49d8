//! Deterministic synthetic payloads
//!
//! Every generator returns the same value on every call and matches the
//! schema of its live counterpart, so the frontend cannot tell them apart
//! structurally.

use crate::core::metrics::round2;
use crate::models::{
    AdGroup, AdsPerformance, AuthSession, Campaign, DashboardSummary, FormPerformance,
    FormPerformanceItem, MetricValue, MetricWithChange, MetricWithTrend, SearchTerm, SiteMetrics,
    TimeSeriesPoint, TrafficSource, TrendDirection, User,
};
use crate::utils::constants::{DEFAULT_PROVIDER_TOKEN_TTL_SECS, USER_ID_PREFIX};

/// Id of the built-in test account
pub const MOCK_USER_ID: &str = "google-oauth2|123456789";

pub struct MockData;

impl MockData {
    pub fn user() -> User {
        debug_assert!(MOCK_USER_ID.starts_with(USER_ID_PREFIX));
        User {
            id: MOCK_USER_ID.to_string(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            picture: Some(
                "https://ui-avatars.com/api/?name=Test+User&background=0D8ABC&color=fff"
                    .to_string(),
            ),
        }
    }

    /// Session used when live auth is unavailable
    pub fn session() -> AuthSession {
        AuthSession {
            user: Self::user(),
            provider_token: None,
            expires_in: DEFAULT_PROVIDER_TOKEN_TTL_SECS,
        }
    }

    pub fn performance() -> AdsPerformance {
        AdsPerformance {
            impressions: MetricWithChange::new(203_626.0, 41.9),
            clicks: MetricWithChange::new(4_581.0, 26.8),
            conversions: MetricWithChange::new(104.0, 26.5),
            cost: MetricWithChange::new(4_488.0, 41.9),
            click_through_rate: MetricWithChange::new(2.25, -16.1),
            conversion_rate: MetricWithChange::new(2.28, 20.1),
            cost_per_conversion: MetricWithChange::new(43.16, 33.0),
        }
    }

    pub fn campaigns() -> Vec<Campaign> {
        CAMPAIGNS
            .iter()
            .map(|c| Campaign {
                id: c.id.to_string(),
                name: c.name.to_string(),
                status: c.status.to_string(),
                impressions: c.impressions,
                clicks: c.clicks,
                conversions: c.conversions,
                cost: c.cost,
                ctr: c.ctr,
                conversion_rate: c.conversion_rate,
                cost_per_conversion: c.cost_per_conversion,
            })
            .collect()
    }

    /// Two ad groups per campaign, splitting the campaign metrics 60/40
    pub fn ad_groups(campaign_id: Option<&str>) -> Vec<AdGroup> {
        Self::campaigns()
            .into_iter()
            .filter(|c| campaign_id.map_or(true, |id| c.id == id))
            .flat_map(|c| {
                [("a", "Core Terms", 0.6), ("b", "Broad Match", 0.4)]
                    .into_iter()
                    .map(move |(suffix, label, share)| AdGroup {
                        id: format!("{}-{}", c.id, suffix),
                        name: format!("{} - {}", c.name, label),
                        campaign_id: c.id.clone(),
                        campaign_name: c.name.clone(),
                        status: c.status.clone(),
                        impressions: (c.impressions * share).round(),
                        clicks: (c.clicks * share).round(),
                        conversions: (c.conversions * share).round(),
                        cost: round2(c.cost * share),
                        ctr: c.ctr,
                        conversion_rate: c.conversion_rate,
                        cost_per_conversion: c.cost_per_conversion,
                    })
            })
            .collect()
    }

    pub fn search_terms(campaign_id: Option<&str>) -> Vec<SearchTerm> {
        SEARCH_TERMS
            .iter()
            .filter(|t| campaign_id.map_or(true, |id| t.campaign_id == id))
            .map(|t| {
                let campaign_name = CAMPAIGNS
                    .iter()
                    .find(|c| c.id == t.campaign_id)
                    .map(|c| c.name)
                    .unwrap_or_default();
                let ctr = if t.impressions > 0.0 {
                    round2(t.clicks / t.impressions * 100.0)
                } else {
                    0.0
                };
                let conversion_rate = if t.clicks > 0.0 {
                    round2(t.conversions / t.clicks * 100.0)
                } else {
                    0.0
                };
                let cost_per_conversion = if t.conversions > 0.0 {
                    round2(t.cost / t.conversions)
                } else {
                    0.0
                };
                SearchTerm {
                    search_term: t.term.to_string(),
                    campaign_id: t.campaign_id.to_string(),
                    campaign_name: campaign_name.to_string(),
                    match_type: t.match_type.to_string(),
                    impressions: t.impressions,
                    clicks: t.clicks,
                    conversions: t.conversions,
                    cost: t.cost,
                    ctr,
                    conversion_rate,
                    cost_per_conversion,
                }
            })
            .collect()
    }

    pub fn dashboard_summary() -> DashboardSummary {
        DashboardSummary {
            visitors: MetricWithTrend {
                total: Some(12_856.0),
                value: None,
                change: 12.3,
                trend: TrendDirection::Up,
            },
            page_views: MetricWithTrend {
                total: Some(42_123.0),
                value: None,
                change: 8.7,
                trend: TrendDirection::Up,
            },
            bounce_rate: MetricWithTrend {
                total: None,
                value: Some(MetricValue::Number(32.4)),
                change: -2.1,
                trend: TrendDirection::Down,
            },
            avg_session: MetricWithTrend {
                total: None,
                value: Some(MetricValue::Text("3m 42s".to_string())),
                change: 0.8,
                trend: TrendDirection::Up,
            },
            traffic_sources: [
                ("Direct", 35.0, "#0070f3"),
                ("Organic Search", 28.0, "#10b981"),
                ("Social Media", 22.0, "#7928ca"),
                ("Referral", 15.0, "#f59e0b"),
            ]
            .into_iter()
            .map(|(source, value, color)| TrafficSource {
                source: source.to_string(),
                value,
                color: color.to_string(),
            })
            .collect(),
        }
    }

    pub fn form_performance() -> FormPerformance {
        FormPerformance {
            patient_forms: FormPerformanceItem {
                total_submissions: 247,
                completion_rate: 68.5,
                avg_time_to_complete: "2m 34s".to_string(),
                change_percentage: -8.5,
            },
            sponsor_forms: FormPerformanceItem {
                total_submissions: 89,
                completion_rate: 72.3,
                avg_time_to_complete: "3m 12s".to_string(),
                change_percentage: -8.2,
            },
        }
    }

    pub fn site_metrics() -> SiteMetrics {
        SiteMetrics {
            conversion_rate: MetricWithChange::new(7.18, 51.6),
            revenue: MetricWithChange::new(34_990.0, -47.8),
            sessions: MetricWithChange::new(59_734.0, 53.2),
            engagement: MetricWithChange::new(31.3, -45.5),
            bounce_rate: MetricWithChange::new(44.9, -27.4),
            avg_order: MetricWithChange::new(99.0, -56.6),
        }
    }

    pub fn performance_over_time() -> Vec<TimeSeriesPoint> {
        [
            ("9 AM", 0, 120),
            ("10 AM", 5, 240),
            ("11 AM", 12, 380),
            ("12 PM", 25, 520),
            ("1 PM", 35, 650),
            ("2 PM", 48, 700),
            ("3 PM", 62, 830),
            ("4 PM", 75, 950),
            ("5 PM", 82, 1050),
            ("6 PM", 90, 1150),
            ("7 PM", 100, 1250),
        ]
        .into_iter()
        .map(|(time, conversions, sessions)| TimeSeriesPoint {
            time: time.to_string(),
            conversions,
            sessions,
        })
        .collect()
    }
}

struct CampaignSeed {
    id: &'static str,
    name: &'static str,
    status: &'static str,
    impressions: f64,
    clicks: f64,
    conversions: f64,
    cost: f64,
    ctr: f64,
    conversion_rate: f64,
    cost_per_conversion: f64,
}

const CAMPAIGNS: [CampaignSeed; 4] = [
    CampaignSeed {
        id: "c1",
        name: "New Patient Acquisition",
        status: "ENABLED",
        impressions: 89_726.0,
        clicks: 1_876.0,
        conversions: 42.0,
        cost: 1_920.45,
        ctr: 2.09,
        conversion_rate: 2.24,
        cost_per_conversion: 45.73,
    },
    CampaignSeed {
        id: "c2",
        name: "Allergy Testing Promo",
        status: "ENABLED",
        impressions: 62_341.0,
        clicks: 1_520.0,
        conversions: 39.0,
        cost: 1_345.20,
        ctr: 2.44,
        conversion_rate: 2.57,
        cost_per_conversion: 34.49,
    },
    CampaignSeed {
        id: "c3",
        name: "Asthma Awareness",
        status: "ENABLED",
        impressions: 42_184.0,
        clicks: 954.0,
        conversions: 18.0,
        cost: 876.30,
        ctr: 2.26,
        conversion_rate: 1.89,
        cost_per_conversion: 48.68,
    },
    CampaignSeed {
        id: "c4",
        name: "Clinical Trials",
        status: "PAUSED",
        impressions: 8_475.0,
        clicks: 231.0,
        conversions: 5.0,
        cost: 346.05,
        ctr: 2.73,
        conversion_rate: 2.16,
        cost_per_conversion: 69.21,
    },
];

struct SearchTermSeed {
    term: &'static str,
    campaign_id: &'static str,
    match_type: &'static str,
    impressions: f64,
    clicks: f64,
    conversions: f64,
    cost: f64,
}

const SEARCH_TERMS: [SearchTermSeed; 6] = [
    SearchTermSeed {
        term: "allergist near me",
        campaign_id: "c1",
        match_type: "PHRASE",
        impressions: 18_420.0,
        clicks: 512.0,
        conversions: 14.0,
        cost: 601.34,
    },
    SearchTermSeed {
        term: "new allergy patient appointment",
        campaign_id: "c1",
        match_type: "EXACT",
        impressions: 6_210.0,
        clicks: 198.0,
        conversions: 7.0,
        cost: 214.80,
    },
    SearchTermSeed {
        term: "allergy skin test cost",
        campaign_id: "c2",
        match_type: "BROAD",
        impressions: 12_904.0,
        clicks: 347.0,
        conversions: 9.0,
        cost: 298.11,
    },
    SearchTermSeed {
        term: "food allergy testing",
        campaign_id: "c2",
        match_type: "PHRASE",
        impressions: 9_877.0,
        clicks: 261.0,
        conversions: 8.0,
        cost: 231.55,
    },
    SearchTermSeed {
        term: "asthma specialist",
        campaign_id: "c3",
        match_type: "EXACT",
        impressions: 7_402.0,
        clicks: 188.0,
        conversions: 4.0,
        cost: 172.09,
    },
    SearchTermSeed {
        term: "allergy clinical trials",
        campaign_id: "c4",
        match_type: "BROAD",
        impressions: 2_315.0,
        clicks: 71.0,
        conversions: 2.0,
        cost: 104.42,
    },
];
