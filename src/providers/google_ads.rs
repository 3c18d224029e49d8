//! Google Ads REST client
//!
//! Runs GAQL through `customers/{id}/googleAds:search`, following
//! `nextPageToken` until the report is complete.
//!
//! Auth: a long-lived refresh token (from the env) is traded for a short-lived
//! access token at Google's token endpoint. The access token is cached and
//! refreshed shortly before it expires.
//!
//! Wire quirks:
//! - int64 metrics (impressions, clicks, costMicros, ids) arrive as JSON strings
//! - rate metrics (ctr, conversionsFromInteractionsRate) are fractions
//! - costPerConversion is in micros

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::core::metrics::{
    ad_groups_query, build_performance, campaigns_query, connection_test_query,
    performance_query, search_terms_query, DateRange, MetricsRow, PerformanceTotals,
};
use crate::models::{
    AdGroup, AdsPerformance, AppError, AppResult, Campaign, Config, ErrorCode, SearchTerm,
    SecretKey,
};
use crate::providers::google_oauth::OAuthClientCredentials;
use crate::utils::constants::{
    DEFAULT_PROVIDER_TOKEN_TTL_SECS, GOOGLE_ADS_BASE_URL, GOOGLE_TOKEN_URL, HTTP_TIMEOUT_SECS,
    TOKEN_REFRESH_SKEW_SECS,
};

// ============================================
// Trait
// ============================================

/// Result of a connectivity probe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionInfo {
    pub customer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptive_name: Option<String>,
}

#[async_trait]
pub trait AdsProvider: Send + Sync {
    /// Account totals for `range`, compared with `previous` when given
    async fn performance(
        &self,
        range: &DateRange,
        previous: Option<&DateRange>,
    ) -> AppResult<AdsPerformance>;

    async fn campaigns(&self) -> AppResult<Vec<Campaign>>;

    async fn ad_groups(&self, campaign_id: Option<&str>) -> AppResult<Vec<AdGroup>>;

    async fn search_terms(&self, campaign_id: Option<&str>) -> AppResult<Vec<SearchTerm>>;

    async fn test_connection(&self) -> AppResult<ConnectionInfo>;
}

// ============================================
// Wire types
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    results: Vec<GoogleAdsRow>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleAdsRow {
    #[serde(default)]
    customer: Option<Resource>,
    #[serde(default)]
    campaign: Option<Resource>,
    #[serde(default)]
    ad_group: Option<Resource>,
    #[serde(default)]
    search_term_view: Option<SearchTermView>,
    #[serde(default)]
    ad_group_criterion: Option<AdGroupCriterion>,
    #[serde(default)]
    metrics: WireMetrics,
}

/// customer / campaign / ad_group share the fields we read
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Resource {
    #[serde(default, deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    descriptive_name: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchTermView {
    #[serde(default)]
    search_term: String,
}

#[derive(Debug, Default, Deserialize)]
struct AdGroupCriterion {
    #[serde(default)]
    keyword: Option<Keyword>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Keyword {
    #[serde(default)]
    match_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMetrics {
    #[serde(default, deserialize_with = "u64_from_string")]
    impressions: u64,
    #[serde(default, deserialize_with = "u64_from_string")]
    clicks: u64,
    #[serde(default)]
    conversions: f64,
    #[serde(default, deserialize_with = "u64_from_string")]
    cost_micros: u64,
    #[serde(default)]
    ctr: f64,
    #[serde(default)]
    conversions_from_interactions_rate: f64,
    #[serde(default)]
    cost_per_conversion: f64,
}

impl From<&WireMetrics> for MetricsRow {
    fn from(m: &WireMetrics) -> Self {
        MetricsRow {
            impressions: m.impressions,
            clicks: m.clicks,
            conversions: m.conversions,
            cost_micros: m.cost_micros,
            ctr: m.ctr,
            conversion_rate: m.conversions_from_interactions_rate,
            cost_per_conversion_micros: m.cost_per_conversion,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Str(String),
    Num(u64),
}

fn u64_from_string<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    match StringOrNumber::deserialize(d)? {
        StringOrNumber::Num(n) => Ok(n),
        StringOrNumber::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match StringOrNumber::deserialize(d)? {
        StringOrNumber::Num(n) => n.to_string(),
        StringOrNumber::Str(s) => s,
    })
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + Duration::from_secs(TOKEN_REFRESH_SKEW_SECS) < self.expires_at
    }
}

/// Map a non-2xx Ads API response onto the error taxonomy
fn classify_error(status: StatusCode, body: &str) -> AppError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = parsed
        .as_ref()
        .map(|e| e.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("Google Ads API returned HTTP {}", status.as_u16()));
    let exhausted = parsed
        .as_ref()
        .and_then(|e| e.error.status.as_deref())
        .map_or(false, |s| s == "RESOURCE_EXHAUSTED");

    match status {
        StatusCode::TOO_MANY_REQUESTS => AppError::quota_exceeded(message),
        _ if exhausted => AppError::quota_exceeded(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::ads_credentials(message),
        _ => AppError::ads_api(message),
    }
}

// ============================================
// Client
// ============================================

pub struct GoogleAdsClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    api_version: String,
    customer_id: String,
    login_customer_id: Option<String>,
    developer_token: Option<SecretKey>,
    refresh_token: Option<SecretKey>,
    oauth: Option<OAuthClientCredentials>,
    token: RwLock<Option<CachedToken>>,
}

impl GoogleAdsClient {
    pub fn new(config: &Config, oauth: Option<OAuthClientCredentials>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .gzip(true)
            .build()?;

        Ok(Self {
            http,
            base_url: GOOGLE_ADS_BASE_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            api_version: config.google.api_version.clone(),
            customer_id: config.client_customer_id.clone(),
            login_customer_id: config.google.login_customer_id.clone(),
            developer_token: config.google.developer_token.clone(),
            refresh_token: config.google.refresh_token.clone(),
            oauth,
            token: RwLock::new(None),
        })
    }

    /// Whether every credential needed for a live call is present
    pub fn is_configured(&self) -> bool {
        self.developer_token.is_some() && self.refresh_token.is_some() && self.oauth.is_some()
    }

    fn search_url(&self) -> String {
        format!(
            "{}/{}/customers/{}/googleAds:search",
            self.base_url, self.api_version, self.customer_id
        )
    }

    async fn access_token(&self) -> AppResult<String> {
        if let Some(cached) = self.token.read().await.as_ref() {
            if cached.is_fresh() {
                return Ok(cached.value.clone());
            }
        }

        let mut guard = self.token.write().await;
        // Another request may have refreshed while we waited
        if let Some(cached) = guard.as_ref() {
            if cached.is_fresh() {
                return Ok(cached.value.clone());
            }
        }

        let fresh = self.refresh_access_token().await?;
        let value = fresh.value.clone();
        *guard = Some(fresh);
        Ok(value)
    }

    async fn refresh_access_token(&self) -> AppResult<CachedToken> {
        let refresh_token = self
            .refresh_token
            .as_ref()
            .ok_or_else(|| AppError::ads_credentials("GOOGLE_ADS_REFRESH_TOKEN is not set"))?;
        let oauth = self
            .oauth
            .as_ref()
            .ok_or_else(|| AppError::ads_credentials("Google OAuth client is not configured"))?;

        debug!("Refreshing Google Ads access token");
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", oauth.client_id.as_str()),
                ("client_secret", oauth.client_secret.expose()),
                ("refresh_token", refresh_token.expose()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Refresh token grant rejected");
            return Err(AppError::ads_credentials(format!(
                "Refresh token grant failed with HTTP {}",
                status.as_u16()
            )));
        }

        let token: RefreshResponse = response.json().await?;
        let ttl = token.expires_in.unwrap_or(DEFAULT_PROVIDER_TOKEN_TTL_SECS);
        info!(expires_in = ttl, "Google Ads access token refreshed");
        Ok(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(ttl),
        })
    }

    /// Run a GAQL query and collect every page
    async fn search(&self, query: &str) -> AppResult<Vec<GoogleAdsRow>> {
        let developer_token = self
            .developer_token
            .as_ref()
            .ok_or_else(|| AppError::ads_credentials("GOOGLE_ADS_DEVELOPER_TOKEN is not set"))?;
        let access_token = self.access_token().await?;
        let url = self.search_url();

        let mut rows = Vec::new();
        let mut page_token: Option<String> = None;
        let started = Instant::now();

        loop {
            let mut request = self
                .http
                .post(&url)
                .bearer_auth(&access_token)
                .header("developer-token", developer_token.expose())
                .json(&SearchRequest {
                    query,
                    page_token: page_token.as_deref(),
                });
            if let Some(login_id) = &self.login_customer_id {
                request = request.header("login-customer-id", login_id);
            }

            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let err = classify_error(status, &body);
                warn!(status = status.as_u16(), code = err.code_str(), "Google Ads search failed");
                return Err(err);
            }

            let page: SearchResponse = response.json().await?;
            rows.extend(page.results);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(
            rows = rows.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "Google Ads search complete"
        );
        Ok(rows)
    }

    async fn totals(&self, range: &DateRange) -> AppResult<PerformanceTotals> {
        let rows = self.search(&performance_query(range)).await?;
        let metrics: Vec<MetricsRow> = rows.iter().map(|r| MetricsRow::from(&r.metrics)).collect();
        Ok(PerformanceTotals::from_rows(&metrics))
    }
}

#[async_trait]
impl AdsProvider for GoogleAdsClient {
    async fn performance(
        &self,
        range: &DateRange,
        previous: Option<&DateRange>,
    ) -> AppResult<AdsPerformance> {
        let current = self.totals(range).await?;
        let prior = match previous {
            Some(prev) => Some(self.totals(prev).await?),
            None => None,
        };
        Ok(build_performance(&current, prior.as_ref()))
    }

    async fn campaigns(&self) -> AppResult<Vec<Campaign>> {
        let rows = self.search(&campaigns_query()).await?;
        Ok(rows.iter().map(campaign_from_row).collect())
    }

    async fn ad_groups(&self, campaign_id: Option<&str>) -> AppResult<Vec<AdGroup>> {
        let rows = self.search(&ad_groups_query(campaign_id)?).await?;
        Ok(rows.iter().map(ad_group_from_row).collect())
    }

    async fn search_terms(&self, campaign_id: Option<&str>) -> AppResult<Vec<SearchTerm>> {
        let rows = self.search(&search_terms_query(campaign_id)?).await?;
        Ok(rows.iter().map(search_term_from_row).collect())
    }

    async fn test_connection(&self) -> AppResult<ConnectionInfo> {
        let rows = self.search(&connection_test_query()).await?;
        let customer = rows.into_iter().next().and_then(|r| r.customer).ok_or_else(|| {
            AppError::new(ErrorCode::AdsInvalidResponse, "No customer row returned")
        })?;
        Ok(ConnectionInfo {
            customer_id: if customer.id.is_empty() {
                self.customer_id.clone()
            } else {
                customer.id
            },
            descriptive_name: customer.descriptive_name,
        })
    }
}

// ============================================
// Row mapping
// ============================================

fn campaign_from_row(row: &GoogleAdsRow) -> Campaign {
    let campaign = row.campaign.as_ref();
    let m = MetricsRow::from(&row.metrics);
    Campaign {
        id: campaign.map(|c| c.id.clone()).unwrap_or_default(),
        name: campaign.and_then(|c| c.name.clone()).unwrap_or_default(),
        status: campaign.and_then(|c| c.status.clone()).unwrap_or_default(),
        impressions: m.impressions as f64,
        clicks: m.clicks as f64,
        conversions: m.conversions,
        cost: m.cost(),
        ctr: m.ctr_percent(),
        conversion_rate: m.conversion_rate_percent(),
        cost_per_conversion: m.cost_per_conversion(),
    }
}

fn ad_group_from_row(row: &GoogleAdsRow) -> AdGroup {
    let group = row.ad_group.as_ref();
    let campaign = row.campaign.as_ref();
    let m = MetricsRow::from(&row.metrics);
    AdGroup {
        id: group.map(|g| g.id.clone()).unwrap_or_default(),
        name: group.and_then(|g| g.name.clone()).unwrap_or_default(),
        campaign_id: campaign.map(|c| c.id.clone()).unwrap_or_default(),
        campaign_name: campaign.and_then(|c| c.name.clone()).unwrap_or_default(),
        status: group.and_then(|g| g.status.clone()).unwrap_or_default(),
        impressions: m.impressions as f64,
        clicks: m.clicks as f64,
        conversions: m.conversions,
        cost: m.cost(),
        ctr: m.ctr_percent(),
        conversion_rate: m.conversion_rate_percent(),
        cost_per_conversion: m.cost_per_conversion(),
    }
}

fn search_term_from_row(row: &GoogleAdsRow) -> SearchTerm {
    let campaign = row.campaign.as_ref();
    let m = MetricsRow::from(&row.metrics);
    SearchTerm {
        search_term: row
            .search_term_view
            .as_ref()
            .map(|v| v.search_term.clone())
            .unwrap_or_default(),
        campaign_id: campaign.map(|c| c.id.clone()).unwrap_or_default(),
        campaign_name: campaign.and_then(|c| c.name.clone()).unwrap_or_default(),
        match_type: row
            .ad_group_criterion
            .as_ref()
            .and_then(|c| c.keyword.as_ref())
            .and_then(|k| k.match_type.clone())
            .unwrap_or_else(|| "UNSPECIFIED".to_string()),
        impressions: m.impressions as f64,
        clicks: m.clicks as f64,
        conversions: m.conversions,
        cost: m.cost(),
        ctr: m.ctr_percent(),
        conversion_rate: m.conversion_rate_percent(),
        cost_per_conversion: m.cost_per_conversion(),
    }
}
