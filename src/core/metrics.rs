//! Ads metrics aggregation
//!
//! Date windows, period-over-period comparison and the GAQL queries behind
//! the Google Ads endpoints. Everything here is pure so it can be tested
//! without a network.

use chrono::{Duration, NaiveDate};

use crate::models::{AdsPerformance, AppError, AppResult, MetricWithChange};
use crate::utils::constants::{DEFAULT_LOOKBACK_DAYS, MICROS_PER_UNIT, SEARCH_TERM_LIMIT};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================
// Date windows
// ============================================

/// Inclusive date window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if start > end {
            return Err(AppError::bad_request(format!(
                "start_date {} is after end_date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Build from optional `YYYY-MM-DD` query values.
    ///
    /// Missing end defaults to yesterday, missing start to 30 days ago.
    pub fn resolve(start: Option<&str>, end: Option<&str>, today: NaiveDate) -> AppResult<Self> {
        let end = match end.filter(|s| !s.is_empty()) {
            Some(raw) => parse_date("end_date", raw)?,
            None => today - Duration::days(1),
        };
        let start = match start.filter(|s| !s.is_empty()) {
            Some(raw) => parse_date("start_date", raw)?,
            None => today - Duration::days(DEFAULT_LOOKBACK_DAYS),
        };
        Self::new(start, end)
    }

    /// Number of days covered, both ends included
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Window of equal length ending the day before `start`
    pub fn previous_period(&self) -> Self {
        let end = self.start - Duration::days(1);
        let start = end - Duration::days(self.days() - 1);
        Self { start, end }
    }

    /// GAQL condition on `segments.date`
    pub fn gaql_condition(&self) -> String {
        format!(
            "segments.date BETWEEN '{}' AND '{}'",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

fn parse_date(field: &str, raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
        AppError::bad_request(format!("{} must be YYYY-MM-DD, got '{}'", field, raw))
    })
}

// ============================================
// Row metrics
// ============================================

/// Metrics of one report row, as returned by the Ads API.
///
/// Money is in micros; `ctr` and `conversion_rate` are fractions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsRow {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: f64,
    pub cost_micros: u64,
    pub ctr: f64,
    pub conversion_rate: f64,
    pub cost_per_conversion_micros: f64,
}

impl MetricsRow {
    pub fn cost(&self) -> f64 {
        round2(self.cost_micros as f64 / MICROS_PER_UNIT)
    }

    pub fn ctr_percent(&self) -> f64 {
        round2(self.ctr * 100.0)
    }

    pub fn conversion_rate_percent(&self) -> f64 {
        round2(self.conversion_rate * 100.0)
    }

    pub fn cost_per_conversion(&self) -> f64 {
        round2(self.cost_per_conversion_micros / MICROS_PER_UNIT)
    }
}

// ============================================
// Period totals
// ============================================

/// Summed metrics for a window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerformanceTotals {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: f64,
    pub cost_micros: u64,
}

impl PerformanceTotals {
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a MetricsRow>,
    {
        rows.into_iter().fold(Self::default(), |mut acc, row| {
            acc.impressions += row.impressions;
            acc.clicks += row.clicks;
            acc.conversions += row.conversions;
            acc.cost_micros += row.cost_micros;
            acc
        })
    }

    pub fn cost(&self) -> f64 {
        self.cost_micros as f64 / MICROS_PER_UNIT
    }

    pub fn ctr(&self) -> f64 {
        ratio(self.clicks as f64, self.impressions as f64) * 100.0
    }

    pub fn conversion_rate(&self) -> f64 {
        ratio(self.conversions, self.clicks as f64) * 100.0
    }

    pub fn cost_per_conversion(&self) -> f64 {
        ratio(self.cost(), self.conversions)
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Percent change from `previous` to `current`; 0 when there is no baseline
pub fn percentage_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    round2((current - previous) / previous * 100.0)
}

/// Shape totals into the performance payload
pub fn build_performance(
    current: &PerformanceTotals,
    previous: Option<&PerformanceTotals>,
) -> AdsPerformance {
    let metric = |value: f64, prev: Option<f64>| match prev {
        Some(p) => MetricWithChange::new(value, percentage_change(value, p)),
        None => MetricWithChange::flat(value),
    };

    AdsPerformance {
        impressions: metric(
            current.impressions as f64,
            previous.map(|p| p.impressions as f64),
        ),
        clicks: metric(current.clicks as f64, previous.map(|p| p.clicks as f64)),
        conversions: metric(current.conversions.round(), previous.map(|p| p.conversions.round())),
        cost: metric(round2(current.cost()), previous.map(|p| round2(p.cost()))),
        click_through_rate: metric(round2(current.ctr()), previous.map(|p| round2(p.ctr()))),
        conversion_rate: metric(
            round2(current.conversion_rate()),
            previous.map(|p| round2(p.conversion_rate())),
        ),
        cost_per_conversion: metric(
            round2(current.cost_per_conversion()),
            previous.map(|p| round2(p.cost_per_conversion())),
        ),
    }
}

// ============================================
// GAQL
// ============================================

/// Campaign ids are spliced into GAQL, so only digits are accepted
pub fn validate_campaign_id(id: &str) -> AppResult<()> {
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AppError::bad_request(format!(
            "campaign_id must be numeric, got '{}'",
            id
        )))
    }
}

pub fn performance_query(range: &DateRange) -> String {
    format!(
        "SELECT metrics.impressions, metrics.clicks, metrics.conversions, \
         metrics.cost_micros, metrics.ctr, metrics.conversions_from_interactions_rate, \
         metrics.cost_per_conversion \
         FROM campaign WHERE {}",
        range.gaql_condition()
    )
}

pub fn campaigns_query() -> String {
    "SELECT campaign.id, campaign.name, campaign.status, metrics.impressions, \
     metrics.clicks, metrics.conversions, metrics.cost_micros, metrics.ctr, \
     metrics.conversions_from_interactions_rate, metrics.cost_per_conversion \
     FROM campaign WHERE campaign.status != 'REMOVED' \
     ORDER BY metrics.impressions DESC"
        .to_string()
}

pub fn ad_groups_query(campaign_id: Option<&str>) -> AppResult<String> {
    let mut query = String::from(
        "SELECT ad_group.id, ad_group.name, campaign.id, campaign.name, ad_group.status, \
         metrics.impressions, metrics.clicks, metrics.conversions, metrics.cost_micros, \
         metrics.ctr, metrics.conversions_from_interactions_rate, metrics.cost_per_conversion \
         FROM ad_group WHERE ad_group.status != 'REMOVED'",
    );
    if let Some(id) = campaign_id {
        validate_campaign_id(id)?;
        query.push_str(&format!(" AND campaign.id = {}", id));
    }
    query.push_str(" ORDER BY metrics.impressions DESC");
    Ok(query)
}

pub fn search_terms_query(campaign_id: Option<&str>) -> AppResult<String> {
    let mut query = String::from(
        "SELECT search_term_view.search_term, campaign.id, campaign.name, \
         ad_group_criterion.keyword.match_type, metrics.impressions, metrics.clicks, \
         metrics.conversions, metrics.cost_micros, metrics.ctr, \
         metrics.conversions_from_interactions_rate, metrics.cost_per_conversion \
         FROM search_term_view",
    );
    if let Some(id) = campaign_id {
        validate_campaign_id(id)?;
        query.push_str(&format!(" WHERE campaign.id = {}", id));
    }
    query.push_str(&format!(
        " ORDER BY metrics.impressions DESC LIMIT {}",
        SEARCH_TERM_LIMIT
    ));
    Ok(query)
}

/// Cheapest query that proves credentials and account access
pub fn connection_test_query() -> String {
    "SELECT customer.id, customer.descriptive_name FROM customer LIMIT 1".to_string()
}
