//! Read-side query surface consumed by the HTTP layer
//!
//! Day-window convenience methods resolve "today" once and delegate to
//! `*_as_of` variants that take an explicit end date, which is what the
//! tests exercise.

use crate::aggregator::Aggregator;
use crate::error::CostEngineResult;
use crate::store::{AlertStore, CostRecordStore, RecommendationStore};
use crate::trend::TrendAnalyzer;
use crate::types::{
    format_currency, parse_currency, round2, AlertKind, BudgetAlert, CostRecord, Priority,
    Recommendation, RecommendationCategory, ServiceCost, ServiceShare, TrendDirection,
    TrendReport,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Trend is only attached to summaries covering at least two full weeks
const MIN_TREND_WINDOW_DAYS: u32 = 14;

/// Period summary plus the signed week-over-week trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub account_id: String,
    pub period_days: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_cost: f64,
    pub daily_average: f64,
    /// Signed percentage: negative when spend is decreasing. Zero for
    /// windows under 14 days.
    pub trend_percentage: f64,
    pub service_breakdown: Vec<ServiceShare>,
}

/// Count of alerts sharing one kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindCount {
    pub kind: AlertKind,
    pub count: usize,
}

/// Count of entities sharing one service label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCount {
    pub service: String,
    pub count: usize,
}

/// Count of recommendations sharing one priority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityCount {
    pub priority: Priority,
    pub count: usize,
}

/// Count of recommendations sharing one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: RecommendationCategory,
    pub count: usize,
}

/// Alert statistics for one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub total_alerts: usize,
    /// Alerts generated within the trailing 24 hours
    pub recent_alerts: usize,
    pub alerts_by_kind: Vec<KindCount>,
    pub alerts_by_service: Vec<ServiceCount>,
}

/// Recommendation statistics for one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSummary {
    pub total_recommendations: usize,
    /// Currency-formatted sum of every parseable savings estimate
    pub total_potential_savings: String,
    pub by_priority: Vec<PriorityCount>,
    pub by_service: Vec<ServiceCount>,
    pub by_category: Vec<CategoryCount>,
}

/// Ad-hoc read queries over the engine's store
pub struct CostQueryService<S> {
    store: Arc<S>,
}

impl<S> CostQueryService<S>
where
    S: CostRecordStore + AlertStore + RecommendationStore,
{
    /// Create a query service over a shared store handle
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn aggregator(&self) -> Aggregator<S> {
        Aggregator::new(Arc::clone(&self.store))
    }

    /// Raw cost records for the trailing `days`, descending by date
    pub async fn get_cost_data(
        &self,
        account_id: &str,
        days: u32,
        service: Option<&str>,
    ) -> CostEngineResult<Vec<CostRecord>> {
        self.get_cost_data_as_of(account_id, today(), days, service)
            .await
    }

    pub async fn get_cost_data_as_of(
        &self,
        account_id: &str,
        end_date: NaiveDate,
        days: u32,
        service: Option<&str>,
    ) -> CostEngineResult<Vec<CostRecord>> {
        let start_date = end_date - Duration::days(i64::from(days));
        let mut records = self
            .store
            .query_records(account_id, start_date, end_date, service)
            .await?;
        records.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.service.cmp(&b.service)));
        Ok(records)
    }

    /// Period summary with the signed trend percentage attached
    pub async fn get_cost_summary(
        &self,
        account_id: &str,
        days: u32,
    ) -> CostEngineResult<CostSummary> {
        self.get_cost_summary_as_of(account_id, today(), days).await
    }

    pub async fn get_cost_summary_as_of(
        &self,
        account_id: &str,
        end_date: NaiveDate,
        days: u32,
    ) -> CostEngineResult<CostSummary> {
        let start_date = end_date - Duration::days(i64::from(days));
        let aggregator = self.aggregator();
        let summary = aggregator
            .summarize(account_id, start_date, end_date, None)
            .await?;

        let trend_percentage = if days >= MIN_TREND_WINDOW_DAYS {
            let report = TrendAnalyzer::new(&aggregator)
                .trend(account_id, end_date, days)
                .await?;
            signed_change(&report)
        } else {
            0.0
        };

        Ok(CostSummary {
            account_id: summary.account_id,
            period_days: days,
            start_date,
            end_date,
            total_cost: summary.total_cost,
            daily_average: summary.daily_average,
            trend_percentage,
            service_breakdown: summary.service_breakdown,
        })
    }

    /// Trend classification plus the daily series behind it
    pub async fn get_cost_trends(
        &self,
        account_id: &str,
        days: u32,
    ) -> CostEngineResult<TrendReport> {
        self.get_cost_trends_as_of(account_id, today(), days).await
    }

    pub async fn get_cost_trends_as_of(
        &self,
        account_id: &str,
        end_date: NaiveDate,
        days: u32,
    ) -> CostEngineResult<TrendReport> {
        let aggregator = self.aggregator();
        TrendAnalyzer::new(&aggregator)
            .trend(account_id, end_date, days)
            .await
    }

    /// Per-service breakdown for the trailing `days`
    pub async fn get_service_breakdown(
        &self,
        account_id: &str,
        days: u32,
    ) -> CostEngineResult<Vec<ServiceCost>> {
        self.get_service_breakdown_as_of(account_id, today(), days)
            .await
    }

    pub async fn get_service_breakdown_as_of(
        &self,
        account_id: &str,
        end_date: NaiveDate,
        days: u32,
    ) -> CostEngineResult<Vec<ServiceCost>> {
        let start_date = end_date - Duration::days(i64::from(days));
        self.aggregator()
            .service_breakdown(account_id, start_date, end_date)
            .await
    }

    /// Most recent alerts, newest first
    pub async fn get_budget_alerts(
        &self,
        account_id: &str,
        limit: usize,
        kind: Option<AlertKind>,
    ) -> CostEngineResult<Vec<BudgetAlert>> {
        self.store.recent_alerts(account_id, limit, kind).await
    }

    /// Alert counts by kind and service, plus the trailing-24h count
    pub async fn get_budget_summary(&self, account_id: &str) -> CostEngineResult<BudgetSummary> {
        let alerts = self
            .store
            .recent_alerts(account_id, usize::MAX, None)
            .await?;

        let day_ago = Utc::now() - Duration::hours(24);
        let recent_alerts = alerts.iter().filter(|a| a.generated_at >= day_ago).count();

        let mut by_kind: BTreeMap<String, (AlertKind, usize)> = BTreeMap::new();
        let mut by_service: BTreeMap<String, usize> = BTreeMap::new();
        for alert in &alerts {
            by_kind
                .entry(alert.kind.to_string())
                .or_insert((alert.kind, 0))
                .1 += 1;
            *by_service.entry(alert.service.clone()).or_insert(0) += 1;
        }

        Ok(BudgetSummary {
            total_alerts: alerts.len(),
            recent_alerts,
            alerts_by_kind: by_kind
                .into_values()
                .map(|(kind, count)| KindCount { kind, count })
                .collect(),
            alerts_by_service: sorted_by_count_desc(by_service)
                .into_iter()
                .map(|(service, count)| ServiceCount { service, count })
                .collect(),
        })
    }

    /// Most recent recommendations, newest first
    pub async fn get_recommendations(
        &self,
        account_id: &str,
        limit: usize,
        service: Option<&str>,
        priority: Option<Priority>,
    ) -> CostEngineResult<Vec<Recommendation>> {
        self.store
            .recent_recommendations(account_id, limit, service, priority)
            .await
    }

    /// Recommendation counts plus total parseable savings.
    ///
    /// Savings strings that fail to parse are skipped, never errored.
    pub async fn get_recommendation_summary(
        &self,
        account_id: &str,
    ) -> CostEngineResult<RecommendationSummary> {
        let recommendations = self
            .store
            .recent_recommendations(account_id, usize::MAX, None, None)
            .await?;

        let total_savings: f64 = recommendations
            .iter()
            .filter_map(|rec| parse_currency(&rec.potential_savings))
            .sum();

        let mut by_priority: BTreeMap<Priority, usize> = BTreeMap::new();
        let mut by_service: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_category: BTreeMap<String, (RecommendationCategory, usize)> = BTreeMap::new();
        for rec in &recommendations {
            *by_priority.entry(rec.priority).or_insert(0) += 1;
            *by_service.entry(rec.service.clone()).or_insert(0) += 1;
            by_category
                .entry(rec.category.to_string())
                .or_insert((rec.category, 0))
                .1 += 1;
        }

        let mut by_category: Vec<CategoryCount> = by_category
            .into_values()
            .map(|(category, count)| CategoryCount { category, count })
            .collect();
        by_category.sort_by(|a, b| b.count.cmp(&a.count));

        Ok(RecommendationSummary {
            total_recommendations: recommendations.len(),
            total_potential_savings: format_currency(round2(total_savings)),
            by_priority: by_priority
                .into_iter()
                .map(|(priority, count)| PriorityCount { priority, count })
                .collect(),
            by_service: sorted_by_count_desc(by_service)
                .into_iter()
                .map(|(service, count)| ServiceCount { service, count })
                .collect(),
            by_category,
        })
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Collapse a trend result into one signed display percentage
fn signed_change(report: &TrendReport) -> f64 {
    match report.result.direction {
        TrendDirection::Increasing => report.result.percentage_change,
        TrendDirection::Decreasing => -report.result.percentage_change,
        TrendDirection::InsufficientData => 0.0,
    }
}

/// Sort name/count pairs by count descending with a stable name tie-break
fn sorted_by_count_desc(counts: BTreeMap<String, usize>) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}
