//! Trend analysis: trailing-week vs. preceding-week spend comparison

use crate::aggregator::Aggregator;
use crate::error::CostEngineResult;
use crate::store::CostRecordStore;
use crate::types::{round2, DailyTotal, TrendDirection, TrendReport, TrendResult};
use chrono::{Duration, NaiveDate};

/// Minimum number of daily entries needed to compare windows
const MIN_TREND_DAYS: usize = 7;

/// Compares adjacent weekly windows of the daily cost series.
///
/// Windows are calendar-exact: days without records count as zero-cost days,
/// never as gaps.
pub struct TrendAnalyzer<'a, S: CostRecordStore> {
    aggregator: &'a Aggregator<S>,
}

impl<'a, S: CostRecordStore> TrendAnalyzer<'a, S> {
    /// Create an analyzer over an existing aggregator
    pub fn new(aggregator: &'a Aggregator<S>) -> Self {
        Self { aggregator }
    }

    /// Classify the spend trend over the `window_days` ending at `end_date`.
    ///
    /// The daily series spans `[end_date - window_days, end_date]` inclusive.
    /// Fewer than 7 entries yields `InsufficientData`. The recent window is
    /// the last 7 entries; the previous window is the 7 entries before that,
    /// or every remaining entry when the series is shorter than 14 days.
    ///
    /// Equal window averages report `Decreasing` with a change of 0; there is
    /// deliberately no flat state.
    pub async fn trend(
        &self,
        account_id: &str,
        end_date: NaiveDate,
        window_days: u32,
    ) -> CostEngineResult<TrendReport> {
        let start_date = end_date - Duration::days(i64::from(window_days));
        let daily_costs = self
            .aggregator
            .daily_costs(account_id, start_date, end_date)
            .await?;

        let result = classify(&daily_costs);

        Ok(TrendReport {
            result,
            daily_costs,
            window_days,
        })
    }
}

fn classify(daily_costs: &[DailyTotal]) -> TrendResult {
    if daily_costs.len() < MIN_TREND_DAYS {
        return TrendResult {
            direction: TrendDirection::InsufficientData,
            percentage_change: 0.0,
        };
    }

    let split = daily_costs.len() - MIN_TREND_DAYS;
    let recent_week = &daily_costs[split..];
    let previous_week = if daily_costs.len() >= 2 * MIN_TREND_DAYS {
        &daily_costs[daily_costs.len() - 2 * MIN_TREND_DAYS..split]
    } else {
        &daily_costs[..split]
    };

    let recent_avg = average(recent_week);
    let previous_avg = average(previous_week);

    let direction = if recent_avg > previous_avg {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };
    let percentage_change = if previous_avg > 0.0 {
        round2((recent_avg - previous_avg).abs() / previous_avg * 100.0)
    } else {
        0.0
    };

    TrendResult {
        direction,
        percentage_change,
    }
}

fn average(window: &[DailyTotal]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    window.iter().map(|d| d.total_cost).sum::<f64>() / window.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CostRecordStore, MemoryStore};
    use crate::types::CostRecord;
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Seed one record per day, ending at `end`, oldest cost first
    async fn create_test_aggregator(end: NaiveDate, costs: &[f64]) -> Aggregator<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let records: Vec<CostRecord> = costs
            .iter()
            .rev()
            .enumerate()
            .map(|(offset, cost)| CostRecord {
                account_id: "123456789012".to_string(),
                date: end - Duration::days(offset as i64),
                service: "EC2".to_string(),
                cost: *cost,
            })
            .collect();
        store.upsert_records(&records).await.unwrap();
        Aggregator::new(store)
    }

    #[tokio::test]
    async fn test_insufficient_data_below_seven_days() {
        let end = date(2026, 3, 20);
        let aggregator = create_test_aggregator(end, &[500.0, 500.0, 500.0]).await;
        let analyzer = TrendAnalyzer::new(&aggregator);

        // 5-day window: 6 calendar entries, below the 7-entry minimum
        let report = analyzer.trend("123456789012", end, 5).await.unwrap();

        assert_eq!(report.result.direction, TrendDirection::InsufficientData);
        assert_eq!(report.result.percentage_change, 0.0);
        assert_eq!(report.daily_costs.len(), 6);
    }

    #[tokio::test]
    async fn test_flat_costs_tie_break_to_decreasing() {
        let end = date(2026, 3, 20);
        let aggregator = create_test_aggregator(end, &[10.0; 14]).await;
        let analyzer = TrendAnalyzer::new(&aggregator);

        let report = analyzer.trend("123456789012", end, 13).await.unwrap();

        assert_eq!(report.result.direction, TrendDirection::Decreasing);
        assert_eq!(report.result.percentage_change, 0.0);
    }

    #[tokio::test]
    async fn test_increasing_trend_with_percentage() {
        let end = date(2026, 3, 20);
        let mut costs = vec![10.0; 7];
        costs.extend(vec![20.0; 7]);
        let aggregator = create_test_aggregator(end, &costs).await;
        let analyzer = TrendAnalyzer::new(&aggregator);

        let report = analyzer.trend("123456789012", end, 13).await.unwrap();

        assert_eq!(report.result.direction, TrendDirection::Increasing);
        assert_eq!(report.result.percentage_change, 100.0);
    }

    #[tokio::test]
    async fn test_zero_previous_average_reports_zero_change() {
        let end = date(2026, 3, 20);
        let mut costs = vec![0.0; 7];
        costs.extend(vec![15.0; 7]);
        let aggregator = create_test_aggregator(end, &costs).await;
        let analyzer = TrendAnalyzer::new(&aggregator);

        let report = analyzer.trend("123456789012", end, 13).await.unwrap();

        assert_eq!(report.result.direction, TrendDirection::Increasing);
        assert_eq!(report.result.percentage_change, 0.0);
    }

    #[tokio::test]
    async fn test_short_previous_window_fallback() {
        // 10 calendar entries: previous window is only the first 3
        let end = date(2026, 3, 20);
        let mut costs = vec![30.0; 3];
        costs.extend(vec![10.0; 7]);
        let aggregator = create_test_aggregator(end, &costs).await;
        let analyzer = TrendAnalyzer::new(&aggregator);

        let report = analyzer.trend("123456789012", end, 9).await.unwrap();

        assert_eq!(report.daily_costs.len(), 10);
        assert_eq!(report.result.direction, TrendDirection::Decreasing);
        // |10 - 30| / 30 * 100
        assert_eq!(report.result.percentage_change, 66.67);
    }

    #[tokio::test]
    async fn test_missing_days_count_as_zero() {
        // Records only on the final day; the rest of the window is zero-filled
        let end = date(2026, 3, 20);
        let store = Arc::new(MemoryStore::new());
        store
            .upsert_records(&[CostRecord {
                account_id: "123456789012".to_string(),
                date: end,
                service: "EC2".to_string(),
                cost: 70.0,
            }])
            .await
            .unwrap();
        let aggregator = Aggregator::new(store);
        let analyzer = TrendAnalyzer::new(&aggregator);

        let report = analyzer.trend("123456789012", end, 13).await.unwrap();

        assert_eq!(report.daily_costs.len(), 14);
        assert_eq!(report.result.direction, TrendDirection::Increasing);
        // Previous week averages 0, so the change is pinned to 0
        assert_eq!(report.result.percentage_change, 0.0);
    }
}
