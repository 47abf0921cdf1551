//! Cost aggregation: daily totals, service breakdowns, and period summaries

use crate::error::{CostEngineError, CostEngineResult};
use crate::store::CostRecordStore;
use crate::types::{round2, CostRecord, DailyTotal, PeriodSummary, ServiceCost, ServiceShare};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Read-only aggregation over the raw record store.
///
/// All totals are computed from unrounded sums; rounding to 2 decimal places
/// happens once, on the values handed out for display.
pub struct Aggregator<S: CostRecordStore> {
    store: Arc<S>,
}

impl<S: CostRecordStore> Aggregator<S> {
    /// Create an aggregator over a shared store handle
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Summarize one account's spend over an inclusive date range.
    ///
    /// `daily_average` divides by the number of calendar days in the range,
    /// so days without records implicitly cost 0.
    pub async fn summarize(
        &self,
        account_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        service_filter: Option<&str>,
    ) -> CostEngineResult<PeriodSummary> {
        validate_range(start_date, end_date)?;

        let records = self
            .store
            .query_records(account_id, start_date, end_date, service_filter)
            .await?;

        let totals = service_totals_from(&records);
        let total_cost: f64 = totals.values().sum();
        let day_count = (end_date - start_date).num_days() + 1;

        let mut breakdown: Vec<ServiceShare> = totals
            .iter()
            .map(|(service, cost)| ServiceShare {
                service: service.clone(),
                total_cost: round2(*cost),
                percentage_of_total: percentage_of(*cost, total_cost),
            })
            .collect();
        sort_by_cost_desc(&mut breakdown, |share| (share.total_cost, &share.service));

        Ok(PeriodSummary {
            account_id: account_id.to_string(),
            start_date,
            end_date,
            total_cost: round2(total_cost),
            daily_average: round2(total_cost / day_count as f64),
            service_breakdown: breakdown,
        })
    }

    /// Daily totals for an inclusive date range, ascending by date.
    ///
    /// Every calendar day in the range appears exactly once; days without
    /// records carry a zero total.
    pub async fn daily_costs(
        &self,
        account_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> CostEngineResult<Vec<DailyTotal>> {
        validate_range(start_date, end_date)?;

        let records = self
            .store
            .query_records(account_id, start_date, end_date, None)
            .await?;

        let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        let mut day = start_date;
        while day <= end_date {
            by_day.insert(day, 0.0);
            day += Duration::days(1);
        }
        for record in &records {
            if let Some(total) = by_day.get_mut(&record.date) {
                *total += record.cost;
            }
        }

        Ok(by_day
            .into_iter()
            .map(|(date, total)| DailyTotal {
                account_id: account_id.to_string(),
                date,
                total_cost: round2(total),
            })
            .collect())
    }

    /// Per-service cost breakdown, descending by total cost
    pub async fn service_breakdown(
        &self,
        account_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> CostEngineResult<Vec<ServiceCost>> {
        validate_range(start_date, end_date)?;

        let records = self
            .store
            .query_records(account_id, start_date, end_date, None)
            .await?;

        let mut stats: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        for record in &records {
            let entry = stats.entry(record.service.clone()).or_insert((0.0, 0));
            entry.0 += record.cost;
            entry.1 += 1;
        }
        let total_cost: f64 = stats.values().map(|(cost, _)| cost).sum();

        let mut breakdown: Vec<ServiceCost> = stats
            .into_iter()
            .map(|(service, (cost, count))| ServiceCost {
                service,
                total_cost: round2(cost),
                average_cost: if count > 0 {
                    round2(cost / count as f64)
                } else {
                    0.0
                },
                record_count: count,
                percentage_of_total: percentage_of(cost, total_cost),
            })
            .collect();
        sort_by_cost_desc(&mut breakdown, |entry| (entry.total_cost, &entry.service));

        Ok(breakdown)
    }

    /// Unrounded per-service totals for one account and range.
    ///
    /// The budget evaluator and recommendation engine consume these directly
    /// so that threshold comparisons never see compounded rounding error.
    pub async fn service_totals(
        &self,
        account_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> CostEngineResult<BTreeMap<String, f64>> {
        validate_range(start_date, end_date)?;

        let records = self
            .store
            .query_records(account_id, start_date, end_date, None)
            .await?;
        Ok(service_totals_from(&records))
    }
}

fn validate_range(start_date: NaiveDate, end_date: NaiveDate) -> CostEngineResult<()> {
    if start_date > end_date {
        return Err(CostEngineError::InvalidRange {
            start: start_date.to_string(),
            end: end_date.to_string(),
        });
    }
    Ok(())
}

fn service_totals_from(records: &[CostRecord]) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for record in records {
        *totals.entry(record.service.clone()).or_insert(0.0) += record.cost;
    }
    totals
}

fn percentage_of(cost: f64, total: f64) -> f64 {
    if total > 0.0 {
        round2(cost / total * 100.0)
    } else {
        0.0
    }
}

/// Sort descending by cost with a stable name tie-break
fn sort_by_cost_desc<T, F>(entries: &mut [T], key: F)
where
    F: Fn(&T) -> (f64, &String),
{
    entries.sort_by(|a, b| {
        let (cost_a, name_a) = key(a);
        let (cost_b, name_b) = key(b);
        cost_b
            .partial_cmp(&cost_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| name_a.cmp(name_b))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(day: u32, service: &str, cost: f64) -> CostRecord {
        CostRecord {
            account_id: "123456789012".to_string(),
            date: date(2026, 3, day),
            service: service.to_string(),
            cost,
        }
    }

    async fn create_test_aggregator(records: &[CostRecord]) -> Aggregator<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.upsert_records(records).await.unwrap();
        Aggregator::new(store)
    }

    #[tokio::test]
    async fn test_summarize_totals_and_daily_average() {
        let aggregator = create_test_aggregator(&[
            record(1, "EC2", 10.0),
            record(2, "EC2", 20.0),
            record(2, "RDS", 5.0),
        ])
        .await;

        // 5-day window, 2 days with records
        let summary = aggregator
            .summarize("123456789012", date(2026, 3, 1), date(2026, 3, 5), None)
            .await
            .unwrap();

        assert_eq!(summary.total_cost, 35.0);
        assert_eq!(summary.daily_average, 7.0);
        assert_eq!(summary.service_breakdown.len(), 2);
        assert_eq!(summary.service_breakdown[0].service, "EC2");
        assert_eq!(summary.service_breakdown[0].total_cost, 30.0);
        assert_eq!(summary.service_breakdown[0].percentage_of_total, 85.71);
        assert_eq!(summary.service_breakdown[1].service, "RDS");
    }

    #[tokio::test]
    async fn test_breakdown_sum_matches_total() {
        let aggregator = create_test_aggregator(&[
            record(1, "EC2", 33.333),
            record(1, "RDS", 33.333),
            record(1, "S3", 33.334),
        ])
        .await;

        let summary = aggregator
            .summarize("123456789012", date(2026, 3, 1), date(2026, 3, 1), None)
            .await
            .unwrap();

        let breakdown_sum: f64 = summary
            .service_breakdown
            .iter()
            .map(|s| s.total_cost)
            .sum();
        assert!((breakdown_sum - summary.total_cost).abs() <= 0.01);

        let pct_sum: f64 = summary
            .service_breakdown
            .iter()
            .map(|s| s.percentage_of_total)
            .sum();
        assert!((pct_sum - 100.0).abs() <= 0.1);
    }

    #[tokio::test]
    async fn test_summarize_empty_range_is_all_zero() {
        let aggregator = create_test_aggregator(&[]).await;

        let summary = aggregator
            .summarize("123456789012", date(2026, 3, 1), date(2026, 3, 31), None)
            .await
            .unwrap();

        assert_eq!(summary.total_cost, 0.0);
        assert_eq!(summary.daily_average, 0.0);
        assert!(summary.service_breakdown.is_empty());
    }

    #[tokio::test]
    async fn test_zero_total_percentages_are_zero() {
        let aggregator =
            create_test_aggregator(&[record(1, "EC2", 0.0), record(1, "RDS", 0.0)]).await;

        let summary = aggregator
            .summarize("123456789012", date(2026, 3, 1), date(2026, 3, 1), None)
            .await
            .unwrap();

        assert_eq!(summary.total_cost, 0.0);
        for share in &summary.service_breakdown {
            assert_eq!(share.percentage_of_total, 0.0);
        }
    }

    #[tokio::test]
    async fn test_invalid_range_rejected() {
        let aggregator = create_test_aggregator(&[]).await;

        let result = aggregator
            .summarize("123456789012", date(2026, 3, 10), date(2026, 3, 1), None)
            .await;

        assert!(matches!(
            result,
            Err(CostEngineError::InvalidRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_service_filter_yields_empty() {
        let aggregator = create_test_aggregator(&[record(1, "EC2", 10.0)]).await;

        let summary = aggregator
            .summarize(
                "123456789012",
                date(2026, 3, 1),
                date(2026, 3, 5),
                Some("Lambda"),
            )
            .await
            .unwrap();

        assert_eq!(summary.total_cost, 0.0);
        assert!(summary.service_breakdown.is_empty());
    }

    #[tokio::test]
    async fn test_daily_costs_fills_missing_days() {
        let aggregator = create_test_aggregator(&[
            record(1, "EC2", 10.0),
            record(1, "RDS", 2.5),
            record(3, "EC2", 7.0),
        ])
        .await;

        let daily = aggregator
            .daily_costs("123456789012", date(2026, 3, 1), date(2026, 3, 4))
            .await
            .unwrap();

        assert_eq!(daily.len(), 4);
        assert_eq!(daily[0].total_cost, 12.5);
        assert_eq!(daily[1].total_cost, 0.0);
        assert_eq!(daily[2].total_cost, 7.0);
        assert_eq!(daily[3].total_cost, 0.0);
        assert!(daily.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[tokio::test]
    async fn test_service_breakdown_ordering_and_stats() {
        let aggregator = create_test_aggregator(&[
            record(1, "S3", 2.0),
            record(2, "S3", 4.0),
            record(1, "EC2", 30.0),
            record(1, "RDS", 6.0),
        ])
        .await;

        let breakdown = aggregator
            .service_breakdown("123456789012", date(2026, 3, 1), date(2026, 3, 2))
            .await
            .unwrap();

        assert_eq!(breakdown.len(), 3);
        assert_eq!(breakdown[0].service, "EC2");
        assert_eq!(breakdown[1].service, "S3");
        assert_eq!(breakdown[1].total_cost, 6.0);
        assert_eq!(breakdown[1].average_cost, 3.0);
        assert_eq!(breakdown[1].record_count, 2);
        assert_eq!(breakdown[2].service, "RDS");
        assert!(breakdown.windows(2).all(|w| w[0].total_cost >= w[1].total_cost));
    }

    #[tokio::test]
    async fn test_equal_cost_tie_break_is_by_name() {
        let aggregator =
            create_test_aggregator(&[record(1, "RDS", 5.0), record(1, "EC2", 5.0)]).await;

        let breakdown = aggregator
            .service_breakdown("123456789012", date(2026, 3, 1), date(2026, 3, 1))
            .await
            .unwrap();

        assert_eq!(breakdown[0].service, "EC2");
        assert_eq!(breakdown[1].service, "RDS");
    }

    #[tokio::test]
    async fn test_service_totals_are_unrounded() {
        let aggregator =
            create_test_aggregator(&[record(1, "EC2", 0.004), record(2, "EC2", 0.004)]).await;

        let totals = aggregator
            .service_totals("123456789012", date(2026, 3, 1), date(2026, 3, 2))
            .await
            .unwrap();

        // 0.004 + 0.004 survives as 0.008, not a per-record rounded 0.0
        assert!((totals["EC2"] - 0.008).abs() < 1e-9);
    }
}
