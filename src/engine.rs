//! Evaluation cycle orchestration and record ingestion
//!
//! One cycle is the synchronous chain Aggregator -> BudgetEvaluator ->
//! RecommendationEngine for a single `(account, period)` pair. The engine
//! holds no mutable state between invocations; concurrent cycles for
//! different accounts need no coordination, and the caller serializes cycles
//! for the same account.

use crate::aggregator::Aggregator;
use crate::budget::{BudgetEvaluator, BudgetLimits};
use crate::error::{CostEngineError, CostEngineResult};
use crate::recommendation::RecommendationEngine;
use crate::store::{AlertStore, CostRecordStore, RecommendationStore};
use crate::types::{BudgetAlert, CostRecord, PeriodSummary, Recommendation};
use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use tracing::{error, info};

/// Allowed divergence between a rolled-up total and the sum of its parts,
/// per breakdown entry
const ROUNDING_EPSILON: f64 = 0.01;

/// Everything one evaluation cycle produced
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub summary: PeriodSummary,
    pub alerts: Vec<BudgetAlert>,
    pub recommendations: Vec<Recommendation>,
}

/// Cost aggregation and budget-rule engine over an injected store.
///
/// Constructed once per process with a shared store handle and budget
/// configuration, then invoked per account and period.
pub struct CostEngine<S> {
    store: Arc<S>,
    limits: BudgetLimits,
}

impl<S> CostEngine<S>
where
    S: CostRecordStore + AlertStore + RecommendationStore,
{
    /// Create an engine; fails fast on malformed budget limits
    pub fn new(store: Arc<S>, limits: BudgetLimits) -> CostEngineResult<Self> {
        limits.validate()?;
        Ok(Self { store, limits })
    }

    /// Aggregator view over the engine's store
    pub fn aggregator(&self) -> Aggregator<S> {
        Aggregator::new(Arc::clone(&self.store))
    }

    /// Ingest raw cost records, upserting by `(account, date, service)`.
    /// Returns the number of records written.
    pub async fn ingest(
        &self,
        account_id: &str,
        records: &[CostRecord],
    ) -> CostEngineResult<usize> {
        if let Some(bad) = records
            .iter()
            .find(|r| r.account_id != account_id || r.cost < 0.0)
        {
            return Err(CostEngineError::DataInconsistency {
                details: format!(
                    "rejected record for {}/{} on {}: records must match the ingesting account and carry a non-negative cost",
                    bad.account_id, bad.service, bad.date
                ),
            });
        }

        let written = self.store.upsert_records(records).await?;
        info!(account_id, written, "ingested cost records");
        Ok(written)
    }

    /// Run one evaluation cycle over the `period_days`-day window ending at
    /// `end_date` (inclusive).
    ///
    /// Aggregates the period, evaluates budget thresholds, generates
    /// recommendations, and persists alerts and recommendations only after
    /// the whole cycle has been computed. Nothing is persisted on failure.
    pub async fn run_cycle(
        &self,
        account_id: &str,
        end_date: NaiveDate,
        period_days: u32,
    ) -> CostEngineResult<CycleReport> {
        let start_date = end_date - Duration::days(i64::from(period_days) - 1);
        info!(account_id, %start_date, %end_date, "starting evaluation cycle");

        let aggregator = self.aggregator();
        let summary = aggregator
            .summarize(account_id, start_date, end_date, None)
            .await?;
        let costs_by_service = aggregator
            .service_totals(account_id, start_date, end_date)
            .await?;

        self.check_rollup_invariant(&summary)?;

        let total_cost: f64 = costs_by_service.values().sum();
        let alerts = BudgetEvaluator::evaluate(account_id, &costs_by_service, &self.limits)?;
        let recommendations =
            RecommendationEngine::generate(account_id, &costs_by_service, total_cost);

        self.store.insert_alerts(&alerts).await?;
        self.store.insert_recommendations(&recommendations).await?;

        info!(
            account_id,
            alerts = alerts.len(),
            recommendations = recommendations.len(),
            total_cost = summary.total_cost,
            "evaluation cycle complete"
        );

        Ok(CycleReport {
            summary,
            alerts,
            recommendations,
        })
    }

    /// The breakdown must sum back to the period total. A divergence means a
    /// defect in the rollup, not bad input, so it is logged and surfaced
    /// rather than silently corrected.
    fn check_rollup_invariant(&self, summary: &PeriodSummary) -> CostEngineResult<()> {
        let breakdown_sum: f64 = summary
            .service_breakdown
            .iter()
            .map(|share| share.total_cost)
            .sum();
        let tolerance = ROUNDING_EPSILON * summary.service_breakdown.len().max(1) as f64;

        if (breakdown_sum - summary.total_cost).abs() > tolerance {
            let details = format!(
                "service breakdown sum {:.4} diverges from period total {:.4} for account {}",
                breakdown_sum, summary.total_cost, summary.account_id
            );
            error!(account_id = %summary.account_id, %details, "rollup invariant violated");
            return Err(CostEngineError::DataInconsistency { details });
        }
        Ok(())
    }
}
