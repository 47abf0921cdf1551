//! Budget threshold evaluation and alert generation

use crate::error::{CostEngineError, CostEngineResult};
use crate::types::{format_currency, AlertKind, BudgetAlert};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;
use uuid::Uuid;

/// Named budget thresholds: one total limit plus per-service limits.
///
/// Services without an entry in `per_service` still count toward the total
/// but never trigger a per-service alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetLimits {
    pub total: f64,
    pub per_service: BTreeMap<String, f64>,
}

impl Default for BudgetLimits {
    fn default() -> Self {
        Self {
            total: 50.0,
            per_service: BTreeMap::from([
                ("EC2".to_string(), 20.0),
                ("RDS".to_string(), 15.0),
                ("S3".to_string(), 5.0),
                ("EKS".to_string(), 25.0),
            ]),
        }
    }
}

impl BudgetLimits {
    /// Reject malformed limits before any evaluation runs
    pub fn validate(&self) -> CostEngineResult<()> {
        if self.total < 0.0 {
            return Err(CostEngineError::InvalidConfiguration {
                message: format!("negative total budget: {:.2}", self.total),
            });
        }
        for (service, limit) in &self.per_service {
            if *limit < 0.0 {
                return Err(CostEngineError::InvalidConfiguration {
                    message: format!("negative budget for {}: {:.2}", service, limit),
                });
            }
        }
        Ok(())
    }
}

/// Compares current-period per-service costs against configured limits
pub struct BudgetEvaluator;

impl BudgetEvaluator {
    /// Evaluate one account's period costs against the limits.
    ///
    /// Emits at most one `BudgetExceeded` alert (service `"TOTAL"`) followed
    /// by one `ServiceBudgetExceeded` alert per breached service, in sorted
    /// service-name order. Comparisons are strict: a cost exactly at its
    /// limit does not alert. Every breach alerts every cycle; there is no
    /// dedup against prior cycles.
    pub fn evaluate(
        account_id: &str,
        costs_by_service: &BTreeMap<String, f64>,
        limits: &BudgetLimits,
    ) -> CostEngineResult<Vec<BudgetAlert>> {
        limits.validate()?;

        let mut alerts = Vec::new();
        let total_cost: f64 = costs_by_service.values().sum();

        if total_cost > limits.total {
            alerts.push(new_alert(
                account_id,
                AlertKind::BudgetExceeded,
                "TOTAL",
                total_cost,
                limits.total,
                format!(
                    "Total monthly budget exceeded: {} > {}",
                    format_currency(total_cost),
                    format_currency(limits.total)
                ),
            ));
        }

        // BTreeMap iteration gives the deterministic sorted-name order
        for (service, cost) in costs_by_service {
            let Some(limit) = limits.per_service.get(service) else {
                continue;
            };
            if *cost > *limit {
                alerts.push(new_alert(
                    account_id,
                    AlertKind::ServiceBudgetExceeded,
                    service,
                    *cost,
                    *limit,
                    format!(
                        "{} budget exceeded: {} > {}",
                        service,
                        format_currency(*cost),
                        format_currency(*limit)
                    ),
                ));
            }
        }

        for alert in &alerts {
            warn!(
                account_id,
                service = %alert.service,
                current_cost = alert.current_cost,
                budget_limit = alert.budget_limit,
                "budget threshold breached"
            );
        }

        Ok(alerts)
    }
}

fn new_alert(
    account_id: &str,
    kind: AlertKind,
    service: &str,
    current_cost: f64,
    budget_limit: f64,
    message: String,
) -> BudgetAlert {
    BudgetAlert {
        id: Uuid::new_v4(),
        account_id: account_id.to_string(),
        generated_at: Utc::now(),
        kind,
        service: service.to_string(),
        current_cost,
        budget_limit,
        message,
    }
}
