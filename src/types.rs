//! Core data model: cost records, rollups, alerts, and recommendations

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Raw per-service cost record, day granularity.
///
/// Uniquely identified by `(account_id, date, service)`; a duplicate write for
/// the same key replaces the previous record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    pub account_id: String,
    pub date: NaiveDate,
    pub service: String,
    pub cost: f64,
}

/// Derived total spend for one account and day across all services.
///
/// Recomputed from the current records, never stored as ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub account_id: String,
    pub date: NaiveDate,
    pub total_cost: f64,
}

/// Per-service share of a period summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceShare {
    pub service: String,
    pub total_cost: f64,
    pub percentage_of_total: f64,
}

/// Full per-service breakdown entry with record statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCost {
    pub service: String,
    pub total_cost: f64,
    pub average_cost: f64,
    pub record_count: usize,
    pub percentage_of_total: f64,
}

/// Period rollup for one account over an inclusive date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub account_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_cost: f64,
    pub daily_average: f64,
    /// Ordered descending by cost
    pub service_breakdown: Vec<ServiceShare>,
}

/// Spend trend direction between adjacent weekly windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    InsufficientData,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Increasing => write!(f, "increasing"),
            Self::Decreasing => write!(f, "decreasing"),
            Self::InsufficientData => write!(f, "insufficient_data"),
        }
    }
}

/// Trend comparison outcome. `percentage_change` is an absolute magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub direction: TrendDirection,
    pub percentage_change: f64,
}

/// Trend result together with the daily series it was computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub result: TrendResult,
    pub daily_costs: Vec<DailyTotal>,
    pub window_days: u32,
}

/// Budget alert kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    BudgetExceeded,
    ServiceBudgetExceeded,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BudgetExceeded => write!(f, "BUDGET_EXCEEDED"),
            Self::ServiceBudgetExceeded => write!(f, "SERVICE_BUDGET_EXCEEDED"),
        }
    }
}

/// Budget threshold breach for one account and evaluation cycle.
///
/// Never mutated after creation. `service` is `"TOTAL"` for the global kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAlert {
    pub id: Uuid,
    pub account_id: String,
    pub generated_at: DateTime<Utc>,
    pub kind: AlertKind,
    pub service: String,
    pub current_cost: f64,
    pub budget_limit: f64,
    pub message: String,
}

/// Recommendation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "HIGH"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::Low => write!(f, "LOW"),
        }
    }
}

/// Expected impact of acting on a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Impact {
    High,
    Medium,
    Low,
}

/// Recommendation category from the fixed rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationCategory {
    RightSizing,
    ReservedCapacity,
    InstanceOptimization,
    LifecyclePolicy,
    NodeOptimization,
    BudgetMonitoring,
    CostAllocationTagging,
}

impl fmt::Display for RecommendationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RightSizing => write!(f, "RIGHT_SIZING"),
            Self::ReservedCapacity => write!(f, "RESERVED_CAPACITY"),
            Self::InstanceOptimization => write!(f, "INSTANCE_OPTIMIZATION"),
            Self::LifecyclePolicy => write!(f, "LIFECYCLE_POLICY"),
            Self::NodeOptimization => write!(f, "NODE_OPTIMIZATION"),
            Self::BudgetMonitoring => write!(f, "BUDGET_MONITORING"),
            Self::CostAllocationTagging => write!(f, "COST_ALLOCATION_TAGGING"),
        }
    }
}

/// Actionable cost optimization recommendation.
///
/// Generated fresh each evaluation cycle; `generated_at` is the only
/// non-deterministic field. `potential_savings` is a currency-formatted
/// estimate, not a guarantee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub account_id: String,
    pub generated_at: DateTime<Utc>,
    /// Unique within one generation cycle, e.g. `rec_0`
    pub recommendation_id: String,
    pub service: String,
    pub priority: Priority,
    pub category: RecommendationCategory,
    pub title: String,
    pub description: String,
    pub potential_savings: String,
    pub action: String,
    pub impact: Impact,
}

/// Round to 2 decimal places for display values
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format a cost as a currency string, e.g. `$12.65`
pub fn format_currency(value: f64) -> String {
    format!("${:.2}", value)
}

/// Parse a currency-formatted string back to a number.
///
/// Returns `None` for non-numeric input; callers skip such entries rather
/// than erroring.
pub fn parse_currency(value: &str) -> Option<f64> {
    value
        .trim()
        .trim_start_matches('$')
        .replace(',', "")
        .parse::<f64>()
        .ok()
}
