//! Cost aggregation and budget-rule engine for per-service cloud spend
//!
//! This crate turns a stream of raw `(account, date, service, cost)` records
//! into:
//! - time-windowed summaries and trend signals
//! - budget-threshold alerts
//! - rule-based optimization recommendations with estimated savings
//!
//! Storage is an external collaborator behind the narrow traits in [`store`];
//! the HTTP layer and scheduler that drive the engine live outside this
//! crate. Data flows one way: raw records -> [`aggregator`] ->
//! {[`trend`], [`budget`]} -> [`recommendation`] -> persisted alerts and
//! recommendations -> [`query`].

pub mod aggregator;
pub mod budget;
pub mod engine;
pub mod error;
pub mod query;
pub mod recommendation;
pub mod store;
pub mod trend;
pub mod types;

pub use error::{CostEngineError, CostEngineResult};

// Aggregation
pub use aggregator::Aggregator;

// Trend analysis
pub use trend::TrendAnalyzer;

// Budget evaluation
pub use budget::{BudgetEvaluator, BudgetLimits};

// Recommendations
pub use recommendation::{RecommendationEngine, ServiceClass};

// Evaluation cycle and ingestion
pub use engine::{CostEngine, CycleReport};

// Read-side queries
pub use query::{
    BudgetSummary, CategoryCount, CostQueryService, CostSummary, KindCount, PriorityCount,
    RecommendationSummary, ServiceCount,
};

// Storage seam
pub use store::{AlertStore, CostRecordStore, MemoryStore, RecommendationStore};

// Data model
pub use types::{
    AlertKind, BudgetAlert, CostRecord, DailyTotal, Impact, PeriodSummary, Priority,
    Recommendation, RecommendationCategory, ServiceCost, ServiceShare, TrendDirection,
    TrendReport, TrendResult,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_component_construction() {
        let store = Arc::new(MemoryStore::new());

        let engine = CostEngine::new(Arc::clone(&store), BudgetLimits::default());
        assert!(engine.is_ok());

        let _aggregator = Aggregator::new(Arc::clone(&store));
        let _queries = CostQueryService::new(store);
    }

    #[test]
    fn test_module_re_exports() {
        let _direction = TrendDirection::InsufficientData;
        let _kind = AlertKind::BudgetExceeded;
        let _priority = Priority::High;
        let _impact = Impact::Medium;
        let _category = RecommendationCategory::RightSizing;
        let _class = ServiceClass::classify("EC2");

        let limits = BudgetLimits::default();
        assert!(limits.validate().is_ok());
    }
}
