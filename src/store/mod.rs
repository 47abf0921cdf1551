//! Storage collaborator seam
//!
//! The engine never talks to a database directly. It depends on the narrow
//! capability traits below; the deployment wires in whichever backend it uses,
//! and tests inject [`MemoryStore`]. Store failures surface as
//! `StorageUnavailable`; retry policy belongs to the caller.

mod memory;

pub use memory::MemoryStore;

use crate::error::CostEngineResult;
use crate::types::{AlertKind, BudgetAlert, CostRecord, Priority, Recommendation};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Durable store of raw cost records, keyed by `(account_id, date, service)`
#[async_trait]
pub trait CostRecordStore: Send + Sync {
    /// Write records, replacing any existing record with the same key.
    /// Returns the number of records written.
    async fn upsert_records(&self, records: &[CostRecord]) -> CostEngineResult<usize>;

    /// Fetch records for one account within an inclusive date range,
    /// optionally restricted to a single service.
    async fn query_records(
        &self,
        account_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        service: Option<&str>,
    ) -> CostEngineResult<Vec<CostRecord>>;
}

/// Durable store of budget alerts
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn insert_alerts(&self, alerts: &[BudgetAlert]) -> CostEngineResult<()>;

    /// Most recent alerts for one account, newest first
    async fn recent_alerts(
        &self,
        account_id: &str,
        limit: usize,
        kind: Option<AlertKind>,
    ) -> CostEngineResult<Vec<BudgetAlert>>;
}

/// Durable store of optimization recommendations
#[async_trait]
pub trait RecommendationStore: Send + Sync {
    async fn insert_recommendations(
        &self,
        recommendations: &[Recommendation],
    ) -> CostEngineResult<()>;

    /// Most recent recommendations for one account, newest first
    async fn recent_recommendations(
        &self,
        account_id: &str,
        limit: usize,
        service: Option<&str>,
        priority: Option<Priority>,
    ) -> CostEngineResult<Vec<Recommendation>>;
}
