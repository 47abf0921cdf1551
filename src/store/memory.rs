//! In-memory store implementation
//!
//! Backs the test suite and any single-process deployment. Records are held
//! per account in a BTreeMap keyed by `(date, service)`, which gives
//! last-write-wins upsert semantics and date-ordered scans for free.

use super::{AlertStore, CostRecordStore, RecommendationStore};
use crate::error::CostEngineResult;
use crate::types::{AlertKind, BudgetAlert, CostRecord, Priority, Recommendation};
use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

type RecordKey = (NaiveDate, String);

/// In-memory cost record, alert, and recommendation store
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<String, BTreeMap<RecordKey, CostRecord>>,
    alerts: DashMap<String, Arc<RwLock<Vec<BudgetAlert>>>>,
    recommendations: DashMap<String, Arc<RwLock<Vec<Recommendation>>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CostRecordStore for MemoryStore {
    async fn upsert_records(&self, records: &[CostRecord]) -> CostEngineResult<usize> {
        for record in records {
            let mut account = self.records.entry(record.account_id.clone()).or_default();
            account.insert((record.date, record.service.clone()), record.clone());
        }
        Ok(records.len())
    }

    async fn query_records(
        &self,
        account_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        service: Option<&str>,
    ) -> CostEngineResult<Vec<CostRecord>> {
        let Some(account) = self.records.get(account_id) else {
            return Ok(Vec::new());
        };

        let matches = account
            .range((start_date, String::new())..)
            .take_while(|((date, _), _)| *date <= end_date)
            .filter(|((_, svc), _)| service.map_or(true, |s| s == svc))
            .map(|(_, record)| record.clone())
            .collect();

        Ok(matches)
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn insert_alerts(&self, alerts: &[BudgetAlert]) -> CostEngineResult<()> {
        for alert in alerts {
            let entry = self
                .alerts
                .entry(alert.account_id.clone())
                .or_default()
                .clone();
            entry.write().push(alert.clone());
        }
        Ok(())
    }

    async fn recent_alerts(
        &self,
        account_id: &str,
        limit: usize,
        kind: Option<AlertKind>,
    ) -> CostEngineResult<Vec<BudgetAlert>> {
        let Some(entry) = self.alerts.get(account_id).map(|e| e.clone()) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<BudgetAlert> = entry
            .read()
            .iter()
            .filter(|alert| kind.map_or(true, |k| k == alert.kind))
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        matches.truncate(limit);
        Ok(matches)
    }
}

#[async_trait]
impl RecommendationStore for MemoryStore {
    async fn insert_recommendations(
        &self,
        recommendations: &[Recommendation],
    ) -> CostEngineResult<()> {
        for recommendation in recommendations {
            let entry = self
                .recommendations
                .entry(recommendation.account_id.clone())
                .or_default()
                .clone();
            entry.write().push(recommendation.clone());
        }
        Ok(())
    }

    async fn recent_recommendations(
        &self,
        account_id: &str,
        limit: usize,
        service: Option<&str>,
        priority: Option<Priority>,
    ) -> CostEngineResult<Vec<Recommendation>> {
        let Some(entry) = self.recommendations.get(account_id).map(|e| e.clone()) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<Recommendation> = entry
            .read()
            .iter()
            .filter(|rec| service.map_or(true, |s| s == rec.service))
            .filter(|rec| priority.map_or(true, |p| p == rec.priority))
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        matches.truncate(limit);
        Ok(matches)
    }
}
