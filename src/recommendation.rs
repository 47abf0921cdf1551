//! Rule-based optimization recommendations with estimated savings
//!
//! Each rule is a pure function of a service-class cost gated by a threshold.
//! Rules are independent: one elevated cost can trigger several
//! recommendations. Savings figures are estimates, not guarantees.

use crate::types::{
    format_currency, round2, Impact, Priority, Recommendation, RecommendationCategory,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::info;

/// Service classes the rule table recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceClass {
    Compute,
    RelationalStorage,
    ObjectStorage,
    Orchestration,
}

impl ServiceClass {
    /// Map a raw service name onto its class. Unrecognized names get no
    /// per-service rules (they still count toward the global total).
    pub fn classify(service: &str) -> Option<Self> {
        match service {
            "EC2" | "Amazon Elastic Compute Cloud" => Some(Self::Compute),
            "RDS" | "Amazon Relational Database Service" => Some(Self::RelationalStorage),
            "S3" | "Amazon Simple Storage Service" => Some(Self::ObjectStorage),
            "EKS" | "Amazon Elastic Kubernetes Service" => Some(Self::Orchestration),
            _ => None,
        }
    }

    /// Label used on emitted recommendations
    fn label(self) -> &'static str {
        match self {
            Self::Compute => "EC2",
            Self::RelationalStorage => "RDS",
            Self::ObjectStorage => "S3",
            Self::Orchestration => "EKS",
        }
    }
}

/// Applies the fixed cost-rule table to one account's period costs.
///
/// Output is deterministic for identical inputs: class rules fire in table
/// order (compute, relational storage, object storage, orchestration), then
/// the global rules. `generated_at` is the only non-deterministic field.
pub struct RecommendationEngine;

impl RecommendationEngine {
    /// Generate recommendations from per-service costs and the period total
    pub fn generate(
        account_id: &str,
        costs_by_service: &BTreeMap<String, f64>,
        total_cost: f64,
    ) -> Vec<Recommendation> {
        let generated_at = Utc::now();
        let totals = ClassTotals::from_costs(costs_by_service);
        let mut recommendations = Vec::new();

        compute_rules(totals.compute, &mut recommendations);
        relational_storage_rules(totals.relational_storage, &mut recommendations);
        object_storage_rules(totals.object_storage, &mut recommendations);
        orchestration_rules(totals.orchestration, &mut recommendations);
        global_rules(total_cost, &mut recommendations);

        let recommendations = finalize(account_id, generated_at, recommendations);
        info!(
            account_id,
            count = recommendations.len(),
            "generated optimization recommendations"
        );
        recommendations
    }
}

/// Rule output before the cycle-wide fields are stamped on
struct Draft {
    service: &'static str,
    priority: Priority,
    category: RecommendationCategory,
    title: &'static str,
    description: String,
    savings: f64,
    action: &'static str,
    impact: Impact,
}

fn compute_rules(cost: f64, out: &mut Vec<Draft>) {
    if cost > 20.0 {
        out.push(Draft {
            service: ServiceClass::Compute.label(),
            priority: Priority::High,
            category: RecommendationCategory::RightSizing,
            title: "Consider Right-Sizing EC2 Instances",
            description: format!(
                "EC2 costs are {}. Review instance types and consider downsizing.",
                format_currency(cost)
            ),
            savings: cost * 0.3,
            action: "Review EC2 instances and consider t2.micro or t3.micro instances",
            impact: Impact::Medium,
        });
        out.push(Draft {
            service: ServiceClass::Compute.label(),
            priority: Priority::Medium,
            category: RecommendationCategory::ReservedCapacity,
            title: "Consider Reserved Instances",
            description: "For predictable workloads, Reserved Instances can save up to 75%."
                .to_string(),
            savings: cost * 0.5,
            action: "Analyze usage patterns and consider Reserved Instances",
            impact: Impact::High,
        });
    }
}

fn relational_storage_rules(cost: f64, out: &mut Vec<Draft>) {
    if cost > 10.0 {
        out.push(Draft {
            service: ServiceClass::RelationalStorage.label(),
            priority: Priority::High,
            category: RecommendationCategory::InstanceOptimization,
            title: "Optimize RDS Instance Size",
            description: format!(
                "RDS costs are {}. Consider using db.t2.micro for development.",
                format_currency(cost)
            ),
            savings: cost * 0.4,
            action: "Review RDS instance types and consider smaller instances",
            impact: Impact::Medium,
        });
    }
}

fn object_storage_rules(cost: f64, out: &mut Vec<Draft>) {
    if cost > 5.0 {
        out.push(Draft {
            service: ServiceClass::ObjectStorage.label(),
            priority: Priority::Medium,
            category: RecommendationCategory::LifecyclePolicy,
            title: "Implement S3 Lifecycle Policies",
            description: format!(
                "S3 costs are {}. Implement lifecycle policies to move old data to cheaper storage.",
                format_currency(cost)
            ),
            savings: cost * 0.6,
            action: "Set up lifecycle policies to transition data to IA and Glacier",
            impact: Impact::High,
        });
    }
}

fn orchestration_rules(cost: f64, out: &mut Vec<Draft>) {
    if cost > 15.0 {
        out.push(Draft {
            service: ServiceClass::Orchestration.label(),
            priority: Priority::High,
            category: RecommendationCategory::NodeOptimization,
            title: "Optimize EKS Node Configuration",
            description: format!(
                "EKS costs are {}. Review node group configuration and consider spot instances.",
                format_currency(cost)
            ),
            savings: cost * 0.7,
            action: "Use spot instances for non-critical workloads and optimize node sizing",
            impact: Impact::High,
        });
    }
}

fn global_rules(total_cost: f64, out: &mut Vec<Draft>) {
    if total_cost > 50.0 {
        out.push(Draft {
            service: "GENERAL",
            priority: Priority::High,
            category: RecommendationCategory::BudgetMonitoring,
            title: "Set Up Budget Alerts",
            description: format!(
                "Total costs are {}. Set up budget alerts to monitor spending.",
                format_currency(total_cost)
            ),
            savings: total_cost * 0.2,
            action: "Configure AWS Budgets with alerts at 50%, 80%, and 100% of budget",
            impact: Impact::High,
        });
        out.push(Draft {
            service: "GENERAL",
            priority: Priority::Medium,
            category: RecommendationCategory::CostAllocationTagging,
            title: "Implement Cost Allocation Tags",
            description: "Use tags to track costs by project, environment, or team.".to_string(),
            savings: total_cost * 0.1,
            action: "Implement consistent tagging strategy across all resources",
            impact: Impact::Medium,
        });
    }
}

/// Raw service costs summed per class
#[derive(Debug, Default)]
struct ClassTotals {
    compute: f64,
    relational_storage: f64,
    object_storage: f64,
    orchestration: f64,
}

impl ClassTotals {
    fn from_costs(costs_by_service: &BTreeMap<String, f64>) -> Self {
        let mut totals = Self::default();
        for (service, cost) in costs_by_service {
            match ServiceClass::classify(service) {
                Some(ServiceClass::Compute) => totals.compute += cost,
                Some(ServiceClass::RelationalStorage) => totals.relational_storage += cost,
                Some(ServiceClass::ObjectStorage) => totals.object_storage += cost,
                Some(ServiceClass::Orchestration) => totals.orchestration += cost,
                None => {}
            }
        }
        totals
    }
}

fn finalize(
    account_id: &str,
    generated_at: DateTime<Utc>,
    drafts: Vec<Draft>,
) -> Vec<Recommendation> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| Recommendation {
            account_id: account_id.to_string(),
            generated_at,
            recommendation_id: format!("rec_{}", index),
            service: draft.service.to_string(),
            priority: draft.priority,
            category: draft.category,
            title: draft.title.to_string(),
            description: draft.description,
            potential_savings: format_currency(round2(draft.savings)),
            action: draft.action.to_string(),
            impact: draft.impact,
        })
        .collect()
}
