//! # Execution Plans
//!
//! The planner compiles a policy graph into a `PolicyPlan`: an ordered
//! list of waves, each a batch of nodes whose dependencies all resolved in
//! earlier waves and which may therefore run concurrently.
//!
//! Plans are created once per planning call and never mutated afterward —
//! re-running the planner is the only way to get a different plan.
//! Problems found while planning become [`PlannerWarning`] entries; they
//! never abort planning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::OrchestrationState;
use crate::identity::{BatchId, NodeId, OrchestratorId, PlanId};

// ---------------------------------------------------------------------------
// PolicyPlanStep
// ---------------------------------------------------------------------------

/// One scheduling wave: nodes eligible to run concurrently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyPlanStep {
    /// Label for this wave.
    pub batch_id: BatchId,
    /// Nodes scheduled together, in planner-chosen order.
    pub node_ids: Vec<NodeId>,
    /// Position of this wave within the plan (0-based).
    pub order: usize,
    /// The effective concurrency cap applied when this wave was formed.
    pub concurrency: usize,
    /// Conservative latency estimate: the sum of member timeout budgets.
    ///
    /// A serial upper bound used for budget checking only — not a real
    /// parallel-execution estimate.
    pub estimated_latency_ms: i64,
}

// ---------------------------------------------------------------------------
// PolicyPlan
// ---------------------------------------------------------------------------

/// A compiled execution plan for one policy graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyPlan {
    /// Unique plan identifier, generated per planning call.
    pub id: PlanId,
    /// The orchestrator that requested this plan.
    pub orchestrator_id: OrchestratorId,
    /// Ordered waves.
    pub steps: Vec<PolicyPlanStep>,
    /// When the plan was compiled.
    pub created_at: DateTime<Utc>,
    /// `Degraded` if planning produced any error-severity warning,
    /// otherwise `Draft`.
    pub state: OrchestrationState,
    /// 1 for a non-empty plan, 0 for the empty-graph plan.
    pub revision: u32,
}

impl PolicyPlan {
    /// Total number of node slots across all waves.
    pub fn node_count(&self) -> usize {
        self.steps.iter().map(|s| s.node_ids.len()).sum()
    }

    /// Whether the plan schedules nothing.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

// ---------------------------------------------------------------------------
// PlannerWarning
// ---------------------------------------------------------------------------

/// Severity of a planner warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    /// Advisory; the plan remains `Draft`.
    Warning,
    /// Structural defect; the plan becomes `Degraded`.
    Error,
}

impl std::fmt::Display for WarningSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// A non-fatal problem discovered while planning.
///
/// Warnings never abort planning; the planner always returns a complete
/// (possibly degraded) plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerWarning {
    /// The node concerned, or `None` for graph-level issues.
    pub node_id: Option<NodeId>,
    /// Human-readable description.
    pub message: String,
    /// Whether this warning degrades the plan.
    pub severity: WarningSeverity,
}

impl PlannerWarning {
    /// A graph-level warning with no associated node.
    pub fn graph_level(message: impl Into<String>, severity: WarningSeverity) -> Self {
        Self {
            node_id: None,
            message: message.into(),
            severity,
        }
    }

    /// A warning attached to a specific node.
    pub fn for_node(node_id: NodeId, message: impl Into<String>, severity: WarningSeverity) -> Self {
        Self {
            node_id: Some(node_id),
            message: message.into(),
            severity,
        }
    }
}
