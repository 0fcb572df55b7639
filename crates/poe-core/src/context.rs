//! # Request Contexts and Simulation Results
//!
//! A simulated request is a `PolicyContextSpec`: who is asking for what,
//! plus a free-form attribute bag and the simulated clock. The simulator
//! replays a plan against a list of contexts and aggregates, per node, the
//! verdicts and latency distribution.
//!
//! Attributes use a `BTreeMap` so their serialized form is key-sorted and
//! deterministic — the decision-cache fingerprint depends on it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{BatchId, NodeId};

// ---------------------------------------------------------------------------
// PolicyContextSpec
// ---------------------------------------------------------------------------

/// One synthetic request to dry-run a plan against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyContextSpec {
    /// The requesting principal.
    pub principal: String,
    /// The resource being accessed.
    pub resource: String,
    /// The action attempted.
    pub action: String,
    /// Free-form request attributes, key-sorted for determinism.
    pub attributes: BTreeMap<String, serde_json::Value>,
    /// The simulated request time.
    pub now: DateTime<Utc>,
}

impl PolicyContextSpec {
    /// Create a context with an empty attribute bag and the current time.
    pub fn new(
        principal: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            principal: principal.into(),
            resource: resource.into(),
            action: action.into(),
            attributes: BTreeMap::new(),
            now: Utc::now(),
        }
    }

    /// Builder: attach a request attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Builder: set the simulated request time.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

// ---------------------------------------------------------------------------
// Verdict / PolicyDecision
// ---------------------------------------------------------------------------

/// The final outcome of evaluating an expression against a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The request is permitted.
    Allow,
    /// The request is denied.
    Deny,
}

impl Verdict {
    /// Whether this verdict permits the request.
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allow => f.write_str("allow"),
            Self::Deny => f.write_str("deny"),
        }
    }
}

/// A verdict plus the rationale strings explaining how it was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// Whether the request was allowed.
    pub allowed: bool,
    /// Human-readable rationale fragments (verdict, wave, batch, cache
    /// status, expression snippet).
    pub rationale: Vec<String>,
}

// ---------------------------------------------------------------------------
// Simulation results
// ---------------------------------------------------------------------------

/// The outcome of simulating one node against one context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySimulationPoint {
    /// The node evaluated.
    pub node_id: NodeId,
    /// The wave the node was scheduled in.
    pub batch_id: BatchId,
    /// The decision reached.
    pub decision: PolicyDecision,
    /// Wall-clock time spent on this evaluation, in milliseconds.
    pub elapsed_ms: f64,
    /// Whether the verdict was served from the decision cache.
    pub cache_hit: bool,
}

/// Latency percentiles over one node's evaluation samples, in milliseconds.
///
/// Computed by nearest-rank selection; an empty sample set yields 0.0 for
/// every percentile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    /// Median latency.
    pub p50: f64,
    /// 90th percentile latency.
    pub p90: f64,
    /// 95th percentile latency.
    pub p95: f64,
    /// 99th percentile latency.
    pub p99: f64,
}

/// Per-node aggregate over every context and wave that touched the node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySimulationResult {
    /// The node these aggregates describe.
    pub node_id: NodeId,
    /// Every individual evaluation outcome, in simulation order.
    pub outcomes: Vec<PolicySimulationPoint>,
    /// Allowed evaluations divided by total evaluations.
    pub success_ratio: f64,
    /// Latency percentiles over the node's samples.
    pub latency: LatencyStats,
}
