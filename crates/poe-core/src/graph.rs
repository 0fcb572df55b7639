//! # Policy Graphs
//!
//! A policy graph is the unit of planning: a flat collection of nodes, each
//! wrapping one artifact, plus an explicit edge list. The edge list is
//! derived from the nodes' `depends_on` declarations but kept as a separate
//! structure for visualization and edge weighting; the two views must stay
//! consistent, and [`PolicyGraph::is_consistent`] checks that they do.
//!
//! Node ids are unique within a graph. `depends_on` entries should resolve
//! to ids present in the same graph; unresolved references are tolerated —
//! the topology compiler counts them as orphans and the planner treats
//! absent dependencies as satisfied.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::artifact::PolicyArtifact;
use crate::identity::NodeId;

// ---------------------------------------------------------------------------
// PolicyNode
// ---------------------------------------------------------------------------

/// One schedulable unit within a policy graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyNode {
    /// Unique node identifier within the graph.
    pub id: NodeId,
    /// The artifact this node enforces.
    pub artifact: PolicyArtifact,
    /// Node ids this node depends on; must complete in earlier waves.
    pub depends_on: Vec<NodeId>,
    /// Retry attempts granted to this node's execution.
    pub retries: u32,
    /// Execution timeout budget in seconds. Non-positive values are
    /// flagged by the planner's validation pass.
    pub timeout_seconds: i64,
    /// Whether a human must approve before this node runs.
    pub requires_human_approval: bool,
    /// Team accountable for this node.
    pub owner_team: String,
    /// Service-level window in minutes. Non-positive values are flagged
    /// by the planner's validation pass.
    pub sla_window_minutes: i64,
}

impl PolicyNode {
    /// Create a node with default execution settings.
    ///
    /// Defaults: no dependencies, 3 retries, 60 second timeout, no human
    /// approval, 60 minute SLA window.
    pub fn new(id: NodeId, artifact: PolicyArtifact) -> Self {
        Self {
            id,
            artifact,
            depends_on: Vec::new(),
            retries: 3,
            timeout_seconds: 60,
            requires_human_approval: false,
            owner_team: String::new(),
            sla_window_minutes: 60,
        }
    }

    /// Builder: declare a dependency on another node.
    pub fn depends_on(mut self, id: NodeId) -> Self {
        self.depends_on.push(id);
        self
    }

    /// Builder: set the timeout budget in seconds.
    pub fn with_timeout_seconds(mut self, timeout_seconds: i64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Builder: set the SLA window in minutes.
    pub fn with_sla_window_minutes(mut self, sla_window_minutes: i64) -> Self {
        self.sla_window_minutes = sla_window_minutes;
        self
    }

    /// Builder: require human approval before execution.
    pub fn with_human_approval(mut self) -> Self {
        self.requires_human_approval = true;
        self
    }

    /// The node's timeout budget in milliseconds.
    ///
    /// Used both as the conservative wave latency contribution and as the
    /// weight of edges pointing at this node.
    pub fn timeout_budget_ms(&self) -> i64 {
        self.timeout_seconds.saturating_mul(1000)
    }
}

// ---------------------------------------------------------------------------
// PolicyEdge / PolicyGraph
// ---------------------------------------------------------------------------

/// A directed dependency edge: `from` must complete before `to` starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyEdge {
    /// The prerequisite node.
    pub from: NodeId,
    /// The dependent node.
    pub to: NodeId,
}

/// A dependency graph of policy nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyGraph {
    /// All nodes; ids are unique within the graph.
    pub nodes: Vec<PolicyNode>,
    /// Explicit edge list, derived from `depends_on`.
    pub edges: Vec<PolicyEdge>,
}

impl PolicyGraph {
    /// Build a graph from nodes, deriving the edge list from `depends_on`.
    ///
    /// For a node `n` with dependency `d`, the derived edge is `d -> n`.
    /// Only edges whose endpoints both exist in the graph are materialized.
    pub fn from_nodes(nodes: Vec<PolicyNode>) -> Self {
        let edges = derive_edges(&nodes);
        Self { nodes, edges }
    }

    /// The set of node ids present in this graph.
    pub fn node_ids(&self) -> BTreeSet<NodeId> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    /// Look up a node by id.
    pub fn node(&self, id: &NodeId) -> Option<&PolicyNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Whether the stored edge list matches the edges derivable from the
    /// nodes' `depends_on` declarations.
    pub fn is_consistent(&self) -> bool {
        let derived_edges = derive_edges(&self.nodes);
        let derived: BTreeSet<(&str, &str)> = derived_edges
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .collect();
        let stored: BTreeSet<(&str, &str)> = self
            .edges
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .collect();
        // Compare as sets; duplicates and ordering are presentation concerns.
        derived == stored
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Derive the deduplicated resolvable edge list from `depends_on`.
fn derive_edges(nodes: &[PolicyNode]) -> Vec<PolicyEdge> {
    let known: BTreeSet<&NodeId> = nodes.iter().map(|n| &n.id).collect();
    let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
    let mut edges = Vec::new();
    for node in nodes {
        for dep in &node.depends_on {
            if !known.contains(dep) {
                continue;
            }
            if seen.insert((dep.0.clone(), node.id.0.clone())) {
                edges.push(PolicyEdge {
                    from: dep.clone(),
                    to: node.id.clone(),
                });
            }
        }
    }
    edges
}
