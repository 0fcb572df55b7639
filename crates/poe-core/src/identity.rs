//! # Domain Identity Newtypes
//!
//! Newtype wrappers for every identifier kind in the orchestration engine.
//! These prevent accidental identifier confusion — you cannot pass a
//! `NodeId` where an `ArtifactId` is expected, and a graph-level id can
//! never silently stand in for a plan-level one.
//!
//! Most identifiers are tagged strings minted by external adapters
//! (artifacts and nodes arrive from contract conversion, orchestrator ids
//! from the caller). `PlanId` is the exception: plans are created by the
//! planner itself, so its id is generated locally.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a policy artifact (an enforcement unit).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactId(pub String);

/// Unique identifier for a node within a policy graph.
///
/// Node ids are unique within a single `PolicyGraph`; `depends_on` entries
/// reference other nodes by this id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

/// Identifier of the orchestrator that requested a plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrchestratorId(pub String);

/// Identifier of the external contract an artifact was converted from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractId(pub String);

/// Label for one scheduling wave within a plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub String);

/// Unique identifier for an execution plan, generated per planning call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanId(pub Uuid);

impl ArtifactId {
    /// Wrap an adapter-supplied artifact identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Access the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl NodeId {
    /// Wrap an adapter-supplied node identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Access the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl OrchestratorId {
    /// Wrap a caller-supplied orchestrator identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Access the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ContractId {
    /// Wrap an external contract identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Access the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl BatchId {
    /// Wrap a batch label.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Canonical batch label for the wave at the given order index.
    pub fn from_order(order: usize) -> Self {
        Self(format!("batch-{order}"))
    }

    /// Access the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PlanId {
    /// Generate a new random plan identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "artifact:{}", self.0)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for OrchestratorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "orchestrator:{}", self.0)
    }
}

impl std::fmt::Display for ContractId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "contract:{}", self.0)
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "plan:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_display_is_bare() {
        let id = NodeId::new("ingest-check");
        assert_eq!(id.to_string(), "ingest-check");
        assert_eq!(id.as_str(), "ingest-check");
    }

    #[test]
    fn prefixed_displays() {
        assert_eq!(ArtifactId::new("a1").to_string(), "artifact:a1");
        assert_eq!(OrchestratorId::new("orch").to_string(), "orchestrator:orch");
        assert_eq!(ContractId::new("c9").to_string(), "contract:c9");
    }

    #[test]
    fn batch_id_from_order() {
        assert_eq!(BatchId::from_order(0).as_str(), "batch-0");
        assert_eq!(BatchId::from_order(7).as_str(), "batch-7");
    }

    #[test]
    fn plan_ids_are_unique() {
        assert_ne!(PlanId::new(), PlanId::new());
    }

    #[test]
    fn plan_id_display_prefix() {
        let id = PlanId::new();
        assert!(id.to_string().starts_with("plan:"));
    }

    #[test]
    fn node_id_serde_roundtrip() {
        let id = NodeId::new("n1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"n1\"");
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
