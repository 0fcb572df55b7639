//! # poe-core — Foundational Types for the Policy Orchestration Engine
//!
//! This crate is the leaf of the workspace DAG. It defines the shared data
//! model for policy orchestration: enforcement artifacts, dependency-graph
//! nodes, execution plans, simulated request contexts, and the results of a
//! dry-run simulation. Every other crate in the workspace depends on
//! `poe-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain identifiers.** `ArtifactId`, `NodeId`,
//!    `PlanId`, `OrchestratorId`, `BatchId`, `ContractId` — all distinct
//!    newtypes. You cannot pass a `NodeId` where a `PlanId` is expected.
//!    No bare strings for identifiers.
//!
//! 2. **The expression language is external.** Artifacts carry their
//!    enforcement expression as an opaque string; parsing and evaluating it
//!    happens behind the [`ExpressionEngine`] trait seam. This crate never
//!    interprets expression text.
//!
//! 3. **UTC-only timestamps.** All wall-clock fields are `DateTime<Utc>`.
//!    Execution windows arrive as raw RFC 3339 strings from external
//!    adapters and are validated, not trusted.
//!
//! 4. **Graceful planner, strict simulator.** Warning types here carry the
//!    planner's degradation story; expression errors carry the simulator's
//!    fail-fast story. The asymmetry is deliberate.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `poe-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public model types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod artifact;
pub mod context;
pub mod expression;
pub mod graph;
pub mod identity;
pub mod plan;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use artifact::{EnforcementTarget, OrchestrationState, PolicyArtifact, RolloutMode, Severity};
pub use context::{
    LatencyStats, PolicyContextSpec, PolicyDecision, PolicySimulationPoint, PolicySimulationResult,
    Verdict,
};
pub use expression::{EvaluationRequest, ExpressionEngine, ExpressionError};
pub use graph::{PolicyEdge, PolicyGraph, PolicyNode};
pub use identity::{ArtifactId, BatchId, ContractId, NodeId, OrchestratorId, PlanId};
pub use plan::{PlannerWarning, PolicyPlan, PolicyPlanStep, WarningSeverity};
pub use temporal::{TimeWindow, WindowError};
