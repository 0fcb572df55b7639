//! # poe-planner — Wave Planning for Policy Graphs
//!
//! Consumes a [`poe_core::PolicyGraph`] and emits a concrete
//! [`poe_core::PolicyPlan`]: ordered, concurrency-capped waves of nodes
//! whose dependencies resolved in earlier waves.
//!
//! ## Resilient by design
//!
//! The planner never fails. Every problem it finds — invalid execution
//! windows, dependency cycles, wave deadlocks, latency budget overruns —
//! becomes a [`poe_core::PlannerWarning`], and planning always terminates
//! with a complete plan. A plan carrying at least one error-severity
//! warning is marked `Degraded`; otherwise it is `Draft`. This is the
//! deliberate counterpart to the simulator, which fails fast on malformed
//! expressions.

pub mod planner;

// Re-export primary types.
pub use planner::{plan_policy_graph, PlanOutcome, PlanRequest};
