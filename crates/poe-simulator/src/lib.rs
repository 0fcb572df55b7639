//! # poe-simulator — Cached Dry-Run Replay of Execution Plans
//!
//! Replays a compiled [`poe_core::PolicyPlan`] against a list of synthetic
//! request contexts, consulting and populating a short-lived decision
//! cache, and aggregates per-node success ratios and latency percentiles.
//!
//! ## Determinism
//!
//! Iteration is strictly sequential: plan steps, then member nodes, then
//! contexts. The ordering is observable — it decides which evaluation
//! populates the decision cache first — and must stay fixed for
//! repeatable runs.
//!
//! ## Fail fast
//!
//! Malformed policy expressions propagate to the caller as
//! [`SimulationError`]. The planner degrades gracefully; the simulator
//! does not silently swallow bad input. The asymmetry is deliberate.

pub mod cache;
pub mod percentiles;
pub mod simulator;

// Re-export primary types.
pub use cache::{CacheFingerprint, DecisionCache, DECISION_TTL};
pub use percentiles::{latency_stats, nearest_rank};
pub use simulator::{run_plan_simulation, simulate_step, SimulationError};
