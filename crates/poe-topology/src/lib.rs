//! # poe-topology — Dependency Layering for Policy Graphs
//!
//! Compiles a flat node collection into dependency layers ("waves") and
//! per-node structural statistics. This is the reporting half of the
//! engine's graph machinery: the planner performs its own scheduling pass
//! with recovery semantics, while this crate answers "what does the
//! dependency structure look like?"
//!
//! ## Two notions of "level"
//!
//! The compiler deliberately exposes two distinct views:
//!
//! - **Wave index** — true BFS layer depth from Kahn-style in-degree
//!   peeling. Scheduling-correct: every dependency of a wave-*k* node sits
//!   in a wave before *k*.
//! - **Structural level** — simply `depends_on.len()`, an informational
//!   ranking statistic ("most dependent nodes first").
//!
//! They are not reconciled on purpose; consumers pick the view they need.

pub mod compiler;

// Re-export primary types.
pub use compiler::{
    compute_node_levels, degree_stats, materialize_edges, DegreeStats, Topology, TopologyCompiler,
    WeightedEdge,
};
