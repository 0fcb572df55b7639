//! # Wave Planner
//!
//! Planning runs in four passes:
//!
//! 1. **Cycle detection** — depth-first traversal with a visited set and an
//!    active recursion-stack set. A cycle yields a graph-level
//!    error-severity warning; it never aborts planning.
//! 2. **Validation** — every declared execution window must parse with
//!    start < end (error warning otherwise; artifacts with no windows are
//!    checked against the all-time default), and non-positive timeout or
//!    SLA settings earn advisory warnings.
//! 3. **Wave assignment** — an arena of nodes with a parallel
//!    remaining-dependency counter per position. Each round schedules up to
//!    `max(1, requested_concurrency)` ready nodes, ordered by ascending
//!    in-degree then descending out-degree. If nothing is ready (a cycle
//!    reached the scheduler), one stuck node is forced through as a
//!    deadlock break so the loop always terminates.
//! 4. **Budget check** — a wave whose conservative serial latency estimate
//!    exceeds the optional `max_latency_ms` earns an advisory warning.
//!
//! Dependencies on node ids absent from the graph are treated as already
//! satisfied; the topology compiler reports them as orphan references.

use std::collections::HashMap;

use chrono::Utc;

use poe_core::{
    BatchId, NodeId, OrchestrationState, OrchestratorId, PlanId, PlannerWarning, PolicyGraph,
    PolicyNode, PolicyPlan, PolicyPlanStep, TimeWindow, WarningSeverity,
};
use poe_topology::degree_stats;

// ---------------------------------------------------------------------------
// PlanRequest / PlanOutcome
// ---------------------------------------------------------------------------

/// A planning request.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    /// The orchestrator the plan belongs to.
    pub orchestrator_id: OrchestratorId,
    /// The graph to schedule.
    pub graph: PolicyGraph,
    /// Requested per-wave concurrency; clamped to at least 1.
    pub requested_concurrency: usize,
    /// Optional per-wave latency budget in milliseconds.
    pub max_latency_ms: Option<i64>,
}

/// The planner's result: a complete plan plus everything it noticed.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// The compiled plan. Always present, possibly degraded.
    pub plan: PolicyPlan,
    /// Non-fatal problems found while planning.
    pub warnings: Vec<PlannerWarning>,
}

// ---------------------------------------------------------------------------
// plan_policy_graph
// ---------------------------------------------------------------------------

/// Compile a policy graph into an execution plan.
///
/// Never fails: all problems surface as warnings and the returned plan is
/// always complete. An empty graph yields an empty `Draft` plan at
/// revision 0.
pub fn plan_policy_graph(request: &PlanRequest) -> PlanOutcome {
    let nodes = &request.graph.nodes;

    if nodes.is_empty() {
        return PlanOutcome {
            plan: PolicyPlan {
                id: PlanId::new(),
                orchestrator_id: request.orchestrator_id.clone(),
                steps: Vec::new(),
                created_at: Utc::now(),
                state: OrchestrationState::Draft,
                revision: 0,
            },
            warnings: Vec::new(),
        };
    }

    let mut warnings = Vec::new();
    detect_cycles(nodes, &mut warnings);
    validate_nodes(nodes, &mut warnings);
    let steps = assign_waves(nodes, request, &mut warnings);

    let degraded = warnings
        .iter()
        .any(|w| w.severity == WarningSeverity::Error);
    let state = if degraded {
        OrchestrationState::Degraded
    } else {
        OrchestrationState::Draft
    };

    PlanOutcome {
        plan: PolicyPlan {
            id: PlanId::new(),
            orchestrator_id: request.orchestrator_id.clone(),
            steps,
            created_at: Utc::now(),
            state,
            revision: 1,
        },
        warnings,
    }
}

// ---------------------------------------------------------------------------
// Cycle detection
// ---------------------------------------------------------------------------

/// DFS over dependency edges with a visited set and a recursion stack.
/// Appends one graph-level error warning per cycle entry point found.
fn detect_cycles(nodes: &[PolicyNode], warnings: &mut Vec<PlannerWarning>) {
    let index_of = index_by_id(nodes);
    let mut visited = vec![false; nodes.len()];
    let mut on_stack = vec![false; nodes.len()];

    for start in 0..nodes.len() {
        if visited[start] {
            continue;
        }
        if let Some(member) = visit(start, nodes, &index_of, &mut visited, &mut on_stack) {
            tracing::warn!(node = %member, "dependency cycle detected during planning");
            warnings.push(PlannerWarning::graph_level(
                format!("Circular dependency detected involving node '{member}'"),
                WarningSeverity::Error,
            ));
        }
    }
}

fn visit(
    pos: usize,
    nodes: &[PolicyNode],
    index_of: &HashMap<&NodeId, usize>,
    visited: &mut [bool],
    on_stack: &mut [bool],
) -> Option<NodeId> {
    visited[pos] = true;
    on_stack[pos] = true;

    for dep in &nodes[pos].depends_on {
        let Some(&next) = index_of.get(dep) else {
            // Dangling reference: nothing to traverse.
            continue;
        };
        if on_stack[next] {
            on_stack[pos] = false;
            return Some(nodes[next].id.clone());
        }
        if !visited[next] {
            if let Some(found) = visit(next, nodes, index_of, visited, on_stack) {
                on_stack[pos] = false;
                return Some(found);
            }
        }
    }

    on_stack[pos] = false;
    None
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check every node's execution windows and execution settings.
fn validate_nodes(nodes: &[PolicyNode], warnings: &mut Vec<PlannerWarning>) {
    let default_window = [TimeWindow::all_time()];

    for node in nodes {
        let windows: &[TimeWindow] = if node.artifact.windows.is_empty() {
            &default_window
        } else {
            &node.artifact.windows
        };

        for window in windows {
            if let Err(err) = window.parse() {
                warnings.push(PlannerWarning::for_node(
                    node.id.clone(),
                    format!("Invalid execution window: {err}"),
                    WarningSeverity::Error,
                ));
            }
        }

        if node.timeout_seconds <= 0 {
            warnings.push(PlannerWarning::for_node(
                node.id.clone(),
                format!("Non-positive timeout_seconds ({})", node.timeout_seconds),
                WarningSeverity::Warning,
            ));
        }
        if node.sla_window_minutes <= 0 {
            warnings.push(PlannerWarning::for_node(
                node.id.clone(),
                format!(
                    "Non-positive sla_window_minutes ({})",
                    node.sla_window_minutes
                ),
                WarningSeverity::Warning,
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Wave assignment
// ---------------------------------------------------------------------------

/// Assign every node to a wave.
///
/// Bookkeeping is an arena: the node slice itself plus a parallel
/// remaining-dependency counter per position. Counters only count
/// dependencies that resolve to a node in the graph; absent references are
/// satisfied from the start.
fn assign_waves(
    nodes: &[PolicyNode],
    request: &PlanRequest,
    warnings: &mut Vec<PlannerWarning>,
) -> Vec<PolicyPlanStep> {
    let index_of = index_by_id(nodes);
    let stats = degree_stats(nodes);
    let cap = request.requested_concurrency.max(1);

    // remaining[p] = unscheduled in-graph dependencies of position p.
    let mut remaining: Vec<usize> = nodes
        .iter()
        .map(|n| {
            n.depends_on
                .iter()
                .filter(|d| index_of.contains_key(d))
                .count()
        })
        .collect();

    // dependents[p] = positions that declare a dependency on position p.
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (pos, node) in nodes.iter().enumerate() {
        for dep in &node.depends_on {
            if let Some(&dep_pos) = index_of.get(dep) {
                dependents[dep_pos].push(pos);
            }
        }
    }

    let mut scheduled = vec![false; nodes.len()];
    let mut unscheduled = nodes.len();
    let mut steps = Vec::new();

    while unscheduled > 0 {
        let order = steps.len();

        let mut ready: Vec<usize> = (0..nodes.len())
            .filter(|&p| !scheduled[p] && remaining[p] == 0)
            .collect();

        // Fewer blocking dependencies first, then higher fan-out, then id
        // as a deterministic tiebreaker.
        ready.sort_by(|&a, &b| {
            let sa = &stats[&nodes[a].id];
            let sb = &stats[&nodes[b].id];
            sa.in_degree
                .cmp(&sb.in_degree)
                .then(sb.out_degree.cmp(&sa.out_degree))
                .then(nodes[a].id.cmp(&nodes[b].id))
        });
        ready.truncate(cap);

        if ready.is_empty() {
            // Total deadlock, typically a cycle that survived to this
            // point. Force one stuck node through so the loop terminates.
            let stuck = (0..nodes.len())
                .find(|&p| !scheduled[p])
                .unwrap_or_default();
            tracing::warn!(node = %nodes[stuck].id, wave = order, "deadlock break");
            warnings.push(PlannerWarning::for_node(
                nodes[stuck].id.clone(),
                format!(
                    "Deadlock break: forcing node '{}' into wave {order}",
                    nodes[stuck].id
                ),
                WarningSeverity::Warning,
            ));
            ready.push(stuck);
        }

        let estimated_latency_ms = ready
            .iter()
            .fold(0i64, |acc, &p| acc.saturating_add(nodes[p].timeout_budget_ms()));

        for &p in &ready {
            scheduled[p] = true;
            unscheduled -= 1;
            for &dependent in &dependents[p] {
                remaining[dependent] = remaining[dependent].saturating_sub(1);
            }
        }

        if let Some(budget) = request.max_latency_ms {
            if estimated_latency_ms > budget {
                warnings.push(PlannerWarning::graph_level(
                    format!(
                        "Wave {order} estimated latency {estimated_latency_ms} ms exceeds budget {budget} ms"
                    ),
                    WarningSeverity::Warning,
                ));
            }
        }

        steps.push(PolicyPlanStep {
            batch_id: BatchId::from_order(order),
            node_ids: ready.iter().map(|&p| nodes[p].id.clone()).collect(),
            order,
            concurrency: cap,
            estimated_latency_ms,
        });
    }

    steps
}

/// Position of each node id; on duplicate ids the first occurrence wins.
fn index_by_id(nodes: &[PolicyNode]) -> HashMap<&NodeId, usize> {
    let mut index = HashMap::with_capacity(nodes.len());
    for (pos, node) in nodes.iter().enumerate() {
        index.entry(&node.id).or_insert(pos);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use poe_core::{ArtifactId, PolicyArtifact};

    fn node(id: &str, deps: &[&str]) -> PolicyNode {
        let artifact =
            PolicyArtifact::new(ArtifactId::new(format!("art-{id}")), format!("a-{id}"), "allow");
        let mut n = PolicyNode::new(NodeId::new(id), artifact);
        n.depends_on = deps.iter().map(|d| NodeId::new(*d)).collect();
        n
    }

    fn request(nodes: Vec<PolicyNode>, concurrency: usize) -> PlanRequest {
        PlanRequest {
            orchestrator_id: OrchestratorId::new("test-orch"),
            graph: PolicyGraph::from_nodes(nodes),
            requested_concurrency: concurrency,
            max_latency_ms: None,
        }
    }

    #[test]
    fn empty_graph_yields_empty_draft_plan() {
        let outcome = plan_policy_graph(&request(Vec::new(), 4));
        assert!(outcome.plan.steps.is_empty());
        assert_eq!(outcome.plan.revision, 0);
        assert_eq!(outcome.plan.state, OrchestrationState::Draft);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn five_independent_nodes_concurrency_three() {
        let nodes = vec![
            node("n1", &[]),
            node("n2", &[]),
            node("n3", &[]),
            node("n4", &[]),
            node("n5", &[]),
        ];
        let outcome = plan_policy_graph(&request(nodes, 3));
        assert_eq!(outcome.plan.steps.len(), 2);
        assert_eq!(outcome.plan.steps[0].node_ids.len(), 3);
        assert_eq!(outcome.plan.steps[1].node_ids.len(), 2);
        assert_eq!(outcome.plan.state, OrchestrationState::Draft);
        assert_eq!(outcome.plan.revision, 1);
    }

    #[test]
    fn diamond_plans_in_dependency_order() {
        let nodes = vec![
            node("A", &[]),
            node("B", &["A"]),
            node("C", &["A"]),
            node("D", &["B", "C"]),
        ];
        let outcome = plan_policy_graph(&request(nodes, 4));
        let waves: Vec<Vec<&str>> = outcome
            .plan
            .steps
            .iter()
            .map(|s| s.node_ids.iter().map(NodeId::as_str).collect())
            .collect();
        assert_eq!(waves, vec![vec!["A"], vec!["B", "C"], vec!["D"]]);
    }

    #[test]
    fn cycle_degrades_plan_with_circular_dependency_warning() {
        let nodes = vec![node("A", &["B"]), node("B", &["A"])];
        let outcome = plan_policy_graph(&request(nodes, 2));

        assert_eq!(outcome.plan.state, OrchestrationState::Degraded);
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.message.contains("Circular dependency")
                && w.severity == WarningSeverity::Error));
        // Both nodes still scheduled — planning terminated with a
        // best-effort plan.
        assert_eq!(outcome.plan.node_count(), 2);
    }

    #[test]
    fn cycle_triggers_deadlock_break() {
        let nodes = vec![node("A", &["B"]), node("B", &["A"])];
        let outcome = plan_policy_graph(&request(nodes, 2));
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.message.contains("Deadlock break")
                && w.severity == WarningSeverity::Warning));
    }

    #[test]
    fn dangling_dependency_is_satisfied() {
        let nodes = vec![node("A", &["ghost"]), node("B", &["A"])];
        let outcome = plan_policy_graph(&request(nodes, 2));
        assert_eq!(outcome.plan.steps.len(), 2);
        assert_eq!(outcome.plan.steps[0].node_ids, vec![NodeId::new("A")]);
        assert_eq!(outcome.plan.state, OrchestrationState::Draft);
    }

    #[test]
    fn invalid_window_degrades_plan() {
        let artifact = PolicyArtifact::new(ArtifactId::new("a"), "windowed", "allow")
            .with_window(TimeWindow::new("garbage", "2026-01-01T00:00:00Z"));
        let nodes = vec![PolicyNode::new(NodeId::new("w"), artifact)];
        let outcome = plan_policy_graph(&request(nodes, 1));

        assert_eq!(outcome.plan.state, OrchestrationState::Degraded);
        let w = outcome
            .warnings
            .iter()
            .find(|w| w.message.contains("Invalid execution window"))
            .expect("window warning");
        assert_eq!(w.severity, WarningSeverity::Error);
        assert_eq!(w.node_id, Some(NodeId::new("w")));
        // The node is still planned.
        assert_eq!(outcome.plan.node_count(), 1);
    }

    #[test]
    fn missing_windows_fall_back_to_all_time() {
        let outcome = plan_policy_graph(&request(vec![node("A", &[])], 1));
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.plan.state, OrchestrationState::Draft);
    }

    #[test]
    fn non_positive_settings_warn_without_degrading() {
        let nodes = vec![node("A", &[])
            .with_timeout_seconds(0)
            .with_sla_window_minutes(-5)];
        let outcome = plan_policy_graph(&request(nodes, 1));

        assert_eq!(outcome.plan.state, OrchestrationState::Draft);
        assert_eq!(outcome.warnings.len(), 2);
        assert!(outcome
            .warnings
            .iter()
            .all(|w| w.severity == WarningSeverity::Warning));
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.message.contains("timeout_seconds")));
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.message.contains("sla_window_minutes")));
    }

    #[test]
    fn wave_latency_is_serial_sum_of_timeouts() {
        let nodes = vec![
            node("A", &[]).with_timeout_seconds(30),
            node("B", &[]).with_timeout_seconds(45),
        ];
        let outcome = plan_policy_graph(&request(nodes, 2));
        assert_eq!(outcome.plan.steps.len(), 1);
        assert_eq!(outcome.plan.steps[0].estimated_latency_ms, 75_000);
    }

    #[test]
    fn latency_budget_overrun_warns() {
        let nodes = vec![
            node("A", &[]).with_timeout_seconds(30),
            node("B", &[]).with_timeout_seconds(45),
        ];
        let mut req = request(nodes, 2);
        req.max_latency_ms = Some(60_000);
        let outcome = plan_policy_graph(&req);

        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.message.contains("exceeds budget")
                && w.severity == WarningSeverity::Warning));
        assert_eq!(outcome.plan.state, OrchestrationState::Draft);
    }

    #[test]
    fn zero_concurrency_clamps_to_one() {
        let nodes = vec![node("A", &[]), node("B", &[])];
        let outcome = plan_policy_graph(&request(nodes, 0));
        assert_eq!(outcome.plan.steps.len(), 2);
        assert!(outcome.plan.steps.iter().all(|s| s.node_ids.len() == 1));
        assert!(outcome.plan.steps.iter().all(|s| s.concurrency == 1));
    }

    #[test]
    fn fan_out_prioritized_within_a_wave() {
        // "hub" feeds two dependents, "leaf" feeds none; both are ready in
        // wave 0, hub should be taken first under a cap of 1.
        let nodes = vec![
            node("leaf", &[]),
            node("hub", &[]),
            node("x", &["hub"]),
            node("y", &["hub"]),
        ];
        let outcome = plan_policy_graph(&request(nodes, 1));
        assert_eq!(outcome.plan.steps[0].node_ids, vec![NodeId::new("hub")]);
    }

    #[test]
    fn batch_ids_follow_wave_order() {
        let nodes = vec![node("A", &[]), node("B", &["A"])];
        let outcome = plan_policy_graph(&request(nodes, 1));
        assert_eq!(outcome.plan.steps[0].batch_id.as_str(), "batch-0");
        assert_eq!(outcome.plan.steps[1].batch_id.as_str(), "batch-1");
        assert_eq!(outcome.plan.steps[1].order, 1);
    }

    // ── Property tests ─────────────────────────────────────────────

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        /// Arbitrary dependency structures, cycles and self-loops
        /// included: node `i` may depend on any node in the graph.
        fn arb_graph() -> impl Strategy<Value = Vec<PolicyNode>> {
            prop::collection::vec(
                prop::collection::vec(any::<prop::sample::Index>(), 0..4),
                1..10,
            )
            .prop_map(|shape| {
                let n = shape.len();
                shape.iter()
                    .enumerate()
                    .map(|(i, deps)| {
                        let chosen: BTreeSet<usize> =
                            deps.iter().map(|ix| ix.index(n)).collect();
                        let dep_names: Vec<String> =
                            chosen.into_iter().map(|d| format!("n{d}")).collect();
                        node(
                            &format!("n{i}"),
                            &dep_names.iter().map(String::as_str).collect::<Vec<_>>(),
                        )
                    })
                    .collect()
            })
        }

        proptest! {
            /// Planning terminates and schedules every node exactly once,
            /// no matter how tangled the dependency structure is.
            #[test]
            fn every_node_scheduled_exactly_once(nodes in arb_graph()) {
                let all: BTreeSet<NodeId> = nodes.iter().map(|n| n.id.clone()).collect();
                let outcome = plan_policy_graph(&request(nodes, 3));

                let mut seen = BTreeSet::new();
                for step in &outcome.plan.steps {
                    for id in &step.node_ids {
                        prop_assert!(seen.insert(id.clone()), "node {id} scheduled twice");
                    }
                }
                prop_assert_eq!(seen, all);
            }

            /// Waves never exceed the effective concurrency cap.
            #[test]
            fn waves_respect_the_cap(nodes in arb_graph(), cap in 0usize..5) {
                let outcome = plan_policy_graph(&request(nodes, cap));
                let effective = cap.max(1);
                for step in &outcome.plan.steps {
                    prop_assert!(step.node_ids.len() <= effective);
                }
            }
        }
    }

    #[test]
    fn self_dependency_is_broken_not_fatal() {
        let nodes = vec![node("A", &["A"])];
        let outcome = plan_policy_graph(&request(nodes, 1));
        assert_eq!(outcome.plan.node_count(), 1);
        assert_eq!(outcome.plan.state, OrchestrationState::Degraded);
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.message.contains("Circular dependency")));
    }
}
