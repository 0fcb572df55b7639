//! # Plan Simulator
//!
//! Replays a compiled plan against synthetic request contexts. Each
//! (step, node, context) triple becomes one [`PolicySimulationPoint`];
//! per-node aggregates carry the success ratio and latency percentiles.
//!
//! Iteration order — steps, then member nodes, then contexts — is part of
//! the contract: it determines which evaluation populates the decision
//! cache first, and reordering would be observable through the cache-hit
//! flags.

use std::collections::HashMap;
use std::time::Instant;

use thiserror::Error;

use poe_core::{
    EvaluationRequest, ExpressionEngine, ExpressionError, NodeId, PolicyContextSpec,
    PolicyDecision, PolicyNode, PolicyPlan, PolicyPlanStep, PolicySimulationPoint,
    PolicySimulationResult,
};

use crate::cache::{CacheFingerprint, DecisionCache};
use crate::percentiles::latency_stats;

/// Length of the expression snippet carried in rationale strings.
const SNIPPET_LEN: usize = 64;

/// A failure during plan simulation.
///
/// Unlike the planner, the simulator fails fast: a malformed expression
/// aborts the whole run and propagates to the caller.
#[derive(Debug, Clone, Error)]
pub enum SimulationError {
    /// An artifact's expression could not be parsed.
    #[error("expression rejected during simulation: {0}")]
    Expression(#[from] ExpressionError),
}

/// Simulate one node of one wave against one context.
///
/// Parses the node's artifact expression (propagating parse failures),
/// consults the decision cache, and evaluates through the external engine
/// only on a miss. The returned point carries the verdict, rationale
/// strings, elapsed wall-clock time, and the cache-hit flag.
///
/// # Errors
///
/// Returns [`SimulationError::Expression`] if the expression is malformed.
pub fn simulate_step<E: ExpressionEngine>(
    engine: &E,
    step: &PolicyPlanStep,
    node: &PolicyNode,
    context: &PolicyContextSpec,
    cache: &mut DecisionCache,
) -> Result<PolicySimulationPoint, SimulationError> {
    let started = Instant::now();

    let handle = engine.parse(&node.artifact.expression)?;
    let fingerprint = CacheFingerprint::compute(&node.artifact.expression, context);

    let (verdict, cache_hit) = match cache.lookup(&fingerprint, Instant::now()) {
        Some(cached) => {
            tracing::debug!(node = %node.id, "decision cache hit");
            (cached, true)
        }
        None => {
            let verdict = engine.evaluate(&[handle], &EvaluationRequest::from(context));
            cache.insert(fingerprint, verdict, Instant::now());
            (verdict, false)
        }
    };

    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    let snippet: String = node.artifact.expression.chars().take(SNIPPET_LEN).collect();

    Ok(PolicySimulationPoint {
        node_id: node.id.clone(),
        batch_id: step.batch_id.clone(),
        decision: PolicyDecision {
            allowed: verdict.is_allow(),
            rationale: vec![
                format!("verdict={verdict}"),
                format!("wave={}", step.order),
                format!("batch={}", step.batch_id),
                format!("cache_hit={cache_hit}"),
                format!("expression={snippet}"),
            ],
        },
        elapsed_ms,
        cache_hit,
    })
}

/// Replay a plan against a list of contexts.
///
/// Returns one [`PolicySimulationResult`] per node touched by the plan, in
/// first-touch order. The decision cache lives exactly as long as this
/// call. Node ids the plan references but `nodes` does not contain are
/// skipped with a warning — a degraded plan can legitimately reference
/// more than the caller simulates.
///
/// # Errors
///
/// Fails fast on the first malformed expression.
pub fn run_plan_simulation<E: ExpressionEngine>(
    engine: &E,
    plan: &PolicyPlan,
    nodes: &[PolicyNode],
    contexts: &[PolicyContextSpec],
) -> Result<Vec<PolicySimulationResult>, SimulationError> {
    let node_of: HashMap<&NodeId, &PolicyNode> = nodes.iter().map(|n| (&n.id, n)).collect();

    let mut cache = DecisionCache::new();
    let mut touch_order: Vec<NodeId> = Vec::new();
    let mut points_of: HashMap<NodeId, Vec<PolicySimulationPoint>> = HashMap::new();

    for step in &plan.steps {
        for node_id in &step.node_ids {
            let Some(&node) = node_of.get(node_id) else {
                tracing::warn!(node = %node_id, "plan references a node missing from simulation input");
                continue;
            };
            for context in contexts {
                let point = simulate_step(engine, step, node, context, &mut cache)?;
                points_of
                    .entry(node_id.clone())
                    .or_insert_with(|| {
                        touch_order.push(node_id.clone());
                        Vec::new()
                    })
                    .push(point);
            }
        }
    }

    let mut results = Vec::with_capacity(touch_order.len());
    for node_id in touch_order {
        let outcomes = points_of.remove(&node_id).unwrap_or_default();
        let total = outcomes.len();
        let allowed = outcomes.iter().filter(|p| p.decision.allowed).count();
        let success_ratio = if total == 0 {
            0.0
        } else {
            allowed as f64 / total as f64
        };
        let samples: Vec<f64> = outcomes.iter().map(|p| p.elapsed_ms).collect();
        results.push(PolicySimulationResult {
            node_id,
            outcomes,
            success_ratio,
            latency: latency_stats(&samples),
        });
    }

    Ok(results)
}
