//! # Topology Compiler
//!
//! Kahn-style in-degree peeling over a node collection. Each node's
//! counter starts at the size of its `depends_on` list; zero-degree nodes
//! seed the ready set; emitting a layer decrements the counters of the
//! emitted nodes' dependents, and any counter reaching zero joins the next
//! layer. Nodes never reached — cycle members, and nodes whose references
//! never resolve — are absent from the waves. The compiler does not raise
//! for them; the planner surfaces cycles with its own recovery semantics.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use poe_core::{NodeId, PolicyNode};

// ---------------------------------------------------------------------------
// Topology
// ---------------------------------------------------------------------------

/// The compiled structure of a policy graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    /// Dependency layers: wave *k* nodes depend only on waves before *k*.
    /// Node ids within a wave are sorted for determinism.
    pub waves: Vec<Vec<NodeId>>,
    /// Nodes whose every dependency reference is dangling.
    pub orphan_count: usize,
    /// Structural level per node: `depends_on.len()`, not BFS depth.
    pub levels: BTreeMap<NodeId, usize>,
}

/// Structural in/out degree of one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegreeStats {
    /// Number of declared dependencies.
    pub in_degree: usize,
    /// Number of nodes in the graph that depend on this node.
    pub out_degree: usize,
}

/// A deduplicated reporting edge with its weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedEdge {
    /// The prerequisite node.
    pub from: NodeId,
    /// The dependent node.
    pub to: NodeId,
    /// The dependent node's timeout budget in milliseconds.
    pub weight_ms: i64,
}

// ---------------------------------------------------------------------------
// TopologyCompiler
// ---------------------------------------------------------------------------

/// Compiles a node collection into waves and structural statistics.
#[derive(Debug, Default)]
pub struct TopologyCompiler {
    nodes: Vec<PolicyNode>,
}

impl TopologyCompiler {
    /// Create a compiler over the given node collection.
    pub fn new(nodes: Vec<PolicyNode>) -> Self {
        Self { nodes }
    }

    /// Replace the node collection wholesale.
    pub fn replace_nodes(&mut self, nodes: Vec<PolicyNode>) {
        self.nodes = nodes;
    }

    /// The current node collection.
    pub fn nodes(&self) -> &[PolicyNode] {
        &self.nodes
    }

    /// Compile the collection into waves, orphan count, and levels.
    pub fn compile(&self) -> Topology {
        Topology {
            waves: peel_waves(&self.nodes),
            orphan_count: count_orphans(&self.nodes),
            levels: compute_node_levels(&self.nodes),
        }
    }
}

/// Layer the nodes by in-degree peeling.
fn peel_waves(nodes: &[PolicyNode]) -> Vec<Vec<NodeId>> {
    if nodes.is_empty() {
        return Vec::new();
    }

    // In-degree counter per node position; literally the size of the
    // depends_on list, unresolved references included. A node whose
    // references never resolve keeps a positive counter and stays out of
    // every wave.
    let mut in_degree: Vec<usize> = nodes.iter().map(|n| n.depends_on.len()).collect();

    // Dependents adjacency: prerequisite id -> positions that declare it.
    let mut dependents: HashMap<&NodeId, Vec<usize>> = HashMap::new();
    for (pos, node) in nodes.iter().enumerate() {
        for dep in &node.depends_on {
            dependents.entry(dep).or_default().push(pos);
        }
    }

    let mut waves = Vec::new();
    let mut current: Vec<usize> = (0..nodes.len()).filter(|&p| in_degree[p] == 0).collect();

    while !current.is_empty() {
        // Sort by node id for determinism.
        current.sort_by(|&a, &b| nodes[a].id.cmp(&nodes[b].id));
        waves.push(current.iter().map(|&p| nodes[p].id.clone()).collect());

        let mut next = Vec::new();
        for &pos in &current {
            if let Some(deps) = dependents.get(&nodes[pos].id) {
                for &dep_pos in deps {
                    in_degree[dep_pos] -= 1;
                    if in_degree[dep_pos] == 0 {
                        next.push(dep_pos);
                    }
                }
            }
        }
        current = next;
    }

    waves
}

/// Count nodes whose every `depends_on` entry is absent from the graph.
fn count_orphans(nodes: &[PolicyNode]) -> usize {
    let known: BTreeSet<&NodeId> = nodes.iter().map(|n| &n.id).collect();
    nodes
        .iter()
        .filter(|n| !n.depends_on.is_empty() && n.depends_on.iter().all(|d| !known.contains(d)))
        .count()
}

/// Structural level per node: the size of its `depends_on` list.
///
/// This is deliberately NOT the BFS layer depth — it is an informational
/// ranking statistic kept distinct from the wave index.
pub fn compute_node_levels(nodes: &[PolicyNode]) -> BTreeMap<NodeId, usize> {
    nodes
        .iter()
        .map(|n| (n.id.clone(), n.depends_on.len()))
        .collect()
}

/// Structural in/out degree per node.
///
/// `in_degree` counts declared dependencies (resolved or not);
/// `out_degree` counts dependents present in the graph.
pub fn degree_stats(nodes: &[PolicyNode]) -> BTreeMap<NodeId, DegreeStats> {
    let mut stats: BTreeMap<NodeId, DegreeStats> = nodes
        .iter()
        .map(|n| {
            (
                n.id.clone(),
                DegreeStats {
                    in_degree: n.depends_on.len(),
                    out_degree: 0,
                },
            )
        })
        .collect();

    for node in nodes {
        for dep in &node.depends_on {
            if let Some(s) = stats.get_mut(dep) {
                s.out_degree += 1;
            }
        }
    }
    stats
}

/// Build the deduplicated reporting edge set, keyed `from -> to`, with the
/// target node's timeout budget as the weight.
pub fn materialize_edges(nodes: &[PolicyNode]) -> Vec<WeightedEdge> {
    let budgets: BTreeMap<&NodeId, i64> = nodes
        .iter()
        .map(|n| (&n.id, n.timeout_budget_ms()))
        .collect();

    let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
    let mut edges = Vec::new();
    for node in nodes {
        for dep in &node.depends_on {
            if !budgets.contains_key(dep) {
                continue;
            }
            if seen.insert((dep.0.clone(), node.id.0.clone())) {
                edges.push(WeightedEdge {
                    from: dep.clone(),
                    to: node.id.clone(),
                    weight_ms: node.timeout_budget_ms(),
                });
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use poe_core::{ArtifactId, PolicyArtifact};
    use proptest::prelude::*;

    fn node(id: &str, deps: &[&str]) -> PolicyNode {
        let artifact =
            PolicyArtifact::new(ArtifactId::new(format!("art-{id}")), format!("a-{id}"), "allow");
        let mut n = PolicyNode::new(NodeId::new(id), artifact);
        n.depends_on = deps.iter().map(|d| NodeId::new(*d)).collect();
        n
    }

    #[test]
    fn empty_collection_compiles_to_nothing() {
        let topo = TopologyCompiler::new(Vec::new()).compile();
        assert!(topo.waves.is_empty());
        assert_eq!(topo.orphan_count, 0);
        assert!(topo.levels.is_empty());
    }

    #[test]
    fn chain_layers_one_per_wave() {
        let topo =
            TopologyCompiler::new(vec![node("a", &[]), node("b", &["a"]), node("c", &["b"])])
                .compile();
        assert_eq!(
            topo.waves,
            vec![
                vec![NodeId::new("a")],
                vec![NodeId::new("b")],
                vec![NodeId::new("c")],
            ]
        );
    }

    #[test]
    fn diamond_compiles_to_three_waves() {
        // A -> B, A -> C, B -> D, C -> D
        let topo = TopologyCompiler::new(vec![
            node("A", &[]),
            node("B", &["A"]),
            node("C", &["A"]),
            node("D", &["B", "C"]),
        ])
        .compile();
        assert_eq!(
            topo.waves,
            vec![
                vec![NodeId::new("A")],
                vec![NodeId::new("B"), NodeId::new("C")],
                vec![NodeId::new("D")],
            ]
        );
    }

    #[test]
    fn cycle_members_are_unreached() {
        let topo = TopologyCompiler::new(vec![
            node("root", &[]),
            node("x", &["y"]),
            node("y", &["x"]),
        ])
        .compile();
        assert_eq!(topo.waves, vec![vec![NodeId::new("root")]]);
    }

    #[test]
    fn orphan_detection() {
        let nodes = vec![
            node("a", &[]),
            node("b", &["ghost"]),          // orphan: every dep dangling
            node("c", &["a", "phantom"]),   // not an orphan: one dep resolves
        ];
        let topo = TopologyCompiler::new(nodes).compile();
        assert_eq!(topo.orphan_count, 1);
    }

    #[test]
    fn levels_are_structural_not_depth() {
        let nodes = vec![node("a", &[]), node("b", &["a"]), node("c", &["a", "b"])];
        let levels = compute_node_levels(&nodes);
        // "c" is at BFS depth 2 but structural level 2 as well only by
        // coincidence of this shape; "b" is depth 1 and level 1. A node
        // with two root deps would be depth 1 but level 2.
        assert_eq!(levels[&NodeId::new("a")], 0);
        assert_eq!(levels[&NodeId::new("b")], 1);
        assert_eq!(levels[&NodeId::new("c")], 2);

        let wide = vec![node("r1", &[]), node("r2", &[]), node("m", &["r1", "r2"])];
        let wide_levels = compute_node_levels(&wide);
        let wide_waves = TopologyCompiler::new(wide).compile().waves;
        assert_eq!(wide_levels[&NodeId::new("m")], 2); // structural level
        assert_eq!(wide_waves.len(), 2); // but BFS depth is 1
    }

    #[test]
    fn degree_stats_count_both_directions() {
        let nodes = vec![node("a", &[]), node("b", &["a"]), node("c", &["a"])];
        let stats = degree_stats(&nodes);
        assert_eq!(stats[&NodeId::new("a")].in_degree, 0);
        assert_eq!(stats[&NodeId::new("a")].out_degree, 2);
        assert_eq!(stats[&NodeId::new("b")].in_degree, 1);
        assert_eq!(stats[&NodeId::new("b")].out_degree, 0);
    }

    #[test]
    fn edges_deduplicated_and_weighted_by_target() {
        let nodes = vec![
            node("a", &[]),
            node("b", &["a", "a"]).with_timeout_seconds(30),
            node("c", &["missing"]),
        ];
        let edges = materialize_edges(&nodes);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from, NodeId::new("a"));
        assert_eq!(edges[0].to, NodeId::new("b"));
        assert_eq!(edges[0].weight_ms, 30_000);
    }

    #[test]
    fn replace_nodes_recompiles() {
        let mut compiler = TopologyCompiler::new(vec![node("a", &[])]);
        assert_eq!(compiler.compile().waves.len(), 1);
        compiler.replace_nodes(vec![node("x", &[]), node("y", &["x"])]);
        assert_eq!(compiler.compile().waves.len(), 2);
        assert_eq!(compiler.nodes().len(), 2);
    }

    // ── Property tests ─────────────────────────────────────────────

    /// Random DAGs: node `i` may depend only on nodes with smaller index,
    /// so the graph is cycle-free by construction.
    fn arb_dag() -> impl Strategy<Value = Vec<PolicyNode>> {
        prop::collection::vec(prop::collection::vec(any::<prop::sample::Index>(), 0..4), 1..12)
            .prop_map(|spec| {
                spec.iter()
                    .enumerate()
                    .map(|(i, deps)| {
                        let mut chosen: BTreeSet<usize> =
                            deps.iter().filter(|_| i > 0).map(|ix| ix.index(i)).collect();
                        chosen.remove(&i);
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
        #[test]
        fn waves_partition_the_node_set(nodes in arb_dag()) {
            let all: BTreeSet<NodeId> = nodes.iter().map(|n| n.id.clone()).collect();
            let topo = TopologyCompiler::new(nodes).compile();

            let mut seen = BTreeSet::new();
            for wave in &topo.waves {
                for id in wave {
                    prop_assert!(seen.insert(id.clone()), "duplicate node {id} across waves");
                }
            }
            prop_assert_eq!(seen, all);
        }

        #[test]
        fn dependencies_land_in_earlier_waves(nodes in arb_dag()) {
            let deps_of: BTreeMap<NodeId, Vec<NodeId>> = nodes
                .iter()
                .map(|n| (n.id.clone(), n.depends_on.clone()))
                .collect();
            let topo = TopologyCompiler::new(nodes).compile();

            let mut wave_of: BTreeMap<&NodeId, usize> = BTreeMap::new();
            for (k, wave) in topo.waves.iter().enumerate() {
                for id in wave {
                    wave_of.insert(id, k);
                }
            }
            for (id, deps) in &deps_of {
                for dep in deps {
                    prop_assert!(wave_of[&dep] < wave_of[&id],
                        "dependency {} of {} not in an earlier wave", dep, id);
                }
            }
        }
    }
}
