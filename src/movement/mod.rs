//! Movement AI (§4.3–§4.5): the three `decide_*` procedures offensive
//! vehicle groups, anti-aircraft groups and support units use each turn.

pub mod antiaircraft;
pub mod offensive;
pub mod support;

use std::collections::HashSet;

use crate::core::types::NodeId;
use crate::graph::Graph;

/// Detour-pruning ratio from §4.3 step 4: a candidate first step is
/// forbidden if an alternative reaches the same eventual common node for
/// 1/1.33 or less of its cost.
pub const DETOUR_RATIO: f64 = 1.33;

/// Neighbor enumeration, detour pruning and backtrack filtering shared by
/// `decide_move` (§4.3 steps 2,4,5) and `decide_aa_move` (§4.4 step 3). Does
/// not perform the final random/argmax pick, nor either procedure's early
/// short-circuit — callers handle those themselves.
///
/// Returns `(candidate_first_step, full_path_to_target)` pairs that survive
/// pruning.
pub fn candidate_steps(graph: &Graph, current: NodeId, target: NodeId) -> Vec<(NodeId, Vec<NodeId>)> {
    let mut candidates: Vec<(NodeId, Vec<NodeId>)> = Vec::new();
    for v in graph.neighbors(current) {
        if let Some(path) = graph.shortest_path(v, target, Some(current)) {
            candidates.push((v, path));
        }
    }

    if candidates.len() <= 1 {
        return filter_backtracking(graph, current, target, candidates);
    }

    let mut forbidden: HashSet<NodeId> = HashSet::new();
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let (vi, pi) = &candidates[i];
            let (vj, pj) = &candidates[j];
            let Some(common) = earliest_common_node(pi, pj) else {
                continue;
            };
            let wi = path_weight(graph, &truncate_at(pi, common));
            let wj = path_weight(graph, &truncate_at(pj, common));
            if wi >= DETOUR_RATIO * wj {
                forbidden.insert(*vi);
            } else if wj >= DETOUR_RATIO * wi {
                forbidden.insert(*vj);
            }
        }
    }
    let surviving: Vec<(NodeId, Vec<NodeId>)> = candidates
        .into_iter()
        .filter(|(v, _)| !forbidden.contains(v))
        .collect();

    filter_backtracking(graph, current, target, surviving)
}

/// §4.3 step 5: drop candidates strictly farther from `target` than `current`
/// is, unless that would discard every candidate.
fn filter_backtracking(
    graph: &Graph,
    current: NodeId,
    target: NodeId,
    candidates: Vec<(NodeId, Vec<NodeId>)>,
) -> Vec<(NodeId, Vec<NodeId>)> {
    let (Some(target_coord), Some(current_coord)) = (
        graph.node(target).map(|n| n.coord),
        graph.node(current).map(|n| n.coord),
    ) else {
        return candidates;
    };
    let current_dist = current_coord.distance(&target_coord);

    let non_backtracking: Vec<(NodeId, Vec<NodeId>)> = candidates
        .iter()
        .filter(|(v, _)| {
            let Some(vc) = graph.node(*v).map(|n| n.coord) else {
                return false;
            };
            vc.distance(&target_coord) <= current_dist
        })
        .cloned()
        .collect();

    if non_backtracking.is_empty() {
        candidates
    } else {
        non_backtracking
    }
}

fn earliest_common_node(pi: &[NodeId], pj: &[NodeId]) -> Option<NodeId> {
    let set_j: HashSet<NodeId> = pj.iter().copied().collect();
    pi.iter().copied().find(|n| set_j.contains(n))
}

fn truncate_at(path: &[NodeId], common: NodeId) -> Vec<NodeId> {
    match path.iter().position(|&n| n == common) {
        Some(idx) => path[..=idx].to_vec(),
        None => path.to_vec(),
    }
}

fn path_weight(graph: &Graph, path: &[NodeId]) -> f64 {
    path.windows(2)
        .map(|w| graph.edge_weight(w[0], w[1]).unwrap_or(0.0))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Point;

    /// Diamond from §8 scenario 2: two routes from (0,0) to (20,10), one a
    /// direct hop, the other a long detour through (0,10).
    fn diamond_graph() -> (Graph, NodeId, NodeId) {
        let mut g = Graph::new();
        let start = NodeId(0);
        let short_hop = NodeId(1);
        let long_hop = NodeId(2);
        let target = NodeId(3);
        g.add_node(start, Point::new(0.0, 0.0), false);
        g.add_node(short_hop, Point::new(10.0, 0.0), false);
        g.add_node(long_hop, Point::new(0.0, 10.0), false);
        g.add_node(target, Point::new(20.0, 10.0), false);
        g.add_edge(start, short_hop, 10.0);
        g.add_edge(short_hop, target, 10.0);
        g.add_edge(start, long_hop, 10.0);
        g.add_edge(long_hop, target, 40.0);
        (g, start, target)
    }

    #[test]
    fn detour_pruning_forbids_longer_first_step() {
        let (graph, start, target) = diamond_graph();
        let candidates = candidate_steps(&graph, start, target);
        let firsts: Vec<NodeId> = candidates.iter().map(|(v, _)| *v).collect();
        assert!(firsts.contains(&NodeId(1)));
        assert!(!firsts.contains(&NodeId(2)), "the 50-weight detour should be pruned");
    }
}
