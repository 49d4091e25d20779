//! §4.3: `decide_move` for offensive vehicle groups.

use rand::Rng;

use crate::core::types::NodeId;
use crate::graph::Graph;
use crate::movement::candidate_steps;

/// Eligible groups are category `"vehicle"`, not `__sg__`-tagged (the caller,
/// §4.7 step 15, filters `__sg__`/`__spaa__` before calling this).
///
/// Returns `None` when no path to `target` survives (a `GraphInconsistency`
/// condition per §7 — the caller drops the decision for this turn).
pub fn decide_move(graph: &Graph, current: NodeId, target: NodeId, rng: &mut impl Rng) -> Option<NodeId> {
    if current == target {
        return None;
    }
    if graph.are_adjacent(current, target) {
        return Some(target);
    }

    let candidates = candidate_steps(graph, current, target);
    if candidates.is_empty() {
        return None;
    }
    let idx = rng.gen_range(0..candidates.len());
    Some(candidates[idx].0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Point;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn line_graph() -> Graph {
        let mut g = Graph::new();
        g.add_node(NodeId(0), Point::new(0.0, 0.0), false);
        g.add_node(NodeId(1), Point::new(100.0, 0.0), false);
        g.add_edge(NodeId(0), NodeId(1), 100.0);
        g
    }

    #[test]
    fn two_node_trivial_returns_goal() {
        // §8 end-to-end scenario 1.
        let g = line_graph();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let decision = decide_move(&g, NodeId(0), NodeId(1), &mut rng);
        assert_eq!(decision, Some(NodeId(1)));
    }

    #[test]
    fn already_at_goal_is_no_decision() {
        let g = line_graph();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(decide_move(&g, NodeId(0), NodeId(0), &mut rng), None);
    }

    #[test]
    fn unreachable_goal_is_no_decision() {
        let mut g = line_graph();
        g.add_node(NodeId(2), Point::new(1000.0, 1000.0), false);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(decide_move(&g, NodeId(0), NodeId(2), &mut rng), None);
    }
}
