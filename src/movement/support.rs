//! §4.5: `decide_support_move`, the infantry-ferry procedure.

use std::collections::{BTreeMap, HashMap};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::types::{Coalition, GroupId, NodeId};
use crate::entities::Group;
use crate::graph::Graph;
use crate::map::{InfantryRecord, Map};

fn infantry_count(infantry_in_nodes: &std::collections::HashMap<NodeId, InfantryRecord>, node: NodeId, c: Coalition) -> u32 {
    infantry_in_nodes
        .get(&node)
        .map(|rec| match c {
            Coalition::Red => rec.red,
            Coalition::Blue => rec.blue,
            Coalition::Neutral => 0,
        })
        .unwrap_or(0)
}

/// Ferries infantry outward from `own_base` one ring at a time. Returns the
/// node the support unit should reposition to, or `None` if no ring yields a
/// move (§4.5 step 7).
pub fn decide_support_move(
    graph: &Graph,
    map: &Map,
    groups: &HashMap<GroupId, Group>,
    own: Coalition,
    own_base: NodeId,
    current: NodeId,
    max_infantry: u32,
    rng: &mut impl Rng,
) -> Option<NodeId> {
    let hops_from_own_base = graph.hop_distances_from(own_base);
    let mut rings: BTreeMap<u32, Vec<NodeId>> = BTreeMap::new();
    for (&node, &d) in &hops_from_own_base {
        if d >= 1 {
            rings.entry(d).or_default().push(node);
        }
    }

    let needy_safe = |n: NodeId| -> bool {
        !map.is_enemy_activity_in_node(own, n, groups)
            && infantry_count(&map.infantry_in_nodes, n, own) <= max_infantry / 2
    };
    let has_room = |n: NodeId| -> bool {
        !map.is_enemy_activity_in_node(own, n, groups) && infantry_count(&map.infantry_in_nodes, n, own) < max_infantry
    };

    for (_d, mut nodes) in rings {
        nodes.shuffle(rng);
        let needy_safe_here: Vec<NodeId> = nodes.iter().copied().filter(|&n| needy_safe(n)).collect();

        // Step 3: optimal — needy-safe node adjacent to current.
        if let Some(&direct) = needy_safe_here.iter().find(|&&n| graph.are_adjacent(current, n)) {
            return Some(direct);
        }

        // Step 4: one-hop detour, needy-safe arrival at the intermediate hop.
        let mut via_needy_safe: Vec<NodeId> = Vec::new();
        for &n in &needy_safe_here {
            for nb in graph.neighbors(current) {
                if needy_safe(nb) && graph.are_adjacent(nb, n) {
                    via_needy_safe.push(nb);
                }
            }
        }
        if let Some(&chosen) = via_needy_safe.choose(rng) {
            return Some(chosen);
        }

        // Step 5: one-hop detour tolerating fuller (but not over-full) nodes.
        let mut via_has_room: Vec<NodeId> = Vec::new();
        for &n in &needy_safe_here {
            for nb in graph.neighbors(current) {
                if has_room(nb) && graph.are_adjacent(nb, n) {
                    via_has_room.push(nb);
                }
            }
        }
        if let Some(&chosen) = via_has_room.choose(rng) {
            return Some(chosen);
        }

        // Step 6: any needy-safe node at this ring, by shortest graph hops
        // from current; first after shuffle wins ties.
        let mut best: Option<(Vec<NodeId>, u32)> = None;
        for &n in &needy_safe_here {
            let Some(path) = graph.shortest_path(current, n, None) else {
                continue;
            };
            let len = path.len() as u32;
            if best.as_ref().map(|(_, bl)| len < *bl).unwrap_or(true) {
                best = Some((path, len));
            }
        }
        if let Some((path, _)) = best {
            if path.len() >= 2 {
                return Some(path[1]);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Point;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ring_graph() -> Graph {
        let mut g = Graph::new();
        g.add_node(NodeId(0), Point::new(0.0, 0.0), false);
        g.add_node(NodeId(1), Point::new(100.0, 0.0), false);
        g.add_node(NodeId(2), Point::new(200.0, 0.0), false);
        g.add_edge(NodeId(0), NodeId(1), 100.0);
        g.add_edge(NodeId(1), NodeId(2), 100.0);
        g
    }

    #[test]
    fn optimal_move_to_adjacent_needy_safe_node() {
        let g = ring_graph();
        let map = Map::new(g.clone());
        let groups = HashMap::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let decision = decide_support_move(&g, &map, &groups, Coalition::Red, NodeId(0), NodeId(0), 20, &mut rng);
        assert_eq!(decision, Some(NodeId(1)));
    }

    #[test]
    fn no_move_when_every_node_has_enemy_activity() {
        let g = ring_graph();
        let mut map = Map::new(g.clone());
        for node in [NodeId(1), NodeId(2)] {
            map.infantry_in_nodes.insert(node, InfantryRecord { red: 0, blue: 1 });
        }
        let groups = HashMap::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let decision = decide_support_move(&g, &map, &groups, Coalition::Red, NodeId(0), NodeId(0), 20, &mut rng);
        assert_eq!(decision, None);
    }
}
