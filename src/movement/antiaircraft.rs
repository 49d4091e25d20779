//! §4.4: `decide_aa_move` for dynamic anti-aircraft groups.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::types::{Coalition, GroupId, NodeId};
use crate::entities::Group;
use crate::graph::Graph;
use crate::map::Map;
use crate::movement::candidate_steps;

fn node_balance(map: &Map, groups: &HashMap<GroupId, Group>, node: NodeId, own: Coalition) -> i64 {
    let enemy = own.enemy();
    let mut own_units = 0i64;
    let mut enemy_units = 0i64;
    if let Some(set) = map.groups_in_nodes.get(&node) {
        for gid in set {
            let Some(g) = groups.get(gid) else { continue };
            if g.coalition == own {
                own_units += g.units.len() as i64;
            } else if Some(g.coalition) == enemy {
                enemy_units += g.units.len() as i64;
            }
        }
    }
    own_units - enemy_units
}

/// Returns `None` only when `own` has no eligible nodes to target at all
/// (no own groups anywhere) — `GraphInconsistency` per §7.
pub fn decide_aa_move(
    graph: &Graph,
    map: &Map,
    groups: &HashMap<GroupId, Group>,
    own: Coalition,
    current: NodeId,
    rng: &mut impl Rng,
) -> Option<NodeId> {
    let mut targets = map.find_furthest_own_groups_nodes(own, groups);
    if targets.is_empty() {
        return None;
    }
    // Ties broken by prior shuffle randomness (§4.4 step 1).
    targets.shuffle(rng);
    let target_aa = targets
        .into_iter()
        .max_by_key(|&n| node_balance(map, groups, n, own))
        .expect("non-empty after the emptiness check above");

    if current == target_aa {
        return Some(current);
    }
    if graph.are_adjacent(current, target_aa) {
        return Some(target_aa);
    }

    let candidates = candidate_steps(graph, current, target_aa);
    if candidates.is_empty() {
        return None;
    }
    // Deterministic argmax on (own - enemy) at the candidate destination;
    // first-seen wins ties (§4.4 step 4), unlike the offensive procedure's
    // uniform random pick.
    let mut best: Option<(NodeId, i64)> = None;
    for (v, _) in candidates {
        let balance = node_balance(map, groups, v, own);
        if best.map(|(_, b)| balance > b).unwrap_or(true) {
            best = Some((v, balance));
        }
    }
    best.map(|(v, _)| v)
}
