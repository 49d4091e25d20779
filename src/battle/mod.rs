//! §4.6: the battle scheduler. Finds adjacent-enemy-pair collisions implied
//! by this turn's movement decisions, and same-node standoffs at turn start.

use std::collections::{HashMap, HashSet};

use crate::core::types::{Category, Coalition, GroupId, NodeId, UnitId};
use crate::entities::{Group, Unit};
use crate::graph::Graph;
use crate::map::Map;

/// One unit's coalition and type at the moment its battle was recorded,
/// snapshotted because the unit may be long destroyed (and so absent from
/// the live unit arena) by the time the statistics extractor runs (§4.8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub unit: UnitId,
    pub coalition: Coalition,
    pub unit_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Battle {
    /// One node for a same-node standoff, two for a mid-segment collision.
    pub nodes: Vec<NodeId>,
    pub groups: Vec<GroupId>,
    pub initial_roster: Vec<RosterEntry>,
}

fn roster_of(groups: &HashMap<GroupId, Group>, units: &HashMap<UnitId, Unit>, group_ids: &[GroupId]) -> Vec<RosterEntry> {
    let mut roster = Vec::new();
    for &gid in group_ids {
        let Some(g) = groups.get(&gid) else { continue };
        for &uid in &g.units {
            let Some(u) = units.get(&uid) else { continue };
            roster.push(RosterEntry {
                unit: uid,
                coalition: g.coalition,
                unit_type: u.unit_type.clone(),
            });
        }
    }
    roster
}

/// A pair of adjacent vehicle groups of opposing coalitions, and the
/// destinations each would need to decide on for their paths to cross.
#[derive(Debug, Clone, Copy)]
pub struct PotentialBattle {
    pub n1: NodeId,
    pub n2: NodeId,
    pub g1: GroupId,
    pub g2: GroupId,
}

fn is_live_vehicle(g: &Group) -> bool {
    g.category == Category::Vehicle && !g.is_empty()
}

/// §4.6 `find_potential_battles`. Each adjacent pair of opposing vehicle
/// groups yields one potential battle keyed by the pair of nodes.
pub fn find_potential_battles(map: &Map, groups: &HashMap<GroupId, Group>) -> Vec<PotentialBattle> {
    let mut result = Vec::new();
    for (&n1, set1) in &map.groups_in_nodes {
        for &gid1 in set1 {
            let Some(g1) = groups.get(&gid1) else { continue };
            if !is_live_vehicle(g1) {
                continue;
            }
            for n2 in map.graph.neighbors(n1) {
                if n2.0 <= n1.0 {
                    continue; // each unordered pair considered once
                }
                let Some(set2) = map.groups_in_nodes.get(&n2) else {
                    continue;
                };
                for &gid2 in set2 {
                    let Some(g2) = groups.get(&gid2) else { continue };
                    if !is_live_vehicle(g2) || g2.coalition == g1.coalition {
                        continue;
                    }
                    result.push(PotentialBattle { n1, n2, g1: gid1, g2: gid2 });
                }
            }
        }
    }
    result
}

/// §4.6 `resolve_actual_battles`. Confirms each potential pair against this
/// turn's movement decisions, teleports both groups' units to the segment
/// midpoint (unless tagged `__ig__`), and returns the confirmed Battles.
pub fn resolve_actual_battles(
    potentials: &[PotentialBattle],
    decisions: &HashMap<GroupId, NodeId>,
    groups: &HashMap<GroupId, Group>,
    units: &mut HashMap<UnitId, Unit>,
    graph: &Graph,
) -> Vec<Battle> {
    let mut seen_pairs: HashSet<(NodeId, NodeId)> = HashSet::new();
    let mut battles = Vec::new();

    for p in potentials {
        let confirmed = decisions.get(&p.g1) == Some(&p.n2) && decisions.get(&p.g2) == Some(&p.n1);
        if !confirmed {
            continue;
        }
        let key = (p.n1, p.n2);
        if !seen_pairs.insert(key) {
            continue;
        }

        let (Some(coord1), Some(coord2)) = (graph.node(p.n1).map(|n| n.coord), graph.node(p.n2).map(|n| n.coord))
        else {
            continue;
        };
        let midpoint = coord1.midpoint(&coord2);

        for &gid in &[p.g1, p.g2] {
            let Some(g) = groups.get(&gid) else { continue };
            if g.flags.ignore_teleport {
                continue;
            }
            for &uid in &g.units {
                if let Some(u) = units.get_mut(&uid) {
                    u.position = midpoint;
                }
            }
        }

        let group_ids = [p.g1, p.g2];
        battles.push(Battle {
            nodes: vec![p.n1, p.n2],
            groups: group_ids.to_vec(),
            initial_roster: roster_of(groups, units, &group_ids),
        });
    }

    battles
}

/// §4.6 `get_battles_due_to_same_node`. One Battle per node holding live
/// vehicle groups of both coalitions, excluding any group already spoken
/// for by a mid-segment battle this turn.
pub fn get_battles_due_to_same_node(
    map: &Map,
    groups: &HashMap<GroupId, Group>,
    units: &HashMap<UnitId, Unit>,
    excluded: &HashSet<GroupId>,
) -> Vec<Battle> {
    let mut battles = Vec::new();
    for (&node, set) in &map.groups_in_nodes {
        let mut present: Vec<GroupId> = Vec::new();
        let mut has_red = false;
        let mut has_blue = false;
        for &gid in set {
            if excluded.contains(&gid) {
                continue;
            }
            let Some(g) = groups.get(&gid) else { continue };
            if !is_live_vehicle(g) {
                continue;
            }
            match g.coalition {
                crate::core::types::Coalition::Red => has_red = true,
                crate::core::types::Coalition::Blue => has_blue = true,
                crate::core::types::Coalition::Neutral => {}
            }
            present.push(gid);
        }
        if has_red && has_blue {
            battles.push(Battle {
                nodes: vec![node],
                initial_roster: roster_of(groups, units, &present),
                groups: present,
            });
        }
    }
    battles
}
