//! The strategic map (§4.2): owns the coalesced [`Graph`](crate::graph::Graph)
//! plus every node-keyed index that movement and battle procedures read from.
//! Deliberately holds no `Unit`/`Group` data itself (design note 9) — callers
//! that need coalition or category information pass the campaign's entity
//! arena in as a parameter.

pub mod per_coalition;

pub use per_coalition::PerCoalition;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::core::types::{Coalition, GroupId, NodeId, Point};
use crate::entities::Group;
use crate::graph::Graph;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapMarker {
    pub name: String,
    pub position: Point,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InfantryRecord {
    pub red: u32,
    pub blue: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Map {
    pub graph: Graph,

    pub red_goal_node: Option<NodeId>,
    pub blue_goal_node: Option<NodeId>,
    pub red_bullseye: Option<Point>,
    pub blue_bullseye: Option<Point>,

    /// Node each coalition currently re-supplies support units from.
    pub support_unit_nodes: PerCoalition<Option<NodeId>>,
    /// How many support units each coalition still has in reserve (0..=7).
    pub num_support_units: PerCoalition<u32>,

    /// Which groups currently occupy which node.
    pub groups_in_nodes: HashMap<NodeId, HashSet<GroupId>>,
    /// Infantry headcount per node, split by coalition.
    pub infantry_in_nodes: HashMap<NodeId, InfantryRecord>,

    /// Nodes bucketed by hop-distance from the *opposite* base: red's bucket
    /// is keyed by distance from `blue_goal_node`, and vice versa (§4.2).
    pub red_nodes_by_distance: HashMap<u32, Vec<NodeId>>,
    pub blue_nodes_by_distance: HashMap<u32, Vec<NodeId>>,

    pub map_markers: Vec<MapMarker>,
    pub corner_markers: Vec<Point>,

    /// Per-node scoring multiplier cache, recomputed once per turn from each
    /// node's hop-distance to both bases (§4.7 step 9).
    pub multipliers_for_red: HashMap<NodeId, f64>,
}

impl Map {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph,
            red_goal_node: None,
            blue_goal_node: None,
            red_bullseye: None,
            blue_bullseye: None,
            support_unit_nodes: PerCoalition::default(),
            num_support_units: PerCoalition::default(),
            groups_in_nodes: HashMap::new(),
            infantry_in_nodes: HashMap::new(),
            red_nodes_by_distance: HashMap::new(),
            blue_nodes_by_distance: HashMap::new(),
            map_markers: Vec::new(),
            corner_markers: Vec::new(),
            multipliers_for_red: HashMap::new(),
        }
    }

    pub fn find_node_by_center(&self, p: Point) -> Option<NodeId> {
        self.graph.find_node_by_center(p)
    }

    /// Rebuilds `red_nodes_by_distance` / `blue_nodes_by_distance` from the
    /// current goal nodes. A no-op for a side whose goal node isn't set yet.
    pub fn update_nodes_by_distance(&mut self) {
        if let Some(blue_goal) = self.blue_goal_node {
            self.red_nodes_by_distance = bucket_by_distance(&self.graph, blue_goal);
        }
        if let Some(red_goal) = self.red_goal_node {
            self.blue_nodes_by_distance = bucket_by_distance(&self.graph, red_goal);
        }
    }

    /// Re-places every group at its nearest node given current unit
    /// positions, and keeps `groups_in_nodes` consistent with the move.
    pub fn update_group_nodes(&mut self, groups: &mut HashMap<GroupId, Group>, positions: &HashMap<GroupId, Point>) {
        for (&group_id, group) in groups.iter_mut() {
            let Some(&centroid) = positions.get(&group_id) else {
                continue;
            };
            let Some(new_node) = self.graph.find_node_by_center(centroid) else {
                continue;
            };
            if group.node != Some(new_node) {
                if let Some(old_node) = group.node {
                    if let Some(set) = self.groups_in_nodes.get_mut(&old_node) {
                        set.remove(&group_id);
                    }
                }
                self.groups_in_nodes.entry(new_node).or_default().insert(group_id);
                group.node = Some(new_node);
            }
        }
    }

    /// Whether the enemy of `c` has any infantry or vehicle-group presence
    /// at `node` (§4.2): an enemy infantry headcount, or a live enemy
    /// vehicle group, occupying it.
    pub fn is_enemy_activity_in_node(&self, c: Coalition, node: NodeId, groups: &HashMap<GroupId, Group>) -> bool {
        let Some(enemy) = c.enemy() else { return false };
        let enemy_infantry = self
            .infantry_in_nodes
            .get(&node)
            .map(|rec| match enemy {
                Coalition::Red => rec.red > 0,
                Coalition::Blue => rec.blue > 0,
                Coalition::Neutral => false,
            })
            .unwrap_or(false);
        if enemy_infantry {
            return true;
        }
        self.groups_in_nodes
            .get(&node)
            .map(|set| {
                set.iter()
                    .filter_map(|id| groups.get(id))
                    .any(|g| g.coalition == enemy && g.category == crate::core::types::Category::Vehicle && !g.is_empty())
            })
            .unwrap_or(false)
    }

    /// All nodes of `c`'s own groups at the greatest hop-distance from the
    /// enemy base, excluding reinforcement-only nodes (used to seed AA
    /// targeting, §4.4 step 1).
    pub fn find_furthest_own_groups_nodes(&self, c: Coalition, groups: &HashMap<GroupId, Group>) -> Vec<NodeId> {
        let own_nodes: HashSet<NodeId> = groups
            .values()
            .filter(|g| g.coalition == c && !g.is_empty())
            .filter_map(|g| g.node)
            .filter(|n| !self.graph.node(*n).map(|d| d.is_reinforcement).unwrap_or(false))
            .collect();

        let distances = match c {
            Coalition::Red => &self.red_nodes_by_distance,
            Coalition::Blue => &self.blue_nodes_by_distance,
            Coalition::Neutral => return Vec::new(),
        };

        let mut max_dist: Option<u32> = None;
        let mut at_max: Vec<NodeId> = Vec::new();
        for (&dist, nodes) in distances {
            let matching: Vec<NodeId> = nodes.iter().copied().filter(|n| own_nodes.contains(n)).collect();
            if matching.is_empty() {
                continue;
            }
            match max_dist {
                None => {
                    max_dist = Some(dist);
                    at_max = matching;
                }
                Some(d) if dist > d => {
                    max_dist = Some(dist);
                    at_max = matching;
                }
                Some(d) if dist == d => at_max.extend(matching),
                _ => {}
            }
        }
        at_max
    }

    /// Among nodes holding at least one vehicle group of `threat_coalition`,
    /// the one nearest `objective` (ascending hop-distance), ties broken by
    /// the greater vehicle-group count. `None` (spec's `-1`) if none exist.
    pub fn find_greatest_threat_node(
        &self,
        objective: NodeId,
        threat_coalition: Coalition,
        groups: &HashMap<GroupId, Group>,
    ) -> Option<NodeId> {
        let mut counts: HashMap<NodeId, usize> = HashMap::new();
        for group in groups.values() {
            if group.coalition != threat_coalition || group.is_empty() || group.category != crate::core::types::Category::Vehicle {
                continue;
            }
            let Some(node) = group.node else { continue };
            *counts.entry(node).or_insert(0) += 1;
        }
        if counts.is_empty() {
            return None;
        }
        let hops = self.graph.hop_distances_from(objective);
        counts
            .into_iter()
            .map(|(node, count)| {
                let hop = hops.get(&node).copied().unwrap_or(u32::MAX);
                (node, count, hop)
            })
            .min_by(|a, b| a.2.cmp(&b.2).then(b.1.cmp(&a.1)))
            .map(|(node, _, _)| node)
    }

    /// Recomputes the per-node scoring multiplier cache from each node's
    /// hop-distance to both bases: nodes nearer the enemy base score higher
    /// for red (§4.2 `get_node_extra_multiplier`, cached once per turn per
    /// §4.7 step 9).
    pub fn recompute_multipliers_for_red(&mut self) {
        let (Some(red_goal), Some(blue_goal)) = (self.red_goal_node, self.blue_goal_node) else {
            self.multipliers_for_red.clear();
            return;
        };
        let from_red = self.graph.hop_distances_from(red_goal);
        let from_blue = self.graph.hop_distances_from(blue_goal);

        self.multipliers_for_red = self
            .graph
            .node_ids()
            .map(|node| {
                let d_r = from_red.get(&node).copied().unwrap_or(u32::MAX) as f64 - 2.0;
                let d_b = from_blue.get(&node).copied().unwrap_or(u32::MAX) as f64 - 2.0;
                let m_red = if d_r <= 0.0 {
                    1.0
                } else if d_b <= 0.0 {
                    0.0
                } else {
                    d_b / (d_r + d_b)
                };
                (node, m_red)
            })
            .collect();
    }

    /// `c`'s scoring multiplier at `node`: `multipliers_for_red[node]` for
    /// red, its complement for blue.
    pub fn get_node_extra_multiplier(&self, node: NodeId, c: Coalition) -> f64 {
        let m_red = self.multipliers_for_red.get(&node).copied().unwrap_or(0.5);
        match c {
            Coalition::Red => m_red,
            Coalition::Blue => 1.0 - m_red,
            Coalition::Neutral => 0.5,
        }
    }
}

fn bucket_by_distance(graph: &Graph, source: NodeId) -> HashMap<u32, Vec<NodeId>> {
    let mut buckets: HashMap<u32, Vec<NodeId>> = HashMap::new();
    for (node, dist) in graph.hop_distances_from(source) {
        buckets.entry(dist).or_default().push(node);
    }
    buckets
}
