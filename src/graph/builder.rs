//! §4.1: merges submitted routes into the coalesced weighted graph via
//! quotient-based node coalescence.

use std::collections::{HashMap, HashSet};

use crate::core::types::{NodeId, Point};
use crate::graph::Graph;

/// Waypoints closer than this (Euclidean, host-frame units) are folded into
/// the same node. Per design note 9, equality is *not* checked separately —
/// `< MERGE_DISTANCE` alone is the merge criterion (a distance of exactly
/// `0.0` for coincident points already satisfies it).
pub const MERGE_DISTANCE: f64 = 200.0;

#[derive(Debug, Clone, Copy)]
pub struct RouteWaypoint {
    pub point: Point,
    pub reinforcement: bool,
}

pub type Route = Vec<RouteWaypoint>;

/// Disjoint-set forest over the raw (pre-merge) waypoint nodes.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}

pub struct GraphBuilder;

impl GraphBuilder {
    /// Builds the coalesced graph from a set of routes. An empty route list
    /// produces an empty graph (no error, per §4.1's "Failure" note).
    pub fn build(routes: &[Route]) -> Graph {
        // Step 1: one raw node per waypoint; consecutive intra-route edges.
        let mut raw_points: Vec<Point> = Vec::new();
        let mut raw_reinforcement: Vec<bool> = Vec::new();
        let mut raw_edges: Vec<(usize, usize, f64)> = Vec::new();

        for route in routes {
            let mut prev_idx: Option<usize> = None;
            for wp in route {
                let idx = raw_points.len();
                raw_points.push(wp.point);
                raw_reinforcement.push(wp.reinforcement);
                if let Some(p) = prev_idx {
                    let weight = raw_points[p].distance(&wp.point);
                    raw_edges.push((p, idx, weight));
                }
                prev_idx = Some(idx);
            }
        }

        if raw_points.is_empty() {
            return Graph::new();
        }

        // Step 2: quotient under "distance < MERGE_DISTANCE".
        let n = raw_points.len();
        let mut uf = UnionFind::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                if raw_points[i].distance(&raw_points[j]) < MERGE_DISTANCE {
                    uf.union(i, j);
                }
            }
        }

        // Step 3: representative per class = lowest original id in the class.
        let mut class_of: Vec<usize> = (0..n).map(|i| uf.find(i)).collect();
        // UnionFind::union always keeps the lower index as root, so `find`
        // already returns the lowest raw id in the class.
        let mut representative_ids: Vec<usize> = class_of.clone();
        representative_ids.sort_unstable();
        representative_ids.dedup();

        let mut node_id_of_root: HashMap<usize, NodeId> = HashMap::new();
        for (new_id, &root) in representative_ids.iter().enumerate() {
            node_id_of_root.insert(root, NodeId(new_id as u32));
        }

        let mut graph = Graph::new();
        for &root in &representative_ids {
            let node_id = node_id_of_root[&root];
            let is_reinforcement = (0..n)
                .filter(|&i| class_of[i] == root)
                .all(|i| raw_reinforcement[i]);
            graph.add_node(node_id, raw_points[root], is_reinforcement);
        }

        // Step 4: re-emit edges between representatives; drop self-loops,
        // keep the first weight seen for a given representative pair.
        let mut seen_pairs: HashSet<(NodeId, NodeId)> = HashSet::new();
        for (u, v, weight) in raw_edges {
            let ru = class_of[u];
            let rv = class_of[v];
            if ru == rv {
                continue;
            }
            let a = node_id_of_root[&ru];
            let b = node_id_of_root[&rv];
            let key = if a.0 <= b.0 { (a, b) } else { (b, a) };
            if seen_pairs.insert(key) {
                graph.add_edge(a, b, weight);
            }
        }

        // class_of no longer needed mutably; silence unused-mut lint path.
        let _ = &mut class_of;

        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wp(x: f64, y: f64, r: bool) -> RouteWaypoint {
        RouteWaypoint {
            point: Point::new(x, y),
            reinforcement: r,
        }
    }

    #[test]
    fn empty_routes_yield_empty_graph() {
        let graph = GraphBuilder::build(&[]);
        assert!(graph.is_empty());
    }

    #[test]
    fn two_node_trivial_route() {
        let routes = vec![vec![wp(0.0, 0.0, false), wp(100.0, 0.0, false)]];
        let graph = GraphBuilder::build(&routes);
        assert_eq!(graph.node_ids().count(), 1, "waypoints within 200 units merge into one node");
    }

    #[test]
    fn far_waypoints_stay_distinct() {
        let routes = vec![vec![wp(0.0, 0.0, false), wp(1000.0, 0.0, false)]];
        let graph = GraphBuilder::build(&routes);
        assert_eq!(graph.node_ids().count(), 2);
    }

    #[test]
    fn reinforcement_is_and_over_constituents() {
        // Two routes sharing an intersection; one waypoint there is flagged
        // reinforcement, the other isn't, so the merged node is not.
        let routes = vec![
            vec![wp(0.0, 0.0, true), wp(500.0, 0.0, true)],
            vec![wp(500.0, 50.0, false), wp(1000.0, 50.0, false)],
        ];
        let graph = GraphBuilder::build(&routes);
        // (500,0,true) and (500,50,false) are within 200 units -> merge.
        let merged_node = graph
            .node_ids()
            .find(|&id| {
                let c = graph.node(id).unwrap().coord;
                (c.x - 500.0).abs() < 1.0 || (c.x - 500.0).abs() < 250.0
            })
            .unwrap();
        assert!(!graph.node(merged_node).unwrap().is_reinforcement);
    }

    #[test]
    fn merged_nodes_are_pairwise_at_least_200_apart() {
        let routes = vec![vec![
            wp(0.0, 0.0, false),
            wp(190.0, 0.0, false),
            wp(500.0, 0.0, false),
            wp(1200.0, 0.0, false),
        ]];
        let graph = GraphBuilder::build(&routes);
        let coords: Vec<Point> = graph.node_ids().map(|id| graph.node(id).unwrap().coord).collect();
        for i in 0..coords.len() {
            for j in (i + 1)..coords.len() {
                assert!(coords[i].distance(&coords[j]) >= MERGE_DISTANCE);
            }
        }
    }
}
