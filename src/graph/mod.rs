//! The topological graph (§4.1/§4.2): nodes with coordinates, undirected
//! weighted edges, and the shortest-path primitives every movement
//! procedure and distance index is built from.
//!
//! Hand-rolled adjacency-map + `BinaryHeap` Dijkstra, in the teacher's style
//! (`campaign/map.rs`'s `find_path`) rather than pulling in a graph crate —
//! the teacher's own strategic-map pathfinding never reached for `petgraph`
//! either, despite the `diplomacy` example repo in the pack using it for a
//! much larger adjudication graph.

pub mod builder;

pub use builder::GraphBuilder;

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use serde::{Deserialize, Serialize};

use crate::core::types::{NodeId, Point};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub coord: Point,
    pub is_reinforcement: bool,
}

/// An undirected weighted graph over waypoint-derived nodes. Serializes in
/// node-link form (§6): a node map plus an adjacency list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    nodes: HashMap<NodeId, NodeData>,
    adjacency: HashMap<NodeId, Vec<(NodeId, f64)>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_node(&mut self, id: NodeId, coord: Point, is_reinforcement: bool) {
        self.nodes.insert(id, NodeData { coord, is_reinforcement });
        self.adjacency.entry(id).or_default();
    }

    /// Adds both directions of an undirected edge. A repeated edge between
    /// the same pair just adds another near-equal-weight parallel entry,
    /// which is harmless for shortest-path purposes (§4.1 step 4).
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, weight: f64) {
        self.adjacency.entry(a).or_default().push((b, weight));
        self.adjacency.entry(b).or_default().push((a, weight));
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(&id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency
            .get(&id)
            .into_iter()
            .flat_map(|edges| edges.iter().map(|(n, _)| *n))
    }

    pub fn edge_weight(&self, a: NodeId, b: NodeId) -> Option<f64> {
        self.adjacency
            .get(&a)?
            .iter()
            .find(|(n, _)| *n == b)
            .map(|(_, w)| *w)
    }

    pub fn are_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency
            .get(&a)
            .map(|edges| edges.iter().any(|(n, _)| *n == b))
            .unwrap_or(false)
    }

    /// Nearest node to `p` by Euclidean distance; an exact coordinate match
    /// short-circuits (§4.2 `find_node_by_center`).
    pub fn find_node_by_center(&self, p: Point) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;
        for (&id, data) in &self.nodes {
            if data.coord == p {
                return Some(id);
            }
            let d = data.coord.distance(&p);
            if best.map(|(_, bd)| d < bd).unwrap_or(true) {
                best = Some((id, d));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Dijkstra shortest path by edge weight, optionally forbidding a node
    /// from appearing anywhere on the path (used by §4.3 step 2's
    /// no-immediate-backtrack rule). `start` itself is never checked against
    /// `forbidden`.
    pub fn shortest_path(
        &self,
        start: NodeId,
        goal: NodeId,
        forbidden: Option<NodeId>,
    ) -> Option<Vec<NodeId>> {
        if start == goal {
            return Some(vec![start]);
        }
        if forbidden == Some(goal) {
            return None;
        }

        #[derive(PartialEq)]
        struct Candidate {
            cost: f64,
            node: NodeId,
        }
        impl Eq for Candidate {}
        impl Ord for Candidate {
            fn cmp(&self, other: &Self) -> Ordering {
                other
                    .cost
                    .partial_cmp(&self.cost)
                    .unwrap_or(Ordering::Equal)
            }
        }
        impl PartialOrd for Candidate {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        let mut dist: HashMap<NodeId, f64> = HashMap::new();
        let mut prev: HashMap<NodeId, NodeId> = HashMap::new();
        let mut heap = BinaryHeap::new();

        dist.insert(start, 0.0);
        heap.push(Candidate { cost: 0.0, node: start });

        while let Some(Candidate { cost, node }) = heap.pop() {
            if node == goal {
                let mut path = vec![goal];
                let mut cur = goal;
                while let Some(&p) = prev.get(&cur) {
                    path.push(p);
                    cur = p;
                }
                path.reverse();
                return Some(path);
            }
            if cost > *dist.get(&node).unwrap_or(&f64::INFINITY) {
                continue;
            }
            for (next, weight) in self.adjacency.get(&node).into_iter().flatten() {
                if Some(*next) == forbidden {
                    continue;
                }
                let new_cost = cost + weight;
                if new_cost < *dist.get(next).unwrap_or(&f64::INFINITY) {
                    dist.insert(*next, new_cost);
                    prev.insert(*next, node);
                    heap.push(Candidate { cost: new_cost, node: *next });
                }
            }
        }
        None
    }

    /// BFS hop-distance from `source` to every reachable node. Unreachable
    /// nodes are absent from the result (§4.2).
    pub fn hop_distances_from(&self, source: NodeId) -> HashMap<NodeId, u32> {
        let mut dist = HashMap::new();
        let mut queue = VecDeque::new();
        dist.insert(source, 0u32);
        queue.push_back(source);
        let mut visited: HashSet<NodeId> = HashSet::new();
        visited.insert(source);
        while let Some(node) = queue.pop_front() {
            let d = dist[&node];
            for next in self.neighbors(node) {
                if visited.insert(next) {
                    dist.insert(next, d + 1);
                    queue.push_back(next);
                }
            }
        }
        dist
    }
}
