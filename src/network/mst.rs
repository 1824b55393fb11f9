//! Minimum spanning tree over a complete Euclidean graph (Kruskal).

use serde::{Deserialize, Serialize};

use super::GraphNode;

/// Disjoint-set forest with path halving and union by rank.
#[derive(Clone, Debug)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
    sets: usize,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
            sets: n,
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets holding `a` and `b`; false if already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        self.sets -= 1;
        true
    }

    pub fn connected(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }

    /// Number of disjoint sets remaining
    pub fn set_count(&self) -> usize {
        self.sets
    }
}

/// Undirected edge between node indices `a < b`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub a: usize,
    pub b: usize,
    pub weight: f32,
}

impl GraphEdge {
    pub fn other(&self, node: usize) -> usize {
        if node == self.a { self.b } else { self.a }
    }
}

/// All pairs, weighted by Euclidean distance and sorted ascending.
///
/// Ties are broken by `(a, b)` so the order is fully deterministic.
pub fn complete_graph(nodes: &[GraphNode]) -> Vec<GraphEdge> {
    let n = nodes.len();
    let mut edges = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for a in 0..n {
        for b in (a + 1)..n {
            edges.push(GraphEdge {
                a,
                b,
                weight: nodes[a].coord.distance(nodes[b].coord),
            });
        }
    }
    edges.sort_by(|x, y| {
        x.weight
            .total_cmp(&y.weight)
            .then_with(|| x.a.cmp(&y.a))
            .then_with(|| x.b.cmp(&y.b))
    });
    edges
}

/// Kruskal over pre-sorted edges. Returns at most `node_count - 1` edges.
pub fn kruskal(node_count: usize, sorted_edges: &[GraphEdge]) -> Vec<GraphEdge> {
    let mut sets = UnionFind::new(node_count);
    let mut tree = Vec::with_capacity(node_count.saturating_sub(1));
    for edge in sorted_edges {
        if sets.union(edge.a, edge.b) {
            tree.push(*edge);
            if sets.set_count() == 1 {
                break;
            }
        }
    }
    tree
}

/// Minimum spanning tree of the complete graph over `nodes`.
pub fn minimum_spanning_tree(nodes: &[GraphNode]) -> Vec<GraphEdge> {
    kruskal(nodes.len(), &complete_graph(nodes))
}
