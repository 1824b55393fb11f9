//! Flow accumulation over a spanning tree rooted at its lowest node.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::GraphEdge;

/// Rooted view of a tree with per-node upstream counts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowTree {
    pub root: usize,
    /// Parent toward the root; `None` for the root and unreachable nodes
    pub parent: Vec<Option<usize>>,
    /// Breadth-first visit order from the root
    pub order: Vec<usize>,
    /// Number of nodes draining through each node, itself included
    pub flow: Vec<u32>,
}

impl FlowTree {
    /// Root-side endpoint of a tree edge.
    pub fn downstream(&self, edge: &GraphEdge) -> usize {
        if self.parent[edge.a] == Some(edge.b) {
            edge.b
        } else {
            edge.a
        }
    }

    /// Flow of the edge's root-side endpoint
    pub fn edge_flow(&self, edge: &GraphEdge) -> u32 {
        self.flow[self.downstream(edge)]
    }

    pub fn is_leaf(&self, node: usize) -> bool {
        self.flow.get(node) == Some(&1)
    }
}

/// Root the tree at `root` and accumulate flow leaves-first.
pub fn accumulate_flow(node_count: usize, edges: &[GraphEdge], root: usize) -> FlowTree {
    let mut adjacency = vec![Vec::new(); node_count];
    for e in edges {
        adjacency[e.a].push(e.b);
        adjacency[e.b].push(e.a);
    }

    let mut parent = vec![None; node_count];
    let mut visited = vec![false; node_count];
    let mut order = Vec::with_capacity(node_count);
    let mut queue = VecDeque::new();

    if root < node_count {
        visited[root] = true;
        queue.push_back(root);
    }
    while let Some(u) = queue.pop_front() {
        order.push(u);
        for &v in &adjacency[u] {
            if !visited[v] {
                visited[v] = true;
                parent[v] = Some(u);
                queue.push_back(v);
            }
        }
    }

    let mut flow = vec![0u32; node_count];
    for &u in order.iter().rev() {
        flow[u] += 1;
        if let Some(p) = parent[u] {
            flow[p] += flow[u];
        }
    }

    FlowTree {
        root,
        parent,
        order,
        flow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(a: usize, b: usize) -> GraphEdge {
        GraphEdge { a, b, weight: 1.0 }
    }

    #[test]
    fn test_chain_flow() {
        // 0 - 1 - 2 - 3, rooted at 0
        let tree = accumulate_flow(4, &[edge(0, 1), edge(1, 2), edge(2, 3)], 0);
        assert_eq!(tree.flow, vec![4, 3, 2, 1]);
        assert_eq!(tree.parent, vec![None, Some(0), Some(1), Some(2)]);
        assert_eq!(tree.downstream(&edge(1, 2)), 1);
        assert!(tree.is_leaf(3));
    }

    #[test]
    fn test_flow_monotone_toward_root() {
        let edges = [edge(0, 1), edge(0, 2), edge(2, 3), edge(2, 4), edge(4, 5), edge(1, 6)];
        let tree = accumulate_flow(7, &edges, 2);
        assert_eq!(tree.flow[2], 7);
        for node in 0..7 {
            if let Some(p) = tree.parent[node] {
                assert!(tree.flow[p] > tree.flow[node]);
            }
        }
        assert_eq!(tree.order[0], 2);
    }

    #[test]
    fn test_single_node() {
        let tree = accumulate_flow(1, &[], 0);
        assert_eq!(tree.flow, vec![1]);
        assert_eq!(tree.order, vec![0]);
    }
}
