//! Network construction: sample nodes, span them, grade widths, rasterize.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::flow::{FlowTree, accumulate_flow};
use super::mst::{GraphEdge, minimum_spanning_tree};
use super::raster::{rasterize_segment, segment_samples};
use super::sampling::{GraphNode, sample_nodes};
use crate::core::{DegradedResult, Error, Result};
use crate::grid::{ElevationGrid, GridCoord, Mask};

/// Parameters for one network build
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParams {
    /// Label used in logs and degradation reports
    pub name: String,
    pub node_count: usize,
    pub candidate_threshold: f32,
    pub max_attempts_per_node: usize,
    /// Uniform width when not flow graded
    pub width: f32,
    pub smoothing_width: f32,
    pub flow_graded: bool,
    pub min_width: f32,
    pub max_width: f32,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            name: "network".to_string(),
            node_count: 15,
            candidate_threshold: 0.5,
            max_attempts_per_node: 100,
            width: 8.0,
            smoothing_width: 4.0,
            flow_graded: false,
            min_width: 1.5,
            max_width: 12.0,
        }
    }
}

impl NetworkParams {
    /// River-style defaults: many tributaries, flow-graded widths.
    pub fn river() -> Self {
        Self {
            name: "river".to_string(),
            node_count: 50,
            smoothing_width: 10.0,
            flow_graded: true,
            ..Default::default()
        }
    }

    pub fn roads() -> Self {
        Self {
            name: "roads".to_string(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.node_count < 2 {
            return Err(Error::InvalidParameter(format!(
                "{}: node_count {} cannot form a network, need at least 2",
                self.name, self.node_count
            )));
        }
        let widths = [self.width, self.smoothing_width, self.min_width, self.max_width];
        if widths.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::InvalidParameter(format!(
                "{}: widths must be finite and non-negative",
                self.name
            )));
        }
        if self.flow_graded && self.min_width > self.max_width {
            return Err(Error::InvalidParameter(format!(
                "{}: min_width {} exceeds max_width {}",
                self.name, self.min_width, self.max_width
            )));
        }
        if self.max_attempts_per_node == 0 {
            return Err(Error::InvalidParameter(format!(
                "{}: max_attempts_per_node must be at least 1",
                self.name
            )));
        }
        Ok(())
    }
}

/// A built network and everything derived on the way
#[derive(Clone, Debug)]
pub struct Network {
    pub mask: Mask,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Width per entry of `edges`
    pub widths: Vec<f32>,
    /// Present for flow-graded builds
    pub flow: Option<FlowTree>,
    pub degraded: Option<DegradedResult>,
}

impl Network {
    pub fn total_length(&self) -> f32 {
        self.edges.iter().map(|e| e.weight).sum()
    }

    /// Node positions of an edge in grid space
    pub fn segment(&self, edge: &GraphEdge) -> (glam::Vec2, glam::Vec2) {
        (
            self.nodes[edge.a].coord.as_vec2(),
            self.nodes[edge.b].coord.as_vec2(),
        )
    }
}

pub struct NetworkBuilder {
    params: NetworkParams,
}

impl NetworkBuilder {
    pub fn new(params: NetworkParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    pub fn build(&self, candidates: &Mask, elevation: &ElevationGrid, seed: u64) -> Result<Network> {
        let p = &self.params;
        elevation.ensure_same_dims(candidates.as_grid(), "candidate mask")?;
        let started = std::time::Instant::now();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let sample = sample_nodes(
            candidates,
            elevation,
            p.node_count,
            p.candidate_threshold,
            p.max_attempts_per_node,
            &mut rng,
        );
        let degraded = DegradedResult::check(&p.name, p.node_count, sample.nodes.len(), sample.attempts);
        let nodes = sample.nodes;
        if nodes.len() < 2 {
            return Err(Error::InsufficientCandidates {
                found: nodes.len(),
                required: 2,
            });
        }

        let edges = minimum_spanning_tree(&nodes);

        let flow = p.flow_graded.then(|| {
            let root = lowest_node(&nodes);
            accumulate_flow(nodes.len(), &edges, root)
        });

        let widths: Vec<f32> = match &flow {
            Some(tree) => edges
                .iter()
                .map(|e| {
                    let ratio = tree.edge_flow(e) as f32 / nodes.len() as f32;
                    p.min_width + (p.max_width - p.min_width) * ratio
                })
                .collect(),
            None => vec![p.width; edges.len()],
        };

        let mut mask = Mask::new(elevation.width(), elevation.height())?;
        for (edge, &width) in edges.iter().zip(&widths) {
            rasterize_segment(
                &mut mask,
                nodes[edge.a].coord.as_vec2(),
                nodes[edge.b].coord.as_vec2(),
                width,
                p.smoothing_width,
            );
        }

        log::info!(
            "Built {} network: {} nodes, {} edges, {} cells covered in {:?}",
            p.name,
            nodes.len(),
            edges.len(),
            mask.coverage(crate::grid::DEFAULT_THRESHOLD),
            started.elapsed()
        );

        Ok(Network {
            mask,
            nodes,
            edges,
            widths,
            flow,
            degraded,
        })
    }
}

/// Lowest-elevation node, earliest index on ties
fn lowest_node(nodes: &[GraphNode]) -> usize {
    nodes
        .iter()
        .enumerate()
        .min_by(|(i, a), (j, b)| a.elevation.total_cmp(&b.elevation).then_with(|| i.cmp(j)))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Build a network over `candidates` with a fresh builder.
pub fn build_network(
    candidates: &Mask,
    elevation: &ElevationGrid,
    params: &NetworkParams,
    seed: u64,
) -> Result<Network> {
    NetworkBuilder::new(params.clone())?.build(candidates, elevation, seed)
}

/// Flatten terrain under the full-strength core of every network segment.
///
/// Each covered cell moves toward the pre-flatten height at its stamp centre
/// by `strength`. Returns the number of cells written.
pub fn flatten_under_network(grid: &mut ElevationGrid, network: &Network, strength: f32) -> Result<usize> {
    grid.ensure_same_dims(network.mask.as_grid(), "network mask")?;
    let strength = strength.clamp(0.0, 1.0);
    let original = grid.clone();
    let mut written = 0;

    for (edge, &width) in network.edges.iter().zip(&network.widths) {
        let (a, b) = network.segment(edge);
        let core = width * 0.5;
        let reach = core.ceil() as i32;
        for p in segment_samples(a, b) {
            let center = GridCoord::new(p.x.round() as i32, p.y.round() as i32);
            let Some(target) = original.get(center) else {
                continue;
            };
            for dy in -reach..=reach {
                for dx in -reach..=reach {
                    let c = center.offset(dx, dy);
                    if c.as_vec2().distance(p) > core {
                        continue;
                    }
                    let (Some(h0), Some(h)) = (original.get(c), grid.get_mut(c)) else {
                        continue;
                    };
                    *h = h0 + (target - h0) * strength;
                    written += 1;
                }
            }
        }
    }

    log::debug!("Flattened {} cells under {} edges", written, network.edges.len());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::UnionFind;

    fn full_mask(size: usize) -> Mask {
        Mask::filled(size, size, 1.0).unwrap()
    }

    fn slope(size: usize) -> ElevationGrid {
        ElevationGrid::from_fn(size, size, |x, y| (x + y) as f32 / (2 * size) as f32).unwrap()
    }

    #[test]
    fn test_ten_nodes_nine_edges() {
        let params = NetworkParams {
            node_count: 10,
            ..Default::default()
        };
        let net = build_network(&full_mask(64), &slope(64), &params, 21).unwrap();
        assert_eq!(net.nodes.len(), 10);
        assert_eq!(net.edges.len(), 9);
        assert!(net.degraded.is_none());

        let mut uf = UnionFind::new(10);
        for e in &net.edges {
            uf.union(e.a, e.b);
        }
        assert_eq!(uf.set_count(), 1);
    }

    #[test]
    fn test_raster_connected_where_tree_connected() {
        let params = NetworkParams {
            node_count: 8,
            width: 3.0,
            smoothing_width: 0.0,
            ..Default::default()
        };
        let net = build_network(&full_mask(48), &slope(48), &params, 3).unwrap();

        // Flood fill the full-strength cells from the first node
        let mut seen = std::collections::HashSet::new();
        let mut stack = vec![net.nodes[0].coord];
        while let Some(c) = stack.pop() {
            if !seen.insert(c) {
                continue;
            }
            for (dx, dy) in GridCoord::NEIGHBORS_8 {
                let n = c.offset(dx, dy);
                if net.mask.value(n) >= 1.0 && !seen.contains(&n) {
                    stack.push(n);
                }
            }
        }
        for node in &net.nodes {
            assert!(seen.contains(&node.coord), "node {:?} not reached", node.coord);
        }
    }

    #[test]
    fn test_flow_graded_root_edge_widest() {
        let params = NetworkParams {
            node_count: 12,
            flow_graded: true,
            min_width: 1.0,
            max_width: 10.0,
            ..Default::default()
        };
        let net = build_network(&full_mask(64), &slope(64), &params, 8).unwrap();
        let tree = net.flow.as_ref().unwrap();

        // Root is the lowest node
        let root_h = net.nodes[tree.root].elevation;
        assert!(net.nodes.iter().all(|n| n.elevation >= root_h));
        assert_eq!(tree.flow[tree.root] as usize, net.nodes.len());

        let root_width = net
            .edges
            .iter()
            .zip(&net.widths)
            .filter(|(e, _)| tree.downstream(e) == tree.root)
            .map(|(_, &w)| w)
            .fold(f32::NEG_INFINITY, f32::max);
        for (e, &w) in net.edges.iter().zip(&net.widths) {
            let upstream = e.other(tree.downstream(e));
            if tree.is_leaf(upstream) {
                assert!(root_width >= w);
            }
            assert!((1.0..=10.0).contains(&w));
        }
    }

    #[test]
    fn test_insufficient_candidates() {
        let mask = Mask::from_predicate(16, 16, |x, y| x == 3 && y == 3).unwrap();
        let result = build_network(&mask, &slope(16), &NetworkParams::default(), 1);
        assert!(matches!(
            result,
            Err(Error::InsufficientCandidates { required: 2, .. })
        ));
    }

    #[test]
    fn test_single_node_network_rejected() {
        let params = NetworkParams {
            node_count: 1,
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(Error::InvalidParameter(_))));
        assert!(NetworkBuilder::new(params).is_err());
        assert!(NetworkParams { node_count: 2, ..Default::default() }.validate().is_ok());
    }

    #[test]
    fn test_degraded_when_mask_small() {
        let mask = Mask::from_predicate(16, 16, |x, y| x < 2 && y < 2).unwrap();
        let params = NetworkParams {
            node_count: 10,
            max_attempts_per_node: 200,
            ..Default::default()
        };
        let net = build_network(&mask, &slope(16), &params, 2).unwrap();
        let degraded = net.degraded.unwrap();
        assert_eq!(degraded.requested, 10);
        assert_eq!(degraded.achieved, net.nodes.len());
        assert!(net.nodes.len() <= 4);
    }

    #[test]
    fn test_mismatched_dims_rejected() {
        let result = build_network(&full_mask(8), &slope(16), &NetworkParams::default(), 0);
        assert!(matches!(result, Err(Error::InvalidDimensions(_))));
    }

    #[test]
    fn test_flatten_under_network() {
        let mut grid = slope(48);
        let params = NetworkParams {
            node_count: 6,
            width: 4.0,
            ..Default::default()
        };
        let net = build_network(&full_mask(48), &grid, &params, 5).unwrap();
        let before = grid.clone();
        let written = flatten_under_network(&mut grid, &net, 1.0).unwrap();
        assert!(written > 0);
        assert_ne!(before, grid);
        for (c, _) in before.iter() {
            if net.mask.value(c) == 0.0 {
                assert_eq!(grid.get(c), before.get(c));
            }
        }
    }

    #[test]
    fn test_same_seed_same_network() {
        let params = NetworkParams::river();
        let a = build_network(&full_mask(64), &slope(64), &params, 99).unwrap();
        let b = build_network(&full_mask(64), &slope(64), &params, 99).unwrap();
        assert_eq!(a.nodes, b.nodes);
        assert_eq!(a.mask, b.mask);
    }
}
