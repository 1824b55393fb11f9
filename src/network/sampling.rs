//! Random node sampling inside a candidate mask.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::grid::{ElevationGrid, GridCoord, Mask};

/// A sampled network vertex with its cached elevation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub coord: GridCoord,
    pub elevation: f32,
}

/// Result of a bounded sampling run.
#[derive(Clone, Debug)]
pub struct NodeSample {
    pub nodes: Vec<GraphNode>,
    pub attempts: usize,
}

/// Draw up to `count` distinct cells uniformly, rejecting those whose mask
/// value is below `threshold`. Stops after `count * max_attempts_per_node` draws.
pub fn sample_nodes<R: Rng>(
    mask: &Mask,
    elevation: &ElevationGrid,
    count: usize,
    threshold: f32,
    max_attempts_per_node: usize,
    rng: &mut R,
) -> NodeSample {
    let (w, h) = (mask.width() as i32, mask.height() as i32);
    let budget = count.saturating_mul(max_attempts_per_node);
    let mut seen = HashSet::with_capacity(count);
    let mut nodes = Vec::with_capacity(count);
    let mut attempts = 0;

    while nodes.len() < count && attempts < budget {
        attempts += 1;
        let c = GridCoord::new(rng.gen_range(0..w), rng.gen_range(0..h));
        if !mask.contains(c, threshold) || !seen.insert(c) {
            continue;
        }
        let Some(elevation) = elevation.get(c) else {
            continue;
        };
        nodes.push(GraphNode { coord: c, elevation });
    }

    NodeSample { nodes, attempts }
}
