//! Node networks: rivers and road grids spanning a candidate region.
//!
//! Nodes are sampled inside a mask, joined by a Euclidean minimum spanning
//! tree and rasterized back into a mask. River networks grade each edge's
//! width by how many nodes drain through it toward the lowest node.

pub mod builder;
pub mod flow;
pub mod mst;
pub mod raster;
pub mod sampling;

pub use builder::{Network, NetworkBuilder, NetworkParams, build_network, flatten_under_network};
pub use flow::{FlowTree, accumulate_flow};
pub use mst::{GraphEdge, UnionFind, complete_graph, kruskal, minimum_spanning_tree};
pub use raster::{rasterize_segment, segment_samples, stamp_disc, stamp_falloff};
pub use sampling::{GraphNode, NodeSample, sample_nodes};
