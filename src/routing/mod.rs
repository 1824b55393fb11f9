//! Slope-aware routing across the elevation grid

pub mod pathfinder;
pub use pathfinder::{DIAGONAL_COST, ORTHOGONAL_COST, Path, find_path, octile_distance};

pub mod carve;
pub use carve::{carve_road, road_cells};
