//! Settlegen - procedural settlement landscapes
//!
//! Terrain synthesis, slope-aware roads, river and road networks, land-use
//! zones and constrained placement of houses, fields and vegetation.

pub mod core;
pub mod grid;
pub mod terrain;
pub mod routing;
pub mod network;
pub mod placement;
pub mod generation;
