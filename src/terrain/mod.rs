//! Procedural terrain: heightmaps, plateaus, mountain bases and zoning

pub mod heightmap;
pub use heightmap::{HeightmapSynthesizer, NoiseParams, synthesize};

pub mod plateau;
pub use plateau::{Plateau, apply_plateau, apply_plateaus};

pub mod mountain;
pub use mountain::{MountainParams, synthesize_mountain};

pub mod zones;
pub use zones::{Zone, ZoneClassifier, ZoneMasks, ZoneParams, classify};
