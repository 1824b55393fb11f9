//! Constrained placement of typed entities (houses, paddies, trees, grass).
//!
//! A [`PlacementRule`] describes one entity kind: the constraints every
//! candidate must satisfy and how candidates are drawn (lattice scan or
//! rejection sampling beside a road). Calls are sequenced through an
//! [`EntityLedger`] so later kinds can keep clear of earlier ones.

pub mod engine;
pub mod entity;
pub mod features;
pub mod footprint;
pub mod rule;
pub mod surface;

mod along_path;
mod grid_scan;

pub use engine::{PlacementEngine, PlacementOutcome, RejectionStats, place};
pub use entity::{
    EntityKind, EntityLedger, PlacedEntity, TerrainBounds, normalize_yaw, yaw_toward,
};
pub use features::{FeatureKind, FeatureMaps};
pub use footprint::{Footprint, flatten_footprint};
pub use rule::{
    Density, DistanceBand, EntityConstraint, FeatureConstraint, OrientationMode, PathGate,
    PlacementRule, Strategy,
};
pub use surface::{GridSurface, SurfaceSampler};
