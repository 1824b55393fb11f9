//! Placement rules: what to place, where it may go and how candidates are drawn.
//!
//! All distances are in grid cells; heights are normalized elevation.

use serde::{Deserialize, Serialize};

use super::{EntityKind, FeatureKind};
use crate::core::{Error, Result};

/// Admissible distance range to a feature
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceBand {
    AtLeast(f32),
    AtMost(f32),
    Between(f32, f32),
}

impl DistanceBand {
    pub fn admits(&self, d: f32) -> bool {
        match *self {
            DistanceBand::AtLeast(min) => d >= min,
            DistanceBand::AtMost(max) => d <= max,
            DistanceBand::Between(min, max) => d >= min && d <= max,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureConstraint {
    pub feature: FeatureKind,
    pub band: DistanceBand,
}

/// Keep at least `radius` away from entities of another kind
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityConstraint {
    pub kind: EntityKind,
    pub radius: f32,
}

/// Probability gate applied after all constraints pass
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Density {
    Always,
    Uniform(f32),
    /// Accept with probability `noise01(p / scale) + bias`
    Noise { scale: f32, bias: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationMode {
    Random,
    Fixed(f32),
    /// Noise-coherent rotation snapped to `steps` equal turns
    Quantized { steps: u32, coherence: f32 },
}

/// Gate on which reference points may seed an along-path placement
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathGate {
    Open,
    /// Settlement centres drawn from reference points: certain within
    /// `core_radius`, fading to impossible at `max_radius`.
    Clusters {
        count: usize,
        core_radius: f32,
        max_radius: f32,
    },
    /// Accept where `rand <= noise01(p / scale) * strength`
    Noise { scale: f32, strength: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    GridScan {
        step: f32,
        jitter: f32,
        density: Density,
        orientation: OrientationMode,
    },
    AlongPath {
        reference: FeatureKind,
        min_offset: f32,
        max_offset: f32,
        attempt_multiplier: usize,
        gate: PathGate,
    },
}

/// Everything needed to place one kind of entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementRule {
    pub kind: EntityKind,
    pub mask_threshold: f32,
    pub height_band: (f32, f32),
    /// Degrees
    pub max_slope: f32,
    pub min_spacing: f32,
    pub features: Vec<FeatureConstraint>,
    pub exclusions: Vec<EntityConstraint>,
    /// Stop once this many are placed; required for along-path placement
    pub target_count: Option<usize>,
    /// Fewer than this is a hard failure
    pub min_count: usize,
    pub scale_range: (f32, f32),
    pub variants: u32,
    /// Radians added to every yaw
    pub rotation_offset: f32,
    pub strategy: Strategy,
}

impl Default for PlacementRule {
    fn default() -> Self {
        Self {
            kind: EntityKind::Tree,
            mask_threshold: 0.5,
            height_band: (0.0, 1.0),
            max_slope: 90.0,
            min_spacing: 0.0,
            features: Vec::new(),
            exclusions: Vec::new(),
            target_count: None,
            min_count: 0,
            scale_range: (1.0, 1.0),
            variants: 1,
            rotation_offset: 0.0,
            strategy: Strategy::GridScan {
                step: 1.0,
                jitter: 0.0,
                density: Density::Always,
                orientation: OrientationMode::Random,
            },
        }
    }
}

impl PlacementRule {
    /// Houses lining the roads, clustered around a few settlement centres.
    pub fn houses() -> Self {
        Self {
            kind: EntityKind::House,
            max_slope: 30.0,
            min_spacing: 15.0,
            features: vec![FeatureConstraint {
                feature: FeatureKind::River,
                band: DistanceBand::AtLeast(4.0),
            }],
            target_count: Some(150),
            scale_range: (1.0, 1.0),
            variants: 3,
            strategy: Strategy::AlongPath {
                reference: FeatureKind::Road,
                min_offset: 8.0,
                max_offset: 12.0,
                attempt_multiplier: 20,
                gate: PathGate::Clusters {
                    count: 3,
                    core_radius: 100.0,
                    max_radius: 400.0,
                },
            },
            ..Default::default()
        }
    }

    /// Rice paddies on a regular plot lattice with coherent right-angle rotations.
    pub fn paddies() -> Self {
        Self {
            kind: EntityKind::Paddy,
            max_slope: 30.0,
            min_spacing: 0.0,
            features: vec![
                FeatureConstraint {
                    feature: FeatureKind::Road,
                    band: DistanceBand::AtLeast(5.0),
                },
                FeatureConstraint {
                    feature: FeatureKind::River,
                    band: DistanceBand::AtLeast(3.0),
                },
            ],
            exclusions: vec![EntityConstraint {
                kind: EntityKind::House,
                radius: 15.0,
            }],
            strategy: Strategy::GridScan {
                step: 10.0,
                jitter: 0.0,
                density: Density::Always,
                orientation: OrientationMode::Quantized {
                    steps: 4,
                    coherence: 0.1,
                },
            },
            ..Default::default()
        }
    }

    /// Sparse trees on high, moderately steep ground.
    pub fn trees() -> Self {
        Self {
            kind: EntityKind::Tree,
            height_band: (0.4, 1.0),
            max_slope: 40.0,
            scale_range: (0.8, 1.5),
            variants: 4,
            exclusions: vec![EntityConstraint {
                kind: EntityKind::House,
                radius: 6.0,
            }],
            strategy: Strategy::GridScan {
                step: 5.0,
                jitter: 2.5,
                density: Density::Uniform(0.05),
                orientation: OrientationMode::Random,
            },
            ..Default::default()
        }
    }

    /// Grass tufts everywhere off the roads.
    pub fn grass() -> Self {
        Self {
            kind: EntityKind::Grass,
            mask_threshold: 0.5,
            max_slope: 45.0,
            features: vec![FeatureConstraint {
                feature: FeatureKind::Road,
                band: DistanceBand::AtLeast(1.0),
            }],
            exclusions: vec![
                EntityConstraint {
                    kind: EntityKind::House,
                    radius: 4.0,
                },
                EntityConstraint {
                    kind: EntityKind::Paddy,
                    radius: 6.0,
                },
                EntityConstraint {
                    kind: EntityKind::Field,
                    radius: 5.0,
                },
            ],
            scale_range: (0.8, 1.2),
            strategy: Strategy::GridScan {
                step: 3.0,
                jitter: 1.5,
                density: Density::Noise {
                    scale: 24.0,
                    bias: -0.1,
                },
                orientation: OrientationMode::Random,
            },
            ..Default::default()
        }
    }

    /// Dry fields on nearly level ground close to a road.
    pub fn fields() -> Self {
        Self {
            kind: EntityKind::Field,
            max_slope: 2.0,
            min_spacing: 12.0,
            features: vec![FeatureConstraint {
                feature: FeatureKind::Road,
                band: DistanceBand::Between(4.0, 50.0),
            }],
            exclusions: vec![EntityConstraint {
                kind: EntityKind::House,
                radius: 10.0,
            }],
            target_count: Some(40),
            strategy: Strategy::GridScan {
                step: 8.0,
                jitter: 3.0,
                density: Density::Always,
                orientation: OrientationMode::Random,
            },
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::InvalidParameter(format!("{} rule: {}", self.kind, msg)));

        if self.height_band.0 > self.height_band.1 {
            return fail(format!("height band {:?} is inverted", self.height_band));
        }
        if self.scale_range.0 > self.scale_range.1 || self.scale_range.0 <= 0.0 {
            return fail(format!("scale range {:?} is invalid", self.scale_range));
        }
        if self.min_spacing < 0.0 || !self.min_spacing.is_finite() {
            return fail(format!("min_spacing {} is invalid", self.min_spacing));
        }
        if self.variants == 0 {
            return fail("variants must be at least 1".into());
        }
        for c in &self.features {
            if let DistanceBand::Between(lo, hi) = c.band {
                if lo > hi {
                    return fail(format!("feature band for {:?} is inverted", c.feature));
                }
            }
        }
        match self.strategy {
            Strategy::GridScan {
                step,
                density,
                orientation,
                ..
            } => {
                if !(step > 0.0) {
                    return fail(format!("grid step {} must be positive", step));
                }
                if let Density::Noise { scale, .. } = density {
                    if !(scale > 0.0) {
                        return fail("density noise scale must be positive".into());
                    }
                }
                if let OrientationMode::Quantized { steps: 0, .. } = orientation {
                    return fail("quantized orientation needs at least one step".into());
                }
            }
            Strategy::AlongPath {
                min_offset,
                max_offset,
                attempt_multiplier,
                gate,
                ..
            } => {
                if self.target_count.is_none() {
                    return fail("along-path placement needs a target count".into());
                }
                if min_offset < 0.0 || min_offset > max_offset {
                    return fail(format!("offset range [{}, {}] is invalid", min_offset, max_offset));
                }
                if attempt_multiplier == 0 {
                    return fail("attempt_multiplier must be at least 1".into());
                }
                if let PathGate::Clusters {
                    core_radius,
                    max_radius,
                    ..
                } = gate
                {
                    if core_radius > max_radius {
                        return fail("cluster core radius exceeds max radius".into());
                    }
                }
            }
        }
        Ok(())
    }
}
