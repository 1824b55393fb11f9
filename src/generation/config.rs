//! Generation configuration: every knob of one pipeline run, loadable from JSON.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::grid::{GridCoord, GridRect};
use crate::network::NetworkParams;
use crate::placement::{Footprint, PlacementRule, TerrainBounds};
use crate::terrain::{MountainParams, NoiseParams, Plateau, ZoneParams};

/// Where the base elevation comes from
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElevationSource {
    Fractal(NoiseParams),
    Mountain(MountainParams),
    /// Provided by the caller through `GenerationPipeline::with_elevation`
    Supplied,
}

/// A single routed road between two fixed points
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrimaryRoad {
    pub start: GridCoord,
    pub end: GridCoord,
    pub slope_penalty: f32,
    pub width: f32,
    pub shoulder: f32,
}

impl Default for PrimaryRoad {
    fn default() -> Self {
        Self {
            start: GridCoord::new(10, 10),
            end: GridCoord::new(240, 240),
            slope_penalty: 50.0,
            width: 5.0,
            shoulder: 2.0,
        }
    }
}

/// Region a placement rule draws candidates from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateArea {
    Everywhere,
    Forest,
    Settlement,
    Farmland,
    /// Settlement ∪ farmland
    FlatArea,
}

/// Sink and level the ground under each placed entity
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FootprintFlatten {
    pub footprint: Footprint,
    /// Normalized elevation removed below the entity's surface height
    pub lower_amount: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub rule: PlacementRule,
    pub area: CandidateArea,
    #[serde(default)]
    pub flatten: Option<FootprintFlatten>,
}

impl RuleConfig {
    pub fn new(rule: PlacementRule, area: CandidateArea) -> Self {
        Self {
            rule,
            area,
            flatten: None,
        }
    }
}

/// Configuration for one generation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Run seed; every stage derives its own stream from it.
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    /// World extent: x across columns, y for elevation 1.0, z across rows.
    pub world_size: Vec3,
    pub elevation: ElevationSource,
    pub plateaus: Vec<Plateau>,
    pub zones: ZoneParams,
    pub primary_road: Option<PrimaryRoad>,
    pub river: Option<NetworkParams>,
    pub roads: Option<NetworkParams>,
    /// Keep the road network off the river corridor (builds them in sequence).
    pub roads_avoid_river: bool,
    /// Blend terrain under the road network toward its centreline height.
    pub road_flatten_strength: Option<f32>,
    /// Applied in order; later rules see everything placed before them.
    pub rules: Vec<RuleConfig>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            width: 256,
            height: 256,
            world_size: Vec3::new(512.0, 100.0, 512.0),
            elevation: ElevationSource::Fractal(NoiseParams {
                scale: 20.0,
                ..Default::default()
            }),
            plateaus: vec![Plateau::new("village", GridRect::new(100, 100, 50, 50), 0.2, 10.0)],
            zones: ZoneParams::default(),
            primary_road: Some(PrimaryRoad::default()),
            river: Some(NetworkParams::river()),
            roads: Some(NetworkParams::roads()),
            roads_avoid_river: true,
            road_flatten_strength: Some(0.5),
            rules: vec![
                RuleConfig::new(PlacementRule::houses(), CandidateArea::FlatArea),
                RuleConfig {
                    rule: PlacementRule::paddies(),
                    area: CandidateArea::Farmland,
                    flatten: Some(FootprintFlatten {
                        footprint: Footprint::default(),
                        lower_amount: 0.01,
                    }),
                },
                RuleConfig::new(PlacementRule::fields(), CandidateArea::Settlement),
                RuleConfig::new(PlacementRule::trees(), CandidateArea::Forest),
                RuleConfig::new(PlacementRule::grass(), CandidateArea::Everywhere),
            ],
        }
    }
}

impl GenerationConfig {
    pub fn bounds(&self) -> TerrainBounds {
        TerrainBounds::new(self.width, self.height, self.world_size)
    }

    /// Reject anything that would fail mid-run.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidDimensions(format!(
                "terrain must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        self.bounds().validate()?;
        match &self.elevation {
            ElevationSource::Fractal(params) => params.validate()?,
            ElevationSource::Mountain(params) => params.validate()?,
            ElevationSource::Supplied => {}
        }
        self.zones.validate()?;
        if let Some(road) = &self.primary_road {
            if !(road.slope_penalty >= 0.0 && road.slope_penalty.is_finite()) {
                return Err(Error::InvalidParameter(format!(
                    "primary road slope penalty {} is invalid",
                    road.slope_penalty
                )));
            }
            if !(road.width >= 0.0 && road.shoulder >= 0.0) {
                return Err(Error::InvalidParameter("primary road width and shoulder must be non-negative".into()));
            }
            let inside = |c: GridCoord| {
                c.x >= 0 && c.y >= 0 && (c.x as usize) < self.width && (c.y as usize) < self.height
            };
            if !inside(road.start) || !inside(road.end) {
                return Err(Error::PathNotFound(format!(
                    "primary road endpoint outside {}x{} grid: ({},{}) -> ({},{})",
                    self.width, self.height, road.start.x, road.start.y, road.end.x, road.end.y
                )));
            }
        }
        for params in self.river.iter().chain(self.roads.iter()) {
            params.validate()?;
        }
        if let Some(s) = self.road_flatten_strength {
            if !(0.0..=1.0).contains(&s) {
                return Err(Error::InvalidParameter(format!(
                    "road flatten strength {} outside [0, 1]",
                    s
                )));
            }
        }
        for rc in &self.rules {
            rc.rule.validate()?;
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded generation config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::EntityKind;

    #[test]
    fn test_default_config_is_valid() {
        let config = GenerationConfig::default();
        assert_eq!(config.seed, 12345);
        assert_eq!((config.width, config.height), (256, 256));
        assert_eq!(config.rules.len(), 5);
        assert!(config.rules.iter().any(|rc| rc.rule.kind == EntityKind::Field));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("landscape.json");
        let mut config = GenerationConfig::default();
        config.seed = 7;
        config.elevation = ElevationSource::Mountain(MountainParams::default());
        config.save(&path).unwrap();

        let loaded = GenerationConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = GenerationConfig::from_json_str(r#"{ "seed": 3, "width": 300, "height": 280 }"#).unwrap();
        assert_eq!(config.seed, 3);
        assert_eq!(config.height, 280);
        assert_eq!(config.zones, ZoneParams::default());
    }

    #[test]
    fn test_primary_road_outside_grid_rejected() {
        let config = GenerationConfig::from_json_str(r#"{ "width": 64, "height": 64 }"#).unwrap();
        assert!(matches!(config.validate(), Err(Error::PathNotFound(_))));

        let config = GenerationConfig {
            width: 64,
            height: 64,
            primary_road: Some(PrimaryRoad {
                start: GridCoord::new(0, 0),
                end: GridCoord::new(63, 63),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = GenerationConfig {
            primary_road: Some(PrimaryRoad {
                start: GridCoord::new(-1, 10),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = GenerationConfig {
            width: 64,
            height: 64,
            primary_road: None,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GenerationConfig {
            width: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidDimensions(_))));

        let config = GenerationConfig {
            road_flatten_strength: Some(2.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = GenerationConfig::default();
        if let Some(roads) = config.roads.as_mut() {
            roads.node_count = 1;
        }
        assert!(matches!(config.validate(), Err(Error::InvalidParameter(_))));

        assert!(matches!(
            GenerationConfig::from_json_str("{ not json"),
            Err(Error::Config(_))
        ));
    }
}
