//! Landscape generation pipeline: one seeded run from elevation to entities.
//!
//! Stages run in a fixed order:
//! 1. Base elevation (fractal noise, edge mountain, or a supplied grid)
//! 2. Plateaus
//! 3. Zone classification
//! 4. Primary road (A* + carve)
//! 5. River and road networks, then optional flattening under the roads
//! 6. Placement rules in configuration order, with optional footprint flattening

pub mod config;

pub use config::{CandidateArea, ElevationSource, FootprintFlatten, GenerationConfig, PrimaryRoad, RuleConfig};

use std::time::Instant;

use crate::core::seed::{self, stream};
use crate::core::{DegradedResult, Error, Result};
use crate::grid::{DEFAULT_THRESHOLD, ElevationGrid, Mask};
use crate::network::{Network, NetworkParams, build_network, flatten_under_network};
use crate::placement::{
    EntityLedger, FeatureKind, FeatureMaps, GridSurface, PlacementEngine, TerrainBounds, flatten_footprint,
};
use crate::routing::{Path, carve_road, find_path};
use crate::terrain::{ZoneMasks, apply_plateaus, classify, synthesize, synthesize_mountain};

/// Everything one run produces.
pub struct GeneratedLandscape {
    pub elevation: ElevationGrid,
    pub zones: ZoneMasks,
    /// Primary road plus the road network
    pub road_mask: Mask,
    pub primary_path: Option<Path>,
    pub river: Option<Network>,
    pub roads: Option<Network>,
    pub entities: EntityLedger,
    pub bounds: TerrainBounds,
    /// Stages that produced less than requested
    pub warnings: Vec<DegradedResult>,
}

impl GeneratedLandscape {
    pub fn river_mask(&self) -> Option<&Mask> {
        self.river.as_ref().map(|n| &n.mask)
    }
}

/// Sequences all generation stages for one configuration.
pub struct GenerationPipeline {
    config: GenerationConfig,
    supplied: Option<ElevationGrid>,
}

impl GenerationPipeline {
    /// Create a pipeline, rejecting invalid configuration up front.
    pub fn new(config: GenerationConfig) -> Result<Self> {
        config.validate()?;
        if config.elevation == ElevationSource::Supplied {
            return Err(Error::InvalidParameter(
                "supplied elevation requires GenerationPipeline::with_elevation".into(),
            ));
        }
        Ok(Self { config, supplied: None })
    }

    /// Create a pipeline that starts from a caller-provided elevation grid.
    pub fn with_elevation(config: GenerationConfig, elevation: ElevationGrid) -> Result<Self> {
        config.validate()?;
        if elevation.dims() != (config.width, config.height) {
            return Err(Error::InvalidDimensions(format!(
                "supplied elevation is {}x{}, config expects {}x{}",
                elevation.width(),
                elevation.height(),
                config.width,
                config.height
            )));
        }
        Ok(Self {
            config,
            supplied: Some(elevation),
        })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn run(&self) -> Result<GeneratedLandscape> {
        let cfg = &self.config;
        let started = Instant::now();
        let bounds = cfg.bounds();
        let mut warnings = Vec::new();

        log::info!("Generating {}x{} landscape (seed {})", cfg.width, cfg.height, cfg.seed);

        // 1-2. Elevation and plateaus
        let t = Instant::now();
        let mut elevation = self.base_elevation()?;
        apply_plateaus(&mut elevation, &cfg.plateaus);
        log::info!("Elevation ready in {:?}", t.elapsed());

        // 3. Zones
        let zones = classify(&elevation, &cfg.zones, seed::derive_seed(cfg.seed, stream::ZONES))?;
        let flat_area = zones.flat_area()?;

        // 4. Primary road
        let mut road_mask = Mask::new(cfg.width, cfg.height)?;
        let primary_path = match &cfg.primary_road {
            Some(road) => {
                let t = Instant::now();
                let path = find_path(&elevation, road.start, road.end, road.slope_penalty)?;
                road_mask = carve_road(&mut elevation, &path, road.width, road.shoulder)?;
                log::info!(
                    "Primary road: {} cells, cost {:.1}, in {:?}",
                    path.len(),
                    path.cost,
                    t.elapsed()
                );
                Some(path)
            }
            None => None,
        };

        // 5. Networks
        let (river, roads) = self.build_networks(&elevation, &flat_area, &mut warnings)?;
        if let Some(roads) = &roads {
            road_mask = road_mask.union(&roads.mask, DEFAULT_THRESHOLD)?;
            if let Some(strength) = cfg.road_flatten_strength {
                let written = flatten_under_network(&mut elevation, roads, strength)?;
                log::debug!("Flattened {} cells under the road network", written);
            }
        }

        // 6. Placement
        let mut features = FeatureMaps::new()
            .with(FeatureKind::Road, &road_mask)?
            .with(FeatureKind::Forest, &zones.forest)?
            .with(FeatureKind::Settlement, &zones.settlement)?
            .with(FeatureKind::Farmland, &zones.farmland)?;
        if let Some(river) = &river {
            features.insert(FeatureKind::River, &river.mask)?;
        }

        let everywhere = Mask::filled(cfg.width, cfg.height, 1.0)?;
        let mut entities = EntityLedger::new();
        let placement_seed = seed::derive_seed(cfg.seed, stream::PLACEMENT);

        for (i, rc) in cfg.rules.iter().enumerate() {
            let candidates = match rc.area {
                CandidateArea::Everywhere => &everywhere,
                CandidateArea::Forest => &zones.forest,
                CandidateArea::Settlement => &zones.settlement,
                CandidateArea::Farmland => &zones.farmland,
                CandidateArea::FlatArea => &flat_area,
            };
            let outcome = {
                let surface = GridSurface::from_bounds(&elevation, &bounds);
                PlacementEngine::new(&surface, &features, bounds).place(
                    candidates,
                    &rc.rule,
                    &entities,
                    seed::derive_seed(placement_seed, i as u64),
                )?
            };

            if let Some(flatten) = rc.flatten {
                let written: usize = outcome
                    .entities
                    .iter()
                    .map(|e| flatten_footprint(&mut elevation, e, flatten.footprint, flatten.lower_amount))
                    .sum();
                log::debug!("Flattened {} cells under {} footprints", written, rc.rule.kind);
            }

            warnings.extend(outcome.degraded);
            entities.extend(outcome.entities);
        }

        log::info!(
            "Landscape generated in {:?}: {} entities, {} warnings",
            started.elapsed(),
            entities.len(),
            warnings.len()
        );

        Ok(GeneratedLandscape {
            elevation,
            zones,
            road_mask,
            primary_path,
            river,
            roads,
            entities,
            bounds,
            warnings,
        })
    }

    fn base_elevation(&self) -> Result<ElevationGrid> {
        let cfg = &self.config;
        let terrain_seed = seed::derive_seed(cfg.seed, stream::TERRAIN);
        match &cfg.elevation {
            ElevationSource::Fractal(params) => {
                let mut params = params.clone();
                params.seed = terrain_seed;
                synthesize(cfg.width, cfg.height, &params)
            }
            ElevationSource::Mountain(params) => synthesize_mountain(cfg.width, cfg.height, params, terrain_seed),
            ElevationSource::Supplied => self
                .supplied
                .clone()
                .ok_or_else(|| Error::InvalidParameter("no elevation grid supplied".into())),
        }
    }

    fn build_networks(
        &self,
        elevation: &ElevationGrid,
        flat_area: &Mask,
        warnings: &mut Vec<DegradedResult>,
    ) -> Result<(Option<Network>, Option<Network>)> {
        let cfg = &self.config;
        let river_seed = seed::derive_seed(cfg.seed, stream::RIVER);
        let roads_seed = seed::derive_seed(cfg.seed, stream::ROADS);

        let (river, roads) = if cfg.roads_avoid_river {
            let river = optional_network(cfg.river.as_ref(), flat_area, elevation, river_seed);
            let corridor = match &river {
                Ok(Some(n)) => flat_area.subtract(&n.mask, DEFAULT_THRESHOLD)?,
                _ => flat_area.clone(),
            };
            let roads = optional_network(cfg.roads.as_ref(), &corridor, elevation, roads_seed);
            (river, roads)
        } else {
            rayon::join(
                || optional_network(cfg.river.as_ref(), flat_area, elevation, river_seed),
                || optional_network(cfg.roads.as_ref(), flat_area, elevation, roads_seed),
            )
        };

        let river = soften(river, cfg.river.as_ref(), warnings)?;
        let roads = soften(roads, cfg.roads.as_ref(), warnings)?;
        Ok((river, roads))
    }
}

fn optional_network(
    params: Option<&NetworkParams>,
    candidates: &Mask,
    elevation: &ElevationGrid,
    seed: u64,
) -> Result<Option<Network>> {
    params
        .map(|p| build_network(candidates, elevation, p, seed))
        .transpose()
}

/// A network without enough candidate nodes is skipped with a warning.
fn soften(
    result: Result<Option<Network>>,
    params: Option<&NetworkParams>,
    warnings: &mut Vec<DegradedResult>,
) -> Result<Option<Network>> {
    match result {
        Ok(network) => {
            if let Some(degraded) = network.as_ref().and_then(|n| n.degraded.clone()) {
                warnings.push(degraded);
            }
            Ok(network)
        }
        Err(Error::InsufficientCandidates { found, required }) => {
            let stage = params.map_or("network", |p| p.name.as_str());
            let requested = params.map_or(required, |p| p.node_count);
            log::warn!("{}: skipped, only {} candidate nodes", stage, found);
            warnings.extend(DegradedResult::check(stage, requested, found, 0));
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::EntityKind;
    use crate::terrain::NoiseParams;

    fn small_config(seed: u64) -> GenerationConfig {
        let mut config = GenerationConfig {
            seed,
            width: 96,
            height: 96,
            world_size: glam::Vec3::new(96.0, 40.0, 96.0),
            elevation: ElevationSource::Fractal(NoiseParams {
                scale: 40.0,
                ..Default::default()
            }),
            plateaus: vec![crate::terrain::Plateau::new(
                "village",
                crate::grid::GridRect::new(30, 30, 30, 30),
                0.2,
                6.0,
            )],
            primary_road: Some(PrimaryRoad {
                start: crate::grid::GridCoord::new(4, 4),
                end: crate::grid::GridCoord::new(90, 90),
                ..Default::default()
            }),
            ..Default::default()
        };
        if let Some(river) = config.river.as_mut() {
            river.node_count = 8;
        }
        if let Some(roads) = config.roads.as_mut() {
            roads.node_count = 6;
        }
        for rc in &mut config.rules {
            rc.rule.target_count = rc.rule.target_count.map(|t| t.min(10));
        }
        config
    }

    #[test]
    fn test_same_seed_same_landscape() {
        let a = GenerationPipeline::new(small_config(9)).unwrap().run().unwrap();
        let b = GenerationPipeline::new(small_config(9)).unwrap().run().unwrap();

        assert_eq!(a.elevation.as_slice(), b.elevation.as_slice());
        assert_eq!(a.road_mask.as_grid().as_slice(), b.road_mask.as_grid().as_slice());
        assert_eq!(a.entities, b.entities);
        assert_eq!(a.warnings, b.warnings);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = GenerationPipeline::new(small_config(1)).unwrap().run().unwrap();
        let b = GenerationPipeline::new(small_config(2)).unwrap().run().unwrap();
        assert_ne!(a.elevation.as_slice(), b.elevation.as_slice());
    }

    #[test]
    fn test_run_produces_all_layers() {
        let landscape = GenerationPipeline::new(small_config(5)).unwrap().run().unwrap();

        assert_eq!(landscape.elevation.dims(), (96, 96));
        let path = landscape.primary_path.as_ref().unwrap();
        assert_eq!(path.start(), Some(crate::grid::GridCoord::new(4, 4)));
        assert_eq!(path.end(), Some(crate::grid::GridCoord::new(90, 90)));
        for c in &path.points {
            assert!(landscape.road_mask.contains(*c, DEFAULT_THRESHOLD));
        }
        let (lo, hi) = landscape.elevation.min_max();
        assert!(lo >= 0.0 && hi <= 1.0);
        assert!(landscape.entities.count(EntityKind::Grass) > 0);
    }

    #[test]
    fn test_later_rules_respect_earlier_entities() {
        let landscape = GenerationPipeline::new(small_config(11)).unwrap().run().unwrap();
        let houses: Vec<_> = landscape.entities.of_kind(EntityKind::House).collect();
        for grass in landscape.entities.of_kind(EntityKind::Grass) {
            for house in &houses {
                assert!(grass.position.distance(house.position) >= 4.0);
            }
        }
    }

    #[test]
    fn test_supplied_elevation() {
        let config = GenerationConfig {
            elevation: ElevationSource::Supplied,
            river: None,
            roads: None,
            ..small_config(3)
        };
        assert!(GenerationPipeline::new(config.clone()).is_err());

        let wrong = ElevationGrid::new(10, 10, 0.3).unwrap();
        assert!(matches!(
            GenerationPipeline::with_elevation(config.clone(), wrong),
            Err(Error::InvalidDimensions(_))
        ));

        let flat = ElevationGrid::new(96, 96, 0.3).unwrap();
        let landscape = GenerationPipeline::with_elevation(config, flat).unwrap().run().unwrap();
        assert!(landscape.river.is_none());
        // straight diagonal on flat ground
        assert_eq!(landscape.primary_path.unwrap().len(), 87);
    }

    fn lowland_config(avoid_river: bool) -> (GenerationConfig, ElevationGrid) {
        let mut config = small_config(21);
        config.elevation = ElevationSource::Supplied;
        config.primary_road = None;
        config.rules.clear();
        config.roads_avoid_river = avoid_river;
        // below every forest threshold, so the whole grid is flat area
        let low = ElevationGrid::from_fn(96, 96, |x, y| 0.05 + (x + y) as f32 * 0.0005).unwrap();
        (config, low)
    }

    #[test]
    fn test_road_nodes_avoid_river_corridor() {
        let (config, low) = lowland_config(true);
        let landscape = GenerationPipeline::with_elevation(config, low).unwrap().run().unwrap();
        let river = landscape.river.as_ref().unwrap();
        let roads = landscape.roads.as_ref().unwrap();
        assert!(roads.nodes.len() >= 2);
        for node in &roads.nodes {
            assert!(!river.mask.contains(node.coord, DEFAULT_THRESHOLD));
        }
    }

    #[test]
    fn test_concurrent_networks_when_river_not_avoided() {
        let (config, low) = lowland_config(false);
        let a = GenerationPipeline::with_elevation(config.clone(), low.clone()).unwrap().run().unwrap();
        let b = GenerationPipeline::with_elevation(config, low).unwrap().run().unwrap();

        let (river, roads) = (a.river.as_ref().unwrap(), a.roads.as_ref().unwrap());
        assert_eq!(river.nodes.len(), 8);
        assert_eq!(roads.nodes.len(), 6);
        assert!(river.flow.is_some() && roads.flow.is_none());
        assert_eq!(a.road_mask.as_grid().as_slice(), b.road_mask.as_grid().as_slice());
        assert_eq!(
            a.river_mask().unwrap().as_grid().as_slice(),
            b.river_mask().unwrap().as_grid().as_slice()
        );
    }

    #[test]
    fn test_missing_network_candidates_become_warnings() {
        let mut config = small_config(4);
        config.zones.forest_threshold_min = 0.0;
        config.zones.forest_threshold_max = 0.0;
        config.elevation = ElevationSource::Supplied;
        config.primary_road = None;
        config.rules.clear();

        // everything is forest, so no flat area for the networks
        let high = ElevationGrid::new(96, 96, 0.9).unwrap();
        let landscape = GenerationPipeline::with_elevation(config, high).unwrap().run().unwrap();
        assert!(landscape.river.is_none());
        assert!(landscape.roads.is_none());
        assert_eq!(landscape.warnings.len(), 2);
        assert!(landscape.warnings.iter().all(|w| w.achieved == 0));
    }
}
