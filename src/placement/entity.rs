//! Placed entities and the per-run ledger that accumulates them.

use std::collections::BTreeMap;
use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Category of a placed object
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    House,
    Paddy,
    Field,
    Tree,
    Grass,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::House,
        EntityKind::Paddy,
        EntityKind::Field,
        EntityKind::Tree,
        EntityKind::Grass,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::House => "house",
            EntityKind::Paddy => "paddy",
            EntityKind::Field => "field",
            EntityKind::Tree => "tree",
            EntityKind::Grass => "grass",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One placed object in grid space.
///
/// `height` is the normalized surface elevation at `position`; `yaw` is the
/// facing angle in radians within `[0, 2π)`, measured from +y toward +x.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacedEntity {
    pub kind: EntityKind,
    pub position: Vec2,
    pub height: f32,
    pub yaw: f32,
    pub scale: f32,
    pub variant: u32,
}

impl PlacedEntity {
    /// Unit facing direction in grid space
    pub fn facing(&self) -> Vec2 {
        Vec2::new(self.yaw.sin(), self.yaw.cos())
    }

    pub fn world_position(&self, bounds: &TerrainBounds) -> Vec3 {
        bounds.to_world(self.position, self.height)
    }
}

/// Wrap an angle into `[0, 2π)`.
pub fn normalize_yaw(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(std::f32::consts::TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= std::f32::consts::TAU { 0.0 } else { wrapped }
}

/// Yaw that faces along `dir` (grid space). Zero vector faces +y.
pub fn yaw_toward(dir: Vec2) -> f32 {
    if dir.length_squared() <= f32::EPSILON {
        return 0.0;
    }
    normalize_yaw(dir.x.atan2(dir.y))
}

/// Grid extent and the world-space box it maps onto (Y up).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainBounds {
    pub grid_width: usize,
    pub grid_height: usize,
    /// World size: x across columns, y for elevation 1.0, z across rows
    pub world_size: Vec3,
}

impl TerrainBounds {
    pub fn new(grid_width: usize, grid_height: usize, world_size: Vec3) -> Self {
        Self {
            grid_width,
            grid_height,
            world_size,
        }
    }

    /// One world unit per cell horizontally, `vertical` units for elevation 1.0.
    pub fn unit_cells(grid_width: usize, grid_height: usize, vertical: f32) -> Self {
        Self::new(
            grid_width,
            grid_height,
            Vec3::new(grid_width as f32, vertical, grid_height as f32),
        )
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x < self.grid_width as f32 && p.y < self.grid_height as f32
    }

    /// World units per cell along x
    pub fn cell_size(&self) -> f32 {
        self.world_size.x / self.grid_width.max(1) as f32
    }

    /// Elevation scale expressed in cell widths, for slope computation
    pub fn vertical_scale(&self) -> f32 {
        let cell = self.cell_size();
        if cell > 0.0 { self.world_size.y / cell } else { 0.0 }
    }

    pub fn to_world(&self, p: Vec2, height: f32) -> Vec3 {
        Vec3::new(
            p.x / self.grid_width.max(1) as f32 * self.world_size.x,
            height * self.world_size.y,
            p.y / self.grid_height.max(1) as f32 * self.world_size.z,
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(Error::InvalidDimensions(format!(
                "terrain bounds grid is {}x{}",
                self.grid_width, self.grid_height
            )));
        }
        if !(self.world_size.min_element() > 0.0) || !self.world_size.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "world size must be positive, got {:?}",
                self.world_size
            )));
        }
        Ok(())
    }
}

/// Append-only record of everything placed during one run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityLedger {
    entities: Vec<PlacedEntity>,
}

impl EntityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entity: PlacedEntity) {
        self.entities.push(entity);
    }

    pub fn extend(&mut self, entities: impl IntoIterator<Item = PlacedEntity>) {
        self.entities.extend(entities);
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn as_slice(&self) -> &[PlacedEntity] {
        &self.entities
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacedEntity> {
        self.entities.iter()
    }

    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &PlacedEntity> {
        self.entities.iter().filter(move |e| e.kind == kind)
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Entities grouped by kind, in kind order
    pub fn grouped(&self) -> BTreeMap<EntityKind, Vec<PlacedEntity>> {
        let mut groups: BTreeMap<EntityKind, Vec<PlacedEntity>> = BTreeMap::new();
        for e in &self.entities {
            groups.entry(e.kind).or_default().push(*e);
        }
        groups
    }

    /// Write the grouped ledger as pretty JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.grouped())?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
