//! Distance fields and point sets for the linear and areal features that
//! placement rules measure against.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::grid::{DEFAULT_THRESHOLD, DistanceField, Mask, PointIndex};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Road,
    River,
    Forest,
    Settlement,
    Farmland,
}

/// Bucket size for feature point lookups, in cells
const POINT_BUCKET: f32 = 8.0;

struct Feature {
    field: DistanceField,
    points: PointIndex,
}

/// Per-feature distance fields (for bands) and point sets (for path sampling).
#[derive(Default)]
pub struct FeatureMaps {
    features: HashMap<FeatureKind, Feature>,
}

impl FeatureMaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a feature from its mask; cells at or above the default threshold count.
    pub fn insert(&mut self, kind: FeatureKind, mask: &Mask) -> Result<()> {
        let field = DistanceField::from_mask(mask, DEFAULT_THRESHOLD)?;
        let points = PointIndex::from_mask(mask, DEFAULT_THRESHOLD, POINT_BUCKET);
        log::debug!("Feature {:?}: {} points", kind, points.len());
        self.features.insert(kind, Feature { field, points });
        Ok(())
    }

    pub fn with(mut self, kind: FeatureKind, mask: &Mask) -> Result<Self> {
        self.insert(kind, mask)?;
        Ok(self)
    }

    pub fn contains(&self, kind: FeatureKind) -> bool {
        self.features.contains_key(&kind)
    }

    /// Distance in cells from `p` to the feature, `None` if never registered.
    pub fn distance(&self, kind: FeatureKind, p: Vec2) -> Option<f32> {
        self.features.get(&kind).map(|f| f.field.distance_at(p))
    }

    pub fn points(&self, kind: FeatureKind) -> Option<&PointIndex> {
        self.features.get(&kind).map(|f| &f.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridCoord;

    #[test]
    fn test_feature_distance_and_points() {
        let road = Mask::from_predicate(20, 20, |_, y| y == 10).unwrap();
        let features = FeatureMaps::new().with(FeatureKind::Road, &road).unwrap();

        assert!(features.contains(FeatureKind::Road));
        assert!(!features.contains(FeatureKind::River));
        assert_eq!(features.distance(FeatureKind::Road, Vec2::new(4.5, 10.5)), Some(0.0));
        assert_eq!(features.distance(FeatureKind::Road, Vec2::new(4.5, 14.5)), Some(4.0));
        assert_eq!(features.distance(FeatureKind::River, Vec2::ZERO), None);

        let points = features.points(FeatureKind::Road).unwrap();
        assert_eq!(points.len(), 20);
        let (_, d) = points.nearest(GridCoord::new(3, 13).center()).unwrap();
        assert!((d - 3.0).abs() < 1e-5);
    }
}
