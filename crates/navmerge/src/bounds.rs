// bounds.rs - region of interest for a navmesh build
//
// Field maps are split into tiles; each navmesh only takes geometry from the
// column above its own tile. Single-object scenes have no neighbours, so
// everything is included.

use glam::Vec3;

use crate::error::{MergeError, Result};

/// Horizontal extent of a field tile in world units
pub const DEFAULT_TILE_RADIUS: f32 = 250.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RegionMode {
    /// Tiled field map: bounded footprint, unbounded height
    #[default]
    Field,
    /// One object being edited on its own
    SingleObject,
}

/// Axis-aligned inclusion box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialBounds {
    min: Vec3,
    max: Vec3,
}

impl SpatialBounds {
    /// Fails when an axis is NaN or has min > max
    pub fn new(min: Vec3, max: Vec3) -> Result<Self> {
        for (axis, (lo, hi)) in ['x', 'y', 'z']
            .into_iter()
            .zip(min.to_array().into_iter().zip(max.to_array()))
        {
            if lo.is_nan() || hi.is_nan() || lo > hi {
                return Err(MergeError::InvalidBounds {
                    axis,
                    min: lo,
                    max: hi,
                });
            }
        }

        Ok(Self { min, max })
    }

    /// Bounds that accept every finite position
    pub fn everything() -> Self {
        Self {
            min: Vec3::splat(f32::MIN),
            max: Vec3::splat(f32::MAX),
        }
    }

    pub fn min(&self) -> Vec3 {
        self.min
    }

    pub fn max(&self) -> Vec3 {
        self.max
    }

    /// Whole-instance test: strict on the lower bound, inclusive on the upper.
    ///
    /// Adjacent tiles share a boundary plane; an instance exactly on it
    /// belongs to the tile for which it is the upper bound.
    pub fn contains_instance_origin(&self, p: Vec3) -> bool {
        p.cmpgt(self.min).all() && p.cmple(self.max).all()
    }

    /// Per-vertex test: inclusive on both ends, grown by `padding` on all axes
    pub fn contains_padded(&self, p: Vec3, padding: f32) -> bool {
        let pad = Vec3::splat(padding);
        p.cmpge(self.min - pad).all() && p.cmple(self.max + pad).all()
    }
}

/// Computes [`SpatialBounds`] for a navmesh origin
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionSelector {
    mode: RegionMode,
    radius: f32,
}

impl RegionSelector {
    pub fn field(radius: f32) -> Self {
        Self {
            mode: RegionMode::Field,
            radius,
        }
    }

    pub fn single_object() -> Self {
        Self {
            mode: RegionMode::SingleObject,
            radius: 0.0,
        }
    }

    pub fn new(mode: RegionMode, radius: f32) -> Self {
        match mode {
            RegionMode::Field => Self::field(radius),
            RegionMode::SingleObject => Self::single_object(),
        }
    }

    pub fn mode(&self) -> RegionMode {
        self.mode
    }

    pub fn select(&self, origin: Vec3) -> Result<SpatialBounds> {
        match self.mode {
            RegionMode::Field => {
                let mut min = origin;
                min.y = f32::MIN;
                let mut max = origin + Vec3::splat(self.radius);
                max.y = f32::MAX;
                SpatialBounds::new(min, max)
            }
            RegionMode::SingleObject => Ok(SpatialBounds::everything()),
        }
    }
}

impl Default for RegionSelector {
    fn default() -> Self {
        Self::field(DEFAULT_TILE_RADIUS)
    }
}
