// navmerge - scene geometry aggregation for navigation mesh builds
//
// Collects collision shapes and terrain tiles, filters them by a region of
// interest, moves everything into navmesh-local space and merges it into one
// vertex/index buffer for an external navmesh generator.

pub mod bounds;
pub mod builder;
pub mod error;
pub mod export;
pub mod merge;
pub mod mesh;
pub mod scene;
pub mod terrain;
pub mod transform;

pub use bounds::{RegionMode, RegionSelector, SpatialBounds};
pub use builder::{NavmeshBuildAdapter, NavmeshBuilder, NavmeshConfig};
pub use error::MergeError;
pub use merge::{IndexRemapTable, MergedMeshBuffer, MeshMerger};
pub use mesh::{Quad, RawMesh, Triangle, TriangulatedMesh, compute_normals, triangulate};
pub use scene::{CollisionInstance, Scene, SourceGeometry, TerrainInstance};
pub use terrain::{TerrainIndexBuffer, TerrainTile, TerrainVertex};
pub use transform::{Transform, TransformResolver};

/// Default conversion factor between preview (render) units and world units
pub const DEFAULT_PREVIEW_SCALE: f32 = 0.1;
