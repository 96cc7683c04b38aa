// scene.rs - typed scene geometry collections
//
// A scene holds the navmeshes to (re)build and the geometry they are built
// from. Geometry is a closed set of variants kept in insertion order, which
// is also the order the merger visits them in.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bounds::RegionMode;
use crate::error::{MergeError, Result};
use crate::mesh::{Quad, RawMesh, TriangulatedMesh, triangulate};
use crate::terrain::{TerrainIndexBuffer, TerrainTile, decode_height_buffer};
use crate::transform::Transform;

/// A navmesh to build, anchored at `origin` (world units)
#[derive(Clone, Debug, PartialEq)]
pub struct NavmeshOrigin {
    pub name: String,
    pub origin: Vec3,
}

/// A placed collision shape
#[derive(Clone, Debug)]
pub struct CollisionInstance {
    pub transform: Transform,
    pub mesh: Arc<TriangulatedMesh>,
}

/// A placed terrain tile
#[derive(Clone, Debug)]
pub struct TerrainInstance {
    pub transform: Transform,
    pub tile: TerrainTile,
    pub indices: TerrainIndexBuffer,
}

#[derive(Clone, Debug)]
pub enum SourceGeometry {
    Collision(CollisionInstance),
    Terrain(TerrainInstance),
}

#[derive(Clone, Debug)]
pub struct Scene {
    pub mode: RegionMode,
    pub navmeshes: Vec<NavmeshOrigin>,
    geometry: Vec<SourceGeometry>,
    terrain_indices: TerrainIndexBuffer,
}

impl Scene {
    pub fn new(mode: RegionMode) -> Self {
        Self {
            mode,
            navmeshes: Vec::new(),
            geometry: Vec::new(),
            terrain_indices: TerrainIndexBuffer::new(),
        }
    }

    pub fn add_navmesh(&mut self, name: &str, origin: Vec3) {
        self.navmeshes.push(NavmeshOrigin {
            name: name.to_string(),
            origin,
        });
    }

    pub fn add_collision(&mut self, transform: Transform, mesh: Arc<TriangulatedMesh>) {
        self.geometry
            .push(SourceGeometry::Collision(CollisionInstance { transform, mesh }));
    }

    /// Terrain tiles all use the scene's shared index layout
    pub fn add_terrain(&mut self, transform: Transform, tile: TerrainTile) {
        self.geometry.push(SourceGeometry::Terrain(TerrainInstance {
            transform,
            tile,
            indices: self.terrain_indices.clone(),
        }));
    }

    /// Index layout every terrain tile of this scene shares
    pub fn terrain_indices(&self) -> &TerrainIndexBuffer {
        &self.terrain_indices
    }

    pub fn collision(&self) -> impl Iterator<Item = &CollisionInstance> + '_ {
        self.geometry.iter().filter_map(|g| match g {
            SourceGeometry::Collision(c) => Some(c),
            SourceGeometry::Terrain(_) => None,
        })
    }

    pub fn terrain(&self) -> impl Iterator<Item = &TerrainInstance> + '_ {
        self.geometry.iter().filter_map(|g| match g {
            SourceGeometry::Terrain(t) => Some(t),
            SourceGeometry::Collision(_) => None,
        })
    }

    /// Build a scene from its JSON description
    ///
    /// Relative height file paths are resolved against `base_dir`. Collision
    /// shapes are triangulated here, once, at load time.
    pub fn from_description(
        description: &SceneDescription,
        base_dir: &Path,
        preview_scale: f32,
    ) -> Result<Self> {
        let mut scene = Scene::new(description.mode);

        for (i, navmesh) in description.navmeshes.iter().enumerate() {
            let name = navmesh
                .name
                .clone()
                .unwrap_or_else(|| format!("navmesh_{}", i));
            scene.add_navmesh(&name, Vec3::from_array(navmesh.origin));
        }

        for shape in &description.collision {
            let mesh = triangulate(&shape.mesh.to_raw_mesh())?;
            debug!(
                "Loaded collision shape: {} vertices, {} triangles",
                mesh.vertices().len(),
                mesh.triangle_count()
            );
            scene.add_collision(shape.transform.to_transform(), Arc::new(mesh));
        }

        for terrain in &description.terrain {
            let tile = match &terrain.data {
                TerrainData::Inline { heights } => TerrainTile::from_heights(
                    heights.clone(),
                    &scene.terrain_indices,
                    preview_scale,
                )?,
                TerrainData::File { height_file } => {
                    let path = base_dir.join(height_file);
                    let decoded = read_height_file(&path)?;
                    TerrainTile::from_decoded(&decoded, &scene.terrain_indices, preview_scale)?
                }
            };
            scene.add_terrain(terrain.transform.to_transform(), tile);
        }

        info!(
            "Scene loaded: {} navmesh(es), {} collision instance(s), {} terrain tile(s)",
            scene.navmeshes.len(),
            scene.collision().count(),
            scene.terrain().count()
        );

        Ok(scene)
    }
}

fn read_height_file(path: &Path) -> Result<crate::terrain::DecodedTerrain> {
    let bytes = std::fs::read(path).map_err(|source| MergeError::HeightFile {
        path: path.to_path_buf(),
        source,
    })?;

    decode_height_buffer(&mut bytes.as_slice()).map_err(|e| match e {
        MergeError::Io(source) => MergeError::HeightFile {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

// ============================================================================
// JSON scene description
// ============================================================================

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDescription {
    #[serde(default)]
    pub mode: RegionMode,
    #[serde(default)]
    pub navmeshes: Vec<NavmeshDescription>,
    #[serde(default)]
    pub collision: Vec<CollisionDescription>,
    #[serde(default)]
    pub terrain: Vec<TerrainDescription>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavmeshDescription {
    #[serde(default)]
    pub name: Option<String>,
    pub origin: [f32; 3],
}

/// Position, euler rotation in degrees, scale
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformDescription {
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
}

impl Default for TransformDescription {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: default_scale(),
        }
    }
}

impl TransformDescription {
    pub fn to_transform(&self) -> Transform {
        Transform::from_euler_degrees(
            Vec3::from_array(self.position),
            self.rotation,
            Vec3::from_array(self.scale),
        )
    }
}

/// Quad mesh straight from the shape decoder
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMeshDescription {
    pub vertices: Vec<[f32; 3]>,
    #[serde(default)]
    pub quads: Vec<[u32; 4]>,
}

impl RawMeshDescription {
    pub fn to_raw_mesh(&self) -> RawMesh {
        RawMesh {
            vertices: self.vertices.iter().copied().map(Vec3::from_array).collect(),
            quads: self.quads.iter().copied().map(Quad).collect(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionDescription {
    #[serde(default)]
    pub transform: TransformDescription,
    #[serde(flatten)]
    pub mesh: RawMeshDescription,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TerrainData {
    File {
        #[serde(rename = "heightFile")]
        height_file: PathBuf,
    },
    Inline {
        heights: Vec<f32>,
    },
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerrainDescription {
    #[serde(default)]
    pub transform: TransformDescription,
    #[serde(flatten)]
    pub data: TerrainData,
}
