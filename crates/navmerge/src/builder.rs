// builder.rs - per-navmesh build driver and the navmesh generator boundary
//
// For every navmesh in the scene: pick the region, merge the geometry into
// navmesh-local space, and hand the result to the external generator.

use glam::Vec3;
use tracing::{info, warn};

use crate::bounds::{DEFAULT_TILE_RADIUS, RegionMode, RegionSelector};
use crate::merge::{MergedMeshBuffer, MeshMerger};
use crate::scene::Scene;
use crate::transform::TransformResolver;

// ============================================================================
// Generator configuration (JSON)
// ============================================================================

/// Settings forwarded untouched to the navmesh generator
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavmeshConfig {
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    #[serde(default = "default_cell_height")]
    pub cell_height: f32,
    #[serde(default = "default_walkable_slope_angle")]
    pub walkable_slope_angle: f32,
    #[serde(default = "default_walkable_height")]
    pub walkable_height: f32,
    #[serde(default = "default_walkable_climb")]
    pub walkable_climb: f32,
    #[serde(default = "default_walkable_radius")]
    pub walkable_radius: f32,
    #[serde(default = "default_min_region_area")]
    pub min_region_area: i32,
}

fn default_cell_size() -> f32 {
    0.3
}
fn default_cell_height() -> f32 {
    0.3
}
fn default_walkable_slope_angle() -> f32 {
    30.0
}
fn default_walkable_height() -> f32 {
    2.0
}
fn default_walkable_climb() -> f32 {
    1.0
}
fn default_walkable_radius() -> f32 {
    0.5
}
fn default_min_region_area() -> i32 {
    3
}

impl Default for NavmeshConfig {
    fn default() -> Self {
        Self {
            cell_size: default_cell_size(),
            cell_height: default_cell_height(),
            walkable_slope_angle: default_walkable_slope_angle(),
            walkable_height: default_walkable_height(),
            walkable_climb: default_walkable_climb(),
            walkable_radius: default_walkable_radius(),
            min_region_area: default_min_region_area(),
        }
    }
}

// ============================================================================
// Generator boundary
// ============================================================================

/// External navmesh generator
///
/// Receives valid indices only: every index is below `vertices.len()` and
/// every triangle has three distinct corners. Deciding whether an empty mesh
/// is acceptable is up to the implementation.
pub trait NavmeshBuildAdapter {
    type Root;

    fn build(
        &mut self,
        config: &NavmeshConfig,
        vertices: &[[f32; 3]],
        indices: &[u32],
    ) -> anyhow::Result<Self::Root>;
}

/// One built navmesh, ready to replace the old one
#[derive(Debug)]
pub struct BuiltNavmesh<R> {
    pub name: String,
    pub origin: Vec3,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub root: R,
}

// ============================================================================
// NavmeshBuilder
// ============================================================================

#[derive(Clone, Copy, Debug)]
pub struct NavmeshBuilder {
    tile_radius: f32,
    merger: MeshMerger,
    unit_scale: f32,
}

impl NavmeshBuilder {
    /// `tile_radius` only applies to field scenes
    pub fn new(tile_radius: f32, merger: MeshMerger, unit_scale: f32) -> Self {
        Self {
            tile_radius,
            merger,
            unit_scale,
        }
    }

    /// Merge the geometry for the navmesh at `origin`
    ///
    /// The region follows the scene's own mode; terrain is only merged for
    /// field scenes.
    pub fn merged_mesh(&self, scene: &Scene, origin: Vec3) -> anyhow::Result<MergedMeshBuffer> {
        let selector = RegionSelector::new(scene.mode, self.tile_radius);
        let bounds = selector.select(origin)?;
        let resolver = TransformResolver::new(origin, self.unit_scale)?;
        let include_terrain = scene.mode == RegionMode::Field;

        Ok(self.merger.merge(scene, &bounds, &resolver, include_terrain))
    }

    /// Build every navmesh of the scene
    ///
    /// Stops at the first failure; nothing built so far is returned then.
    pub fn build_all<A: NavmeshBuildAdapter>(
        &self,
        scene: &Scene,
        config: &NavmeshConfig,
        adapter: &mut A,
    ) -> anyhow::Result<Vec<BuiltNavmesh<A::Root>>> {
        let mut built = Vec::with_capacity(scene.navmeshes.len());

        for (i, navmesh) in scene.navmeshes.iter().enumerate() {
            info!(
                "[{}/{}] Building navmesh '{}' at {:?}",
                i + 1,
                scene.navmeshes.len(),
                navmesh.name,
                navmesh.origin
            );

            let merged = self.merged_mesh(scene, navmesh.origin)?;
            if merged.is_empty() {
                warn!("Navmesh '{}': no geometry inside its region", navmesh.name);
            }

            let vertices = merged.vertex_triples();
            let root = adapter.build(config, &vertices, merged.indices())?;

            built.push(BuiltNavmesh {
                name: navmesh.name.clone(),
                origin: navmesh.origin,
                vertex_count: vertices.len(),
                triangle_count: merged.triangle_count(),
                root,
            });
        }

        Ok(built)
    }
}

impl Default for NavmeshBuilder {
    fn default() -> Self {
        Self::new(
            DEFAULT_TILE_RADIUS,
            MeshMerger::default(),
            crate::DEFAULT_PREVIEW_SCALE,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MergeError;
    use crate::mesh::{Quad, RawMesh, triangulate};
    use crate::terrain::{TILE_VERTEX_COUNT, TerrainTile};
    use crate::transform::Transform;
    use std::sync::Arc;

    /// Records what it was handed
    #[derive(Default)]
    struct RecordingAdapter {
        calls: Vec<(Vec<[f32; 3]>, Vec<u32>)>,
    }

    impl NavmeshBuildAdapter for RecordingAdapter {
        type Root = usize;

        fn build(
            &mut self,
            _config: &NavmeshConfig,
            vertices: &[[f32; 3]],
            indices: &[u32],
        ) -> anyhow::Result<usize> {
            for tri in indices.chunks_exact(3) {
                assert!(tri.iter().all(|&i| (i as usize) < vertices.len()));
                assert!(tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2]);
            }
            self.calls.push((vertices.to_vec(), indices.to_vec()));
            Ok(self.calls.len())
        }
    }

    struct FailingAdapter;

    impl NavmeshBuildAdapter for FailingAdapter {
        type Root = ();

        fn build(&mut self, _: &NavmeshConfig, _: &[[f32; 3]], _: &[u32]) -> anyhow::Result<()> {
            anyhow::bail!("generator refused the mesh")
        }
    }

    fn two_tile_scene() -> Scene {
        let mesh = Arc::new(
            triangulate(&RawMesh {
                vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Z, Vec3::new(1.0, 0.0, 1.0)],
                quads: vec![Quad([0, 2, 3, 1])],
            })
            .unwrap(),
        );

        let mut scene = Scene::new(RegionMode::Field);
        scene.add_navmesh("west", Vec3::ZERO);
        scene.add_navmesh("east", Vec3::new(250.0, 0.0, 0.0));
        // Preview units at 0.1: world (100, 0, 100) and (300, 0, 100)
        scene.add_collision(Transform::from_translation(Vec3::new(10.0, 0.0, 10.0)), mesh.clone());
        scene.add_collision(Transform::from_translation(Vec3::new(30.0, 0.0, 10.0)), mesh);
        scene
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: NavmeshConfig = serde_json::from_str(r#"{ "cellSize": 0.5 }"#).unwrap();
        assert_eq!(config.cell_size, 0.5);
        assert_eq!(config.walkable_slope_angle, 30.0);
        assert_eq!(config.min_region_area, 3);
    }

    #[test]
    fn test_build_all_tiles() {
        let scene = two_tile_scene();
        let builder = NavmeshBuilder::default();
        let mut adapter = RecordingAdapter::default();

        let built = builder
            .build_all(&scene, &NavmeshConfig::default(), &mut adapter)
            .unwrap();

        assert_eq!(built.len(), 2);
        assert_eq!(built[0].name, "west");
        assert_eq!(built[0].triangle_count, 2);
        assert_eq!(built[1].root, 2);
        assert_eq!(adapter.calls.len(), 2);

        // Each navmesh only sees its own shape, relative to its own origin
        let (west_vertices, west_indices) = &adapter.calls[0];
        assert_eq!(west_vertices.len(), 4);
        assert_eq!(west_indices, &vec![0, 2, 3, 3, 1, 0]);
        assert!((west_vertices[0][0] - 100.0).abs() < 1e-3);

        let (east_vertices, _) = &adapter.calls[1];
        assert!((east_vertices[0][0] - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_single_object_takes_everything() {
        let mut scene = two_tile_scene();
        scene.mode = RegionMode::SingleObject;
        scene.navmeshes.truncate(1);

        let builder = NavmeshBuilder::new(10.0, MeshMerger::default(), 0.1);
        let merged = builder.merged_mesh(&scene, Vec3::ZERO).unwrap();
        assert_eq!(merged.vertices().len(), 8);
        assert_eq!(merged.triangle_count(), 4);
    }

    #[test]
    fn test_default_builder_follows_scene_mode() {
        let mut scene = Scene::new(RegionMode::SingleObject);
        scene.add_navmesh("object", Vec3::ZERO);
        // Far outside any field tile around the origin
        scene.add_collision(
            Transform::from_translation(Vec3::new(-100.0, 0.0, -100.0)),
            Arc::new(
                triangulate(&RawMesh {
                    vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
                    quads: vec![Quad([0, 1, 2, 2])],
                })
                .unwrap(),
            ),
        );
        let tile = TerrainTile::from_heights(
            vec![0.0; TILE_VERTEX_COUNT],
            scene.terrain_indices(),
            0.1,
        )
        .unwrap();
        scene.add_terrain(Transform::IDENTITY, tile);

        let builder = NavmeshBuilder::default();
        let merged = builder.merged_mesh(&scene, Vec3::ZERO).unwrap();
        assert_eq!(merged.vertices().len(), 3);
        assert_eq!(merged.indices(), &[0, 1, 2]);

        // The same builder uses tile bounds and terrain once the scene is a field
        scene.mode = RegionMode::Field;
        let merged = builder.merged_mesh(&scene, Vec3::ZERO).unwrap();
        assert!(!merged.is_empty());
        assert!(merged.vertices().iter().all(|v| v.x > -100.0));
    }

    #[test]
    fn test_adapter_failure_aborts() {
        let scene = two_tile_scene();
        let result = NavmeshBuilder::default().build_all(
            &scene,
            &NavmeshConfig::default(),
            &mut FailingAdapter,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_scale_is_rejected_before_merge() {
        let scene = two_tile_scene();
        let builder = NavmeshBuilder::new(DEFAULT_TILE_RADIUS, MeshMerger::default(), 0.0);
        let err = builder.merged_mesh(&scene, Vec3::ZERO).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MergeError>(),
            Some(MergeError::InvalidUnitScale(_))
        ));
    }
}
