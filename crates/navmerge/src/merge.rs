// merge.rs - MeshMerger: one vertex/index buffer out of many scene sources
//
// Collision instances are kept or dropped whole, based on their origin.
// Terrain tiles are filtered per vertex, and any triangle touching a dropped
// vertex is dropped with it.

use glam::Vec3;
use tracing::{debug, info, trace};

use crate::bounds::SpatialBounds;
use crate::scene::{CollisionInstance, Scene, TerrainInstance};
use crate::transform::TransformResolver;

/// Extra margin around the region for terrain vertices, in world units
pub const DEFAULT_TERRAIN_PADDING: f32 = 5.0;

/// Append-only vertex/index accumulator
///
/// Every index refers to a vertex that was already pushed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergedMeshBuffer {
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
}

impl MergedMeshBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next pushed vertex will get
    pub fn vertex_base(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn push_vertex(&mut self, v: Vec3) -> u32 {
        let index = self.vertex_base();
        self.vertices.push(v);
        index
    }

    pub fn push_triangle(&mut self, tri: [u32; 3]) {
        debug_assert!(
            tri.iter().all(|&i| i < self.vertex_base()),
            "triangle {:?} references a vertex past {}",
            tri,
            self.vertices.len()
        );
        self.indices.extend_from_slice(&tri);
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertices as raw numeric triples for the navmesh builder
    pub fn vertex_triples(&self) -> Vec<[f32; 3]> {
        self.vertices.iter().map(|v| v.to_array()).collect()
    }
}

/// Original tile vertex index -> merged index, `None` once removed
#[derive(Clone, Debug)]
pub struct IndexRemapTable {
    slots: Vec<Option<u32>>,
    kept: usize,
}

impl IndexRemapTable {
    /// All vertices start out removed
    pub fn new(vertex_count: usize) -> Self {
        Self {
            slots: vec![None; vertex_count],
            kept: 0,
        }
    }

    /// Indices past the table are ignored
    pub fn keep(&mut self, original: usize, merged: u32) {
        let Some(slot) = self.slots.get_mut(original) else {
            return;
        };
        if slot.replace(merged).is_none() {
            self.kept += 1;
        }
    }

    pub fn get(&self, original: u32) -> Option<u32> {
        self.slots.get(original as usize).copied().flatten()
    }

    pub fn kept(&self) -> usize {
        self.kept
    }

    pub fn all_removed(&self) -> bool {
        self.kept == 0
    }

    /// Remapped triangle, or `None` if any corner was removed
    ///
    /// Anything other than exactly three indices is treated as removed.
    pub fn remap_triangle(&self, tri: &[u32]) -> Option<[u32; 3]> {
        let &[a, b, c] = tri else {
            return None;
        };
        Some([self.get(a)?, self.get(b)?, self.get(c)?])
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshMerger {
    terrain_padding: f32,
}

impl Default for MeshMerger {
    fn default() -> Self {
        Self::new(DEFAULT_TERRAIN_PADDING)
    }
}

impl MeshMerger {
    pub fn new(terrain_padding: f32) -> Self {
        Self { terrain_padding }
    }

    /// Merge every source of `scene` that falls inside `bounds`
    ///
    /// Collision instances come first, then terrain tiles when
    /// `include_terrain` is set (field maps only).
    pub fn merge(
        &self,
        scene: &Scene,
        bounds: &SpatialBounds,
        resolver: &TransformResolver,
        include_terrain: bool,
    ) -> MergedMeshBuffer {
        let mut buffer = MergedMeshBuffer::new();

        let mut collision_kept = 0usize;
        let mut collision_skipped = 0usize;
        for instance in scene.collision() {
            if self.merge_collision(&mut buffer, instance, bounds, resolver) {
                collision_kept += 1;
            } else {
                collision_skipped += 1;
            }
        }

        let mut tiles_used = 0usize;
        if include_terrain {
            for tile in scene.terrain() {
                if self.merge_terrain(&mut buffer, tile, bounds, resolver) {
                    tiles_used += 1;
                }
            }
        }

        info!(
            "Merged mesh: {} vertices, {} triangles ({} collision kept, {} skipped, {} terrain tile(s))",
            buffer.vertices.len(),
            buffer.triangle_count(),
            collision_kept,
            collision_skipped,
            tiles_used
        );

        buffer
    }

    /// Returns false when the instance lies outside the region
    fn merge_collision(
        &self,
        buffer: &mut MergedMeshBuffer,
        instance: &CollisionInstance,
        bounds: &SpatialBounds,
        resolver: &TransformResolver,
    ) -> bool {
        let origin = resolver.to_unit_space(instance.transform.position);
        if !bounds.contains_instance_origin(origin) {
            trace!("Skipping collision instance at {:?}", origin);
            return false;
        }

        let mesh = &instance.mesh;
        let base = buffer.vertex_base();
        let to_navmesh = resolver.resolve(&instance.transform);

        buffer.vertices.reserve(mesh.vertices().len());
        for &v in mesh.vertices() {
            buffer.push_vertex(to_navmesh(v));
        }

        buffer.indices.reserve(mesh.indices().len());
        for tri in mesh.triangles() {
            let [a, b, c] = tri.0;
            buffer.push_triangle([a + base, b + base, c + base]);
        }

        true
    }

    /// Returns false when no vertex of the tile survived
    fn merge_terrain(
        &self,
        buffer: &mut MergedMeshBuffer,
        instance: &TerrainInstance,
        bounds: &SpatialBounds,
        resolver: &TransformResolver,
    ) -> bool {
        let matrix = instance.transform.matrix();
        let vertices = instance.tile.vertices();
        let mut remap = IndexRemapTable::new(vertices.len());

        for (i, vertex) in vertices.iter().enumerate() {
            let world = (matrix * vertex.position.extend(1.0)).truncate();
            if !bounds.contains_padded(resolver.to_unit_space(world), self.terrain_padding) {
                continue;
            }

            let merged = buffer.push_vertex(resolver.world_to_navmesh(world));
            remap.keep(i, merged);
        }

        if remap.all_removed() {
            return false;
        }

        let mut dropped = 0usize;
        for tri in instance.indices.indices().chunks_exact(3) {
            match remap.remap_triangle(tri) {
                Some(remapped) => buffer.push_triangle(remapped),
                None => dropped += 1,
            }
        }

        debug!(
            "Terrain tile: kept {} of {} vertices, dropped {} triangles",
            remap.kept(),
            vertices.len(),
            dropped
        );

        true
    }
}
