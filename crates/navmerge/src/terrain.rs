// terrain.rs - terrain (water) tiles
//
// Every tile is a fixed 64x64 vertex grid spanning [-0.5, 0.5] on X/Z before
// its transform is applied. All tiles share one index layout, which is built
// once per scene and handed to each tile instead of living in a static.

use std::io::Read;
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt};
use glam::Vec3;

use crate::error::{MergeError, Result};
use crate::mesh::{Triangle, compute_normals};

/// Vertices along one side of a tile
pub const TILE_LENGTH: usize = 64;
pub const TILE_VERTEX_COUNT: usize = TILE_LENGTH * TILE_LENGTH;

/// Quads along one side of a tile
const CELLS_PER_SIDE: usize = TILE_LENGTH - 1;

/// Two triangles per cell, three indices per triangle
pub const TILE_INDEX_COUNT: usize = CELLS_PER_SIDE * CELLS_PER_SIDE * 2 * 3;

/// Raw u16 height to world height
pub const HEIGHT_SCALE: f32 = 0.012_207_5;

/// Bytes per vertex in a height buffer: height, flow x, flow z, pad, material
pub const HEIGHT_RECORD_SIZE: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TerrainVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub flow_x: u16,
    pub flow_z: u16,
    pub material: u8,
}

/// Index layout shared by every terrain tile
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainIndexBuffer(Arc<[u32]>);

impl TerrainIndexBuffer {
    pub fn new() -> Self {
        let mut indices = Vec::with_capacity(TILE_INDEX_COUNT);

        for y in 0..CELLS_PER_SIDE {
            let mut top = (y * TILE_LENGTH) as u32;
            let mut bottom = ((y + 1) * TILE_LENGTH) as u32;

            for _x in 0..CELLS_PER_SIDE {
                indices.extend_from_slice(&[top, bottom, bottom + 1]);
                indices.extend_from_slice(&[bottom + 1, top + 1, top]);

                top += 1;
                bottom += 1;
            }
        }

        Self(indices.into())
    }

    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.0.chunks_exact(3).map(|t| Triangle([t[0], t[1], t[2]]))
    }
}

impl Default for TerrainIndexBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-vertex arrays of one tile, already decoded
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedTerrain {
    pub heights: Vec<f32>,
    pub flow_x: Vec<u16>,
    pub flow_z: Vec<u16>,
    pub materials: Vec<u8>,
}

impl DecodedTerrain {
    /// Heights only; flow rates and materials are zero
    pub fn from_heights(heights: Vec<f32>) -> Self {
        let count = heights.len();
        Self {
            heights,
            flow_x: vec![0; count],
            flow_z: vec![0; count],
            materials: vec![0; count],
        }
    }

    fn validate(&self) -> Result<()> {
        let lengths = [
            ("heights", self.heights.len()),
            ("flow_x", self.flow_x.len()),
            ("flow_z", self.flow_z.len()),
            ("materials", self.materials.len()),
        ];
        for (name, len) in lengths {
            if len != TILE_VERTEX_COUNT {
                return Err(MergeError::TerrainData(format!(
                    "{} has {} entries, expected {}",
                    name, len, TILE_VERTEX_COUNT
                )));
            }
        }

        if let Some(i) = self.heights.iter().position(|h| !h.is_finite()) {
            return Err(MergeError::TerrainData(format!(
                "height at vertex {} is not finite",
                i
            )));
        }

        Ok(())
    }
}

/// Decode a tile height buffer
///
/// Each vertex is `u16 height, u16 flow_x, u16 flow_z, u8 _, u8 material`,
/// little endian, rows along X first.
pub fn decode_height_buffer<R: Read>(reader: &mut R) -> Result<DecodedTerrain> {
    let mut decoded = DecodedTerrain {
        heights: Vec::with_capacity(TILE_VERTEX_COUNT),
        flow_x: Vec::with_capacity(TILE_VERTEX_COUNT),
        flow_z: Vec::with_capacity(TILE_VERTEX_COUNT),
        materials: Vec::with_capacity(TILE_VERTEX_COUNT),
    };

    for _ in 0..TILE_VERTEX_COUNT {
        let height = reader.read_u16::<LittleEndian>()?;
        decoded.heights.push(height as f32 * HEIGHT_SCALE);
        decoded.flow_x.push(reader.read_u16::<LittleEndian>()?);
        decoded.flow_z.push(reader.read_u16::<LittleEndian>()?);
        let _material_hi = reader.read_u8()?;
        decoded.materials.push(reader.read_u8()?);
    }

    Ok(decoded)
}

/// Tile-local grid position for vertex `index`
fn local_position(index: usize, height: f32) -> Vec3 {
    let x = (index % TILE_LENGTH) as f32;
    let y = (index / TILE_LENGTH) as f32;
    Vec3::new(
        x / CELLS_PER_SIDE as f32 - 0.5,
        height,
        y / CELLS_PER_SIDE as f32 - 0.5,
    )
}

/// Vertex data of one terrain tile, in preview units
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainTile {
    vertices: Vec<TerrainVertex>,
}

impl TerrainTile {
    pub fn from_decoded(
        decoded: &DecodedTerrain,
        indices: &TerrainIndexBuffer,
        preview_scale: f32,
    ) -> Result<Self> {
        decoded.validate()?;

        let positions: Vec<Vec3> = decoded
            .heights
            .iter()
            .enumerate()
            .map(|(i, &h)| local_position(i, h))
            .collect();
        let normals = compute_normals(&positions, indices.indices());

        let vertices = positions
            .iter()
            .zip(&normals)
            .enumerate()
            .map(|(i, (&position, &normal))| TerrainVertex {
                position: position * preview_scale,
                normal,
                flow_x: decoded.flow_x[i],
                flow_z: decoded.flow_z[i],
                material: decoded.materials[i],
            })
            .collect();

        Ok(Self { vertices })
    }

    pub fn from_heights(
        heights: Vec<f32>,
        indices: &TerrainIndexBuffer,
        preview_scale: f32,
    ) -> Result<Self> {
        Self::from_decoded(&DecodedTerrain::from_heights(heights), indices, preview_scale)
    }

    pub fn vertices(&self) -> &[TerrainVertex] {
        &self.vertices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    #[test]
    fn test_index_buffer_layout() {
        let buffer = TerrainIndexBuffer::new();
        assert_eq!(buffer.indices().len(), TILE_INDEX_COUNT);
        assert_eq!(&buffer.indices()[..6], &[0, 64, 65, 65, 1, 0]);
        assert!(buffer.indices().iter().all(|&i| (i as usize) < TILE_VERTEX_COUNT));
        assert!(buffer.triangles().all(|t| !t.is_degenerate()));

        let last = &buffer.indices()[TILE_INDEX_COUNT - 6..];
        assert_eq!(last, &[4030, 4094, 4095, 4095, 4031, 4030]);
    }

    #[test]
    fn test_index_buffer_is_shared() {
        let a = TerrainIndexBuffer::new();
        let b = a.clone();
        assert!(std::ptr::eq(a.indices().as_ptr(), b.indices().as_ptr()));
    }

    #[test]
    fn test_decode_height_buffer() {
        let mut bytes = Vec::with_capacity(TILE_VERTEX_COUNT * HEIGHT_RECORD_SIZE);
        for i in 0..TILE_VERTEX_COUNT {
            bytes.write_u16::<LittleEndian>(1000).unwrap();
            bytes.write_u16::<LittleEndian>(i as u16).unwrap();
            bytes.write_u16::<LittleEndian>(7).unwrap();
            bytes.write_u8(0xAA).unwrap();
            bytes.write_u8((i % 5) as u8).unwrap();
        }

        let decoded = decode_height_buffer(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded.heights.len(), TILE_VERTEX_COUNT);
        assert!((decoded.heights[10] - 1000.0 * HEIGHT_SCALE).abs() < 1e-4);
        assert_eq!(decoded.flow_x[123], 123);
        assert_eq!(decoded.flow_z[4095], 7);
        assert_eq!(decoded.materials[7], 2);
    }

    #[test]
    fn test_decode_truncated_buffer() {
        let bytes = vec![0u8; HEIGHT_RECORD_SIZE * 10];
        let err = decode_height_buffer(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, MergeError::Io(_)));
    }

    #[test]
    fn test_flat_tile() {
        let indices = TerrainIndexBuffer::new();
        let tile = TerrainTile::from_heights(vec![2.0; TILE_VERTEX_COUNT], &indices, 10.0).unwrap();

        let first = tile.vertices()[0];
        assert_eq!(first.position, Vec3::new(-5.0, 20.0, -5.0));
        let last = tile.vertices()[TILE_VERTEX_COUNT - 1];
        assert_eq!(last.position, Vec3::new(5.0, 20.0, 5.0));

        for v in tile.vertices() {
            assert!((v.normal - Vec3::Y).length() < 1e-5);
        }
    }

    #[test]
    fn test_tile_rejects_wrong_length() {
        let indices = TerrainIndexBuffer::new();
        let err = TerrainTile::from_heights(vec![0.0; 12], &indices, 1.0).unwrap_err();
        assert!(matches!(err, MergeError::TerrainData(_)));

        let mut heights = vec![0.0; TILE_VERTEX_COUNT];
        heights[5] = f32::NAN;
        assert!(TerrainTile::from_heights(heights, &indices, 1.0).is_err());
    }
}
