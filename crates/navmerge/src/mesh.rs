// mesh.rs - quad triangulation and per-vertex normals
//
// Collision shapes come out of the shape decoder as quads. Quads that repeat
// a corner index are really triangles, so splitting them yields one valid
// triangle and one degenerate "line" triangle that must be dropped.

use glam::Vec3;
use tracing::debug;

use crate::error::{MergeError, Result};

/// Four vertex indices describing a bilinear patch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quad(pub [u32; 4]);

impl Quad {
    /// Split into (a,b,c) and (c,d,a)
    pub fn split(&self) -> [Triangle; 2] {
        let [a, b, c, d] = self.0;
        [Triangle([a, b, c]), Triangle([c, d, a])]
    }

    pub fn has_repeated_corner(&self) -> bool {
        let q = &self.0;
        (0..4).any(|i| (i + 1..4).any(|j| q[i] == q[j]))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Triangle(pub [u32; 3]);

impl Triangle {
    /// Any two of the three indices are equal
    pub fn is_degenerate(&self) -> bool {
        let [a, b, c] = self.0;
        a == b || a == c || b == c
    }
}

/// Quad mesh as produced by the shape decoder
#[derive(Clone, Debug, Default)]
pub struct RawMesh {
    pub vertices: Vec<Vec3>,
    pub quads: Vec<Quad>,
}

/// Triangle mesh with no degenerate triangles
///
/// Only built through [`triangulate`]; immutable afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangulatedMesh {
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    indices: Vec<u32>,
}

impl TriangulatedMesh {
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Flat index list, three per triangle
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| Triangle([t[0], t[1], t[2]]))
    }
}

/// Triangulate a quad mesh, dropping degenerate triangles
pub fn triangulate(raw: &RawMesh) -> Result<TriangulatedMesh> {
    let vertex_count = raw.vertices.len();

    // 6 indices per quad once split
    let mut indices: Vec<u32> = Vec::with_capacity(raw.quads.len() * 6);
    let mut degenerate = 0usize;

    for quad in &raw.quads {
        if let Some(&index) = quad.0.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MergeError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }

        for tri in quad.split() {
            if tri.is_degenerate() {
                degenerate += 1;
                continue;
            }
            indices.extend_from_slice(&tri.0);
        }
    }

    if degenerate > 0 {
        debug!(
            "Triangulated {} quads: removed {} degenerate triangles",
            raw.quads.len(),
            degenerate
        );
    }

    let normals = compute_normals(&raw.vertices, &indices);

    Ok(TriangulatedMesh {
        vertices: raw.vertices.clone(),
        normals,
        indices,
    })
}

/// Area-weighted vertex normals
///
/// Face normals are `(v1 - v0) x (v2 - v0)` left unnormalized, so larger
/// triangles weigh more. Vertices no triangle touches stay at zero.
pub fn compute_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }

        let v0 = positions[i0];
        let face = (positions[i1] - v0).cross(positions[i2] - v0);

        normals[i0] += face;
        normals[i1] += face;
        normals[i2] += face;
    }

    for n in normals.iter_mut() {
        *n = n.normalize_or_zero();
    }

    normals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_quad() -> RawMesh {
        RawMesh {
            vertices: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            quads: vec![Quad([0, 1, 2, 3])],
        }
    }

    #[test]
    fn test_triangulate_single_quad() {
        let mesh = triangulate(&flat_quad()).unwrap();
        assert_eq!(mesh.indices(), &[0, 1, 2, 2, 3, 0]);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_triangulate_removes_degenerate() {
        let mut raw = flat_quad();
        // Triangle encoded as a quad: (c,d,a) collapses
        raw.quads.push(Quad([0, 1, 2, 2]));
        // (a,b,c) collapses, (c,d,a) survives
        raw.quads.push(Quad([3, 3, 1, 0]));

        let mesh = triangulate(&raw).unwrap();
        assert_eq!(mesh.triangle_count(), 2 * 3 - 2);
        assert!(mesh.triangles().all(|t| !t.is_degenerate()));
        assert_eq!(&mesh.indices()[6..], &[0, 1, 2, 1, 0, 3]);
    }

    #[test]
    fn test_triangle_count_matches_repeated_corners() {
        let vertices = (0..6).map(|i| Vec3::new(i as f32, (i * i) as f32, 0.0)).collect();
        let quads = vec![
            Quad([0, 1, 2, 3]),
            Quad([1, 2, 3, 3]),
            Quad([4, 4, 5, 0]),
            Quad([2, 3, 4, 5]),
            Quad([5, 0, 1, 1]),
        ];
        let raw = RawMesh { vertices, quads };
        let repeated = raw.quads.iter().filter(|q| q.has_repeated_corner()).count();

        let mesh = triangulate(&raw).unwrap();
        assert_eq!(repeated, 3);
        assert_eq!(mesh.triangle_count(), 2 * raw.quads.len() - repeated);
        assert!(mesh.triangles().all(|t| !t.is_degenerate()));
    }

    #[test]
    fn test_triangulate_empty() {
        let raw = RawMesh {
            vertices: vec![Vec3::ZERO],
            quads: Vec::new(),
        };
        let mesh = triangulate(&raw).unwrap();
        assert!(mesh.indices().is_empty());
        assert_eq!(mesh.vertices().len(), 1);
        assert_eq!(mesh.normals(), &[Vec3::ZERO]);
    }

    #[test]
    fn test_triangulate_rejects_out_of_range() {
        let mut raw = flat_quad();
        raw.quads.push(Quad([0, 1, 2, 9]));
        let err = triangulate(&raw).unwrap_err();
        assert!(matches!(
            err,
            MergeError::IndexOutOfRange {
                index: 9,
                vertex_count: 4
            }
        ));
    }

    #[test]
    fn test_flat_quad_normals() {
        let mesh = triangulate(&flat_quad()).unwrap();
        for n in mesh.normals() {
            assert!((n.length() - 1.0).abs() < 1e-6);
            assert!((*n - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_normals_are_area_weighted() {
        // Large triangle facing +Z and small triangle facing +X share vertex 0
        let positions = vec![
            Vec3::ZERO,
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let indices = [0, 1, 2, 0, 3, 4];
        let normals = compute_normals(&positions, &indices);
        assert!(normals[0].z > normals[0].x);
        assert!(normals[0].x > 0.0);
        assert_eq!(normals[4], Vec3::X);
    }
}
