// transform.rs - local -> world -> navmesh-local coordinate mapping
//
// Scene instances are placed in preview (render) units. Navmeshes live in
// world units relative to their origin, so a vertex goes
//   local --source--> preview world --inverse(origin * scale)--> navmesh
// and is divided by the unit scale at the end.

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::error::{MergeError, Result};

/// Placement of a scene instance
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Rotation given as X, Y, Z euler angles in degrees
    pub fn from_euler_degrees(position: Vec3, rotation: [f32; 3], scale: Vec3) -> Self {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            rotation[0].to_radians(),
            rotation[1].to_radians(),
            rotation[2].to_radians(),
        );
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Column-vector local-to-world matrix (scale, rotate, translate)
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Maps positions into the space of one navmesh
#[derive(Clone, Copy, Debug)]
pub struct TransformResolver {
    unit_scale: f32,
    inverse_origin: Mat4,
}

impl TransformResolver {
    /// `origin` is in world units, `unit_scale` converts world to preview units.
    ///
    /// The origin transform is a pure translation; anything that would make
    /// it non-invertible is rejected here, before any vertex is touched.
    pub fn new(navmesh_origin: Vec3, unit_scale: f32) -> Result<Self> {
        if !unit_scale.is_finite() || unit_scale == 0.0 {
            return Err(MergeError::InvalidUnitScale(unit_scale));
        }
        if !navmesh_origin.is_finite() {
            return Err(MergeError::NonInvertibleTransform);
        }

        let origin = Mat4::from_translation(navmesh_origin * unit_scale);
        let determinant = origin.determinant();
        if !determinant.is_finite() || determinant == 0.0 {
            return Err(MergeError::NonInvertibleTransform);
        }

        Ok(Self {
            unit_scale,
            inverse_origin: origin.inverse(),
        })
    }

    pub fn unit_scale(&self) -> f32 {
        self.unit_scale
    }

    /// Preview-space position to world units (used for region tests)
    pub fn to_unit_space(&self, preview: Vec3) -> Vec3 {
        preview / self.unit_scale
    }

    /// Preview-space world position to navmesh-local units
    pub fn world_to_navmesh(&self, preview: Vec3) -> Vec3 {
        (self.inverse_origin * preview.extend(1.0)).truncate() / self.unit_scale
    }

    /// Instance-local position to navmesh-local units
    pub fn to_navmesh(&self, source: &Mat4, local: Vec3) -> Vec3 {
        let world = (*source * local.extend(1.0)).truncate();
        self.world_to_navmesh(world)
    }

    /// Mapping for every vertex of one instance
    pub fn resolve<'a>(&'a self, source: &Transform) -> impl Fn(Vec3) -> Vec3 + 'a {
        let matrix = source.matrix();
        move |local| self.to_navmesh(&matrix, local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn test_identity_source_and_origin() {
        let resolver = TransformResolver::new(Vec3::ZERO, 1.0).unwrap();
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_close(resolver.to_navmesh(&Mat4::IDENTITY, p), p);
    }

    #[test]
    fn test_origin_and_scale() {
        // Origin at world (100, 0, 200); preview units are 1/10th of world units
        let resolver = TransformResolver::new(Vec3::new(100.0, 0.0, 200.0), 0.1).unwrap();
        let source = Transform::from_translation(Vec3::new(10.0, 1.0, 20.0));
        let mapped = resolver.resolve(&source)(Vec3::new(0.5, 0.0, 0.0));
        // preview world = (10.5, 1, 20) -> minus origin*scale (10, 0, 20) -> / 0.1
        assert_close(mapped, Vec3::new(5.0, 10.0, 0.0));
    }

    #[test]
    fn test_rotation_and_scale_in_source() {
        let resolver = TransformResolver::new(Vec3::ZERO, 1.0).unwrap();
        let source = Transform::from_euler_degrees(Vec3::X, [0.0, 90.0, 0.0], Vec3::splat(2.0));
        let mapped = resolver.to_navmesh(&source.matrix(), Vec3::X);
        // scale to (2,0,0), rotate +90 about Y to (0,0,-2), translate by +X
        assert_close(mapped, Vec3::new(1.0, 0.0, -2.0));
    }

    #[test]
    fn test_to_unit_space() {
        let resolver = TransformResolver::new(Vec3::ZERO, 0.1).unwrap();
        assert_close(resolver.to_unit_space(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(10.0, 20.0, 30.0));
    }

    #[test]
    fn test_rejects_bad_scale_and_origin() {
        assert!(matches!(
            TransformResolver::new(Vec3::ZERO, 0.0),
            Err(MergeError::InvalidUnitScale(_))
        ));
        assert!(matches!(
            TransformResolver::new(Vec3::ZERO, f32::NAN),
            Err(MergeError::InvalidUnitScale(_))
        ));
        assert!(matches!(
            TransformResolver::new(Vec3::new(f32::INFINITY, 0.0, 0.0), 1.0),
            Err(MergeError::NonInvertibleTransform)
        ));
    }
}
