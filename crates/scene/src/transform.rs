//! Transform component for scene objects.

use glam::{EulerRot, Mat4, Vec3};

/// A transform representing translation, rotation, and scale.
///
/// Rotation uses Tait-Bryan angles applied in Y, X, Z order, so
/// `world_matrix()` corresponds to `translate * Ry * Rx * Rz * scale`.
#[derive(Clone, Debug)]
pub struct Transform {
    /// Translation in world space
    pub translation: Vec3,
    /// Euler rotation in radians (applied Y, then X, then Z)
    pub rotation: Vec3,
    /// Scale factor
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform at the origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with the given translation.
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    /// Create a transform with the given rotation.
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Create a transform with the given scale.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Get the world transformation matrix.
    pub fn world_matrix(&self) -> Mat4 {
        let rotation = Mat4::from_euler(
            EulerRot::YXZ,
            self.rotation.y,
            self.rotation.x,
            self.rotation.z,
        );
        Mat4::from_translation(self.translation) * rotation * Mat4::from_scale(self.scale)
    }

    /// Get the normal matrix (inverse transpose of the world matrix).
    ///
    /// The normal matrix transforms normal vectors correctly when the model
    /// matrix contains non-uniform scaling.
    ///
    /// # Non-invertible transforms
    ///
    /// If the transform is not invertible (e.g., contains zero scale),
    /// the identity matrix is returned as a fallback to avoid NaN/Inf values.
    pub fn normal_matrix(&self) -> Mat4 {
        let model = self.world_matrix();

        const EPSILON: f32 = 1e-6;
        let det = model.determinant();

        if det.abs() < EPSILON {
            Mat4::IDENTITY
        } else {
            model.inverse().transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_default() {
        let t = Transform::default();
        assert_eq!(t.translation, Vec3::ZERO);
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.world_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_transform_builder() {
        let t = Transform::new()
            .with_translation(Vec3::new(1.0, 2.0, 3.0))
            .with_scale(Vec3::splat(2.0));

        assert_eq!(t.translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.scale, Vec3::splat(2.0));
    }

    #[test]
    fn test_world_matrix_translates_origin() {
        let t = Transform::new().with_translation(Vec3::new(10.0, 5.0, 0.0));
        let pos = t.world_matrix().transform_point3(Vec3::ZERO);
        assert_relative_eq!(pos.x, 10.0, epsilon = 1e-5);
        assert_relative_eq!(pos.y, 5.0, epsilon = 1e-5);
        assert_relative_eq!(pos.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_rotation_order_is_yxz() {
        // A quarter turn around Y maps +X to -Z
        let t = Transform::new().with_rotation(Vec3::new(
            0.0,
            std::f32::consts::FRAC_PI_2,
            0.0,
        ));
        let mapped = t.world_matrix().transform_vector3(Vec3::X);
        assert_relative_eq!(mapped.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(mapped.z, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_normal_matrix_with_scale() {
        let t = Transform::new().with_scale(Vec3::new(1.0, 2.0, 1.0));
        let normal = t.normal_matrix();
        let expected = t.world_matrix().inverse().transpose();
        assert_eq!(normal, expected);
    }

    #[test]
    fn test_normal_matrix_non_invertible() {
        // Zero scale makes the transform non-invertible
        let t = Transform::new().with_scale(Vec3::ZERO);
        let normal = t.normal_matrix();
        assert_eq!(normal, Mat4::IDENTITY);
    }
}
