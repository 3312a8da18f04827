//! Camera for rendering the scene.

use glam::{Mat4, Quat, Vec3};

/// Projection type for the camera.
#[derive(Clone, Debug)]
pub enum Projection {
    /// Perspective projection
    Perspective {
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    /// Orthographic projection
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
}

/// A camera for rendering the scene.
///
/// Render systems do not cache camera matrices; the per-frame uniform data
/// is rebuilt from the camera every frame, so aspect-ratio changes from a
/// swapchain recreation take effect on the next frame automatically.
#[derive(Clone, Debug)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    /// Camera rotation
    pub rotation: Quat,
    /// Projection settings
    pub projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            rotation: Quat::IDENTITY,
            projection: Projection::Perspective {
                fov_y: 50.0_f32.to_radians(),
                aspect: 16.0 / 9.0,
                near: 0.1,
                far: 100.0,
            },
        }
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the perspective projection.
    pub fn set_perspective(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) {
        self.projection = Projection::Perspective {
            fov_y,
            aspect,
            near,
            far,
        };
    }

    /// Set the orthographic projection.
    pub fn set_orthographic(
        &mut self,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) {
        self.projection = Projection::Orthographic {
            left,
            right,
            bottom,
            top,
            near,
            far,
        };
    }

    /// Update the aspect ratio (for perspective projection).
    pub fn set_aspect(&mut self, aspect: f32) {
        if let Projection::Perspective {
            fov_y, near, far, ..
        } = self.projection
        {
            self.projection = Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            };
        }
    }

    /// Get the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        let forward = self.rotation * Vec3::NEG_Z;
        let target = self.position + forward;
        Mat4::look_at_rh(self.position, target, Vec3::Y)
    }

    /// Get the inverse view matrix (camera-to-world).
    ///
    /// Used by shaders that need the camera position in world space.
    pub fn inverse_view_matrix(&self) -> Mat4 {
        self.view_matrix().inverse()
    }

    /// Get the projection matrix (with Vulkan Y-flip).
    pub fn projection_matrix(&self) -> Mat4 {
        let mut proj = match self.projection {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh(fov_y, aspect, near, far),
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => Mat4::orthographic_rh(left, right, bottom, top, near, far),
        };
        // Flip Y for Vulkan coordinate system
        proj.y_axis.y *= -1.0;
        proj
    }

    /// Get the view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Get the forward direction vector.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Get the right direction vector.
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Get the up direction vector.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Look at a target position.
    pub fn look_at(&mut self, target: Vec3) {
        let forward = (target - self.position).normalize();
        if forward.length_squared() > 0.0 {
            self.rotation = Quat::from_rotation_arc(Vec3::NEG_Z, forward);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_set_aspect_keeps_other_parameters() {
        let mut camera = Camera::new();
        camera.set_perspective(1.0, 4.0 / 3.0, 0.1, 100.0);
        camera.set_aspect(2.0);

        match camera.projection {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => {
                assert_relative_eq!(fov_y, 1.0);
                assert_relative_eq!(aspect, 2.0);
                assert_relative_eq!(near, 0.1);
                assert_relative_eq!(far, 100.0);
            }
            _ => panic!("Projection should stay perspective"),
        }
    }

    #[test]
    fn test_projection_matrix_flips_y() {
        let camera = Camera::new();
        let proj = camera.projection_matrix();
        // Vulkan clip space has Y pointing down
        assert!(proj.y_axis.y < 0.0);
    }

    #[test]
    fn test_inverse_view_round_trip() {
        let mut camera = Camera::new();
        camera.position = Vec3::new(1.0, 2.0, 3.0);
        camera.look_at(Vec3::ZERO);

        let round_trip = camera.view_matrix() * camera.inverse_view_matrix();
        for (col, expected) in round_trip
            .to_cols_array()
            .iter()
            .zip(Mat4::IDENTITY.to_cols_array())
        {
            assert_relative_eq!(*col, expected, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_look_at_faces_target() {
        let mut camera = Camera::new();
        camera.position = Vec3::new(0.0, 0.0, 5.0);
        camera.look_at(Vec3::ZERO);

        let forward = camera.forward();
        assert_relative_eq!(forward.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(forward.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(forward.z, -1.0, epsilon = 1e-5);
    }
}
