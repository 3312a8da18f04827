//! Global uniform buffer layout.
//!
//! These structures must match the GLSL std140 uniform block in the forward
//! shaders exactly. All structures use `#[repr(C)]` for predictable memory
//! layout and implement `Pod` and `Zeroable` for safe byte casting.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use lantern_scene::Camera;

/// Maximum number of point lights the shader light array holds.
pub const MAX_LIGHTS: usize = 10;

/// One point light as seen by the shaders.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct PointLightUniform {
    /// World position; w is unused.
    pub position: Vec4,
    /// Light color; w is the intensity.
    pub color: Vec4,
}

/// Global per-frame uniform data.
///
/// # Memory Layout (std140)
///
/// - Offset 0: projection matrix (64 bytes)
/// - Offset 64: view matrix (64 bytes)
/// - Offset 128: inverse view matrix (64 bytes)
/// - Offset 192: ambient light color, w = intensity (16 bytes)
/// - Offset 208: point light array (10 * 32 bytes)
/// - Offset 528: light count (4 bytes) + padding (12 bytes)
/// - Total size: 544 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GlobalUbo {
    /// Projection matrix (view to clip space, Y flipped for Vulkan).
    pub projection: Mat4,
    /// View matrix (world to view space).
    pub view: Mat4,
    /// Inverse view matrix (camera-to-world; column 3 is the eye position).
    pub inverse_view: Mat4,
    /// Ambient light color; w is the intensity.
    pub ambient_light_color: Vec4,
    /// Active point lights; only the first `num_lights` entries are valid.
    pub point_lights: [PointLightUniform; MAX_LIGHTS],
    /// Number of valid entries in `point_lights`.
    pub num_lights: u32,
    /// Padding to the std140 block size.
    pub _padding: [u32; 3],
}

impl Default for GlobalUbo {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            inverse_view: Mat4::IDENTITY,
            ambient_light_color: Vec4::new(1.0, 1.0, 1.0, 0.02),
            point_lights: [PointLightUniform::default(); MAX_LIGHTS],
            num_lights: 0,
            _padding: [0; 3],
        }
    }
}

impl GlobalUbo {
    /// Size of the struct in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Builds the frame's uniform data from the camera.
    ///
    /// The light array starts empty; the point-light system fills it during
    /// its update pass.
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            projection: camera.projection_matrix(),
            view: camera.view_matrix(),
            inverse_view: camera.inverse_view_matrix(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_ubo_matches_std140_layout() {
        assert_eq!(std::mem::offset_of!(GlobalUbo, projection), 0);
        assert_eq!(std::mem::offset_of!(GlobalUbo, view), 64);
        assert_eq!(std::mem::offset_of!(GlobalUbo, inverse_view), 128);
        assert_eq!(std::mem::offset_of!(GlobalUbo, ambient_light_color), 192);
        assert_eq!(std::mem::offset_of!(GlobalUbo, point_lights), 208);
        assert_eq!(std::mem::offset_of!(GlobalUbo, num_lights), 528);
        assert_eq!(GlobalUbo::SIZE, 544);
    }

    #[test]
    fn test_point_light_uniform_stride() {
        // std140 array stride for a struct of two vec4s
        assert_eq!(std::mem::size_of::<PointLightUniform>(), 32);
    }

    #[test]
    fn test_from_camera_copies_matrices() {
        let camera = Camera::new();
        let ubo = GlobalUbo::from_camera(&camera);

        assert_eq!(ubo.projection, camera.projection_matrix());
        assert_eq!(ubo.view, camera.view_matrix());
        assert_eq!(ubo.num_lights, 0);
        // Ambient defaults to faint white
        assert_eq!(ubo.ambient_light_color.w, 0.02);
    }
}
