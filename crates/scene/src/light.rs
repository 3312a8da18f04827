//! Light components for scene objects.

/// Point light component.
///
/// Attached to a scene object to turn it into an omnidirectional light; the
/// light's position comes from the object's transform, its color from the
/// object's color, and its visualized radius from the transform's scale.
#[derive(Clone, Copy, Debug)]
pub struct PointLight {
    /// Light intensity multiplier.
    pub intensity: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self { intensity: 1.0 }
    }
}

impl PointLight {
    /// Create a point light with the given intensity.
    pub fn new(intensity: f32) -> Self {
        Self { intensity }
    }
}
