//! Keyboard-driven camera movement.

use glam::{Quat, Vec3};

use lantern_platform::{InputState, KeyCode};
use lantern_scene::Camera;

/// Planar keyboard camera controller.
///
/// Arrow keys look around, WASD moves in the horizontal plane the camera is
/// facing, Q/E move straight down/up.
pub struct CameraController {
    /// Movement speed in world units per second.
    pub move_speed: f32,
    /// Look speed in radians per second.
    pub look_speed: f32,
    yaw: f32,
    pitch: f32,
}

impl CameraController {
    /// Creates a controller with the given initial orientation.
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self {
            move_speed: 3.0,
            look_speed: 1.5,
            yaw,
            pitch,
        }
    }

    /// Applies one tick of input to the camera.
    pub fn update(&mut self, input: &InputState, dt: f32, camera: &mut Camera) {
        // Look
        let mut look = Vec3::ZERO;
        if input.is_key_pressed(KeyCode::ArrowRight) {
            look.y -= 1.0;
        }
        if input.is_key_pressed(KeyCode::ArrowLeft) {
            look.y += 1.0;
        }
        if input.is_key_pressed(KeyCode::ArrowUp) {
            look.x += 1.0;
        }
        if input.is_key_pressed(KeyCode::ArrowDown) {
            look.x -= 1.0;
        }

        if look.length_squared() > f32::EPSILON {
            self.yaw += self.look_speed * dt * look.y;
            self.pitch += self.look_speed * dt * look.x;
            // Keep pitch away from the poles
            self.pitch = self.pitch.clamp(-1.5, 1.5);
        }

        camera.rotation = Quat::from_euler(glam::EulerRot::YXZ, self.yaw, self.pitch, 0.0);

        // Move in the horizontal plane spanned by the camera's facing
        let forward = camera.forward();
        let forward_flat = Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero();
        let right = camera.right();
        let right_flat = Vec3::new(right.x, 0.0, right.z).normalize_or_zero();

        let mut movement = Vec3::ZERO;
        if input.is_key_pressed(KeyCode::KeyW) {
            movement += forward_flat;
        }
        if input.is_key_pressed(KeyCode::KeyS) {
            movement -= forward_flat;
        }
        if input.is_key_pressed(KeyCode::KeyD) {
            movement += right_flat;
        }
        if input.is_key_pressed(KeyCode::KeyA) {
            movement -= right_flat;
        }
        if input.is_key_pressed(KeyCode::KeyE) {
            movement += Vec3::Y;
        }
        if input.is_key_pressed(KeyCode::KeyQ) {
            movement -= Vec3::Y;
        }

        if movement.length_squared() > f32::EPSILON {
            camera.position += self.move_speed * dt * movement.normalize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_key_moves_toward_facing() {
        let mut controller = CameraController::new(0.0, 0.0);
        let mut camera = Camera::new();
        camera.position = Vec3::ZERO;

        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::KeyW);

        controller.update(&input, 1.0, &mut camera);

        // Default yaw faces -Z
        assert!(camera.position.z < 0.0);
        assert_eq!(camera.position.y, 0.0);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut controller = CameraController::new(0.0, 0.0);
        let mut camera = Camera::new();
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::ArrowUp);

        // Hold look-up for far longer than the clamp allows
        for _ in 0..100 {
            controller.update(&input, 0.1, &mut camera);
        }

        assert!(controller.pitch <= 1.5);
    }
}
