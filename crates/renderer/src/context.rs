//! Per-frame context handed to render systems.

use lantern_rhi::vk;
use lantern_scene::Camera;

use crate::game_object::GameObjectMap;

/// Immutable bundle describing one frame in progress.
///
/// Handed to each render system between the sequencer's render-pass begin
/// and end. The command buffer and descriptor set are slot-scoped and
/// reused on the next rotation: systems may record into them for this
/// frame only and must not retain them.
pub struct FrameContext<'a> {
    /// Active frame slot index (0..MAX_FRAMES_IN_FLIGHT).
    pub frame_index: usize,
    /// Seconds elapsed since the previous frame.
    pub frame_time: f32,
    /// Command buffer being recorded for this frame.
    pub command_buffer: vk::CommandBuffer,
    /// Camera driving this frame's view.
    pub camera: &'a Camera,
    /// Descriptor set with the global uniforms bound for this slot.
    pub global_descriptor_set: vk::DescriptorSet,
    /// The scene's renderable objects.
    pub game_objects: &'a GameObjectMap,
}
