//! Main rendering pipeline for the Lantern renderer.
//!
//! This crate orchestrates the rendering process:
//! - The frame sequencer (per-frame command buffers, synchronization,
//!   swapchain recreation)
//! - Per-frame uniform data and descriptor sets
//! - Render systems recording draw commands
//! - Scene objects and their GPU models

mod error;

pub mod context;
pub mod frame;
pub mod game_object;
pub mod model;
pub mod renderer;
pub mod sequencer;
pub mod systems;
pub mod ubo;

pub use context::FrameContext;
pub use error::{RendererError, RendererResult};
pub use frame::FrameState;
pub use game_object::{GameObject, GameObjectId, GameObjectMap};
pub use model::Model;
pub use renderer::Renderer;
pub use sequencer::FrameSequencer;
pub use ubo::{GlobalUbo, MAX_LIGHTS, PointLightUniform};

/// Maximum number of frames that can be in flight simultaneously.
///
/// Fixed at compile time and deliberately independent of the swapchain
/// image count: 2 lets the CPU record the next frame while the GPU renders
/// the current one, without the latency cost of deeper queues.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;
