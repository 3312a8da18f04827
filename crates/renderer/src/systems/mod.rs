//! Render systems recording draw commands.
//!
//! Each system owns its pipeline and pipeline layout, built against the
//! swapchain's render pass and the global descriptor set layout. A system's
//! only contract is a `render(&FrameContext)` that records into the frame's
//! command buffer between the sequencer's render-pass begin and end; there
//! is no common trait or dispatch hierarchy.

pub mod mesh;
pub mod point_light;

pub use mesh::MeshRenderSystem;
pub use point_light::PointLightSystem;
