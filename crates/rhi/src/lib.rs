//! Vulkan abstraction layer for the Lantern renderer.
//!
//! This crate provides a safe abstraction over Vulkan using the `ash` crate.
//! It handles:
//! - Instance and device creation
//! - Swapchain, render pass, and framebuffer management
//! - Command buffer recording
//! - Buffer, depth attachment, and texture management
//! - Pipeline creation
//! - Synchronization primitives

mod error;

pub mod buffer;
pub mod command;
pub mod depth;
pub mod descriptor;
pub mod device;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod texture;
pub mod vertex;

pub use error::{RhiError, RhiResult};

// Re-export ash types that users might need
pub use ash::vk;
