//! Synchronization primitives for Vulkan.
//!
//! This module provides wrappers for Vulkan synchronization objects:
//! - [`Semaphore`] - GPU-to-GPU synchronization (between queue operations)
//! - [`Fence`] - GPU-to-CPU synchronization (for host waiting)
//!
//! # Overview
//!
//! Vulkan requires explicit synchronization between operations:
//!
//! - **Semaphores** are used to synchronize operations within or across queues.
//!   For example, waiting for image acquisition before rendering, or waiting for
//!   rendering to complete before presentation.
//!
//! - **Fences** are used to synchronize the CPU with GPU operations. The CPU can
//!   wait for a fence to be signaled, allowing it to know when GPU work is complete.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lantern_rhi::device::Device;
//! use lantern_rhi::sync::{Semaphore, Fence};
//!
//! # fn example(device: Arc<Device>) -> Result<(), lantern_rhi::RhiError> {
//! // Create a semaphore for GPU-to-GPU synchronization
//! let image_available = Semaphore::new(device.clone())?;
//!
//! // Create a fence for GPU-to-CPU synchronization (signaled initially)
//! let in_flight_fence = Fence::new(device.clone(), true)?;
//!
//! // Wait for the fence before starting a new frame
//! in_flight_fence.wait(u64::MAX)?;
//! in_flight_fence.reset()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Vulkan semaphore wrapper.
///
/// Semaphores are used for GPU-to-GPU synchronization between queue operations.
/// Common use cases include:
/// - Image available semaphore: signaled when a swapchain image is ready
/// - Render finished semaphore: signaled when rendering is complete
///
/// # Thread Safety
///
/// The semaphore is immutable after creation and can be safely shared between
/// threads. The Vulkan specification allows semaphore operations to be submitted
/// from multiple threads.
pub struct Semaphore {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan semaphore handle.
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Creates a new semaphore.
    ///
    /// The semaphore is created in the unsignaled state.
    ///
    /// # Errors
    ///
    /// Returns an error if semaphore creation fails.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::default();

        let semaphore = unsafe { device.handle().create_semaphore(&create_info, None)? };

        debug!("Created semaphore");

        Ok(Self { device, semaphore })
    }

    /// Returns the Vulkan semaphore handle.
    ///
    /// This handle can be used directly with Vulkan API calls.
    #[inline]
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_semaphore(self.semaphore, None);
        }
        debug!("Destroyed semaphore");
    }
}

/// Vulkan fence wrapper.
///
/// Fences are used for GPU-to-CPU synchronization, allowing the host to wait
/// for GPU operations to complete. Common use cases include:
/// - Frame-in-flight fence: wait before reusing command buffers
/// - Transfer completion fence: wait for data upload to complete
///
/// # Thread Safety
///
/// The fence is immutable after creation. Wait and reset operations can be
/// called from any thread, but proper synchronization is the caller's
/// responsibility when accessing fence state.
pub struct Fence {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan fence handle.
    fence: vk::Fence,
}

impl Fence {
    /// Creates a new fence.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `signaled` - If true, creates the fence in the signaled state.
    ///   This is useful for fences that are waited on before the first
    ///   GPU operation that would signal them.
    ///
    /// # Errors
    ///
    /// Returns an error if fence creation fails.
    pub fn new(device: Arc<Device>, signaled: bool) -> RhiResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };

        let create_info = vk::FenceCreateInfo::default().flags(flags);

        let fence = unsafe { device.handle().create_fence(&create_info, None)? };

        debug!(
            "Created fence ({})",
            if signaled { "signaled" } else { "unsignaled" }
        );

        Ok(Self { device, fence })
    }

    /// Returns the Vulkan fence handle.
    ///
    /// This handle can be used directly with Vulkan API calls.
    #[inline]
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }

    /// Waits for the fence to become signaled.
    ///
    /// This function blocks until the fence is signaled or the timeout expires.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Timeout in nanoseconds. Use `u64::MAX` for infinite wait.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The wait times out (`vk::Result::TIMEOUT`)
    /// - The wait fails for another reason
    pub fn wait(&self, timeout: u64) -> Result<(), RhiError> {
        let fences = [self.fence];
        unsafe {
            self.device
                .handle()
                .wait_for_fences(&fences, true, timeout)?
        };
        Ok(())
    }

    /// Resets the fence to the unsignaled state.
    ///
    /// The fence must not be in use by any queue operation when this is called.
    ///
    /// # Errors
    ///
    /// Returns an error if the reset operation fails.
    pub fn reset(&self) -> Result<(), RhiError> {
        let fences = [self.fence];
        unsafe { self.device.handle().reset_fences(&fences)? };
        Ok(())
    }

    /// Checks if the fence is currently signaled.
    ///
    /// This is a non-blocking operation that returns immediately.
    pub fn is_signaled(&self) -> bool {
        let result = unsafe { self.device.handle().get_fence_status(self.fence) };
        matches!(result, Ok(true))
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_fence(self.fence, None);
        }
        debug!("Destroyed fence");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semaphore_is_send_sync() {
        // Compile-time check that Semaphore is Send + Sync
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Semaphore>();
    }

    #[test]
    fn test_fence_is_send_sync() {
        // Compile-time check that Fence is Send + Sync
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Fence>();
    }
}
