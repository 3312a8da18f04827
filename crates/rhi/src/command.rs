//! Command pool and command buffer management.
//!
//! This module provides wrappers for VkCommandPool and VkCommandBuffer,
//! enabling safe recording and submission of Vulkan commands.
//!
//! # Overview
//!
//! - [`CommandPool`] manages VkCommandPool creation and command buffer allocation
//! - [`one_time_submit`] records and synchronously submits a short-lived command
//!   buffer, used for staging uploads and image layout transitions
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lantern_rhi::device::Device;
//! use lantern_rhi::command::CommandPool;
//!
//! # fn example(device: Arc<Device>) -> Result<(), lantern_rhi::RhiError> {
//! // Create command pool for graphics queue
//! let queue_family = device.queue_families().graphics_family.unwrap();
//! let pool = CommandPool::new(device.clone(), queue_family)?;
//!
//! // Allocate primary command buffers
//! let buffers = pool.allocate_command_buffers(2)?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::info;

use crate::device::Device;
use crate::error::RhiResult;

/// Vulkan command pool wrapper.
///
/// A command pool is used to allocate command buffers. Each pool is associated
/// with a specific queue family and can only allocate command buffers that
/// will be submitted to queues of that family.
///
/// # Thread Safety
///
/// Command pools are not thread-safe. For multi-threaded command recording,
/// create a separate pool per thread.
pub struct CommandPool {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan command pool handle.
    pool: vk::CommandPool,
    /// Queue family index this pool belongs to.
    queue_family_index: u32,
}

impl CommandPool {
    /// Creates a new command pool for the specified queue family.
    ///
    /// The pool is created with the `RESET_COMMAND_BUFFER` flag, allowing
    /// individual command buffers to be reset without resetting the entire pool.
    ///
    /// # Errors
    ///
    /// Returns an error if command pool creation fails.
    pub fn new(device: Arc<Device>, queue_family_index: u32) -> RhiResult<Self> {
        let create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family_index)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let pool = unsafe { device.handle().create_command_pool(&create_info, None)? };

        info!("Created command pool for queue family {}", queue_family_index);

        Ok(Self {
            device,
            pool,
            queue_family_index,
        })
    }

    /// Returns the Vulkan command pool handle.
    #[inline]
    pub fn handle(&self) -> vk::CommandPool {
        self.pool
    }

    /// Returns the queue family index this pool belongs to.
    #[inline]
    pub fn queue_family_index(&self) -> u32 {
        self.queue_family_index
    }

    /// Allocates a single primary command buffer from this pool.
    ///
    /// # Errors
    ///
    /// Returns an error if allocation fails.
    pub fn allocate_command_buffer(&self) -> RhiResult<vk::CommandBuffer> {
        let buffers = self.allocate_command_buffers(1)?;
        Ok(buffers[0])
    }

    /// Allocates multiple primary command buffers from this pool.
    ///
    /// # Errors
    ///
    /// Returns an error if allocation fails.
    pub fn allocate_command_buffers(&self, count: u32) -> RhiResult<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);

        let buffers = unsafe { self.device.handle().allocate_command_buffers(&alloc_info)? };

        Ok(buffers)
    }

    /// Frees command buffers previously allocated from this pool.
    pub fn free_command_buffers(&self, buffers: &[vk::CommandBuffer]) {
        unsafe {
            self.device.handle().free_command_buffers(self.pool, buffers);
        }
    }

    /// Returns the device this pool was created on.
    #[inline]
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_command_pool(self.pool, None);
        }
        info!("Destroyed command pool");
    }
}

/// Records and synchronously submits a one-time command buffer.
///
/// Allocates a command buffer from the pool, begins it with the
/// `ONE_TIME_SUBMIT` flag, invokes `record` to record commands, submits it to
/// the graphics queue, waits for the queue to drain, and frees the buffer.
///
/// Used for staging-buffer copies and image layout transitions during
/// resource upload; per-frame work goes through the frame sequencer instead.
///
/// # Errors
///
/// Returns an error if allocation, recording, or submission fails.
pub fn one_time_submit<F>(pool: &CommandPool, record: F) -> RhiResult<()>
where
    F: FnOnce(&ash::Device, vk::CommandBuffer),
{
    let device = pool.device().clone();
    let command_buffer = pool.allocate_command_buffer()?;

    let begin_info = vk::CommandBufferBeginInfo::default()
        .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

    unsafe {
        device.handle().begin_command_buffer(command_buffer, &begin_info)?;
    }

    record(device.handle(), command_buffer);

    let command_buffers = [command_buffer];
    let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

    unsafe {
        device.handle().end_command_buffer(command_buffer)?;
        device
            .handle()
            .queue_submit(device.graphics_queue(), &[submit_info], vk::Fence::null())?;
        // Coarse but simple: uploads happen at load time, not per frame
        device.handle().queue_wait_idle(device.graphics_queue())?;
    }

    pool.free_command_buffers(&command_buffers);

    Ok(())
}
