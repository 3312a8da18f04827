//! Descriptor set management for shader resource binding.
//!
//! This module provides abstractions for Vulkan descriptor management:
//! - [`DescriptorSetLayout`] defines the layout of shader bindings
//! - [`DescriptorPool`] manages allocation of descriptor sets
//! - [`DescriptorBinding`] helpers for common binding kinds
//! - [`update_descriptor_sets`] for writing resource bindings
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ash::vk;
//! use lantern_rhi::device::Device;
//! use lantern_rhi::descriptor::{DescriptorBinding, DescriptorPool, DescriptorSetLayout};
//!
//! # fn example(device: Arc<Device>) -> Result<(), lantern_rhi::RhiError> {
//! // Create layout with a uniform buffer binding
//! let binding = DescriptorBinding::uniform_buffer(0, vk::ShaderStageFlags::VERTEX);
//! let layout = DescriptorSetLayout::new(device.clone(), &[binding])?;
//!
//! // Create pool
//! let pool_size = vk::DescriptorPoolSize::default()
//!     .ty(vk::DescriptorType::UNIFORM_BUFFER)
//!     .descriptor_count(10);
//! let pool = DescriptorPool::new(device.clone(), 10, &[pool_size])?;
//!
//! // Allocate descriptor sets
//! let sets = pool.allocate(&[layout.handle()])?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Helpers for building common descriptor set layout bindings.
pub struct DescriptorBinding;

impl DescriptorBinding {
    /// A single uniform buffer binding visible to the given stages.
    pub fn uniform_buffer(
        binding: u32,
        stages: vk::ShaderStageFlags,
    ) -> vk::DescriptorSetLayoutBinding<'static> {
        vk::DescriptorSetLayoutBinding::default()
            .binding(binding)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(1)
            .stage_flags(stages)
    }

    /// A single combined image sampler binding visible to the given stages.
    pub fn combined_image_sampler(
        binding: u32,
        stages: vk::ShaderStageFlags,
    ) -> vk::DescriptorSetLayoutBinding<'static> {
        vk::DescriptorSetLayoutBinding::default()
            .binding(binding)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .descriptor_count(1)
            .stage_flags(stages)
    }
}

/// Descriptor set layout wrapper.
///
/// A descriptor set layout defines the structure of resources that can be
/// bound to a shader. It specifies the binding points, descriptor types,
/// and shader stages that can access each resource.
///
/// # Thread Safety
///
/// The layout itself is immutable after creation. It can be shared between
/// threads when wrapped in `Arc`.
pub struct DescriptorSetLayout {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan descriptor set layout handle.
    layout: vk::DescriptorSetLayout,
}

impl DescriptorSetLayout {
    /// Creates a new descriptor set layout.
    ///
    /// # Errors
    ///
    /// Returns an error if layout creation fails.
    pub fn new(
        device: Arc<Device>,
        bindings: &[vk::DescriptorSetLayoutBinding],
    ) -> RhiResult<Self> {
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(bindings);

        let layout = unsafe {
            device
                .handle()
                .create_descriptor_set_layout(&create_info, None)?
        };

        debug!(
            "Created descriptor set layout with {} binding(s)",
            bindings.len()
        );

        Ok(Self { device, layout })
    }

    /// Returns the Vulkan descriptor set layout handle.
    #[inline]
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_descriptor_set_layout(self.layout, None);
        }
        debug!("Destroyed descriptor set layout");
    }
}

/// Descriptor pool wrapper.
///
/// Descriptor sets are allocated from pools; the pool owns their storage and
/// frees it when dropped, so individual sets are never freed explicitly.
pub struct DescriptorPool {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan descriptor pool handle.
    pool: vk::DescriptorPool,
}

impl DescriptorPool {
    /// Creates a new descriptor pool.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `max_sets` - Maximum number of descriptor sets allocatable
    /// * `pool_sizes` - Descriptor counts per type
    ///
    /// # Errors
    ///
    /// Returns an error if pool creation fails.
    pub fn new(
        device: Arc<Device>,
        max_sets: u32,
        pool_sizes: &[vk::DescriptorPoolSize],
    ) -> RhiResult<Self> {
        let create_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(max_sets)
            .pool_sizes(pool_sizes);

        let pool = unsafe { device.handle().create_descriptor_pool(&create_info, None)? };

        debug!("Created descriptor pool (max {} sets)", max_sets);

        Ok(Self { device, pool })
    }

    /// Allocates one descriptor set per layout handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool is exhausted or allocation fails.
    pub fn allocate(
        &self,
        layouts: &[vk::DescriptorSetLayout],
    ) -> RhiResult<Vec<vk::DescriptorSet>> {
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.pool)
            .set_layouts(layouts);

        let sets = unsafe { self.device.handle().allocate_descriptor_sets(&alloc_info)? };

        debug!("Allocated {} descriptor set(s)", sets.len());

        Ok(sets)
    }

    /// Returns the Vulkan descriptor pool handle.
    #[inline]
    pub fn handle(&self) -> vk::DescriptorPool {
        self.pool
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_descriptor_pool(self.pool, None);
        }
        debug!("Destroyed descriptor pool");
    }
}

/// Applies a batch of descriptor set writes.
pub fn update_descriptor_sets(device: &Device, writes: &[vk::WriteDescriptorSet]) {
    unsafe {
        device.handle().update_descriptor_sets(writes, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_buffer_binding() {
        let binding = DescriptorBinding::uniform_buffer(0, vk::ShaderStageFlags::VERTEX);
        assert_eq!(binding.binding, 0);
        assert_eq!(binding.descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(binding.descriptor_count, 1);
        assert_eq!(binding.stage_flags, vk::ShaderStageFlags::VERTEX);
    }

    #[test]
    fn test_combined_image_sampler_binding() {
        let binding =
            DescriptorBinding::combined_image_sampler(1, vk::ShaderStageFlags::FRAGMENT);
        assert_eq!(binding.binding, 1);
        assert_eq!(
            binding.descriptor_type,
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER
        );
        assert_eq!(binding.stage_flags, vk::ShaderStageFlags::FRAGMENT);
    }
}
