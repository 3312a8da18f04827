//! Depth attachment management.
//!
//! This module handles creation of the depth images backing the swapchain's
//! framebuffers. Each swapchain image gets its own depth attachment so that
//! frames in flight never share a depth target.
//!
//! # Overview
//!
//! - [`DepthImage`] wraps a VkImage and VkImageView for depth testing
//! - Uses D32_SFLOAT format by default (32-bit floating point)
//! - Memory is managed by gpu-allocator

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Default depth attachment format (32-bit floating point).
pub const DEFAULT_DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

/// Depth attachment for depth testing.
///
/// This struct manages a Vulkan image and image view used for depth testing.
/// The depth image is created with GPU-only memory.
///
/// # Resource Destruction
///
/// Resources are destroyed in the following order:
/// 1. Image view
/// 2. Image
/// 3. Memory allocation
pub struct DepthImage {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan image handle.
    image: vk::Image,
    /// Vulkan image view handle.
    image_view: vk::ImageView,
    /// GPU memory allocation.
    allocation: Option<Allocation>,
    /// Depth format.
    format: vk::Format,
    /// Depth attachment dimensions.
    extent: vk::Extent2D,
}

impl DepthImage {
    /// Creates a new depth attachment with the specified dimensions and format.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The extent has a zero dimension
    /// - Image creation fails
    /// - Memory allocation fails
    /// - Image view creation fails
    pub fn new(device: Arc<Device>, extent: vk::Extent2D, format: vk::Format) -> RhiResult<Self> {
        if extent.width == 0 || extent.height == 0 {
            return Err(RhiError::InvalidHandle(
                "Depth attachment dimensions must be greater than 0".to_string(),
            ));
        }

        // Create depth image
        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { device.handle().create_image(&image_info, None)? };

        // Get memory requirements and allocate
        let requirements = unsafe { device.handle().get_image_memory_requirements(image) };

        let allocation = {
            let mut allocator = device.allocator().lock().unwrap();
            allocator.allocate(&AllocationCreateDesc {
                name: "depth_attachment",
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false, // Optimal tiling is not linear
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })?
        };

        // Bind memory to image
        unsafe {
            device
                .handle()
                .bind_image_memory(image, allocation.memory(), allocation.offset())?;
        }

        // Create image view
        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::DEPTH)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1),
            );

        let image_view = unsafe { device.handle().create_image_view(&view_info, None)? };

        debug!(
            "Created depth attachment: {}x{} ({:?})",
            extent.width, extent.height, format
        );

        Ok(Self {
            device,
            image,
            image_view,
            allocation: Some(allocation),
            format,
            extent,
        })
    }

    /// Creates a depth attachment with the default format (D32_SFLOAT).
    ///
    /// # Errors
    ///
    /// Returns an error if depth attachment creation fails.
    pub fn with_default_format(device: Arc<Device>, extent: vk::Extent2D) -> RhiResult<Self> {
        Self::new(device, extent, DEFAULT_DEPTH_FORMAT)
    }

    /// Returns the Vulkan image handle.
    #[inline]
    pub fn image(&self) -> vk::Image {
        self.image
    }

    /// Returns the Vulkan image view handle.
    #[inline]
    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }

    /// Returns the depth format.
    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Returns the depth attachment extent (width and height).
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for DepthImage {
    fn drop(&mut self) {
        // Destroy resources in correct order:
        // 1. Image view (depends on image)
        // 2. Image (depends on allocation)
        // 3. Allocation (frees memory)
        unsafe {
            self.device
                .handle()
                .destroy_image_view(self.image_view, None);
            self.device.handle().destroy_image(self.image, None);
        }

        if let Some(allocation) = self.allocation.take() {
            let mut allocator = self.device.allocator().lock().unwrap();
            if let Err(e) = allocator.free(allocation) {
                tracing::error!("Failed to free depth attachment allocation: {:?}", e);
            }
        }

        debug!(
            "Destroyed depth attachment: {}x{}",
            self.extent.width, self.extent.height
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_depth_format() {
        assert_eq!(DEFAULT_DEPTH_FORMAT, vk::Format::D32_SFLOAT);
    }

    #[test]
    fn test_depth_format_is_valid() {
        // Verify D32_SFLOAT is a depth format
        let format = DEFAULT_DEPTH_FORMAT;
        assert!(matches!(
            format,
            vk::Format::D32_SFLOAT
                | vk::Format::D32_SFLOAT_S8_UINT
                | vk::Format::D24_UNORM_S8_UINT
                | vk::Format::D16_UNORM
        ));
    }
}
