//! Sampled texture management.
//!
//! This module handles uploading decoded image data into a GPU texture:
//! a staging-buffer copy into an optimally-tiled image, layout transitions
//! recorded on a one-time command buffer, and a sampled image view plus
//! sampler for descriptor binding.

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::{debug, info};

use crate::buffer::{Buffer, BufferUsage};
use crate::command::{CommandPool, one_time_submit};
use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// A sampled 2D texture.
///
/// Owns the image, its memory, the sampled image view, and the sampler.
/// The image is kept in `SHADER_READ_ONLY_OPTIMAL` layout after upload.
pub struct Texture {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan image handle.
    image: vk::Image,
    /// Sampled image view.
    image_view: vk::ImageView,
    /// Sampler used with the view.
    sampler: vk::Sampler,
    /// GPU memory allocation.
    allocation: Option<Allocation>,
    /// Image format.
    format: vk::Format,
    /// Image dimensions.
    extent: vk::Extent2D,
}

impl Texture {
    /// Creates a texture from tightly packed RGBA8 pixel data.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `pool` - Command pool used for the staging copy (graphics family)
    /// * `width` / `height` - Image dimensions in pixels
    /// * `pixels` - `width * height * 4` bytes of RGBA data
    ///
    /// # Errors
    ///
    /// Returns an error if the pixel data size does not match the
    /// dimensions, or if any Vulkan resource creation or the upload fails.
    pub fn from_rgba8(
        device: Arc<Device>,
        pool: &CommandPool,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> RhiResult<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RhiError::InvalidHandle(format!(
                "Texture data size mismatch: {} bytes for {}x{} RGBA",
                pixels.len(),
                width,
                height
            )));
        }

        let format = vk::Format::R8G8B8A8_SRGB;
        let extent = vk::Extent2D { width, height };

        // Create the destination image
        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { device.handle().create_image(&image_info, None)? };

        let requirements = unsafe { device.handle().get_image_memory_requirements(image) };

        let allocation = {
            let mut allocator = device.allocator().lock().unwrap();
            allocator.allocate(&AllocationCreateDesc {
                name: "texture",
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })?
        };

        unsafe {
            device
                .handle()
                .bind_image_memory(image, allocation.memory(), allocation.offset())?;
        }

        // Stage the pixel data and record transition -> copy -> transition
        let staging = Buffer::new(
            device.clone(),
            BufferUsage::Staging,
            pixels.len() as vk::DeviceSize,
        )?;
        staging.write_data(0, pixels)?;

        let subresource_range = vk::ImageSubresourceRange::default()
            .aspect_mask(vk::ImageAspectFlags::COLOR)
            .base_mip_level(0)
            .level_count(1)
            .base_array_layer(0)
            .layer_count(1);

        one_time_submit(pool, |dev, cmd| unsafe {
            let to_transfer = vk::ImageMemoryBarrier::default()
                .src_access_mask(vk::AccessFlags::empty())
                .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .old_layout(vk::ImageLayout::UNDEFINED)
                .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(subresource_range);

            dev.cmd_pipeline_barrier(
                cmd,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_transfer],
            );

            let region = vk::BufferImageCopy::default()
                .buffer_offset(0)
                .buffer_row_length(0)
                .buffer_image_height(0)
                .image_subresource(
                    vk::ImageSubresourceLayers::default()
                        .aspect_mask(vk::ImageAspectFlags::COLOR)
                        .mip_level(0)
                        .base_array_layer(0)
                        .layer_count(1),
                )
                .image_extent(vk::Extent3D {
                    width,
                    height,
                    depth: 1,
                });

            dev.cmd_copy_buffer_to_image(
                cmd,
                staging.handle(),
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );

            let to_sampled = vk::ImageMemoryBarrier::default()
                .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .dst_access_mask(vk::AccessFlags::SHADER_READ)
                .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(subresource_range);

            dev.cmd_pipeline_barrier(
                cmd,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_sampled],
            );
        })?;

        // Create the sampled view
        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(subresource_range);

        let image_view = unsafe { device.handle().create_image_view(&view_info, None)? };

        // Create the sampler
        let sampler_info = vk::SamplerCreateInfo::default()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::REPEAT)
            .address_mode_v(vk::SamplerAddressMode::REPEAT)
            .address_mode_w(vk::SamplerAddressMode::REPEAT)
            .anisotropy_enable(true)
            .max_anisotropy(16.0)
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .min_lod(0.0)
            .max_lod(0.0);

        let sampler = unsafe { device.handle().create_sampler(&sampler_info, None)? };

        info!("Created texture: {}x{} ({:?})", width, height, format);

        Ok(Self {
            device,
            image,
            image_view,
            sampler,
            allocation: Some(allocation),
            format,
            extent,
        })
    }

    /// Creates a 1x1 texture of a single color.
    ///
    /// Useful as a neutral fallback when no texture asset is available; the
    /// mesh shader multiplies the sample with the vertex color, so a white
    /// pixel leaves shading unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if texture creation fails.
    pub fn solid_color(device: Arc<Device>, pool: &CommandPool, rgba: [u8; 4]) -> RhiResult<Self> {
        Self::from_rgba8(device, pool, 1, 1, &rgba)
    }

    /// Returns the Vulkan image handle.
    #[inline]
    pub fn image(&self) -> vk::Image {
        self.image
    }

    /// Returns the sampled image view.
    #[inline]
    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }

    /// Returns the sampler.
    #[inline]
    pub fn sampler(&self) -> vk::Sampler {
        self.sampler
    }

    /// Returns the image format.
    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Returns the image dimensions.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Builds the descriptor image info for binding this texture.
    pub fn descriptor_info(&self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo::default()
            .sampler(self.sampler)
            .image_view(self.image_view)
            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_sampler(self.sampler, None);
            self.device
                .handle()
                .destroy_image_view(self.image_view, None);
            self.device.handle().destroy_image(self.image, None);
        }

        if let Some(allocation) = self.allocation.take() {
            let mut allocator = self.device.allocator().lock().unwrap();
            if let Err(e) = allocator.free(allocation) {
                tracing::error!("Failed to free texture allocation: {:?}", e);
            }
        }

        debug!(
            "Destroyed texture: {}x{}",
            self.extent.width, self.extent.height
        );
    }
}
