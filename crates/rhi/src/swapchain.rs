//! Swapchain management.
//!
//! This module owns the presentable image chain and everything whose lifetime
//! is tied to the surface's current configuration: the swapchain images and
//! views, one depth attachment per image, the single-subpass render pass that
//! describes how they are used, and the framebuffers binding color + depth.
//!
//! # Overview
//!
//! The [`Swapchain`] struct provides a safe abstraction over the Vulkan
//! swapchain, including:
//! - Surface capability querying
//! - Format and present mode selection
//! - Render pass and framebuffer creation
//! - Image acquisition and presentation with distinguished
//!   out-of-date/suboptimal signals
//!
//! A swapchain instance is immutable: image count, format, and extent are
//! fixed for its lifetime. When the surface changes (resize, out-of-date
//! signal), the frame sequencer replaces the instance wholesale via
//! [`Swapchain::with_previous`], keeping the old instance alive just long
//! enough to validate format compatibility.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lantern_rhi::device::Device;
//! use lantern_rhi::instance::Instance;
//! use lantern_rhi::swapchain::{ImageAcquire, Swapchain};
//! use ash::vk;
//!
//! # fn example(
//! #     instance: &Instance,
//! #     device: Arc<Device>,
//! #     surface: vk::SurfaceKHR,
//! #     surface_loader: &ash::khr::surface::Instance,
//! #     semaphore: vk::Semaphore,
//! # ) -> Result<(), lantern_rhi::RhiError> {
//! let extent = vk::Extent2D { width: 800, height: 600 };
//! let swapchain = Swapchain::new(instance, device, surface, surface_loader, extent)?;
//!
//! match swapchain.acquire_next_image(semaphore)? {
//!     ImageAcquire::Acquired { index, .. } => { /* render to image `index` */ }
//!     ImageAcquire::OutOfDate => { /* recreate the swapchain */ }
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info, warn};

use crate::depth::{DEFAULT_DEPTH_FORMAT, DepthImage};
use crate::device::Device;
use crate::error::RhiError;
use crate::instance::Instance;

/// Result of a swapchain image acquisition.
///
/// `OutOfDate` is a non-fatal signal that the surface no longer matches the
/// swapchain's configuration; the caller is expected to recreate the
/// swapchain and skip the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAcquire {
    /// An image was acquired and the given semaphore will be signaled.
    Acquired {
        /// Index of the acquired swapchain image.
        index: u32,
        /// The swapchain still works but no longer matches the surface
        /// exactly; presentation will report the same condition.
        suboptimal: bool,
    },
    /// The swapchain is out of date and must be recreated.
    OutOfDate,
}

/// Result of a presentation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    /// The image was queued for presentation.
    Presented,
    /// The swapchain is suboptimal or out of date and should be recreated.
    NeedsRecreation,
}

/// Swapchain surface support details.
///
/// Contains information about what the surface supports for swapchain creation.
#[derive(Debug, Clone)]
pub struct SwapchainSupportDetails {
    /// Surface capabilities (min/max image count, extents, transforms, etc.)
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats (format and color space combinations)
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes (FIFO, MAILBOX, IMMEDIATE, etc.)
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupportDetails {
    /// Queries swapchain support details for a physical device and surface.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the queries fail.
    pub fn query(
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
    ) -> Result<Self, RhiError> {
        let capabilities = unsafe {
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)?
        };

        let formats = unsafe {
            surface_loader.get_physical_device_surface_formats(physical_device, surface)?
        };

        let present_modes = unsafe {
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface)?
        };

        debug!(
            "Swapchain support: {} formats, {} present modes, image count: {}-{}",
            formats.len(),
            present_modes.len(),
            capabilities.min_image_count,
            if capabilities.max_image_count == 0 {
                "unlimited".to_string()
            } else {
                capabilities.max_image_count.to_string()
            }
        );

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    /// Checks if the swapchain support is adequate for rendering.
    ///
    /// Returns true if at least one format and one present mode are available.
    #[inline]
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Vulkan swapchain wrapper.
///
/// This struct manages the swapchain and its surface-configuration-dependent
/// resources:
/// - Swapchain images (owned by the swapchain itself)
/// - Image views
/// - Per-image depth attachments
/// - The render pass
/// - Framebuffers (color + depth per image)
///
/// # Thread Safety
///
/// The swapchain is not thread-safe. Only one thread should interact with
/// it at a time; the frame sequencer is its sole owner.
pub struct Swapchain {
    /// Reference to the logical device
    device: Arc<Device>,
    /// Swapchain extension loader
    swapchain_loader: ash::khr::swapchain::Device,
    /// Swapchain handle
    swapchain: vk::SwapchainKHR,
    /// Swapchain images (owned by the swapchain)
    images: Vec<vk::Image>,
    /// Image views for the swapchain images
    image_views: Vec<vk::ImageView>,
    /// Per-image depth attachments
    depth_images: Vec<DepthImage>,
    /// Render pass binding one color and one depth attachment
    render_pass: vk::RenderPass,
    /// One framebuffer per swapchain image
    framebuffers: Vec<vk::Framebuffer>,
    /// Swapchain image format
    format: vk::Format,
    /// Swapchain color space
    color_space: vk::ColorSpaceKHR,
    /// Depth attachment format
    depth_format: vk::Format,
    /// Swapchain extent (resolution)
    extent: vk::Extent2D,
    /// Present mode
    present_mode: vk::PresentModeKHR,
}

impl Swapchain {
    /// Creates a new swapchain.
    ///
    /// This function creates a swapchain with:
    /// - Preferred format: B8G8R8A8_SRGB with SRGB_NONLINEAR color space
    /// - Preferred present mode: MAILBOX (low latency), fallback to FIFO (vsync)
    /// - A D32_SFLOAT depth attachment and framebuffer per image
    ///
    /// # Arguments
    ///
    /// * `instance` - The Vulkan instance
    /// * `device` - The logical device
    /// * `surface` - The window surface
    /// * `surface_loader` - The surface extension loader
    /// * `extent` - Desired swapchain extent (clamped to surface bounds)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Surface queries fail
    /// - No format or present mode is available
    /// - Swapchain, image view, depth, render pass, or framebuffer creation
    ///   fails (all unrecoverable driver/environment faults)
    pub fn new(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
        extent: vk::Extent2D,
    ) -> Result<Self, RhiError> {
        Self::create_internal(
            instance,
            device,
            surface,
            surface_loader,
            extent,
            vk::SwapchainKHR::null(),
        )
    }

    /// Creates a new swapchain replacing `previous`.
    ///
    /// The previous swapchain's handle is passed to the driver so in-flight
    /// presentation can be retired cleanly. The caller must keep `previous`
    /// alive until it has validated the new instance with
    /// [`is_compatible_with`](Self::is_compatible_with), then drop it.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`new`](Self::new).
    pub fn with_previous(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
        extent: vk::Extent2D,
        previous: &Swapchain,
    ) -> Result<Self, RhiError> {
        Self::create_internal(
            instance,
            device,
            surface,
            surface_loader,
            extent,
            previous.swapchain,
        )
    }

    fn create_internal(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
        extent: vk::Extent2D,
        old_swapchain: vk::SwapchainKHR,
    ) -> Result<Self, RhiError> {
        let swapchain_loader = ash::khr::swapchain::Device::new(instance.handle(), device.handle());

        // Query swapchain support
        let support =
            SwapchainSupportDetails::query(device.physical_device(), surface, surface_loader)?;

        if !support.is_adequate() {
            return Err(RhiError::SwapchainError(
                "Inadequate swapchain support (no formats or present modes)".to_string(),
            ));
        }

        // Select optimal settings
        let surface_format = choose_surface_format(&support.formats);
        let present_mode = choose_present_mode(&support.present_modes);
        let extent = choose_extent(&support.capabilities, extent.width, extent.height);
        let image_count = determine_image_count(&support.capabilities);

        info!(
            "Creating swapchain: {}x{}, format {:?}, color space {:?}, present mode {:?}, {} images",
            extent.width,
            extent.height,
            surface_format.format,
            surface_format.color_space,
            present_mode,
            image_count
        );

        // Handle queue family sharing
        let queue_families = device.queue_families();
        let graphics_family = queue_families.graphics_family.unwrap();
        let present_family = queue_families.present_family.unwrap();
        let queue_family_indices = [graphics_family, present_family];

        let (sharing_mode, queue_family_indices_slice) = if graphics_family != present_family {
            debug!(
                "Using CONCURRENT sharing mode between graphics ({}) and present ({}) queues",
                graphics_family, present_family
            );
            (vk::SharingMode::CONCURRENT, queue_family_indices.as_slice())
        } else {
            debug!("Using EXCLUSIVE sharing mode (same queue family for graphics and present)");
            (vk::SharingMode::EXCLUSIVE, &[][..])
        };

        // Create swapchain
        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(queue_family_indices_slice)
            .pre_transform(support.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain = unsafe { swapchain_loader.create_swapchain(&create_info, None)? };

        // Get swapchain images
        let images = unsafe { swapchain_loader.get_swapchain_images(swapchain)? };
        info!("Swapchain created with {} images", images.len());

        // Create image views
        let image_views = create_image_views(&device, &images, surface_format.format)?;

        // Create one depth attachment per image so frames in flight never
        // contend on a shared depth target
        let depth_format = DEFAULT_DEPTH_FORMAT;
        let mut depth_images = Vec::with_capacity(images.len());
        for _ in 0..images.len() {
            depth_images.push(DepthImage::new(device.clone(), extent, depth_format)?);
        }

        // Create render pass and framebuffers
        let render_pass = create_render_pass(&device, surface_format.format, depth_format)?;
        let framebuffers = create_framebuffers(
            &device,
            render_pass,
            &image_views,
            &depth_images,
            extent,
        )?;

        Ok(Self {
            device,
            swapchain_loader,
            swapchain,
            images,
            image_views,
            depth_images,
            render_pass,
            framebuffers,
            format: surface_format.format,
            color_space: surface_format.color_space,
            depth_format,
            extent,
            present_mode,
        })
    }

    /// Acquires the next swapchain image for rendering.
    ///
    /// The given semaphore is signaled once the image is ready to be
    /// rendered to.
    ///
    /// # Returns
    ///
    /// [`ImageAcquire::OutOfDate`] when the surface has changed since this
    /// swapchain was built. This is a normal control-flow outcome driving
    /// recreation, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error for any acquisition failure other than out-of-date.
    pub fn acquire_next_image(&self, semaphore: vk::Semaphore) -> Result<ImageAcquire, RhiError> {
        let result = unsafe {
            self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                semaphore,
                vk::Fence::null(),
            )
        };

        match result {
            Ok((index, suboptimal)) => Ok(ImageAcquire::Acquired { index, suboptimal }),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                debug!("Swapchain out of date during acquire");
                Ok(ImageAcquire::OutOfDate)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Presents the rendered image to the screen.
    ///
    /// # Arguments
    ///
    /// * `queue` - The presentation queue
    /// * `image_index` - Index of the image to present (from `acquire_next_image`)
    /// * `wait_semaphore` - Semaphore to wait on before presenting
    ///
    /// # Returns
    ///
    /// [`PresentOutcome::NeedsRecreation`] when the swapchain is suboptimal
    /// or out of date (non-fatal, triggers recreation).
    ///
    /// # Errors
    ///
    /// Returns an error for any presentation failure other than the two
    /// non-fatal conditions above.
    pub fn present(
        &self,
        queue: vk::Queue,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> Result<PresentOutcome, RhiError> {
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [wait_semaphore];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let result = unsafe { self.swapchain_loader.queue_present(queue, &present_info) };

        match result {
            Ok(false) => Ok(PresentOutcome::Presented),
            Ok(true) => {
                debug!("Swapchain suboptimal during present");
                Ok(PresentOutcome::NeedsRecreation)
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                debug!("Swapchain out of date during present");
                Ok(PresentOutcome::NeedsRecreation)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Checks format compatibility with another swapchain instance.
    ///
    /// True iff both the color format and the depth format match. Used
    /// across recreation to catch unexpected format drift; a mismatch means
    /// the surface environment changed in a way the renderer's pipelines
    /// cannot handle, and is treated as fatal by the caller.
    #[inline]
    pub fn is_compatible_with(&self, other: &Swapchain) -> bool {
        formats_compatible(
            self.format,
            self.depth_format,
            other.format,
            other.depth_format,
        )
    }

    /// Returns the swapchain handle.
    #[inline]
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Returns the swapchain image format.
    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Returns the swapchain color space.
    #[inline]
    pub fn color_space(&self) -> vk::ColorSpaceKHR {
        self.color_space
    }

    /// Returns the depth attachment format.
    #[inline]
    pub fn depth_format(&self) -> vk::Format {
        self.depth_format
    }

    /// Returns the render pass used by the swapchain's framebuffers.
    #[inline]
    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    /// Returns the framebuffer for the given image index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn framebuffer(&self, index: usize) -> vk::Framebuffer {
        self.framebuffers[index]
    }

    /// Returns the swapchain extent (resolution).
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Returns the aspect ratio of the swapchain extent.
    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.extent.width as f32 / self.extent.height as f32
    }

    /// Returns the present mode.
    #[inline]
    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    /// Returns the number of swapchain images.
    #[inline]
    pub fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    /// Returns the swapchain image at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn image(&self, index: usize) -> vk::Image {
        self.images[index]
    }

    /// Returns the image view at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn image_view(&self, index: usize) -> vk::ImageView {
        self.image_views[index]
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &framebuffer in &self.framebuffers {
                self.device.handle().destroy_framebuffer(framebuffer, None);
            }
            self.device
                .handle()
                .destroy_render_pass(self.render_pass, None);
            for &image_view in &self.image_views {
                self.device.handle().destroy_image_view(image_view, None);
            }
            // Depth images destroy themselves; swapchain images are owned by
            // the swapchain and destroyed with it
            self.swapchain_loader
                .destroy_swapchain(self.swapchain, None);
        }

        info!(
            "Swapchain destroyed (was {}x{}, {} images)",
            self.extent.width,
            self.extent.height,
            self.images.len()
        );
    }
}

/// Format-compatibility predicate behind
/// [`Swapchain::is_compatible_with`]: both the color and the depth format
/// must match exactly across recreation.
pub fn formats_compatible(
    color_a: vk::Format,
    depth_a: vk::Format,
    color_b: vk::Format,
    depth_b: vk::Format,
) -> bool {
    color_a == color_b && depth_a == depth_b
}

/// Chooses the best surface format from the available formats.
///
/// Prefers B8G8R8A8_SRGB with SRGB_NONLINEAR color space.
/// Falls back to the first available format if the preferred format is not available.
fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    // Prefer SRGB format for correct gamma handling
    let preferred = formats.iter().find(|f| {
        f.format == vk::Format::B8G8R8A8_SRGB && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
    });

    if let Some(&format) = preferred {
        debug!("Selected preferred surface format: B8G8R8A8_SRGB with SRGB_NONLINEAR");
        return format;
    }

    // Second choice: B8G8R8A8_UNORM with SRGB color space
    let alternative = formats.iter().find(|f| {
        f.format == vk::Format::B8G8R8A8_UNORM && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
    });

    if let Some(&format) = alternative {
        warn!("Using fallback surface format: B8G8R8A8_UNORM with SRGB_NONLINEAR");
        return format;
    }

    // Last resort: use the first available format
    warn!(
        "Using first available surface format: {:?}",
        formats[0].format
    );
    formats[0]
}

/// Chooses the best present mode from the available modes.
///
/// Prefers MAILBOX (no tearing, low latency).
/// Falls back to FIFO (vsync, which Vulkan guarantees to be available).
fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if present_modes.contains(&vk::PresentModeKHR::MAILBOX) {
        debug!("Selected MAILBOX present mode (triple buffering)");
        return vk::PresentModeKHR::MAILBOX;
    }

    debug!("Selected FIFO present mode (vsync)");
    vk::PresentModeKHR::FIFO
}

/// Chooses the swapchain extent (resolution).
///
/// If the current extent is not set (width/height are u32::MAX),
/// clamps the requested size to the surface's min/max extents.
fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    width: u32,
    height: u32,
) -> vk::Extent2D {
    // If current extent is defined, use it
    if capabilities.current_extent.width != u32::MAX {
        debug!(
            "Using current surface extent: {}x{}",
            capabilities.current_extent.width, capabilities.current_extent.height
        );
        return capabilities.current_extent;
    }

    // Otherwise, clamp the requested size to the surface's limits
    let extent = vk::Extent2D {
        width: width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    };

    debug!(
        "Calculated extent: {}x{} (requested: {}x{})",
        extent.width, extent.height, width, height
    );

    extent
}

/// Determines the optimal number of swapchain images.
///
/// Prefers one more than the minimum (for triple buffering),
/// but respects the maximum if set.
fn determine_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let preferred = capabilities.min_image_count + 1;

    // If max_image_count is 0, there's no maximum
    let image_count = if capabilities.max_image_count > 0 {
        preferred.min(capabilities.max_image_count)
    } else {
        preferred
    };

    debug!(
        "Image count: {} (min: {}, max: {})",
        image_count,
        capabilities.min_image_count,
        if capabilities.max_image_count == 0 {
            "unlimited".to_string()
        } else {
            capabilities.max_image_count.to_string()
        }
    );

    image_count
}

/// Creates image views for swapchain images.
fn create_image_views(
    device: &Device,
    images: &[vk::Image],
    format: vk::Format,
) -> Result<Vec<vk::ImageView>, RhiError> {
    let mut image_views = Vec::with_capacity(images.len());

    for (i, &image) in images.iter().enumerate() {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1),
            );

        let image_view = unsafe {
            device
                .handle()
                .create_image_view(&create_info, None)
                .map_err(|e| {
                    RhiError::SwapchainError(format!("Failed to create image view {}: {:?}", i, e))
                })?
        };

        image_views.push(image_view);
    }

    debug!("Created {} image views", image_views.len());
    Ok(image_views)
}

/// Creates the single-subpass render pass used by the swapchain framebuffers.
///
/// One color attachment (cleared, stored, transitioned to PRESENT_SRC) and
/// one depth attachment (cleared, discarded after the pass). The external
/// dependency orders the attachment writes after the previous frame's use of
/// the same image.
fn create_render_pass(
    device: &Device,
    color_format: vk::Format,
    depth_format: vk::Format,
) -> Result<vk::RenderPass, RhiError> {
    let attachments = [
        vk::AttachmentDescription::default()
            .format(color_format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::PRESENT_SRC_KHR),
        vk::AttachmentDescription::default()
            .format(depth_format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::DONT_CARE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
    ];

    let color_refs = [vk::AttachmentReference::default()
        .attachment(0)
        .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)];
    let depth_ref = vk::AttachmentReference::default()
        .attachment(1)
        .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

    let subpasses = [vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_refs)
        .depth_stencil_attachment(&depth_ref)];

    let dependencies = [vk::SubpassDependency::default()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
        )
        .src_access_mask(vk::AccessFlags::empty())
        .dst_stage_mask(
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
        )
        .dst_access_mask(
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        )];

    let create_info = vk::RenderPassCreateInfo::default()
        .attachments(&attachments)
        .subpasses(&subpasses)
        .dependencies(&dependencies);

    let render_pass = unsafe { device.handle().create_render_pass(&create_info, None)? };

    debug!(
        "Created render pass (color {:?}, depth {:?})",
        color_format, depth_format
    );

    Ok(render_pass)
}

/// Creates one framebuffer per swapchain image, binding color + depth.
fn create_framebuffers(
    device: &Device,
    render_pass: vk::RenderPass,
    image_views: &[vk::ImageView],
    depth_images: &[DepthImage],
    extent: vk::Extent2D,
) -> Result<Vec<vk::Framebuffer>, RhiError> {
    let mut framebuffers = Vec::with_capacity(image_views.len());

    for (i, (&image_view, depth)) in image_views.iter().zip(depth_images).enumerate() {
        let attachments = [image_view, depth.image_view()];

        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass)
            .attachments(&attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe {
            device
                .handle()
                .create_framebuffer(&create_info, None)
                .map_err(|e| {
                    RhiError::SwapchainError(format!("Failed to create framebuffer {}: {:?}", i, e))
                })?
        };

        framebuffers.push(framebuffer);
    }

    debug!("Created {} framebuffers", framebuffers.len());
    Ok(framebuffers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_surface_format_prefers_srgb() {
        let formats = vec![
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];

        let selected = choose_surface_format(&formats);
        assert_eq!(selected.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(selected.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn test_choose_surface_format_fallback() {
        let formats = vec![vk::SurfaceFormatKHR {
            format: vk::Format::R8G8B8A8_UNORM,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }];

        let selected = choose_surface_format(&formats);
        assert_eq!(selected.format, vk::Format::R8G8B8A8_UNORM);
    }

    #[test]
    fn test_choose_present_mode_prefers_mailbox() {
        let modes = vec![
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::MAILBOX,
            vk::PresentModeKHR::IMMEDIATE,
        ];

        let selected = choose_present_mode(&modes);
        assert_eq!(selected, vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn test_choose_present_mode_fallback_to_fifo() {
        let modes = vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];

        let selected = choose_present_mode(&modes);
        assert_eq!(selected, vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_choose_extent_uses_current() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 1920,
                height: 1080,
            },
            min_image_extent: vk::Extent2D {
                width: 1,
                height: 1,
            },
            max_image_extent: vk::Extent2D {
                width: 4096,
                height: 4096,
            },
            ..Default::default()
        };

        let extent = choose_extent(&capabilities, 800, 600);
        assert_eq!(extent.width, 1920);
        assert_eq!(extent.height, 1080);
    }

    #[test]
    fn test_choose_extent_clamps_to_limits() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 100,
                height: 100,
            },
            max_image_extent: vk::Extent2D {
                width: 2000,
                height: 2000,
            },
            ..Default::default()
        };

        // Test clamping to max
        let extent = choose_extent(&capabilities, 3000, 3000);
        assert_eq!(extent.width, 2000);
        assert_eq!(extent.height, 2000);

        // Test clamping to min
        let extent = choose_extent(&capabilities, 50, 50);
        assert_eq!(extent.width, 100);
        assert_eq!(extent.height, 100);

        // Test within range
        let extent = choose_extent(&capabilities, 800, 600);
        assert_eq!(extent.width, 800);
        assert_eq!(extent.height, 600);
    }

    #[test]
    fn test_determine_image_count() {
        // Test with max limit
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 3,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capabilities), 3);

        // Test with higher max limit
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 8,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capabilities), 3);

        // Min + 1 would exceed a tight max
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 2,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capabilities), 2);

        // Test with no max limit
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0, // 0 means no limit
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capabilities), 3);
    }

    #[test]
    fn test_formats_compatible_requires_exact_match() {
        let color = vk::Format::B8G8R8A8_SRGB;
        let depth = vk::Format::D32_SFLOAT;

        assert!(formats_compatible(color, depth, color, depth));
        // Color format drift across recreation is a fatal incompatibility
        assert!(!formats_compatible(
            color,
            depth,
            vk::Format::R8G8B8A8_UNORM,
            depth
        ));
        // So is depth format drift
        assert!(!formats_compatible(
            color,
            depth,
            color,
            vk::Format::D16_UNORM
        ));
    }

    #[test]
    fn test_swapchain_support_details_is_adequate() {
        let adequate = SwapchainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![vk::SurfaceFormatKHR::default()],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(adequate.is_adequate());

        let no_formats = SwapchainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(!no_formats.is_adequate());

        let no_modes = SwapchainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![vk::SurfaceFormatKHR::default()],
            present_modes: vec![],
        };
        assert!(!no_modes.is_adequate());
    }
}
