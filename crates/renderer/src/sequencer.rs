//! Frame sequencing and synchronization.
//!
//! The [`FrameSequencer`] owns the swapchain and the rotating pool of frame
//! slots, and sequences all per-frame CPU/GPU work:
//!
//! 1. `begin_frame` waits on the slot's fence (backpressure against
//!    unbounded GPU queuing), acquires a swapchain image with the slot's
//!    image-available semaphore, and begins command recording
//! 2. `begin_render_pass` / `end_render_pass` bracket draw recording against
//!    the framebuffer of the acquired image
//! 3. `end_frame` submits (waiting on image-available, signaling
//!    render-finished and the slot's fence) and presents (waiting on
//!    render-finished), then advances the slot
//!
//! Swapchain invalidation (out-of-date acquire, suboptimal/out-of-date
//! present, or an external resize notification) triggers wholesale
//! recreation behind a full device-idle wait. An out-of-date acquire makes
//! `begin_frame` return `Ok(None)`: the caller skips that tick and retries
//! on the next loop iteration. This is normal control flow, not an error.
//!
//! # Protocol
//!
//! Exactly one frame may be open at a time. Calling `begin_frame` while a
//! frame is open, or any of the other operations while none is, is a
//! programming error guarded by debug assertions, as is passing a command
//! buffer that does not belong to the active slot.
//!
//! # Example
//!
//! ```no_run
//! # use lantern_renderer::FrameSequencer;
//! # fn example(sequencer: &mut FrameSequencer) -> Result<(), lantern_rhi::RhiError> {
//! // Main render loop
//! if let Some(cmd) = sequencer.begin_frame()? {
//!     sequencer.begin_render_pass(cmd);
//!     // ... render systems record into cmd ...
//!     sequencer.end_render_pass(cmd);
//!     sequencer.end_frame()?;
//! }
//! // A `None` frame means the swapchain was just recreated: skip this tick.
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tracing::{debug, info};

use lantern_platform::Surface;
use lantern_rhi::command::CommandPool;
use lantern_rhi::device::Device;
use lantern_rhi::instance::Instance;
use lantern_rhi::swapchain::{ImageAcquire, Swapchain};
use lantern_rhi::sync::{Fence, Semaphore};
use lantern_rhi::vk;
use lantern_rhi::{RhiError, RhiResult};

use crate::MAX_FRAMES_IN_FLIGHT;
use crate::frame::{FrameState, extent_is_usable, should_recreate_after_present};

/// Background clear color (dark gray).
const CLEAR_COLOR: [f32; 4] = [0.01, 0.01, 0.01, 1.0];

/// One frame-in-flight "lane": a command buffer plus the synchronization
/// primitives gating its reuse.
///
/// ```text
/// 1. Wait on in_flight (CPU waits for this slot's previous GPU work)
/// 2. Acquire swapchain image (signals image_available)
/// 3. Record commands into command_buffer
/// 4. Submit: wait image_available, signal render_finished + in_flight
/// 5. Present: wait render_finished
/// ```
struct FrameSlot {
    /// Primary command buffer, allocated from the device's command pool at
    /// startup and freed at shutdown. Slot-scoped, not swapchain-scoped:
    /// recreation does not touch it.
    command_buffer: vk::CommandBuffer,
    /// Signaled when the acquired swapchain image is ready.
    image_available: Semaphore,
    /// Signaled when this slot's rendering is complete.
    render_finished: Semaphore,
    /// Signaled when this slot's submission retires; created signaled so
    /// the first frame does not block.
    in_flight: Fence,
}

impl FrameSlot {
    fn new(device: Arc<Device>, command_buffer: vk::CommandBuffer) -> RhiResult<Self> {
        let image_available = Semaphore::new(device.clone())?;
        let render_finished = Semaphore::new(device.clone())?;
        let in_flight = Fence::new(device, true)?;

        Ok(Self {
            command_buffer,
            image_available,
            render_finished,
            in_flight,
        })
    }
}

/// Sequences per-frame CPU/GPU work across [`MAX_FRAMES_IN_FLIGHT`] slots.
///
/// Exclusively owns the swapchain and the frame slots; render systems
/// receive per-frame handles and must not retain them across frames.
///
/// # Thread Safety
///
/// Not thread-safe: one thread drives the loop and records all commands.
/// Concurrency exists only between CPU and GPU, bounded by the slot fences.
pub struct FrameSequencer {
    // Field order is drop order: the swapchain must be destroyed before the
    // surface, and both before the device/instance handles are released.
    /// Presentable image chain and its framebuffers.
    swapchain: Swapchain,
    /// Window surface (outlives the swapchain built on it).
    surface: Surface,
    /// Rotating frame slots.
    frames: Vec<FrameSlot>,
    /// Pool the command buffers came from, for the shutdown free.
    command_pool: vk::CommandPool,
    /// Pure protocol state: slot rotation, image index, open-frame flag.
    state: FrameState,
    /// Most recent window extent reported by the platform layer.
    window_extent: vk::Extent2D,
    /// External resize notification, consumed by the next `end_frame`.
    resize_requested: bool,
    /// Set when recreation was deferred because the window had zero area;
    /// the stale swapchain must not be used for acquisition.
    swapchain_stale: bool,
    device: Arc<Device>,
    instance: Arc<Instance>,
}

impl FrameSequencer {
    /// Creates the sequencer: builds the initial swapchain and allocates
    /// one primary command buffer plus sync primitives per frame slot.
    ///
    /// # Arguments
    ///
    /// * `instance` - The Vulkan instance
    /// * `device` - The logical device
    /// * `surface` - The window surface (ownership transfers here)
    /// * `command_pool` - Pool to allocate the per-slot command buffers
    ///   from; must outlive the sequencer
    /// * `window_extent` - Current framebuffer extent (must be non-zero)
    ///
    /// # Errors
    ///
    /// Returns an error if swapchain or per-slot resource creation fails.
    pub fn new(
        instance: Arc<Instance>,
        device: Arc<Device>,
        surface: Surface,
        command_pool: &CommandPool,
        window_extent: vk::Extent2D,
    ) -> RhiResult<Self> {
        let swapchain = Swapchain::new(
            &instance,
            device.clone(),
            surface.handle(),
            surface.loader(),
            window_extent,
        )?;

        let command_buffers = command_pool.allocate_command_buffers(MAX_FRAMES_IN_FLIGHT as u32)?;

        let mut frames = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        for (i, &command_buffer) in command_buffers.iter().enumerate() {
            frames.push(FrameSlot::new(device.clone(), command_buffer)?);
            debug!("Created frame slot {}", i);
        }

        info!(
            "Frame sequencer created: {} frames in flight, {} swapchain images",
            MAX_FRAMES_IN_FLIGHT,
            swapchain.image_count()
        );

        Ok(Self {
            swapchain,
            surface,
            frames,
            command_pool: command_pool.handle(),
            state: FrameState::new(),
            window_extent,
            resize_requested: false,
            swapchain_stale: false,
            device,
            instance,
        })
    }

    /// Begins a frame: waits for the current slot, acquires a swapchain
    /// image, and starts command recording.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no frame could be started this tick (the swapchain
    /// was out of date and has been recreated, or recreation is deferred on
    /// a zero-area window). The caller skips the tick and retries on the
    /// next loop iteration.
    ///
    /// # Errors
    ///
    /// Fatal on any fence, acquisition, or recording failure other than the
    /// out-of-date signal.
    pub fn begin_frame(&mut self) -> RhiResult<Option<vk::CommandBuffer>> {
        debug_assert!(
            !self.state.is_frame_started(),
            "Cannot begin a frame while one is already in progress"
        );

        // A deferred recreation is retried before anything touches the
        // stale swapchain
        if self.swapchain_stale {
            self.recreate_swapchain()?;
            if self.swapchain_stale {
                return Ok(None);
            }
        }

        let slot_index = self.state.current_slot();

        // Sole backpressure point: block until this slot's previous
        // submission has retired
        self.frames[slot_index].in_flight.wait(u64::MAX)?;

        let acquire = self
            .swapchain
            .acquire_next_image(self.frames[slot_index].image_available.handle())?;

        let image_index = match acquire {
            ImageAcquire::Acquired { index, .. } => index,
            // Suboptimal at acquire still yields a usable image; present
            // will report it and end_frame recreates then
            ImageAcquire::OutOfDate => {
                self.recreate_swapchain()?;
                return Ok(None);
            }
        };

        // Reset only after an image is secured: resetting before a failed
        // acquire would leave the fence unsignaled with no submission to
        // signal it, deadlocking the next wait on this slot
        self.frames[slot_index].in_flight.reset()?;

        let command_buffer = self.frames[slot_index].command_buffer;
        let begin_info = vk::CommandBufferBeginInfo::default();
        unsafe {
            self.device
                .handle()
                .reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())?;
            self.device
                .handle()
                .begin_command_buffer(command_buffer, &begin_info)?;
        }

        self.state.begin_frame(image_index);

        Ok(Some(command_buffer))
    }

    /// Ends the frame: finishes recording, submits, presents, and advances
    /// the slot.
    ///
    /// Recreates the swapchain when presentation reports suboptimal or
    /// out-of-date, or when a resize was signaled via
    /// [`notify_resize`](Self::notify_resize). The slot index advances
    /// regardless of the outcome.
    ///
    /// # Errors
    ///
    /// Fatal on recording, submission, or presentation failures other than
    /// the non-fatal recreation signals.
    pub fn end_frame(&mut self) -> RhiResult<()> {
        debug_assert!(
            self.state.is_frame_started(),
            "Cannot end a frame when none is in progress"
        );

        let slot_index = self.state.frame_index();
        let image_index = self.state.image_index();
        let slot = &self.frames[slot_index];
        let command_buffer = slot.command_buffer;

        unsafe {
            self.device.handle().end_command_buffer(command_buffer)?;
        }

        let wait_semaphores = [slot.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [slot.render_finished.handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device
                .submit_graphics(&[submit_info], slot.in_flight.handle())?;
        }

        let outcome = self.swapchain.present(
            self.device.present_queue(),
            image_index,
            slot.render_finished.handle(),
        )?;

        if should_recreate_after_present(outcome, self.resize_requested) {
            self.resize_requested = false;
            self.recreate_swapchain()?;
        }

        self.state.end_frame();

        Ok(())
    }

    /// Begins the swapchain render pass on the active frame's command
    /// buffer and sets a viewport/scissor spanning the swapchain extent.
    ///
    /// The dynamic viewport means pipelines survive resizes unchanged; only
    /// the swapchain and its framebuffers are rebuilt.
    pub fn begin_render_pass(&self, command_buffer: vk::CommandBuffer) {
        debug_assert!(
            self.state.is_frame_started(),
            "Cannot begin a render pass when no frame is in progress"
        );
        debug_assert!(
            command_buffer == self.frames[self.state.frame_index()].command_buffer,
            "Cannot begin a render pass on a command buffer from a different frame"
        );

        let extent = self.swapchain.extent();

        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: CLEAR_COLOR,
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ];

        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(self.swapchain.render_pass())
            .framebuffer(self.swapchain.framebuffer(self.state.image_index() as usize))
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            })
            .clear_values(&clear_values);

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };

        unsafe {
            self.device.handle().cmd_begin_render_pass(
                command_buffer,
                &begin_info,
                vk::SubpassContents::INLINE,
            );
            self.device
                .handle()
                .cmd_set_viewport(command_buffer, 0, &[viewport]);
            self.device
                .handle()
                .cmd_set_scissor(command_buffer, 0, &[scissor]);
        }
    }

    /// Ends the swapchain render pass on the active frame's command buffer.
    pub fn end_render_pass(&self, command_buffer: vk::CommandBuffer) {
        debug_assert!(
            self.state.is_frame_started(),
            "Cannot end a render pass when no frame is in progress"
        );
        debug_assert!(
            command_buffer == self.frames[self.state.frame_index()].command_buffer,
            "Cannot end a render pass on a command buffer from a different frame"
        );

        unsafe {
            self.device.handle().cmd_end_render_pass(command_buffer);
        }
    }

    /// Records a window resize. The new extent takes effect on the next
    /// swapchain recreation, which the next `end_frame` triggers.
    pub fn notify_resize(&mut self, width: u32, height: u32) {
        self.window_extent = vk::Extent2D { width, height };
        self.resize_requested = true;
    }

    /// Whether a frame is currently open.
    #[inline]
    pub fn is_frame_in_progress(&self) -> bool {
        self.state.is_frame_started()
    }

    /// The active frame's slot index (for indexing per-slot resources such
    /// as uniform buffers and descriptor sets).
    ///
    /// Must only be called while a frame is open.
    #[inline]
    pub fn frame_index(&self) -> usize {
        self.state.frame_index()
    }

    /// The active frame's command buffer.
    ///
    /// Must only be called while a frame is open.
    #[inline]
    pub fn current_command_buffer(&self) -> vk::CommandBuffer {
        debug_assert!(
            self.state.is_frame_started(),
            "Cannot get command buffer when no frame is in progress"
        );
        self.frames[self.state.frame_index()].command_buffer
    }

    /// The render pass compatible with the swapchain framebuffers.
    ///
    /// Render systems build their pipelines against this; they query it
    /// fresh rather than caching it across frames.
    #[inline]
    pub fn render_pass(&self) -> vk::RenderPass {
        self.swapchain.render_pass()
    }

    /// Aspect ratio of the current swapchain extent.
    ///
    /// Queried per frame so projection matrices pick up recreations.
    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.swapchain.aspect_ratio()
    }

    /// Current swapchain extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// Rebuilds the swapchain for the current window extent.
    ///
    /// Waits for the device to go fully idle first: recreation is rare, and
    /// any lingering GPU reference to the replaced framebuffers would be
    /// undefined behavior. With a zero-area window the rebuild is deferred
    /// (no Vulkan calls) until a usable extent arrives.
    ///
    /// The old swapchain stays alive until the new one passes the format
    /// compatibility check; a format change across recreation is an
    /// environment change the renderer's pipelines cannot survive, so it is
    /// fatal.
    fn recreate_swapchain(&mut self) -> RhiResult<()> {
        self.device.wait_idle()?;

        let extent = self.window_extent;
        if !extent_is_usable(extent.width, extent.height) {
            self.swapchain_stale = true;
            debug!(
                "Swapchain recreation deferred: window extent is {}x{}",
                extent.width, extent.height
            );
            return Ok(());
        }

        let new_swapchain = Swapchain::with_previous(
            &self.instance,
            self.device.clone(),
            self.surface.handle(),
            self.surface.loader(),
            extent,
            &self.swapchain,
        )?;

        if !new_swapchain.is_compatible_with(&self.swapchain) {
            return Err(RhiError::SwapchainError(
                "Swapchain image or depth format has changed".to_string(),
            ));
        }

        self.swapchain = new_swapchain;
        self.swapchain_stale = false;
        // The rebuild consumed any pending resize; a second recreation on
        // the next end_frame would be redundant
        self.resize_requested = false;

        info!(
            "Swapchain recreated: {}x{}",
            self.swapchain.extent().width,
            self.swapchain.extent().height
        );

        Ok(())
    }
}

impl Drop for FrameSequencer {
    fn drop(&mut self) {
        // No slot may still be executing when its command buffer is freed
        // or the swapchain's framebuffers are destroyed
        if let Err(e) = self.device.wait_idle() {
            tracing::error!("Failed to wait for device idle during drop: {:?}", e);
        }

        let command_buffers: Vec<vk::CommandBuffer> =
            self.frames.iter().map(|f| f.command_buffer).collect();
        unsafe {
            self.device
                .handle()
                .free_command_buffers(self.command_pool, &command_buffers);
        }

        info!("Frame sequencer destroyed");
    }
}
