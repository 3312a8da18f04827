//! Main renderer orchestration.
//!
//! This module provides the [`Renderer`] struct that owns the Vulkan
//! context, the frame sequencer, per-slot uniform resources, the render
//! systems, and the scene's objects, and drives one frame per call to
//! [`render_frame`](Renderer::render_frame).

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use lantern_platform::Window;
use lantern_resources::{ImageData, MeshData};
use lantern_rhi::RhiError;
use lantern_rhi::buffer::{Buffer, BufferUsage};
use lantern_rhi::command::CommandPool;
use lantern_rhi::descriptor::{
    DescriptorBinding, DescriptorPool, DescriptorSetLayout, update_descriptor_sets,
};
use lantern_rhi::device::Device;
use lantern_rhi::instance::Instance;
use lantern_rhi::physical_device::select_physical_device;
use lantern_rhi::texture::Texture;
use lantern_rhi::vk;

use lantern_scene::Camera;

use crate::MAX_FRAMES_IN_FLIGHT;
use crate::context::FrameContext;
use crate::error::{RendererError, RendererResult};
use crate::game_object::GameObjectMap;
use crate::model::Model;
use crate::sequencer::FrameSequencer;
use crate::systems::{MeshRenderSystem, PointLightSystem};
use crate::ubo::GlobalUbo;

/// Directory holding the compiled SPIR-V shaders.
const SHADER_DIR: &str = "shaders/spirv";

/// Main renderer owning all Vulkan resources and the scene.
///
/// # Resource Destruction Order
///
/// Fields are declared in destruction order: the sequencer goes first (it
/// waits for the device to idle, then releases the swapchain, surface, and
/// command buffers), followed by pipelines, scene buffers, descriptor
/// resources, the command pool, and finally the device and instance.
pub struct Renderer {
    /// Frame sequencer (swapchain, frame slots, surface).
    sequencer: FrameSequencer,
    /// Mesh render system.
    mesh_system: MeshRenderSystem,
    /// Point light system.
    point_light_system: PointLightSystem,
    /// Scene objects (hold shared GPU models).
    game_objects: GameObjectMap,
    /// One global uniform buffer per frame slot.
    frame_ubos: Vec<Buffer>,
    /// One global descriptor set per frame slot.
    global_descriptor_sets: Vec<vk::DescriptorSet>,
    /// Pool backing the global descriptor sets.
    _descriptor_pool: DescriptorPool,
    /// Layout of the global descriptor set.
    global_set_layout: DescriptorSetLayout,
    /// Texture bound at the global set's sampler slot.
    _texture: Texture,
    /// Pool for the sequencer's command buffers and upload commands.
    command_pool: CommandPool,
    /// Main camera.
    camera: Camera,
    /// Logical device.
    device: Arc<Device>,
    /// Vulkan instance (destroyed last).
    _instance: Arc<Instance>,
}

impl Renderer {
    /// Creates the renderer for the given window.
    ///
    /// Initializes the full Vulkan stack (instance, surface, device),
    /// the frame sequencer, the per-slot uniform buffers and descriptor
    /// sets, and the render systems.
    ///
    /// # Arguments
    ///
    /// * `window` - The window to render to (must have a non-zero extent)
    /// * `texture_path` - Optional texture to sample in the mesh shader;
    ///   falls back to a 1x1 white texture when absent or unloadable
    ///
    /// # Errors
    ///
    /// Returns an error if any Vulkan resource creation fails.
    pub fn new(window: &Window, texture_path: Option<&Path>) -> RendererResult<Self> {
        info!(
            "Initializing Vulkan renderer ({}x{})",
            window.width(),
            window.height()
        );

        // Validation layers in debug builds only
        let enable_validation = cfg!(debug_assertions);
        let instance = Arc::new(Instance::new(enable_validation)?);

        let surface = window
            .create_surface(instance.entry(), instance.handle())
            .map_err(|e| RendererError::Window(e.to_string()))?;

        let physical_device_info =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;

        let device = Device::new(&instance, &physical_device_info)?;

        let graphics_family = device
            .queue_families()
            .graphics_family
            .ok_or(RhiError::NoSuitableGpu)?;
        let command_pool = CommandPool::new(device.clone(), graphics_family)?;

        let sequencer = FrameSequencer::new(
            instance.clone(),
            device.clone(),
            surface,
            &command_pool,
            window.extent(),
        )?;

        // Global descriptor set: per-frame uniforms at binding 0, shared
        // texture at binding 1
        let bindings = [
            DescriptorBinding::uniform_buffer(
                0,
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
            ),
            DescriptorBinding::combined_image_sampler(1, vk::ShaderStageFlags::FRAGMENT),
        ];
        let global_set_layout = DescriptorSetLayout::new(device.clone(), &bindings)?;

        let pool_sizes = [
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(MAX_FRAMES_IN_FLIGHT as u32),
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(MAX_FRAMES_IN_FLIGHT as u32),
        ];
        let descriptor_pool =
            DescriptorPool::new(device.clone(), MAX_FRAMES_IN_FLIGHT as u32, &pool_sizes)?;

        let texture = Self::load_texture(&device, &command_pool, texture_path)?;

        // One uniform buffer + descriptor set per frame slot
        let mut frame_ubos = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        for _ in 0..MAX_FRAMES_IN_FLIGHT {
            frame_ubos.push(Buffer::new(
                device.clone(),
                BufferUsage::Uniform,
                GlobalUbo::SIZE as vk::DeviceSize,
            )?);
        }

        let layouts = [global_set_layout.handle(); MAX_FRAMES_IN_FLIGHT];
        let global_descriptor_sets = descriptor_pool.allocate(&layouts)?;

        for (set, ubo) in global_descriptor_sets.iter().zip(&frame_ubos) {
            let buffer_infos = [vk::DescriptorBufferInfo::default()
                .buffer(ubo.handle())
                .offset(0)
                .range(GlobalUbo::SIZE as vk::DeviceSize)];
            let image_infos = [texture.descriptor_info()];

            let writes = [
                vk::WriteDescriptorSet::default()
                    .dst_set(*set)
                    .dst_binding(0)
                    .dst_array_element(0)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(&buffer_infos),
                vk::WriteDescriptorSet::default()
                    .dst_set(*set)
                    .dst_binding(1)
                    .dst_array_element(0)
                    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .image_info(&image_infos),
            ];
            update_descriptor_sets(&device, &writes);
        }

        // Render systems build their pipelines against the swapchain's
        // render pass
        let shader_dir = Path::new(SHADER_DIR);
        let mesh_system = MeshRenderSystem::new(
            device.clone(),
            sequencer.render_pass(),
            global_set_layout.handle(),
            shader_dir,
        )?;
        let point_light_system = PointLightSystem::new(
            device.clone(),
            sequencer.render_pass(),
            global_set_layout.handle(),
            shader_dir,
        )?;

        let mut camera = Camera::new();
        camera.set_perspective(
            50.0_f32.to_radians(),
            sequencer.aspect_ratio(),
            0.1,
            100.0,
        );

        info!(
            "Renderer initialized: {} frames in flight",
            MAX_FRAMES_IN_FLIGHT
        );

        Ok(Self {
            sequencer,
            mesh_system,
            point_light_system,
            game_objects: GameObjectMap::new(),
            frame_ubos,
            global_descriptor_sets,
            _descriptor_pool: descriptor_pool,
            global_set_layout,
            _texture: texture,
            command_pool,
            camera,
            device,
            _instance: instance,
        })
    }

    /// Loads the optional scene texture, falling back to 1x1 white.
    fn load_texture(
        device: &Arc<Device>,
        pool: &CommandPool,
        path: Option<&Path>,
    ) -> RendererResult<Texture> {
        if let Some(path) = path {
            match ImageData::load(path) {
                Ok(image) => {
                    let texture = Texture::from_rgba8(
                        device.clone(),
                        pool,
                        image.width,
                        image.height,
                        &image.pixels,
                    )?;
                    return Ok(texture);
                }
                Err(e) => {
                    warn!(
                        "Failed to load texture '{}' ({}); using white fallback",
                        path.display(),
                        e
                    );
                }
            }
        }

        Ok(Texture::solid_color(
            device.clone(),
            pool,
            [255, 255, 255, 255],
        )?)
    }

    /// Loads an OBJ model and uploads it to the GPU.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or the GPU upload fails.
    pub fn load_model(&self, path: &Path) -> RendererResult<Arc<Model>> {
        let mesh = MeshData::load_obj(path)?;
        let model = Model::from_mesh_data(self.device.clone(), &self.command_pool, &mesh)?;
        Ok(Arc::new(model))
    }

    /// Renders one frame.
    ///
    /// Refreshes the camera's aspect ratio from the swapchain, opens a
    /// frame, updates the global uniforms and light animation, records both
    /// render systems, and ends the frame. A skipped tick (swapchain just
    /// recreated) is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error on any unrecoverable Vulkan failure; the caller is
    /// expected to terminate.
    pub fn render_frame(&mut self, frame_time: f32) -> RendererResult<()> {
        // Derived from the swapchain each frame so recreations are
        // picked up immediately
        self.camera.set_aspect(self.sequencer.aspect_ratio());

        let Some(command_buffer) = self.sequencer.begin_frame()? else {
            return Ok(());
        };

        let frame_index = self.sequencer.frame_index();

        // Update pass: camera matrices + light animation into this slot's
        // uniform buffer
        let mut ubo = GlobalUbo::from_camera(&self.camera);
        self.point_light_system
            .update(frame_time, &mut self.game_objects, &mut ubo);
        self.frame_ubos[frame_index].write_data(0, bytemuck::bytes_of(&ubo))?;

        // Record pass
        self.sequencer.begin_render_pass(command_buffer);
        {
            let frame = FrameContext {
                frame_index,
                frame_time,
                command_buffer,
                camera: &self.camera,
                global_descriptor_set: self.global_descriptor_sets[frame_index],
                game_objects: &self.game_objects,
            };

            self.mesh_system.render(&frame);
            self.point_light_system.render(&frame);
        }
        self.sequencer.end_render_pass(command_buffer);

        self.sequencer.end_frame()?;

        Ok(())
    }

    /// Notifies the renderer of a window resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.sequencer.notify_resize(width, height);
    }

    /// The scene's objects.
    pub fn game_objects(&self) -> &GameObjectMap {
        &self.game_objects
    }

    /// The scene's objects, mutably (for scene setup and per-tick updates).
    pub fn game_objects_mut(&mut self) -> &mut GameObjectMap {
        &mut self.game_objects
    }

    /// The main camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The main camera, mutably.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Current swapchain aspect ratio.
    pub fn aspect_ratio(&self) -> f32 {
        self.sequencer.aspect_ratio()
    }

    /// The global descriptor set layout (for building additional systems).
    pub fn global_set_layout(&self) -> vk::DescriptorSetLayout {
        self.global_set_layout.handle()
    }
}
