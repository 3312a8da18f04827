//! Forward-shaded mesh rendering.

use std::path::Path;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use tracing::info;

use lantern_rhi::RhiResult;
use lantern_rhi::device::Device;
use lantern_rhi::pipeline::{GraphicsPipelineBuilder, Pipeline, PipelineLayout};
use lantern_rhi::shader::{Shader, ShaderStage};
use lantern_rhi::vertex::Vertex;
use lantern_rhi::vk;

use crate::context::FrameContext;

/// Per-object push constant data for the mesh pipeline.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct MeshPushConstants {
    /// Model-to-world matrix.
    model_matrix: Mat4,
    /// Inverse-transpose of the model matrix, for normals.
    normal_matrix: Mat4,
}

/// Renders every object carrying a mesh, lit by the global light array.
///
/// Owns the mesh pipeline; per-object transforms travel as push constants,
/// everything else comes from the global descriptor set bound at set 0.
pub struct MeshRenderSystem {
    device: Arc<Device>,
    pipeline_layout: PipelineLayout,
    pipeline: Pipeline,
}

impl MeshRenderSystem {
    /// Builds the mesh pipeline against the given render pass.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `render_pass` - The swapchain render pass
    /// * `global_set_layout` - Layout of the global descriptor set (set 0)
    /// * `shader_dir` - Directory holding the compiled SPIR-V shaders
    ///
    /// # Errors
    ///
    /// Returns an error if shader loading or pipeline creation fails.
    pub fn new(
        device: Arc<Device>,
        render_pass: vk::RenderPass,
        global_set_layout: vk::DescriptorSetLayout,
        shader_dir: &Path,
    ) -> RhiResult<Self> {
        let push_constant_range = vk::PushConstantRange::default()
            .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)
            .offset(0)
            .size(std::mem::size_of::<MeshPushConstants>() as u32);

        let pipeline_layout = PipelineLayout::new(
            device.clone(),
            &[global_set_layout],
            &[push_constant_range],
        )?;

        let vertex_shader = Shader::from_spirv_file(
            device.clone(),
            &shader_dir.join("mesh.vert.spv"),
            ShaderStage::Vertex,
        )?;
        let fragment_shader = Shader::from_spirv_file(
            device.clone(),
            &shader_dir.join("mesh.frag.spv"),
            ShaderStage::Fragment,
        )?;

        let pipeline = GraphicsPipelineBuilder::new()
            .vertex_shader(&vertex_shader)
            .fragment_shader(&fragment_shader)
            .vertex_binding(Vertex::binding_description())
            .vertex_attributes(&Vertex::attribute_descriptions())
            .render_pass(render_pass)
            .build(device.clone(), &pipeline_layout)?;

        info!("Mesh render system created");

        Ok(Self {
            device,
            pipeline_layout,
            pipeline,
        })
    }

    /// Records draw commands for every object with a model.
    ///
    /// Must be called between the sequencer's render-pass begin and end.
    pub fn render(&self, frame: &FrameContext) {
        self.pipeline.bind(frame.command_buffer);

        let descriptor_sets = [frame.global_descriptor_set];
        unsafe {
            self.device.handle().cmd_bind_descriptor_sets(
                frame.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline_layout.handle(),
                0,
                &descriptor_sets,
                &[],
            );
        }

        for object in frame.game_objects.iter() {
            let Some(model) = &object.model else {
                continue;
            };

            let push = MeshPushConstants {
                model_matrix: object.transform.world_matrix(),
                normal_matrix: object.transform.normal_matrix(),
            };

            unsafe {
                self.device.handle().cmd_push_constants(
                    frame.command_buffer,
                    self.pipeline_layout.handle(),
                    vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                    0,
                    bytemuck::bytes_of(&push),
                );
            }

            model.bind(frame.command_buffer);
            model.draw(frame.command_buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_constants_fit_the_guaranteed_limit() {
        // Vulkan guarantees at least 128 bytes of push constants
        assert!(std::mem::size_of::<MeshPushConstants>() <= 128);
    }
}
