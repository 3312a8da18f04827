//! GPU mesh upload and drawing.

use std::sync::Arc;

use tracing::info;

use lantern_resources::MeshData;
use lantern_rhi::RhiResult;
use lantern_rhi::buffer::{Buffer, BufferUsage};
use lantern_rhi::command::CommandPool;
use lantern_rhi::device::Device;
use lantern_rhi::vertex::Vertex;
use lantern_rhi::vk;

/// A mesh uploaded to GPU memory.
///
/// Owns a device-local vertex buffer and, when the source data is indexed,
/// an index buffer. Both are filled through staging buffers at load time.
pub struct Model {
    device: Arc<Device>,
    vertex_buffer: Buffer,
    vertex_count: u32,
    index_buffer: Option<Buffer>,
    index_count: u32,
}

impl Model {
    /// Uploads mesh data to the GPU.
    ///
    /// # Errors
    ///
    /// Returns an error if buffer creation or the staging upload fails.
    pub fn from_mesh_data(
        device: Arc<Device>,
        pool: &CommandPool,
        data: &MeshData,
    ) -> RhiResult<Self> {
        debug_assert!(
            data.vertices.len() >= 3,
            "Vertex count must be at least 3"
        );

        let vertices: Vec<Vertex> = data
            .vertices
            .iter()
            .map(|v| Vertex::new(v.position, v.color, v.normal, v.uv))
            .collect();

        let vertex_buffer = Buffer::new_with_data(
            device.clone(),
            pool,
            BufferUsage::Vertex,
            bytemuck::cast_slice(&vertices),
        )?;

        let index_buffer = if data.indices.is_empty() {
            None
        } else {
            Some(Buffer::new_with_data(
                device.clone(),
                pool,
                BufferUsage::Index,
                bytemuck::cast_slice(&data.indices),
            )?)
        };

        info!(
            "Uploaded model: {} vertices, {} indices",
            vertices.len(),
            data.indices.len()
        );

        Ok(Self {
            device,
            vertex_buffer,
            vertex_count: vertices.len() as u32,
            index_buffer,
            index_count: data.indices.len() as u32,
        })
    }

    /// Binds the vertex (and index) buffer on the command buffer.
    pub fn bind(&self, command_buffer: vk::CommandBuffer) {
        let buffers = [self.vertex_buffer.handle()];
        let offsets = [0];

        unsafe {
            self.device
                .handle()
                .cmd_bind_vertex_buffers(command_buffer, 0, &buffers, &offsets);

            if let Some(index_buffer) = &self.index_buffer {
                self.device.handle().cmd_bind_index_buffer(
                    command_buffer,
                    index_buffer.handle(),
                    0,
                    vk::IndexType::UINT32,
                );
            }
        }
    }

    /// Issues the draw call for the bound mesh.
    pub fn draw(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            if self.index_buffer.is_some() {
                self.device
                    .handle()
                    .cmd_draw_indexed(command_buffer, self.index_count, 1, 0, 0, 0);
            } else {
                self.device
                    .handle()
                    .cmd_draw(command_buffer, self.vertex_count, 1, 0, 0);
            }
        }
    }

    /// Number of vertices in the vertex buffer.
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Number of indices, zero for non-indexed meshes.
    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}
