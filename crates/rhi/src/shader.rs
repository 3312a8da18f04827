//! Shader module management.
//!
//! This module handles loading precompiled SPIR-V shaders and wrapping them
//! in VkShaderModule objects for pipeline creation.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use lantern_rhi::device::Device;
//! use lantern_rhi::shader::{Shader, ShaderStage};
//!
//! # fn example(device: Arc<Device>) -> Result<(), lantern_rhi::RhiError> {
//! let vertex = Shader::from_spirv_file(
//!     device,
//!     Path::new("shaders/spirv/mesh.vert.spv"),
//!     ShaderStage::Vertex,
//! )?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Shader pipeline stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex shader stage
    Vertex,
    /// Fragment shader stage
    Fragment,
}

impl ShaderStage {
    /// Converts to Vulkan shader stage flags.
    pub fn to_vk_stage(self) -> vk::ShaderStageFlags {
        match self {
            ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
            ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
        }
    }

    /// Returns a human-readable name for the stage.
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

/// Compiled shader module.
///
/// Wraps a VkShaderModule created from SPIR-V bytecode. The entry point is
/// always `main`, matching the GLSL sources under `shaders/`.
pub struct Shader {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan shader module handle.
    module: vk::ShaderModule,
    /// Pipeline stage this shader belongs to.
    stage: ShaderStage,
}

impl Shader {
    /// Loads a SPIR-V shader from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the bytecode is not
    /// valid SPIR-V, or module creation fails.
    pub fn from_spirv_file(
        device: Arc<Device>,
        path: &Path,
        stage: ShaderStage,
    ) -> RhiResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            RhiError::ShaderError(format!("Failed to read shader '{}': {}", path.display(), e))
        })?;

        let shader = Self::from_spirv_bytes(device, &bytes, stage)?;

        debug!("Loaded {} shader from '{}'", stage.name(), path.display());

        Ok(shader)
    }

    /// Creates a shader module from SPIR-V bytecode.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytecode is not valid SPIR-V (wrong size or
    /// alignment) or module creation fails.
    pub fn from_spirv_bytes(
        device: Arc<Device>,
        bytes: &[u8],
        stage: ShaderStage,
    ) -> RhiResult<Self> {
        let mut cursor = std::io::Cursor::new(bytes);
        let code = ash::util::read_spv(&mut cursor)
            .map_err(|e| RhiError::ShaderError(format!("Invalid SPIR-V: {}", e)))?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);

        let module = unsafe { device.handle().create_shader_module(&create_info, None)? };

        Ok(Self {
            device,
            module,
            stage,
        })
    }

    /// Returns the Vulkan shader module handle.
    #[inline]
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    /// Returns the pipeline stage this shader belongs to.
    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Builds the pipeline stage create info for this shader.
    pub fn stage_create_info(&self) -> vk::PipelineShaderStageCreateInfo<'_> {
        vk::PipelineShaderStageCreateInfo::default()
            .stage(self.stage.to_vk_stage())
            .module(self.module)
            .name(c"main")
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_shader_module(self.module, None);
        }
        debug!("Destroyed {} shader module", self.stage.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_stage_to_vk() {
        assert_eq!(
            ShaderStage::Vertex.to_vk_stage(),
            vk::ShaderStageFlags::VERTEX
        );
        assert_eq!(
            ShaderStage::Fragment.to_vk_stage(),
            vk::ShaderStageFlags::FRAGMENT
        );
    }

    #[test]
    fn test_shader_stage_name() {
        assert_eq!(ShaderStage::Vertex.name(), "vertex");
        assert_eq!(ShaderStage::Fragment.name(), "fragment");
    }
}
