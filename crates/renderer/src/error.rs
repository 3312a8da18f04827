//! Renderer-level error type.

use thiserror::Error;

use lantern_resources::ResourceError;
use lantern_rhi::RhiError;

/// Error type covering renderer initialization and per-frame work.
#[derive(Error, Debug)]
pub enum RendererError {
    /// Vulkan-level failure (unrecoverable; the application terminates)
    #[error(transparent)]
    Rhi(#[from] RhiError),

    /// Asset loading failure
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Window/surface glue failure
    #[error("Window error: {0}")]
    Window(String),
}

/// Result type alias for renderer operations.
pub type RendererResult<T> = Result<T, RendererError>;
