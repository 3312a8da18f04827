//! Error types for resource loading.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for resource loading operations.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// Failed to load an OBJ file.
    #[error("Failed to load OBJ file '{path}': {message}")]
    ObjLoad {
        /// Path to the file that failed to load.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// OBJ file contains no meshes.
    #[error("OBJ file '{0}' contains no meshes")]
    NoMeshes(PathBuf),

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image loading error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type alias for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;
