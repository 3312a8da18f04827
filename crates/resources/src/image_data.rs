//! Image decoding for textures.

use std::path::Path;

use tracing::info;

use crate::error::ResourceResult;

/// Decoded RGBA8 image data.
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Tightly packed RGBA pixels (`width * height * 4` bytes).
    pub pixels: Vec<u8>,
}

impl ImageData {
    /// Loads and decodes an image file into RGBA8.
    ///
    /// Any format supported by the `image` crate works; the result is
    /// always converted to 8-bit RGBA for upload.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn load(path: &Path) -> ResourceResult<Self> {
        let image = image::open(path)?.to_rgba8();
        let (width, height) = image.dimensions();

        info!("Loaded image '{}': {}x{}", path.display(), width, height);

        Ok(Self {
            width,
            height,
            pixels: image.into_raw(),
        })
    }
}
