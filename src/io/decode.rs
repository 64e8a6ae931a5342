use image::{GrayImage, ImageReader};
use std::path::Path;

use crate::error::{DedupError, Result};

/// Loads a file as an 8-bit single-channel image.
pub trait GrayImageSource {
    fn load_gray(&self, path: &Path) -> Result<GrayImage>;
}

/// Decodes with the `image` crate and reduces to luma.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateSource;

impl GrayImageSource for ImageCrateSource {
    fn load_gray(&self, path: &Path) -> Result<GrayImage> {
        let decode_err = |reason: String| DedupError::Decode {
            path: path.to_path_buf(),
            reason,
        };

        let img = ImageReader::open(path)
            .map_err(|e| decode_err(format!("failed to open: {e}")))?
            .with_guessed_format()
            .map_err(|e| decode_err(format!("failed to read header: {e}")))?
            .decode()
            .map_err(|e| decode_err(e.to_string()))?;

        Ok(img.to_luma8())
    }
}
