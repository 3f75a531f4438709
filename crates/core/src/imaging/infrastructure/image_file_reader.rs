use std::path::Path;

use crate::imaging::domain::image_reader::ImageReader;
use crate::shared::frame::Frame;

/// Decodes any format the `image` crate supports and normalises it to RGBA.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        let img = image::ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| format!("Failed to decode {}: {e}", path.display()))?
            .into_rgba8();

        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(format!("Image has zero dimensions: {}", path.display()).into());
        }
        Ok(Frame::new(img.into_raw(), width, height))
    }
}
