use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};

use crate::imaging::domain::image_writer::ImageWriter;
use crate::shared::frame::Frame;

/// Encodes frames as 8-bit RGBA PNG regardless of the path's extension,
/// so transparent padding survives.
#[derive(Debug, Default)]
pub struct PngFileWriter;

impl PngFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl ImageWriter for PngFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let out = BufWriter::new(File::create(path)?);
        PngEncoder::new_with_quality(out, CompressionType::Default, FilterType::Adaptive)
            .write_image(
                frame.data(),
                frame.width(),
                frame.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| format!("Failed to encode {}: {e}", path.display()))?;
        Ok(())
    }
}
