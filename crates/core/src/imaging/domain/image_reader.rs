use std::path::Path;

use crate::shared::frame::Frame;

/// Decodes an image file into an RGBA frame.
pub trait ImageReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>>;
}
