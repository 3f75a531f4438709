use std::path::Path;

use crate::shared::frame::Frame;

/// Persists a single frame.
pub trait ImageWriter: Send + Sync {
    /// Writes `frame` to `path`, creating missing parent directories.
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
