use crate::shared::frame::Frame;
use crate::shared::region::BoundingBox;

/// Domain interface for face detection.
///
/// Detection is stateless per image, so one detector is shared by every
/// worker thread (hence `&self` and `Sync`).
pub trait FaceDetector: Send + Sync {
    /// Returns one box per detected face, in source-image pixel coordinates.
    fn detect(&self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>>;
}
