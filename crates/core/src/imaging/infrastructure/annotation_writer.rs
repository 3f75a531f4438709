//! Debug overlays: the source image with detections and crop regions drawn on.

use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::cropping::domain::region_deriver::CropRectangle;
use crate::shared::frame::Frame;
use crate::shared::region::BoundingBox;

const DETECTION_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const CROP_COLOR: Rgba<u8> = Rgba([0, 200, 0, 255]);

/// Draws each detection (red) and its derived crop rectangle (green) onto
/// a copy of the frame and saves it as `<output_dir>/<stem>__annotated.png`.
pub struct AnnotationWriter {
    output_dir: PathBuf,
}

impl AnnotationWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn write(
        &self,
        stem: &str,
        frame: &Frame,
        regions: &[(BoundingBox, CropRectangle)],
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let mut image = RgbaImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Failed to create image from frame data")?;

        for (bbox, crop) in regions {
            draw_hollow_rect_mut(
                &mut image,
                Rect::at(crop.x0 as i32, crop.y0 as i32).of_size(crop.width(), crop.height()),
                CROP_COLOR,
            );
            draw_hollow_rect_mut(
                &mut image,
                Rect::at(bbox.x as i32, bbox.y as i32).of_size(bbox.width, bbox.height),
                DETECTION_COLOR,
            );
        }

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("{stem}__annotated.png"));
        image.save(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draws_detection_and_crop_outlines() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AnnotationWriter::new(dir.path().join("annotated"));
        let frame = Frame::blank(40, 30);
        let bbox = BoundingBox::new(10, 10, 10, 10);
        let crop = CropRectangle {
            x0: 5,
            y0: 2,
            x1: 30,
            y1: 20,
        };

        let path = writer.write("scene", &frame, &[(bbox, crop)]).unwrap();
        assert_eq!(path, dir.path().join("annotated").join("scene__annotated.png"));

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(10, 10).0, DETECTION_COLOR.0);
        assert_eq!(img.get_pixel(5, 2).0, CROP_COLOR.0);
        assert_eq!(img.get_pixel(15, 15).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_no_regions_writes_plain_copy() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AnnotationWriter::new(dir.path());
        let frame = Frame::new([1, 2, 3, 255].repeat(4), 2, 2);
        let path = writer.write("plain", &frame, &[]).unwrap();
        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(1, 1).0, [1, 2, 3, 255]);
    }
}
