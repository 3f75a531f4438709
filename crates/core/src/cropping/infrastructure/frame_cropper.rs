use image::imageops::{self, FilterType};
use image::RgbaImage;
use ndarray::s;

use crate::cropping::domain::region_deriver::CropRectangle;
use crate::cropping::domain::square_placement::derive_square_placement;
use crate::shared::frame::Frame;

/// Copies the pixels under `rect` into a new frame of exactly
/// `rect.width() × rect.height()`.
///
/// Any part of the rectangle outside the source (only possible after the
/// one-pixel degeneracy guard) stays transparent black.
pub fn crop_frame(frame: &Frame, rect: &CropRectangle) -> Frame {
    let mut out = Frame::blank(rect.width(), rect.height());

    let x_end = rect.x1.min(frame.width());
    let y_end = rect.y1.min(frame.height());
    if rect.x0 >= x_end || rect.y0 >= y_end {
        return out;
    }

    let (x0, y0) = (rect.x0 as usize, rect.y0 as usize);
    let (x1, y1) = (x_end as usize, y_end as usize);

    let src = frame.as_ndarray();
    out.as_ndarray_mut()
        .slice_mut(s![..y1 - y0, ..x1 - x0, ..])
        .assign(&src.slice(s![y0..y1, x0..x1, ..]));
    out
}

/// Centers the frame on a zero-filled square canvas.
pub fn pad_to_square(frame: &Frame) -> Frame {
    let placement = derive_square_placement(frame.width(), frame.height());
    let mut canvas = Frame::blank(placement.side, placement.side);

    let ox = placement.offset_x as usize;
    let oy = placement.offset_y as usize;
    let w = frame.width() as usize;
    let h = frame.height() as usize;

    canvas
        .as_ndarray_mut()
        .slice_mut(s![oy..oy + h, ox..ox + w, ..])
        .assign(&frame.as_ndarray());
    canvas
}

/// Resamples the frame to `width × height` with a triangle (bilinear) filter.
pub fn resize_frame(
    frame: &Frame,
    width: u32,
    height: u32,
) -> Result<Frame, Box<dyn std::error::Error>> {
    if frame.width() == width && frame.height() == height {
        return Ok(frame.clone());
    }

    let img = RgbaImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .ok_or("Failed to create image from frame data")?;
    let resized = imageops::resize(&img, width, height, FilterType::Triangle);
    Ok(Frame::new(resized.into_raw(), width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Frame where every pixel encodes its own coordinates: `[x, y, 7, 255]`.
    fn coordinate_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[x as u8, y as u8, 7, 255]);
            }
        }
        Frame::new(data, width, height)
    }

    fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 4] {
        let a = frame.as_ndarray();
        [a[[y, x, 0]], a[[y, x, 1]], a[[y, x, 2]], a[[y, x, 3]]]
    }

    #[test]
    fn test_crop_extracts_exact_region() {
        let frame = coordinate_frame(20, 10);
        let rect = CropRectangle {
            x0: 3,
            y0: 2,
            x1: 9,
            y1: 7,
        };
        let crop = crop_frame(&frame, &rect);
        assert_eq!(crop.width(), 6);
        assert_eq!(crop.height(), 5);
        assert_eq!(pixel(&crop, 0, 0), [3, 2, 7, 255]);
        assert_eq!(pixel(&crop, 5, 4), [8, 6, 7, 255]);
    }

    #[test]
    fn test_crop_beyond_edge_is_transparent() {
        let frame = coordinate_frame(4, 4);
        let rect = CropRectangle {
            x0: 3,
            y0: 0,
            x1: 5,
            y1: 1,
        };
        let crop = crop_frame(&frame, &rect);
        assert_eq!(crop.width(), 2);
        assert_eq!(pixel(&crop, 0, 0), [3, 0, 7, 255]);
        assert_eq!(pixel(&crop, 1, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_crop_fully_outside_is_blank() {
        let frame = coordinate_frame(4, 4);
        let rect = CropRectangle {
            x0: 4,
            y0: 0,
            x1: 5,
            y1: 1,
        };
        let crop = crop_frame(&frame, &rect);
        assert_eq!(crop.data(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_pad_landscape_centers_vertically() {
        let frame = coordinate_frame(6, 2);
        let padded = pad_to_square(&frame);
        assert_eq!((padded.width(), padded.height()), (6, 6));
        // offset_y = (6 - 2) / 2 = 2
        assert_eq!(pixel(&padded, 0, 0), [0, 0, 0, 0]);
        assert_eq!(pixel(&padded, 0, 2), [0, 0, 7, 255]);
        assert_eq!(pixel(&padded, 5, 3), [5, 1, 7, 255]);
        assert_eq!(pixel(&padded, 5, 4), [0, 0, 0, 0]);
    }

    #[test]
    fn test_pad_portrait_centers_horizontally() {
        let frame = coordinate_frame(3, 8);
        let padded = pad_to_square(&frame);
        assert_eq!((padded.width(), padded.height()), (8, 8));
        // offset_x = (8 - 3) / 2 = 2
        assert_eq!(pixel(&padded, 1, 0), [0, 0, 0, 0]);
        assert_eq!(pixel(&padded, 2, 0), [0, 0, 7, 255]);
        assert_eq!(pixel(&padded, 4, 7), [2, 7, 7, 255]);
        assert_eq!(pixel(&padded, 5, 7), [0, 0, 0, 0]);
    }

    #[test]
    fn test_pad_square_is_unchanged() {
        let frame = coordinate_frame(5, 5);
        assert_eq!(pad_to_square(&frame), frame);
    }

    #[test]
    fn test_resize_to_target() {
        let frame = coordinate_frame(40, 20);
        let resized = resize_frame(&frame, 16, 16).unwrap();
        assert_eq!((resized.width(), resized.height()), (16, 16));
        assert_eq!(resized.data().len(), 16 * 16 * 4);
    }

    #[test]
    fn test_resize_uniform_color_is_preserved() {
        let frame = Frame::new([10u8, 20, 30, 255].repeat(100), 10, 10);
        let resized = resize_frame(&frame, 3, 3).unwrap();
        assert_eq!(pixel(&resized, 1, 1), [10, 20, 30, 255]);
    }
}
