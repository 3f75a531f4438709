//! Image preparation for cascade evaluation: luma conversion, histogram
//! equalisation, and the summed-area table used for block sums.

use image::GrayImage;

use crate::shared::frame::Frame;

/// BT.601 luma weights in 14-bit fixed point (R, G, B).
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// Converts an RGBA frame to 8-bit luma, ignoring alpha.
pub fn to_gray(frame: &Frame) -> GrayImage {
    let luma: Vec<u8> = frame
        .data()
        .chunks_exact(4)
        .map(|px| {
            let y = px[0] as u32 * LUMA_R
                + px[1] as u32 * LUMA_G
                + px[2] as u32 * LUMA_B
                + (1 << (LUMA_SHIFT - 1));
            (y >> LUMA_SHIFT) as u8
        })
        .collect();
    GrayImage::from_raw(frame.width(), frame.height(), luma)
        .expect("luma buffer has one byte per pixel")
}

/// Spreads the histogram over the full 0..=255 range in place.
///
/// The darkest occupied level maps to 0. A single-level image is left as is.
pub fn equalize_histogram(img: &mut GrayImage) {
    let mut hist = [0u32; 256];
    for p in img.as_raw() {
        hist[*p as usize] += 1;
    }
    let total: u32 = hist.iter().sum();
    let Some(first) = hist.iter().position(|&n| n > 0) else {
        return;
    };
    if hist[first] == total {
        return;
    }

    let scale = 255.0f32 / (total - hist[first]) as f32;
    let mut lut = [0u8; 256];
    let mut sum = 0u32;
    for level in (first + 1)..256 {
        sum += hist[level];
        lut[level] = (sum as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }

    for p in img.iter_mut() {
        *p = lut[*p as usize];
    }
}

/// Summed-area table with a zero first row and column:
/// `at(x, y)` is the sum of all pixels with column `< x` and row `< y`.
///
/// Sums wrap on overflow; differences over small blocks stay exact.
pub struct IntegralImage {
    data: Vec<u32>,
    stride: usize,
}

impl IntegralImage {
    pub fn new(img: &GrayImage) -> Self {
        let (w, h) = (img.width() as usize, img.height() as usize);
        let stride = w + 1;
        let mut data = vec![0u32; stride * (h + 1)];
        let src = img.as_raw();

        for y in 0..h {
            let mut row_sum = 0u32;
            for x in 0..w {
                row_sum = row_sum.wrapping_add(src[y * w + x] as u32);
                let idx = (y + 1) * stride + (x + 1);
                data[idx] = data[idx - stride].wrapping_add(row_sum);
            }
        }
        Self { data, stride }
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> u32 {
        self.data[y * self.stride + x]
    }

    /// Sum of the `w × h` block whose top-left pixel is `(x, y)`.
    #[inline]
    pub fn block_sum(&self, x: usize, y: usize, w: usize, h: usize) -> u32 {
        self.at(x + w, y + h)
            .wrapping_sub(self.at(x + w, y))
            .wrapping_sub(self.at(x, y + h))
            .wrapping_add(self.at(x, y))
    }
}
