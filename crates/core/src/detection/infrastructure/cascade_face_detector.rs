//! Multi-scale LBP cascade detector.
//!
//! Equalises the luma image once, then for each pyramid level shrinks it so
//! the cascade's fixed window covers a larger area of the source, slides
//! the window, and keeps positions that pass every stage. Raw hits are
//! clustered by [`group_rectangles`].
use std::path::Path;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::GrayImage;

use crate::detection::domain::detection_params::DetectionParams;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::rect_grouper::{group_rectangles, GROUP_EPS};
use crate::shared::frame::Frame;
use crate::shared::region::BoundingBox;

use super::lbp_cascade::{LbpCascade, LbpFeature};
use super::preprocess::{equalize_histogram, to_gray, IntegralImage};

/// Above this scale the window is scanned at every pixel, below it at every
/// other pixel.
const DENSE_SCAN_FACTOR: f64 = 2.0;

pub struct CascadeFaceDetector {
    cascade: Arc<LbpCascade>,
    params: DetectionParams,
}

impl CascadeFaceDetector {
    pub fn new(
        cascade: Arc<LbpCascade>,
        params: DetectionParams,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        if params.scale_factor.is_nan() || params.scale_factor <= 1.0 {
            return Err(format!(
                "scale factor must be greater than 1.0, got {}",
                params.scale_factor
            )
            .into());
        }
        Ok(Self { cascade, params })
    }

    pub fn from_file(
        path: &Path,
        params: DetectionParams,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let cascade = LbpCascade::from_file(path)?;
        Self::new(Arc::new(cascade), params)
    }

    /// Raw (ungrouped) hits in source coordinates.
    pub fn scan(&self, gray: &GrayImage) -> Vec<BoundingBox> {
        let (img_w, img_h) = gray.dimensions();
        let base_w = self.cascade.window_width();
        let base_h = self.cascade.window_height();
        let mut hits = Vec::new();

        let mut factor = 1.0f64;
        loop {
            let win_w = (base_w as f64 * factor).round() as u32;
            let win_h = (base_h as f64 * factor).round() as u32;
            let scaled_w = (img_w as f64 / factor).round() as u32;
            let scaled_h = (img_h as f64 / factor).round() as u32;
            let level_factor = factor;
            factor *= self.params.scale_factor;

            if scaled_w < base_w || scaled_h < base_h || win_w > img_w || win_h > img_h {
                break;
            }
            if win_w < self.params.min_size || win_h < self.params.min_size {
                continue;
            }

            let scaled = if (scaled_w, scaled_h) == (img_w, img_h) {
                gray.clone()
            } else {
                imageops::resize(gray, scaled_w, scaled_h, FilterType::Triangle)
            };
            let integral = IntegralImage::new(&scaled);
            let step = if level_factor > DENSE_SCAN_FACTOR { 1 } else { 2 };

            let before = hits.len();
            for y in (0..=scaled_h - base_h).step_by(step) {
                for x in (0..=scaled_w - base_w).step_by(step) {
                    if self.passes(&integral, x as usize, y as usize) {
                        hits.push(BoundingBox::new(
                            (x as f64 * level_factor).round() as u32,
                            (y as f64 * level_factor).round() as u32,
                            win_w,
                            win_h,
                        ));
                    }
                }
            }
            log::debug!(
                "scale {level_factor:.3}: window {win_w}x{win_h}, {} hits",
                hits.len() - before
            );
        }
        hits
    }

    /// Runs every stage at window origin `(x, y)`; rejects at the first
    /// stage whose score falls below its threshold.
    fn passes(&self, integral: &IntegralImage, x: usize, y: usize) -> bool {
        let features = self.cascade.features();
        self.cascade.stages().iter().all(|stage| {
            let score: f32 = stage
                .classifiers
                .iter()
                .map(|c| c.evaluate(|fi| lbp_code(integral, &features[fi], x, y)))
                .sum();
            score >= stage.threshold
        })
    }
}

impl FaceDetector for CascadeFaceDetector {
    fn detect(&self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        let mut gray = to_gray(frame);
        equalize_histogram(&mut gray);

        let raw = self.scan(&gray);
        let faces = group_rectangles(&raw, self.params.min_neighbors, GROUP_EPS);
        log::debug!("{} raw hits grouped into {} faces", raw.len(), faces.len());
        Ok(faces)
    }
}

/// 8-bit local binary pattern of a feature's 3×3 block grid.
///
/// Each neighbour block whose sum is at least the centre block's sets one
/// bit, clockwise from the top-left block (bit 7) to the middle-left block
/// (bit 0).
pub fn lbp_code(integral: &IntegralImage, f: &LbpFeature, wx: usize, wy: usize) -> u8 {
    let (bw, bh) = (f.width as usize, f.height as usize);
    let ox = wx + f.x as usize;
    let oy = wy + f.y as usize;
    let block = |col: usize, row: usize| integral.block_sum(ox + col * bw, oy + row * bh, bw, bh);

    let center = block(1, 1);
    const NEIGHBOURS: [(usize, usize, u8); 8] = [
        (0, 0, 128),
        (1, 0, 64),
        (2, 0, 32),
        (2, 1, 16),
        (2, 2, 8),
        (1, 2, 4),
        (0, 2, 2),
        (0, 1, 1),
    ];
    NEIGHBOURS
        .iter()
        .filter(|(col, row, _)| block(*col, *row) >= center)
        .fold(0u8, |code, (_, _, bit)| code | bit)
}
