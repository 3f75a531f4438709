use serde::{Deserialize, Serialize};

use crate::shared::region::{BoundingBox, ImageDimensions};

use super::crop_mode::CropMode;

pub const DEFAULT_EXPAND_TOP: f64 = 0.25;
pub const DEFAULT_EXPAND_LEFT: f64 = 0.90;
pub const DEFAULT_EXPAND_RIGHT: f64 = 1.25;

/// Portrait-mode multipliers.
///
/// `top` and `left` scale the box origin itself (a scale-from-origin, not a
/// pad), so values below 1.0 pull that edge toward the image origin.
/// `right` scales the box width added to the original left edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionParams {
    pub top: f64,
    pub left: f64,
    pub right: f64,
}

impl Default for ExpansionParams {
    fn default() -> Self {
        Self {
            top: DEFAULT_EXPAND_TOP,
            left: DEFAULT_EXPAND_LEFT,
            right: DEFAULT_EXPAND_RIGHT,
        }
    }
}

/// Half-open pixel rectangle `[x0, x1) × [y0, y1)`, always non-empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRectangle {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl CropRectangle {
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

/// Turns a detection into the rectangle that gets cropped out of the source.
///
/// Portrait mode widens the box to the left and right and raises its top
/// edge; the bottom edge stays at the chin. Every fractional coordinate is
/// floored. The result is clamped to the image and then forced to be at
/// least one pixel wide and tall, which on a degenerate input may push
/// `x1`/`y1` one pixel past the image edge.
///
/// Inputs are assumed valid (positive box and image sizes); nothing here
/// fails.
pub fn derive_crop_rectangle(
    bbox: &BoundingBox,
    image: ImageDimensions,
    mode: CropMode,
    expansion: &ExpansionParams,
) -> CropRectangle {
    debug_assert!(bbox.width > 0 && bbox.height > 0, "empty bounding box");
    debug_assert!(image.width > 0 && image.height > 0, "empty image");

    let x = bbox.x as i64;
    let y = bbox.y as i64;
    let w = bbox.width as i64;
    let h = bbox.height as i64;

    let (mut x0, mut y0, mut x1, mut y1) = match mode {
        CropMode::Face => (x, y, x + w, y + h),
        CropMode::Portrait => (
            (bbox.x as f64 * expansion.left).floor() as i64,
            (bbox.y as f64 * expansion.top).floor() as i64,
            (bbox.x as f64 + bbox.width as f64 * expansion.right).floor() as i64,
            y + h,
        ),
    };

    x0 = x0.max(0);
    y0 = y0.max(0);
    x1 = x1.min(image.width as i64);
    y1 = y1.min(image.height as i64);

    if x1 - x0 < 1 {
        x1 = x0 + 1;
    }
    if y1 - y0 < 1 {
        y1 = y0 + 1;
    }

    CropRectangle {
        x0: x0 as u32,
        y0: y0 as u32,
        x1: x1 as u32,
        y1: y1 as u32,
    }
}
