use serde::{Deserialize, Serialize};

/// Smallest face (in source pixels) worth reporting. Large enough to keep
/// the cascade from firing on background texture.
pub const DEFAULT_MIN_SIZE: u32 = 250;

/// Window growth per pyramid level.
pub const DEFAULT_SCALE_FACTOR: f64 = 1.1;

/// Overlapping raw hits a cluster needs before it counts as a face.
pub const DEFAULT_MIN_NEIGHBORS: u32 = 5;

/// Multi-scale scan parameters for cascade detection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    pub min_size: u32,
    pub scale_factor: f64,
    pub min_neighbors: u32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            scale_factor: DEFAULT_SCALE_FACTOR,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
        }
    }
}
