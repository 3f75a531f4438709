use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cropping::domain::crop_mode::CropMode;
use crate::cropping::domain::region_deriver::ExpansionParams;
use crate::detection::domain::detection_params::DetectionParams;

/// Edge length of every written crop.
pub const DEFAULT_TARGET_SIZE: u32 = 512;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Everything that controls how a batch is cropped.
///
/// Passed by value into the use case; there is no process-wide copy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropSettings {
    pub mode: CropMode,
    pub expansion: ExpansionParams,
    pub pad_square: bool,
    pub target_size: u32,
    pub detection: DetectionParams,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self {
            mode: CropMode::default(),
            expansion: ExpansionParams::default(),
            pad_square: true,
            target_size: DEFAULT_TARGET_SIZE,
            detection: DetectionParams::default(),
        }
    }
}

impl CropSettings {
    /// Reads settings from a JSON file. Fields absent from the file keep
    /// their defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&text).map_err(|source| SettingsError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let multipliers = [
            ("expansion.top", self.expansion.top),
            ("expansion.left", self.expansion.left),
            ("expansion.right", self.expansion.right),
        ];
        for (name, value) in multipliers {
            if !value.is_finite() || value <= 0.0 {
                return Err(SettingsError::Invalid(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if self.target_size == 0 {
            return Err(SettingsError::Invalid(
                "target_size must be at least 1".into(),
            ));
        }
        if self.detection.min_size == 0 {
            return Err(SettingsError::Invalid(
                "detection.min_size must be at least 1".into(),
            ));
        }
        if !self.detection.scale_factor.is_finite() || self.detection.scale_factor <= 1.0 {
            return Err(SettingsError::Invalid(format!(
                "detection.scale_factor must be greater than 1.0, got {}",
                self.detection.scale_factor
            )));
        }
        Ok(())
    }
}
