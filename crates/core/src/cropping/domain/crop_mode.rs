use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How much of the surroundings of a detected face ends up in the crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropMode {
    /// Exactly the detected box.
    Face,
    /// The box expanded upward and sideways to take in hair and shoulders.
    #[default]
    Portrait,
}

impl CropMode {
    pub const ALL: &[CropMode] = &[CropMode::Face, CropMode::Portrait];

    pub fn as_str(&self) -> &'static str {
        match self {
            CropMode::Face => "face",
            CropMode::Portrait => "portrait",
        }
    }
}

impl fmt::Display for CropMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CropMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "face" => Ok(CropMode::Face),
            "portrait" => Ok(CropMode::Portrait),
            other => Err(format!(
                "Crop mode must be 'face' or 'portrait', got '{other}'"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("face", CropMode::Face)]
    #[case("portrait", CropMode::Portrait)]
    #[case("Portrait", CropMode::Portrait)]
    fn test_parse(#[case] input: &str, #[case] expected: CropMode) {
        assert_eq!(input.parse::<CropMode>().unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "bust".parse::<CropMode>().unwrap_err();
        assert!(err.contains("bust"));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for mode in CropMode::ALL {
            assert_eq!(mode.to_string().parse::<CropMode>().unwrap(), *mode);
        }
    }

    #[test]
    fn test_default_is_portrait() {
        assert_eq!(CropMode::default(), CropMode::Portrait);
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&CropMode::Face).unwrap(), "\"face\"");
        let mode: CropMode = serde_json::from_str("\"portrait\"").unwrap();
        assert_eq!(mode, CropMode::Portrait);
    }
}
