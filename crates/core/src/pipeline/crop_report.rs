use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cropping::domain::crop_mode::CropMode;
use crate::cropping::domain::region_deriver::CropRectangle;
use crate::shared::region::BoundingBox;

/// One written crop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropRecord {
    pub bbox: BoundingBox,
    pub rect: CropRectangle,
    pub output_path: PathBuf,
    pub mode: CropMode,
    pub target_size: u32,
    pub pad_square: bool,
}

/// Outcome for a single input file. `error` is set when the file could not
/// be processed; crops written before the failure are still listed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    pub crops: Vec<CropRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn failed(source: &Path, error: impl Into<String>) -> Self {
        Self {
            source: source.to_path_buf(),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Results of a batch, in input order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CropReport {
    pub files: Vec<FileReport>,
}

impl CropReport {
    pub fn new(files: Vec<FileReport>) -> Self {
        Self { files }
    }

    pub fn total_faces(&self) -> usize {
        self.files.iter().map(|f| f.crops.len()).sum()
    }

    pub fn failed_files(&self) -> Vec<&FileReport> {
        self.files.iter().filter(|f| !f.is_ok()).collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "Processed {} file(s). Found {} face(s).",
            self.files.len(),
            self.total_faces()
        )
    }

    /// Writes the report as pretty-printed JSON.
    pub fn write_manifest(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        serde_json::to_writer_pretty(&mut file, self)?;
        file.write_all(b"\n")?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: usize) -> CropRecord {
        CropRecord {
            bbox: BoundingBox::new(10, 10, 20, 20),
            rect: CropRectangle {
                x0: 9,
                y0: 2,
                x1: 35,
                y1: 30,
            },
            output_path: PathBuf::from(format!("crops/a__portrait__{index}_512.png")),
            mode: CropMode::Portrait,
            target_size: 512,
            pad_square: true,
        }
    }

    fn sample_report() -> CropReport {
        CropReport::new(vec![
            FileReport {
                source: PathBuf::from("a.png"),
                width: 100,
                height: 80,
                crops: vec![record(1), record(2)],
                error: None,
            },
            FileReport::failed(Path::new("b.png"), "decode failed"),
            FileReport {
                source: PathBuf::from("c.png"),
                width: 40,
                height: 40,
                crops: vec![],
                error: None,
            },
        ])
    }

    #[test]
    fn test_counts_and_summary() {
        let report = sample_report();
        assert_eq!(report.total_faces(), 2);
        assert_eq!(report.summary(), "Processed 3 file(s). Found 2 face(s).");

        let failed = report.failed_files();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].source, PathBuf::from("b.png"));
    }

    #[test]
    fn test_empty_report_summary() {
        assert_eq!(
            CropReport::default().summary(),
            "Processed 0 file(s). Found 0 face(s)."
        );
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(sample_report()).unwrap();
        let first = &json["files"][0];
        assert_eq!(first["crops"][0]["mode"], "portrait");
        assert_eq!(first["crops"][0]["rect"]["x1"], 35);
        assert!(first.get("error").is_none());
        assert_eq!(json["files"][1]["error"], "decode failed");
    }

    #[test]
    fn test_write_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("manifest.json");
        let report = sample_report();
        report.write_manifest(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: CropReport = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, report);
    }
}
