use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::cropping::domain::region_deriver::derive_crop_rectangle;
use crate::cropping::infrastructure::frame_cropper::{crop_frame, pad_to_square, resize_frame};
use crate::detection::domain::face_detector::FaceDetector;
use crate::imaging::domain::image_reader::ImageReader;
use crate::imaging::domain::image_writer::ImageWriter;
use crate::imaging::infrastructure::annotation_writer::AnnotationWriter;
use crate::pipeline::crop_report::{CropRecord, FileReport};
use crate::pipeline::crop_settings::CropSettings;
use crate::pipeline::output_naming::output_file_name;

/// Per-file result plus how long each stage took, in milliseconds.
pub struct ProcessedFile {
    pub report: FileReport,
    pub timings: Vec<(&'static str, f64)>,
}

/// Single-file cropping pipeline: read → detect → derive → crop → pad →
/// resize → write.
///
/// Holds no mutable state, so one instance is shared by every worker.
pub struct CropFacesUseCase {
    reader: Box<dyn ImageReader>,
    writer: Box<dyn ImageWriter>,
    detector: Box<dyn FaceDetector>,
    settings: CropSettings,
    output_dir: PathBuf,
    annotator: Option<AnnotationWriter>,
}

impl CropFacesUseCase {
    pub fn new(
        reader: Box<dyn ImageReader>,
        writer: Box<dyn ImageWriter>,
        detector: Box<dyn FaceDetector>,
        settings: CropSettings,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            reader,
            writer,
            detector,
            settings,
            output_dir: output_dir.into(),
            annotator: None,
        }
    }

    /// Also save an overlay of detections and crop regions per input.
    pub fn with_annotations(mut self, annotator: AnnotationWriter) -> Self {
        self.annotator = Some(annotator);
        self
    }

    /// Processes one input, naming its outputs after `stem`. Failures are
    /// recorded in the report rather than returned, so one bad file never
    /// stops a batch.
    pub fn process_file(&self, source: &Path, stem: &str) -> ProcessedFile {
        let mut report = FileReport {
            source: source.to_path_buf(),
            ..FileReport::default()
        };
        let mut timings = Vec::new();

        if let Err(e) = self.run(source, stem, &mut report, &mut timings) {
            log::warn!("Failed to process {}: {e}", source.display());
            report.error = Some(e.to_string());
        }
        ProcessedFile { report, timings }
    }

    fn run(
        &self,
        source: &Path,
        stem: &str,
        report: &mut FileReport,
        timings: &mut Vec<(&'static str, f64)>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let settings = &self.settings;
        let target = settings.target_size;

        let started = Instant::now();
        let frame = self.reader.read(source)?;
        timings.push(("decode", elapsed_ms(started)));
        report.width = frame.width();
        report.height = frame.height();

        let started = Instant::now();
        let faces = self.detector.detect(&frame)?;
        timings.push(("detect", elapsed_ms(started)));
        log::debug!("{}: {} face(s)", source.display(), faces.len());

        let started = Instant::now();
        let dims = frame.dimensions();
        let mut regions = Vec::with_capacity(faces.len());
        for (i, bbox) in faces.iter().enumerate() {
            let rect = derive_crop_rectangle(bbox, dims, settings.mode, &settings.expansion);
            let mut crop = crop_frame(&frame, &rect);
            if settings.pad_square {
                crop = pad_to_square(&crop);
            }
            let crop = resize_frame(&crop, target, target)?;

            let output_path = self
                .output_dir
                .join(output_file_name(stem, settings.mode, i + 1, target));
            self.writer.write(&output_path, &crop)?;

            report.crops.push(CropRecord {
                bbox: *bbox,
                rect,
                output_path,
                mode: settings.mode,
                target_size: target,
                pad_square: settings.pad_square,
            });
            regions.push((*bbox, rect));
        }
        timings.push(("crop", elapsed_ms(started)));

        if let Some(annotator) = &self.annotator {
            let path = annotator.write(stem, &frame, &regions)?;
            log::debug!("Annotated {}", path.display());
        }
        Ok(())
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
