use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use crate::pipeline::crop_executor::CropExecutor;
use crate::pipeline::crop_faces_use_case::{CropFacesUseCase, ProcessedFile};
use crate::pipeline::crop_report::{CropReport, FileReport};
use crate::pipeline::output_naming::unique_stems;
use crate::pipeline::pipeline_logger::PipelineLogger;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// Input index, source path and output stem.
type Job = (usize, (PathBuf, String));

/// Runs the batch on a pool of worker threads.
///
/// Layout: `feeder → [worker × jobs] → main [collect/report]`
///
/// Files are independent, so workers pull from a shared bounded queue and
/// the main thread restores input order from each job's index. Output stems
/// are assigned up front so no two inputs write the same file.
pub struct ThreadedCropExecutor {
    jobs: usize,
    channel_capacity: usize,
}

impl ThreadedCropExecutor {
    pub fn new(jobs: usize) -> Self {
        Self {
            jobs: jobs.max(1),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// One worker per available core.
    pub fn with_available_parallelism() -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(jobs)
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }
}

impl Default for ThreadedCropExecutor {
    fn default() -> Self {
        Self::with_available_parallelism()
    }
}

impl CropExecutor for ThreadedCropExecutor {
    fn execute(
        &self,
        use_case: Arc<CropFacesUseCase>,
        inputs: &[PathBuf],
        logger: &mut dyn PipelineLogger,
    ) -> CropReport {
        let total = inputs.len();
        if total == 0 {
            return CropReport::default();
        }
        let workers = self.jobs.min(total);
        let cap = self.channel_capacity;
        logger.info(&format!("Processing {total} file(s) with {workers} worker(s)"));

        let stems = unique_stems(inputs);
        for (path, stem) in inputs.iter().zip(&stems) {
            if !path.file_stem().is_some_and(|s| s.to_string_lossy() == stem.as_str()) {
                logger.info(&format!("{} shares its name; writing as {stem}", path.display()));
            }
        }
        let jobs: Vec<Job> = inputs.iter().cloned().zip(stems).enumerate().collect();

        let (job_tx, job_rx) = crossbeam_channel::bounded::<Job>(cap);
        let (done_tx, done_rx) = crossbeam_channel::bounded::<(usize, ProcessedFile)>(cap);

        let feeder = spawn_feeder(jobs, job_tx);
        let handles: Vec<_> = (0..workers)
            .map(|_| spawn_worker(Arc::clone(&use_case), job_rx.clone(), done_tx.clone()))
            .collect();
        drop(job_rx);
        drop(done_tx);

        let mut slots: Vec<Option<FileReport>> = vec![None; total];
        let mut completed = 0;
        for (index, processed) in done_rx {
            for (stage, ms) in &processed.timings {
                logger.timing(stage, *ms);
            }
            logger.metric("faces", processed.report.crops.len() as f64);
            completed += 1;
            logger.progress(completed, total);
            slots[index] = Some(processed.report);
        }

        join_threads(feeder, handles);

        let files = slots
            .into_iter()
            .zip(inputs)
            .map(|(slot, path)| {
                slot.unwrap_or_else(|| FileReport::failed(path, "worker stopped before finishing"))
            })
            .collect();
        CropReport::new(files)
    }
}

fn spawn_feeder(jobs: Vec<Job>, job_tx: Sender<Job>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for job in jobs {
            if job_tx.send(job).is_err() {
                break;
            }
        }
    })
}

fn spawn_worker(
    use_case: Arc<CropFacesUseCase>,
    job_rx: Receiver<Job>,
    done_tx: Sender<(usize, ProcessedFile)>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for (index, (path, stem)) in job_rx {
            let processed = use_case.process_file(&path, &stem);
            if done_tx.send((index, processed)).is_err() {
                break;
            }
        }
    })
}

fn join_threads(feeder: JoinHandle<()>, workers: Vec<JoinHandle<()>>) {
    if feeder.join().is_err() {
        log::error!("Input feeder thread panicked");
    }
    for handle in workers {
        if handle.join().is_err() {
            log::error!("Crop worker thread panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::crop_faces_use_case::tests::{
        StubDetector, StubImageReader, StubImageWriter,
    };
    use crate::pipeline::crop_settings::CropSettings;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::region::BoundingBox;
    use rstest::rstest;

    #[derive(Default)]
    struct RecordingLogger {
        progress: Vec<(usize, usize)>,
        faces: Vec<f64>,
    }

    impl PipelineLogger for RecordingLogger {
        fn progress(&mut self, current: usize, total: usize) {
            self.progress.push((current, total));
        }
        fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
        fn metric(&mut self, name: &str, value: f64) {
            if name == "faces" {
                self.faces.push(value);
            }
        }
        fn info(&mut self, _message: &str) {}
    }

    fn use_case(paths: &[&str], writer: StubImageWriter) -> Arc<CropFacesUseCase> {
        Arc::new(CropFacesUseCase::new(
            Box::new(StubImageReader::uniform(paths, 64, 64)),
            Box::new(writer),
            Box::new(StubDetector {
                faces: vec![BoundingBox::new(8, 8, 16, 16)],
            }),
            CropSettings {
                target_size: 32,
                ..CropSettings::default()
            },
            "out",
        ))
    }

    fn inputs(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(16)]
    fn test_results_follow_input_order(#[case] jobs: usize) {
        let names: Vec<String> = (0..10).map(|i| format!("img{i}.png")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let writer = StubImageWriter::default();

        let report = ThreadedCropExecutor::new(jobs).execute(
            use_case(&refs, writer.clone()),
            &inputs(&refs),
            &mut NullPipelineLogger,
        );

        let sources: Vec<_> = report.files.iter().map(|f| f.source.clone()).collect();
        assert_eq!(sources, inputs(&refs));
        assert_eq!(report.total_faces(), 10);
        assert_eq!(writer.written.lock().unwrap().len(), 10);
    }

    #[test]
    fn test_failures_do_not_stop_batch() {
        let report = ThreadedCropExecutor::new(2).execute(
            use_case(&["a.png", "c.png"], StubImageWriter::default()),
            &inputs(&["a.png", "b.png", "c.png"]),
            &mut NullPipelineLogger,
        );

        assert_eq!(report.files.len(), 3);
        assert_eq!(report.total_faces(), 2);
        let failed = report.failed_files();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].source, PathBuf::from("b.png"));
        assert_eq!(report.summary(), "Processed 3 file(s). Found 2 face(s).");
    }

    #[test]
    fn test_same_stem_inputs_write_distinct_files() {
        let names = ["a/cat.png", "b/cat.png", "cat.jpg"];
        let writer = StubImageWriter::default();

        let report = ThreadedCropExecutor::new(2).execute(
            use_case(&names, writer.clone()),
            &inputs(&names),
            &mut NullPipelineLogger,
        );

        let outputs: Vec<_> = report
            .files
            .iter()
            .map(|f| f.crops[0].output_path.clone())
            .collect();
        assert_eq!(
            outputs,
            inputs(&[
                "out/cat__portrait__1_32.png",
                "out/cat-2__portrait__1_32.png",
                "out/cat-3__portrait__1_32.png",
            ])
        );
        let mut written: Vec<_> = writer
            .written
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect();
        written.sort();
        written.dedup();
        assert_eq!(written.len(), 3);
    }

    #[test]
    fn test_reports_progress_per_file() {
        let mut logger = RecordingLogger::default();
        ThreadedCropExecutor::new(2).execute(
            use_case(&["a.png", "b.png", "c.png"], StubImageWriter::default()),
            &inputs(&["a.png", "b.png", "c.png"]),
            &mut logger,
        );

        assert_eq!(logger.progress, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(logger.faces, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_empty_input_returns_empty_report() {
        let report = ThreadedCropExecutor::new(4).execute(
            use_case(&[], StubImageWriter::default()),
            &[],
            &mut NullPipelineLogger,
        );
        assert!(report.files.is_empty());
    }

    #[test]
    fn test_jobs_is_at_least_one() {
        assert_eq!(ThreadedCropExecutor::new(0).jobs(), 1);
        assert!(ThreadedCropExecutor::default().jobs() >= 1);
    }
}
