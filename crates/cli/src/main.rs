use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;

use anime_cropper_core::cropping::domain::crop_mode::CropMode;
use anime_cropper_core::detection::infrastructure::cascade_face_detector::CascadeFaceDetector;
use anime_cropper_core::imaging::infrastructure::annotation_writer::AnnotationWriter;
use anime_cropper_core::imaging::infrastructure::image_file_reader::ImageFileReader;
use anime_cropper_core::imaging::infrastructure::png_file_writer::PngFileWriter;
use anime_cropper_core::pipeline::crop_executor::CropExecutor;
use anime_cropper_core::pipeline::crop_faces_use_case::CropFacesUseCase;
use anime_cropper_core::pipeline::crop_settings::CropSettings;
use anime_cropper_core::pipeline::infrastructure::threaded_crop_executor::ThreadedCropExecutor;
use anime_cropper_core::pipeline::pipeline_logger::{PipelineLogger, StdoutPipelineLogger};
use anime_cropper_core::shared::asset_resolver;
use anime_cropper_core::shared::constants::{CASCADE_NAME, CASCADE_URL, IMAGE_EXTENSIONS};

/// Detects anime faces in images and writes square face or portrait crops.
#[derive(Parser)]
#[command(name = "anime-cropper", version)]
struct Cli {
    /// Input image files or directories (directories are scanned one level deep).
    #[arg(required_unless_present = "fetch_assets")]
    inputs: Vec<PathBuf>,

    /// Directory for the cropped PNGs.
    #[arg(short, long, default_value = "crops")]
    output_dir: PathBuf,

    /// JSON settings file; flags given on the command line override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Crop mode: face or portrait.
    #[arg(long)]
    mode: Option<String>,

    /// Portrait multiplier applied to the face's top edge.
    #[arg(long)]
    expand_top: Option<f64>,

    /// Portrait multiplier applied to the face's left edge.
    #[arg(long)]
    expand_left: Option<f64>,

    /// Portrait multiplier applied to the face's width.
    #[arg(long)]
    expand_right: Option<f64>,

    /// Pad each crop to a square before resizing (true/false).
    #[arg(long)]
    pad_square: Option<bool>,

    /// Edge length of the written crops, in pixels.
    #[arg(long)]
    target_size: Option<u32>,

    /// Smallest face to detect, in source pixels.
    #[arg(long)]
    min_size: Option<u32>,

    /// Window growth per detection scale (must be > 1.0).
    #[arg(long)]
    scale_factor: Option<f64>,

    /// Overlapping hits required before a detection counts.
    #[arg(long)]
    min_neighbors: Option<u32>,

    /// Use this cascade XML instead of the downloaded one.
    #[arg(long)]
    cascade: Option<PathBuf>,

    /// Download the cascade into the cache and exit.
    #[arg(long)]
    fetch_assets: bool,

    /// Write a JSON report of every crop to this path.
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Also save each input with detections and crop regions drawn on.
    #[arg(long)]
    annotate_dir: Option<PathBuf>,

    /// Worker threads (default: one per core).
    #[arg(short, long)]
    jobs: Option<usize>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    if cli.fetch_assets {
        let path = resolve_cascade()?;
        println!("{}", path.display());
        return Ok(());
    }

    let settings = build_settings(&cli)?;
    let inputs = collect_inputs(&cli.inputs)?;

    let cascade_path = match &cli.cascade {
        Some(path) => path.clone(),
        None => resolve_cascade()?,
    };
    let detector = CascadeFaceDetector::from_file(&cascade_path, settings.detection)?;

    let mut use_case = CropFacesUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(PngFileWriter::new()),
        Box::new(detector),
        settings,
        &cli.output_dir,
    );
    if let Some(dir) = &cli.annotate_dir {
        use_case = use_case.with_annotations(AnnotationWriter::new(dir));
    }

    let executor = match cli.jobs {
        Some(jobs) => ThreadedCropExecutor::new(jobs),
        None => ThreadedCropExecutor::with_available_parallelism(),
    };
    let mut logger = StdoutPipelineLogger::default();
    let report = executor.execute(Arc::new(use_case), &inputs, &mut logger);
    logger.summary();

    if let Some(path) = &cli.manifest {
        report.write_manifest(path)?;
        log::info!("Manifest written to {}", path.display());
    }

    println!("{}", report.summary());

    let failed = report.failed_files();
    if !failed.is_empty() {
        for file in &failed {
            eprintln!(
                "  {}: {}",
                file.source.display(),
                file.error.as_deref().unwrap_or("unknown error")
            );
        }
        return Err(format!("{} of {} file(s) failed", failed.len(), report.files.len()).into());
    }
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    for input in &cli.inputs {
        if !input.exists() {
            return Err(format!("Input not found: {}", input.display()).into());
        }
    }
    if let Some(mode) = &cli.mode {
        mode.parse::<CropMode>()?;
    }
    if let Some(path) = &cli.config {
        if !path.is_file() {
            return Err(format!("Config file not found: {}", path.display()).into());
        }
    }
    if let Some(path) = &cli.cascade {
        if !path.is_file() {
            return Err(format!("Cascade file not found: {}", path.display()).into());
        }
    }
    if cli.jobs == Some(0) {
        return Err("Jobs must be at least 1".into());
    }
    Ok(())
}

/// Config file (or defaults), then any flag given explicitly.
fn build_settings(cli: &Cli) -> Result<CropSettings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.config {
        Some(path) => CropSettings::load(path)?,
        None => CropSettings::default(),
    };

    if let Some(mode) = &cli.mode {
        settings.mode = mode.parse()?;
    }
    if let Some(v) = cli.expand_top {
        settings.expansion.top = v;
    }
    if let Some(v) = cli.expand_left {
        settings.expansion.left = v;
    }
    if let Some(v) = cli.expand_right {
        settings.expansion.right = v;
    }
    if let Some(v) = cli.pad_square {
        settings.pad_square = v;
    }
    if let Some(v) = cli.target_size {
        settings.target_size = v;
    }
    if let Some(v) = cli.min_size {
        settings.detection.min_size = v;
    }
    if let Some(v) = cli.scale_factor {
        settings.detection.scale_factor = v;
    }
    if let Some(v) = cli.min_neighbors {
        settings.detection.min_neighbors = v;
    }

    settings.validate()?;
    Ok(settings)
}

/// Files are taken as given; directories contribute their image files,
/// sorted by name.
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_image(p))
                .collect();
            found.sort();
            if found.is_empty() {
                log::warn!("No images found in {}", input.display());
            }
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    if files.is_empty() {
        return Err("No image files to process".into());
    }
    Ok(files)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn resolve_cascade() -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving cascade: {CASCADE_NAME}");
    let bundled = bundled_assets_dir();
    let path = asset_resolver::resolve(
        CASCADE_NAME,
        CASCADE_URL,
        bundled.as_deref(),
        Some(Box::new(download_progress)),
    )?;
    Ok(path)
}

/// `assets/` next to the executable, for pre-packaged installs.
fn bundled_assets_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("assets")))
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face cascade... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading face cascade... {downloaded} bytes");
    }
}
