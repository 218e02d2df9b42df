mod window_presenter;

use std::path::PathBuf;
use std::process;

use clap::Parser;

use facelock_core::detection::domain::face_detector::FaceDetector;
use facelock_core::detection::infrastructure::detector_factory::{create_detector, DetectorKind};
use facelock_core::selection::domain::selection_controller::SelectionController;
use facelock_core::session::session_logger::StdoutSessionLogger;
use facelock_core::session::track_session_use_case::{SnapshotSink, TrackSessionUseCase};
use facelock_core::settings::Settings;
use facelock_core::shared::video_metadata::VideoSource;
use facelock_core::steering::infrastructure::controller_factory::ControllerKind;
use facelock_core::tracking::infrastructure::tracker_factory::{create_tracker, TrackerKind};
use facelock_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use facelock_core::video::infrastructure::image_file_writer::ImageFileWriter;

use window_presenter::MinifbPresenter;

/// Detect faces in a webcam feed, click one to select it, then track it.
///
/// Unset options fall back to the saved settings file.
#[derive(Parser)]
#[command(name = "facelock")]
struct Cli {
    /// Read frames from a video file instead of the camera.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Camera device (e.g. /dev/video0).
    #[arg(long, conflicts_with = "input")]
    device: Option<String>,

    /// Face detector: yolo or blazeface.
    #[arg(long)]
    detector: Option<DetectorKind>,

    /// Detector model file (required for blazeface).
    #[arg(long)]
    model: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// Tracker: mosse or redetect.
    #[arg(long)]
    tracker: Option<TrackerKind>,

    /// Yaw controller for the steering readout: constant or proportional.
    #[arg(long)]
    controller: Option<ControllerKind>,

    /// Directory for snapshots taken with the `s` key.
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Store the effective options as the new defaults.
    #[arg(long)]
    save_settings: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let save = cli.save_settings;
    let (settings, input) = merge(Settings::load(), cli);
    validate(&settings, input.as_ref())?;

    if save {
        let path = settings.save()?;
        log::info!("Settings saved to {}", path.display());
    }

    let source = match input {
        Some(path) => VideoSource::File(path),
        None => VideoSource::Camera {
            device: settings.device.clone(),
        },
    };

    let detector = build_detector(&settings)?;
    let redetector = if settings.tracker.needs_detector() {
        Some(build_detector(&settings)?)
    } else {
        None
    };
    let tracker = create_tracker(settings.tracker, redetector)?;
    log::info!(
        "Using {} detector and {} tracker",
        settings.detector,
        settings.tracker
    );

    let snapshots = settings.snapshot_dir.clone().map(|dir| SnapshotSink {
        writer: Box::new(ImageFileWriter::new()),
        dir,
    });

    let mut session = TrackSessionUseCase::new(
        Box::new(FfmpegReader::new()),
        SelectionController::new(detector, tracker),
        Box::new(MinifbPresenter::new("facelock")),
        settings.controller,
        snapshots,
        Box::new(StdoutSessionLogger::default()),
    );
    let summary = session.run(&source)?;
    log::info!(
        "{} frames, {} tracked, {} lost, {} snapshots",
        summary.frames,
        summary.frames_tracked,
        summary.frames_lost,
        summary.snapshots
    );
    Ok(())
}

/// Overlays command-line options on the saved settings.
fn merge(mut settings: Settings, cli: Cli) -> (Settings, Option<PathBuf>) {
    if let Some(device) = cli.device {
        settings.device = device;
    }
    if let Some(detector) = cli.detector {
        settings.detector = detector;
    }
    if cli.model.is_some() {
        settings.model = cli.model;
    }
    if let Some(confidence) = cli.confidence {
        settings.confidence = confidence;
    }
    if let Some(tracker) = cli.tracker {
        settings.tracker = tracker;
    }
    if cli.controller.is_some() {
        settings.controller = cli.controller;
    }
    if cli.snapshot_dir.is_some() {
        settings.snapshot_dir = cli.snapshot_dir;
    }
    (settings, cli.input)
}

fn validate(settings: &Settings, input: Option<&PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = input {
        if !path.exists() {
            return Err(format!("Input file not found: {}", path.display()).into());
        }
    }
    if !(0.0..=1.0).contains(&settings.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            settings.confidence
        )
        .into());
    }
    if !settings.detector.has_default_model() && settings.model.is_none() {
        return Err(format!("The {} detector requires --model <PATH>", settings.detector).into());
    }
    if let Some(dir) = &settings.snapshot_dir {
        if dir.is_file() {
            return Err(format!("Snapshot directory is a file: {}", dir.display()).into());
        }
    }
    Ok(())
}

fn build_detector(settings: &Settings) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    let detector = create_detector(
        settings.detector,
        settings.model.as_deref(),
        settings.confidence,
        Some(Box::new(download_progress)),
    )?;
    Ok(detector)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}
