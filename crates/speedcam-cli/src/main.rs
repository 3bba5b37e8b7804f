mod input;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use input::{load_config, load_json_file, load_recorded_tracks, CorrespondenceInput};
use log::info;
use serde::Serialize;
use speedcam_core::{ImageSize, Real};
use speedcam_pipeline::{
    list_calibrations, load_calibration, save_calibration, save_speed_log, CalibrationSolver,
    CrossingEvent, FfmpegClipExtractor, JsonReportStore, ProjectionEngine, ReferenceLine,
    ReportCandidate, ReportFilter, ReportPublisher, ReportRecord, SpeedSession, SpeedcamConfig,
    TrackId, ZoneLines,
};
use std::path::{Path, PathBuf};

/// Roadside speed camera: calibration, reference lines and speed measurement.
#[derive(Debug, Parser)]
#[command(author, version, about = "Roadside speed camera toolkit")]
struct Cli {
    /// Optional path to a JSON SpeedcamConfig. Defaults are used if omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Solve the camera pose from clicked correspondences and write a calibration file.
    Calibrate {
        /// JSON with `image_points` and `object_points`.
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        /// Calibration file to write.
        #[arg(long)]
        output: PathBuf,
    },
    /// Print the reference lines of a calibration.
    Lines {
        #[arg(long)]
        calibration: PathBuf,
    },
    /// Measure speeds from recorded tracker output.
    Measure(MeasureArgs),
    /// List calibration files in a directory.
    ListCalibrations {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Debug, Args)]
struct MeasureArgs {
    #[arg(long)]
    calibration: PathBuf,
    /// JSON array of frames, each an array of `[x1, y1, x2, y2, track_id]`.
    #[arg(long)]
    tracks: PathBuf,
    /// Frame rate of the source video; the configured fallback is used if omitted.
    #[arg(long)]
    fps: Option<Real>,
    /// Speed log to write.
    #[arg(long)]
    speed_log: PathBuf,
    #[command(flatten)]
    publish: PublishArgs,
}

/// Clip extraction and report storage; all three paths enable publishing.
#[derive(Debug, Args, Default)]
struct PublishArgs {
    /// Source video to cut clips from.
    #[arg(long)]
    video: Option<PathBuf>,
    #[arg(long)]
    clip_dir: Option<PathBuf>,
    /// JSON report store.
    #[arg(long)]
    store: Option<PathBuf>,
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,
}

#[derive(Debug, Serialize)]
struct CalibrateReport {
    output: PathBuf,
    rms_reprojection_px: Real,
    iterations: usize,
    reference_lines: Vec<ReferenceLine>,
}

#[derive(Debug, Serialize)]
struct FailureReport {
    track_id: TrackId,
    error: String,
}

#[derive(Debug, Serialize)]
struct PublishReport {
    inserted: Vec<ReportRecord>,
    skipped: usize,
    failures: Vec<FailureReport>,
}

#[derive(Debug, Serialize)]
struct MeasureReport {
    frames: u64,
    events: Vec<CrossingEvent>,
    candidates: Vec<ReportCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    published: Option<PublishReport>,
}

fn reference_lines(config: &SpeedcamConfig, calibration: &Path) -> Result<Vec<ReferenceLine>> {
    let (pose, _) = load_calibration(calibration)?;
    Ok(ProjectionEngine::new(config.lateral_offset_m).project_lines(&pose, &config.reference_distances)?)
}

fn run_calibrate(
    config: &SpeedcamConfig,
    input: &Path,
    image: ImageSize,
    output: &Path,
) -> Result<CalibrateReport> {
    let set = load_json_file::<CorrespondenceInput>(input)?.into_set()?;
    let calibration = CalibrationSolver::new(config.solver).solve(&set, image)?;
    save_calibration(output, &calibration.pose, &set)?;
    info!("wrote {}", output.display());

    let reference_lines = ProjectionEngine::new(config.lateral_offset_m)
        .project_lines(&calibration.pose, &config.reference_distances)?;
    Ok(CalibrateReport {
        output: output.to_path_buf(),
        rms_reprojection_px: calibration.rms_reprojection_px,
        iterations: calibration.iterations,
        reference_lines,
    })
}

fn run_measure(config: &SpeedcamConfig, args: &MeasureArgs) -> Result<MeasureReport> {
    let lines = reference_lines(config, &args.calibration)?;
    let zone = ZoneLines::select(&lines, &config.near_label, &config.far_label)?;
    let frames = load_recorded_tracks(&args.tracks)?;

    let mut session = SpeedSession::new(zone, config, args.fps);
    for boxes in &frames {
        session.process_tracks(boxes);
    }
    let frame_count = session.frames_processed();
    let events = session.finish();
    save_speed_log(&args.speed_log, &events)?;
    info!(
        "{} crossings in {frame_count} frames, log written to {}",
        events.len(),
        args.speed_log.display()
    );

    let filter = ReportFilter::new(config.speed_threshold_kmh, config.clip_padding_s);
    let candidates = events.iter().filter_map(|e| filter.apply(e)).collect();

    let published = match (&args.publish.video, &args.publish.clip_dir, &args.publish.store) {
        (Some(video), Some(clip_dir), Some(store)) => {
            Some(publish(&events, filter, video, clip_dir, store, &args.publish.ffmpeg)?)
        }
        (None, None, None) => None,
        _ => bail!("publishing needs --video, --clip-dir and --store together"),
    };

    Ok(MeasureReport {
        frames: frame_count,
        events,
        candidates,
        published,
    })
}

fn publish(
    events: &[CrossingEvent],
    filter: ReportFilter,
    video: &Path,
    clip_dir: &Path,
    store: &Path,
    ffmpeg: &Path,
) -> Result<PublishReport> {
    let video_filename = video
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", video.display()))?;
    let mut publisher = ReportPublisher::new(
        FfmpegClipExtractor::with_program(ffmpeg),
        JsonReportStore::new(store),
        filter,
        clip_dir,
    );
    let summary = publisher.publish(events, video, &video_filename)?;
    Ok(PublishReport {
        inserted: summary.inserted,
        skipped: summary.skipped,
        failures: summary
            .failures
            .into_iter()
            .map(|f| FailureReport {
                track_id: f.track_id,
                error: f.error.to_string(),
            })
            .collect(),
    })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let json = match &cli.command {
        Command::Calibrate {
            input,
            width,
            height,
            output,
        } => {
            let image = ImageSize::new(*width, *height)?;
            serde_json::to_string_pretty(&run_calibrate(&config, input, image, output)?)?
        }
        Command::Lines { calibration } => {
            serde_json::to_string_pretty(&reference_lines(&config, calibration)?)?
        }
        Command::Measure(args) => serde_json::to_string_pretty(&run_measure(&config, args)?)?,
        Command::ListCalibrations { dir } => serde_json::to_string_pretty(&list_calibrations(dir)?)?,
    };
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use speedcam_core::synthetic::{ground_grid, project_all, roadside_pose};
    use speedcam_core::{make_pinhole_camera, RadialTangential4};
    use speedcam_pipeline::{intrinsic_prior, load_speed_log, ReportStore};
    use std::fs;

    fn image() -> ImageSize {
        ImageSize::new(1280, 720).unwrap()
    }

    fn write_clicks(path: &Path) {
        let camera = make_pinhole_camera(intrinsic_prior(image()), RadialTangential4::default());
        let world = ground_grid(&[12.0, 25.0, 45.0], &[0.0, 3.5, 7.0]);
        let pixels = project_all(&camera, &roadside_pose(6.0, 0.12, -3.0), &world).unwrap();
        let json = serde_json::json!({
            "image_points": pixels.iter().map(|p| serde_json::json!({"x": p.x, "y": p.y})).collect::<Vec<_>>(),
            "object_points": world.iter().map(|p| [p.x, p.y, p.z]).collect::<Vec<_>>(),
        });
        fs::write(path, json.to_string()).unwrap();
    }

    fn calibrated(dir: &Path) -> PathBuf {
        let clicks = dir.join("clicks.json");
        write_clicks(&clicks);
        let output = dir.join("road.json");
        run_calibrate(&SpeedcamConfig::default(), &clicks, image(), &output).unwrap();
        output
    }

    /// One car driving up the frame through the zone, five rows per frame.
    fn write_tracks(path: &Path, near_y: i32, far_y: i32) {
        let frames: Vec<Vec<[Real; 5]>> = (0..)
            .map(|k| near_y + 40 - 5 * k)
            .take_while(|&y| y > far_y - 40)
            .map(|y| vec![[600.0, (y - 10) as Real, 660.0, (y + 10) as Real, 9.0]])
            .collect();
        fs::write(path, serde_json::to_string(&frames).unwrap()).unwrap();
    }

    #[test]
    fn calibrate_writes_file_and_lines() {
        let dir = tempfile::tempdir().unwrap();
        let clicks = dir.path().join("clicks.json");
        write_clicks(&clicks);
        let output = dir.path().join("road.json");

        let report = run_calibrate(&SpeedcamConfig::default(), &clicks, image(), &output).unwrap();
        assert!(report.rms_reprojection_px < 1e-6);
        assert_eq!(report.reference_lines.len(), 2);
        assert!(output.exists());

        let lines = reference_lines(&SpeedcamConfig::default(), &output).unwrap();
        assert_eq!(lines, report.reference_lines);
        assert_eq!(list_calibrations(dir.path()).unwrap(), vec!["clicks.json", "road.json"]);
    }

    #[test]
    fn measure_writes_speed_log_and_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let calibration = calibrated(dir.path());
        let config = SpeedcamConfig {
            speed_threshold_kmh: 1.0,
            ..SpeedcamConfig::default()
        };
        let lines = reference_lines(&config, &calibration).unwrap();
        let zone = ZoneLines::select(&lines, "near", "far").unwrap();
        let tracks = dir.path().join("tracks.json");
        write_tracks(&tracks, zone.near.image_y, zone.far.image_y);

        let args = MeasureArgs {
            calibration,
            tracks,
            fps: Some(30.0),
            speed_log: dir.path().join("speeds.json"),
            publish: PublishArgs::default(),
        };
        let report = run_measure(&config, &args).unwrap();
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].track_id, 9);
        assert_eq!(report.candidates.len(), 1);
        assert!(report.published.is_none());
        assert_eq!(load_speed_log(&args.speed_log).unwrap(), report.events);
    }

    #[test]
    fn partial_publish_flags_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let calibration = calibrated(dir.path());
        let tracks = dir.path().join("tracks.json");
        fs::write(&tracks, "[]").unwrap();
        let args = MeasureArgs {
            calibration,
            tracks,
            fps: None,
            speed_log: dir.path().join("speeds.json"),
            publish: PublishArgs {
                video: Some(dir.path().join("in.mp4")),
                ..PublishArgs::default()
            },
        };
        let err = run_measure(&SpeedcamConfig::default(), &args).unwrap_err();
        assert!(err.to_string().contains("--clip-dir"));
    }

    #[cfg(unix)]
    #[test]
    fn publish_runs_the_clip_program() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        // Stands in for ffmpeg: writes a few bytes to its last argument.
        let program = dir.path().join("fake-ffmpeg");
        fs::write(&program, "#!/bin/sh\nfor last; do :; done\necho clip > \"$last\"\n").unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();

        let events = vec![
            CrossingEvent {
                track_id: 1,
                speed_kmh: 88.0,
                duration_s: 0.8,
                wall_timestamp: 1_700_000_000.0,
                entry_time: 2.0,
                exit_time: 2.8,
            },
            CrossingEvent {
                track_id: 2,
                speed_kmh: 40.0,
                duration_s: 1.8,
                wall_timestamp: 1_700_000_001.0,
                entry_time: 3.0,
                exit_time: 4.8,
            },
        ];
        let store = dir.path().join("reports.json");
        let report = publish(
            &events,
            ReportFilter::new(60.0, 0.5),
            Path::new("/videos/road.mp4"),
            &dir.path().join("clips"),
            &store,
            &program,
        )
        .unwrap();

        assert!(report.failures.is_empty());
        assert_eq!(report.skipped, 1);
        assert_eq!(report.inserted.len(), 1);
        assert_eq!(report.inserted[0].video_filename, "road.mp4");
        assert!(dir.path().join("clips/clip_track_1_1700000000.mp4").exists());
        assert_eq!(JsonReportStore::new(&store).fetch_above(60.0).unwrap().len(), 1);
    }

    #[test]
    fn missing_clip_program_is_a_failure_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let events = vec![CrossingEvent {
            track_id: 4,
            speed_kmh: 99.0,
            duration_s: 0.7,
            wall_timestamp: 5.0,
            entry_time: 1.0,
            exit_time: 1.7,
        }];
        let report = publish(
            &events,
            ReportFilter::new(60.0, 0.5),
            Path::new("road.mp4"),
            dir.path(),
            &dir.path().join("reports.json"),
            Path::new("/nonexistent/ffmpeg"),
        )
        .unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].track_id, 4);
        assert!(report.inserted.is_empty());
    }
}
