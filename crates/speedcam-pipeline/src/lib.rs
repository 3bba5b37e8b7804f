//! Speed measurement pipeline.
//!
//! Stages, in data-flow order:
//! 1. [`calibration`]: solve the camera pose from 2D-3D correspondences and
//!    persist it as a JSON calibration file.
//! 2. [`projection`]: project the known-distance reference lines into the image.
//! 3. [`zone`]: per-track zone-crossing state machine producing speed events.
//! 4. [`report`]: threshold filtering, clip windows, clip extraction and the
//!    report store.
//!
//! [`session::SpeedSession`] drives stages 3 and 4 frame by frame on top of the
//! collaborator traits in [`external`].

pub mod calibration;
pub mod config;
pub mod error;
pub mod external;
pub mod projection;
pub mod report;
pub mod session;
pub mod zone;

pub use calibration::{
    deserialize, intrinsic_prior, list_calibrations, load_calibration, save_calibration,
    serialize, Calibration, CalibrationRecord, CalibrationSession, CalibrationSolver, Pose,
};
pub use config::{ReferenceDistance, SpeedcamConfig};
pub use error::{Result, SpeedcamError};
pub use external::{
    ClipExtractor, ClipWindow, Detection, Detector, FfmpegClipExtractor, ObjectTracker,
    TrackedBox,
};
pub use projection::{ProjectionEngine, ReferenceLine, ZoneLines};
pub use report::{
    clip_file_name, clip_file_name_nth, filter, JsonReportStore, PublishFailure, PublishSummary,
    ReportCandidate, ReportFilter, ReportPublisher, ReportRecord, ReportStore,
};
pub use session::{FrameClock, SpeedSession, TrackAnnotation};
pub use zone::{
    load_speed_log, save_speed_log, CrossingEvent, TrackId, TrackState, ZoneCrossingTracker,
};
