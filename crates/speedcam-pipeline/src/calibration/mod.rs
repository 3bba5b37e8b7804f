//! Camera pose calibration from user-supplied correspondences.

mod io;
mod pose;
mod session;
mod solver;

pub use io::{
    deserialize, from_json_str, list_calibrations, load_calibration, save_calibration, serialize,
    to_json_string, CalibrationRecord,
};
pub use pose::Pose;
pub use session::CalibrationSession;
pub use solver::{intrinsic_prior, Calibration, CalibrationSolver};
