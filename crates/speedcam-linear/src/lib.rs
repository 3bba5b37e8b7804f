//! Linear and closed-form initialisers for camera pose estimation.
//!
//! Every solver returns `T_C_W` (world to camera) and is meant to seed the
//! non-linear refinement in `speedcam-optim`.

mod homography;
pub mod math;
mod planar_pose;
pub mod pnp;

pub use homography::*;
pub use planar_pose::*;
pub use pnp::{PnpError, PnpSolver};
