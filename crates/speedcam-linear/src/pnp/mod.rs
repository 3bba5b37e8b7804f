//! Perspective-n-Point (PnP) solvers for camera pose estimation.
//!
//! Includes:
//! - DLT (linear) pose estimation with normalization, for 6+ points.
//! - EPnP (control-point formulation) for 4+ non-coplanar points.
//! - P3P minimal solver (3 points, multiple solutions).
//! - Planar pose through a homography in the plane frame, for coplanar points.
//!
//! All methods estimate a pose `T_C_W`: transform from world coordinates into
//! the camera frame. [`PnpSolver::initial_pose`] runs every applicable solver
//! and keeps the candidate with the lowest reprojection error.

use crate::homography::HomographyError;
use log::debug;
use speedcam_core::{FxFyCxCySkew, Iso3, Pt2, Pt3, Real};
use thiserror::Error;

mod dlt;
mod epnp;
mod p3p;
mod planar;
mod pose_utils;

pub use dlt::dlt;
pub use epnp::epnp;
pub use p3p::p3p;
pub use planar::{is_coplanar, planar};
pub use pose_utils::reprojection_rms;

/// Errors raised by the closed-form PnP solvers.
#[derive(Debug, Error)]
pub enum PnpError {
    #[error("need at least {min} point correspondences, got {got}")]
    NotEnoughPoints { got: usize, min: usize },
    #[error("world/image point count mismatch: {world} world vs {image} image")]
    CountMismatch { world: usize, image: usize },
    #[error("intrinsics matrix is not invertible")]
    SingularIntrinsics,
    #[error("svd failed")]
    SvdFailed,
    #[error("degenerate point configuration")]
    DegeneratePoints,
    #[error("no pose candidate places every point in front of the camera")]
    NoSolution,
    #[error(transparent)]
    Homography(#[from] HomographyError),
}

pub(crate) fn check_counts(world: &[Pt3], image: &[Pt2], min: usize) -> Result<(), PnpError> {
    if world.len() != image.len() {
        return Err(PnpError::CountMismatch {
            world: world.len(),
            image: image.len(),
        });
    }
    if world.len() < min {
        return Err(PnpError::NotEnoughPoints {
            got: world.len(),
            min,
        });
    }
    Ok(())
}

/// Closed-form PnP solver facade.
#[derive(Debug, Clone, Copy)]
pub struct PnpSolver;

impl PnpSolver {
    /// Direct linear PnP on all points (6+ required, non-coplanar).
    pub fn dlt(world: &[Pt3], image: &[Pt2], k: &FxFyCxCySkew<Real>) -> Result<Iso3, PnpError> {
        dlt::dlt(world, image, k)
    }

    /// EPnP pose estimation for 4+ non-coplanar points.
    pub fn epnp(world: &[Pt3], image: &[Pt2], k: &FxFyCxCySkew<Real>) -> Result<Iso3, PnpError> {
        epnp::epnp(world, image, k)
    }

    /// P3P minimal solver: returns up to four pose candidates.
    pub fn p3p(world: &[Pt3], image: &[Pt2], k: &FxFyCxCySkew<Real>) -> Result<Vec<Iso3>, PnpError> {
        p3p::p3p(world, image, k)
    }

    /// Pose of 4+ coplanar points through a plane-frame homography.
    pub fn planar(world: &[Pt3], image: &[Pt2], k: &FxFyCxCySkew<Real>) -> Result<Iso3, PnpError> {
        planar::planar(world, image, k)
    }

    /// Best closed-form pose for 4+ correspondences.
    ///
    /// Coplanar inputs go through [`PnpSolver::planar`]; non-coplanar inputs
    /// through [`PnpSolver::dlt`] (6+ points) and [`PnpSolver::epnp`]. The P3P
    /// candidates of the first three points are always considered as well.
    /// The winner is the candidate with the lowest pixel RMS among those that
    /// put every world point in front of the camera.
    pub fn initial_pose(
        world: &[Pt3],
        image: &[Pt2],
        k: &FxFyCxCySkew<Real>,
    ) -> Result<Iso3, PnpError> {
        check_counts(world, image, 4)?;

        let mut candidates: Vec<(&'static str, Iso3)> = Vec::new();
        let mut last_err = None;
        let mut push = |name: &'static str, res: Result<Iso3, PnpError>| match res {
            Ok(pose) => candidates.push((name, pose)),
            Err(e) => {
                debug!("pnp initialiser {name} failed: {e}");
                last_err = Some(e);
            }
        };

        if is_coplanar(world) {
            push("planar", planar::planar(world, image, k));
        } else {
            if world.len() >= 6 {
                push("dlt", dlt::dlt(world, image, k));
            }
            push("epnp", epnp::epnp(world, image, k));
        }
        match p3p::p3p(&world[..3], &image[..3], k) {
            Ok(poses) => poses.into_iter().for_each(|p| push("p3p", Ok(p))),
            Err(e) => push("p3p", Err(e)),
        }

        let had_candidates = !candidates.is_empty();
        let best = candidates
            .into_iter()
            .filter_map(|(name, pose)| {
                reprojection_rms(&pose, world, image, k).map(|rms| (name, pose, rms))
            })
            .min_by(|a, b| a.2.total_cmp(&b.2));

        match best {
            Some((name, pose, rms)) => {
                debug!("pnp initial pose from {name}, rms {rms:.4} px");
                Ok(pose)
            }
            None if had_candidates => Err(PnpError::NoSolution),
            None => Err(last_err.unwrap_or(PnpError::NoSolution)),
        }
    }
}
