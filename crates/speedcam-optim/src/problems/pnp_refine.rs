//! Iterative PnP: Levenberg–Marquardt refinement of a camera pose.
//!
//! Minimises the pixel reprojection error of fixed world points over the pose
//! `T_C_W`, parameterised as `[rvec, tvec]`. Intrinsics and distortion are held
//! fixed.

use crate::jacobian::central_difference;
use crate::params::pose_rvec::{iso_to_pose_vec, pose_vec_to_iso, POSE_DIM};
use crate::{LmBackend, NllsProblem, NllsSolverBackend, RobustKernel, SolveOptions, SolveReport};
use log::debug;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use speedcam_core::{Iso3, PinholeCamera, Pt2, Pt3, Real};
use thiserror::Error;

/// Residual assigned to both coordinates of a point behind the camera.
const BEHIND_CAMERA_RESIDUAL_PX: Real = 1e6;
const JACOBIAN_REL_STEP: Real = 1e-6;

/// Solver settings for pose refinement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PnpRefineOptions {
    pub max_iters: usize,
    pub ftol: Real,
    pub xtol: Real,
    pub gtol: Real,
    pub robust: RobustKernel,
}

impl Default for PnpRefineOptions {
    fn default() -> Self {
        Self {
            max_iters: 200,
            ftol: 1e-12,
            xtol: 1e-12,
            gtol: 1e-12,
            robust: RobustKernel::None,
        }
    }
}

impl PnpRefineOptions {
    fn solve_options(&self) -> SolveOptions {
        SolveOptions {
            max_iters: self.max_iters,
            ftol: self.ftol,
            gtol: self.gtol,
            xtol: self.xtol,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RefineError {
    #[error("world/image point count mismatch: {world} vs {image}")]
    CountMismatch { world: usize, image: usize },
    #[error("need at least 3 correspondences for pose refinement, got {0}")]
    NotEnoughPoints(usize),
}

/// Outcome of [`refine_pose`].
#[derive(Debug, Clone)]
pub struct PnpRefineResult {
    pub pose: Iso3,
    pub report: SolveReport,
    /// Unweighted pixel RMS of the refined pose.
    pub rms_px: Real,
}

struct PnpRefineProblem<'a> {
    camera: &'a PinholeCamera,
    world: &'a [Pt3],
    image: &'a [Pt2],
    robust: RobustKernel,
}

impl PnpRefineProblem<'_> {
    fn residuals_at(&self, x: &DVector<Real>) -> DVector<Real> {
        let mut r = DVector::from_element(2 * self.world.len(), BEHIND_CAMERA_RESIDUAL_PX);
        let Some(pose) = pose_vec_to_iso(x.as_view()) else {
            return r;
        };
        for (i, (pw, pi)) in self.world.iter().zip(self.image).enumerate() {
            if let Some(uv) = self.camera.project_point(&pose.transform_point(pw)) {
                r[2 * i] = uv.x - pi.x;
                r[2 * i + 1] = uv.y - pi.y;
            }
        }
        r
    }
}

impl NllsProblem for PnpRefineProblem<'_> {
    fn num_params(&self) -> usize {
        POSE_DIM
    }

    fn num_residuals(&self) -> usize {
        2 * self.world.len()
    }

    fn raw_residuals(&self, x: &DVector<Real>) -> DVector<Real> {
        self.residuals_at(x)
    }

    fn raw_jacobian(&self, x: &DVector<Real>) -> DMatrix<Real> {
        central_difference(|p| self.residuals_at(p), x, self.num_residuals(), JACOBIAN_REL_STEP)
    }

    /// One weight per point, shared by its u and v rows.
    fn row_weights(&self, r: &DVector<Real>) -> Option<DVector<Real>> {
        if self.robust == RobustKernel::None {
            return None;
        }
        let mut scales = DVector::from_element(r.len(), 1.0);
        for i in 0..r.len() / 2 {
            let r2 = r[2 * i].powi(2) + r[2 * i + 1].powi(2);
            let s = self.robust.weight(r2).sqrt();
            scales[2 * i] = s;
            scales[2 * i + 1] = s;
        }
        Some(scales)
    }
}

/// Refine `init` (`T_C_W`) by minimising pixel reprojection error.
///
/// The caller decides what to do with a non-converged report; the returned
/// pose is the last iterate either way.
pub fn refine_pose(
    camera: &PinholeCamera,
    world: &[Pt3],
    image: &[Pt2],
    init: &Iso3,
    opts: &PnpRefineOptions,
) -> Result<PnpRefineResult, RefineError> {
    if world.len() != image.len() {
        return Err(RefineError::CountMismatch {
            world: world.len(),
            image: image.len(),
        });
    }
    if world.len() < 3 {
        return Err(RefineError::NotEnoughPoints(world.len()));
    }

    let problem = PnpRefineProblem {
        camera,
        world,
        image,
        robust: opts.robust,
    };
    let x0 = iso_to_pose_vec(init);
    let (x, report) = LmBackend.solve(&problem, x0, &opts.solve_options());
    let pose = pose_vec_to_iso(x.as_view()).unwrap_or(*init);

    let r = problem.raw_residuals(&x);
    let rms_px = (r.norm_squared() / world.len() as Real).sqrt();
    debug!(
        "pnp refinement: converged={} evaluations={} rms={:.4} px",
        report.converged, report.iterations, rms_px
    );

    Ok(PnpRefineResult {
        pose,
        report,
        rms_px,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_fill_missing_fields_from_default() {
        let opts: PnpRefineOptions = serde_json::from_str(r#"{"max_iters": 50}"#).unwrap();
        assert_eq!(opts.max_iters, 50);
        assert_eq!(opts.ftol, PnpRefineOptions::default().ftol);
        assert_eq!(opts.robust, RobustKernel::None);
    }

    #[test]
    fn refine_rejects_mismatched_inputs() {
        let camera = speedcam_core::make_pinhole_camera(
            speedcam_core::FxFyCxCySkew {
                fx: 100.0,
                fy: 100.0,
                cx: 50.0,
                cy: 50.0,
                skew: 0.0,
            },
            Default::default(),
        );
        let world = vec![Pt3::origin(); 4];
        let image = vec![Pt2::origin(); 3];
        let err = refine_pose(&camera, &world, &image, &Iso3::identity(), &Default::default())
            .unwrap_err();
        assert_eq!(err, RefineError::CountMismatch { world: 4, image: 3 });
    }
}
