use super::pose::Pose;
use crate::error::{Result, SpeedcamError};
use log::{debug, info};
use speedcam_core::{
    make_pinhole_camera, rvec_from_rotation, CorrespondenceSet, FxFyCxCySkew, ImageSize,
    RadialTangential4, Real, ValidationError, MIN_CORRESPONDENCES,
};
use speedcam_linear::PnpSolver;
use speedcam_optim::{refine_pose, PnpRefineOptions};

/// Intrinsics assumed for an uncalibrated camera: focal lengths equal to the
/// image dimensions and the principal point at the image centre.
pub fn intrinsic_prior(image: ImageSize) -> FxFyCxCySkew<Real> {
    let w = image.width as Real;
    let h = image.height as Real;
    FxFyCxCySkew {
        fx: w,
        fy: h,
        cx: w / 2.0,
        cy: h / 2.0,
        skew: 0.0,
    }
}

/// Result of a successful pose solve.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    pub pose: Pose,
    /// Pixel RMS reprojection error of the refined pose.
    pub rms_reprojection_px: Real,
    /// Residual evaluations spent by the optimiser.
    pub iterations: usize,
}

/// Iterative PnP: closed-form initial pose, then Levenberg–Marquardt refinement.
///
/// Holds only its options, so one solver can serve any number of solves.
#[derive(Debug, Clone, Default)]
pub struct CalibrationSolver {
    options: PnpRefineOptions,
}

impl CalibrationSolver {
    pub fn new(options: PnpRefineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PnpRefineOptions {
        &self.options
    }

    /// Solve the camera pose for `correspondences` seen in an image of `image` size.
    ///
    /// # Errors
    ///
    /// - [`SpeedcamError::Validation`] for fewer than four correspondences.
    /// - [`SpeedcamError::Calibration`] when the initialiser fails, the
    ///   optimiser does not converge, the result is non-finite, or a world
    ///   point ends up behind the camera.
    pub fn solve(&self, correspondences: &CorrespondenceSet, image: ImageSize) -> Result<Calibration> {
        let n = correspondences.len();
        if n < MIN_CORRESPONDENCES {
            return Err(ValidationError::NotEnoughPoints {
                got: n,
                min: MIN_CORRESPONDENCES,
            }
            .into());
        }

        let k = intrinsic_prior(image);
        let distortion = RadialTangential4::default();
        let world = correspondences.points_3d();
        let pixels = correspondences.points_2d();

        let init = PnpSolver::initial_pose(world, pixels, &k).map_err(|e| {
            SpeedcamError::Calibration(format!(
                "no initial pose for {n} correspondences in a {image} image: {e}"
            ))
        })?;
        debug!("initial pose: t = {:?}", init.translation.vector);

        let camera = make_pinhole_camera(k, distortion);
        let refined = refine_pose(&camera, world, pixels, &init, &self.options)
            .map_err(|e| SpeedcamError::Calibration(e.to_string()))?;
        if !refined.report.converged {
            return Err(SpeedcamError::Calibration(format!(
                "pose refinement did not converge for {n} correspondences ({})",
                refined.report.termination
            )));
        }

        let pose = Pose::from_parts(
            k.k_matrix(),
            distortion,
            rvec_from_rotation(&refined.pose.rotation),
            refined.pose.translation.vector,
        )
        .ok_or_else(|| SpeedcamError::Calibration("solved pose is not finite".to_string()))?;

        let rms = pose.reprojection_rms(correspondences).ok_or_else(|| {
            SpeedcamError::Calibration(format!(
                "solved pose places some of the {n} world points behind the camera"
            ))
        })?;

        info!(
            "calibrated from {n} correspondences ({image}): rms {rms:.3} px, {} evaluations",
            refined.report.iterations
        );
        Ok(Calibration {
            pose,
            rms_reprojection_px: rms,
            iterations: refined.report.iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prior_follows_image_size() {
        let k = intrinsic_prior(ImageSize::new(1920, 1080).unwrap());
        assert_eq!(k.fx, 1920.0);
        assert_eq!(k.fy, 1080.0);
        assert_eq!(k.cx, 960.0);
        assert_eq!(k.cy, 540.0);
        assert_eq!(k.skew, 0.0);
    }

    #[test]
    fn prior_keeps_half_pixel_centre() {
        let k = intrinsic_prior(ImageSize::new(641, 481).unwrap());
        assert_eq!(k.cx, 320.5);
        assert_eq!(k.cy, 240.5);
    }
}
