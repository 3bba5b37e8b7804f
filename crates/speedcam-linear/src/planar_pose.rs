use crate::math::nearest_rotation;
use crate::pnp::PnpError;
use nalgebra::{Rotation3, Translation3, UnitQuaternion};
use speedcam_core::{Iso3, Mat3, Real};

/// Linear pose initialisation from a homography and intrinsics.
///
/// This implements the classic decomposition of a plane-induced homography
/// `H` into a rotation and translation, assuming the target lies on the plane
/// `Z = 0` in its own coordinates.
#[derive(Debug, Clone, Copy)]
pub struct PlanarPoseSolver;

impl PlanarPoseSolver {
    /// Decompose a homography (plane -> image) into a pose `T_C_P` given intrinsics `K`.
    ///
    /// The sign of the homography is chosen so that the plane origin lies in
    /// front of the camera.
    pub fn from_homography(kmtx: &Mat3, hmtx: &Mat3) -> Result<Iso3, PnpError> {
        let k_inv = kmtx.try_inverse().ok_or(PnpError::SingularIntrinsics)?;

        let k_inv_h1 = k_inv * hmtx.column(0);
        let k_inv_h2 = k_inv * hmtx.column(1);
        let k_inv_h3 = k_inv * hmtx.column(2);

        // Scale factor λ: normalize first two columns (average for robustness)
        let norm_avg = (k_inv_h1.norm() + k_inv_h2.norm()) * 0.5;
        if norm_avg <= Real::EPSILON {
            return Err(PnpError::DegeneratePoints);
        }
        let mut lambda = 1.0 / norm_avg;
        if k_inv_h3.z * lambda < 0.0 {
            lambda = -lambda;
        }

        let r1 = k_inv_h1 * lambda;
        let r2 = k_inv_h2 * lambda;
        let r3 = r1.cross(&r2);

        let r_mat = Mat3::from_columns(&[r1, r2, r3]);
        let r_orth = nearest_rotation(&r_mat).ok_or(PnpError::SvdFailed)?;

        let t_vec = k_inv_h3 * lambda;
        let rot = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r_orth));
        Ok(Iso3::from_parts(Translation3::from(t_vec), rot))
    }
}

/// Estimate pose of a planar target (Z=0) relative to the camera, given
/// intrinsics K and homography H (plane -> image).
pub fn estimate_planar_pose_from_h(kmtx: &Mat3, hmtx: &Mat3) -> Result<Iso3, PnpError> {
    PlanarPoseSolver::from_homography(kmtx, hmtx)
}
