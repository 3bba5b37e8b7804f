//! Pose recovery and scoring helpers shared by the PnP solvers.

use super::PnpError;
use crate::math::nearest_rotation;
use speedcam_core::{FxFyCxCySkew, Iso3, Mat3, Pt2, Pt3, Real, Vec3};
use nalgebra::{Isometry3, Rotation3, Translation3, UnitQuaternion, Vector3};

/// Recover camera pose from corresponding world and camera-frame points.
///
/// Kabsch alignment: rotation from the SVD of the cross-covariance, then the
/// translation between centroids. Returns `T_C_W`.
pub(super) fn pose_from_points(world: &[Pt3], camera: &[Vec3]) -> Result<Iso3, PnpError> {
    if world.len() != camera.len() || world.len() < 3 {
        return Err(PnpError::DegeneratePoints);
    }

    let n = world.len() as Real;
    let c_w = world.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords) / n;
    let c_c = camera.iter().fold(Vec3::zeros(), |acc, p| acc + p) / n;

    let mut h = Mat3::zeros();
    for (pw, pc) in world.iter().zip(camera) {
        h += (pc - c_c) * (pw.coords - c_w).transpose();
    }

    let r = nearest_rotation(&h).ok_or(PnpError::SvdFailed)?;
    let t = c_c - r * c_w;
    let rot = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r));
    Ok(Isometry3::from_parts(Translation3::from(t), rot))
}

/// Convert pixels into normalized image coordinates `K⁻¹ [u, v, 1]`.
pub(super) fn normalized_rays(
    image: &[Pt2],
    k: &FxFyCxCySkew<Real>,
) -> Result<Vec<Vec3>, PnpError> {
    let k_inv = k.k_matrix().try_inverse().ok_or(PnpError::SingularIntrinsics)?;
    Ok(image
        .iter()
        .map(|p| k_inv * Vector3::new(p.x, p.y, 1.0))
        .collect())
}

/// Pixel RMS reprojection error of `pose` with a distortion-free pinhole.
///
/// Returns `None` when any world point lies on or behind the camera plane.
pub fn reprojection_rms(
    pose: &Iso3,
    world: &[Pt3],
    image: &[Pt2],
    k: &FxFyCxCySkew<Real>,
) -> Option<Real> {
    if world.is_empty() || world.len() != image.len() {
        return None;
    }
    let kmtx = k.k_matrix();
    let mut sum_sq = 0.0;
    for (pw, pi) in world.iter().zip(image) {
        let pc = pose.transform_point(pw);
        if pc.z <= Real::EPSILON {
            return None;
        }
        let uv = kmtx * (pc.coords / pc.z);
        sum_sq += (uv.x - pi.x).powi(2) + (uv.y - pi.y).powi(2);
    }
    let rms = (sum_sq / world.len() as Real).sqrt();
    rms.is_finite().then_some(rms)
}
