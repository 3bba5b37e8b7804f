//! EPnP (Efficient Perspective-n-Point) solver.
//!
//! Control-point formulation: world points are written as barycentric
//! combinations of four control points placed along the principal axes of the
//! point cloud, and the control points are recovered in the camera frame from
//! the nullspace of a `2n x 12` system.

use super::planar::PLANARITY_RATIO;
use super::pose_utils::{normalized_rays, pose_from_points};
use super::{check_counts, PnpError};
use crate::math::{nullspace_vector, sorted_symmetric_eigen};
use nalgebra::DMatrix;
use speedcam_core::{FxFyCxCySkew, Iso3, Mat3, Pt2, Pt3, Real, Vec3};

/// EPnP pose estimation for 4+ non-coplanar points. Returns `T_C_W`.
pub fn epnp(world: &[Pt3], image: &[Pt2], k: &FxFyCxCySkew<Real>) -> Result<Iso3, PnpError> {
    check_counts(world, image, 4)?;
    let rays = normalized_rays(image, k)?;
    let n = world.len();

    let centroid = world.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords) / n as Real;
    let mut cov = Mat3::zeros();
    for p in world {
        let d = p.coords - centroid;
        cov += d * d.transpose();
    }
    cov /= n as Real;

    let (vals, axes) = sorted_symmetric_eigen(&cov);
    if vals[2] <= PLANARITY_RATIO * vals[0] {
        return Err(PnpError::DegeneratePoints);
    }
    let mut control_w = [centroid; 4];
    for i in 0..3 {
        control_w[i + 1] = centroid + axes[i] * vals[i].abs().sqrt();
    }

    let basis = Mat3::from_columns(&[
        control_w[1] - control_w[0],
        control_w[2] - control_w[0],
        control_w[3] - control_w[0],
    ]);
    let basis_inv = basis.try_inverse().ok_or(PnpError::DegeneratePoints)?;

    let alphas: Vec<[Real; 4]> = world
        .iter()
        .map(|p| {
            let c = basis_inv * (p.coords - control_w[0]);
            [1.0 - c.x - c.y - c.z, c.x, c.y, c.z]
        })
        .collect();

    let mut m = DMatrix::<Real>::zeros(2 * n, 12);
    for (i, (a, ray)) in alphas.iter().zip(&rays).enumerate() {
        let u = ray.x / ray.z;
        let v = ray.y / ray.z;
        for (j, &alpha) in a.iter().enumerate() {
            let c = 3 * j;
            m[(2 * i, c)] = alpha;
            m[(2 * i, c + 2)] = -u * alpha;
            m[(2 * i + 1, c + 1)] = alpha;
            m[(2 * i + 1, c + 2)] = -v * alpha;
        }
    }

    let sol = nullspace_vector(&m).ok_or(PnpError::SvdFailed)?;
    let mut control_c = [Vec3::zeros(); 4];
    for (j, cc) in control_c.iter_mut().enumerate() {
        *cc = Vec3::new(sol[3 * j], sol[3 * j + 1], sol[3 * j + 2]);
    }

    // Fix scale from inter-control-point distances.
    let mut sum_w = 0.0;
    let mut sum_c = 0.0;
    for i in 0..4 {
        for j in (i + 1)..4 {
            sum_w += (control_w[i] - control_w[j]).norm_squared();
            sum_c += (control_c[i] - control_c[j]).norm_squared();
        }
    }
    if sum_c <= Real::EPSILON {
        return Err(PnpError::DegeneratePoints);
    }
    let scale = (sum_w / sum_c).sqrt();

    let mut camera_pts: Vec<Vec3> = alphas
        .iter()
        .map(|a| {
            a.iter()
                .zip(&control_c)
                .fold(Vec3::zeros(), |acc, (&alpha, cc)| acc + cc * (alpha * scale))
        })
        .collect();

    // The nullspace sign is arbitrary; points must end up in front of the camera.
    let mean_z = camera_pts.iter().map(|p| p.z).sum::<Real>() / n as Real;
    if mean_z < 0.0 {
        camera_pts.iter_mut().for_each(|p| *p = -*p);
    }

    pose_from_points(world, &camera_pts)
}
