//! Direct Linear Transform (DLT) solver for camera pose estimation.
//!
//! Linear least-squares solve of `[R | t]` from homogeneous equations in
//! normalized image coordinates. The rotation block is projected onto SO(3).

use super::pose_utils::normalized_rays;
use super::{check_counts, PnpError};
use crate::math::{nearest_rotation, nullspace_vector};
use nalgebra::{DMatrix, Isometry3, Matrix3x4, Rotation3, Translation3, UnitQuaternion};
use speedcam_core::{FxFyCxCySkew, Iso3, Mat4, Pt2, Pt3, Real, Vec3};

/// Direct linear PnP on all input points.
///
/// `world` are 3D points in world coordinates, `image` are their pixel
/// positions, and `k` are the camera intrinsics. Requires 6+ non-coplanar
/// points. Returns `T_C_W`.
pub fn dlt(world: &[Pt3], image: &[Pt2], k: &FxFyCxCySkew<Real>) -> Result<Iso3, PnpError> {
    check_counts(world, image, 6)?;
    let rays = normalized_rays(image, k)?;

    let n = world.len();
    let n_real = n as Real;
    let c = world.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords) / n_real;
    let mean_dist = world.iter().map(|p| (p.coords - c).norm()).sum::<Real>() / n_real;
    if mean_dist <= Real::EPSILON {
        return Err(PnpError::DegeneratePoints);
    }

    let scale = (3.0_f64).sqrt() / mean_dist;
    #[rustfmt::skip]
    let t_world = Mat4::new(
        scale, 0.0, 0.0, -scale * c.x,
        0.0, scale, 0.0, -scale * c.y,
        0.0, 0.0, scale, -scale * c.z,
        0.0, 0.0, 0.0, 1.0,
    );

    // 2n x 12 system for P = [R | t] acting on normalized world points.
    let mut a = DMatrix::<Real>::zeros(2 * n, 12);
    for (i, (pw, ray)) in world.iter().zip(&rays).enumerate() {
        let d = (pw.coords - c) * scale;
        let xw = [d.x, d.y, d.z, 1.0];
        let u = ray.x / ray.z;
        let v = ray.y / ray.z;

        let r0 = 2 * i;
        let r1 = r0 + 1;
        for (j, &x) in xw.iter().enumerate() {
            a[(r0, j)] = x;
            a[(r0, 8 + j)] = -u * x;
            a[(r1, 4 + j)] = x;
            a[(r1, 8 + j)] = -v * x;
        }
    }

    let sol = nullspace_vector(&a).ok_or(PnpError::SvdFailed)?;
    let p_norm = Matrix3x4::from_row_slice(sol.as_slice());
    let p_mtx = p_norm * t_world;

    let m = p_mtx.fixed_view::<3, 3>(0, 0).into_owned();
    let mut s = (m.row(0).norm() + m.row(1).norm() + m.row(2).norm()) / 3.0;
    if s <= Real::EPSILON {
        return Err(PnpError::DegeneratePoints);
    }
    if m.determinant() < 0.0 {
        s = -s;
    }

    let r_orth = nearest_rotation(&(m / s)).ok_or(PnpError::SvdFailed)?;
    let t: Vec3 = p_mtx.column(3).into_owned() / s;

    let rot = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r_orth));
    Ok(Isometry3::from_parts(Translation3::from(t), rot))
}
