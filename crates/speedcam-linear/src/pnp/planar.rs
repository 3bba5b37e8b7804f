//! Pose of coplanar world points.
//!
//! The points are expressed in a plane frame spanned by the two dominant
//! principal axes, a plane-to-image homography is estimated, and the
//! homography is decomposed into `T_C_P`. The world pose follows as
//! `T_C_W = T_C_P * T_P_W`.

use super::{check_counts, PnpError};
use crate::homography::dlt_homography;
use crate::math::sorted_symmetric_eigen;
use crate::planar_pose::PlanarPoseSolver;
use nalgebra::{Isometry3, Rotation3, Translation3, UnitQuaternion};
use speedcam_core::{FxFyCxCySkew, Iso3, Mat3, Pt2, Pt3, Real, Vec3};

/// Smallest/largest covariance eigenvalue ratio below which points count as coplanar.
pub(super) const PLANARITY_RATIO: Real = 1e-6;

fn principal_axes(world: &[Pt3]) -> (Vec3, [Real; 3], [Vec3; 3]) {
    let n = world.len().max(1) as Real;
    let centroid = world.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords) / n;
    let mut cov = Mat3::zeros();
    for p in world {
        let d = p.coords - centroid;
        cov += d * d.transpose();
    }
    let (vals, axes) = sorted_symmetric_eigen(&(cov / n));
    (centroid, vals, axes)
}

/// Whether the world points lie (numerically) on a single plane.
pub fn is_coplanar(world: &[Pt3]) -> bool {
    if world.len() < 3 {
        return true;
    }
    let (_, vals, _) = principal_axes(world);
    vals[2] <= PLANARITY_RATIO * vals[0]
}

/// Planar PnP for 4+ coplanar points (no three collinear). Returns `T_C_W`.
pub fn planar(world: &[Pt3], image: &[Pt2], k: &FxFyCxCySkew<Real>) -> Result<Iso3, PnpError> {
    check_counts(world, image, 4)?;

    let (centroid, vals, axes) = principal_axes(world);
    if vals[1] <= PLANARITY_RATIO * vals[0] {
        return Err(PnpError::DegeneratePoints);
    }

    // Plane frame: x, y along the dominant axes, z as their cross product.
    let ex = axes[0];
    let ey = axes[1];
    let ez = ex.cross(&ey);
    let r_w_p = Mat3::from_columns(&[ex, ey, ez]);
    let r_p_w = r_w_p.transpose();

    let plane_pts: Vec<Pt2> = world
        .iter()
        .map(|p| {
            let q = r_p_w * (p.coords - centroid);
            Pt2::new(q.x, q.y)
        })
        .collect();

    let h = dlt_homography(&plane_pts, image)?;
    let t_c_p = PlanarPoseSolver::from_homography(&k.k_matrix(), &h)?;

    let rot_p_w = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r_p_w));
    let t_p_w = Isometry3::from_parts(Translation3::from(-(r_p_w * centroid)), rot_p_w);
    Ok(t_c_p * t_p_w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use speedcam_core::synthetic::{ground_grid, project_all, roadside_pose};
    use speedcam_core::{rotation_angle_between, Camera, NoDistortion, Pinhole};

    #[test]
    fn ground_plane_is_coplanar() {
        let world = ground_grid(&[10.0, 20.0, 30.0], &[-2.0, 2.0]);
        assert!(is_coplanar(&world));

        let mut lifted = world.clone();
        lifted.push(Pt3::new(15.0, 0.0, 1.5));
        assert!(!is_coplanar(&lifted));
    }

    #[test]
    fn planar_recovers_roadside_pose() {
        let k = FxFyCxCySkew {
            fx: 1280.0,
            fy: 720.0,
            cx: 640.0,
            cy: 360.0,
            skew: 0.0,
        };
        let cam = Camera::new(Pinhole, NoDistortion, k);
        let pose_gt = roadside_pose(6.0, 0.15, -4.0);
        let world = ground_grid(&[12.0, 25.0, 40.0], &[-3.0, 0.5, 4.0]);
        let image = project_all(&cam, &pose_gt, &world).unwrap();

        let est = planar(&world, &image, &k).unwrap();
        let dt = (est.translation.vector - pose_gt.translation.vector).norm();
        assert!(dt < 1e-5, "translation error too large: {}", dt);
        assert!(rotation_angle_between(&est, &pose_gt) < 1e-6);
    }

    #[test]
    fn planar_works_for_tilted_plane() {
        let k = FxFyCxCySkew {
            fx: 800.0,
            fy: 800.0,
            cx: 400.0,
            cy: 300.0,
            skew: 0.0,
        };
        let cam = Camera::new(Pinhole, NoDistortion, k);
        let pose_gt = Isometry3::from_parts(
            Translation3::new(0.2, -0.1, 5.0),
            Rotation3::from_euler_angles(0.2, 0.1, -0.05).into(),
        );
        // Points on the plane x + z = 1.
        let world: Vec<Pt3> = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0), (0.5, 0.3)]
            .iter()
            .map(|&(x, y)| Pt3::new(x, y, 1.0 - x))
            .collect();
        let image = project_all(&cam, &pose_gt, &world).unwrap();

        let est = planar(&world, &image, &k).unwrap();
        assert!((est.translation.vector - pose_gt.translation.vector).norm() < 1e-5);
        assert!(rotation_angle_between(&est, &pose_gt) < 1e-6);
    }
}
