//! Deterministic synthetic data generation helpers.
//!
//! The helpers build simple roadside scenes: a camera mounted above a flat road
//! (world `z = 0`), looking along the world `+x` axis, with ground points laid
//! out on a grid. World axes: `x` along the road away from the camera, `y`
//! lateral, `z` up.
//!
//! # Example
//!
//! ```
//! use speedcam_core::{synthetic, FxFyCxCySkew, NoDistortion, Camera, Pinhole};
//!
//! let k = FxFyCxCySkew { fx: 1280.0, fy: 720.0, cx: 640.0, cy: 360.0, skew: 0.0 };
//! let cam = Camera::new(Pinhole, NoDistortion, k);
//! let pose = synthetic::roadside_pose(6.0, 0.2, 1.0);
//! let world = synthetic::ground_grid(&[15.0, 25.0, 35.0], &[0.0, 3.5, 7.0]);
//! let pixels = synthetic::project_all(&cam, &pose, &world).unwrap();
//! assert_eq!(pixels.len(), 9);
//! ```

pub mod noise;

use crate::{
    models::{DistortionModel, IntrinsicsModel, ProjectionModel},
    Camera, Iso3, Mat3, Pt2, Pt3, Real, Vec3,
};
use nalgebra::{Rotation3, Translation3, UnitQuaternion};

/// Pose `T_C_W` of a camera mounted `height_m` above the road at lateral offset
/// `lateral_m`, looking along `+x` and pitched down by `pitch_rad`.
pub fn roadside_pose(height_m: Real, pitch_rad: Real, lateral_m: Real) -> Iso3 {
    let (s, c) = pitch_rad.sin_cos();
    let forward = Vec3::new(c, 0.0, -s);
    let right = Vec3::new(0.0, -1.0, 0.0);
    let down = Vec3::new(-s, 0.0, -c);

    // Columns are the camera axes expressed in world coordinates.
    let r_wc = Mat3::from_columns(&[right, down, forward]);
    let r_cw = r_wc.transpose();
    let center = Vec3::new(0.0, lateral_m, height_m);
    let t = -(r_cw * center);

    let rot = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r_cw));
    Iso3::from_parts(Translation3::from(t), rot)
}

/// Ground-plane points (`z = 0`) for every `(x, y)` combination.
///
/// Ordered with `x` major: all lateral offsets at the first distance, then the next.
pub fn ground_grid(xs: &[Real], ys: &[Real]) -> Vec<Pt3> {
    let mut points = Vec::with_capacity(xs.len() * ys.len());
    for &x in xs {
        for &y in ys {
            points.push(Pt3::new(x, y, 0.0));
        }
    }
    points
}

/// Project world points into the image, requiring every point to be in front of the camera.
pub fn project_all<P, D, K>(
    camera: &Camera<Real, P, D, K>,
    cam_from_world: &Iso3,
    world: &[Pt3],
) -> Option<Vec<Pt2>>
where
    P: ProjectionModel<Real>,
    D: DistortionModel<Real>,
    K: IntrinsicsModel<Real>,
{
    world
        .iter()
        .map(|pw| {
            let pc = cam_from_world.transform_point(pw);
            camera.project_point(&pc).map(Pt2::from)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FxFyCxCySkew, NoDistortion, Pinhole};

    #[test]
    fn camera_center_sits_above_the_road() {
        let pose = roadside_pose(6.0, 0.25, 2.0);
        let center = pose.inverse().translation.vector;
        assert!((center - Vec3::new(0.0, 2.0, 6.0)).norm() < 1e-12);
    }

    #[test]
    fn farther_ground_points_appear_higher_in_the_image() {
        let k = FxFyCxCySkew {
            fx: 1280.0,
            fy: 720.0,
            cx: 640.0,
            cy: 360.0,
            skew: 0.0,
        };
        let cam = Camera::new(Pinhole, NoDistortion, k);
        let pose = roadside_pose(6.0, 0.2, 0.0);
        let px = project_all(&cam, &pose, &ground_grid(&[20.0, 40.0], &[3.5])).unwrap();
        assert!(px[0].y > px[1].y, "near {:?} should be below far {:?}", px[0], px[1]);
    }

    #[test]
    fn grid_order_is_x_major() {
        let pts = ground_grid(&[1.0, 2.0], &[0.0, 5.0]);
        assert_eq!(pts[1], Pt3::new(1.0, 5.0, 0.0));
        assert_eq!(pts[2], Pt3::new(2.0, 0.0, 0.0));
    }
}
