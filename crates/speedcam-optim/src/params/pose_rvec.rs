//! Pose as a 6-vector `[rx, ry, rz, tx, ty, tz]` (rotation vector + translation).

use nalgebra::{DVector, DVectorView};
use speedcam_core::{iso_from_rvec_tvec, rvec_from_rotation, Iso3, Vec3};

/// Length of a pose parameter vector.
pub const POSE_DIM: usize = 6;

/// Pack `T_C_W` into `[rvec, tvec]`.
pub fn iso_to_pose_vec(pose: &Iso3) -> DVector<f64> {
    let r = rvec_from_rotation(&pose.rotation);
    let t = pose.translation.vector;
    nalgebra::dvector![r.x, r.y, r.z, t.x, t.y, t.z]
}

/// Unpack `[rvec, tvec]`; `None` when the slice has the wrong length.
pub fn pose_vec_to_iso(v: DVectorView<'_, f64>) -> Option<Iso3> {
    if v.len() != POSE_DIM {
        return None;
    }
    let rvec = Vec3::new(v[0], v[1], v[2]);
    let tvec = Vec3::new(v[3], v[4], v[5]);
    Some(iso_from_rvec_tvec(&rvec, &tvec))
}
