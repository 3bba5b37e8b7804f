//! Mathematical utilities and type definitions.
//!
//! This module provides fundamental types used throughout the workspace and
//! the rotation-vector (Rodrigues) conversions used by persisted poses.

use nalgebra::{
    Isometry3, Matrix3, Matrix4, Point2, Point3, Translation3, UnitQuaternion, Vector2, Vector3,
};

/// Scalar type used throughout the library (currently `f64`).
pub type Real = f64;

/// 2D vector with [`Real`] components.
pub type Vec2 = Vector2<Real>;
/// 3D vector with [`Real`] components.
pub type Vec3 = Vector3<Real>;
/// 2D point with [`Real`] coordinates.
pub type Pt2 = Point2<Real>;
/// 3D point with [`Real`] coordinates.
pub type Pt3 = Point3<Real>;
/// 3×3 matrix with [`Real`] entries.
pub type Mat3 = Matrix3<Real>;
/// 4×4 matrix with [`Real`] entries.
pub type Mat4 = Matrix4<Real>;
/// 3D rigid transform (SE(3)) using [`Real`].
pub type Iso3 = Isometry3<Real>;

/// Convert a 2D point in Euclidean coordinates into homogeneous coordinates.
pub fn to_homogeneous(p: &Pt2) -> Vec3 {
    Vec3::new(p.x, p.y, 1.0)
}

/// Convert a 3D homogeneous vector back to a 2D point.
///
/// The caller is responsible for ensuring that `w != 0`.
pub fn from_homogeneous(v: &Vec3) -> Pt2 {
    Pt2::new(v.x / v.z, v.y / v.z)
}

/// Rotation from a rotation vector (axis scaled by angle in radians).
pub fn rotation_from_rvec(rvec: &Vec3) -> UnitQuaternion<Real> {
    UnitQuaternion::from_scaled_axis(*rvec)
}

/// Rotation vector (axis scaled by angle in radians) of a rotation.
pub fn rvec_from_rotation(rotation: &UnitQuaternion<Real>) -> Vec3 {
    rotation.scaled_axis()
}

/// Build `T_C_W` from a rotation vector and a translation.
pub fn iso_from_rvec_tvec(rvec: &Vec3, tvec: &Vec3) -> Iso3 {
    Iso3::from_parts(Translation3::from(*tvec), rotation_from_rvec(rvec))
}

/// Angle (radians) of the relative rotation between two poses.
pub fn rotation_angle_between(a: &Iso3, b: &Iso3) -> Real {
    a.rotation.angle_to(&b.rotation)
}
