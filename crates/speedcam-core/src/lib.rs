//! Core math and geometry primitives for `speedcam-rs`.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec2`, `Pt3`, ...) and rotation-vector helpers,
//! - composable camera models (projection + distortion + intrinsics),
//! - validated input types ([`CorrespondenceSet`], [`ImageSize`]),
//! - deterministic synthetic data helpers for tests.
//!
//! Camera pipeline:
//! `pixel = K ∘ distortion ∘ projection(dir)`

/// Linear algebra type aliases and helpers.
pub mod math;
/// Camera models and distortion utilities.
pub mod models;
/// Deterministic synthetic data generation helpers.
///
/// Used by workspace tests to build ground-plane scenes with known poses.
pub mod synthetic;
/// Validated calibration inputs.
pub mod types;

pub use math::*;
pub use models::*;
pub use types::*;

/// Pinhole camera with the four-coefficient distortion model used by speed calibration.
pub type PinholeCamera = Camera<Real, Pinhole, RadialTangential4<Real>, FxFyCxCySkew<Real>>;

/// Build a [`PinholeCamera`] from intrinsics and distortion.
pub fn make_pinhole_camera(k: FxFyCxCySkew<Real>, dist: RadialTangential4<Real>) -> PinholeCamera {
    Camera::new(Pinhole, dist, k)
}
