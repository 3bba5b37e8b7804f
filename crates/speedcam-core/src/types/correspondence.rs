//! 2D-3D point correspondences used to calibrate the camera pose.

use crate::{Pt2, Pt3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of correspondences accepted for a pose solve.
pub const MIN_CORRESPONDENCES: usize = 4;

/// Malformed or insufficient calibration input.
///
/// The caller must supply new input; retrying with the same data cannot succeed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Image and world point lists differ in length.
    #[error("number of 2D and 3D points must match: {points_2d} image vs {points_3d} world")]
    CountMismatch { points_2d: usize, points_3d: usize },
    /// Fewer correspondences than a pose solve needs.
    #[error("need at least {min} point correspondences, got {got}")]
    NotEnoughPoints { got: usize, min: usize },
    /// A coordinate is NaN or infinite.
    #[error("correspondence {index} has a non-finite coordinate")]
    NonFinite { index: usize },
    /// Image width or height is zero.
    #[error("image size must be positive, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },
}

/// Ordered, positionally matched pairs of image points (pixels) and world points (meters).
///
/// Point `i` of [`points_2d`](Self::points_2d) and [`points_3d`](Self::points_3d)
/// refer to the same physical feature. The set is immutable once built.
///
/// # Example
///
/// ```
/// use speedcam_core::{CorrespondenceSet, Pt2, Pt3};
///
/// let set = CorrespondenceSet::new(
///     vec![
///         Pt2::new(100.0, 600.0),
///         Pt2::new(1100.0, 600.0),
///         Pt2::new(900.0, 300.0),
///         Pt2::new(300.0, 300.0),
///     ],
///     vec![
///         Pt3::new(10.0, 0.0, 0.0),
///         Pt3::new(10.0, 7.0, 0.0),
///         Pt3::new(30.0, 7.0, 0.0),
///         Pt3::new(30.0, 0.0, 0.0),
///     ],
/// )
/// .unwrap();
/// assert_eq!(set.len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCorrespondences")]
pub struct CorrespondenceSet {
    points_2d: Vec<Pt2>,
    points_3d: Vec<Pt3>,
}

#[derive(Deserialize)]
struct RawCorrespondences {
    points_2d: Vec<Pt2>,
    points_3d: Vec<Pt3>,
}

impl TryFrom<RawCorrespondences> for CorrespondenceSet {
    type Error = ValidationError;

    fn try_from(raw: RawCorrespondences) -> Result<Self, Self::Error> {
        Self::new(raw.points_2d, raw.points_3d)
    }
}

impl CorrespondenceSet {
    /// Validate and build a correspondence set.
    ///
    /// # Errors
    ///
    /// [`ValidationError`] when counts differ, fewer than
    /// [`MIN_CORRESPONDENCES`] pairs are given, or a coordinate is not finite.
    pub fn new(points_2d: Vec<Pt2>, points_3d: Vec<Pt3>) -> Result<Self, ValidationError> {
        if points_2d.len() != points_3d.len() {
            return Err(ValidationError::CountMismatch {
                points_2d: points_2d.len(),
                points_3d: points_3d.len(),
            });
        }
        if points_2d.len() < MIN_CORRESPONDENCES {
            return Err(ValidationError::NotEnoughPoints {
                got: points_2d.len(),
                min: MIN_CORRESPONDENCES,
            });
        }
        let finite = |v: &[f64]| v.iter().all(|c| c.is_finite());
        for (index, (p2, p3)) in points_2d.iter().zip(points_3d.iter()).enumerate() {
            if !finite(p2.coords.as_slice()) || !finite(p3.coords.as_slice()) {
                return Err(ValidationError::NonFinite { index });
            }
        }
        Ok(Self {
            points_2d,
            points_3d,
        })
    }

    /// Image points in pixels.
    pub fn points_2d(&self) -> &[Pt2] {
        &self.points_2d
    }

    /// World points in meters.
    pub fn points_3d(&self) -> &[Pt3] {
        &self.points_3d
    }

    /// Number of correspondences (always at least [`MIN_CORRESPONDENCES`]).
    #[inline]
    pub fn len(&self) -> usize {
        self.points_2d.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points_2d.is_empty()
    }

    /// Iterate over `(image, world)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Pt2, &Pt3)> {
        self.points_2d.iter().zip(self.points_3d.iter())
    }
}
