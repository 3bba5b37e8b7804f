use nalgebra::{Matrix3, RealField, Vector2};
use serde::{Deserialize, Serialize};

/// Intrinsics that map normalized image-plane coordinates to pixel coordinates.
pub trait IntrinsicsModel<S: RealField + Copy> {
    /// Convert image-plane coordinates into pixel coordinates.
    fn sensor_to_pixel(&self, sensor: &Vector2<S>) -> Vector2<S>;
}

/// Standard pinhole intrinsics with optional skew.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FxFyCxCySkew<S: RealField + Copy> {
    /// Focal length in pixels along X.
    pub fx: S,
    /// Focal length in pixels along Y.
    pub fy: S,
    /// Principal point X coordinate in pixels.
    pub cx: S,
    /// Principal point Y coordinate in pixels.
    pub cy: S,
    /// Skew term (typically 0).
    pub skew: S,
}

impl<S: RealField + Copy> FxFyCxCySkew<S> {
    /// Return the 3x3 camera intrinsics matrix K.
    pub fn k_matrix(&self) -> Matrix3<S> {
        Matrix3::new(
            self.fx,
            self.skew,
            self.cx,
            S::zero(),
            self.fy,
            self.cy,
            S::zero(),
            S::zero(),
            S::one(),
        )
    }

    /// Read intrinsics back from an upper-triangular K matrix.
    ///
    /// The matrix is normalized by `K[2,2]`; returns `None` when that entry is zero.
    pub fn from_k_matrix(k: &Matrix3<S>) -> Option<Self> {
        let w = k[(2, 2)];
        if w == S::zero() {
            return None;
        }
        Some(Self {
            fx: k[(0, 0)] / w,
            fy: k[(1, 1)] / w,
            cx: k[(0, 2)] / w,
            cy: k[(1, 2)] / w,
            skew: k[(0, 1)] / w,
        })
    }
}

impl<S: RealField + Copy> IntrinsicsModel<S> for FxFyCxCySkew<S> {
    fn sensor_to_pixel(&self, sensor: &Vector2<S>) -> Vector2<S> {
        let u = self.fx * sensor.x + self.skew * sensor.y + self.cx;
        let v = self.fy * sensor.y + self.cy;
        Vector2::new(u, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn k_matrix_roundtrip() {
        let k = FxFyCxCySkew {
            fx: 1920.0,
            fy: 1080.0,
            cx: 960.0,
            cy: 540.0,
            skew: 0.5,
        };
        let back = FxFyCxCySkew::from_k_matrix(&k.k_matrix()).unwrap();
        assert_eq!(back, k);
    }
}
