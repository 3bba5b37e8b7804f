use nalgebra::{RealField, Vector2};
use serde::{Deserialize, Serialize};

pub trait DistortionModel<S: RealField + Copy> {
    fn distort(&self, n_undist: &Vector2<S>) -> Vector2<S>;
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct NoDistortion;

impl<S: RealField + Copy> DistortionModel<S> for NoDistortion {
    fn distort(&self, n_undist: &Vector2<S>) -> Vector2<S> {
        *n_undist
    }
}

/// Four-coefficient radial/tangential model `(k1, k2, p1, p2)`.
///
/// Coefficient order matches the `dist_coeffs` vector of persisted calibrations.
/// All-zero coefficients are the identity mapping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RadialTangential4<S: RealField + Copy> {
    pub k1: S,
    pub k2: S,
    pub p1: S,
    pub p2: S,
}

impl<S: RealField + Copy> Default for RadialTangential4<S> {
    fn default() -> Self {
        Self {
            k1: S::zero(),
            k2: S::zero(),
            p1: S::zero(),
            p2: S::zero(),
        }
    }
}

impl<S: RealField + Copy> RadialTangential4<S> {
    pub fn from_coeffs(c: [S; 4]) -> Self {
        Self {
            k1: c[0],
            k2: c[1],
            p1: c[2],
            p2: c[3],
        }
    }

    pub fn coeffs(&self) -> [S; 4] {
        [self.k1, self.k2, self.p1, self.p2]
    }
}

impl<S: RealField + Copy> DistortionModel<S> for RadialTangential4<S> {
    fn distort(&self, n_undist: &Vector2<S>) -> Vector2<S> {
        let (x, y) = (n_undist.x, n_undist.y);
        let r2 = x * x + y * y;
        let radial = S::one() + self.k1 * r2 + self.k2 * r2 * r2;

        let two = S::one() + S::one();
        let xy = x * y;
        let x_tan = two * self.p1 * xy + self.p2 * (r2 + two * x * x);
        let y_tan = self.p1 * (r2 + two * y * y) + two * self.p2 * xy;

        Vector2::new(x * radial + x_tan, y * radial + y_tan)
    }
}
