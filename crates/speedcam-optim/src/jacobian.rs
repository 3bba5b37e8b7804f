//! Finite-difference Jacobians.

use nalgebra::{DMatrix, DVector};
use speedcam_core::Real;

/// Central-difference Jacobian of `f` at `x`.
///
/// The step for parameter `i` is `rel_step * max(1, |x_i|)`.
pub fn central_difference<F>(f: F, x: &DVector<Real>, num_residuals: usize, rel_step: Real) -> DMatrix<Real>
where
    F: Fn(&DVector<Real>) -> DVector<Real>,
{
    let mut jac = DMatrix::zeros(num_residuals, x.len());
    let mut xp = x.clone();
    for i in 0..x.len() {
        let h = rel_step * x[i].abs().max(1.0);
        xp[i] = x[i] + h;
        let fp = f(&xp);
        xp[i] = x[i] - h;
        let fm = f(&xp);
        xp[i] = x[i];
        jac.set_column(i, &((fp - fm) / (2.0 * h)));
    }
    jac
}
