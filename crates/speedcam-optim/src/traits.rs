use nalgebra::{DMatrix, DVector};
use speedcam_core::Real;

/// Dense least-squares problem `min ½ Σ (w_i r_i(x))²`.
///
/// Implementors provide raw residuals and their Jacobian. Robust losses plug
/// in through [`NllsProblem::row_weights`]: each row is scaled by a weight
/// computed from the raw residuals and held constant for differentiation.
pub trait NllsProblem {
    fn num_params(&self) -> usize;
    fn num_residuals(&self) -> usize;

    fn raw_residuals(&self, x: &DVector<Real>) -> DVector<Real>;
    fn raw_jacobian(&self, x: &DVector<Real>) -> DMatrix<Real>;

    /// Row scales `sqrt(w_i)` for the raw residuals `r`; `None` when unweighted.
    fn row_weights(&self, _r: &DVector<Real>) -> Option<DVector<Real>> {
        None
    }

    fn residuals(&self, x: &DVector<Real>) -> DVector<Real> {
        let r = self.raw_residuals(x);
        match self.row_weights(&r) {
            Some(w) => r.component_mul(&w),
            None => r,
        }
    }

    fn jacobian(&self, x: &DVector<Real>) -> DMatrix<Real> {
        let mut j = self.raw_jacobian(x);
        if let Some(w) = self.row_weights(&self.raw_residuals(x)) {
            for (mut row, s) in j.row_iter_mut().zip(w.iter()) {
                row *= *s;
            }
        }
        j
    }

    /// `½ ‖r(x)‖²` of the weighted residuals.
    fn cost(&self, x: &DVector<Real>) -> Real {
        0.5 * self.residuals(x).norm_squared()
    }
}

/// Stopping criteria for a solve.
#[derive(Debug, Clone, Copy)]
pub struct SolveOptions {
    /// Iteration budget; the LM backend turns it into an evaluation cap of
    /// `max_iters * (n + 1)`.
    pub max_iters: usize,
    pub ftol: Real,
    pub gtol: Real,
    pub xtol: Real,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_iters: 200,
            ftol: 1e-10,
            gtol: 1e-10,
            xtol: 1e-10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolveReport {
    /// Residual evaluations performed.
    pub iterations: usize,
    pub final_cost: Real,
    pub converged: bool,
    pub termination: String,
}

/// A solver that minimises an [`NllsProblem`] from a starting point.
pub trait NllsSolverBackend {
    fn solve<P: NllsProblem>(
        &self,
        problem: &P,
        x0: DVector<Real>,
        opts: &SolveOptions,
    ) -> (DVector<Real>, SolveReport);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// r(x) = [x0 - 1, 10 (x1 + 2)], second row down-weighted by 1/2.
    struct Weighted;

    impl NllsProblem for Weighted {
        fn num_params(&self) -> usize {
            2
        }
        fn num_residuals(&self) -> usize {
            2
        }
        fn raw_residuals(&self, x: &DVector<Real>) -> DVector<Real> {
            DVector::from_vec(vec![x[0] - 1.0, 10.0 * (x[1] + 2.0)])
        }
        fn raw_jacobian(&self, _x: &DVector<Real>) -> DMatrix<Real> {
            DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 10.0])
        }
        fn row_weights(&self, _r: &DVector<Real>) -> Option<DVector<Real>> {
            Some(DVector::from_vec(vec![1.0, 0.5]))
        }
    }

    #[test]
    fn weights_scale_residual_and_jacobian_rows() {
        let x = DVector::from_vec(vec![3.0, 0.0]);
        assert_eq!(Weighted.residuals(&x).as_slice(), &[2.0, 10.0]);
        assert_eq!(Weighted.jacobian(&x), DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 5.0]));
        assert_eq!(Weighted.cost(&x), 52.0);
    }
}
