use serde::{Deserialize, Serialize};
use speedcam_core::Real;

/// Robust loss kernels for iteratively re-weighted least squares (IRLS).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RobustKernel {
    /// Plain L2.
    #[default]
    None,
    /// Huber loss, quadratic up to `delta` pixels.
    Huber { delta: Real },
    /// Cauchy loss with scale `c` pixels.
    Cauchy { c: Real },
}

impl RobustKernel {
    /// IRLS weight `w(r)` for a squared residual `r²`.
    ///
    /// Residual and Jacobian rows are scaled by `sqrt(w)` before each
    /// linearised solve.
    pub fn weight(self, r2: Real) -> Real {
        match self {
            RobustKernel::None => 1.0,
            RobustKernel::Huber { delta } => {
                let r = r2.sqrt();
                if r <= delta {
                    1.0
                } else {
                    delta / r
                }
            }
            RobustKernel::Cauchy { c } => 1.0 / (1.0 + r2 / (c * c)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huber_is_quadratic_inside_threshold() {
        let kernel = RobustKernel::Huber { delta: 1.0 };
        assert_eq!(kernel.weight(0.25), 1.0);
        assert!((kernel.weight(25.0) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn cauchy_downweights_outliers() {
        let kernel = RobustKernel::Cauchy { c: 2.0 };
        assert!((kernel.weight(4.0) - 0.5).abs() < 1e-12);
        assert!(kernel.weight(400.0) < 0.01);
    }

    #[test]
    fn kernel_config_uses_tagged_json() {
        let kernel: RobustKernel = serde_json::from_str(r#"{"kind":"huber","delta":2.0}"#).unwrap();
        assert_eq!(kernel, RobustKernel::Huber { delta: 2.0 });
        let none: RobustKernel = serde_json::from_str(r#"{"kind":"none"}"#).unwrap();
        assert_eq!(none, RobustKernel::None);
    }
}
