//! Non-linear refinement for speedcam-rs.
//!
//! The crate is split into:
//! - [`NllsProblem`]: a dense residual/Jacobian interface,
//! - [`LmBackend`]: a Levenberg–Marquardt solver backend,
//! - [`problems`]: concrete problems, currently iterative PnP refinement.

mod backend_lm;
pub mod jacobian;
pub mod params;
pub mod problems;
mod robust;
mod traits;

pub use backend_lm::LmBackend;
pub use problems::pnp_refine::{refine_pose, PnpRefineOptions, PnpRefineResult, RefineError};
pub use robust::RobustKernel;
pub use traits::{NllsProblem, NllsSolverBackend, SolveOptions, SolveReport};
