//! Concrete least-squares problems.

pub mod pnp_refine;
