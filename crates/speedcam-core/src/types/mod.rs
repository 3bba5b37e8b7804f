//! Validated input types shared by the calibration and measurement crates.

mod correspondence;
mod image;

pub use correspondence::*;
pub use image::*;
