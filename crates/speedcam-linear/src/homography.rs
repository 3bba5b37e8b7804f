use crate::math::{normalize_points_2d, nullspace_vector};
use nalgebra::DMatrix;
use speedcam_core::{Mat3, Pt2};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HomographyError {
    #[error("need at least 4 point correspondences, got {0}")]
    NotEnoughPoints(usize),
    #[error("degenerate point configuration")]
    Degenerate,
    #[error("eigen decomposition failed")]
    SolveFailed,
}

/// Estimate `H` such that `x' ~ H x` using the normalized DLT.
///
/// Both point sets are Hartley-normalized before the solve; the result is
/// de-normalized and scaled so that `H[2,2] = 1` when that entry is non-zero.
pub fn dlt_homography(world: &[Pt2], image: &[Pt2]) -> Result<Mat3, HomographyError> {
    let n = world.len();
    if n < 4 || image.len() != n {
        return Err(HomographyError::NotEnoughPoints(n.min(image.len())));
    }

    let (world_n, t_world) = normalize_points_2d(world).ok_or(HomographyError::Degenerate)?;
    let (image_n, t_image) = normalize_points_2d(image).ok_or(HomographyError::Degenerate)?;

    let mut a = DMatrix::<f64>::zeros(2 * n, 9);

    for (i, (pw, pi)) in world_n.iter().zip(image_n.iter()).enumerate() {
        let x = pw.x;
        let y = pw.y;
        let u = pi.x;
        let v = pi.y;

        let r0 = 2 * i;
        let r1 = 2 * i + 1;

        a[(r0, 0)] = -x;
        a[(r0, 1)] = -y;
        a[(r0, 2)] = -1.0;
        a[(r0, 6)] = u * x;
        a[(r0, 7)] = u * y;
        a[(r0, 8)] = u;

        a[(r1, 3)] = -x;
        a[(r1, 4)] = -y;
        a[(r1, 5)] = -1.0;
        a[(r1, 6)] = v * x;
        a[(r1, 7)] = v * y;
        a[(r1, 8)] = v;
    }

    let h = nullspace_vector(&a).ok_or(HomographyError::SolveFailed)?;
    let h_norm = Mat3::from_row_slice(h.as_slice());

    let t_image_inv = t_image
        .try_inverse()
        .ok_or(HomographyError::Degenerate)?;
    let mut h_mat = t_image_inv * h_norm * t_world;

    let scale = h_mat[(2, 2)];
    if scale.abs() > f64::EPSILON {
        h_mat /= scale;
    }

    Ok(h_mat)
}
