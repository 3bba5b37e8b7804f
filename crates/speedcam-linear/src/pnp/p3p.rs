//! P3P (Perspective-3-Point) minimal solver.
//!
//! Grunert-style elimination to a quartic in the depth ratio of the first two
//! points. Returns up to four candidate poses that must be disambiguated with
//! additional points.

use super::pose_utils::{normalized_rays, pose_from_points};
use super::{check_counts, PnpError};
use crate::math::solve_quartic_real;
use speedcam_core::{FxFyCxCySkew, Iso3, Pt2, Pt3, Real};

/// Multiply two degree-4 polynomials (truncate to degree 4).
fn poly_mul_1d(a: &[Real; 5], b: &[Real; 5]) -> [Real; 5] {
    let mut out = [0.0; 5];
    for i in 0..5 {
        for j in 0..(5 - i) {
            out[i + j] += a[i] * b[j];
        }
    }
    out
}

/// P3P minimal solver on exactly three non-collinear points.
///
/// Candidates are sorted by the depth of the first point.
pub fn p3p(world: &[Pt3], image: &[Pt2], k: &FxFyCxCySkew<Real>) -> Result<Vec<Iso3>, PnpError> {
    check_counts(world, image, 3)?;
    if world.len() != 3 {
        return Err(PnpError::DegeneratePoints);
    }

    let bearings: Vec<_> = normalized_rays(image, k)?
        .into_iter()
        .map(|v| v.normalize())
        .collect();

    let a = (world[1] - world[2]).norm();
    let b = (world[0] - world[2]).norm();
    let c = (world[0] - world[1]).norm();
    if a <= Real::EPSILON || b <= Real::EPSILON || c <= Real::EPSILON {
        return Err(PnpError::DegeneratePoints);
    }
    if (world[1] - world[0]).cross(&(world[2] - world[0])).norm() <= Real::EPSILON * a * b {
        return Err(PnpError::DegeneratePoints);
    }

    let cos_alpha = bearings[1].dot(&bearings[2]);
    let cos_beta = bearings[0].dot(&bearings[2]);
    let cos_gamma = bearings[0].dot(&bearings[1]);

    let c2 = c * c;
    let d = (b * b - a * a) / c2;
    let e = b * b / c2;

    let n_poly = [1.0 - d, 2.0 * d * cos_gamma, -(1.0 + d), 0.0, 0.0];
    let d_poly = [2.0 * cos_beta, -2.0 * cos_alpha, 0.0, 0.0, 0.0];
    let e_poly = [1.0 - e, 2.0 * e * cos_gamma, -e, 0.0, 0.0];

    let n2_poly = poly_mul_1d(&n_poly, &n_poly);
    let nd_poly = poly_mul_1d(&n_poly, &d_poly);
    let ed2_poly = poly_mul_1d(&e_poly, &poly_mul_1d(&d_poly, &d_poly));

    let coeffs: [Real; 5] =
        std::array::from_fn(|i| n2_poly[i] - 2.0 * cos_beta * nd_poly[i] + ed2_poly[i]);

    let roots = solve_quartic_real(coeffs[4], coeffs[3], coeffs[2], coeffs[1], coeffs[0]);

    let mut solutions = Vec::new();
    for u in roots {
        let den = 2.0 * (cos_beta - u * cos_alpha);
        if den.abs() < 1e-12 {
            continue;
        }
        let k_val = 1.0 + u * u - 2.0 * u * cos_gamma;
        if k_val.abs() < 1e-12 {
            continue;
        }

        let v = (n_poly[0] + n_poly[1] * u + n_poly[2] * u * u) / den;
        let x2 = c2 / k_val;
        if x2 <= 0.0 {
            continue;
        }
        let x = x2.sqrt();
        let (y, z) = (u * x, v * x);
        if y <= 0.0 || z <= 0.0 {
            continue;
        }

        let pts = [bearings[0] * x, bearings[1] * y, bearings[2] * z];
        if let Ok(pose) = pose_from_points(world, &pts) {
            solutions.push((x, pose));
        }
    }

    if solutions.is_empty() {
        return Err(PnpError::NoSolution);
    }
    solutions.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(solutions.into_iter().map(|(_, pose)| pose).collect())
}
