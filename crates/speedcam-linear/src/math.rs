//! Numeric helpers shared by the linear solvers.

use nalgebra::{DMatrix, DVector, Schur};
use speedcam_core::{Mat3, Pt2, Real, Vec3};

/// Hartley normalization of 2D points.
///
/// Translates the centroid to the origin and scales so the mean distance to
/// it is `sqrt(2)`. Returns the normalized points and the transform `T` with
/// `p_norm = T * p`, or `None` when all points coincide.
pub fn normalize_points_2d(points: &[Pt2]) -> Option<(Vec<Pt2>, Mat3)> {
    if points.is_empty() {
        return None;
    }

    let n = points.len() as Real;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let cx = sx / n;
    let cy = sy / n;

    let mean_dist = points
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<Real>()
        / n;

    if mean_dist <= Real::EPSILON {
        return None;
    }

    let scale = (2.0_f64).sqrt() / mean_dist;
    let t = Mat3::new(
        scale,
        0.0,
        -scale * cx,
        0.0,
        scale,
        -scale * cy,
        0.0,
        0.0,
        1.0,
    );

    let norm = points
        .iter()
        .map(|p| Pt2::new((p.x - cx) * scale, (p.y - cy) * scale))
        .collect();

    Some((norm, t))
}

/// Unit vector minimising `|A x|`.
///
/// Uses the eigenvector of `AᵀA` for the smallest eigenvalue, which stays
/// correct when `A` has fewer rows than columns (a thin SVD would not expose
/// the full right nullspace in that case).
pub fn nullspace_vector(a: &DMatrix<Real>) -> Option<DVector<Real>> {
    let ata = a.transpose() * a;
    let eig = ata.symmetric_eigen();
    let (min_idx, _) = eig
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|(_, x), (_, y)| x.total_cmp(y))?;
    let v: DVector<Real> = eig.eigenvectors.column(min_idx).into_owned();
    if v.iter().all(|c| c.is_finite()) {
        Some(v)
    } else {
        None
    }
}

/// Eigen-decomposition of a symmetric 3x3 matrix, sorted by descending eigenvalue.
pub fn sorted_symmetric_eigen(m: &Mat3) -> ([Real; 3], [Vec3; 3]) {
    let eig = m.symmetric_eigen();
    let mut order = [0usize, 1, 2];
    order.sort_by(|&i, &j| eig.eigenvalues[j].total_cmp(&eig.eigenvalues[i]));
    let values = order.map(|i| eig.eigenvalues[i]);
    let vectors = order.map(|i| eig.eigenvectors.column(i).into_owned());
    (values, vectors)
}

/// Project a 3x3 matrix onto SO(3) (polar decomposition via SVD).
pub fn nearest_rotation(m: &Mat3) -> Option<Mat3> {
    let svd = m.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        let mut u_flipped = u;
        u_flipped.column_mut(2).neg_mut();
        r = u_flipped * v_t;
    }
    Some(r)
}

/// Solve `ax² + bx + c = 0` for real roots (ascending).
pub fn solve_quadratic_real(a: Real, b: Real, c: Real) -> Vec<Real> {
    let eps = 1e-12;
    if a.abs() < eps {
        if b.abs() < eps {
            return Vec::new();
        }
        return vec![-c / b];
    }
    let disc = b * b - 4.0 * a * c;
    if disc.abs() < eps {
        return vec![-b / (2.0 * a)];
    }
    if disc < 0.0 {
        return Vec::new();
    }
    let sqrt_disc = disc.sqrt();
    let r1 = (-b + sqrt_disc) / (2.0 * a);
    let r2 = (-b - sqrt_disc) / (2.0 * a);
    let mut roots = vec![r1.min(r2), r1.max(r2)];
    roots.dedup_by(|x, y| (*x - *y).abs() < 1e-8);
    roots
}

/// Solve `ax³ + bx² + cx + d = 0` for real roots (ascending, deduplicated).
///
/// Cardano's formula on the depressed cubic.
pub fn solve_cubic_real(a: Real, b: Real, c: Real, d: Real) -> Vec<Real> {
    let eps = 1e-12;
    if a.abs() < eps {
        return solve_quadratic_real(b, c, d);
    }

    let b = b / a;
    let c = c / a;
    let d = d / a;

    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;

    let disc = (q * 0.5) * (q * 0.5) + (p / 3.0) * (p / 3.0) * (p / 3.0);
    let shift = b / 3.0;

    let mut roots = Vec::new();
    if disc > eps {
        let sqrt_disc = disc.sqrt();
        roots.push((-q * 0.5 + sqrt_disc).cbrt() + (-q * 0.5 - sqrt_disc).cbrt() - shift);
    } else if disc.abs() <= eps {
        let u = (-q * 0.5).cbrt();
        roots.push(2.0 * u - shift);
        roots.push(-u - shift);
    } else {
        let r = (-p / 3.0).sqrt();
        let phi = ((-q * 0.5) / (r * r * r)).clamp(-1.0, 1.0).acos();
        let two_r = 2.0 * r;
        for k in 0..3 {
            let angle = (phi + 2.0 * std::f64::consts::PI * k as Real) / 3.0;
            roots.push(two_r * angle.cos() - shift);
        }
    }

    roots.sort_by(|x, y| x.total_cmp(y));
    roots.dedup_by(|x, y| (*x - *y).abs() < 1e-8);
    roots
}

/// Solve `ax⁴ + bx³ + cx² + dx + e = 0` for real roots (ascending, deduplicated).
///
/// Real eigenvalues of the companion matrix.
pub fn solve_quartic_real(a: Real, b: Real, c: Real, d: Real, e: Real) -> Vec<Real> {
    let eps = 1e-12;
    if a.abs() < eps {
        return solve_cubic_real(b, c, d, e);
    }

    let mut comp = DMatrix::<Real>::zeros(4, 4);
    comp[(0, 0)] = -b / a;
    comp[(0, 1)] = -c / a;
    comp[(0, 2)] = -d / a;
    comp[(0, 3)] = -e / a;
    comp[(1, 0)] = 1.0;
    comp[(2, 1)] = 1.0;
    comp[(3, 2)] = 1.0;

    let eigvals = Schur::new(comp).complex_eigenvalues();

    let mut roots: Vec<Real> = eigvals
        .iter()
        .filter(|v| v.im.abs() < 1e-8)
        .map(|v| v.re)
        .collect();
    roots.sort_by(|x, y| x.total_cmp(y));
    roots.dedup_by(|x, y| (*x - *y).abs() < 1e-8);
    roots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_centers_and_scales() {
        let pts = vec![
            Pt2::new(100.0, 100.0),
            Pt2::new(300.0, 100.0),
            Pt2::new(300.0, 300.0),
            Pt2::new(100.0, 300.0),
        ];
        let (norm, t) = normalize_points_2d(&pts).unwrap();
        let mean: Real = norm.iter().map(|p| p.coords.norm()).sum::<Real>() / 4.0;
        assert!((mean - 2.0_f64.sqrt()).abs() < 1e-12);
        let mapped = t * Vec3::new(300.0, 300.0, 1.0);
        assert!((mapped.x - norm[2].x).abs() < 1e-12);
    }

    #[test]
    fn nullspace_of_underdetermined_system() {
        // Two equations, three unknowns: x = y, z = 0  => null direction (1, 1, 0).
        let a = DMatrix::from_row_slice(2, 3, &[1.0, -1.0, 0.0, 0.0, 0.0, 1.0]);
        let v = nullspace_vector(&a).unwrap();
        assert!((a * &v).norm() < 1e-12);
        assert!((v[0] - v[1]).abs() < 1e-12);
    }

    #[test]
    fn quartic_roots() {
        // (x-1)(x-2)(x+1)(x+3) = x⁴ + x³ - 7x² - x + 6
        let roots = solve_quartic_real(1.0, 1.0, -7.0, -1.0, 6.0);
        let expected = [-3.0, -1.0, 1.0, 2.0];
        assert_eq!(roots.len(), 4);
        for (r, e) in roots.iter().zip(expected.iter()) {
            assert!((r - e).abs() < 1e-8, "{roots:?}");
        }
    }

    #[test]
    fn cubic_roots() {
        // (x-1)(x-2)(x-3)
        let roots = solve_cubic_real(1.0, -6.0, 11.0, -6.0);
        assert_eq!(roots.len(), 3);
        assert!((roots[0] - 1.0).abs() < 1e-8);
        assert!((roots[2] - 3.0).abs() < 1e-8);
    }

    #[test]
    fn nearest_rotation_is_orthonormal() {
        let m = Mat3::new(1.0, 0.1, 0.0, -0.1, 1.0, 0.05, 0.0, 0.0, 0.9);
        let r = nearest_rotation(&m).unwrap();
        assert!((r.transpose() * r - Mat3::identity()).norm() < 1e-12);
        assert!((r.determinant() - 1.0).abs() < 1e-12);
    }
}
