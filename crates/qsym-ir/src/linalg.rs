//! Dense complex matrix helpers.
//!
//! Matrices are stored as `ndarray` arrays; factorizations are delegated to
//! `faer`:
//!
//! - integer powers by repeated squaring, with an LU inverse for negative
//!   exponents
//! - Hermitian eigendecomposition
//! - unitary eigenbases of normal matrices (unitaries and observables) by
//!   diagonalizing the Hermitian part, then the anti-Hermitian part inside
//!   each degenerate eigenspace
//! - principal-branch fractional powers, falling back to a general
//!   eigendecomposition for diagonalizable non-normal matrices
//! - identity expansion of an operator onto a larger wire register
//!
//! Wire order convention: the first wire is the most significant bit of a
//! basis-state index.

use faer::linalg::solvers::DenseSolveCore;
use faer::{Mat, MatRef, Side};
use ndarray::Array2;
use num_complex::Complex64;

/// Dense complex matrix.
pub type Matrix = Array2<Complex64>;

/// Tolerance used for structural checks (diagonal, Hermitian, singular pivots).
pub const EPSILON: f64 = 1e-10;

/// Reconstruction tolerance for eigendecompositions.
const DECOMPOSITION_ATOL: f64 = 1e-9;

/// Relative gap below which Hermitian-part eigenvalues are one eigenspace.
const DEGENERACY_RTOL: f64 = 1e-8;

/// Shorthand complex constructor.
#[inline]
pub fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

/// Build a matrix from row-major data.
///
/// Returns `None` if `data.len()` is not `rows * cols`.
pub fn from_rows(rows: usize, cols: usize, data: Vec<Complex64>) -> Option<Matrix> {
    Array2::from_shape_vec((rows, cols), data).ok()
}

/// Row-major copy of a matrix's entries.
pub fn to_row_major(m: &Matrix) -> Vec<Complex64> {
    m.iter().copied().collect()
}

/// Identity matrix of the given dimension.
pub fn identity(dim: usize) -> Matrix {
    Array2::eye(dim)
}

/// Conjugate transpose.
pub fn dagger(m: &Matrix) -> Matrix {
    m.t().mapv(|z| z.conj())
}

/// Kronecker product `a ⊗ b`.
pub fn kron(a: &Matrix, b: &Matrix) -> Matrix {
    ndarray::linalg::kron(a, b)
}

/// Multiply every entry by a complex scalar.
pub fn scale(m: &Matrix, s: Complex64) -> Matrix {
    m.mapv(|z| z * s)
}

/// Whether two matrices have the same shape and agree entry-wise within `atol`.
pub fn allclose(a: &Matrix, b: &Matrix, atol: f64) -> bool {
    a.dim() == b.dim() && a.iter().zip(b.iter()).all(|(x, y)| (x - y).norm() <= atol)
}

/// Whether all off-diagonal entries vanish within `atol`.
pub fn is_diagonal(m: &Matrix, atol: f64) -> bool {
    m.indexed_iter()
        .all(|((i, j), z)| i == j || z.norm() <= atol)
}

/// Whether `m` equals its conjugate transpose within `atol`.
pub fn is_hermitian(m: &Matrix, atol: f64) -> bool {
    let (r, cols) = m.dim();
    if r != cols {
        return false;
    }
    (0..r).all(|i| (i..r).all(|j| (m[[i, j]] - m[[j, i]].conj()).norm() <= atol))
}

/// Whether `m` is a scalar multiple of the identity within `atol`.
pub fn is_scalar(m: &Matrix, atol: f64) -> bool {
    if m.is_empty() {
        return true;
    }
    let d = m[[0, 0]];
    is_diagonal(m, atol) && m.diag().iter().all(|z| (z - d).norm() <= atol)
}

fn to_faer(m: &Matrix) -> Mat<Complex64> {
    Mat::from_fn(m.nrows(), m.ncols(), |i, j| m[[i, j]])
}

fn from_faer(m: MatRef<'_, Complex64>) -> Matrix {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

fn is_finite(m: &Matrix) -> bool {
    m.iter().all(|z| z.re.is_finite() && z.im.is_finite())
}

/// Matrix inverse from an LU factorization with partial pivoting.
///
/// Returns `None` for a singular (or non-square) matrix.
pub fn inverse(m: &Matrix) -> Option<Matrix> {
    let (n, cols) = m.dim();
    if n != cols {
        return None;
    }
    if n == 0 {
        return Some(identity(0));
    }
    let inv = from_faer(to_faer(m).partial_piv_lu().inverse().as_ref());
    (is_finite(&inv) && allclose(&m.dot(&inv), &identity(n), 1e-8)).then_some(inv)
}

/// Integer matrix power by repeated squaring.
///
/// Negative exponents invert first; returns `None` if that inverse does not
/// exist.
pub fn int_power(m: &Matrix, k: i64) -> Option<Matrix> {
    let mut base = if k < 0 { inverse(m)? } else { m.clone() };
    let mut e = k.unsigned_abs();
    let mut acc = identity(m.nrows());
    while e > 0 {
        if e & 1 == 1 {
            acc = acc.dot(&base);
        }
        e >>= 1;
        if e > 0 {
            base = base.dot(&base);
        }
    }
    Some(acc)
}

/// Eigendecomposition of a complex Hermitian matrix.
///
/// Returns eigenvalues in ascending order and the unitary whose columns are
/// the matching eigenvectors; `None` if the solver does not converge. Only
/// the lower triangle of `h` is read.
pub fn eigh(h: &Matrix) -> Option<(Vec<f64>, Matrix)> {
    if h.is_empty() {
        return Some((Vec::new(), identity(0)));
    }
    let evd = to_faer(h).self_adjoint_eigen(Side::Lower).ok()?;
    let values = evd.S().column_vector().iter().map(|z| z.re).collect();
    Some((values, from_faer(evd.U())))
}

/// Eigendecomposition of a normal matrix `m = V diag(λ) V†` with unitary `V`.
///
/// Returns `None` if `m` is not normal (no unitary eigenbasis reconstructs it
/// within `atol`).
pub fn eig_normal(m: &Matrix, atol: f64) -> Option<(Vec<Complex64>, Matrix)> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }
    if is_hermitian(m, atol) {
        let (w, v) = eigh(m)?;
        return Some((w.into_iter().map(|x| c(x, 0.0)).collect(), v));
    }

    // m = herm + i·anti with both parts Hermitian; they commute iff m is normal.
    let herm = Array2::from_shape_fn((n, n), |(i, j)| (m[[i, j]] + m[[j, i]].conj()) * 0.5);
    let anti = Array2::from_shape_fn((n, n), |(i, j)| {
        (m[[i, j]] - m[[j, i]].conj()) * c(0.0, -0.5)
    });

    let (a, mut v) = eigh(&herm)?;
    let gap = DEGENERACY_RTOL * a.iter().fold(1.0_f64, |acc, x| acc.max(x.abs()));
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && a[end] - a[end - 1] <= gap {
            end += 1;
        }
        if end - start > 1 {
            let block = v.slice(ndarray::s![.., start..end]).to_owned();
            let restricted = dagger(&block).dot(&anti).dot(&block);
            let (_, w) = eigh(&restricted)?;
            v.slice_mut(ndarray::s![.., start..end]).assign(&block.dot(&w));
        }
        start = end;
    }

    let values: Vec<Complex64> = dagger(&v).dot(m).dot(&v).diag().to_vec();
    allclose(&reconstruct(&v, &values), m, atol.max(DECOMPOSITION_ATOL)).then_some((values, v))
}

fn reconstruct(v: &Matrix, values: &[Complex64]) -> Matrix {
    let n = v.nrows();
    let scaled = Array2::from_shape_fn((n, n), |(i, j)| v[[i, j]] * values[j]);
    scaled.dot(&dagger(v))
}

/// General eigendecomposition `m = V diag(λ) V⁻¹`.
///
/// Returns `None` if the solver fails or `m` is defective.
fn eig_diagonalizable(m: &Matrix) -> Option<(Vec<Complex64>, Matrix, Matrix)> {
    let evd = to_faer(m).eigen().ok()?;
    let values: Vec<Complex64> = evd.S().column_vector().iter().copied().collect();
    let v = from_faer(evd.U());
    let v_inv = inverse(&v)?;
    Some((values, v, v_inv))
}

/// `z^p` on the principal branch, with near-real inputs snapped onto the real
/// axis so that `-1` maps to `e^{iπp}` rather than `e^{-iπp}`.
pub fn principal_pow(z: Complex64, p: f64) -> Complex64 {
    let r = z.norm();
    if r == 0.0 {
        return if p == 0.0 { c(1.0, 0.0) } else { c(0.0, 0.0) };
    }
    let snapped = if z.im.abs() <= EPSILON * r {
        c(z.re, 0.0)
    } else {
        z
    };
    snapped.powf(p)
}

/// Eigenvalues of a square matrix.
pub fn eigenvalues(m: &Matrix) -> Option<Vec<Complex64>> {
    if m.nrows() != m.ncols() {
        return None;
    }
    if is_diagonal(m, EPSILON) {
        return Some(m.diag().to_vec());
    }
    if let Some((w, _)) = eig_normal(m, DECOMPOSITION_ATOL) {
        return Some(w);
    }
    to_faer(m).eigenvalues().ok()
}

/// Principal fractional power `m^p` of a diagonalizable matrix.
///
/// Returns `None` for a defective matrix.
pub fn fractional_power(m: &Matrix, p: f64) -> Option<Matrix> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }
    if is_diagonal(m, EPSILON) {
        let mut out = Array2::zeros((n, n));
        for i in 0..n {
            out[[i, i]] = principal_pow(m[[i, i]], p);
        }
        return Some(out);
    }
    if let Some((values, v)) = eig_normal(m, DECOMPOSITION_ATOL) {
        let powered: Vec<Complex64> = values.iter().map(|&z| principal_pow(z, p)).collect();
        return Some(reconstruct(&v, &powered));
    }

    let (values, v, v_inv) = eig_diagonalizable(m)?;
    let rebuilt = Array2::from_shape_fn((n, n), |(i, j)| v[[i, j]] * values[j]).dot(&v_inv);
    if !allclose(&rebuilt, m, DECOMPOSITION_ATOL * m.iter().fold(1.0_f64, |a, z| a.max(z.norm()))) {
        return None;
    }
    let scaled = Array2::from_shape_fn((n, n), |(i, j)| v[[i, j]] * principal_pow(values[j], p));
    Some(scaled.dot(&v_inv))
}

/// Controlled version of `u` with `num_controls` leading control wires,
/// active when every control is `|1⟩`.
pub fn controlled(u: &Matrix, num_controls: usize) -> Matrix {
    let du = u.nrows();
    let dim = du << num_controls;
    let offset = dim - du;
    let mut out = identity(dim);
    for i in 0..du {
        for j in 0..du {
            out[[offset + i, offset + j]] = u[[i, j]];
        }
    }
    out
}

/// Embed `m`, acting on the register positions `positions` (in `m`'s own
/// wire order), into a register of `total` wires with identity elsewhere.
pub fn expand(m: &Matrix, positions: &[usize], total: usize) -> Matrix {
    let k = positions.len();
    let dim = 1usize << total;
    let sub_dim = 1usize << k;
    let shifts: Vec<usize> = positions.iter().map(|&p| total - 1 - p).collect();
    let mask: usize = shifts.iter().map(|&s| 1usize << s).sum();

    let mut out = Array2::zeros((dim, dim));
    for row in 0..dim {
        let mut sub_row = 0;
        for &s in &shifts {
            sub_row = (sub_row << 1) | ((row >> s) & 1);
        }
        let rest = row & !mask;
        for sub_col in 0..sub_dim {
            let value = m[[sub_row, sub_col]];
            if value.norm() == 0.0 {
                continue;
            }
            let mut col = rest;
            for (bit, &s) in shifts.iter().enumerate() {
                if (sub_col >> (k - 1 - bit)) & 1 == 1 {
                    col |= 1 << s;
                }
            }
            out[[row, col]] = value;
        }
    }
    out
}
