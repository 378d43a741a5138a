//! Coordinate-format sparse matrices.

use num_complex::Complex64;
use std::collections::BTreeMap;

use crate::linalg::{self, Matrix};

/// A square sparse matrix storing only its non-zero entries.
///
/// Entries are kept in a `BTreeMap` keyed by `(row, col)` so iteration is in
/// row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    dim: usize,
    entries: BTreeMap<(usize, usize), Complex64>,
}

impl SparseMatrix {
    /// Sparse identity of the given dimension.
    pub fn identity(dim: usize) -> Self {
        let entries = (0..dim).map(|i| ((i, i), Complex64::new(1.0, 0.0))).collect();
        Self { dim, entries }
    }

    /// Convert a dense matrix, dropping exact zeros.
    pub fn from_dense(m: &Matrix) -> Self {
        let entries = m
            .indexed_iter()
            .filter(|(_, z)| z.norm() != 0.0)
            .map(|(idx, z)| (idx, *z))
            .collect();
        Self {
            dim: m.nrows(),
            entries,
        }
    }

    /// Dense copy of this matrix.
    pub fn to_dense(&self) -> Matrix {
        let mut out = Matrix::zeros((self.dim, self.dim));
        for (&(r, col), &z) in &self.entries {
            out[[r, col]] = z;
        }
        out
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored non-zero entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Entry at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.entries
            .get(&(row, col))
            .copied()
            .unwrap_or_else(|| Complex64::new(0.0, 0.0))
    }

    /// Iterate over non-zero entries in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Complex64)> + '_ {
        self.entries.iter().map(|(&(r, col), &z)| (r, col, z))
    }

    /// Sparse product `self · other`.
    pub fn matmul(&self, other: &SparseMatrix) -> SparseMatrix {
        let mut rows_of_other: BTreeMap<usize, Vec<(usize, Complex64)>> = BTreeMap::new();
        for (&(r, col), &z) in &other.entries {
            rows_of_other.entry(r).or_default().push((col, z));
        }

        let mut entries: BTreeMap<(usize, usize), Complex64> = BTreeMap::new();
        for (&(i, k), &a) in &self.entries {
            if let Some(row) = rows_of_other.get(&k) {
                for &(j, b) in row {
                    *entries.entry((i, j)).or_default() += a * b;
                }
            }
        }
        entries.retain(|_, z| z.norm() != 0.0);
        SparseMatrix {
            dim: self.dim,
            entries,
        }
    }

    /// Integer power by repeated squaring.
    ///
    /// A negative exponent inverts through the dense representation first;
    /// returns `None` if the matrix is singular.
    pub fn pow(&self, k: i64) -> Option<SparseMatrix> {
        let mut base = if k < 0 {
            SparseMatrix::from_dense(&linalg::inverse(&self.to_dense())?)
        } else {
            self.clone()
        };
        let mut e = k.unsigned_abs();
        let mut acc = SparseMatrix::identity(self.dim);
        while e > 0 {
            if e & 1 == 1 {
                acc = acc.matmul(&base);
            }
            e >>= 1;
            if e > 0 {
                base = base.matmul(&base);
            }
        }
        Some(acc)
    }
}
