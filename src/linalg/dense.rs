// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dense matrix and vector values returned by `todense()`.
//!
//! Liouville-representation members are real; pure-state members are
//! complex. Arithmetic between a real and a complex value promotes to complex.

use ndarray::{Array1, Array2};
use num_complex::Complex64;

/// A dense square matrix, real or complex.
#[derive(Debug, Clone, PartialEq)]
pub enum DenseMatrix {
    Real(Array2<f64>),
    Complex(Array2<Complex64>),
}

impl DenseMatrix {
    /// Identity of the given dimension.
    pub fn identity(dim: usize, complex: bool) -> Self {
        if complex {
            DenseMatrix::Complex(Array2::from_diag_elem(dim, Complex64::new(1.0, 0.0)))
        } else {
            DenseMatrix::Real(Array2::eye(dim))
        }
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        match self {
            DenseMatrix::Real(m) => m.nrows(),
            DenseMatrix::Complex(m) => m.nrows(),
        }
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        match self {
            DenseMatrix::Real(m) => m.ncols(),
            DenseMatrix::Complex(m) => m.ncols(),
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, DenseMatrix::Complex(_))
    }

    /// Borrow the real matrix, if this value is real.
    pub fn as_real(&self) -> Option<&Array2<f64>> {
        match self {
            DenseMatrix::Real(m) => Some(m),
            DenseMatrix::Complex(_) => None,
        }
    }

    /// Complex copy of the matrix.
    pub fn to_complex(&self) -> Array2<Complex64> {
        match self {
            DenseMatrix::Real(m) => m.mapv(|x| Complex64::new(x, 0.0)),
            DenseMatrix::Complex(m) => m.clone(),
        }
    }

    /// Matrix product `self · rhs`.
    pub fn dot(&self, rhs: &DenseMatrix) -> DenseMatrix {
        match (self, rhs) {
            (DenseMatrix::Real(a), DenseMatrix::Real(b)) => DenseMatrix::Real(a.dot(b)),
            _ => DenseMatrix::Complex(self.to_complex().dot(&rhs.to_complex())),
        }
    }

    /// Matrix-vector product `self · v`.
    pub fn apply(&self, v: &DenseVector) -> DenseVector {
        match (self, v) {
            (DenseMatrix::Real(a), DenseVector::Real(x)) => DenseVector::Real(a.dot(x)),
            _ => DenseVector::Complex(self.to_complex().dot(&v.to_complex())),
        }
    }

    /// Largest absolute element-wise difference; promotes to complex if needed.
    pub fn max_abs_diff(&self, other: &DenseMatrix) -> f64 {
        match (self, other) {
            (DenseMatrix::Real(a), DenseMatrix::Real(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y).abs())
                .fold(0.0, f64::max),
            _ => self
                .to_complex()
                .iter()
                .zip(other.to_complex().iter())
                .map(|(x, y)| (x - y).norm())
                .fold(0.0, f64::max),
        }
    }
}

impl From<Array2<f64>> for DenseMatrix {
    fn from(m: Array2<f64>) -> Self {
        DenseMatrix::Real(m)
    }
}

impl From<Array2<Complex64>> for DenseMatrix {
    fn from(m: Array2<Complex64>) -> Self {
        DenseMatrix::Complex(m)
    }
}

/// A dense column vector, real or complex.
#[derive(Debug, Clone, PartialEq)]
pub enum DenseVector {
    Real(Array1<f64>),
    Complex(Array1<Complex64>),
}

impl DenseVector {
    pub fn len(&self) -> usize {
        match self {
            DenseVector::Real(v) => v.len(),
            DenseVector::Complex(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, DenseVector::Complex(_))
    }

    pub fn as_real(&self) -> Option<&Array1<f64>> {
        match self {
            DenseVector::Real(v) => Some(v),
            DenseVector::Complex(_) => None,
        }
    }

    pub fn to_complex(&self) -> Array1<Complex64> {
        match self {
            DenseVector::Real(v) => v.mapv(|x| Complex64::new(x, 0.0)),
            DenseVector::Complex(v) => v.clone(),
        }
    }

    /// Element-wise difference `self − rhs`.
    pub fn sub(&self, rhs: &DenseVector) -> DenseVector {
        match (self, rhs) {
            (DenseVector::Real(a), DenseVector::Real(b)) => DenseVector::Real(a - b),
            _ => DenseVector::Complex(&self.to_complex() - &rhs.to_complex()),
        }
    }
}

impl From<Array1<f64>> for DenseVector {
    fn from(v: Array1<f64>) -> Self {
        DenseVector::Real(v)
    }
}

impl From<Array1<Complex64>> for DenseVector {
    fn from(v: Array1<Complex64>) -> Self {
        DenseVector::Complex(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_real_product_stays_real() {
        let a = DenseMatrix::from(array![[1.0, 2.0], [3.0, 4.0]]);
        let b = DenseMatrix::identity(2, false);
        let p = a.dot(&b);
        assert!(!p.is_complex());
        assert_eq!(p, a);
    }

    #[test]
    fn test_mixed_product_promotes() {
        let a = DenseMatrix::from(array![[0.0, 1.0], [1.0, 0.0]]);
        let b = DenseMatrix::identity(2, true);
        let p = a.dot(&b);
        assert!(p.is_complex());
        assert!(p.max_abs_diff(&a) < 1e-15);
    }

    #[test]
    fn test_apply_and_sub() {
        let a = DenseMatrix::from(array![[0.0, 1.0], [1.0, 0.0]]);
        let v = DenseVector::from(array![1.0, 0.0]);
        let w = a.apply(&v);
        assert_eq!(w, DenseVector::from(array![0.0, 1.0]));
        assert_eq!(w.sub(&v), DenseVector::from(array![-1.0, 1.0]));
    }
}
