// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dense linear-algebra helpers shared by the operator model.
//!
//! - [`matrix_exp`] / [`matrix_exp_real`]: scaling-and-squaring + Padé(13)
//! - [`DenseMatrix`] / [`DenseVector`]: real-or-complex dense values
//! - small kernels: conjugate transpose, Kronecker product, traces

pub mod dense;
pub mod expm;

pub use dense::{DenseMatrix, DenseVector};
pub use expm::{matrix_exp, matrix_exp_real};

use ndarray::{Array1, Array2};
use num_complex::Complex64;

/// Conjugate transpose (dagger) of a matrix.
pub fn dagger(m: &Array2<Complex64>) -> Array2<Complex64> {
    m.t().mapv(|z| z.conj())
}

/// Trace of a complex matrix.
pub fn trace(m: &Array2<Complex64>) -> Complex64 {
    m.diag().iter().copied().sum()
}

/// Tr(A† B), the Hilbert–Schmidt inner product.
pub fn hs_inner(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Complex64 {
    a.iter().zip(b.iter()).map(|(x, y)| x.conj() * y).sum()
}

/// Kronecker product A ⊗ B; the first factor is the most significant index.
pub fn kron<T>(a: &Array2<T>, b: &Array2<T>) -> Array2<T>
where
    T: Copy + std::ops::Mul<Output = T>,
{
    let (ar, ac) = a.dim();
    let (br, bc) = b.dim();
    Array2::from_shape_fn((ar * br, ac * bc), |(i, j)| {
        a[[i / br, j / bc]] * b[[i % br, j % bc]]
    })
}

/// Kronecker product of two vectors.
pub fn kron_vec<T>(a: &Array1<T>, b: &Array1<T>) -> Array1<T>
where
    T: Copy + std::ops::Mul<Output = T>,
{
    let n = b.len();
    Array1::from_shape_fn(a.len() * n, |i| a[i / n] * b[i % n])
}
