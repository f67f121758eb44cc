// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Matrix exponential via scaling-and-squaring with Padé(13) approximation.
//!
//! Implements the algorithm from:
//!   Higham (2005), "The Scaling and Squaring Method for the Matrix
//!   Exponential Revisited", SIAM J. Matrix Anal. Appl. 26(4), 1179.
//!
//! Error generators are real superoperators of size 4^n, so the real entry
//! point [`matrix_exp_real`] is the one used by the Lindblad exponential map.

use ndarray::{s, Array2};
use num_complex::Complex64;
use tracing::warn;

use crate::error::{Error, Result};

/// θ₁₃ from Higham Table 10.2.
const THETA_13: f64 = 5.37;

/// Padé(13,13) approximation coefficients, Higham (2005) eq. (10.33).
const PADE_COEFFS: [f64; 14] = [
    1.0,
    0.5,
    0.12,
    1.833_333_333_333_333_4e-2,
    1.992_753_623_188_405_8e-3,
    1.630_434_782_608_696e-4,
    1.035_196_687_401_6e-5,
    5.175_983_437_008_01e-7,
    2.043_151_356_652_5e-8,
    6.306_022_705_717_593e-10,
    1.483_770_048_404_14e-11,
    2.529_153_491_597_966e-13,
    2.810_170_546_219_962_4e-15,
    1.544_049_750_670_309e-17,
];

/// Largest squaring count; any finite 1-norm needs fewer.
const MAX_SQUARINGS: i32 = 1100;

/// Compute exp(A) for a square complex matrix.
///
/// Fails with [`Error::Numerical`] when `a` has non-finite entries, when the
/// Padé denominator is singular, or when the result overflows.
///
/// # Panics
/// Panics if `a` is not square.
pub fn matrix_exp(a: &Array2<Complex64>) -> Result<Array2<Complex64>> {
    let n = a.nrows();
    assert_eq!(n, a.ncols(), "matrix_exp requires a square matrix");

    if a.iter().any(|z| !z.is_finite()) {
        return Err(non_finite_input(n));
    }
    match n {
        0 => return Ok(Array2::zeros((0, 0))),
        1 => return finite(Array2::from_elem((1, 1), a[[0, 0]].exp()), |z| z.is_finite()),
        _ => {}
    }

    let s = scaling_exponent(one_norm(a.iter().map(|z| z.norm()), n))?;
    let a_scaled = a * Complex64::new(0.5f64.powi(s), 0.0);

    let mut result = pade13(&a_scaled, Complex64::new(1.0, 0.0))?;
    for _ in 0..s {
        result = result.dot(&result);
    }
    finite(result, |z| z.is_finite())
}

/// Compute exp(A) for a square real matrix.
///
/// Runs the same Padé(13) scheme in real arithmetic.
pub fn matrix_exp_real(a: &Array2<f64>) -> Result<Array2<f64>> {
    let n = a.nrows();
    assert_eq!(n, a.ncols(), "matrix_exp_real requires a square matrix");

    if a.iter().any(|x| !x.is_finite()) {
        return Err(non_finite_input(n));
    }
    match n {
        0 => return Ok(Array2::zeros((0, 0))),
        1 => return finite(Array2::from_elem((1, 1), a[[0, 0]].exp()), |x| x.is_finite()),
        _ => {}
    }

    let s = scaling_exponent(one_norm(a.iter().map(|x| x.abs()), n))?;
    let a_scaled = a * 0.5f64.powi(s);

    let mut result = pade13(&a_scaled, 1.0)?;
    for _ in 0..s {
        result = result.dot(&result);
    }
    finite(result, |x| x.is_finite())
}

/// Choose s such that ||A/2^s||₁ < θ₁₃.
fn scaling_exponent(norm: f64) -> Result<i32> {
    if !norm.is_finite() {
        return Err(Error::Numerical(format!(
            "matrix exponential of a matrix with 1-norm {}",
            norm
        )));
    }
    if norm <= THETA_13 {
        return Ok(0);
    }
    let s = (norm / THETA_13).log2().ceil();
    Ok((s as i32).min(MAX_SQUARINGS))
}

fn non_finite_input(n: usize) -> Error {
    Error::Numerical(format!(
        "matrix exponential input of size {}x{} has non-finite entries",
        n, n
    ))
}

fn finite<T>(m: Array2<T>, is_finite: impl Fn(&T) -> bool) -> Result<Array2<T>> {
    if m.iter().all(is_finite) {
        Ok(m)
    } else {
        Err(Error::Numerical(format!(
            "matrix exponential of a {}x{} matrix overflowed",
            m.nrows(),
            m.ncols()
        )))
    }
}

/// Max column sum of a row-major iterator of absolute values.
fn one_norm(abs_values: impl Iterator<Item = f64>, ncols: usize) -> f64 {
    let mut col_sums = vec![0.0f64; ncols];
    for (k, v) in abs_values.enumerate() {
        col_sums[k % ncols] += v;
    }
    col_sums.into_iter().fold(0.0, f64::max)
}

/// Scalar field the Padé kernel runs over.
trait PadeScalar: ndarray::LinalgScalar + std::ops::SubAssign {
    fn from_f64(x: f64) -> Self;
    fn magnitude(&self) -> f64;
}

impl PadeScalar for f64 {
    fn from_f64(x: f64) -> Self {
        x
    }
    fn magnitude(&self) -> f64 {
        self.abs()
    }
}

impl PadeScalar for Complex64 {
    fn from_f64(x: f64) -> Self {
        Complex64::new(x, 0.0)
    }
    fn magnitude(&self) -> f64 {
        self.norm()
    }
}

/// Padé(13,13) approximation of exp(A); `one` fixes the scalar type.
fn pade13<T: PadeScalar>(a: &Array2<T>, one: T) -> Result<Array2<T>> {
    let n = a.nrows();
    let eye = Array2::from_diag_elem(n, one);
    let b = |k: usize| T::from_f64(PADE_COEFFS[k]);

    let a2 = a.dot(a);
    let a4 = a2.dot(&a2);
    let a6 = a2.dot(&a4);

    // U = A [A6 (b13 A6 + b11 A4 + b9 A2) + b7 A6 + b5 A4 + b3 A2 + b1 I]
    let w1 = a6.mapv(|x| x * b(13)) + a4.mapv(|x| x * b(11)) + a2.mapv(|x| x * b(9));
    let w2 = w1.dot(&a6)
        + a6.mapv(|x| x * b(7))
        + a4.mapv(|x| x * b(5))
        + a2.mapv(|x| x * b(3))
        + eye.mapv(|x| x * b(1));
    let u = a.dot(&w2);

    // V = A6 (b12 A6 + b10 A4 + b8 A2) + b6 A6 + b4 A4 + b2 A2 + b0 I
    let v1 = a6.mapv(|x| x * b(12)) + a4.mapv(|x| x * b(10)) + a2.mapv(|x| x * b(8));
    let v = v1.dot(&a6)
        + a6.mapv(|x| x * b(6))
        + a4.mapv(|x| x * b(4))
        + a2.mapv(|x| x * b(2))
        + eye.mapv(|x| x * b(0));

    let numerator = &v + &u;
    let denominator = &v - &u;

    solve_linear(denominator, numerator).ok_or_else(|| {
        warn!(dim = n, "Padé denominator is singular");
        Error::Numerical(format!("singular Padé denominator for a {}x{} matrix", n, n))
    })
}

/// Solve A X = B by Gaussian elimination with partial pivoting.
///
/// Returns `None` when a pivot falls below 1e-15.
fn solve_linear<T: PadeScalar>(a: Array2<T>, b: Array2<T>) -> Option<Array2<T>> {
    let n = a.nrows();
    let m = b.ncols();

    let mut aug = Array2::from_elem((n, n + m), T::zero());
    aug.slice_mut(s![.., ..n]).assign(&a);
    aug.slice_mut(s![.., n..]).assign(&b);

    for col in 0..n {
        let mut max_val = 0.0;
        let mut max_row = col;
        for row in col..n {
            let val = aug[[row, col]].magnitude();
            if val > max_val {
                max_val = val;
                max_row = row;
            }
        }

        if max_row != col {
            for j in 0..(n + m) {
                aug.swap([col, j], [max_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        if pivot.magnitude() < 1e-15 {
            return None;
        }

        for row in (col + 1)..n {
            let factor = aug[[row, col]] / pivot;
            for j in col..(n + m) {
                let val = aug[[col, j]];
                aug[[row, j]] -= factor * val;
            }
        }
    }

    let mut x = Array2::from_elem((n, m), T::zero());
    for col in (0..n).rev() {
        let pivot = aug[[col, col]];
        for j in 0..m {
            let mut sum = aug[[col, n + j]];
            for k in (col + 1)..n {
                sum -= aug[[col, k]] * x[[k, j]];
            }
            x[[col, j]] = sum / pivot;
        }
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_complex_close, assert_real_close};
    use std::f64::consts::PI;

    #[test]
    fn test_expm_zero_is_identity() {
        let zero = Array2::<Complex64>::zeros((4, 4));
        let eye = Array2::from_diag_elem(4, Complex64::new(1.0, 0.0));
        assert_complex_close(&matrix_exp(&zero).unwrap(), &eye, 1e-14);
    }

    #[test]
    fn test_expm_real_zero_is_identity() {
        let zero = Array2::<f64>::zeros((16, 16));
        assert_real_close(&matrix_exp_real(&zero).unwrap(), &Array2::eye(16), 1e-14);
    }

    #[test]
    fn test_expm_pauli_x_produces_rotation() {
        // exp(-i θ/2 σx)
        let theta = PI / 2.0;
        let mut a = Array2::zeros((2, 2));
        let factor = Complex64::new(0.0, -theta / 2.0);
        a[[0, 1]] = factor;
        a[[1, 0]] = factor;

        let result = matrix_exp(&a).unwrap();
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        assert!((result[[0, 0]] - Complex64::new(c, 0.0)).norm() < 1e-12);
        assert!((result[[0, 1]] - Complex64::new(0.0, -s)).norm() < 1e-12);
        assert!((result[[1, 0]] - Complex64::new(0.0, -s)).norm() < 1e-12);
        assert!((result[[1, 1]] - Complex64::new(c, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_expm_real_rotation_generator() {
        // exp of the so(2) generator is a planar rotation
        let theta = 0.7;
        let mut a = Array2::zeros((2, 2));
        a[[0, 1]] = -theta;
        a[[1, 0]] = theta;
        let r = matrix_exp_real(&a).unwrap();
        assert!((r[[0, 0]] - theta.cos()).abs() < 1e-12);
        assert!((r[[0, 1]] + theta.sin()).abs() < 1e-12);
        assert!((r[[1, 0]] - theta.sin()).abs() < 1e-12);
        assert!((r[[1, 1]] - theta.cos()).abs() < 1e-12);
    }

    #[test]
    fn test_expm_real_large_norm_needs_scaling() {
        let mut a = Array2::zeros((2, 2));
        a[[0, 0]] = -40.0;
        a[[1, 1]] = 3.0;
        let r = matrix_exp_real(&a).unwrap();
        assert!((r[[0, 0]] - (-40.0f64).exp()).abs() < 1e-20);
        assert!((r[[1, 1]] - 3.0f64.exp()).abs() / 3.0f64.exp() < 1e-10);
    }

    #[test]
    fn test_expm_real_matches_complex() {
        let a = Array2::from_shape_fn((4, 4), |(i, j)| ((i * 4 + j) as f64 * 0.37).sin() * 0.8);
        let lifted = a.mapv(|x| Complex64::new(x, 0.0));
        let via_complex = matrix_exp(&lifted).unwrap().mapv(|z| z.re);
        assert_real_close(&matrix_exp_real(&a).unwrap(), &via_complex, 1e-10);
    }

    #[test]
    fn test_expm_scalar() {
        let a = Array2::from_elem((1, 1), Complex64::new(3.0, 1.0));
        let result = matrix_exp(&a).unwrap();
        assert!((result[[0, 0]] - Complex64::new(3.0, 1.0).exp()).norm() < 1e-12);
    }

    #[test]
    fn test_expm_real_norm_beyond_u64_scaling() {
        // 1-norm far above θ₁₃·2⁶⁴
        let mut a = Array2::zeros((3, 3));
        a[[1, 1]] = -4e25;
        a[[2, 2]] = -1e30;
        a[[2, 1]] = 3e29;
        let r = matrix_exp_real(&a).unwrap();
        assert!(r.iter().all(|x| x.is_finite()));
        assert!((r[[0, 0]] - 1.0).abs() < 1e-15);
        assert!(r[[1, 1]].abs() < 1e-15);
        assert!(r[[2, 2]].abs() < 1e-15);

        let lifted = a.mapv(|x| Complex64::new(x, 0.0));
        let c = matrix_exp(&lifted).unwrap();
        assert!((c[[0, 0]] - Complex64::new(1.0, 0.0)).norm() < 1e-15);
    }

    #[test]
    fn test_expm_rejects_non_finite_input() {
        let mut a = Array2::<f64>::zeros((2, 2));
        a[[0, 1]] = f64::NAN;
        assert!(matches!(matrix_exp_real(&a), Err(Error::Numerical(_))));
        a[[0, 1]] = f64::INFINITY;
        assert!(matches!(matrix_exp_real(&a), Err(Error::Numerical(_))));
        let z = Array2::from_elem((1, 1), Complex64::new(f64::NAN, 0.0));
        assert!(matches!(matrix_exp(&z), Err(Error::Numerical(_))));
    }

    #[test]
    fn test_expm_reports_overflow() {
        // exp(800) is beyond f64
        let mut a = Array2::<f64>::zeros((2, 2));
        a[[0, 0]] = 800.0;
        assert!(matches!(matrix_exp_real(&a), Err(Error::Numerical(_))));
    }

    #[test]
    fn test_solve_linear_detects_singular_matrix() {
        let singular = Array2::<f64>::zeros((3, 3));
        assert!(solve_linear(singular, Array2::eye(3)).is_none());
        let eye = Array2::<f64>::eye(3);
        assert!(solve_linear(eye.clone(), eye).is_some());
    }
}
