// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared test utilities for operator-model tests.

use ndarray::{array, Array1, Array2};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Pauli transfer matrix of a π/2 rotation about X.
pub fn x_pi2_ptm() -> Array2<f64> {
    array![
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, -1.0],
        [0.0, 0.0, 1.0, 0.0],
    ]
}

/// Liouville vector of |0⟩⟨0| in the normalized Pauli basis.
pub fn ground_state_vec() -> Array1<f64> {
    let r = 1.0 / 2.0f64.sqrt();
    array![r, 0.0, 0.0, r]
}

/// Deterministic pseudo-random vector with entries in [-scale, scale].
pub fn random_vector(len: usize, scale: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-scale..=scale)).collect()
}

/// Assert two real matrices agree element-wise within `tol`.
pub fn assert_real_close(a: &Array2<f64>, b: &Array2<f64>, tol: f64) {
    assert_eq!(a.shape(), b.shape());
    for ((i, j), val) in a.indexed_iter() {
        let diff = (val - b[[i, j]]).abs();
        assert!(
            diff < tol,
            "Mismatch at ({}, {}): {} vs {} (diff={})",
            i,
            j,
            val,
            b[[i, j]],
            diff
        );
    }
}

/// Assert two complex matrices agree element-wise within `tol`.
pub fn assert_complex_close(a: &Array2<Complex64>, b: &Array2<Complex64>, tol: f64) {
    assert_eq!(a.shape(), b.shape());
    for ((i, j), val) in a.indexed_iter() {
        let diff = (val - b[[i, j]]).norm();
        assert!(
            diff < tol,
            "Mismatch at ({}, {}): {:?} vs {:?} (diff={})",
            i,
            j,
            val,
            b[[i, j]],
            diff
        );
    }
}

/// Assert two slices agree element-wise within `tol`.
pub fn assert_slice_close(a: &[f64], b: &[f64], tol: f64) {
    assert_eq!(a.len(), b.len(), "length mismatch");
    for (k, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        assert!((x - y).abs() < tol, "Mismatch at {}: {} vs {}", k, x, y);
    }
}
