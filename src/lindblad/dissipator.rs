// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Action of a Lindblad-form generator on operators.
//!
//! L(ρ) = −i[H, ρ] + Σ_ij η_ij (B_i ρ B_j† − ½{B_j†B_i, ρ}) + Tr(ρ) A
//!
//! with H = Σ λ_i B_i and A = Σ α_i B_i / √n. The double sum is folded into
//! per-row operators G_i = Σ_j η_ij B_j†, so one application costs O(m n³)
//! for m stochastic labels instead of O(m² n³).
//!
//! Ref: Breuer & Petruccione, "The Theory of Open Quantum Systems" (2002), Ch. 3.

use ndarray::Array2;
use num_complex::Complex64;

use crate::linalg::{dagger, trace};

/// Precomputed operators of one generator.
#[derive(Debug, Clone)]
pub struct GeneratorAction {
    hamiltonian: Array2<Complex64>,
    jumps: Vec<(Array2<Complex64>, Array2<Complex64>)>,
    anticommutator: Array2<Complex64>,
    affine: Array2<Complex64>,
}

impl GeneratorAction {
    /// Assemble the action from basis elements and coefficients.
    ///
    /// `ham` pairs λ_i with B_i; `stoch` lists the stochastic elements with
    /// the m×m matrix `eta`; `affine` pairs α_i with B_i.
    pub fn new(
        hilbert_dim: usize,
        ham: &[(f64, &Array2<Complex64>)],
        stoch: &[&Array2<Complex64>],
        eta: &Array2<Complex64>,
        affine: &[(f64, &Array2<Complex64>)],
    ) -> Self {
        let n = hilbert_dim;
        let zeros = || Array2::<Complex64>::zeros((n, n));

        let mut hamiltonian = zeros();
        for (lambda, b) in ham {
            hamiltonian = hamiltonian + *b * Complex64::new(*lambda, 0.0);
        }

        let daggers: Vec<Array2<Complex64>> = stoch.iter().map(|b| dagger(b)).collect();
        let mut jumps = Vec::with_capacity(stoch.len());
        let mut anticommutator = zeros();
        for (i, b_i) in stoch.iter().enumerate() {
            let mut g = zeros();
            for (j, b_j_dag) in daggers.iter().enumerate() {
                let c = eta[[i, j]];
                if c != Complex64::new(0.0, 0.0) {
                    g = g + b_j_dag * c;
                }
            }
            // Σ_ij η_ij B_j† B_i = Σ_i G_i B_i
            anticommutator = anticommutator + g.dot(*b_i);
            jumps.push(((*b_i).clone(), g));
        }

        let scale = Complex64::new(1.0 / (n as f64).sqrt(), 0.0);
        let mut affine_op = zeros();
        for (alpha, b) in affine {
            affine_op = affine_op + *b * (scale * *alpha);
        }

        Self {
            hamiltonian,
            jumps,
            anticommutator,
            affine: affine_op,
        }
    }

    /// L(ρ).
    pub fn apply(&self, rho: &Array2<Complex64>) -> Array2<Complex64> {
        let i = Complex64::new(0.0, 1.0);
        let half = Complex64::new(0.5, 0.0);

        // −i[H, ρ]
        let mut out = (self.hamiltonian.dot(rho) - rho.dot(&self.hamiltonian)) * (-i);

        // Σ_i B_i ρ G_i − ½{K, ρ}
        for (b, g) in &self.jumps {
            out = out + b.dot(rho).dot(g);
        }
        out = out - (self.anticommutator.dot(rho) + rho.dot(&self.anticommutator)) * half;

        // Tr(ρ) A
        let tr = trace(rho);
        if tr != Complex64::new(0.0, 0.0) {
            out = out + &self.affine * tr;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::Basis;
    use approx::assert_relative_eq;

    fn ground_state() -> Array2<Complex64> {
        let mut m = Array2::zeros((2, 2));
        m[[0, 0]] = Complex64::new(1.0, 0.0);
        m
    }

    fn superposition_state() -> Array2<Complex64> {
        Array2::from_elem((2, 2), Complex64::new(0.5, 0.0))
    }

    /// η for amplitude damping σ⁻ = (B_X + i B_Y)/√2 at rate γ.
    fn amplitude_damping_eta(gamma: f64) -> Array2<Complex64> {
        let h = gamma / 2.0;
        let mut eta = Array2::zeros((2, 2));
        eta[[0, 0]] = Complex64::new(h, 0.0);
        eta[[1, 1]] = Complex64::new(h, 0.0);
        eta[[0, 1]] = Complex64::new(0.0, -h);
        eta[[1, 0]] = Complex64::new(0.0, h);
        eta
    }

    #[test]
    fn test_ground_state_is_fixed_point_of_damping() {
        let basis = Basis::pauli(1).unwrap();
        let stoch = [basis.element(1), basis.element(2)];
        let action =
            GeneratorAction::new(2, &[], &stoch, &amplitude_damping_eta(1.0), &[]);
        let d = action.apply(&ground_state());
        for elem in d.iter() {
            assert_relative_eq!(elem.norm(), 0.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_excited_state_decays() {
        let gamma = 2.0;
        let basis = Basis::pauli(1).unwrap();
        let stoch = [basis.element(1), basis.element(2)];
        let action =
            GeneratorAction::new(2, &[], &stoch, &amplitude_damping_eta(gamma), &[]);
        let mut excited = Array2::zeros((2, 2));
        excited[[1, 1]] = Complex64::new(1.0, 0.0);
        let d = action.apply(&excited);
        assert_relative_eq!(d[[0, 0]].re, gamma, epsilon = 1e-12);
        assert_relative_eq!(d[[1, 1]].re, -gamma, epsilon = 1e-12);
    }

    #[test]
    fn test_action_is_traceless() {
        let basis = Basis::pauli(1).unwrap();
        let ham = [(0.3, basis.element(3))];
        let stoch = [basis.element(1), basis.element(2), basis.element(3)];
        let mut eta = Array2::zeros((3, 3));
        eta[[0, 0]] = Complex64::new(0.2, 0.0);
        eta[[1, 1]] = Complex64::new(0.1, 0.0);
        eta[[2, 2]] = Complex64::new(0.4, 0.0);
        eta[[0, 2]] = Complex64::new(0.05, 0.02);
        eta[[2, 0]] = Complex64::new(0.05, -0.02);
        let affine = [(0.1, basis.element(3))];
        let action = GeneratorAction::new(2, &ham, &stoch, &eta, &affine);
        let tr = trace(&action.apply(&superposition_state()));
        assert_relative_eq!(tr.norm(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_hamiltonian_term_is_commutator() {
        let basis = Basis::pauli(1).unwrap();
        let ham = [(1.0, basis.element(3))];
        let action = GeneratorAction::new(2, &ham, &[], &Array2::zeros((0, 0)), &[]);
        // Diagonal states commute with Z
        let d = action.apply(&ground_state());
        assert!(d.iter().all(|z| z.norm() < 1e-15));
        // −i[Z/√2, |+⟩⟨+|] has off-diagonals ∓i/√2
        let d = action.apply(&superposition_state());
        let s = 1.0 / 2.0f64.sqrt();
        assert_relative_eq!(d[[0, 1]].im, -s, epsilon = 1e-12);
        assert_relative_eq!(d[[1, 0]].im, s, epsilon = 1e-12);
    }
}
