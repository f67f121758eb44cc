// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Lindblad-form error generator with constrained parameter maps.
//!
//! # Parameter layout
//!
//! `[λ (one per Hamiltonian label) | stochastic block | α (diag_affine only)]`
//!
//! The stochastic block depends on the mode pair, with m "other" labels:
//!
//! | support | param mode | block |
//! |---|---|---|
//! | all | cptp | m×m real P, row-major; M_ii = P_ii, M_ij = P_ij + i·P_ji (i>j), η = M M† |
//! | all | unconstrained | m×m real P; η_ii = P_ii, η_ij = P_ij + i·P_ji (i>j) |
//! | diagonal | cptp | p_k with η_kk = p_k² |
//! | diagonal | unconstrained | η_kk directly |
//! | diagonal | depol | one p, η_kk = p² |
//! | diagonal | reldepol | one p, η_kk = p |
//!
//! Under `cptp` the η implied by any real parameter vector is Hermitian
//! positive semidefinite.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use ndarray::Array2;
use num_complex::Complex64;
use tracing::debug;

use super::dissipator::GeneratorAction;
use super::terms::{CoeffDict, ErrorTerm, ParamMode, SupportMode};
use crate::basis::Basis;
use crate::config::Config;
use crate::error::{Error, Result, TermError};
use crate::linalg::{dagger, DenseMatrix};
use crate::member::{LinearOperator, ModelMember};
use crate::validation::{validate_dim, validate_param_vector};

/// Tolerance for positivity, equality and reality checks on coefficients.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Lindblad-form error generator over an explicit basis.
#[derive(Debug, Clone)]
pub struct LindbladErrorgen {
    basis: Arc<Basis>,
    support: SupportMode,
    param_mode: ParamMode,
    ham_labels: Vec<String>,
    ham_indices: Vec<usize>,
    other_labels: Vec<String>,
    other_indices: Vec<usize>,
    params: Vec<f64>,
    tolerance: f64,
}

impl LindbladErrorgen {
    /// Build a generator whose label sets are the labels named in
    /// `term_dict`, initialized to its coefficients.
    pub fn new(
        dim: usize,
        term_dict: &CoeffDict,
        basis: Arc<Basis>,
        support: SupportMode,
        param_mode: ParamMode,
    ) -> Result<Self> {
        Self::build(dim, term_dict, basis, support, param_mode, DEFAULT_TOLERANCE)
    }

    /// Generator over every non-identity label, with zero coefficients.
    pub fn full(
        dim: usize,
        basis: Arc<Basis>,
        support: SupportMode,
        param_mode: ParamMode,
    ) -> Result<Self> {
        check_setup(dim, &basis, support, param_mode)?;
        let identity = basis.identity_index();
        let indices: Vec<usize> = (0..basis.dim()).filter(|i| Some(*i) != identity).collect();
        let others = if support == SupportMode::Hamiltonian {
            Vec::new()
        } else {
            indices.clone()
        };
        let gen = Self::with_indices(basis, support, param_mode, indices, others, DEFAULT_TOLERANCE);
        debug!(
            support = %support,
            param_mode = %param_mode,
            num_params = gen.params.len(),
            "Built full Lindblad error generator"
        );
        Ok(gen)
    }

    /// Like [`new`](Self::new), with modes and tolerance from configuration.
    pub fn from_config(
        dim: usize,
        term_dict: &CoeffDict,
        basis: Arc<Basis>,
        config: &Config,
    ) -> Result<Self> {
        let lindblad = &config.parameterization.lindblad;
        Self::build(
            dim,
            term_dict,
            basis,
            lindblad.support_mode,
            lindblad.param_mode,
            config.numerics.tolerance,
        )
    }

    /// Replace the coefficient-check tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn build(
        dim: usize,
        term_dict: &CoeffDict,
        basis: Arc<Basis>,
        support: SupportMode,
        param_mode: ParamMode,
        tolerance: f64,
    ) -> Result<Self> {
        check_setup(dim, &basis, support, param_mode)?;

        let identity = basis.identity_index();
        let mut ham = BTreeSet::new();
        let mut other = BTreeSet::new();
        for term in term_dict.keys() {
            check_supported(term, support)?;
            for label in term.labels() {
                let idx = basis.resolve(label)?;
                if Some(idx) == identity {
                    return Err(unsupported(term, support));
                }
                match term {
                    ErrorTerm::Hamiltonian(_) => ham.insert(idx),
                    _ => other.insert(idx),
                };
            }
        }

        let mut gen = Self::with_indices(
            basis.clone(),
            support,
            param_mode,
            ham.into_iter().collect(),
            other.into_iter().collect(),
            tolerance,
        );
        gen.set_errgen_coeffs(term_dict, &basis)?;
        debug!(
            support = %support,
            param_mode = %param_mode,
            hamiltonian_labels = gen.ham_labels.len(),
            other_labels = gen.other_labels.len(),
            num_params = gen.params.len(),
            "Built Lindblad error generator"
        );
        Ok(gen)
    }

    fn with_indices(
        basis: Arc<Basis>,
        support: SupportMode,
        param_mode: ParamMode,
        ham_indices: Vec<usize>,
        other_indices: Vec<usize>,
        tolerance: f64,
    ) -> Self {
        let label_of = |i: &usize| basis.labels()[*i].clone();
        let ham_labels = ham_indices.iter().map(label_of).collect();
        let other_labels = other_indices.iter().map(label_of).collect();
        let mut gen = Self {
            basis,
            support,
            param_mode,
            ham_labels,
            ham_indices,
            other_labels,
            other_indices,
            params: Vec::new(),
            tolerance,
        };
        gen.params = vec![0.0; gen.n_ham() + gen.n_stoch() + gen.n_affine()];
        gen
    }

    pub fn basis(&self) -> &Arc<Basis> {
        &self.basis
    }

    pub fn support(&self) -> SupportMode {
        self.support
    }

    pub fn param_mode(&self) -> ParamMode {
        self.param_mode
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Hamiltonian labels in basis order.
    pub fn hamiltonian_labels(&self) -> &[String] {
        &self.ham_labels
    }

    /// Stochastic/affine labels in basis order.
    pub fn other_labels(&self) -> &[String] {
        &self.other_labels
    }

    fn n_ham(&self) -> usize {
        self.ham_indices.len()
    }

    fn n_stoch(&self) -> usize {
        let m = self.other_indices.len();
        match self.support {
            SupportMode::Hamiltonian => 0,
            SupportMode::All => m * m,
            SupportMode::Diagonal | SupportMode::DiagAffine => {
                if self.param_mode.is_shared() {
                    usize::from(m > 0)
                } else {
                    m
                }
            }
        }
    }

    fn n_affine(&self) -> usize {
        match self.support {
            SupportMode::DiagAffine => self.other_indices.len(),
            _ => 0,
        }
    }

    /// The m×m stochastic coefficient matrix implied by the parameters.
    pub fn eta_matrix(&self) -> Array2<Complex64> {
        let m = self.other_indices.len();
        let start = self.n_ham();
        let p = &self.params[start..start + self.n_stoch()];
        let mut eta = Array2::zeros((m, m));

        match self.support {
            SupportMode::Hamiltonian => {}
            SupportMode::All => {
                let lower = |i: usize, j: usize| Complex64::new(p[i * m + j], p[j * m + i]);
                if self.param_mode == ParamMode::Cptp {
                    let mut factor = Array2::zeros((m, m));
                    for i in 0..m {
                        factor[[i, i]] = Complex64::new(p[i * m + i], 0.0);
                        for j in 0..i {
                            factor[[i, j]] = lower(i, j);
                        }
                    }
                    eta = factor.dot(&dagger(&factor));
                } else {
                    // Shared modes are rejected for full support at construction.
                    for i in 0..m {
                        eta[[i, i]] = Complex64::new(p[i * m + i], 0.0);
                        for j in 0..i {
                            let z = lower(i, j);
                            eta[[i, j]] = z;
                            eta[[j, i]] = z.conj();
                        }
                    }
                }
            }
            SupportMode::Diagonal | SupportMode::DiagAffine => {
                for k in 0..m {
                    let value = match self.param_mode {
                        ParamMode::Cptp => p[k] * p[k],
                        ParamMode::Unconstrained => p[k],
                        ParamMode::Depol => p[0] * p[0],
                        ParamMode::RelDepol => p[0],
                    };
                    eta[[k, k]] = Complex64::new(value, 0.0);
                }
            }
        }
        eta
    }

    fn affine_coeffs(&self) -> &[f64] {
        &self.params[self.n_ham() + self.n_stoch()..]
    }

    /// Coefficient dictionary reconstructed from the parameters.
    ///
    /// Off-diagonal entries are reported in both orders.
    pub fn errgen_coeffs(&self, return_basis: bool) -> (CoeffDict, Option<Arc<Basis>>) {
        let mut dict = CoeffDict::new();
        for (label, lambda) in self.ham_labels.iter().zip(&self.params) {
            dict.insert(ErrorTerm::hamiltonian(label), Complex64::new(*lambda, 0.0));
        }

        if self.support != SupportMode::Hamiltonian {
            let eta = self.eta_matrix();
            for (i, li) in self.other_labels.iter().enumerate() {
                dict.insert(
                    ErrorTerm::stochastic(li),
                    Complex64::new(eta[[i, i]].re, 0.0),
                );
                if self.support == SupportMode::All {
                    for (j, lj) in self.other_labels.iter().enumerate() {
                        if i != j {
                            dict.insert(ErrorTerm::off_diag(li, lj), eta[[i, j]]);
                        }
                    }
                }
            }
        }

        for (label, alpha) in self.other_labels.iter().zip(self.affine_coeffs()) {
            dict.insert(ErrorTerm::affine(label), Complex64::new(*alpha, 0.0));
        }

        let basis = return_basis.then(|| self.basis.clone());
        (dict, basis)
    }

    /// Set the parameters from a coefficient dictionary.
    ///
    /// Missing keys mean zero. Leaves the generator untouched on failure.
    pub fn set_errgen_coeffs(&mut self, dict: &CoeffDict, basis: &Basis) -> Result<()> {
        self.basis.check_compatible(basis)?;
        self.params = self.params_from_coeffs(dict)?;
        Ok(())
    }

    /// Merge `dict` into the current coefficients, then set.
    pub fn update_errgen_coeffs(&mut self, dict: &CoeffDict, basis: &Basis) -> Result<()> {
        let (mut merged, _) = self.errgen_coeffs(false);
        for (term, value) in dict {
            if let ErrorTerm::StochasticOffDiag(a, b) = term {
                merged.remove(&ErrorTerm::off_diag(b, a));
            }
            merged.insert(term.clone(), *value);
        }
        self.set_errgen_coeffs(&merged, basis)
    }

    /// Coefficients with diagonal stochastic terms mapped to error rates,
    /// r = (1 − e^{−D·C})/D for Liouville dimension D.
    pub fn error_rates(&self) -> CoeffDict {
        let d = self.dim() as f64;
        let (mut dict, _) = self.errgen_coeffs(false);
        for (term, value) in dict.iter_mut() {
            if let ErrorTerm::Stochastic(_) = term {
                *value = Complex64::new((1.0 - (-d * value.re).exp()) / d, 0.0);
            }
        }
        dict
    }

    /// Inverse of [`error_rates`](Self::error_rates), C = −ln(1 − D·r)/D.
    pub fn set_error_rates(&mut self, rates: &CoeffDict, basis: &Basis) -> Result<()> {
        let d = self.dim() as f64;
        let mut dict = rates.clone();
        for (term, value) in dict.iter_mut() {
            if let ErrorTerm::Stochastic(_) = term {
                let r = value.re;
                if d * r >= 1.0 {
                    return Err(TermError::NonPositive {
                        term: term.to_string(),
                        value: r,
                    }
                    .into());
                }
                *value = Complex64::new(-(1.0 - d * r).ln() / d, value.im);
            }
        }
        self.set_errgen_coeffs(&dict, basis)
    }

    fn params_from_coeffs(&self, dict: &CoeffDict) -> Result<Vec<f64>> {
        let m = self.other_indices.len();
        let n_ham = self.n_ham();
        let n_stoch = self.n_stoch();
        let mut params = vec![0.0; self.params.len()];
        let mut eta = Array2::<Complex64>::zeros((m, m));
        let mut pairs: HashMap<(usize, usize), Complex64> = HashMap::new();

        for (term, value) in dict {
            check_supported(term, self.support)?;
            if term.is_real_valued() && value.im.abs() > self.tolerance {
                return Err(Error::Constraint(format!(
                    "{} must be real, got imaginary part {:e}",
                    term, value.im
                )));
            }
            match term {
                ErrorTerm::Hamiltonian(l) => {
                    let k = self.locate(&self.ham_labels, l, term)?;
                    params[k] = value.re;
                }
                ErrorTerm::Stochastic(l) => {
                    let k = self.locate(&self.other_labels, l, term)?;
                    eta[[k, k]] = Complex64::new(value.re, 0.0);
                }
                ErrorTerm::StochasticOffDiag(a, b) => {
                    let i = self.locate(&self.other_labels, a, term)?;
                    let j = self.locate(&self.other_labels, b, term)?;
                    if i == j {
                        return Err(TermError::Inconsistent(format!(
                            "{} names the same label twice",
                            term
                        ))
                        .into());
                    }
                    // Stored as the (lo, hi) entry
                    let (lo, hi, z) = if i < j {
                        (i, j, *value)
                    } else {
                        (j, i, value.conj())
                    };
                    if let Some(prev) = pairs.insert((lo, hi), z) {
                        if (prev - z).norm() > self.tolerance {
                            return Err(TermError::Inconsistent(format!(
                                "S({},{}) and S({},{}) are not complex conjugates",
                                a, b, b, a
                            ))
                            .into());
                        }
                    }
                    eta[[lo, hi]] = z;
                    eta[[hi, lo]] = z.conj();
                }
                ErrorTerm::Affine(l) => {
                    let k = self.locate(&self.other_labels, l, term)?;
                    params[n_ham + n_stoch + k] = value.re;
                }
            }
        }

        self.encode_eta(&eta, &mut params[n_ham..n_ham + n_stoch])?;
        Ok(params)
    }

    fn locate(&self, labels: &[String], label: &str, term: &ErrorTerm) -> Result<usize> {
        let idx = self.basis.resolve(label)?;
        if Some(idx) == self.basis.identity_index() {
            return Err(unsupported(term, self.support));
        }
        labels
            .iter()
            .position(|l| l == label)
            .ok_or_else(|| unsupported(term, self.support))
    }

    fn encode_eta(&self, eta: &Array2<Complex64>, out: &mut [f64]) -> Result<()> {
        let m = self.other_indices.len();
        let tol = self.tolerance;

        match self.support {
            SupportMode::Hamiltonian => {}
            SupportMode::All => {
                let source = if self.param_mode == ParamMode::Cptp {
                    self.psd_factor(eta)?
                } else {
                    eta.clone()
                };
                for i in 0..m {
                    out[i * m + i] = source[[i, i]].re;
                    for j in 0..i {
                        out[i * m + j] = source[[i, j]].re;
                        out[j * m + i] = source[[i, j]].im;
                    }
                }
            }
            SupportMode::Diagonal | SupportMode::DiagAffine => {
                let diag: Vec<f64> = (0..m).map(|k| eta[[k, k]].re).collect();
                if self.param_mode.is_positive() {
                    if let Some(k) = diag.iter().position(|v| *v < -tol) {
                        return Err(TermError::NonPositive {
                            term: ErrorTerm::stochastic(&self.other_labels[k]).to_string(),
                            value: diag[k],
                        }
                        .into());
                    }
                }
                if self.param_mode.is_shared() {
                    let Some(first) = diag.first().copied() else {
                        return Ok(());
                    };
                    if let Some(k) = diag.iter().position(|v| (v - first).abs() > tol) {
                        return Err(TermError::Inconsistent(format!(
                            "shared stochastic coefficients differ: S({}) = {} but S({}) = {}",
                            self.other_labels[0], first, self.other_labels[k], diag[k]
                        ))
                        .into());
                    }
                    out[0] = match self.param_mode {
                        ParamMode::Depol => first.max(0.0).sqrt(),
                        _ => first,
                    };
                } else {
                    for (slot, v) in out.iter_mut().zip(&diag) {
                        *slot = match self.param_mode {
                            ParamMode::Cptp => v.max(0.0).sqrt(),
                            _ => *v,
                        };
                    }
                }
            }
        }
        Ok(())
    }

    /// Lower-triangular M with non-negative real diagonal and η = M M†.
    ///
    /// A pivot within the tolerance of zero gives a zero column only when
    /// every entry below it is within the tolerance too. Otherwise a
    /// positive pivot is factored exactly, and a non-positive one is
    /// rejected.
    fn psd_factor(&self, eta: &Array2<Complex64>) -> Result<Array2<Complex64>> {
        let m = eta.nrows();
        let tol = self.tolerance;
        let mut factor = Array2::<Complex64>::zeros((m, m));

        for j in 0..m {
            let pivot = eta[[j, j]].re
                - (0..j).map(|k| factor[[j, k]].norm_sqr()).sum::<f64>();
            let non_positive = || -> Error {
                TermError::NonPositive {
                    term: ErrorTerm::stochastic(&self.other_labels[j]).to_string(),
                    value: pivot,
                }
                .into()
            };
            if pivot < -tol {
                return Err(non_positive());
            }

            let residuals: Vec<Complex64> = (j + 1..m)
                .map(|i| {
                    eta[[i, j]]
                        - (0..j)
                            .map(|k| factor[[i, k]] * factor[[j, k]].conj())
                            .sum::<Complex64>()
                })
                .collect();

            if pivot <= tol && residuals.iter().all(|r| r.norm() <= tol) {
                if pivot != 0.0 {
                    debug!(label = %self.other_labels[j], pivot, "Clamped near-zero pivot");
                }
                continue;
            }
            if pivot <= 0.0 {
                return Err(non_positive());
            }

            let diag = pivot.sqrt();
            factor[[j, j]] = Complex64::new(diag, 0.0);
            for (i, r) in (j + 1..m).zip(residuals) {
                factor[[i, j]] = r / diag;
            }
        }
        Ok(factor)
    }

    /// Real Liouville matrix of the generator.
    pub fn generator_matrix(&self) -> Array2<f64> {
        let basis = &self.basis;
        let ham: Vec<(f64, &Array2<Complex64>)> = self
            .params
            .iter()
            .zip(&self.ham_indices)
            .map(|(lambda, i)| (*lambda, basis.element(*i)))
            .collect();
        let stoch: Vec<&Array2<Complex64>> =
            self.other_indices.iter().map(|i| basis.element(*i)).collect();
        let affine: Vec<(f64, &Array2<Complex64>)> = self
            .affine_coeffs()
            .iter()
            .zip(&self.other_indices)
            .map(|(alpha, i)| (*alpha, basis.element(*i)))
            .collect();

        let action =
            GeneratorAction::new(basis.hilbert_dim(), &ham, &stoch, &self.eta_matrix(), &affine);
        basis.superop_from_map(|rho| action.apply(rho)).mapv(|z| z.re)
    }
}

impl ModelMember for LindbladErrorgen {
    fn dim(&self) -> usize {
        self.basis.dim()
    }

    fn num_params(&self) -> usize {
        self.params.len()
    }

    fn to_vector(&self) -> Vec<f64> {
        self.params.clone()
    }

    fn from_vector(&mut self, v: &[f64]) -> Result<()> {
        validate_param_vector(v, self.params.len())?;
        self.params.copy_from_slice(v);
        Ok(())
    }
}

impl LinearOperator for LindbladErrorgen {
    fn todense(&self) -> DenseMatrix {
        DenseMatrix::Real(self.generator_matrix())
    }
}

fn check_setup(
    dim: usize,
    basis: &Basis,
    support: SupportMode,
    param_mode: ParamMode,
) -> Result<()> {
    validate_dim("error generator basis", basis.dim(), dim)?;
    if !basis.is_hermitian() {
        return Err(Error::Basis(format!(
            "error generators need a Hermitian basis, '{}' is not",
            basis.name()
        )));
    }
    if param_mode.is_shared() && !support.is_diagonal() {
        return Err(TermError::InvalidModes {
            support: support.to_string(),
            param: param_mode.to_string(),
        }
        .into());
    }
    Ok(())
}

fn check_supported(term: &ErrorTerm, support: SupportMode) -> Result<()> {
    let ok = match term {
        ErrorTerm::Hamiltonian(_) => true,
        ErrorTerm::Stochastic(_) => support != SupportMode::Hamiltonian,
        ErrorTerm::StochasticOffDiag(..) => support == SupportMode::All,
        ErrorTerm::Affine(_) => support == SupportMode::DiagAffine,
    };
    if ok {
        Ok(())
    } else {
        Err(unsupported(term, support))
    }
}

fn unsupported(term: &ErrorTerm, support: SupportMode) -> Error {
    TermError::Unsupported {
        term: term.to_string(),
        mode: support.to_string(),
    }
    .into()
}
