// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Operator bases for the Liouville representation.
//!
//! A [`Basis`] is an ordered, labelled set of d×d matrices spanning the
//! operators on a d-dimensional Hilbert space. Two bases are provided:
//!
//! - `pp`: normalized Pauli products P/√(2^n), labels like `"XI"`, with the
//!   first character acting on the most significant tensor factor. This is
//!   the basis in which Liouville vectors and superoperators are real.
//! - `std`: matrix units E_ij labelled `"(i,j)"`.
//!
//! Error generators resolve their term labels through the basis they are
//! given; nothing here is global.

use std::collections::HashMap;
use std::fmt;

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::linalg::{dagger, hs_inner, kron, matrix_exp};

/// Largest number of qubits a Pauli basis is built for (4^8 elements).
pub const MAX_PAULI_QUBITS: usize = 8;

/// Which family of basis matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasisKind {
    /// Normalized Pauli products
    #[serde(rename = "pp")]
    Pauli,
    /// Matrix units
    #[serde(rename = "std")]
    Standard,
}

impl BasisKind {
    pub fn name(&self) -> &'static str {
        match self {
            BasisKind::Pauli => "pp",
            BasisKind::Standard => "std",
        }
    }
}

impl fmt::Display for BasisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered, labelled operator basis.
#[derive(Debug, Clone)]
pub struct Basis {
    kind: BasisKind,
    hilbert_dim: usize,
    labels: Vec<String>,
    elements: Vec<Array2<Complex64>>,
    index: HashMap<String, usize>,
}

impl PartialEq for Basis {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.hilbert_dim == other.hilbert_dim
    }
}

impl Basis {
    /// Normalized Pauli-product basis on `num_qubits` qubits.
    pub fn pauli(num_qubits: usize) -> Result<Self> {
        if num_qubits == 0 || num_qubits > MAX_PAULI_QUBITS {
            return Err(Error::Basis(format!(
                "Pauli basis needs 1..={} qubits, got {}",
                MAX_PAULI_QUBITS, num_qubits
            )));
        }

        let mut labels = vec![String::new()];
        let mut elements = vec![Array2::from_elem((1, 1), Complex64::new(1.0, 0.0))];
        for _ in 0..num_qubits {
            let mut next_labels = Vec::with_capacity(labels.len() * 4);
            let mut next_elements = Vec::with_capacity(elements.len() * 4);
            for (label, element) in labels.iter().zip(elements.iter()) {
                for c in ['I', 'X', 'Y', 'Z'] {
                    next_labels.push(format!("{label}{c}"));
                    next_elements.push(kron(element, &pauli_matrix(c)?));
                }
            }
            labels = next_labels;
            elements = next_elements;
        }

        let hilbert_dim = 1usize << num_qubits;
        let norm = Complex64::new(1.0 / (hilbert_dim as f64).sqrt(), 0.0);
        let elements = elements.into_iter().map(|m| m * norm).collect();
        Ok(Self::assemble(BasisKind::Pauli, hilbert_dim, labels, elements))
    }

    /// Matrix-unit basis on a `hilbert_dim`-dimensional space.
    pub fn standard(hilbert_dim: usize) -> Result<Self> {
        if hilbert_dim == 0 {
            return Err(Error::Basis("standard basis needs a nonzero dimension".into()));
        }
        let mut labels = Vec::with_capacity(hilbert_dim * hilbert_dim);
        let mut elements = Vec::with_capacity(hilbert_dim * hilbert_dim);
        for i in 0..hilbert_dim {
            for j in 0..hilbert_dim {
                let mut e = Array2::zeros((hilbert_dim, hilbert_dim));
                e[[i, j]] = Complex64::new(1.0, 0.0);
                labels.push(format!("({i},{j})"));
                elements.push(e);
            }
        }
        Ok(Self::assemble(BasisKind::Standard, hilbert_dim, labels, elements))
    }

    /// Resolve a basis by name (`"pp"` or `"std"`) and Liouville dimension.
    pub fn from_name(name: &str, dim: usize) -> Result<Self> {
        let hilbert_dim = (dim as f64).sqrt().round() as usize;
        if hilbert_dim * hilbert_dim != dim {
            return Err(Error::Basis(format!(
                "Liouville dimension {} is not a perfect square",
                dim
            )));
        }
        match name {
            "pp" => {
                if !hilbert_dim.is_power_of_two() {
                    return Err(Error::Basis(format!(
                        "Pauli basis needs a qubit dimension, got {}",
                        hilbert_dim
                    )));
                }
                Self::pauli(hilbert_dim.trailing_zeros() as usize)
            }
            "std" => Self::standard(hilbert_dim),
            other => Err(Error::Basis(format!("unknown basis '{}'", other))),
        }
    }

    fn assemble(
        kind: BasisKind,
        hilbert_dim: usize,
        labels: Vec<String>,
        elements: Vec<Array2<Complex64>>,
    ) -> Self {
        let index = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Self {
            kind,
            hilbert_dim,
            labels,
            elements,
            index,
        }
    }

    pub fn kind(&self) -> BasisKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Number of elements, i.e. the Liouville dimension.
    pub fn dim(&self) -> usize {
        self.elements.len()
    }

    pub fn hilbert_dim(&self) -> usize {
        self.hilbert_dim
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn element(&self, index: usize) -> &Array2<Complex64> {
        &self.elements[index]
    }

    /// Index of the element with the given label.
    pub fn resolve(&self, label: &str) -> Result<usize> {
        self.index.get(label).copied().ok_or_else(|| {
            Error::Basis(format!(
                "label '{}' is not in the {}-dimensional '{}' basis",
                label,
                self.dim(),
                self.name()
            ))
        })
    }

    /// Index of the element proportional to the identity, if the basis has one.
    pub fn identity_index(&self) -> Option<usize> {
        match self.kind {
            BasisKind::Pauli => Some(0),
            BasisKind::Standard => None,
        }
    }

    /// Whether every element is Hermitian (real Liouville representation).
    pub fn is_hermitian(&self) -> bool {
        self.kind == BasisKind::Pauli
    }

    /// Whether two bases describe the same elements.
    pub fn check_compatible(&self, other: &Basis) -> Result<()> {
        if self != other {
            return Err(Error::Basis(format!(
                "basis '{}' (dim {}) does not match '{}' (dim {})",
                other.name(),
                other.dim(),
                self.name(),
                self.dim()
            )));
        }
        Ok(())
    }

    fn require_hermitian(&self, what: &str) -> Result<()> {
        if !self.is_hermitian() {
            return Err(Error::Basis(format!(
                "{} requires a Hermitian basis, '{}' is not",
                what,
                self.name()
            )));
        }
        Ok(())
    }

    /// Coefficients v_k = Tr(B_k† ρ) of an operator.
    pub fn expand(&self, op: &Array2<Complex64>) -> Result<Array1<Complex64>> {
        self.check_hilbert_shape(op)?;
        Ok(self.elements.iter().map(|b| hs_inner(b, op)).collect())
    }

    /// Real Liouville vector of a Hermitian operator.
    pub fn vector_from_density(&self, op: &Array2<Complex64>) -> Result<Array1<f64>> {
        self.require_hermitian("a real Liouville vector")?;
        Ok(self.expand(op)?.mapv(|z| z.re))
    }

    /// Operator Σ_k v_k B_k for a real Liouville vector.
    pub fn density_from_vector(&self, v: &Array1<f64>) -> Result<Array2<Complex64>> {
        if v.len() != self.dim() {
            return Err(Error::dimension("basis vector", self.dim(), v.len()));
        }
        let n = self.hilbert_dim;
        let mut out = Array2::zeros((n, n));
        for (coef, b) in v.iter().zip(self.elements.iter()) {
            out = out + b * Complex64::new(*coef, 0.0);
        }
        Ok(out)
    }

    /// Liouville vector of the identity operator.
    pub fn identity_vector(&self) -> Result<Array1<f64>> {
        let eye = Array2::from_diag_elem(self.hilbert_dim, Complex64::new(1.0, 0.0));
        self.vector_from_density(&eye)
    }

    /// Superoperator S_ab = Tr(B_a† f(B_b)) of a linear map on operators.
    pub fn superop_from_map<F>(&self, f: F) -> Array2<Complex64>
    where
        F: Fn(&Array2<Complex64>) -> Array2<Complex64>,
    {
        let d = self.dim();
        let mut s = Array2::zeros((d, d));
        for (b, elem_b) in self.elements.iter().enumerate() {
            let image = f(elem_b);
            for (a, elem_a) in self.elements.iter().enumerate() {
                s[[a, b]] = hs_inner(elem_a, &image);
            }
        }
        s
    }

    /// Pauli transfer matrix of ρ → U ρ U†.
    pub fn superop_from_unitary(&self, u: &Array2<Complex64>) -> Result<Array2<f64>> {
        self.require_hermitian("a real superoperator")?;
        self.check_hilbert_shape(u)?;
        let u_dag = dagger(u);
        Ok(self
            .superop_from_map(|rho| u.dot(rho).dot(&u_dag))
            .mapv(|z| z.re))
    }

    /// Change a superoperator from this basis to the standard basis.
    ///
    /// The standard basis acts on row-major vectorized operators.
    pub fn superop_to_std(&self, s: &Array2<f64>) -> Result<Array2<Complex64>> {
        self.check_superop_shape(s.dim())?;
        let t = self.vectorization_matrix();
        let s = s.mapv(|x| Complex64::new(x, 0.0));
        Ok(t.dot(&s).dot(&dagger(&t)))
    }

    /// Change a standard-basis superoperator into this (Hermitian) basis.
    pub fn superop_from_std(&self, s_std: &Array2<Complex64>) -> Result<Array2<f64>> {
        self.require_hermitian("a real superoperator")?;
        self.check_superop_shape(s_std.dim())?;
        let t = self.vectorization_matrix();
        let s = dagger(&t).dot(s_std).dot(&t);
        let max_imag = s.iter().map(|z| z.im.abs()).fold(0.0, f64::max);
        if max_imag > 1e-8 {
            return Err(Error::Basis(format!(
                "superoperator is not Hermitian-preserving (imaginary part {:.2e})",
                max_imag
            )));
        }
        Ok(s.mapv(|z| z.re))
    }

    /// Columns are the row-major vectorizations of the basis elements.
    fn vectorization_matrix(&self) -> Array2<Complex64> {
        let d = self.dim();
        let n = self.hilbert_dim;
        Array2::from_shape_fn((d, d), |(row, k)| self.elements[k][[row / n, row % n]])
    }

    fn check_hilbert_shape(&self, m: &Array2<Complex64>) -> Result<()> {
        let n = self.hilbert_dim;
        if m.nrows() != n || m.ncols() != n {
            return Err(Error::dimension(
                "operator on basis Hilbert space",
                n,
                m.nrows().max(m.ncols()),
            ));
        }
        Ok(())
    }

    fn check_superop_shape(&self, (rows, cols): (usize, usize)) -> Result<()> {
        if rows != self.dim() || cols != self.dim() {
            return Err(Error::dimension("superoperator", self.dim(), rows.max(cols)));
        }
        Ok(())
    }
}

/// Single-qubit Pauli matrix for `'I'`, `'X'`, `'Y'` or `'Z'`.
pub fn pauli_matrix(c: char) -> Result<Array2<Complex64>> {
    let zero = Complex64::new(0.0, 0.0);
    let one = Complex64::new(1.0, 0.0);
    let i = Complex64::new(0.0, 1.0);
    let m = match c {
        'I' => [[one, zero], [zero, one]],
        'X' => [[zero, one], [one, zero]],
        'Y' => [[zero, -i], [i, zero]],
        'Z' => [[one, zero], [zero, -one]],
        other => return Err(Error::Basis(format!("'{}' is not a Pauli label", other))),
    };
    Ok(Array2::from_shape_fn((2, 2), |(r, c)| m[r][c]))
}

/// Single-qubit rotation exp(−i θ/2 σ) about a Pauli axis.
pub fn rotation_unitary(axis: char, angle: f64) -> Result<Array2<Complex64>> {
    let sigma = pauli_matrix(axis)?;
    matrix_exp(&(sigma * Complex64::new(0.0, -angle / 2.0)))
}
