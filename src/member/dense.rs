// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dense operators and vectors under a static, full or TP policy.
//!
//! Parameter order is row-major for operators and natural for vectors,
//! skipping the fixed leading row/entry under TP. Complex storage
//! contributes `(re, im)` pairs per element.

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use super::{LinearOperator, ModelMember, ParamPolicy, Role, SpamVector};
use crate::basis::Basis;
use crate::error::{Error, Result};
use crate::linalg::{DenseMatrix, DenseVector};
use crate::validation::{validate_param_vector, validate_square};

/// Tolerance used when checking a TP leading row/entry at construction.
const TP_TOL: f64 = 1e-10;

/// Leading Liouville entry of a trace-one state in the normalized Pauli basis.
pub fn tp_leading_value(dim: usize) -> f64 {
    1.0 / (dim as f64).sqrt().sqrt()
}

/// Dense d×d operator.
#[derive(Debug, Clone)]
pub struct DenseOp {
    matrix: DenseMatrix,
    policy: ParamPolicy,
}

impl DenseOp {
    /// Create a dense operator; TP requires a leading row `[1, 0, …, 0]`.
    ///
    /// A TP leading row within tolerance is stored as exactly `[1, 0, …, 0]`.
    pub fn new(matrix: impl Into<DenseMatrix>, policy: ParamPolicy) -> Result<Self> {
        let mut matrix = matrix.into();
        validate_square("dense operator", matrix.nrows(), matrix.ncols())?;
        if policy == ParamPolicy::TracePreserving {
            conform_tp_row(&mut matrix)?;
        }
        Ok(Self { matrix, policy })
    }

    /// Real identity operator.
    pub fn identity(dim: usize, policy: ParamPolicy) -> Result<Self> {
        Self::new(Array2::<f64>::eye(dim), policy)
    }

    /// Liouville operator ρ → U ρ U† in the given basis.
    pub fn from_unitary(
        u: &Array2<Complex64>,
        basis: &Basis,
        policy: ParamPolicy,
    ) -> Result<Self> {
        Self::new(basis.superop_from_unitary(u)?, policy)
    }

    pub fn policy(&self) -> ParamPolicy {
        self.policy
    }

    /// Replace the stored matrix, subject to the policy.
    pub fn set_dense(&mut self, matrix: impl Into<DenseMatrix>) -> Result<()> {
        let mut matrix = matrix.into();
        if self.policy == ParamPolicy::Static {
            return Err(Error::Constraint("cannot set the value of a static operator".into()));
        }
        if matrix.nrows() != self.dim() || matrix.ncols() != self.dim() {
            return Err(Error::dimension(
                "dense operator value",
                self.dim(),
                matrix.nrows().max(matrix.ncols()),
            ));
        }
        if matrix.is_complex() != self.matrix.is_complex() {
            return Err(Error::Constraint(
                "cannot change between real and complex storage".into(),
            ));
        }
        if self.policy == ParamPolicy::TracePreserving {
            conform_tp_row(&mut matrix)?;
        }
        self.matrix = matrix;
        Ok(())
    }

    fn skip(&self) -> usize {
        match self.policy {
            ParamPolicy::TracePreserving => self.dim(),
            _ => 0,
        }
    }
}

impl ModelMember for DenseOp {
    fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    fn num_params(&self) -> usize {
        let d = self.dim();
        let free = match self.policy {
            ParamPolicy::Static => 0,
            ParamPolicy::Full => d * d,
            ParamPolicy::TracePreserving => d * (d - 1),
        };
        if self.matrix.is_complex() {
            2 * free
        } else {
            free
        }
    }

    fn to_vector(&self) -> Vec<f64> {
        if self.policy == ParamPolicy::Static {
            return Vec::new();
        }
        match &self.matrix {
            DenseMatrix::Real(m) => gather_real(m.iter(), self.skip()),
            DenseMatrix::Complex(m) => gather_complex(m.iter(), self.skip()),
        }
    }

    fn from_vector(&mut self, v: &[f64]) -> Result<()> {
        validate_param_vector(v, self.num_params())?;
        let skip = self.skip();
        match &mut self.matrix {
            _ if v.is_empty() => {}
            DenseMatrix::Real(m) => scatter_real(m.iter_mut(), skip, v),
            DenseMatrix::Complex(m) => scatter_complex(m.iter_mut(), skip, v),
        }
        Ok(())
    }
}

impl LinearOperator for DenseOp {
    fn todense(&self) -> DenseMatrix {
        self.matrix.clone()
    }
}

/// Dense length-d vector with a prep/effect role.
#[derive(Debug, Clone)]
pub struct DenseVec {
    vector: DenseVector,
    policy: ParamPolicy,
    role: Role,
}

impl DenseVec {
    /// Create a dense vector; TP requires real storage with the trace
    /// value [`tp_leading_value`] in the leading entry.
    pub fn new(vector: impl Into<DenseVector>, policy: ParamPolicy, role: Role) -> Result<Self> {
        let mut vector = vector.into();
        if vector.is_empty() {
            return Err(Error::dimension("dense vector", 1, 0));
        }
        if policy == ParamPolicy::TracePreserving {
            conform_tp_entry(&mut vector)?;
        }
        Ok(Self {
            vector,
            policy,
            role,
        })
    }

    pub fn prep(vector: impl Into<DenseVector>, policy: ParamPolicy) -> Result<Self> {
        Self::new(vector, policy, Role::Prep)
    }

    pub fn effect(vector: impl Into<DenseVector>, policy: ParamPolicy) -> Result<Self> {
        Self::new(vector, policy, Role::Effect)
    }

    /// Liouville vector of a density matrix or effect operator.
    pub fn from_operator(
        op: &Array2<Complex64>,
        basis: &Basis,
        policy: ParamPolicy,
        role: Role,
    ) -> Result<Self> {
        Self::new(basis.vector_from_density(op)?, policy, role)
    }

    pub fn policy(&self) -> ParamPolicy {
        self.policy
    }

    fn skip(&self) -> usize {
        match self.policy {
            ParamPolicy::TracePreserving => 1,
            _ => 0,
        }
    }
}

impl ModelMember for DenseVec {
    fn dim(&self) -> usize {
        self.vector.len()
    }

    fn num_params(&self) -> usize {
        let d = self.dim();
        let free = match self.policy {
            ParamPolicy::Static => 0,
            ParamPolicy::Full => d,
            ParamPolicy::TracePreserving => d - 1,
        };
        if self.vector.is_complex() {
            2 * free
        } else {
            free
        }
    }

    fn to_vector(&self) -> Vec<f64> {
        if self.policy == ParamPolicy::Static {
            return Vec::new();
        }
        match &self.vector {
            DenseVector::Real(v) => gather_real(v.iter(), self.skip()),
            DenseVector::Complex(v) => gather_complex(v.iter(), self.skip()),
        }
    }

    fn from_vector(&mut self, v: &[f64]) -> Result<()> {
        validate_param_vector(v, self.num_params())?;
        let skip = self.skip();
        match &mut self.vector {
            _ if v.is_empty() => {}
            DenseVector::Real(x) => scatter_real(x.iter_mut(), skip, v),
            DenseVector::Complex(x) => scatter_complex(x.iter_mut(), skip, v),
        }
        Ok(())
    }
}

impl SpamVector for DenseVec {
    fn role(&self) -> Role {
        self.role
    }

    fn todense(&self) -> DenseVector {
        self.vector.clone()
    }
}

/// Check the TP leading row and store it exactly.
fn conform_tp_row(matrix: &mut DenseMatrix) -> Result<()> {
    let row: Vec<Complex64> = match &*matrix {
        DenseMatrix::Real(m) => m.row(0).iter().map(|x| Complex64::new(*x, 0.0)).collect(),
        DenseMatrix::Complex(m) => m.row(0).to_vec(),
    };
    for (j, z) in row.iter().enumerate() {
        let expected = if j == 0 { 1.0 } else { 0.0 };
        if (z - Complex64::new(expected, 0.0)).norm() > TP_TOL {
            return Err(Error::Constraint(format!(
                "TP operator needs leading row [1, 0, ...], element {} is {}",
                j, z
            )));
        }
    }
    match matrix {
        DenseMatrix::Real(m) => {
            m.row_mut(0).fill(0.0);
            m[[0, 0]] = 1.0;
        }
        DenseMatrix::Complex(m) => {
            m.row_mut(0).fill(Complex64::new(0.0, 0.0));
            m[[0, 0]] = Complex64::new(1.0, 0.0);
        }
    }
    Ok(())
}

fn conform_tp_entry(vector: &mut DenseVector) -> Result<()> {
    let DenseVector::Real(v) = vector else {
        return Err(Error::Constraint("TP vectors must be real".into()));
    };
    let expected = tp_leading_value(v.len());
    if (v[0] - expected).abs() > TP_TOL {
        return Err(Error::Constraint(format!(
            "TP vector needs leading entry {:.6}, got {:.6}",
            expected, v[0]
        )));
    }
    v[0] = expected;
    Ok(())
}

fn gather_real<'a>(values: impl Iterator<Item = &'a f64>, skip: usize) -> Vec<f64> {
    values.skip(skip).copied().collect()
}

fn gather_complex<'a>(values: impl Iterator<Item = &'a Complex64>, skip: usize) -> Vec<f64> {
    values.skip(skip).flat_map(|z| [z.re, z.im]).collect()
}

fn scatter_real<'a>(slots: impl Iterator<Item = &'a mut f64>, skip: usize, v: &[f64]) {
    for (slot, value) in slots.skip(skip).zip(v) {
        *slot = *value;
    }
}

fn scatter_complex<'a>(slots: impl Iterator<Item = &'a mut Complex64>, skip: usize, v: &[f64]) {
    for (slot, pair) in slots.skip(skip).zip(v.chunks_exact(2)) {
        *slot = Complex64::new(pair[0], pair[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ground_state_vec, random_vector, x_pi2_ptm};
    use ndarray::array;

    #[test]
    fn test_param_counts() {
        let m = x_pi2_ptm();
        assert_eq!(DenseOp::new(m.clone(), ParamPolicy::Static).unwrap().num_params(), 0);
        assert_eq!(DenseOp::new(m.clone(), ParamPolicy::Full).unwrap().num_params(), 16);
        assert_eq!(
            DenseOp::new(m, ParamPolicy::TracePreserving)
                .unwrap()
                .num_params(),
            12
        );

        let v = ground_state_vec();
        assert_eq!(DenseVec::prep(v.clone(), ParamPolicy::Static).unwrap().num_params(), 0);
        assert_eq!(DenseVec::prep(v.clone(), ParamPolicy::Full).unwrap().num_params(), 4);
        assert_eq!(
            DenseVec::prep(v, ParamPolicy::TracePreserving)
                .unwrap()
                .num_params(),
            3
        );
    }

    #[test]
    fn test_complex_param_counts() {
        let u = Array2::from_diag_elem(2, Complex64::new(0.0, 1.0));
        let op = DenseOp::new(u, ParamPolicy::Full).unwrap();
        assert_eq!(op.num_params(), 8);
        let v = op.to_vector();
        assert_eq!(v, vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_row_major_order() {
        let op = DenseOp::new(array![[1.0, 2.0], [3.0, 4.0]], ParamPolicy::Full).unwrap();
        assert_eq!(op.to_vector(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_round_trip_every_policy() {
        for policy in [
            ParamPolicy::Static,
            ParamPolicy::Full,
            ParamPolicy::TracePreserving,
        ] {
            let mut op = DenseOp::new(x_pi2_ptm(), policy).unwrap();
            let before = op.todense();
            let v = op.to_vector();
            op.from_vector(&v).unwrap();
            assert_eq!(op.todense(), before);

            let w = random_vector(op.num_params(), 2.0, 7);
            op.from_vector(&w).unwrap();
            assert_eq!(op.to_vector(), w);

            let mut vec = DenseVec::prep(ground_state_vec(), policy).unwrap();
            let w = random_vector(vec.num_params(), 2.0, 11);
            vec.from_vector(&w).unwrap();
            assert_eq!(vec.to_vector(), w);
        }
    }

    #[test]
    fn test_tp_leading_row_is_fixed() {
        let mut op = DenseOp::new(x_pi2_ptm(), ParamPolicy::TracePreserving).unwrap();
        op.from_vector(&random_vector(12, 5.0, 3)).unwrap();
        let m = op.todense();
        let m = m.as_real().unwrap();
        assert_eq!(m.row(0).to_vec(), vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_tp_leading_entry_is_fixed() {
        let mut vec = DenseVec::prep(ground_state_vec(), ParamPolicy::TracePreserving).unwrap();
        vec.from_vector(&[0.3, -0.2, 0.1]).unwrap();
        let v = vec.todense();
        let v = v.as_real().unwrap();
        assert!((v[0] - tp_leading_value(4)).abs() < 1e-15);
        assert_eq!(v[1], 0.3);
    }

    #[test]
    fn test_tp_construction_checks_leading_row() {
        let bad = array![[0.9, 0.0], [0.0, 1.0]];
        assert!(matches!(
            DenseOp::new(bad, ParamPolicy::TracePreserving),
            Err(Error::Constraint(_))
        ));
        let bad_vec = array![1.0, 0.0, 0.0, 0.0];
        assert!(DenseVec::prep(bad_vec, ParamPolicy::TracePreserving).is_err());
    }

    #[test]
    fn test_from_vector_length_mismatch_leaves_state() {
        let mut op = DenseOp::new(x_pi2_ptm(), ParamPolicy::Full).unwrap();
        let before = op.to_vector();
        assert!(matches!(
            op.from_vector(&[1.0; 15]),
            Err(Error::ParamLength {
                expected: 16,
                actual: 15
            })
        ));
        assert_eq!(op.to_vector(), before);
    }

    #[test]
    fn test_static_rejects_nonempty_vector() {
        let mut op = DenseOp::new(x_pi2_ptm(), ParamPolicy::Static).unwrap();
        assert!(op.from_vector(&[]).is_ok());
        assert!(op.from_vector(&[1.0]).is_err());
    }

    #[test]
    fn test_set_dense() {
        let mut op = DenseOp::identity(4, ParamPolicy::TracePreserving).unwrap();
        op.set_dense(x_pi2_ptm()).unwrap();
        assert_eq!(op.todense(), DenseMatrix::Real(x_pi2_ptm()));
        assert!(op.set_dense(Array2::<f64>::zeros((4, 4))).is_err());
        assert!(op.set_dense(Array2::<f64>::eye(2)).is_err());

        let mut frozen = DenseOp::identity(4, ParamPolicy::Static).unwrap();
        assert!(frozen.set_dense(x_pi2_ptm()).is_err());
    }

    #[test]
    fn test_from_unitary() {
        let basis = Basis::pauli(1).unwrap();
        let u = crate::basis::rotation_unitary('X', std::f64::consts::FRAC_PI_2).unwrap();
        let op = DenseOp::from_unitary(&u, &basis, ParamPolicy::TracePreserving).unwrap();
        let diff = op.todense().max_abs_diff(&DenseMatrix::Real(x_pi2_ptm()));
        assert!(diff < 1e-12);
    }

    #[test]
    fn test_from_operator_matches_pauli_expansion() {
        let basis = Basis::pauli(1).unwrap();
        let mut rho = Array2::<Complex64>::zeros((2, 2));
        rho[[0, 0]] = Complex64::new(1.0, 0.0);
        let prep =
            DenseVec::from_operator(&rho, &basis, ParamPolicy::TracePreserving, Role::Prep).unwrap();
        let dense = prep.todense();
        let v = dense.as_real().unwrap();
        for (x, y) in v.iter().zip(ground_state_vec().iter()) {
            assert!((x - y).abs() < 1e-15);
        }
        assert_eq!(prep.role(), Role::Prep);
        assert_eq!(prep.num_params(), 3);
    }

    #[test]
    fn test_tp_leading_row_stored_exactly() {
        let mut m = x_pi2_ptm();
        m[[0, 0]] = 1.0 + 4e-12;
        m[[0, 2]] = -3e-12;
        let op = DenseOp::new(m, ParamPolicy::TracePreserving).unwrap();
        let dense = op.todense();
        let stored = dense.as_real().unwrap();
        assert_eq!(stored.row(0).to_vec(), vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(stored[[2, 1]], x_pi2_ptm()[[2, 1]]);

        let basis = Basis::pauli(1).unwrap();
        let u = crate::basis::rotation_unitary('Y', 0.37).unwrap();
        let gy = DenseOp::from_unitary(&u, &basis, ParamPolicy::TracePreserving).unwrap();
        let dense = gy.todense();
        assert_eq!(dense.as_real().unwrap().row(0).to_vec(), vec![1.0, 0.0, 0.0, 0.0]);

        let mut v = ground_state_vec();
        v[0] += 5e-12;
        let prep = DenseVec::prep(v, ParamPolicy::TracePreserving).unwrap();
        assert_eq!(prep.todense().as_real().unwrap()[0], tp_leading_value(4));
    }
}
