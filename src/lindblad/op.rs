// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Exponentiated error generators: `exp(L)·base` operators and vectors.
//!
//! These members hold the [`MemberId`] of a [`LindbladErrorgen`] stored in
//! the same model arena, so several of them can share one generator. The
//! model passes the generator in whenever a dense value is needed.

use ndarray::{Array1, Array2};

use super::errorgen::LindbladErrorgen;
use super::terms::Storage;
use crate::error::{Error, Result};
use crate::linalg::{matrix_exp_real, DenseMatrix, DenseVector};
use crate::member::{ModelMember, Role};
use crate::model::MemberId;
use crate::validation::validate_dim;

/// exp(L) of a generator.
pub fn error_map(errorgen: &LindbladErrorgen) -> Result<Array2<f64>> {
    matrix_exp_real(&errorgen.generator_matrix())
}

/// Operator `exp(L)·base` with a frozen base and a shared generator.
#[derive(Debug, Clone)]
pub struct LindbladOp {
    dim: usize,
    errorgen: MemberId,
    base: Option<Array2<f64>>,
    storage: Storage,
    cached: Option<Array2<f64>>,
}

impl LindbladOp {
    /// Apply the generator `errorgen` after `base`; `None` means the identity.
    pub fn new(
        dim: usize,
        base: Option<Array2<f64>>,
        errorgen: MemberId,
        storage: Storage,
    ) -> Result<Self> {
        if let Some(b) = &base {
            validate_dim("Lindblad base rows", dim, b.nrows())?;
            validate_dim("Lindblad base columns", dim, b.ncols())?;
        }
        Ok(Self {
            dim,
            errorgen,
            base,
            storage,
            cached: None,
        })
    }

    /// Take the base from a real dense value.
    pub fn from_dense(base: &DenseMatrix, errorgen: MemberId, storage: Storage) -> Result<Self> {
        let b = base
            .as_real()
            .ok_or_else(|| Error::Constraint("Lindblad base must be a real superoperator".into()))?;
        Self::new(b.nrows(), Some(b.clone()), errorgen, storage)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Arena handle of the generator.
    pub fn errorgen(&self) -> MemberId {
        self.errorgen
    }

    pub fn storage(&self) -> Storage {
        self.storage
    }

    pub fn base(&self) -> Option<&Array2<f64>> {
        self.base.as_ref()
    }

    /// `exp(L)·base` for the given generator, ignoring the cache.
    pub fn compute(&self, errorgen: &LindbladErrorgen) -> Result<Array2<f64>> {
        validate_dim("Lindblad generator", self.dim, errorgen.dim())?;
        Ok(self.apply(error_map(errorgen)?))
    }

    /// `exp_l·base` for an already exponentiated generator.
    pub fn apply(&self, exp_l: Array2<f64>) -> Array2<f64> {
        match &self.base {
            Some(b) => exp_l.dot(b),
            None => exp_l,
        }
    }

    /// The value stored under dense storage.
    pub fn cached(&self) -> Option<&Array2<f64>> {
        self.cached.as_ref()
    }

    pub(crate) fn set_cached(&mut self, value: Array2<f64>) {
        if self.storage == Storage::Dense {
            self.cached = Some(value);
        }
    }

    /// `exp(L)·base`, from the cache when one is stored.
    pub fn matrix(&self, errorgen: &LindbladErrorgen) -> Result<Array2<f64>> {
        match &self.cached {
            Some(m) => Ok(m.clone()),
            None => self.compute(errorgen),
        }
    }
}

/// Vector `exp(L)|ρ0⟩⟩` (prep) or `⟨⟨E|exp(L)` (effect).
#[derive(Debug, Clone)]
pub struct LindbladSpamVec {
    map: LindbladOp,
    base: Array1<f64>,
    role: Role,
}

impl LindbladSpamVec {
    pub fn new(base: Array1<f64>, errorgen: MemberId, role: Role, storage: Storage) -> Result<Self> {
        Ok(Self {
            map: LindbladOp::new(base.len(), None, errorgen, storage)?,
            base,
            role,
        })
    }

    /// The error map, without a base.
    pub fn map(&self) -> &LindbladOp {
        &self.map
    }

    pub(crate) fn map_mut(&mut self) -> &mut LindbladOp {
        &mut self.map
    }

    pub fn base(&self) -> &Array1<f64> {
        &self.base
    }

    pub fn dim(&self) -> usize {
        self.base.len()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Dense vector after the error map `exp_l`.
    pub fn apply(&self, exp_l: &Array2<f64>) -> DenseVector {
        let v = match self.role {
            Role::Prep => exp_l.dot(&self.base),
            Role::Effect => exp_l.t().dot(&self.base),
        };
        DenseVector::Real(v)
    }
}
