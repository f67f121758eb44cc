// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Embedding of an operator into a larger tensor-product space.
//!
//! For a state-space index split into target digits t and remaining digits r,
//!
//!   E[(t, r), (t', r')] = base[t, t'] · δ(r, r')
//!
//! where target digits are read in the order the targets are listed.

use ndarray::Array2;

use super::state_space::StateSpace;
use crate::error::{Error, Result};
use crate::linalg::DenseMatrix;
use crate::model::MemberId;
use crate::validation::{validate_dim, validate_target_labels};

/// An operator acting on `targets` and as the identity elsewhere.
#[derive(Debug, Clone)]
pub struct EmbeddedOp {
    state_space: StateSpace,
    targets: Vec<String>,
    positions: Vec<usize>,
    base: MemberId,
}

impl EmbeddedOp {
    /// Validate the target labels against the space.
    ///
    /// The base's dimension is checked against [`target_dim`](Self::target_dim)
    /// when the embedding is inserted into a model.
    pub fn new<S: AsRef<str>>(
        state_space: StateSpace,
        targets: &[S],
        base: MemberId,
    ) -> Result<Self> {
        let targets: Vec<String> = targets.iter().map(|t| t.as_ref().to_string()).collect();
        validate_target_labels(state_space.labels(), &targets)?;
        let positions = targets
            .iter()
            .map(|t| state_space.position(t))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            state_space,
            targets,
            positions,
            base,
        })
    }

    pub fn dim(&self) -> usize {
        self.state_space.dim()
    }

    pub fn state_space(&self) -> &StateSpace {
        &self.state_space
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn base(&self) -> MemberId {
        self.base
    }

    /// Dimension the base must have: the product of the target dimensions.
    pub fn target_dim(&self) -> usize {
        self.positions
            .iter()
            .map(|p| self.state_space.dims()[*p])
            .product()
    }

    /// Dense embedding of a base value.
    pub fn embed(&self, base: &DenseMatrix) -> Result<DenseMatrix> {
        validate_dim("embedded base rows", self.target_dim(), base.nrows())?;
        validate_dim("embedded base columns", self.target_dim(), base.ncols())?;
        Ok(match base {
            DenseMatrix::Real(m) => DenseMatrix::Real(self.embed_array(m)),
            DenseMatrix::Complex(m) => DenseMatrix::Complex(self.embed_array(m)),
        })
    }

    fn embed_array<T: Copy + Default>(&self, base: &Array2<T>) -> Array2<T> {
        let dims = self.state_space.dims();
        let total = self.dim();
        let bd = self.target_dim();

        // Stride of each subsystem digit in the full index
        let mut strides = vec![1usize; dims.len()];
        for k in (0..dims.len().saturating_sub(1)).rev() {
            strides[k] = strides[k + 1] * dims[k + 1];
        }
        let target_dims: Vec<usize> = self.positions.iter().map(|p| dims[*p]).collect();
        let mut base_strides = vec![1usize; target_dims.len()];
        for t in (0..target_dims.len().saturating_sub(1)).rev() {
            base_strides[t] = base_strides[t + 1] * target_dims[t + 1];
        }

        // Full-index offset contributed by each base index
        let offsets: Vec<usize> = (0..bd)
            .map(|c| {
                self.positions
                    .iter()
                    .enumerate()
                    .map(|(t, p)| ((c / base_strides[t]) % target_dims[t]) * strides[*p])
                    .sum()
            })
            .collect();

        let mut out = Array2::from_elem((total, total), T::default());
        for x in 0..total {
            let mut row = 0;
            let mut rest = x;
            for (t, p) in self.positions.iter().enumerate() {
                let digit = (x / strides[*p]) % dims[*p];
                row += digit * base_strides[t];
                rest -= digit * strides[*p];
            }
            for (c, offset) in offsets.iter().enumerate() {
                out[[x, rest + offset]] = base[[row, c]];
            }
        }
        out
    }
}

impl std::fmt::Display for EmbeddedOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "embed[{}] of {}", self.targets.join(","), self.base)
    }
}

/// Reject a base whose dimension does not match the targets.
pub(crate) fn check_base_dim(embedded: &EmbeddedOp, base_dim: usize) -> Result<()> {
    if base_dim != embedded.target_dim() {
        return Err(Error::dimension(
            format!("embedding on {:?}", embedded.targets),
            embedded.target_dim(),
            base_dim,
        ));
    }
    Ok(())
}
