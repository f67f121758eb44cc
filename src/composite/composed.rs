// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ordered composition of operators.

use crate::linalg::DenseMatrix;
use crate::model::MemberId;

/// Composition of factors applied in listed order.
///
/// The dense form is `F_{n-1} ··· F_1 · F_0`, the identity when empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedOp {
    dim: usize,
    factors: Vec<MemberId>,
}

impl ComposedOp {
    pub fn new(dim: usize, factors: Vec<MemberId>) -> Self {
        Self { dim, factors }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn factors(&self) -> &[MemberId] {
        &self.factors
    }

    /// Multiply dense factor values given in listed order.
    pub fn product<I>(&self, factors: I) -> DenseMatrix
    where
        I: IntoIterator<Item = DenseMatrix>,
    {
        factors
            .into_iter()
            .fold(DenseMatrix::identity(self.dim, false), |acc, f| f.dot(&acc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_product_applies_first_factor_first() {
        let op = ComposedOp::new(2, vec![]);
        let a = DenseMatrix::from(array![[1.0, 1.0], [0.0, 1.0]]);
        let b = DenseMatrix::from(array![[0.0, 1.0], [1.0, 0.0]]);
        let p = op.product(vec![a.clone(), b.clone()]);
        assert_eq!(p, b.dot(&a));
        assert_ne!(p, a.dot(&b));
    }

    #[test]
    fn test_empty_product_is_identity() {
        let op = ComposedOp::new(3, vec![]);
        assert_eq!(op.product(Vec::new()), DenseMatrix::identity(3, false));
    }
}
