// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Labelled tensor-product state spaces.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validation::validate_unique_labels;

/// How a subsystem's states are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    /// Density matrices as Liouville vectors (d² per subsystem)
    Liouville,
    /// State vectors (d per subsystem)
    PureState,
}

/// Ordered subsystem labels with per-label dimensions.
///
/// The first label is the most significant tensor factor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSpace {
    labels: Vec<String>,
    dims: Vec<usize>,
}

impl StateSpace {
    pub fn new(factors: Vec<(String, usize)>) -> Result<Self> {
        if factors.is_empty() {
            return Err(Error::Label("state space needs at least one label".into()));
        }
        let (labels, dims): (Vec<String>, Vec<usize>) = factors.into_iter().unzip();
        validate_unique_labels(&labels)?;
        if let Some(k) = dims.iter().position(|d| *d == 0) {
            return Err(Error::Label(format!("label '{}' has dimension 0", labels[k])));
        }
        Ok(Self { labels, dims })
    }

    /// Qubit space: 4 per label in Liouville form, 2 as pure states.
    pub fn qubits<S: AsRef<str>>(labels: &[S], repr: Representation) -> Result<Self> {
        let d = match repr {
            Representation::Liouville => 4,
            Representation::PureState => 2,
        };
        Self::new(labels.iter().map(|l| (l.as_ref().to_string(), d)).collect())
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Total dimension, the product of the factor dimensions.
    pub fn dim(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn position(&self, label: &str) -> Result<usize> {
        self.labels
            .iter()
            .position(|l| l == label)
            .ok_or_else(|| Error::Label(format!("'{}' is not one of {:?}", label, self.labels)))
    }

    pub fn label_dim(&self, label: &str) -> Result<usize> {
        Ok(self.dims[self.position(label)?])
    }
}
