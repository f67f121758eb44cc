// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Measurement effect collections.
//!
//! - [`Povm`]: keyed effect members, optionally completed by a
//!   parameter-free complement `identity − Σ effects`
//! - [`LindbladPovm`]: static base effects behind one shared error map

use indexmap::IndexMap;
use ndarray::{Array1, Array2};

use crate::error::{Error, Result};
use crate::lindblad::{LindbladOp, Storage};
use crate::linalg::DenseVector;
use crate::model::MemberId;
use crate::validation::{validate_dim, validate_unique_labels};

/// Keyed effect vectors, each a model member.
#[derive(Debug, Clone)]
pub struct Povm {
    dim: usize,
    effects: IndexMap<String, MemberId>,
    complement: Option<(String, Array1<f64>)>,
}

impl Povm {
    /// Unconstrained POVM.
    pub fn new(dim: usize, effects: Vec<(String, MemberId)>) -> Result<Self> {
        Ok(Self {
            dim,
            effects: collect_effects(effects)?,
            complement: None,
        })
    }

    /// POVM whose `complement_label` effect is `identity − Σ effects`.
    pub fn tp(
        dim: usize,
        effects: Vec<(String, MemberId)>,
        complement_label: impl Into<String>,
        identity: Array1<f64>,
    ) -> Result<Self> {
        let complement_label = complement_label.into();
        validate_dim("POVM identity vector", dim, identity.len())?;
        let effects = collect_effects(effects)?;
        if effects.contains_key(&complement_label) {
            return Err(Error::Label(format!(
                "complement label '{}' is also a member effect",
                complement_label
            )));
        }
        Ok(Self {
            dim,
            effects,
            complement: Some((complement_label, identity)),
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Member effects in insertion order, excluding the complement.
    pub fn effects(&self) -> &IndexMap<String, MemberId> {
        &self.effects
    }

    pub fn complement_label(&self) -> Option<&str> {
        self.complement.as_ref().map(|(l, _)| l.as_str())
    }

    /// Effect labels including the complement.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.effects.keys().cloned().collect();
        if let Some((l, _)) = &self.complement {
            labels.push(l.clone());
        }
        labels
    }

    /// Assemble dense effects from the member effects' dense values.
    pub fn assemble(&self, member_values: Vec<DenseVector>) -> Result<IndexMap<String, DenseVector>> {
        validate_dim("POVM effect count", self.effects.len(), member_values.len())?;
        let mut out: IndexMap<String, DenseVector> = self
            .effects
            .keys()
            .cloned()
            .zip(member_values)
            .collect();
        if let Some((label, identity)) = &self.complement {
            let complement = out
                .values()
                .fold(DenseVector::Real(identity.clone()), |acc, e| acc.sub(e));
            out.insert(label.clone(), complement);
        }
        Ok(out)
    }
}

fn collect_effects(effects: Vec<(String, MemberId)>) -> Result<IndexMap<String, MemberId>> {
    let labels: Vec<String> = effects.iter().map(|(l, _)| l.clone()).collect();
    validate_unique_labels(&labels)?;
    Ok(effects.into_iter().collect())
}

/// Static base effects `E_k` measured after one error map: `exp(L)ᵀ E_k`.
#[derive(Debug, Clone)]
pub struct LindbladPovm {
    map: LindbladOp,
    effects: IndexMap<String, Array1<f64>>,
}

impl LindbladPovm {
    pub fn new(
        dim: usize,
        effects: Vec<(String, Array1<f64>)>,
        errorgen: MemberId,
        storage: Storage,
    ) -> Result<Self> {
        let labels: Vec<String> = effects.iter().map(|(l, _)| l.clone()).collect();
        validate_unique_labels(&labels)?;
        for (_, e) in &effects {
            validate_dim("Lindblad POVM effect", dim, e.len())?;
        }
        Ok(Self {
            map: LindbladOp::new(dim, None, errorgen, storage)?,
            effects: effects.into_iter().collect(),
        })
    }

    /// The shared error map, without a base.
    pub fn map(&self) -> &LindbladOp {
        &self.map
    }

    pub(crate) fn map_mut(&mut self) -> &mut LindbladOp {
        &mut self.map
    }

    pub fn dim(&self) -> usize {
        self.map.dim()
    }

    pub fn labels(&self) -> Vec<String> {
        self.effects.keys().cloned().collect()
    }

    /// Dense effects after the error map `exp_l`.
    pub fn dense_effects(&self, exp_l: &Array2<f64>) -> IndexMap<String, DenseVector> {
        self.effects
            .iter()
            .map(|(label, e)| (label.clone(), DenseVector::Real(exp_l.t().dot(e))))
            .collect()
    }
}
