// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ready-made models for the X/Y/idle gate set.
//!
//! Gates use [`ParamPolicy`] from the configuration. When the configured
//! policy is trace preserving, POVM effects are fully parameterized and the
//! last effect is the complement `identity − Σ others`.

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use ndarray::{array, Array1};
use tracing::info;

use super::{Member, Model};
use crate::basis::{rotation_unitary, Basis};
use crate::composite::{EmbeddedOp, Representation, StateSpace};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::lindblad::{LindbladErrorgen, LindbladOp};
use crate::linalg::kron_vec;
use crate::member::{DenseOp, DenseVec, LinearOperator, ParamPolicy};
use crate::povm::Povm;

/// One-qubit model with `Gi`, `Gx`, `Gy`, `rho0` and `Mdefault`.
pub fn xyi_model(config: &Config) -> Result<Model> {
    let basis = Arc::new(Basis::pauli(1)?);
    let mut model = Model::new(4);

    for (label, axis) in [("Gi", None), ("Gx", Some('X')), ("Gy", Some('Y'))] {
        let gate = gate_member(&mut model, axis, &basis, config)?;
        model.register_new(label, gate)?;
    }

    let policy = config.parameterization.default_policy;
    model.register_new("rho0", DenseVec::prep(qubit_state(0), policy)?)?;
    let povm = computational_povm(&mut model, 1, policy)?;
    model.register_new("Mdefault", povm)?;

    info!(
        policy = %policy,
        lindblad = config.parameterization.lindblad.enabled,
        num_params = model.num_params(),
        "Built X/Y/idle model"
    );
    Ok(model)
}

/// `qubits`-qubit model with one shared `Gx` and `Gy` embedded on each qubit.
///
/// Entries are `Gx:Q<k>` and `Gy:Q<k>`, plus `rho0` (all qubits in |0⟩) and
/// `Mdefault` with one effect per bitstring, `Q0` being the leftmost bit.
pub fn embedded_xyi_model(qubits: usize, config: &Config) -> Result<Model> {
    if qubits == 0 || qubits > config.numerics.max_qubits {
        return Err(Error::Config(format!(
            "embedded model needs 1..={} qubits, got {}",
            config.numerics.max_qubits, qubits
        )));
    }
    let labels: Vec<String> = (0..qubits).map(|k| format!("Q{}", k)).collect();
    let space = StateSpace::qubits(&labels, Representation::Liouville)?;
    let basis = Arc::new(Basis::pauli(1)?);
    let mut model = Model::new(space.dim());

    for (name, axis) in [("Gx", 'X'), ("Gy", 'Y')] {
        let gate = gate_member(&mut model, Some(axis), &basis, config)?;
        let base = model.insert(gate)?;
        for q in &labels {
            let embedded = model.insert(EmbeddedOp::new(space.clone(), &[q], base)?)?;
            model.register(&format!("{}:{}", name, q), embedded)?;
        }
    }

    let policy = config.parameterization.default_policy;
    let rho0 = product_vector(&vec![0; qubits]);
    model.register_new("rho0", DenseVec::prep(rho0, policy)?)?;
    let povm = computational_povm(&mut model, qubits, policy)?;
    model.register_new("Mdefault", povm)?;

    info!(
        qubits,
        dim = model.dim(),
        num_params = model.num_params(),
        "Built embedded X/Y model"
    );
    Ok(model)
}

/// A dense gate, or a Lindblad error map after it when enabled.
///
/// The error map's generator is inserted into `model` as its own member.
fn gate_member(
    model: &mut Model,
    axis: Option<char>,
    basis: &Arc<Basis>,
    config: &Config,
) -> Result<Member> {
    let policy = config.parameterization.default_policy;
    let dense = match axis {
        Some(axis) => DenseOp::from_unitary(&rotation_unitary(axis, FRAC_PI_2)?, basis, policy)?,
        None => DenseOp::identity(basis.dim(), policy)?,
    };

    let lindblad = &config.parameterization.lindblad;
    if !lindblad.enabled {
        return Ok(dense.into());
    }
    let errorgen = LindbladErrorgen::full(
        basis.dim(),
        basis.clone(),
        lindblad.support_mode,
        lindblad.param_mode,
    )?
    .with_tolerance(config.numerics.tolerance);
    let errorgen = model.insert(errorgen)?;
    Ok(LindbladOp::from_dense(&dense.todense(), errorgen, lindblad.storage)?.into())
}

/// Liouville vector of |b⟩⟨b| for one qubit.
fn qubit_state(bit: u8) -> Array1<f64> {
    let r = 1.0 / 2.0f64.sqrt();
    if bit == 0 {
        array![r, 0.0, 0.0, r]
    } else {
        array![r, 0.0, 0.0, -r]
    }
}

fn product_vector(bits: &[u8]) -> Array1<f64> {
    bits.iter()
        .fold(array![1.0], |acc, b| kron_vec(&acc, &qubit_state(*b)))
}

/// Computational-basis POVM over `qubits` qubits.
fn computational_povm(model: &mut Model, qubits: usize, policy: ParamPolicy) -> Result<Povm> {
    let outcomes: Vec<(String, Vec<u8>)> = (0..1usize << qubits)
        .map(|n| {
            let bits: Vec<u8> = (0..qubits)
                .map(|k| ((n >> (qubits - 1 - k)) & 1) as u8)
                .collect();
            let label = bits.iter().map(|b| b.to_string()).collect::<String>();
            (label, bits)
        })
        .collect();

    let dim = model.dim();
    let complemented = policy == ParamPolicy::TracePreserving;
    let effect_policy = match policy {
        ParamPolicy::Static => ParamPolicy::Static,
        _ => ParamPolicy::Full,
    };
    let explicit = if complemented {
        outcomes.len() - 1
    } else {
        outcomes.len()
    };

    let mut effects = Vec::with_capacity(explicit);
    for (label, bits) in &outcomes[..explicit] {
        let id = model.insert(DenseVec::effect(product_vector(bits), effect_policy)?)?;
        effects.push((label.clone(), id));
    }

    if complemented {
        let (last, _) = &outcomes[explicit];
        Povm::tp(dim, effects, last.clone(), identity_vector(qubits))
    } else {
        Povm::new(dim, effects)
    }
}

/// Liouville vector of the n-qubit identity.
fn identity_vector(qubits: usize) -> Array1<f64> {
    let one = array![2.0f64.sqrt(), 0.0, 0.0, 0.0];
    (0..qubits).fold(array![1.0], |acc, _| kron_vec(&acc, &one))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lindblad::{ParamMode, SupportMode};
    use crate::linalg::{kron, DenseVector};
    use crate::test_utils::{assert_real_close, x_pi2_ptm};
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn config_with(policy: ParamPolicy) -> Config {
        let mut config = Config::default();
        config.parameterization.default_policy = policy;
        config
    }

    #[test]
    fn test_xyi_parameter_counts() {
        let mut tp = xyi_model(&config_with(ParamPolicy::TracePreserving)).unwrap();
        assert_eq!(tp.num_params(), 3 * 12 + 3 + 4);
        let mut full = xyi_model(&config_with(ParamPolicy::Full)).unwrap();
        assert_eq!(full.num_params(), 3 * 16 + 4 + 2 * 4);
        let mut fixed = xyi_model(&config_with(ParamPolicy::Static)).unwrap();
        assert_eq!(fixed.num_params(), 0);

        let labels: Vec<String> = tp.labels().map(|l| l.to_string()).collect();
        assert_eq!(labels, vec!["Gi", "Gx", "Gy", "rho0", "Mdefault"]);
    }

    #[test]
    fn test_xyi_gates_and_effects() {
        let model = xyi_model(&Config::default()).unwrap();
        let gx = model.todense_op(model.get("Gx").unwrap()).unwrap();
        assert_real_close(gx.as_real().unwrap(), &x_pi2_ptm(), 1e-12);

        let effects = model.povm_effects(model.get("Mdefault").unwrap()).unwrap();
        assert_eq!(effects.keys().cloned().collect::<Vec<_>>(), vec!["0", "1"]);
        let one = effects["1"].as_real().unwrap();
        assert_relative_eq!(one[0], 1.0 / 2.0f64.sqrt(), epsilon = 1e-15);
        assert_relative_eq!(one[3], -1.0 / 2.0f64.sqrt(), epsilon = 1e-15);
    }

    #[test]
    fn test_xyi_with_lindblad_error_maps() {
        let mut config = Config::default();
        config.parameterization.lindblad.enabled = true;
        let mut model = xyi_model(&config).unwrap();
        // all/cptp on one qubit: 3 Hamiltonian + 9 stochastic per gate
        assert_eq!(model.num_params(), 3 * 12 + 3 + 4);
        let gx = model.get("Gx").unwrap();
        let gy = model.get("Gy").unwrap();
        assert_eq!(model.member(gx).unwrap().type_name(), "LindbladOp");
        assert_ne!(model.errorgen_id(gx).unwrap(), model.errorgen_id(gy).unwrap());
        let dense = model.todense_op(gx).unwrap();
        assert_real_close(dense.as_real().unwrap(), &x_pi2_ptm(), 1e-12);

        config.parameterization.lindblad.support_mode = SupportMode::Diagonal;
        config.parameterization.lindblad.param_mode = ParamMode::Depol;
        let mut model = xyi_model(&config).unwrap();
        assert_eq!(model.num_params(), 3 * 4 + 3 + 4);
    }

    #[test]
    fn test_embedded_model_shares_base_gates() {
        let config = Config::default();
        let mut model = embedded_xyi_model(2, &config).unwrap();
        assert_eq!(model.dim(), 16);
        // Gx + Gy once each, rho0 (TP), three full effects
        assert_eq!(model.num_params(), 12 + 12 + 15 + 3 * 16);

        let gx1 = model.todense_op(model.get("Gx:Q1").unwrap()).unwrap();
        let expected = kron(&Array2::<f64>::eye(4), &x_pi2_ptm());
        assert_real_close(gx1.as_real().unwrap(), &expected, 1e-12);

        let gx0 = model.get("Gx:Q0").unwrap();
        let gx1 = model.get("Gx:Q1").unwrap();
        assert_eq!(
            model.member_indices(gx0).unwrap(),
            model.member_indices(gx1).unwrap()
        );
    }

    #[test]
    fn test_embedded_povm_sums_to_identity() {
        let model = embedded_xyi_model(2, &Config::default()).unwrap();
        let effects = model.povm_effects(model.get("Mdefault").unwrap()).unwrap();
        assert_eq!(
            effects.keys().cloned().collect::<Vec<_>>(),
            vec!["00", "01", "10", "11"]
        );
        let sum = effects
            .values()
            .filter_map(DenseVector::as_real)
            .fold(Array1::<f64>::zeros(16), |acc, e| acc + e);
        assert_relative_eq!(sum[0], 2.0, epsilon = 1e-12);
        for x in sum.iter().skip(1) {
            assert_relative_eq!(*x, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_embedded_model_qubit_limit() {
        let config = Config::default();
        assert!(matches!(
            embedded_xyi_model(0, &config),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            embedded_xyi_model(config.numerics.max_qubits + 1, &config),
            Err(Error::Config(_))
        ));
    }
}
