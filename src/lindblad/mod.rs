// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Lindblad-constrained error generators and their exponential maps.
//!
//! A generator in GKSL form,
//!
//!   L(ρ) = Σ_i −iλ_i[B_i, ρ] + Σ_ij η_ij (B_i ρ B_j† − ½{B_j†B_i, ρ}) + Σ_i α_i Tr(ρ) B_i/√n
//!
//! is parameterized so that the stochastic matrix η can be kept positive
//! semidefinite, which makes `exp(L)` completely positive and trace preserving.
//!
//! This module provides:
//! - [`LindbladErrorgen`]: coefficient dictionaries, error rates, parameter maps
//! - [`LindbladOp`]: `exp(L)·base` with dense or lazy storage, driven by a
//!   generator held in the model arena
//! - [`LindbladSpamVec`]: error maps applied to preparations and effects
//!
//! # Example
//!
//! ```ignore
//! use qubit_os_opmodel::lindblad::{ErrorTerm, LindbladErrorgen, LindbladOp, ParamMode, Storage, SupportMode};
//!
//! let basis = Arc::new(Basis::pauli(1)?);
//! let mut coeffs = CoeffDict::new();
//! coeffs.insert(ErrorTerm::stochastic("Z"), Complex64::new(0.01, 0.0));
//! let gen = LindbladErrorgen::new(4, &coeffs, basis, SupportMode::Diagonal, ParamMode::Cptp)?;
//! let noise = model.insert(gen)?;
//! let gx = model.register_new("Gx", LindbladOp::new(4, Some(x_pi2), noise, Storage::Dense)?)?;
//! let gy = model.register_new("Gy", LindbladOp::new(4, Some(y_pi2), noise, Storage::Dense)?)?;
//! ```
//!
//! # References
//!
//! - Lindblad, G. (1976). Commun. Math. Phys. 48, 119.
//!   DOI: 10.1007/BF01608499
//! - Gorini, V., Kossakowski, A., & Sudarshan, E. C. G. (1976). J. Math. Phys. 17, 821.
//!   DOI: 10.1063/1.522979

pub mod dissipator;
pub mod errorgen;
pub mod op;
pub mod terms;

pub use errorgen::{LindbladErrorgen, DEFAULT_TOLERANCE};
pub use op::{error_map, LindbladOp, LindbladSpamVec};
pub use terms::{coeff_entries, CoeffDict, CoeffEntry, ErrorTerm, ParamMode, Storage, SupportMode};
