// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! QubitOS parameterized operator model
//!
//! This crate represents the operations of a quantum process model (gates,
//! state preparations, measurements) as parameterized members that share
//! one real parameter vector.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │                 Model                    │
//! │   labels → members, global parameters    │
//! ├──────────────────┬──────────────────────┤
//! │ ComposedOp       │ EmbeddedOp  Povm     │
//! │ (factor ids)     │ (base id)   (effects)│
//! ├──────────────────┴──────────────────────┤
//! │ DenseOp/DenseVec │ LindbladOp / SpamVec │
//! │ (static,full,tp) │ (exp(L) · base)      │
//! ├──────────────────┴──────────────────────┤
//! │      Basis · linalg · validation         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`basis`]: Operator bases and superoperator construction
//! - [`member`]: Member traits and dense members
//! - [`lindblad`]: Lindblad error generators and error maps
//! - [`composite`]: Composed and embedded operators
//! - [`povm`]: Measurement effect collections
//! - [`model`]: Member arena, labels and parameter allocation
//! - [`config`]: Configuration management
//! - [`validation`]: Input validation utilities
//! - [`error`]: Error types

pub mod basis;
pub mod composite;
pub mod config;
pub mod error;
pub mod linalg;
pub mod lindblad;
pub mod member;
pub mod model;
pub mod povm;
pub mod validation;

pub use basis::Basis;
pub use config::Config;
pub use error::{Error, Result};
pub use member::{LinearOperator, ModelMember, ParamPolicy, Role, SpamVector};
pub use model::{Label, Member, MemberId, Model, SharedModel};

#[cfg(test)]
pub mod test_utils;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
