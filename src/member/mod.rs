// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! The uniform parameter-vector protocol shared by every model member.
//!
//! Members are plain structs implementing capability traits:
//!
//! - [`ModelMember`]: `dim`, `num_params`, `to_vector`, `from_vector`
//! - [`LinearOperator`]: dense d×d materialization
//! - [`SpamVector`]: dense length-d materialization plus a [`Role`]
//!
//! Composite members (composition, embedding, POVMs) hold child handles and
//! are driven through the [`Model`](crate::model::Model) arena instead.

pub mod dense;

pub use dense::{DenseOp, DenseVec};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::linalg::{DenseMatrix, DenseVector};

/// Parameter-vector protocol.
///
/// Invariant: `to_vector().len() == num_params()`. `from_vector` fails
/// without touching the member when the length is wrong.
pub trait ModelMember {
    /// Dimension of the space the member acts on.
    fn dim(&self) -> usize;

    /// Number of real parameters.
    fn num_params(&self) -> usize;

    /// Current parameter values in the member's documented order.
    fn to_vector(&self) -> Vec<f64>;

    /// Overwrite the parameters.
    fn from_vector(&mut self, v: &[f64]) -> Result<()>;
}

/// A member with a dense d×d matrix form.
pub trait LinearOperator: ModelMember {
    fn todense(&self) -> DenseMatrix;
}

/// A member with a dense length-d vector form.
pub trait SpamVector: ModelMember {
    fn role(&self) -> Role;
    fn todense(&self) -> DenseVector;
}

/// Parameterization policy of a dense member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamPolicy {
    /// No parameters
    Static,
    /// Every element is a parameter
    Full,
    /// Leading row (operators) or entry (vectors) fixed
    #[serde(rename = "tp")]
    TracePreserving,
}

impl fmt::Display for ParamPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamPolicy::Static => "static",
            ParamPolicy::Full => "full",
            ParamPolicy::TracePreserving => "tp",
        };
        f.write_str(s)
    }
}

impl FromStr for ParamPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "static" => Ok(ParamPolicy::Static),
            "full" => Ok(ParamPolicy::Full),
            "tp" => Ok(ParamPolicy::TracePreserving),
            other => Err(Error::Config(format!(
                "unknown parameterization '{}' (expected static, full or tp)",
                other
            ))),
        }
    }
}

/// Semantic role of a vector member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Prep,
    Effect,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Prep => f.write_str("prep"),
            Role::Effect => f.write_str("effect"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parse() {
        assert_eq!("full".parse::<ParamPolicy>().unwrap(), ParamPolicy::Full);
        assert_eq!(
            "TP".parse::<ParamPolicy>().unwrap(),
            ParamPolicy::TracePreserving
        );
        assert_eq!("static".parse::<ParamPolicy>().unwrap(), ParamPolicy::Static);
        assert!("cptp".parse::<ParamPolicy>().is_err());
    }

    #[test]
    fn test_policy_display_round_trip() {
        for p in [
            ParamPolicy::Static,
            ParamPolicy::Full,
            ParamPolicy::TracePreserving,
        ] {
            assert_eq!(p.to_string().parse::<ParamPolicy>().unwrap(), p);
        }
    }
}
