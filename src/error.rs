// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the operator model.

use std::fmt;

/// Result type alias for operator-model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Operator-model error types.
#[derive(Debug)]
pub enum Error {
    /// Dimensions of connected entities disagree
    Dimension {
        context: String,
        expected: usize,
        actual: usize,
    },
    /// Parameter vector has the wrong length
    ParamLength { expected: usize, actual: usize },
    /// Parameter vector contains NaN or Inf
    NonFinite { index: usize },
    /// Error-generator coefficient error
    Term(TermError),
    /// Malformed label or label set
    Label(String),
    /// Unknown basis or basis label
    Basis(String),
    /// Value violates the parameterization constraint
    Constraint(String),
    /// A numerical kernel could not produce a finite result
    Numerical(String),
    /// Parameters accessed without a current allocation
    StaleAllocation(String),
    /// Unknown member or label
    NotFound(String),
    /// Configuration error
    Config(String),
    /// IO error
    Io(std::io::Error),
    /// Serialization error
    Serialization(String),
}

impl Error {
    /// Create a dimension mismatch error.
    pub fn dimension(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Error::Dimension {
            context: context.into(),
            expected,
            actual,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Dimension {
                context,
                expected,
                actual,
            } => write!(
                f,
                "Dimension mismatch in {}: expected {}, got {}",
                context, expected, actual
            ),
            Error::ParamLength { expected, actual } => write!(
                f,
                "Parameter vector length mismatch: expected {}, got {}",
                expected, actual
            ),
            Error::NonFinite { index } => {
                write!(f, "Parameter vector contains a non-finite value at index {}", index)
            }
            Error::Term(e) => write!(f, "Error term: {}", e),
            Error::Label(msg) => write!(f, "Malformed label: {}", msg),
            Error::Basis(msg) => write!(f, "Basis error: {}", msg),
            Error::Constraint(msg) => write!(f, "Constraint violated: {}", msg),
            Error::Numerical(msg) => write!(f, "Numerical failure: {}", msg),
            Error::StaleAllocation(msg) => write!(f, "Stale parameter allocation: {}", msg),
            Error::NotFound(what) => write!(f, "Not found: {}", what),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Term(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<TermError> for Error {
    fn from(e: TermError) -> Self {
        Error::Term(e)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Coefficient-dictionary errors raised by Lindblad generators.
#[derive(Debug, Clone, PartialEq)]
pub enum TermError {
    /// Term cannot be represented under the active support mode
    Unsupported { term: String, mode: String },
    /// Value incompatible with a positivity-constrained parameter map
    NonPositive { term: String, value: f64 },
    /// Coefficients that must agree (shared parameter, Hermitian pair) do not
    Inconsistent(String),
    /// Support mode and parameter-map mode cannot be combined
    InvalidModes { support: String, param: String },
}

impl fmt::Display for TermError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermError::Unsupported { term, mode } => {
                write!(f, "Term {} is not supported under '{}' support", term, mode)
            }
            TermError::NonPositive { term, value } => write!(
                f,
                "Term {} has value {} which breaks the positivity constraint",
                term, value
            ),
            TermError::Inconsistent(msg) => write!(f, "Inconsistent coefficients: {}", msg),
            TermError::InvalidModes { support, param } => write!(
                f,
                "Parameter mode '{}' cannot be used with '{}' support",
                param, support
            ),
        }
    }
}

impl std::error::Error for TermError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn test_error_display_dimension() {
        let e = Error::dimension("composition", 4, 16);
        assert_eq!(
            e.to_string(),
            "Dimension mismatch in composition: expected 4, got 16"
        );
    }

    #[test]
    fn test_error_display_param_length() {
        let e = Error::ParamLength {
            expected: 12,
            actual: 11,
        };
        assert_eq!(
            e.to_string(),
            "Parameter vector length mismatch: expected 12, got 11"
        );
    }

    #[test]
    fn test_error_display_non_finite() {
        let e = Error::NonFinite { index: 3 };
        assert_eq!(
            e.to_string(),
            "Parameter vector contains a non-finite value at index 3"
        );
    }

    #[test]
    fn test_error_display_stale() {
        let e = Error::StaleAllocation("model changed".into());
        assert_eq!(e.to_string(), "Stale parameter allocation: model changed");
    }

    #[test]
    fn test_term_error_display_unsupported() {
        let e = TermError::Unsupported {
            term: "S(X,Y)".into(),
            mode: "diagonal".into(),
        };
        assert_eq!(
            e.to_string(),
            "Term S(X,Y) is not supported under 'diagonal' support"
        );
    }

    #[test]
    fn test_term_error_display_non_positive() {
        let e = TermError::NonPositive {
            term: "S(Z)".into(),
            value: -0.5,
        };
        assert_eq!(
            e.to_string(),
            "Term S(Z) has value -0.5 which breaks the positivity constraint"
        );
    }

    #[test]
    fn test_term_error_display_invalid_modes() {
        let e = TermError::InvalidModes {
            support: "all".into(),
            param: "depol".into(),
        };
        assert_eq!(
            e.to_string(),
            "Parameter mode 'depol' cannot be used with 'all' support"
        );
    }

    #[test]
    fn test_error_source() {
        let e = Error::Io(std::io::Error::other("disk"));
        assert!(e.source().is_some());
        let e: Error = TermError::Inconsistent("x".into()).into();
        assert!(e.source().is_some());
        let e = Error::Label("x".into());
        assert!(e.source().is_none());
    }

    #[test]
    fn test_from_term_error() {
        let e: Error = TermError::Inconsistent("x".into()).into();
        assert!(matches!(e, Error::Term(TermError::Inconsistent(_))));
    }

    #[test]
    fn test_from_serde_yaml_error() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("{{{{").unwrap_err();
        let e: Error = yaml_err.into();
        assert!(matches!(e, Error::Serialization(_)));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad}").unwrap_err();
        let e: Error = json_err.into();
        assert!(matches!(e, Error::Serialization(_)));
    }
}
