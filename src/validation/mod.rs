// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Input validation shared by model members.

use std::collections::HashSet;

use crate::error::{Error, Result};

/// Validate a parameter vector against the expected length.
///
/// Rejects NaN and Inf entries so that a failed write never reaches the
/// member's storage.
pub fn validate_param_vector(v: &[f64], expected: usize) -> Result<()> {
    if v.len() != expected {
        return Err(Error::ParamLength {
            expected,
            actual: v.len(),
        });
    }

    if let Some(index) = v.iter().position(|x| !x.is_finite()) {
        return Err(Error::NonFinite { index });
    }

    Ok(())
}

/// Validate that a matrix shape is square with the expected dimension.
pub fn validate_square(context: &str, rows: usize, cols: usize) -> Result<()> {
    if rows != cols {
        return Err(Error::dimension(format!("{} (non-square)", context), rows, cols));
    }
    if rows == 0 {
        return Err(Error::dimension(context, 1, 0));
    }
    Ok(())
}

/// Validate that two connected entities have the same dimension.
pub fn validate_dim(context: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::dimension(context, expected, actual));
    }
    Ok(())
}

/// Validate a target label set against the full subsystem label set.
///
/// Targets must be nonempty, free of duplicates, and contained in `all`.
pub fn validate_target_labels(all: &[String], targets: &[String]) -> Result<()> {
    if targets.is_empty() {
        return Err(Error::Label("target label set is empty".into()));
    }

    let mut seen = HashSet::with_capacity(targets.len());
    for t in targets {
        if !seen.insert(t.as_str()) {
            return Err(Error::Label(format!("target label '{}' is repeated", t)));
        }
        if !all.iter().any(|l| l == t) {
            return Err(Error::Label(format!(
                "target label '{}' is not one of {:?}",
                t, all
            )));
        }
    }

    Ok(())
}

/// Validate that a label list has no repeats.
pub fn validate_unique_labels(labels: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(labels.len());
    for l in labels {
        if l.is_empty() {
            return Err(Error::Label("empty subsystem label".into()));
        }
        if !seen.insert(l.as_str()) {
            return Err(Error::Label(format!("label '{}' is repeated", l)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_validate_param_vector() {
        assert!(validate_param_vector(&[0.0, 1.0], 2).is_ok());
        assert!(matches!(
            validate_param_vector(&[0.0], 2),
            Err(Error::ParamLength {
                expected: 2,
                actual: 1
            })
        ));
        assert!(matches!(
            validate_param_vector(&[0.0, f64::NAN], 2),
            Err(Error::NonFinite { index: 1 })
        ));
        assert!(matches!(
            validate_param_vector(&[f64::INFINITY], 1),
            Err(Error::NonFinite { index: 0 })
        ));
    }

    #[test]
    fn test_validate_square() {
        assert!(validate_square("op", 4, 4).is_ok());
        assert!(validate_square("op", 4, 3).is_err());
        assert!(validate_square("op", 0, 0).is_err());
    }

    #[test]
    fn test_validate_target_labels() {
        let all = labels(&["Q0", "Q1", "Q2"]);
        assert!(validate_target_labels(&all, &labels(&["Q1"])).is_ok());
        assert!(validate_target_labels(&all, &labels(&["Q2", "Q0"])).is_ok());
        assert!(validate_target_labels(&all, &[]).is_err());
        assert!(validate_target_labels(&all, &labels(&["Q3"])).is_err());
        assert!(validate_target_labels(&all, &labels(&["Q1", "Q1"])).is_err());
    }

    #[test]
    fn test_validate_unique_labels() {
        assert!(validate_unique_labels(&labels(&["a", "b"])).is_ok());
        assert!(validate_unique_labels(&labels(&["a", "a"])).is_err());
        assert!(validate_unique_labels(&labels(&[""])).is_err());
    }
}
