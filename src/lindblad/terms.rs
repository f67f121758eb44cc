// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error-term keys, coefficient dictionaries and generator modes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Key of one Lindblad coefficient.
///
/// Labels are basis labels (e.g. `"X"`, `"ZI"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorTerm {
    /// Hamiltonian coefficient λ_l
    Hamiltonian(String),
    /// Diagonal stochastic coefficient η_ll
    Stochastic(String),
    /// Off-diagonal stochastic coefficient η_ij
    StochasticOffDiag(String, String),
    /// Affine coefficient α_l
    Affine(String),
}

impl ErrorTerm {
    pub fn hamiltonian(label: impl Into<String>) -> Self {
        ErrorTerm::Hamiltonian(label.into())
    }

    pub fn stochastic(label: impl Into<String>) -> Self {
        ErrorTerm::Stochastic(label.into())
    }

    pub fn off_diag(a: impl Into<String>, b: impl Into<String>) -> Self {
        ErrorTerm::StochasticOffDiag(a.into(), b.into())
    }

    pub fn affine(label: impl Into<String>) -> Self {
        ErrorTerm::Affine(label.into())
    }

    /// Basis labels named by this key.
    pub fn labels(&self) -> Vec<&str> {
        match self {
            ErrorTerm::Hamiltonian(l) | ErrorTerm::Stochastic(l) | ErrorTerm::Affine(l) => {
                vec![l.as_str()]
            }
            ErrorTerm::StochasticOffDiag(a, b) => vec![a.as_str(), b.as_str()],
        }
    }

    /// Whether the coefficient is constrained to be real.
    pub fn is_real_valued(&self) -> bool {
        !matches!(self, ErrorTerm::StochasticOffDiag(..))
    }
}

impl fmt::Display for ErrorTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorTerm::Hamiltonian(l) => write!(f, "H({})", l),
            ErrorTerm::Stochastic(l) => write!(f, "S({})", l),
            ErrorTerm::StochasticOffDiag(a, b) => write!(f, "S({},{})", a, b),
            ErrorTerm::Affine(l) => write!(f, "A({})", l),
        }
    }
}

impl FromStr for ErrorTerm {
    type Err = Error;

    /// Parse `H(X)`, `S(X)`, `S(X,Y)` or `A(X)`.
    fn from_str(s: &str) -> Result<Self> {
        let bad = || Error::Label(format!("'{}' is not an error term key", s));
        let s = s.trim();
        let (kind, rest) = s.split_at(s.find('(').ok_or_else(bad)?);
        let inner = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(bad)?;
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(bad());
        }
        match (kind, parts.as_slice()) {
            ("H", [l]) => Ok(ErrorTerm::hamiltonian(*l)),
            ("S", [l]) => Ok(ErrorTerm::stochastic(*l)),
            ("S", [a, b]) => Ok(ErrorTerm::off_diag(*a, *b)),
            ("A", [l]) => Ok(ErrorTerm::affine(*l)),
            _ => Err(bad()),
        }
    }
}

/// Coefficient dictionary keyed by error term.
pub type CoeffDict = BTreeMap<ErrorTerm, Complex64>;

/// Serializable coefficient entry, used for JSON reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoeffEntry {
    pub term: String,
    pub re: f64,
    pub im: f64,
}

/// Flatten a coefficient dictionary into serializable entries.
pub fn coeff_entries(dict: &CoeffDict) -> Vec<CoeffEntry> {
    dict.iter()
        .map(|(term, z)| CoeffEntry {
            term: term.to_string(),
            re: z.re,
            im: z.im,
        })
        .collect()
}

/// Which non-Hamiltonian terms a generator carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportMode {
    /// Hamiltonian terms only
    Hamiltonian,
    /// Diagonal stochastic terms
    Diagonal,
    /// Diagonal stochastic plus affine terms
    DiagAffine,
    /// Full Hermitian stochastic matrix
    All,
}

impl SupportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportMode::Hamiltonian => "hamiltonian",
            SupportMode::Diagonal => "diagonal",
            SupportMode::DiagAffine => "diag_affine",
            SupportMode::All => "all",
        }
    }

    /// Whether the stochastic matrix is restricted to its diagonal.
    pub fn is_diagonal(&self) -> bool {
        matches!(self, SupportMode::Diagonal | SupportMode::DiagAffine)
    }
}

impl fmt::Display for SupportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupportMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "hamiltonian" | "ham" => Ok(SupportMode::Hamiltonian),
            "diagonal" => Ok(SupportMode::Diagonal),
            "diag_affine" => Ok(SupportMode::DiagAffine),
            "all" => Ok(SupportMode::All),
            other => Err(Error::Config(format!("unknown support mode '{}'", other))),
        }
    }
}

/// How parameters map onto the stochastic coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamMode {
    /// η guaranteed positive semidefinite
    Cptp,
    /// One shared parameter p with η_kk = p²
    Depol,
    /// One shared parameter p with η_kk = p
    RelDepol,
    /// Coefficients used directly
    Unconstrained,
}

impl ParamMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamMode::Cptp => "cptp",
            ParamMode::Depol => "depol",
            ParamMode::RelDepol => "reldepol",
            ParamMode::Unconstrained => "unconstrained",
        }
    }

    /// Whether all diagonal coefficients share one parameter.
    pub fn is_shared(&self) -> bool {
        matches!(self, ParamMode::Depol | ParamMode::RelDepol)
    }

    /// Whether diagonal coefficients are forced non-negative.
    pub fn is_positive(&self) -> bool {
        matches!(self, ParamMode::Cptp | ParamMode::Depol)
    }
}

impl fmt::Display for ParamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cptp" => Ok(ParamMode::Cptp),
            "depol" => Ok(ParamMode::Depol),
            "reldepol" => Ok(ParamMode::RelDepol),
            "unconstrained" => Ok(ParamMode::Unconstrained),
            other => Err(Error::Config(format!("unknown parameter mode '{}'", other))),
        }
    }
}

/// How an exponentiated generator keeps its dense value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Storage {
    /// Cached matrix refreshed on every parameter write
    #[default]
    Dense,
    /// Recomputed on every `todense`
    Lazy,
}

impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Storage::Dense => f.write_str("dense"),
            Storage::Lazy => f.write_str("lazy"),
        }
    }
}

impl FromStr for Storage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "dense" => Ok(Storage::Dense),
            "lazy" => Ok(Storage::Lazy),
            other => Err(Error::Config(format!("unknown storage '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_display_and_parse() {
        let terms = [
            ErrorTerm::hamiltonian("X"),
            ErrorTerm::stochastic("ZI"),
            ErrorTerm::off_diag("X", "Y"),
            ErrorTerm::affine("Z"),
        ];
        let shown: Vec<String> = terms.iter().map(|t| t.to_string()).collect();
        assert_eq!(shown, vec!["H(X)", "S(ZI)", "S(X,Y)", "A(Z)"]);
        for t in &terms {
            assert_eq!(&t.to_string().parse::<ErrorTerm>().unwrap(), t);
        }
        assert_eq!(
            " S( X , Y ) ".parse::<ErrorTerm>().unwrap(),
            ErrorTerm::off_diag("X", "Y")
        );
    }

    #[test]
    fn test_term_parse_rejects_malformed() {
        for s in ["X", "H()", "H(X,Y)", "Q(X)", "S(X,)", "A(X", "S(X,Y,Z)"] {
            assert!(s.parse::<ErrorTerm>().is_err(), "{} should not parse", s);
        }
    }

    #[test]
    fn test_term_labels_and_reality() {
        assert_eq!(ErrorTerm::off_diag("X", "Z").labels(), vec!["X", "Z"]);
        assert!(ErrorTerm::stochastic("X").is_real_valued());
        assert!(!ErrorTerm::off_diag("X", "Y").is_real_valued());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("all".parse::<SupportMode>().unwrap(), SupportMode::All);
        assert_eq!(
            "diag-affine".parse::<SupportMode>().unwrap(),
            SupportMode::DiagAffine
        );
        assert_eq!("CPTP".parse::<ParamMode>().unwrap(), ParamMode::Cptp);
        assert_eq!("reldepol".parse::<ParamMode>().unwrap(), ParamMode::RelDepol);
        assert_eq!("lazy".parse::<Storage>().unwrap(), Storage::Lazy);
        assert!("cp".parse::<ParamMode>().is_err());
        assert!("most".parse::<SupportMode>().is_err());
    }

    #[test]
    fn test_mode_serde_names_match_display() {
        let s = serde_json::to_string(&SupportMode::DiagAffine).unwrap();
        assert_eq!(s, "\"diag_affine\"");
        let p: ParamMode = serde_json::from_str("\"reldepol\"").unwrap();
        assert_eq!(p, ParamMode::RelDepol);
    }

    #[test]
    fn test_coeff_entries() {
        let mut d = CoeffDict::new();
        d.insert(ErrorTerm::off_diag("X", "Y"), Complex64::new(0.1, -0.2));
        d.insert(ErrorTerm::hamiltonian("Z"), Complex64::new(0.5, 0.0));
        let entries = coeff_entries(&d);
        assert_eq!(entries[0].term, "H(Z)");
        assert_eq!(entries[1].im, -0.2);
    }
}
