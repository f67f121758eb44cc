// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Operation labels: a name plus the state-space labels it acts on.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Label such as `Gx` or `Gx:Q0:Q1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label {
    pub name: String,
    pub sslbls: Vec<String>,
}

impl Label {
    pub fn new(name: impl Into<String>, sslbls: Vec<String>) -> Result<Self> {
        let label = Self {
            name: name.into(),
            sslbls,
        };
        label.check()?;
        Ok(label)
    }

    pub fn simple(name: impl Into<String>) -> Result<Self> {
        Self::new(name, Vec::new())
    }

    fn check(&self) -> Result<()> {
        let bad = |part: &str| part.is_empty() || part.contains(':') || part.contains(char::is_whitespace);
        if bad(self.name.as_str()) {
            return Err(Error::Label(format!("invalid operation name '{}'", self.name)));
        }
        if let Some(s) = self.sslbls.iter().find(|s| bad(s.as_str())) {
            return Err(Error::Label(format!(
                "invalid state-space label '{}' in '{}'",
                s, self.name
            )));
        }
        Ok(())
    }
}

impl FromStr for Label {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(':');
        let name = parts.next().unwrap_or_default();
        Self::new(name, parts.map(str::to_string).collect())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for s in &self.sslbls {
            write!(f, ":{}", s)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_and_qualified() {
        let l: Label = "Gx".parse().unwrap();
        assert_eq!(l.name, "Gx");
        assert!(l.sslbls.is_empty());

        let l: Label = "Gcnot:Q0:Q1".parse().unwrap();
        assert_eq!(l.name, "Gcnot");
        assert_eq!(l.sslbls, vec!["Q0".to_string(), "Q1".to_string()]);
        assert_eq!(l.to_string(), "Gcnot:Q0:Q1");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for s in ["", ":Q0", "Gx:", "Gx::Q1", "G x"] {
            assert!(s.parse::<Label>().is_err(), "'{}' should not parse", s);
        }
    }
}
