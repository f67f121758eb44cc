// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration management for the operator model.
//!
//! Configuration is loaded from multiple sources with the following priority
//! (later sources override earlier ones):
//!
//! 1. Built-in defaults
//! 2. config.yaml file
//! 3. Environment variables (QUBITOS_*)
//! 4. CLI arguments

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::lindblad::{ParamMode, Storage, SupportMode, DEFAULT_TOLERANCE};
use crate::member::ParamPolicy;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Member parameterization defaults
    #[serde(default)]
    pub parameterization: ParameterizationConfig,

    /// Numerical settings
    #[serde(default)]
    pub numerics: NumericsConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        // Load from file if specified
        if let Some(path) = config_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                config = serde_yaml::from_str(&content)?;
            }
        } else {
            // Try default locations
            for path in &["opmodel.yaml", "opmodel.yml", "/etc/qubitos/opmodel.yaml"] {
                let path = Path::new(path);
                if path.exists() {
                    let content = std::fs::read_to_string(path)?;
                    config = serde_yaml::from_str(&content)?;
                    break;
                }
            }
        }

        // Override with environment variables
        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("QUBITOS_LOG_LEVEL") {
            self.logging.level = val;
        }
        let lindblad = &mut self.parameterization.lindblad;
        override_parsed("QUBITOS_DEFAULT_POLICY", &mut self.parameterization.default_policy);
        override_parsed("QUBITOS_LINDBLAD_SUPPORT", &mut lindblad.support_mode);
        override_parsed("QUBITOS_LINDBLAD_PARAM_MODE", &mut lindblad.param_mode);
        override_parsed("QUBITOS_LINDBLAD_STORAGE", &mut lindblad.storage);
        if let Ok(val) = env::var("QUBITOS_LINDBLAD_ENABLED") {
            lindblad.enabled = val.to_lowercase() == "true" || val == "1";
        }
        override_parsed("QUBITOS_TOLERANCE", &mut self.numerics.tolerance);
        override_parsed("QUBITOS_MAX_QUBITS", &mut self.numerics.max_qubits);
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        let tol = self.numerics.tolerance;
        if !tol.is_finite() || tol <= 0.0 {
            return Err(Error::Config(format!(
                "tolerance must be a positive finite number, got {}",
                tol
            )));
        }
        if tol > 1e-3 {
            tracing::warn!(
                tolerance = tol,
                "Numerical tolerance is unusually loose; CPTP projections may hide real errors"
            );
        }
        if self.numerics.max_qubits == 0 {
            return Err(Error::Config("max_qubits cannot be 0".into()));
        }
        if self.numerics.max_qubits > crate::basis::MAX_PAULI_QUBITS {
            return Err(Error::Config(format!(
                "max_qubits cannot exceed {}",
                crate::basis::MAX_PAULI_QUBITS
            )));
        }
        let lindblad = &self.parameterization.lindblad;
        if lindblad.param_mode.is_shared() && !lindblad.support_mode.is_diagonal() {
            return Err(Error::Config(format!(
                "parameter mode '{}' needs diagonal support, got '{}'",
                lindblad.param_mode, lindblad.support_mode
            )));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json" | "compact") {
            return Err(Error::Config(format!(
                "unknown log format '{}' (expected pretty, json or compact)",
                self.logging.format
            )));
        }
        Ok(())
    }
}

/// Overwrite `target` from an env var, keeping it when the value does not parse.
fn override_parsed<T>(var: &str, target: &mut T)
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(val) = env::var(var) {
        match val.parse() {
            Ok(parsed) => *target = parsed,
            Err(e) => tracing::warn!(var, value = %val, error = %e, "Ignoring invalid override"),
        }
    }
}

/// Parameterization defaults for standard models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterizationConfig {
    /// Policy for dense gates, preparations and effects
    #[serde(default = "default_policy")]
    pub default_policy: ParamPolicy,

    /// Lindblad error-map settings
    #[serde(default)]
    pub lindblad: LindbladConfig,
}

impl Default for ParameterizationConfig {
    fn default() -> Self {
        Self {
            default_policy: default_policy(),
            lindblad: LindbladConfig::default(),
        }
    }
}

fn default_policy() -> ParamPolicy {
    ParamPolicy::TracePreserving
}

/// Lindblad error-map configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LindbladConfig {
    /// Wrap standard gates in a Lindblad error map
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_support")]
    pub support_mode: SupportMode,

    #[serde(default = "default_param_mode")]
    pub param_mode: ParamMode,

    #[serde(default)]
    pub storage: Storage,
}

impl Default for LindbladConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            support_mode: default_support(),
            param_mode: default_param_mode(),
            storage: Storage::default(),
        }
    }
}

fn default_support() -> SupportMode {
    SupportMode::All
}

fn default_param_mode() -> ParamMode {
    ParamMode::Cptp
}

/// Numerical configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericsConfig {
    /// Tolerance for PSD factorization and consistency checks
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Largest embedded model the standard builders construct
    #[serde(default = "default_max_qubits")]
    pub max_qubits: usize,
}

impl Default for NumericsConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_qubits: default_max_qubits(),
        }
    }
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_max_qubits() -> usize {
    4
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(
            config.parameterization.default_policy,
            ParamPolicy::TracePreserving
        );
        assert!(!config.parameterization.lindblad.enabled);
        assert_eq!(config.parameterization.lindblad.support_mode, SupportMode::All);
        assert_eq!(config.parameterization.lindblad.param_mode, ParamMode::Cptp);
        assert_eq!(config.parameterization.lindblad.storage, Storage::Dense);
        assert_eq!(config.numerics.tolerance, DEFAULT_TOLERANCE);
        assert_eq!(config.numerics.max_qubits, 4);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());

        let mut bad_config = Config::default();
        bad_config.numerics.tolerance = 0.0;
        assert!(bad_config.validate().is_err());

        let mut bad_config = Config::default();
        bad_config.numerics.tolerance = f64::NAN;
        assert!(bad_config.validate().is_err());

        let mut bad_config = Config::default();
        bad_config.numerics.max_qubits = 0;
        assert!(bad_config.validate().is_err());
    }

    #[test]
    fn test_validate_shared_mode_needs_diagonal_support() {
        let mut config = Config::default();
        config.parameterization.lindblad.param_mode = ParamMode::Depol;
        assert!(config.validate().is_err());
        config.parameterization.lindblad.support_mode = SupportMode::DiagAffine;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".into();
        assert!(config.validate().is_err());
        config.logging.format = "json".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
parameterization:
  default_policy: full
  lindblad:
    enabled: true
    support_mode: diag_affine
    param_mode: unconstrained
    storage: lazy
numerics:
  tolerance: 1.0e-8
"#
        )
        .unwrap();

        let config = Config::load(Some(f.path())).unwrap();
        let lindblad = &config.parameterization.lindblad;
        assert_eq!(config.parameterization.default_policy, ParamPolicy::Full);
        assert!(lindblad.enabled);
        assert_eq!(lindblad.support_mode, SupportMode::DiagAffine);
        assert_eq!(lindblad.param_mode, ParamMode::Unconstrained);
        assert_eq!(lindblad.storage, Storage::Lazy);
        assert_eq!(config.numerics.tolerance, 1e-8);
        // Unspecified sections keep their defaults
        assert_eq!(config.numerics.max_qubits, 4);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        // When a path is provided but doesn't exist, load returns defaults
        let path = std::path::Path::new("/tmp/does_not_exist_qubitos_opmodel_test.yaml");
        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.numerics.max_qubits, 4);
    }

    #[test]
    fn test_config_load_invalid_yaml() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "{{{{not: valid: yaml::::").unwrap();

        let result = Config::load(Some(f.path()));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_override_log_level() {
        let mut config = Config::default();
        std::env::set_var("QUBITOS_LOG_LEVEL", "debug");
        config.apply_env_overrides();
        assert_eq!(config.logging.level, "debug");
        std::env::remove_var("QUBITOS_LOG_LEVEL");
    }

    #[test]
    fn test_env_override_default_policy() {
        let mut config = Config::default();
        std::env::set_var("QUBITOS_DEFAULT_POLICY", "static");
        config.apply_env_overrides();
        assert_eq!(config.parameterization.default_policy, ParamPolicy::Static);
        std::env::remove_var("QUBITOS_DEFAULT_POLICY");
    }

    #[test]
    fn test_env_override_lindblad_modes() {
        let mut config = Config::default();
        std::env::set_var("QUBITOS_LINDBLAD_SUPPORT", "diagonal");
        std::env::set_var("QUBITOS_LINDBLAD_PARAM_MODE", "depol");
        std::env::set_var("QUBITOS_LINDBLAD_STORAGE", "lazy");
        config.apply_env_overrides();
        let lindblad = &config.parameterization.lindblad;
        assert_eq!(lindblad.support_mode, SupportMode::Diagonal);
        assert_eq!(lindblad.param_mode, ParamMode::Depol);
        assert_eq!(lindblad.storage, Storage::Lazy);
        std::env::remove_var("QUBITOS_LINDBLAD_SUPPORT");
        std::env::remove_var("QUBITOS_LINDBLAD_PARAM_MODE");
        std::env::remove_var("QUBITOS_LINDBLAD_STORAGE");
    }

    #[test]
    fn test_env_override_tolerance_ignores_garbage() {
        let mut config = Config::default();
        std::env::set_var("QUBITOS_TOLERANCE", "not-a-number");
        config.apply_env_overrides();
        assert_eq!(config.numerics.tolerance, DEFAULT_TOLERANCE);

        std::env::set_var("QUBITOS_TOLERANCE", "1e-6");
        config.apply_env_overrides();
        assert_eq!(config.numerics.tolerance, 1e-6);
        std::env::remove_var("QUBITOS_TOLERANCE");
    }

    #[test]
    fn test_config_yaml_round_trip() {
        let mut config = Config::default();
        config.parameterization.lindblad.support_mode = SupportMode::DiagAffine;
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("diag_affine"));
        assert!(yaml.contains("default_policy: tp"));
        let back: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.parameterization.lindblad.support_mode, SupportMode::DiagAffine);
    }
}
