// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! QubitOS operator-model CLI
//!
//! Builds the standard models and reports their parameterization.
//!
//! # Usage
//!
//! ```bash
//! # Summarize the one-qubit X/Y/idle model
//! qubit-os-opmodel inspect
//!
//! # Embed X(π/2) on qubit 1 of a three-qubit space
//! qubit-os-opmodel embed --qubits 3 --target 1
//!
//! # Coefficients of a sample diagonal CPTP generator, as JSON
//! qubit-os-opmodel errgen --support diagonal --mode cptp --json
//! ```

use std::f64::consts::FRAC_PI_2;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use qubit_os_opmodel::basis::{rotation_unitary, Basis};
use qubit_os_opmodel::composite::{EmbeddedOp, Representation, StateSpace};
use qubit_os_opmodel::config::Config;
use qubit_os_opmodel::lindblad::{coeff_entries, LindbladErrorgen, ParamMode, SupportMode};
use qubit_os_opmodel::member::{DenseOp, ModelMember};
use qubit_os_opmodel::model::{standard, Model};
use qubit_os_opmodel::{Error, Result, VERSION};

/// QubitOS parameterized operator model
#[derive(Parser)]
#[command(name = "qubit-os-opmodel")]
#[command(author = "QubitOS Contributors")]
#[command(version = VERSION)]
#[command(about = "Parameterized quantum operator models with shared parameter vectors")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); defaults to the configured level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize the standard one-qubit model
    Inspect,

    /// Embed X(π/2) on one qubit of a larger space
    Embed {
        /// Number of qubits in the space
        #[arg(long, default_value_t = 3)]
        qubits: usize,

        /// Index of the target qubit
        #[arg(long, default_value_t = 1)]
        target: usize,
    },

    /// Show the coefficients of a sample one-qubit error generator
    Errgen {
        /// Support mode (hamiltonian, diagonal, diag_affine, all)
        #[arg(long)]
        support: Option<String>,

        /// Parameter mode (cptp, depol, reldepol, unconstrained)
        #[arg(long)]
        mode: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show effective configuration
    Config,

    /// Validate configuration file
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    // Initialize logging
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    init_logging(level, &config.logging.format);

    match cli.command {
        Commands::Inspect => {
            config.validate()?;
            let mut model = standard::xyi_model(&config)?;
            print_summary(&mut model)?;
        }

        Commands::Embed { qubits, target } => {
            config.validate()?;
            embed_report(qubits, target, &config)?;
        }

        Commands::Errgen {
            support,
            mode,
            json,
        } => {
            let lindblad = &config.parameterization.lindblad;
            let support: SupportMode = match support {
                Some(s) => s.parse()?,
                None => lindblad.support_mode,
            };
            let mode: ParamMode = match mode {
                Some(m) => m.parse()?,
                None => lindblad.param_mode,
            };
            errgen_report(support, mode, json)?;
        }

        Commands::Config => {
            // Show effective configuration
            println!("{}", serde_yaml::to_string(&config)?);
        }

        Commands::Validate => {
            // Validate configuration
            match config.validate() {
                Ok(()) => {
                    println!("Configuration is valid");
                }
                Err(e) => {
                    eprintln!("Configuration error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

/// Initialize logging with tracing.
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        "json" => registry.with(fmt::layer().json().with_target(true)).init(),
        "compact" => registry.with(fmt::layer().compact().with_target(true)).init(),
        _ => registry.with(fmt::layer().with_target(true)).init(),
    }
}

fn print_summary(model: &mut Model) -> Result<()> {
    let total = model.num_params();
    println!("Model dimension {}, {} parameters", model.dim(), total);
    println!("{:<10} {:<16} {:>4} {:>7}  indices", "label", "type", "dim", "params");

    let entries: Vec<_> = model.entries().map(|(l, id)| (l.to_string(), id)).collect();
    for (label, id) in entries {
        let member = model.member(id)?;
        let indices = model.member_indices(id)?;
        let span = match (indices.first(), indices.last()) {
            (Some(first), Some(last)) => format!("{}..={}", first, last),
            _ => "-".to_string(),
        };
        println!(
            "{:<10} {:<16} {:>4} {:>7}  {}",
            label,
            member.type_name(),
            member.dim(),
            model.member_num_params(id)?,
            span
        );
    }
    Ok(())
}

fn embed_report(qubits: usize, target: usize, config: &Config) -> Result<()> {
    check_qubits(qubits, config)?;
    let labels: Vec<String> = (0..qubits).map(|k| format!("Q{}", k)).collect();
    let space = StateSpace::qubits(&labels, Representation::Liouville)?;
    let basis = Basis::pauli(1)?;
    let gx = DenseOp::from_unitary(
        &rotation_unitary('X', FRAC_PI_2)?,
        &basis,
        qubit_os_opmodel::member::ParamPolicy::TracePreserving,
    )?;
    let base_params = gx.num_params();

    let mut model = Model::new(space.dim());
    let base = model.insert(gx)?;
    let target_label = format!("Q{}", target);
    let embedded = model.insert(EmbeddedOp::new(space, &[target_label.as_str()], base)?)?;
    model.register(&format!("Gx:{}", target_label), embedded)?;

    let total = model.num_params();
    info!(qubits, target = %target_label, "Embedded X(pi/2)");
    println!("Space: {} ({} qubits)", labels.join(" x "), qubits);
    println!("Embedded dimension: {}", model.dim());
    println!("Base parameters: {}", base_params);
    println!("Model parameters: {}", total);

    let dense = model.todense_op(embedded)?;
    let nonzero = dense
        .as_real()
        .map(|m| m.iter().filter(|x| x.abs() > 1e-12).count())
        .unwrap_or_default();
    println!("Nonzero elements: {}", nonzero);
    Ok(())
}

/// Reject qubit counts outside `1..=max_qubits`.
fn check_qubits(qubits: usize, config: &Config) -> Result<()> {
    if qubits == 0 || qubits > config.numerics.max_qubits {
        return Err(Error::Config(format!(
            "embed needs 1..={} qubits, got {}",
            config.numerics.max_qubits, qubits
        )));
    }
    Ok(())
}

fn errgen_report(support: SupportMode, mode: ParamMode, json: bool) -> Result<()> {
    let basis = Arc::new(Basis::pauli(1)?);
    let mut errorgen = LindbladErrorgen::full(4, basis, support, mode)?;
    let sample: Vec<f64> = (0..errorgen.num_params())
        .map(|k| 0.01 * (k as f64 + 1.0))
        .collect();
    errorgen.from_vector(&sample)?;

    let (coeffs, _) = errorgen.errgen_coeffs(false);
    if json {
        println!("{}", serde_json::to_string_pretty(&coeff_entries(&coeffs))?);
        return Ok(());
    }

    println!(
        "support={} mode={} params={}",
        support,
        mode,
        errorgen.num_params()
    );
    let rates = errorgen.error_rates();
    for (term, value) in &coeffs {
        let rate = rates.get(term).map(|r| r.re).unwrap_or(value.re);
        println!(
            "  {:<10} {:>+.6} {:>+.6}i  rate {:>+.6}",
            term.to_string(),
            value.re,
            value.im,
            rate
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_report_respects_qubit_limit() {
        let config = Config::default();
        let too_many = config.numerics.max_qubits + 8;
        assert!(matches!(
            embed_report(too_many, 0, &config),
            Err(Error::Config(_))
        ));
        assert!(matches!(embed_report(0, 0, &config), Err(Error::Config(_))));
        assert!(embed_report(2, 1, &config).is_ok());

        let mut small = Config::default();
        small.numerics.max_qubits = 1;
        assert!(matches!(embed_report(2, 1, &small), Err(Error::Config(_))));
    }
}
