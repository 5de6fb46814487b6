//! Run settings.
//!
//! Model parameters come from the JSON input of each subcommand; everything about *how* the
//! model is solved (root-finder, tolerances, scan step, welfare weights) is configured here.

use crate::CliError;
use clap::ValueEnum;
use pem_solver::{Quadrature, RootSettings, ScanSettings, TRADE_EPSILON, WelfareWeights};
use serde::{Deserialize, Serialize};
use std::path::Path;

// This explicitly articulates the available root-finders
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverLib {
    #[default]
    Newton,
    Brent,
}

/// Root-finder selection and the trade threshold
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Which root-finder to use
    pub method: SolverLib,
    /// Imports at or below this count as no trade
    pub epsilon: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            method: SolverLib::default(),
            epsilon: TRADE_EPSILON,
        }
    }
}

/// The complete run configuration
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub solver: SolverConfig,

    /// Tolerances shared by both root-finders
    #[serde(default)]
    pub root: RootSettings,

    #[serde(default)]
    pub quadrature: Quadrature,

    #[serde(default)]
    pub scan: ScanSettings,

    /// Weights for the weighted optimal tariff
    #[serde(default = "default_weights")]
    pub weights: WelfareWeights,
}

// Consumers count most, then producers, then the treasury
fn default_weights() -> WelfareWeights {
    WelfareWeights::new(4.0, 3.0, 2.0)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            root: RootSettings::default(),
            quadrature: Quadrature::default(),
            scan: ScanSettings::default(),
            weights: default_weights(),
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest priority)
    /// 2. Config file given on the command line
    /// 3. Default values (lowest priority)
    ///
    /// Environment variables are mapped using the pattern
    /// `PEM_<SECTION>__<KEY>` maps to `<section>.<key>`, e.g.
    ///
    /// ```bash
    /// export PEM_SOLVER__METHOD=brent
    /// export PEM_SCAN__STEP=0.005
    /// export PEM_WEIGHTS__REVENUE=0
    /// ```
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Start with default values
        config = config.add_source(config::Config::try_from(&Self::default())?);

        // Layer on config file if it is specified and exists
        if let Some(path) = path {
            if !path.exists() {
                return Err(CliError::MissingConfig(path.to_owned()))?;
            }
            config = config.add_source(config::File::from(path));
        }

        // Override with environment variables
        config = config.add_source(
            config::Environment::with_prefix("PEM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let built_config = config.build()?;
        built_config.try_deserialize().map_err(Into::into)
    }
}
