use crate::{IntegrationError, RootError};
use std::fmt;

/// The root-finding problems the engine solves
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Home demand equals home supply
    Autarky,
    /// Import demand equals untaxed export supply
    FreeTrade,
    /// Import demand equals export supply under the tariff
    Tariff,
    /// Inverting export supply for the price received
    ExportPrice,
    /// Inverting home demand, when laying out a price grid
    InverseDemand,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (match self {
            Self::Autarky => "no-trade equilibrium",
            Self::FreeTrade => "free-trade equilibrium",
            Self::Tariff => "tariff equilibrium",
            Self::ExportPrice => "export price",
            Self::InverseDemand => "inverse demand",
        })
        .fmt(f)
    }
}

/// Errors produced by the equilibrium, welfare and scan engines.
///
/// None of these are fatal; a failed root-find in particular means "no solution was found"
/// for that configuration and is left to the caller to present.
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    /// The root-finder could not solve one of the model's equations
    #[error("no {stage} found: {source}")]
    NoSolution {
        /// Which equation failed
        stage: Stage,
        /// Why the root-finder gave up
        source: RootError,
    },
    /// A surplus integral could not be evaluated
    #[error("welfare integration failed: {0}")]
    Integration(#[from] IntegrationError),
    /// Welfare weights must be finite and sum to a positive number
    #[error("welfare weights must be finite with a positive sum")]
    InvalidWeights,
    /// The tariff scan must advance
    #[error("tariff scan step must be positive and finite, got {0}")]
    InvalidStep(f64),
}

impl SolveError {
    pub(crate) fn at(stage: Stage) -> impl FnOnce(RootError) -> Self {
        move |source| Self::NoSolution { stage, source }
    }
}
