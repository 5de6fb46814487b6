use crate::{AppConfig, SolverLib};
use pem_core::models::{Clearing, ParamSource, Params, ScanPoint, TariffKind};
use pem_solver::{
    EquilibriumEngine, RootFinder, SolveError, TariffScan, Termination, WeightedOptimum,
    WelfareEngine, brent::BrentSolver, newton::NewtonSolver,
};
use serde::Serialize;

/// The output of `pemodel scan`
#[derive(Debug, Serialize)]
pub struct ScanReport {
    #[serde(flatten)]
    pub source: ParamSource,
    pub kind: TariffKind,
    pub unit: &'static str,
    pub free_trade: Clearing,
    pub optimal: Option<ScanPoint>,
    pub prohibitive_tariff: Option<f64>,
    pub weighted_optimal: Option<WeightedOptimum>,
    pub termination: Termination,
    pub series: Vec<ScanPoint>,
}

impl ScanReport {
    pub fn build(
        params: Params,
        source: ParamSource,
        config: &AppConfig,
    ) -> Result<Self, SolveError> {
        match config.solver.method {
            SolverLib::Newton => {
                Self::with_solver(params, source, config, NewtonSolver::new(config.root))
            }
            SolverLib::Brent => {
                Self::with_solver(params, source, config, BrentSolver::new(config.root))
            }
        }
    }

    fn with_solver<R: RootFinder>(
        params: Params,
        source: ParamSource,
        config: &AppConfig,
        solver: R,
    ) -> Result<Self, SolveError> {
        let market = params.market();
        let engine = EquilibriumEngine::new(market, solver).with_epsilon(config.solver.epsilon);
        let welfare = WelfareEngine::new(market, config.quadrature);

        // the parameter file's tariff value only fixes the kind; the scan starts from zero
        let mut tariff = params.tariff();
        let scan = TariffScan::new(&engine, &welfare, config.scan).run(&mut tariff)?;

        Ok(Self {
            source,
            kind: scan.kind,
            unit: scan.kind.unit(),
            free_trade: scan.free_trade,
            optimal: scan.optimal().copied(),
            prohibitive_tariff: scan.prohibitive_tariff(),
            weighted_optimal: scan.weighted_optimal(&config.weights)?,
            termination: scan.termination,
            series: scan.series,
        })
    }
}
