use crate::{AppConfig, SolverLib};
use pem_core::models::{
    Clearing, Elasticities, ForeignWelfare, ParamSource, Params, TariffOutcome, WelfareReport,
    WorldWelfare,
};
use pem_solver::{
    EquilibriumEngine, RootFinder, SolveError, WelfareEngine, brent::BrentSolver,
    newton::NewtonSolver,
};
use serde::Serialize;

/// Welfare effects of the tariff, relative to free trade
#[derive(Debug, Serialize)]
pub struct WelfareSummary {
    pub home: WelfareReport,
    pub foreign: ForeignWelfare,
    pub world: WorldWelfare,
}

/// The output of `pemodel solve`
#[derive(Debug, Serialize)]
pub struct SolveReport {
    #[serde(flatten)]
    pub source: ParamSource,
    pub params: Params,
    pub tariff: String,
    pub autarky: Clearing,
    pub free_trade: Clearing,
    pub outcome: TariffOutcome,
    /// Absent when the tariff is prohibitive
    pub welfare: Option<WelfareSummary>,
    pub elasticities: Option<Elasticities>,
}

impl SolveReport {
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
        let tariff = params.tariff();
        let engine = EquilibriumEngine::new(market, solver).with_epsilon(config.solver.epsilon);
        let welfare = WelfareEngine::new(market, config.quadrature);

        let autarky = engine.no_trade_equilibrium()?;
        let free_trade = engine.free_trade_equilibrium()?;
        let outcome = engine.tariff_equilibrium(&tariff)?;

        let (welfare, elasticities) = match outcome.equilibrium() {
            Some(eq) => {
                let home = welfare.home_welfare(free_trade.price, eq.home_price, eq.export_price)?;
                let foreign = welfare.foreign_welfare(free_trade.price, eq.export_price)?;
                let world = welfare.world_welfare(&home, &foreign);
                (
                    Some(WelfareSummary {
                        home,
                        foreign,
                        world,
                    }),
                    Some(engine.elasticities(eq)),
                )
            }
            None => (None, None),
        };

        Ok(Self {
            source,
            tariff: tariff.describe(),
            params,
            autarky,
            free_trade,
            outcome,
            welfare,
            elasticities,
        })
    }
}
