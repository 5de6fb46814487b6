use crate::{AppConfig, SolverLib};
use pem_core::models::{Market, MarketSchedule, ParamSource, Params};
use pem_solver::{
    EquilibriumEngine, RootFinder, SolveError, brent::BrentSolver, newton::NewtonSolver,
};
use serde::Serialize;

/// The output of `pemodel markets`
#[derive(Debug, Serialize)]
pub struct MarketsReport {
    #[serde(flatten)]
    pub source: ParamSource,
    pub money: String,
    pub volume: String,
    pub market: Market,
    pub schedule: MarketSchedule,
}

impl MarketsReport {
    pub fn build(
        params: Params,
        source: ParamSource,
        config: &AppConfig,
        points: usize,
    ) -> Result<Self, SolveError> {
        match config.solver.method {
            SolverLib::Newton => {
                Self::with_solver(params, source, points, NewtonSolver::new(config.root))
            }
            SolverLib::Brent => {
                Self::with_solver(params, source, points, BrentSolver::new(config.root))
            }
        }
    }

    fn with_solver<R: RootFinder>(
        params: Params,
        source: ParamSource,
        points: usize,
        solver: R,
    ) -> Result<Self, SolveError> {
        let market = params.market();
        let tariff = params.tariff();
        let schedule =
            EquilibriumEngine::new(market, solver).market_schedule(Some(&tariff), points)?;

        Ok(Self {
            source,
            money: params.money,
            volume: params.volume,
            market,
            schedule,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn schedule_of_the_defaults() {
        let source = ParamSource::Defaults {
            reason: "no input".to_owned(),
        };
        let report =
            MarketsReport::build(Params::default(), source, &AppConfig::default(), 5).unwrap();

        assert_eq!(report.schedule.rows.len(), 5);
        assert_abs_diff_eq!(report.schedule.rows[4].price, 1.21, epsilon = 1e-9);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["source"], "defaults");
        assert_eq!(json["reason"], "no input");
        assert_eq!(json["money"], "Euros");
        assert!(json["schedule"]["rows"][0]["tariff_export_supply"].is_number());
    }
}
