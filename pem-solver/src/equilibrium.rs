use crate::{Domain, RootFinder, SolveError, Stage, elasticity, invert_within, newton::NewtonSolver};
use pem_core::models::{
    Clearing, Elasticities, FunctionFamily, Market, MarketEquilibrium, MarketSchedule,
    ScheduleRow, Tariff, TariffOutcome,
};
use tracing::{Level, event};

/// The seed for the free-trade and tariff-ridden price searches
pub const PRICE_SEED: f64 = 0.01;

/// Imports at or below this are treated as no trade at all
pub const TRADE_EPSILON: f64 = 1e-5;

/// Bounds of the plotted price range, relative to the autarky quantity and free-trade imports
const HOME_SPREAD: f64 = 4.0;
const WORLD_SPREAD: f64 = 3.0;
const MIN_PLOT_PRICE: f64 = 1e-3;

/// Solves for the market-clearing prices of the model.
///
/// Every equilibrium is a single equation in the home price, solved with the configured
/// [`RootFinder`] on the positive half-line.
#[derive(Clone, Debug)]
pub struct EquilibriumEngine<R = NewtonSolver> {
    market: Market,
    solver: R,
    epsilon: f64,
}

impl<R: RootFinder> EquilibriumEngine<R> {
    /// Create an engine for the given market
    pub fn new(market: Market, solver: R) -> Self {
        Self {
            market,
            solver,
            epsilon: TRADE_EPSILON,
        }
    }

    /// Override the import threshold below which trade is considered choked off
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// The market being solved
    pub fn market(&self) -> &Market {
        &self.market
    }

    /// The root-finder in use
    pub fn solver(&self) -> &R {
        &self.solver
    }

    /// The import threshold
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// The home market absent any trade: the price where demand equals supply.
    ///
    /// The search is seeded at the demand intercept.
    pub fn no_trade_equilibrium(&self) -> Result<Clearing, SolveError> {
        let market = &self.market;
        let seed = match market.home_demand.constant {
            c if c > 0.0 && c.is_finite() => c,
            _ => PRICE_SEED,
        };
        let price = self
            .solver
            .find_root(|p| market.import_demand(p), seed, Domain::Positive)
            .map_err(SolveError::at(Stage::Autarky))?;
        Ok(Clearing {
            price,
            quantity: market.home_demand(price),
        })
    }

    /// Free trade: the price where import demand equals untaxed export supply
    pub fn free_trade_equilibrium(&self) -> Result<Clearing, SolveError> {
        let market = &self.market;
        let price = self
            .solver
            .find_root(
                |p| market.import_demand(p) - market.export_supply(p, None),
                PRICE_SEED,
                Domain::Positive,
            )
            .map_err(SolveError::at(Stage::FreeTrade))?;
        Ok(Clearing {
            price,
            quantity: market.export_supply(price, None),
        })
    }

    /// The equilibrium under `tariff`.
    ///
    /// Solves `import_demand(p) = export_supply(p, tariff)` for the tariff-inclusive home price,
    /// then recovers the price received by the exporter by inverting untaxed export supply at
    /// the traded quantity. If imports at the solution do not exceed the trade threshold, the
    /// tariff is prohibitive and no trade equilibrium is reported.
    pub fn tariff_equilibrium(&self, tariff: &Tariff) -> Result<TariffOutcome, SolveError> {
        let market = &self.market;
        let home_price = self
            .solver
            .find_root(
                |p| market.import_demand(p) - market.export_supply(p, Some(tariff)),
                PRICE_SEED,
                Domain::Positive,
            )
            .map_err(SolveError::at(Stage::Tariff))?;

        let import_quantity = market.import_demand(home_price);
        // Negated so that a NaN quantity also counts as no trade
        if !(import_quantity > self.epsilon) {
            event!(
                Level::DEBUG,
                tariff = tariff.value(),
                home_price,
                import_quantity,
                "tariff chokes off trade"
            );
            return Ok(TariffOutcome::Prohibitive {
                home_price,
                import_quantity,
            });
        }

        let export_quantity = market.export_supply(home_price, Some(tariff));
        let export_price = self.export_price_from_quantity(export_quantity)?;
        let autarky = self.no_trade_equilibrium()?;

        Ok(TariffOutcome::Traded(MarketEquilibrium {
            home_price,
            export_price,
            import_quantity,
            export_quantity,
            domestic_demand: market.home_demand(home_price),
            domestic_supply: market.home_supply(home_price),
            autarky_price: autarky.price,
            autarky_quantity: autarky.quantity,
        }))
    }

    /// The price an exporter must receive to supply `export_quantity` absent any tariff
    pub fn export_price_from_quantity(&self, export_quantity: f64) -> Result<f64, SolveError> {
        invert_within(
            &self.solver,
            |p| self.market.export_supply(p, None),
            export_quantity,
            self.inverse_domain(),
        )
        .map_err(SolveError::at(Stage::ExportPrice))
    }

    /// Elasticities around a tariff equilibrium: home demand and supply at the home price,
    /// import demand and export supply at the price received by the exporter.
    pub fn elasticities(&self, equilibrium: &MarketEquilibrium) -> Elasticities {
        let market = &self.market;
        Elasticities {
            home_demand: elasticity(|p| market.home_demand(p), equilibrium.home_price),
            home_supply: elasticity(|p| market.home_supply(p), equilibrium.home_price),
            import_demand: elasticity(|p| market.import_demand(p), equilibrium.export_price),
            export_supply: elasticity(
                |p| market.export_supply(p, None),
                equilibrium.export_price,
            ),
        }
    }

    /// Sample the model's curves over a price range suitable for plotting.
    ///
    /// The range spans the prices at which home demand is four times and a quarter of the
    /// autarky quantity, and at which export supply is three times and a third of free-trade
    /// imports; the lower end of each pair is taken, floored at a small positive price.
    pub fn market_schedule(
        &self,
        tariff: Option<&Tariff>,
        points: usize,
    ) -> Result<MarketSchedule, SolveError> {
        let market = &self.market;
        let autarky = self.no_trade_equilibrium()?;
        let free_trade = self.free_trade_equilibrium()?;

        let demand_price = |quantity: f64| {
            invert_within(
                &self.solver,
                |p| market.home_demand(p),
                quantity,
                self.inverse_domain(),
            )
            .map_err(SolveError::at(Stage::InverseDemand))
        };
        let p1 = demand_price(autarky.quantity * HOME_SPREAD)?;
        let p2 = demand_price(autarky.quantity / HOME_SPREAD)?;
        let p3 = self.export_price_from_quantity(free_trade.quantity / WORLD_SPREAD)?;
        let p4 = self.export_price_from_quantity(free_trade.quantity * WORLD_SPREAD)?;

        let start = p1.min(p3).max(MIN_PLOT_PRICE);
        let stop = p2.min(p4).max(MIN_PLOT_PRICE);
        let step = if points > 1 {
            (stop - start) / (points - 1) as f64
        } else {
            0.0
        };

        let rows = (0..points)
            .map(|i| {
                let price = start + step * i as f64;
                ScheduleRow {
                    price,
                    home_demand: market.home_demand(price),
                    home_supply: market.home_supply(price),
                    import_demand: market.import_demand(price),
                    export_supply: market.export_supply(price, None),
                    tariff_export_supply: tariff.map(|t| market.export_supply(price, Some(t))),
                }
            })
            .collect();

        Ok(MarketSchedule {
            rows,
            free_trade,
            free_trade_demand: market.home_demand(free_trade.price),
            free_trade_supply: market.home_supply(free_trade.price),
        })
    }

    // Constant-elasticity curves are only meaningful at positive prices; linear curves may be
    // inverted anywhere.
    fn inverse_domain(&self) -> Domain {
        match self.market.foreign_supply.family {
            FunctionFamily::LogLinear => Domain::Positive,
            FunctionFamily::Linear => Domain::Real,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pem_core::models::FunctionSpec;

    fn engine() -> EquilibriumEngine {
        EquilibriumEngine::new(
            Market {
                home_demand: FunctionSpec::linear(20.0, -15.0),
                home_supply: FunctionSpec::linear(-1.0, 10.0),
                foreign_supply: FunctionSpec::linear(-2.0, 15.0),
            },
            NewtonSolver::default(),
        )
    }

    #[test]
    fn closed_form_linear_equilibria() {
        let engine = engine();

        let autarky = engine.no_trade_equilibrium().unwrap();
        assert_abs_diff_eq!(autarky.price, 0.84, epsilon = 1e-9);
        assert_abs_diff_eq!(autarky.quantity, 7.4, epsilon = 1e-9);

        // 21 - 25p = -2 + 15p
        let free = engine.free_trade_equilibrium().unwrap();
        assert_abs_diff_eq!(free.price, 0.575, epsilon = 1e-9);
        assert_abs_diff_eq!(free.quantity, 6.625, epsilon = 1e-9);
    }

    #[test]
    fn ad_valorem_tariff_equilibrium() {
        let outcome = engine()
            .tariff_equilibrium(&Tariff::ad_valorem(0.2))
            .unwrap();
        let eq = outcome.equilibrium().unwrap();

        // 21 - 25p = -2 + 12p
        assert_abs_diff_eq!(eq.home_price, 23.0 / 37.0, epsilon = 1e-9);
        assert_abs_diff_eq!(eq.export_price, 0.8 * 23.0 / 37.0, epsilon = 1e-9);
        assert_abs_diff_eq!(eq.import_quantity, eq.export_quantity, epsilon = 1e-9);
        assert_abs_diff_eq!(
            eq.import_quantity,
            eq.domestic_demand - eq.domestic_supply,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(eq.autarky_price, 0.84, epsilon = 1e-9);
    }

    #[test]
    fn specific_tariff_shifts_supply_by_its_value() {
        let outcome = engine()
            .tariff_equilibrium(&Tariff::specific(0.2))
            .unwrap();
        let eq = outcome.equilibrium().unwrap();

        // 21 - 25p = -2 + 15(p - 0.2)
        assert_abs_diff_eq!(eq.home_price, 0.65, epsilon = 1e-9);
        assert_abs_diff_eq!(eq.export_price, 0.45, epsilon = 1e-9);
        assert_abs_diff_eq!(eq.import_quantity, 4.75, epsilon = 1e-9);
    }

    #[test]
    fn prohibitive_tariff_is_signalled() {
        let outcome = engine()
            .tariff_equilibrium(&Tariff::ad_valorem(0.9))
            .unwrap();
        assert!(outcome.is_prohibitive());
        assert!(outcome.import_quantity() <= TRADE_EPSILON);
    }

    #[test]
    fn export_price_inverts_export_supply() {
        let price = engine().export_price_from_quantity(4.75).unwrap();
        assert_abs_diff_eq!(price, 0.45, epsilon = 1e-9);
    }

    #[test]
    fn linear_elasticities() {
        let engine = engine();
        let outcome = engine
            .tariff_equilibrium(&Tariff::specific(0.2))
            .unwrap();
        let el = engine.elasticities(outcome.equilibrium().unwrap());

        // demand: -15 * 0.65 / 10.25, supply: 10 * 0.65 / 5.5
        assert_abs_diff_eq!(el.home_demand, -15.0 * 0.65 / 10.25, epsilon = 1e-9);
        assert_abs_diff_eq!(el.home_supply, 10.0 * 0.65 / 5.5, epsilon = 1e-9);
        // export supply at 0.45: 15 * 0.45 / 4.75
        assert_abs_diff_eq!(el.export_supply, 15.0 * 0.45 / 4.75, epsilon = 1e-9);
    }

    #[test]
    fn schedule_spans_the_plot_range() {
        let schedule = engine()
            .market_schedule(Some(&Tariff::ad_valorem(0.2)), 20)
            .unwrap();

        assert_eq!(schedule.rows.len(), 20);
        let first = schedule.rows.first().unwrap();
        let last = schedule.rows.last().unwrap();
        // demand is 4 x 7.4 at a negative price, so the floor applies
        assert_abs_diff_eq!(first.price, 1e-3, epsilon = 1e-12);
        // demand is 7.4 / 4 at p = 1.21, export supply is 3 x 6.625 at p = 1.4583..
        assert_abs_diff_eq!(last.price, 1.21, epsilon = 1e-9);
        assert!(schedule.rows.iter().all(|row| row.tariff_export_supply.is_some()));

        assert_abs_diff_eq!(schedule.free_trade.price, 0.575, epsilon = 1e-9);
        assert_abs_diff_eq!(schedule.free_trade_demand, 11.375, epsilon = 1e-9);
        assert_abs_diff_eq!(schedule.free_trade_supply, 4.75, epsilon = 1e-9);
    }
}
