use crate::{Quadrature, SolveError};
use pem_core::models::{ForeignWelfare, Market, WelfareReport, WorldWelfare};

/// Computes the welfare effects of a tariff relative to a baseline price.
///
/// Surplus changes are areas under the Marshallian curves, integrated numerically between
/// the baseline price and the tariff-ridden price. Bounds may come in either order.
#[derive(Clone, Debug)]
pub struct WelfareEngine {
    market: Market,
    quadrature: Quadrature,
}

impl WelfareEngine {
    /// Create an engine for the given market
    pub fn new(market: Market, quadrature: Quadrature) -> Self {
        Self { market, quadrature }
    }

    /// The market being evaluated
    pub fn market(&self) -> &Market {
        &self.market
    }

    /// Home welfare changes when the home price moves from `p0` to `p_t` and the exporter
    /// receives `p_star`.
    ///
    /// # Parameters
    /// * `p0` - The baseline price, typically the free-trade price
    /// * `p_t` - The tariff-inclusive home price
    /// * `p_star` - The price received by the foreign exporter
    ///
    /// The equivalent and compensating variations are first-order approximations, valuing
    /// the price change at the final and initial demand respectively.
    pub fn home_welfare(
        &self,
        p0: f64,
        p_t: f64,
        p_star: f64,
    ) -> Result<WelfareReport, SolveError> {
        let market = &self.market;

        // consumers lose the area to the left of the demand curve
        let d_cs = -self.quadrature.integrate(|p| market.home_demand(p), p0, p_t)?;
        // producers gain the area to the left of the supply curve
        let d_ps = self.quadrature.integrate(|p| market.home_supply(p), p0, p_t)?;

        let imports = market.import_demand(p_t);
        let dp = p_t - p0;
        let terms_of_trade = (p0 - p_star) * imports;
        let revenue = dp * imports;
        let ev = -dp * market.home_demand(p_t);
        let cv = -dp * market.home_demand(p0);

        Ok(WelfareReport::new(d_cs, d_ps, revenue, terms_of_trade, ev, cv))
    }

    /// Foreign welfare changes when the exporter's price moves from `p0` to `p_star`
    pub fn foreign_welfare(&self, p0: f64, p_star: f64) -> Result<ForeignWelfare, SolveError> {
        let market = &self.market;
        let d_producer_surplus = self
            .quadrature
            .integrate(|p| market.export_supply(p, None), p0, p_star)?;
        Ok(ForeignWelfare {
            terms_of_trade: -(p0 - p_star) * market.export_supply(p_star, None),
            d_producer_surplus,
        })
    }

    /// Net home, foreign and world welfare
    pub fn world_welfare(&self, home: &WelfareReport, foreign: &ForeignWelfare) -> WorldWelfare {
        WorldWelfare::new(home, foreign)
    }
}
