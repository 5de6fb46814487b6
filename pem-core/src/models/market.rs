use super::{FunctionSpec, Tariff};

/// The three curves that make up the model: home demand, home supply and foreign export supply.
///
/// All curves give quantity as a function of price. The home curves are evaluated at the
/// tariff-inclusive home price; the foreign curve at the price the exporter receives.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Market {
    /// Home (Marshallian) demand
    pub home_demand: FunctionSpec,
    /// Home supply
    pub home_supply: FunctionSpec,
    /// Foreign export supply, as a function of the price received
    pub foreign_supply: FunctionSpec,
}

impl Market {
    /// Home demand at price `p`
    pub fn home_demand(&self, p: f64) -> f64 {
        self.home_demand.evaluate(p)
    }

    /// Home supply at price `p`
    pub fn home_supply(&self, p: f64) -> f64 {
        self.home_supply.evaluate(p)
    }

    /// Demand for imports, i.e. excess home demand, at price `p`
    pub fn import_demand(&self, p: f64) -> f64 {
        self.home_demand(p) - self.home_supply(p)
    }

    /// Foreign export supply when the home price is `p`.
    ///
    /// A tariff drives a wedge between the home price and the price the exporter receives:
    /// the exporter sees `p * (1 - ave(p))`. Passing `None` means free trade.
    pub fn export_supply(&self, p: f64, tariff: Option<&Tariff>) -> f64 {
        let received = match tariff {
            Some(tariff) => p * (1.0 - tariff.ad_valorem_equivalent(p)),
            None => p,
        };
        self.foreign_supply.evaluate(received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn market() -> Market {
        Market {
            home_demand: FunctionSpec::linear(20.0, -15.0),
            home_supply: FunctionSpec::linear(-1.0, 10.0),
            foreign_supply: FunctionSpec::linear(-2.0, 15.0),
        }
    }

    #[test]
    fn import_demand_is_excess_demand() {
        let market = market();
        // 20 - 15 * 0.5 - (-1 + 10 * 0.5)
        assert_abs_diff_eq!(market.import_demand(0.5), 8.5, epsilon = 1e-12);
        assert_abs_diff_eq!(market.import_demand(0.84), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn tariffs_lower_the_price_received() {
        let market = market();
        let free = market.export_supply(1.0, None);
        let ad_valorem = market.export_supply(1.0, Some(&Tariff::ad_valorem(0.2)));
        let specific = market.export_supply(1.0, Some(&Tariff::specific(0.2)));

        assert_abs_diff_eq!(free, 13.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ad_valorem, 10.0, epsilon = 1e-12);
        // At p = 1 a specific tariff of 0.2 is equivalent to 20% ad-valorem
        assert_abs_diff_eq!(specific, ad_valorem, epsilon = 1e-12);
    }

    #[test]
    fn zero_tariff_matches_free_trade() {
        let market = market();
        let zero = Tariff::ad_valorem(0.0);
        for p in [0.1, 0.5, 2.0] {
            assert_eq!(market.export_supply(p, Some(&zero)), market.export_supply(p, None));
        }
    }
}
