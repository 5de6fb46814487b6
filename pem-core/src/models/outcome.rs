use serde::{Deserialize, Serialize};

/// A market-clearing price and the quantity traded at it
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clearing {
    /// The clearing price
    pub price: f64,
    /// The quantity at that price
    pub quantity: f64,
}

/// A snapshot of the tariff-ridden equilibrium
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketEquilibrium {
    /// The tariff-inclusive price on the home market
    pub home_price: f64,
    /// The price received by the foreign exporter
    pub export_price: f64,
    /// The quantity imported by the home country
    pub import_quantity: f64,
    /// The quantity exported by the foreign country
    pub export_quantity: f64,
    /// Home demand at the home price
    pub domestic_demand: f64,
    /// Home supply at the home price
    pub domestic_supply: f64,
    /// The home price absent any trade
    pub autarky_price: f64,
    /// The home quantity absent any trade
    pub autarky_quantity: f64,
}

/// The result of solving for an equilibrium under a tariff.
///
/// When the tariff is high enough to choke off trade the equilibrium is degenerate; rather
/// than reporting a near-zero or negative import quantity as if it were a trade equilibrium,
/// this is signalled with its own variant.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum TariffOutcome {
    /// Trade takes place
    Traded(MarketEquilibrium),
    /// Imports are at or below the trade threshold
    Prohibitive {
        /// The home price solving the clearing condition
        home_price: f64,
        /// The (non-positive or negligible) import quantity at that price
        import_quantity: f64,
    },
}

impl TariffOutcome {
    /// The equilibrium, if trade takes place
    pub fn equilibrium(&self) -> Option<&MarketEquilibrium> {
        match self {
            Self::Traded(equilibrium) => Some(equilibrium),
            Self::Prohibitive { .. } => None,
        }
    }

    /// The tariff-inclusive home price
    pub fn home_price(&self) -> f64 {
        match self {
            Self::Traded(equilibrium) => equilibrium.home_price,
            Self::Prohibitive { home_price, .. } => *home_price,
        }
    }

    /// The import quantity
    pub fn import_quantity(&self) -> f64 {
        match self {
            Self::Traded(equilibrium) => equilibrium.import_quantity,
            Self::Prohibitive {
                import_quantity, ..
            } => *import_quantity,
        }
    }

    /// Whether the tariff chokes off trade
    pub fn is_prohibitive(&self) -> bool {
        matches!(self, Self::Prohibitive { .. })
    }
}

/// Changes in home welfare caused by a tariff, relative to a baseline (usually free trade)
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WelfareReport {
    /// Change in consumer surplus
    pub d_consumer_surplus: f64,
    /// Change in producer surplus
    pub d_producer_surplus: f64,
    /// Change in tariff revenue attributable to the home price increase
    pub d_tariff_revenue: f64,
    /// Gain from the lower price received by the exporter
    pub terms_of_trade: f64,
    /// Consumer, producer and revenue changes combined
    pub deadweight_loss: f64,
    /// First-order approximation of the equivalent variation
    pub equivalent_variation: f64,
    /// First-order approximation of the compensating variation
    pub compensating_variation: f64,
    /// Net welfare change, deadweight loss plus terms of trade
    pub total: f64,
}

impl WelfareReport {
    /// Assemble a report, deriving the deadweight loss and total from the components
    pub fn new(
        d_consumer_surplus: f64,
        d_producer_surplus: f64,
        d_tariff_revenue: f64,
        terms_of_trade: f64,
        equivalent_variation: f64,
        compensating_variation: f64,
    ) -> Self {
        let deadweight_loss = d_consumer_surplus + d_producer_surplus + d_tariff_revenue;
        Self {
            d_consumer_surplus,
            d_producer_surplus,
            d_tariff_revenue,
            terms_of_trade,
            deadweight_loss,
            equivalent_variation,
            compensating_variation,
            total: deadweight_loss + terms_of_trade,
        }
    }
}

/// Changes in foreign welfare caused by the home tariff
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForeignWelfare {
    /// Terms-of-trade loss from the lower price received
    pub terms_of_trade: f64,
    /// Change in exporters' producer surplus
    pub d_producer_surplus: f64,
}

/// Home, foreign and world welfare side by side
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldWelfare {
    /// Home consumer surplus change
    pub home_consumer_surplus: f64,
    /// Home producer surplus change
    pub home_producer_surplus: f64,
    /// Home tariff revenue change
    pub home_tariff_revenue: f64,
    /// Home terms-of-trade gain
    pub home_terms_of_trade: f64,
    /// Net home welfare change
    pub net_home: f64,
    /// Foreign producer surplus change
    pub foreign_producer_surplus: f64,
    /// Foreign terms-of-trade loss
    pub foreign_terms_of_trade: f64,
    /// Net foreign welfare change
    pub net_foreign: f64,
    /// Net change in world welfare
    pub net_world: f64,
}

impl WorldWelfare {
    /// Combine the home and foreign effects
    pub fn new(home: &WelfareReport, foreign: &ForeignWelfare) -> Self {
        let net_home = home.d_consumer_surplus
            + home.d_producer_surplus
            + home.d_tariff_revenue
            + home.terms_of_trade;
        let net_foreign = foreign.d_producer_surplus + foreign.terms_of_trade;
        Self {
            home_consumer_surplus: home.d_consumer_surplus,
            home_producer_surplus: home.d_producer_surplus,
            home_tariff_revenue: home.d_tariff_revenue,
            home_terms_of_trade: home.terms_of_trade,
            net_home,
            foreign_producer_surplus: foreign.d_producer_surplus,
            foreign_terms_of_trade: foreign.terms_of_trade,
            net_foreign,
            net_world: net_home + net_foreign,
        }
    }
}

/// Price elasticities of the model's curves around an equilibrium
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Elasticities {
    /// Home demand, at the tariff-inclusive price
    pub home_demand: f64,
    /// Home supply, at the tariff-inclusive price
    pub home_supply: f64,
    /// Import demand, at the price received by the exporter
    pub import_demand: f64,
    /// Free-trade export supply, at the price received by the exporter
    pub export_supply: f64,
}

/// The curves of the model sampled over a price grid, for plotting
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketSchedule {
    /// One row per sampled price, by increasing price
    pub rows: Vec<ScheduleRow>,
    /// The free-trade equilibrium
    pub free_trade: Clearing,
    /// Home demand at the free-trade price
    pub free_trade_demand: f64,
    /// Home supply at the free-trade price
    pub free_trade_supply: f64,
}

/// A single sampled price of a [`MarketSchedule`]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    /// The sampled price
    pub price: f64,
    /// Home demand
    pub home_demand: f64,
    /// Home supply
    pub home_supply: f64,
    /// Import demand
    pub import_demand: f64,
    /// Free-trade export supply
    pub export_supply: f64,
    /// Export supply under the tariff, if one was given
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tariff_export_supply: Option<f64>,
}

/// One step of a tariff scan
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanPoint {
    /// The tariff value
    pub tariff: f64,
    /// Its ad-valorem equivalent at the home price
    pub ave: f64,
    /// The tariff-inclusive home price
    pub home_price: f64,
    /// The price received by the exporter
    pub export_price: f64,
    /// The import quantity
    pub import_quantity: f64,
    /// Home welfare relative to free trade
    #[serde(flatten)]
    pub welfare: WelfareReport,
}
