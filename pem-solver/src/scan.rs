use crate::{EquilibriumEngine, RootFinder, SolveError, WelfareEngine};
use pem_core::models::{Clearing, ScanPoint, Tariff, TariffKind, TariffOutcome};
use tracing::{Level, event};

/// Settings for a tariff scan
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanSettings {
    /// The increment of the tariff value between steps, in the tariff's own units
    pub step: f64,
    /// The most points a scan records before giving up on reaching a prohibitive tariff
    pub max_steps: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            step: 0.01,
            max_steps: 10_000,
        }
    }
}

/// Relative weights of consumer surplus, producer surplus and tariff revenue in a weighted
/// welfare objective.
///
/// The terms-of-trade component is not part of the weighted objective, only of the total.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WelfareWeights {
    /// Weight of the consumer surplus change
    pub consumer: f64,
    /// Weight of the producer surplus change
    pub producer: f64,
    /// Weight of the tariff revenue change
    pub revenue: f64,
}

impl Default for WelfareWeights {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}

impl WelfareWeights {
    /// Create a set of (not necessarily normalized) weights
    pub fn new(consumer: f64, producer: f64, revenue: f64) -> Self {
        Self {
            consumer,
            producer,
            revenue,
        }
    }

    /// Rescale the weights to sum to one
    pub fn normalized(&self) -> Result<Self, SolveError> {
        let sum = self.consumer + self.producer + self.revenue;
        if !(sum.is_finite() && sum > 0.0) {
            return Err(SolveError::InvalidWeights);
        }
        Ok(Self::new(
            self.consumer / sum,
            self.producer / sum,
            self.revenue / sum,
        ))
    }

    /// The weighted objective at a scan point
    pub fn apply(&self, point: &ScanPoint) -> f64 {
        self.consumer * point.welfare.d_consumer_surplus
            + self.producer * point.welfare.d_producer_surplus
            + self.revenue * point.welfare.d_tariff_revenue
    }
}

/// Why a scan stopped
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "reason", rename_all = "kebab-case")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Termination {
    /// Imports fell to the trade threshold; the point at this tariff is not recorded
    Prohibitive {
        /// The first tariff value without trade
        tariff: f64,
        /// The import quantity there
        import_quantity: f64,
    },
    /// The scan recorded its maximum number of points while trade was still positive
    StepLimit {
        /// The next tariff value that would have been tried
        tariff: f64,
    },
}

/// The outcome of a tariff scan
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ScanResult {
    /// The kind of tariff that was scanned
    pub kind: TariffKind,
    /// The free-trade baseline welfare is measured against
    pub free_trade: Clearing,
    /// One point per tariff value, by increasing tariff
    pub series: Vec<ScanPoint>,
    /// Why the scan stopped
    pub termination: Termination,
}

/// A point chosen by a weighted objective
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedOptimum {
    /// The normalized weights used
    pub weights: WelfareWeights,
    /// The value of the weighted objective at the optimum
    pub objective: f64,
    /// The optimal scan point
    pub point: ScanPoint,
}

impl ScanResult {
    /// The point maximizing total home welfare; ties go to the lowest tariff
    pub fn optimal(&self) -> Option<&ScanPoint> {
        argmax(&self.series, |point| point.welfare.total).map(|(point, _)| point)
    }

    /// The highest tariff at which trade still takes place
    pub fn prohibitive_tariff(&self) -> Option<f64> {
        self.series
            .iter()
            .map(|point| point.tariff)
            .reduce(f64::max)
    }

    /// The point maximizing a weighted sum of consumer surplus, producer surplus and revenue.
    ///
    /// The weights are normalized to sum to one first. Ties go to the lowest tariff.
    pub fn weighted_optimal(
        &self,
        weights: &WelfareWeights,
    ) -> Result<Option<WeightedOptimum>, SolveError> {
        let weights = weights.normalized()?;
        Ok(
            argmax(&self.series, |point| weights.apply(point)).map(|(point, objective)| {
                WeightedOptimum {
                    weights,
                    objective,
                    point: *point,
                }
            }),
        )
    }
}

// First maximum of a NaN-free score
fn argmax<'a>(
    series: &'a [ScanPoint],
    score: impl Fn(&ScanPoint) -> f64,
) -> Option<(&'a ScanPoint, f64)> {
    let mut best: Option<(&ScanPoint, f64)> = None;
    for point in series {
        let value = score(point);
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, max)) if value <= max => {}
            _ => best = Some((point, value)),
        }
    }
    best
}

/// Sweeps a tariff upwards from zero, solving for the equilibrium and home welfare at each
/// value, until imports are choked off.
pub struct TariffScan<'a, R> {
    equilibrium: &'a EquilibriumEngine<R>,
    welfare: &'a WelfareEngine,
    settings: ScanSettings,
}

impl<'a, R: RootFinder> TariffScan<'a, R> {
    /// Create a scan over the given engines
    pub fn new(
        equilibrium: &'a EquilibriumEngine<R>,
        welfare: &'a WelfareEngine,
        settings: ScanSettings,
    ) -> Self {
        Self {
            equilibrium,
            welfare,
            settings,
        }
    }

    /// Run the scan, walking the value of `tariff` upwards in place.
    ///
    /// The tariff is reset to zero first. Each step records the welfare of the home country
    /// relative to free trade and then raises the tariff by the configured step. The first
    /// tariff at which imports fall to the trade threshold ends the scan and is not recorded.
    pub fn run(&self, tariff: &mut Tariff) -> Result<ScanResult, SolveError> {
        let ScanSettings { step, max_steps } = self.settings;
        if !(step.is_finite() && step > 0.0) {
            return Err(SolveError::InvalidStep(step));
        }

        tariff.set_value(0.0);
        let free_trade = self.equilibrium.free_trade_equilibrium()?;
        let mut series = Vec::new();

        let termination = loop {
            if series.len() >= max_steps {
                event!(
                    Level::WARN,
                    max_steps,
                    tariff = tariff.value(),
                    "tariff scan stopped before trade was choked off"
                );
                break Termination::StepLimit {
                    tariff: tariff.value(),
                };
            }

            let eq = match self.equilibrium.tariff_equilibrium(tariff)? {
                TariffOutcome::Traded(eq) => eq,
                TariffOutcome::Prohibitive {
                    import_quantity, ..
                } => {
                    break Termination::Prohibitive {
                        tariff: tariff.value(),
                        import_quantity,
                    };
                }
            };

            let welfare = self
                .welfare
                .home_welfare(free_trade.price, eq.home_price, eq.export_price)?;
            event!(
                Level::DEBUG,
                tariff = tariff.value(),
                imports = eq.import_quantity,
                welfare = welfare.total,
                "tariff scan step"
            );

            series.push(ScanPoint {
                tariff: tariff.value(),
                ave: tariff.ad_valorem_equivalent(eq.home_price),
                home_price: eq.home_price,
                export_price: eq.export_price,
                import_quantity: eq.import_quantity,
                welfare,
            });

            *tariff.value_mut() += step;
        };

        Ok(ScanResult {
            kind: tariff.kind(),
            free_trade,
            series,
            termination,
        })
    }
}
